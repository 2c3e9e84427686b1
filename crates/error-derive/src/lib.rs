//! `#[derive(Error)]` for error enums.
//!
//! Every variant needs a `#[msg = "..."]` attribute. The message is a format string,
//! tuple fields can be referenced positionally (`{0}`, `{1}`, ...).
//!
//! Single-field variants marked with `#[from]` additionally get a `From` impl and
//! report their field as the error source.

use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[proc_macro_derive(Error, attributes(msg, from))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    let item: syn::ItemEnum = syn::parse(input).expect("Could not parse input as enum");

    let name = item.ident;
    let mut variant_displays = vec![];
    let mut from_impls = vec![];
    let mut variant_sources = vec![];

    for variant in &item.variants {
        let ident = &variant.ident;

        let message = variant
            .attrs
            .iter()
            .flat_map(|attr| match &attr.meta {
                syn::Meta::NameValue(name_value) => Some(name_value),
                _ => None,
            })
            .find(|name_value| name_value.path.is_ident("msg"))
            .map(|name_value| &name_value.value);

        let Some(message) = message else {
            panic!("variant {ident} needs a #[msg = \"...\"] attribute");
        };

        let is_from = variant.attrs.iter().any(|attr| attr.path().is_ident("from"));

        match &variant.fields {
            syn::Fields::Unit => {
                if is_from {
                    panic!("#[from] requires exactly one field");
                }
                variant_displays.push(quote!(Self::#ident => ::std::write!(f, #message)));
            },
            syn::Fields::Unnamed(unnamed_fields) => {
                let bindings: Vec<_> = (0..unnamed_fields.unnamed.len())
                    .map(|i| format_ident!("field_{i}"))
                    .collect();

                variant_displays.push(quote!(
                    Self::#ident(#(#bindings),*) => ::std::write!(f, #message, #(#bindings),*)
                ));

                if is_from {
                    if unnamed_fields.unnamed.len() != 1 {
                        panic!("#[from] requires exactly one field");
                    }

                    let ty = &unnamed_fields.unnamed[0].ty;
                    from_impls.push(quote!(
                        #[automatically_derived]
                        impl From<#ty> for #name {
                            fn from(value: #ty) -> Self {
                                Self::#ident(value)
                            }
                        }
                    ));
                    variant_sources.push(quote!(Self::#ident(ref value) => Some(value)));
                }
            },
            syn::Fields::Named(_) => panic!("named fields are not allowed"),
        }
    }

    quote!(
        #[automatically_derived]
        impl ::std::fmt::Display for #name {
            #[allow(unused_variables)]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> Result<(), ::std::fmt::Error> {
                match self {
                    #(
                        #variant_displays,
                    )*
                }
            }
        }

        #(
            #from_impls
        )*

        #[automatically_derived]
        impl ::std::error::Error for #name {
            fn source(&self) -> Option<&(dyn ::std::error::Error + 'static)> {
                #[allow(unreachable_patterns)]
                match self {
                    #(
                        #variant_sources,
                    )*
                    _ => None,
                }
            }
        }
    )
    .into()
}
