//! Resolution and conversion of CSS color values.
//!
//! <https://drafts.csswg.org/css-color-5/>
//!
//! A value like `color-mix(in oklch, var(--accent) 40%, rgb(from white r g b / 0.5))` is
//! resolved in several steps:
//! 1. `var()` references are substituted ([custom_property])
//! 2. the value is parsed into a tree of color functions ([notation], [relative], [mix])
//! 3. channel expressions are evaluated ([calc]) and colors are converted between
//!    spaces where needed ([conversion])
//! 4. the result is serialized in the requested [Format] ([serialize])
//!
//! Resolving the same value many times is cheap when a [Resolver] is used, since it
//! caches every result until [Resolver::clear_cache] is called.

pub mod cache;
pub mod calc;
pub mod conversion;
pub mod convert;
pub mod custom_property;
mod error;
pub mod mix;
mod named;
pub mod notation;
mod options;
pub mod relative;
pub mod serialize;
mod space;
pub mod syntax;
mod tuple;

use std::fmt;

use cache::{Cache, CacheKey};
use notation::{ColorValue, Context, Resolved};
use syntax::{CSSParse, ParseError, Token};

pub use error::Error;
pub use options::{Format, Lookup, Options};
pub use space::{ChannelKind, ColorSpace};
pub use tuple::{Channel, ColorTuple};

/// The result of resolving a color value
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    Text(String),
    Color(ColorTuple),

    /// The value cannot be represented in the requested format
    Null,

    /// The output of a resolution that was given a [key](Options::key)
    Keyed(String, Box<Output>),
}

impl Output {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Keyed(_, output) => output.as_text(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<&ColorTuple> {
        match self {
            Self::Color(color) => Some(color),
            Self::Keyed(_, output) => output.as_color(),
            _ => None,
        }
    }

    fn with_key(self, key: Option<&str>) -> Self {
        match key {
            Some(key) => Self::Keyed(key.to_string(), Box::new(self)),
            None => self,
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Color(color) => {
                let [first, second, third] = color.channels;
                write!(f, "[{}", color.space)?;
                for channel in [first, second, third, color.alpha] {
                    match channel {
                        Channel::Number(n) => write!(f, ", {}", serialize::format_number(n))?,
                        Channel::None => f.write_str(", none")?,
                    }
                }
                f.write_str("]")
            },
            Self::Null => f.write_str("null"),
            Self::Keyed(key, output) => write!(f, "{key}: {output}"),
        }
    }
}

/// Parse a value, after substituting custom properties
fn parse(value: &str, options: &Options) -> Result<ColorValue, ParseError> {
    let mut parser = custom_property::parse_value(value, options)?;
    ColorValue::parse_complete(&mut parser)
}

/// Resolve a value to a color, failing for invalid values and for `currentcolor`
/// without a current color
pub(crate) fn resolve_color(value: &str, options: &Options) -> Result<Resolved, ParseError> {
    parse(value, options)?.resolve(&Context::new(options))
}

/// The output for values that could not be resolved
fn invalid_output(format: Format) -> Output {
    match format {
        Format::ComputedValue => Output::Text("rgba(0, 0, 0, 0)".to_string()),
        Format::SpecifiedValue => Output::Text(String::new()),
        Format::MixValue | Format::Hex | Format::HexAlpha => Output::Null,
    }
}

fn resolve_uncached(value: &str, options: &Options) -> Output {
    let format = options.format;

    let color = match parse(value, options) {
        Ok(color) => color,
        Err(_) => {
            log::debug!("{value:?} is not a valid color");
            return invalid_output(format);
        },
    };

    if color == ColorValue::CurrentColor && options.current_color.is_none() {
        return match format {
            Format::ComputedValue | Format::SpecifiedValue => {
                Output::Text("currentcolor".to_string())
            },
            Format::MixValue | Format::Hex | Format::HexAlpha => Output::Null,
        };
    }

    let context = Context::new(options);
    let output = match format {
        Format::ComputedValue => color
            .resolve(&context)
            .map(|resolved| Output::Text(resolved.serialize())),
        Format::SpecifiedValue => color.to_specified_string(&context).map(Output::Text),
        Format::MixValue => color
            .resolve(&context)
            .map(|resolved| Output::Color(resolved.color)),
        Format::Hex | Format::HexAlpha => color.resolve(&context).map(|resolved| {
            // Missing channels cannot be written as hex digits
            if resolved.color.has_missing_channels() {
                Output::Null
            } else {
                let hex = serialize::serialize_hex(&resolved.color, format == Format::HexAlpha);
                Output::Text(hex)
            }
        }),
    };

    output.unwrap_or_else(|_| {
        log::debug!("{value:?} could not be resolved");
        invalid_output(format)
    })
}

/// Resolve a color value without caching.
///
/// Invalid values never cause an error, they produce a placeholder that depends
/// on the [Format] instead.
#[must_use]
pub fn resolve(value: &str, options: &Options) -> Output {
    resolve_uncached(value, options).with_key(options.key.as_deref())
}

/// Resolves color values and remembers the results
#[derive(Debug, Default)]
pub struct Resolver {
    cache: Cache,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [resolve], but results are looked up in and stored to the cache.
    ///
    /// Options that contain callbacks bypass the cache.
    #[must_use]
    pub fn resolve(&self, value: &str, options: &Options) -> Output {
        let output = match CacheKey::new(value, options) {
            Some(key) => {
                if let Some(cached) = self.cache.get(&key) {
                    log::debug!("Using cached result for {value:?}");
                    cached
                } else {
                    let output = resolve_uncached(value, options);
                    self.cache.set(key, output.clone());
                    output
                }
            },
            None => resolve_uncached(value, options),
        };

        output.with_key(options.key.as_deref())
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Evaluate a standalone `calc()` expression.
///
/// Returns the reduced value (like `0.5` or `20px`), a simplified `calc()` expression
/// if the value cannot be reduced any further, or the input (with `var()` substituted)
/// if it is not a `calc()` expression. Invalid expressions produce an empty string.
#[must_use]
pub fn css_calc(value: &str, options: &Options) -> String {
    let Ok(mut parser) = custom_property::parse_value(value, options) else {
        return String::new();
    };

    let is_calc = parser
        .peek_token_ignoring_whitespace(0)
        .is_some_and(|token| token.is_function("calc"));

    if !is_calc {
        return parser
            .remaining_tokens()
            .iter()
            .map(Token::to_string)
            .collect::<String>()
            .trim()
            .to_string();
    }

    let scope = calc::Scope {
        dimensions: Some(&options.dimension),
        ..calc::Scope::default()
    };

    calc::CalcNode::parse_complete(&mut parser)
        .ok()
        .and_then(|node| node.evaluate(&scope))
        .map(|term| term.to_calc_string())
        .unwrap_or_default()
}

/// Whether the value is syntactically a color.
///
/// `var()` references are not substituted, so values containing them are not colors.
#[must_use]
pub fn is_color(value: &str) -> bool {
    ColorValue::parse_from_str(value).is_ok()
}
