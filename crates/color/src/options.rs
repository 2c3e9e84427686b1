use std::{collections::BTreeMap, fmt, sync::Arc};

/// The shape of the value returned by [resolve](crate::resolve)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// The resolved color, serialized as CSS text
    #[default]
    ComputedValue,

    /// The value as written, with `calc()` simplified and keywords preserved
    SpecifiedValue,

    /// The resolved color tuple, with missing channels preserved
    MixValue,

    /// `#rrggbb`, with alpha digits only if the color is not opaque
    Hex,

    /// `#rrggbbaa`
    HexAlpha,
}

/// A name to value lookup supplied by the caller
#[derive(Clone)]
pub enum Lookup<T> {
    Map(BTreeMap<String, T>),
    Callback(Arc<dyn Fn(&str) -> Option<T> + Send + Sync>),
}

impl<T: Clone> Lookup<T> {
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(callback))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<T> {
        match self {
            Self::Map(map) => map.get(name).cloned(),
            Self::Callback(callback) => callback(name),
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, T>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Callback(_) => None,
        }
    }
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self::Map(BTreeMap::new())
    }
}

impl<T: fmt::Debug> fmt::Debug for Lookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl<T> FromIterator<(String, T)> for Lookup<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().collect())
    }
}

/// Configuration for a single resolution
#[derive(Clone, Debug, Default)]
pub struct Options {
    pub format: Format,

    /// Convert to XYZ relative to D50 instead of D65
    pub d50: bool,

    /// The value of the `currentcolor` keyword
    pub current_color: Option<String>,

    /// Values of custom properties, used for `var()` substitution.
    ///
    /// Names include the leading `--`.
    pub custom_property: Lookup<String>,

    /// Size of relative length units (like `em`) in pixels
    pub dimension: Lookup<f64>,

    /// If set, the result is returned as [Output::Keyed](crate::Output::Keyed)
    pub key: Option<String>,
}

impl Options {
    #[must_use]
    pub fn with_format(format: Format) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}
