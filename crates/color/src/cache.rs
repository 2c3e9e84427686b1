//! Memoization of resolved values.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    options::{Format, Options},
    Output,
};

/// Identifies a resolution: the input text plus every option that can change the result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    value: String,
    format: Format,
    d50: bool,
    current_color: Option<String>,
    custom_properties: Vec<(String, String)>,

    /// Pixel sizes are compared by their bit patterns
    dimensions: Vec<(String, u64)>,
}

impl CacheKey {
    /// Returns `None` if the options contain callbacks, since their results cannot be compared
    #[must_use]
    pub fn new(value: &str, options: &Options) -> Option<Self> {
        let custom_properties = options
            .custom_property
            .as_map()?
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let dimensions = options
            .dimension
            .as_map()?
            .iter()
            .map(|(unit, pixels)| (unit.clone(), pixels.to_bits()))
            .collect();

        Some(Self {
            value: value.to_string(),
            format: options.format,
            d50: options.d50,
            current_color: options.current_color.clone(),
            custom_properties,
            dimensions,
        })
    }
}

/// An unbounded store of resolved values, valid until [Cache::clear] is called.
///
/// The cache can be shared between threads, every operation locks it for its own duration.
#[derive(Debug, Default)]
pub struct Cache {
    entries: Mutex<HashMap<CacheKey, Output>>,
}

impl Cache {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Output>> {
        // Entries are inserted atomically, so a panicking thread cannot leave a half-written value
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Output> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: CacheKey, output: Output) {
        self.lock().insert(key, output);
    }

    pub fn clear(&self) {
        log::debug!("Clearing {} cached color values", self.len());
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cache, CacheKey};
    use crate::{
        options::{Format, Lookup, Options},
        Output,
    };

    #[test]
    fn keys_depend_on_options() {
        let computed = Options::default();
        let hex = Options::with_format(Format::Hex);

        assert_eq!(
            CacheKey::new("red", &computed),
            CacheKey::new("red", &computed)
        );
        assert_ne!(CacheKey::new("red", &computed), CacheKey::new("red", &hex));
        assert_ne!(
            CacheKey::new("red", &computed),
            CacheKey::new("blue", &computed)
        );
    }

    #[test]
    fn callbacks_are_not_cacheable() {
        let options = Options {
            custom_property: Lookup::from_fn(|_| Some("red".to_string())),
            ..Options::default()
        };
        assert_eq!(CacheKey::new("var(--a)", &options), None);
    }

    #[test]
    fn get_set_clear() {
        let cache = Cache::default();
        let key = CacheKey::new("red", &Options::default()).unwrap();

        assert_eq!(cache.get(&key), None);
        cache.set(key.clone(), Output::Text("rgb(255, 0, 0)".to_string()));
        assert_eq!(
            cache.get(&key),
            Some(Output::Text("rgb(255, 0, 0)".to_string()))
        );
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key), None);
    }
}
