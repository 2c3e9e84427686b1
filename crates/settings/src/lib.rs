//! Responsible for creating and managing the global colorcalc settings

mod cli;

use std::sync::LazyLock;

use clap::Parser;
use color::{ColorSpace, Options};

/// The global settings singleton
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::init);

/// Holds all the configurable information for a colorcalc invocation
#[derive(Debug, Default)]
pub struct Settings {
    /// The color value to resolve
    pub value: String,

    /// Options passed on to the resolver
    pub options: Options,

    /// Convert the color to this space instead of serializing it
    pub convert_to: Option<ColorSpace>,
}

impl Settings {
    #[must_use]
    pub fn init() -> Self {
        let mut settings = Self::default();

        let args = cli::Arguments::parse();

        args.update_settings(&mut settings);

        settings
    }
}
