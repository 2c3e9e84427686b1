//! Color spaces and the meaning of their channels.

use std::fmt;

/// The color spaces a [ColorTuple](crate::ColorTuple) can live in.
///
/// | space | channels | native units |
/// |-------|----------|--------------|
/// | `Rgb` | r, g, b | 0-255 (legacy `rgb()`) |
/// | `Srgb`, `SrgbLinear`, `DisplayP3`, `A98Rgb`, `ProphotoRgb`, `Rec2020` | r, g, b | 0-1 |
/// | `XyzD65`, `XyzD50` | x, y, z | 0-1 |
/// | `Hsl` | h, s, l | degrees, 0-100, 0-100 |
/// | `Hwb` | h, w, b | degrees, 0-100, 0-100 |
/// | `Lab` | l, a, b | 0-100, ±125, ±125 |
/// | `Lch` | l, c, h | 0-100, 0-150, degrees |
/// | `Oklab` | l, a, b | 0-1, ±0.4, ±0.4 |
/// | `Oklch` | l, c, h | 0-1, 0-0.4, degrees |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorSpace {
    Rgb,
    Srgb,
    SrgbLinear,
    DisplayP3,
    A98Rgb,
    ProphotoRgb,
    Rec2020,
    XyzD65,
    XyzD50,
    Hsl,
    Hwb,
    Lab,
    Lch,
    Oklab,
    Oklch,
}

/// Groups of channels that are considered analogous when a color is converted
/// for interpolation.
///
/// <https://drafts.csswg.org/css-color-4/#interpolation-missing>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Red,
    Green,
    Blue,
    Lightness,
    Colorfulness,
    Hue,
    OpponentA,
    OpponentB,
    Other,
}

impl ColorSpace {
    pub const ALL: [Self; 15] = [
        Self::Rgb,
        Self::Srgb,
        Self::SrgbLinear,
        Self::DisplayP3,
        Self::A98Rgb,
        Self::ProphotoRgb,
        Self::Rec2020,
        Self::XyzD65,
        Self::XyzD50,
        Self::Hsl,
        Self::Hwb,
        Self::Lab,
        Self::Lch,
        Self::Oklab,
        Self::Oklch,
    ];

    /// The spaces accepted as the first argument of `color()`
    ///
    /// <https://drafts.csswg.org/css-color-4/#predefined>
    #[must_use]
    pub fn from_predefined_name(name: &str) -> Option<Self> {
        let space = match name.to_ascii_lowercase().as_str() {
            "srgb" => Self::Srgb,
            "srgb-linear" => Self::SrgbLinear,
            "display-p3" => Self::DisplayP3,
            "a98-rgb" => Self::A98Rgb,
            "prophoto-rgb" => Self::ProphotoRgb,
            "rec2020" => Self::Rec2020,
            "xyz" | "xyz-d65" => Self::XyzD65,
            "xyz-d50" => Self::XyzD50,
            _ => return None,
        };
        Some(space)
    }

    /// The spaces accepted by `color-mix(in <space>, ...)`
    #[must_use]
    pub fn from_interpolation_name(name: &str) -> Option<Self> {
        let space = match name.to_ascii_lowercase().as_str() {
            "hsl" => Self::Hsl,
            "hwb" => Self::Hwb,
            "lab" => Self::Lab,
            "lch" => Self::Lch,
            "oklab" => Self::Oklab,
            "oklch" => Self::Oklch,
            other => return Self::from_predefined_name(other),
        };
        Some(space)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Srgb => "srgb",
            Self::SrgbLinear => "srgb-linear",
            Self::DisplayP3 => "display-p3",
            Self::A98Rgb => "a98-rgb",
            Self::ProphotoRgb => "prophoto-rgb",
            Self::Rec2020 => "rec2020",
            Self::XyzD65 => "xyz-d65",
            Self::XyzD50 => "xyz-d50",
            Self::Hsl => "hsl",
            Self::Hwb => "hwb",
            Self::Lab => "lab",
            Self::Lch => "lch",
            Self::Oklab => "oklab",
            Self::Oklch => "oklch",
        }
    }

    /// The keywords that refer to the channels of an origin color in relative color syntax
    #[must_use]
    pub fn channel_names(&self) -> [&'static str; 3] {
        match self {
            Self::XyzD65 | Self::XyzD50 => ["x", "y", "z"],
            Self::Hsl => ["h", "s", "l"],
            Self::Hwb => ["h", "w", "b"],
            Self::Lab | Self::Oklab => ["l", "a", "b"],
            Self::Lch | Self::Oklch => ["l", "c", "h"],
            _ => ["r", "g", "b"],
        }
    }

    #[must_use]
    pub fn channel_kinds(&self) -> [ChannelKind; 3] {
        use ChannelKind::*;

        match self {
            Self::Hsl => [Hue, Colorfulness, Lightness],
            Self::Hwb => [Hue, Other, Other],
            Self::Lab | Self::Oklab => [Lightness, OpponentA, OpponentB],
            Self::Lch | Self::Oklch => [Lightness, Colorfulness, Hue],
            _ => [Red, Green, Blue],
        }
    }

    /// Index of the hue channel, if there is one
    #[must_use]
    pub fn hue_index(&self) -> Option<usize> {
        match self {
            Self::Hsl | Self::Hwb => Some(0),
            Self::Lch | Self::Oklch => Some(2),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_polar(&self) -> bool {
        self.hue_index().is_some()
    }

    /// The value that corresponds to `100%` for each channel.
    ///
    /// Hue channels do not accept percentages, their entry is unused.
    #[must_use]
    pub fn percentage_basis(&self) -> [f64; 3] {
        match self {
            Self::Rgb => [255.; 3],
            Self::Hsl | Self::Hwb => [0., 100., 100.],
            Self::Lab => [100., 125., 125.],
            Self::Lch => [100., 150., 0.],
            Self::Oklab => [1., 0.4, 0.4],
            Self::Oklch => [1., 0.4, 0.],
            _ => [1.; 3],
        }
    }

    /// Whether this space is serialized through `color()`
    #[must_use]
    pub fn is_predefined(&self) -> bool {
        matches!(
            self,
            Self::Srgb
                | Self::SrgbLinear
                | Self::DisplayP3
                | Self::A98Rgb
                | Self::ProphotoRgb
                | Self::Rec2020
                | Self::XyzD65
                | Self::XyzD50
        )
    }

    /// Whether this space belongs to the legacy sRGB syntaxes (`rgb()`, `hsl()`, `hwb()`)
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Rgb | Self::Hsl | Self::Hwb)
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
