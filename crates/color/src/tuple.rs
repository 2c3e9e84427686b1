use crate::{
    conversion,
    error::Error,
    space::{ChannelKind, ColorSpace},
};

/// Below this chroma (in each space's native units) a hue is powerless
const LCH_ACHROMATIC_THRESHOLD: f64 = 0.0015;
const OKLCH_ACHROMATIC_THRESHOLD: f64 = 0.000_004;
const PERCENT_EPSILON: f64 = 1e-5;

/// A single component of a color
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Channel {
    Number(f64),

    /// The `none` keyword, a missing component
    None,
}

impl Channel {
    #[inline]
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::None => None,
        }
    }

    /// Missing components behave like zero once a concrete color is needed
    #[inline]
    #[must_use]
    pub fn value_or_zero(self) -> f64 {
        self.value().unwrap_or(0.)
    }

    #[inline]
    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }

    #[must_use]
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Number(n) => Self::Number(f(n)),
            Self::None => Self::None,
        }
    }

    /// Replace `NaN` with zero and clamp infinities to the largest finite values
    ///
    /// <https://drafts.csswg.org/css-values-4/#calc-ieee>
    #[must_use]
    pub fn to_finite(self) -> Self {
        self.map(|n| if n.is_nan() { 0. } else { n.clamp(f64::MIN, f64::MAX) })
    }
}

impl From<f64> for Channel {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// A resolved color: a space and three channels plus alpha.
///
/// Channels are stored in the native units of the space, see [ColorSpace].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTuple {
    pub space: ColorSpace,
    pub channels: [Channel; 3],
    pub alpha: Channel,
}

impl ColorTuple {
    #[must_use]
    pub const fn new(space: ColorSpace, [c1, c2, c3]: [f64; 3], alpha: f64) -> Self {
        Self {
            space,
            channels: [
                Channel::Number(c1),
                Channel::Number(c2),
                Channel::Number(c3),
            ],
            alpha: Channel::Number(alpha),
        }
    }

    /// The color used for invalid input in value-producing formats
    #[must_use]
    pub const fn transparent() -> Self {
        Self::new(ColorSpace::Rgb, [0.; 3], 0.)
    }

    /// The channel values, with missing channels replaced by zero
    #[must_use]
    pub fn values(&self) -> [f64; 3] {
        self.channels.map(Channel::value_or_zero)
    }

    /// Replace every missing component, including alpha, with zero
    #[must_use]
    pub fn to_concrete(&self) -> Self {
        Self::new(self.space, self.values(), self.alpha.value_or_zero())
    }

    /// Whether any of the three color channels (not alpha) is missing
    #[must_use]
    pub fn has_missing_channels(&self) -> bool {
        self.channels.iter().any(|channel| channel.is_none())
    }

    /// See [Channel::to_finite]
    #[must_use]
    pub fn to_finite(&self) -> Self {
        Self {
            space: self.space,
            channels: self.channels.map(Channel::to_finite),
            alpha: self.alpha.to_finite(),
        }
    }

    /// Convert the color to another space.
    ///
    /// Missing channels are treated as zero, unless the conversion is a plain rescaling
    /// between legacy `rgb` and `srgb`. Alpha is carried over unchanged.
    /// Conversions that overflow produce finite channels, see [Channel::to_finite].
    #[must_use]
    pub fn to_space(&self, space: ColorSpace) -> Self {
        if self.space == space {
            return *self;
        }

        let channels = match (self.space, space) {
            (ColorSpace::Rgb, ColorSpace::Srgb) => self.channels.map(|c| c.map(|c| c / 255.)),
            (ColorSpace::Srgb, ColorSpace::Rgb) => self.channels.map(|c| c.map(|c| c * 255.)),
            _ => conversion::convert(self.space, space, self.values()).map(Channel::Number),
        };

        Self {
            space,
            channels: channels.map(Channel::to_finite),
            alpha: self.alpha,
        }
    }

    /// Convert the color to an interpolation space.
    ///
    /// Missing channels are carried over to analogous channels of the new space and
    /// hues that became powerless through the conversion are marked as missing.
    ///
    /// <https://drafts.csswg.org/css-color-4/#interpolation-missing>
    #[must_use]
    pub fn to_space_for_interpolation(&self, space: ColorSpace) -> Self {
        if self.space == space {
            return *self;
        }

        let mut converted = self.to_space(space);
        let target_kinds = space.channel_kinds();

        for (channel, kind) in self.channels.iter().zip(self.space.channel_kinds()) {
            if !channel.is_none() || kind == ChannelKind::Other {
                continue;
            }

            if let Some(index) = target_kinds.iter().position(|target| *target == kind) {
                converted.channels[index] = Channel::None;
            }
        }

        if let Some(hue_index) = space.hue_index() {
            if converted.is_achromatic() {
                converted.channels[hue_index] = Channel::None;
            }
        }

        converted
    }

    /// Whether the hue of a polar color carries no information
    #[must_use]
    pub fn is_achromatic(&self) -> bool {
        let [_, c2, c3] = self.channels;
        match self.space {
            ColorSpace::Hsl => {
                let saturation = c2.value_or_zero();
                let lightness = c3.value_or_zero();
                saturation.abs() < PERCENT_EPSILON
                    || lightness.abs() < PERCENT_EPSILON
                    || (lightness - 100.).abs() < PERCENT_EPSILON
            },
            ColorSpace::Hwb => c2.value_or_zero() + c3.value_or_zero() >= 100. - PERCENT_EPSILON,
            ColorSpace::Lch => c2.value_or_zero() < LCH_ACHROMATIC_THRESHOLD,
            ColorSpace::Oklch => c2.value_or_zero() < OKLCH_ACHROMATIC_THRESHOLD,
            _ => false,
        }
    }

    /// Build a color from textual components: three channels and an optional alpha.
    ///
    /// Every component must be a number or `none`, alpha must lie between 0 and 1.
    pub fn from_components<S: AsRef<str>>(
        space: ColorSpace,
        components: &[S],
    ) -> Result<Self, Error> {
        if !matches!(components.len(), 3 | 4) {
            return Err(Error::UnexpectedArrayLength(components.len()));
        }

        let parse = |component: &str| -> Result<Channel, Error> {
            let component = component.trim();
            if component.eq_ignore_ascii_case("none") {
                return Ok(Channel::None);
            }

            match component.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Channel::Number(value)),
                _ => Err(Error::NotANumber(component.to_string())),
            }
        };

        let mut channels = [Channel::None; 3];
        for (channel, component) in channels.iter_mut().zip(components) {
            *channel = parse(component.as_ref())?;
        }

        let alpha = match components.get(3) {
            Some(component) => {
                let alpha = parse(component.as_ref())?;
                if alpha.value().is_some_and(|alpha| !(0. ..=1.).contains(&alpha)) {
                    return Err(Error::OutOfRange(
                        component.as_ref().trim().to_string(),
                        0.,
                        1.,
                    ));
                }
                alpha
            },
            None => Channel::Number(1.),
        };

        Ok(Self {
            space,
            channels,
            alpha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Channel, ColorTuple};
    use crate::{error::Error, space::ColorSpace};

    #[test]
    fn rescaling_keeps_missing_channels() {
        let color = ColorTuple {
            space: ColorSpace::Rgb,
            channels: [Channel::Number(51.), Channel::None, Channel::Number(255.)],
            alpha: Channel::None,
        };
        let srgb = color.to_space(ColorSpace::Srgb);
        assert_eq!(
            srgb.channels,
            [Channel::Number(0.2), Channel::None, Channel::Number(1.)]
        );
        assert_eq!(srgb.alpha, Channel::None);
    }

    #[test]
    fn missing_channels_become_zero() {
        let color = ColorTuple {
            space: ColorSpace::Hwb,
            channels: [Channel::None; 3],
            alpha: Channel::None,
        };
        assert_eq!(
            color.to_space(ColorSpace::Rgb).to_concrete(),
            ColorTuple::new(ColorSpace::Rgb, [255., 0., 0.], 0.)
        );
    }

    #[test]
    fn analogous_channels_are_carried_over() {
        let color = ColorTuple {
            space: ColorSpace::Lch,
            channels: [Channel::None, Channel::Number(40.), Channel::Number(120.)],
            alpha: Channel::Number(1.),
        };
        let oklch = color.to_space_for_interpolation(ColorSpace::Oklch);
        assert!(oklch.channels[0].is_none());
        assert!(!oklch.channels[1].is_none());

        let hsl = color.to_space_for_interpolation(ColorSpace::Hsl);
        assert!(hsl.channels[2].is_none());
    }

    #[test]
    fn powerless_hue_is_missing() {
        let gray = ColorTuple::new(ColorSpace::Rgb, [128., 128., 128.], 1.);
        let hsl = gray.to_space_for_interpolation(ColorSpace::Hsl);
        assert!(hsl.channels[0].is_none());

        let lch = gray.to_space_for_interpolation(ColorSpace::Lch);
        assert!(lch.channels[2].is_none());
    }

    #[test]
    fn overflowing_conversions_stay_finite() {
        assert_eq!(Channel::Number(f64::NAN).to_finite(), Channel::Number(0.));
        assert_eq!(
            Channel::Number(f64::NEG_INFINITY).to_finite(),
            Channel::Number(f64::MIN)
        );
        assert_eq!(Channel::None.to_finite(), Channel::None);

        let color = ColorTuple::new(ColorSpace::Lab, [50., f64::MAX, 0.], 1.);
        let srgb = color.to_space(ColorSpace::Srgb);
        assert!(srgb.values().iter().all(|value| value.is_finite()));

        let rgb = ColorTuple::new(ColorSpace::Srgb, [f64::MAX, 0., 0.], 1.);
        assert_eq!(rgb.to_space(ColorSpace::Rgb).values()[0], f64::MAX);
    }

    #[test]
    fn components() {
        assert_eq!(
            ColorTuple::from_components(ColorSpace::Srgb, &["1", "0.5", "none", "0.5"]),
            Ok(ColorTuple {
                space: ColorSpace::Srgb,
                channels: [Channel::Number(1.), Channel::Number(0.5), Channel::None],
                alpha: Channel::Number(0.5),
            })
        );
        assert_eq!(
            ColorTuple::from_components(ColorSpace::Srgb, &["1", "0"]),
            Err(Error::UnexpectedArrayLength(2))
        );
        assert_eq!(
            ColorTuple::from_components(ColorSpace::Srgb, &["1", "foo", "0"]),
            Err(Error::NotANumber("foo".to_string()))
        );
        assert_eq!(
            ColorTuple::from_components(ColorSpace::Srgb, &["1", "0", "0", "2"]),
            Err(Error::OutOfRange("2".to_string(), 0., 1.))
        );
    }
}
