//! Conversion of color values to concrete tuples in a fixed space.
//!
//! Invalid values produce a fully transparent black in the requested space.

use crate::{
    error::Error,
    options::{Format, Options},
    resolve_color,
    serialize::serialize_hex,
    space::ColorSpace,
    tuple::ColorTuple,
};

/// Resolve `value` and convert it to `space`
#[must_use]
pub fn color_to_space(value: &str, options: &Options, space: ColorSpace) -> ColorTuple {
    match resolve_color(value, options) {
        Ok(resolved) => resolved.color.to_space(space).to_concrete(),
        Err(_) => ColorTuple::new(space, [0.; 3], 0.),
    }
}

/// Legacy `rgb`, with channels between 0 and 255
#[must_use]
pub fn color_to_rgb(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Rgb)
}

#[must_use]
pub fn color_to_hsl(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Hsl)
}

#[must_use]
pub fn color_to_hwb(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Hwb)
}

#[must_use]
pub fn color_to_lab(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Lab)
}

#[must_use]
pub fn color_to_lch(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Lch)
}

#[must_use]
pub fn color_to_oklab(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Oklab)
}

#[must_use]
pub fn color_to_oklch(value: &str, options: &Options) -> ColorTuple {
    color_to_space(value, options, ColorSpace::Oklch)
}

/// XYZ relative to D65, or to D50 if [Options::d50] is set
#[must_use]
pub fn color_to_xyz(value: &str, options: &Options) -> ColorTuple {
    let space = if options.d50 {
        ColorSpace::XyzD50
    } else {
        ColorSpace::XyzD65
    };
    color_to_space(value, options, space)
}

/// `#rrggbb`, or `#rrggbbaa` if the color is translucent or the format is [Format::HexAlpha].
///
/// Returns `None` for invalid values and for colors with missing channels.
#[must_use]
pub fn color_to_hex(value: &str, options: &Options) -> Option<String> {
    let resolved = resolve_color(value, options).ok()?;
    if resolved.color.has_missing_channels() {
        return None;
    }

    let with_alpha = options.format == Format::HexAlpha;
    Some(serialize_hex(&resolved.color, with_alpha))
}

/// Format a channel value between 0 and 255 as two lowercase hex digits
pub fn number_to_hex(value: f64) -> Result<String, Error> {
    if !value.is_finite() {
        return Err(Error::NotANumber(value.to_string()));
    }

    let rounded = value.round();
    if !(0. ..=255.).contains(&rounded) {
        return Err(Error::OutOfRange(value.to_string(), 0., 255.));
    }

    Ok(format!("{:02x}", rounded as u8))
}

#[cfg(test)]
mod tests {
    use super::{
        color_to_hex, color_to_hsl, color_to_lab, color_to_rgb, color_to_xyz, number_to_hex,
    };
    use crate::{
        error::Error,
        options::{Format, Options},
        space::ColorSpace,
        tuple::ColorTuple,
    };

    #[test]
    fn to_rgb() {
        let options = Options::default();
        assert_eq!(
            color_to_rgb("hwb(none none none / none)", &options),
            ColorTuple::new(ColorSpace::Rgb, [255., 0., 0.], 0.)
        );
        assert_eq!(
            color_to_rgb("not a color", &options),
            ColorTuple::new(ColorSpace::Rgb, [0.; 3], 0.)
        );
    }

    #[test]
    fn to_hsl() {
        assert_eq!(
            color_to_hsl("rgb(255 0 0)", &Options::default()),
            ColorTuple::new(ColorSpace::Hsl, [0., 100., 50.], 1.)
        );
    }

    #[test]
    fn to_lab() {
        let lab = color_to_lab("white", &Options::default());
        let [lightness, a, b] = lab.values();
        assert!((lightness - 100.).abs() < 1e-3);
        assert!(a.abs() < 1e-3);
        assert!(b.abs() < 1e-3);
    }

    #[test]
    fn to_xyz() {
        let d65 = color_to_xyz("white", &Options::default());
        assert_eq!(d65.space, ColorSpace::XyzD65);

        let options = Options {
            d50: true,
            ..Options::default()
        };
        let d50 = color_to_xyz("white", &options);
        assert_eq!(d50.space, ColorSpace::XyzD50);
        assert!((d50.values()[0] - 0.3457 / 0.3585).abs() < 1e-3);
    }

    #[test]
    fn to_hex() {
        let options = Options::default();
        assert_eq!(
            color_to_hex("rgb(255 128 0)", &options).as_deref(),
            Some("#ff8000")
        );
        assert_eq!(
            color_to_hex("rgb(255 128 0)", &Options::with_format(Format::HexAlpha)).as_deref(),
            Some("#ff8000ff")
        );
        assert_eq!(color_to_hex("invalid", &options), None);
        assert_eq!(color_to_hex("rgb(none 0 0)", &options), None);
        assert_eq!(
            color_to_hex("rgb(0 0 0 / none)", &options).as_deref(),
            Some("#00000000")
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(number_to_hex(0.), Ok("00".to_string()));
        assert_eq!(number_to_hex(254.6), Ok("ff".to_string()));
        assert_eq!(
            number_to_hex(f64::NAN),
            Err(Error::NotANumber("NaN".to_string()))
        );
        assert_eq!(
            number_to_hex(256.),
            Err(Error::OutOfRange("256".to_string(), 0., 255.))
        );
    }
}
