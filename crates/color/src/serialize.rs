//! Serialization of numbers and resolved colors.
//!
//! <https://drafts.csswg.org/cssom/#serializing-css-values>

use crate::{
    space::ColorSpace,
    tuple::{Channel, ColorTuple},
};

const SIGNIFICANT_DIGITS: i32 = 6;
const MAX_DECIMALS: i32 = 6;

/// Format a number with up to six significant digits (and at most six decimals),
/// without trailing zeros.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }

    if n.is_infinite() {
        let formatted = if n.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        };
        return formatted.to_string();
    }

    if n == 0. {
        return "0".to_string();
    }

    let magnitude = n.abs().log10().floor() as i32;
    let decimals = (SIGNIFICANT_DIGITS - 1 - magnitude).clamp(0, MAX_DECIMALS) as usize;

    let mut formatted = format!("{n:.decimals$}");
    if formatted.contains('.') {
        let trimmed_length = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed_length);
    }

    if formatted == "-0" {
        formatted.remove(0);
    }

    formatted
}

/// Alpha of a legacy color, rounded so that it survives a round trip through 8 bits
///
/// <https://drafts.csswg.org/css-color-4/#serializing-alpha-values>
#[must_use]
pub fn format_legacy_alpha(alpha: f64) -> String {
    let integer = (alpha.clamp(0., 1.) * 255.).round();

    let two_decimals = (integer / 255. * 100.).round() / 100.;
    if (two_decimals * 255.).round() == integer {
        format_number(two_decimals)
    } else {
        format_number((integer / 255. * 1000.).round() / 1000.)
    }
}

fn format_channel(channel: Channel) -> String {
    match channel {
        Channel::Number(n) => format_number(n),
        Channel::None => "none".to_string(),
    }
}

fn format_modern_alpha(alpha: Channel) -> String {
    match alpha {
        Channel::Number(alpha) if alpha >= 1. => String::new(),
        Channel::Number(alpha) => format!(" / {}", format_number(alpha.max(0.))),
        Channel::None => " / none".to_string(),
    }
}

/// `rgb(r, g, b)` or `rgba(r, g, b, a)`
#[must_use]
pub fn serialize_legacy_rgb(color: &ColorTuple) -> String {
    let color = color.to_space(ColorSpace::Rgb).to_concrete().to_finite();
    let [red, green, blue] = color
        .values()
        .map(|c| format_number(c.clamp(0., 255.).round()));
    let alpha = format_legacy_alpha(color.alpha.value_or_zero());

    if alpha == "1" {
        format!("rgb({red}, {green}, {blue})")
    } else {
        format!("rgba({red}, {green}, {blue}, {alpha})")
    }
}

/// Serialize a color the way its space is written in CSS.
///
/// `NaN` channels are written as zero and infinite channels as the largest finite numbers.
#[must_use]
pub fn serialize_color(color: &ColorTuple) -> String {
    let color = &color.to_finite();
    let [c1, c2, c3] = color.channels.map(format_channel);
    let alpha = format_modern_alpha(color.alpha);

    match color.space {
        ColorSpace::Rgb | ColorSpace::Hsl | ColorSpace::Hwb => serialize_legacy_rgb(color),
        ColorSpace::Lab | ColorSpace::Lch | ColorSpace::Oklab | ColorSpace::Oklch => {
            format!("{}({c1} {c2} {c3}{alpha})", color.space.name())
        },
        space => format!("color({} {c1} {c2} {c3}{alpha})", space.name()),
    }
}

/// `#rrggbb` or `#rrggbbaa`
#[must_use]
pub fn serialize_hex(color: &ColorTuple, always_include_alpha: bool) -> String {
    let color = color.to_space(ColorSpace::Rgb).to_concrete().to_finite();
    let [red, green, blue] = color.values().map(|c| c.clamp(0., 255.).round() as u8);
    let alpha = color.alpha.value_or_zero().clamp(0., 1.);

    let mut hex = format!("#{red:02x}{green:02x}{blue:02x}");
    if always_include_alpha || alpha != 1. {
        hex.push_str(&format!("{:02x}", (alpha * 255.).round() as u8));
    }
    hex
}
