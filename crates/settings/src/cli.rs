use color::{ColorSpace, Format};

use crate::Settings;

#[derive(clap::Parser, Debug)]
#[command(name = "colorcalc", version, about = "Resolve and convert CSS colors", long_about = None)]
pub struct Arguments {
    /// CSS color value to resolve
    value: String,

    /// Output format: computed, specified, mix, hex or hex-alpha
    #[arg(long, value_parser = parse_format)]
    format: Option<Format>,

    /// Convert the color to a color space instead of serializing it
    #[arg(long, value_parser = parse_color_space)]
    to: Option<ColorSpace>,

    /// Value of the currentcolor keyword
    #[arg(long)]
    current_color: Option<String>,

    /// Define a custom property, for example "--accent=#f00"
    #[arg(
        long = "custom-property",
        value_parser = parse_custom_property,
        allow_hyphen_values = true
    )]
    custom_properties: Vec<(String, String)>,

    /// Size of a relative length unit in pixels, for example "em=16"
    #[arg(long = "dimension", value_parser = parse_dimension)]
    dimensions: Vec<(String, f64)>,

    /// Report XYZ relative to D50 instead of D65
    #[clap(
        long,
        action = clap::ArgAction::SetTrue,
    )]
    d50: bool,
}

impl Arguments {
    pub(crate) fn update_settings(self, settings: &mut Settings) {
        settings.value = self.value;
        settings.options.d50 = self.d50;
        settings.convert_to = self.to;

        if let Some(format) = self.format {
            settings.options.format = format;
        }

        if let Some(current_color) = self.current_color {
            settings.options.current_color = Some(current_color);
        }

        if !self.custom_properties.is_empty() {
            settings.options.custom_property = self.custom_properties.into_iter().collect();
        }

        if !self.dimensions.is_empty() {
            settings.options.dimension = self.dimensions.into_iter().collect();
        }
    }
}

fn parse_format(s: &str) -> Result<Format, String> {
    let format = match s.to_ascii_lowercase().as_str() {
        "computed" | "computed-value" => Format::ComputedValue,
        "specified" | "specified-value" => Format::SpecifiedValue,
        "mix" | "mix-value" => Format::MixValue,
        "hex" => Format::Hex,
        "hex-alpha" => Format::HexAlpha,
        _ => return Err(format!("unknown format {s:?}")),
    };
    Ok(format)
}

fn parse_color_space(s: &str) -> Result<ColorSpace, String> {
    ColorSpace::ALL
        .into_iter()
        .find(|space| space.name().eq_ignore_ascii_case(s))
        .or_else(|| ColorSpace::from_predefined_name(s))
        .ok_or_else(|| format!("unknown color space {s:?}"))
}

/// Split `NAME=VALUE` at the first `=`
fn split_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found {s:?}"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

fn parse_custom_property(s: &str) -> Result<(String, String), String> {
    let (name, value) = split_assignment(s)?;
    if !name.starts_with("--") {
        return Err(format!("custom property names start with \"--\", found {name:?}"));
    }
    Ok((name, value))
}

fn parse_dimension(s: &str) -> Result<(String, f64), String> {
    let (unit, pixels) = split_assignment(s)?;
    let pixels = pixels
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| format!("{e}"))?;
    Ok((unit.to_ascii_lowercase(), pixels))
}
