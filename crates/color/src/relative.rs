//! Relative color syntax, like `rgb(from red r calc(g + 20) b)`.
//!
//! <https://drafts.csswg.org/css-color-5/#relative-colors>

use crate::{
    notation::{ChannelValue, ColorFunction, ColorValue, Context, Resolved},
    space::ColorSpace,
    syntax::ParseError,
    tuple::{Channel, ColorTuple},
};

/// The space a relative color is reported in.
///
/// Relative colors are never legacy colors, so the legacy sRGB notations
/// produce `srgb` colors.
#[must_use]
pub fn output_space(space: ColorSpace) -> ColorSpace {
    if space.is_legacy() {
        ColorSpace::Srgb
    } else {
        space
    }
}

/// Convert the origin into `space` and name its channels.
///
/// Missing channels stay missing if no real conversion is needed.
#[must_use]
pub fn bind_channels(origin: &ColorTuple, space: ColorSpace) -> [(&'static str, Channel); 4] {
    let converted = origin.to_space(space).to_finite();
    let [first, second, third] = converted.channels;
    let [first_name, second_name, third_name] = space.channel_names();

    [
        (first_name, first),
        (second_name, second),
        (third_name, third),
        ("alpha", converted.alpha),
    ]
}

pub fn resolve(
    function: &ColorFunction,
    origin: &ColorValue,
    context: &Context<'_>,
) -> Result<Resolved, ParseError> {
    let origin = origin.resolve(&context.nested()?)?;
    let bindings = bind_channels(&origin.color, function.space);

    let (_, origin_alpha) = bindings[3];
    let color =
        function.resolve_channels(&bindings, origin_alpha, &context.options.dimension)?;

    Ok(Resolved {
        color: color.to_space(output_space(function.space)),
        legacy: false,
    })
}

/// `<name>(from <origin> c1 c2 c3 [/ alpha])`, with every `calc()` simplified as far
/// as possible without knowing the origin
pub fn to_specified_string(
    function: &ColorFunction,
    origin: &ColorValue,
    context: &Context<'_>,
) -> Result<String, ParseError> {
    let names = function.space.channel_names();
    let is_channel = |name: &str| name == "alpha" || names.contains(&name);
    let refers_to_channels = |value: &ChannelValue| match value {
        ChannelValue::Keyword(keyword) => is_channel(keyword),
        ChannelValue::Calc(node) => node.variables().into_iter().all(is_channel),
        _ => true,
    };

    if !function.channels.iter().all(refers_to_channels)
        || !function.alpha.iter().all(refers_to_channels)
    {
        return Err(ParseError);
    }

    let origin = origin.to_specified_string(&context.nested()?)?;
    let dimensions = &context.options.dimension;
    let [first, second, third] = function
        .channels
        .each_ref()
        .map(|channel| channel.to_specified_string(dimensions));
    let (first, second, third) = (first?, second?, third?);

    let alpha = match &function.alpha {
        Some(alpha) => format!(" / {}", alpha.to_specified_string(dimensions)?),
        None => String::new(),
    };

    let space = function.space.name();
    let prefix = if function.space.is_predefined() {
        format!("color(from {origin} {space}")
    } else {
        format!("{space}(from {origin}")
    };

    Ok(format!("{prefix} {first} {second} {third}{alpha})"))
}

#[cfg(test)]
mod tests {
    use super::bind_channels;
    use crate::{
        notation::{ColorValue, Context},
        options::Options,
        space::ColorSpace,
        syntax::CSSParse,
        tuple::{Channel, ColorTuple},
    };

    fn resolve(source: &str) -> ColorTuple {
        let options = Options::default();
        ColorValue::parse_from_str(source)
            .unwrap()
            .resolve(&Context::new(&options))
            .unwrap()
            .color
    }

    fn specified(source: &str) -> String {
        let options = Options::default();
        ColorValue::parse_from_str(source)
            .unwrap()
            .to_specified_string(&Context::new(&options))
            .unwrap()
    }

    #[test]
    fn bindings() {
        let origin = ColorTuple {
            space: ColorSpace::Rgb,
            channels: [Channel::Number(255.), Channel::None, Channel::Number(0.)],
            alpha: Channel::Number(0.5),
        };
        assert_eq!(
            bind_channels(&origin, ColorSpace::Srgb),
            [
                ("r", Channel::Number(1.)),
                ("g", Channel::None),
                ("b", Channel::Number(0.)),
                ("alpha", Channel::Number(0.5)),
            ]
        );
    }

    #[test]
    fn identity() {
        assert_eq!(
            resolve("rgb(from rebeccapurple r g b)"),
            ColorTuple::new(ColorSpace::Srgb, [0.4, 0.2, 0.6], 1.)
        );
    }

    #[test]
    fn channel_arithmetic() {
        assert_eq!(
            resolve("rgb(from #ff000080 calc(r / 5) 0 b / calc(alpha * 2))"),
            ColorTuple::new(ColorSpace::Srgb, [0.2, 0., 0.], 1.)
        );
        assert_eq!(
            resolve("lab(from lab(50 10 20) l b a / 0.5)"),
            ColorTuple::new(ColorSpace::Lab, [50., 20., 10.], 0.5)
        );
    }

    #[test]
    fn missing_channels_propagate() {
        let color = resolve("lch(from lch(50 none 120) l calc(c * 2) h)");
        assert_eq!(
            color.channels,
            [Channel::Number(50.), Channel::None, Channel::Number(120.)]
        );
    }

    #[test]
    fn unknown_channels() {
        let options = Options::default();
        let context = Context::new(&options);

        for source in [
            "rgb(from red x g b)",
            "rgb(from red calc(x + 1) g b)",
            "lab(from red l a b / calc(alpha * r))",
        ] {
            let value = ColorValue::parse_from_str(source).unwrap();
            assert!(value.to_specified_string(&context).is_err());
            assert!(value.resolve(&context).is_err());
        }

        assert_eq!(
            specified("rgb(from red r calc(g + e - e) calc(alpha * b))"),
            "rgb(from red r calc(g) calc(alpha * b))"
        );
    }

    #[test]
    fn specified_value() {
        assert_eq!(
            specified("rgb(from red calc(r * 0.5 + r * 0.5) g b)"),
            "rgb(from red calc((0.5 * r) + (0.5 * r)) g b)"
        );
        assert_eq!(
            specified("color(from #00f srgb r g calc(1 / 2) / alpha)"),
            "color(from rgb(0, 0, 255) srgb r g 0.5 / alpha)"
        );
    }
}
