//! <https://drafts.csswg.org/css-color-5/#color-mix>

use crate::{
    calc::{CalcNode, Scope, Term},
    conversion::normalize_hue,
    notation::{ColorValue, Context, Resolved},
    serialize::format_number,
    space::ColorSpace,
    syntax::{CSSParse, ParseError, Parser, Token},
    tuple::{Channel, ColorTuple},
};

/// <https://drafts.csswg.org/css-color-4/#hue-interpolation>
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HueInterpolationMethod {
    #[default]
    Shorter,
    Longer,
    Increasing,
    Decreasing,
}

impl HueInterpolationMethod {
    fn from_name(name: &str) -> Option<Self> {
        let method = match name.to_ascii_lowercase().as_str() {
            "shorter" => Self::Shorter,
            "longer" => Self::Longer,
            "increasing" => Self::Increasing,
            "decreasing" => Self::Decreasing,
            _ => return None,
        };
        Some(method)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shorter => "shorter",
            Self::Longer => "longer",
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
        }
    }

    /// Adjust two hues in `[0, 360)` so that linear interpolation between them
    /// travels around the hue circle in the right direction
    #[must_use]
    pub fn fix_up(&self, mut first: f64, mut second: f64) -> (f64, f64) {
        let delta = second - first;

        match self {
            Self::Shorter => {
                if delta > 180. {
                    first += 360.;
                } else if delta < -180. {
                    second += 360.;
                }
            },
            Self::Longer => {
                if 0. < delta && delta < 180. {
                    first += 360.;
                } else if -180. < delta && delta <= 0. {
                    second += 360.;
                }
            },
            Self::Increasing => {
                if second < first {
                    second += 360.;
                }
            },
            Self::Decreasing => {
                if first < second {
                    first += 360.;
                }
            },
        }

        (first, second)
    }
}

/// `color-mix(in <space> [<hue-method> hue], <color> [<percentage>], <color> [<percentage>])`
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMix {
    pub space: ColorSpace,
    pub hue_interpolation: Option<HueInterpolationMethod>,
    pub colors: [(ColorValue, Option<f64>); 2],
}

impl ColorMix {
    /// Parse the arguments of `color-mix()`, including the closing parenthesis
    pub fn parse_arguments(parser: &mut Parser) -> Result<Self, ParseError> {
        parser.expect_keyword("in")?;
        let space =
            ColorSpace::from_interpolation_name(&parser.expect_identifier()?).ok_or(ParseError)?;

        let hue_interpolation = parser.parse_optional_value(|parser| {
            let method =
                HueInterpolationMethod::from_name(&parser.expect_identifier()?).ok_or(ParseError)?;
            parser.expect_keyword("hue")?;
            Ok(method)
        });

        if hue_interpolation.is_some() && !space.is_polar() {
            return Err(ParseError);
        }

        parser.expect_token(Token::Comma)?;
        let first = parse_component(parser)?;
        parser.expect_token(Token::Comma)?;
        let second = parse_component(parser)?;
        parser.expect_token(Token::ParenthesisClose)?;

        Ok(Self {
            space,
            hue_interpolation,
            colors: [first, second],
        })
    }

    pub fn resolve(&self, context: &Context<'_>) -> Result<Resolved, ParseError> {
        let nested = context.nested()?;
        let [(first, first_percentage), (second, second_percentage)] = &self.colors;

        let first = first.resolve(&nested)?;
        let second = second.resolve(&nested)?;
        let (weights, alpha_multiplier) =
            normalize_percentages(*first_percentage, *second_percentage)?;

        let mut mixed = interpolate(
            &first.color.to_space_for_interpolation(self.space),
            &second.color.to_space_for_interpolation(self.space),
            weights,
            self.hue_interpolation.unwrap_or_default(),
        );
        mixed.alpha = mixed.alpha.map(|alpha| alpha * alpha_multiplier);

        let legacy = first.legacy
            && second.legacy
            && matches!(
                self.space,
                ColorSpace::Srgb | ColorSpace::Hsl | ColorSpace::Hwb
            );

        let color = if legacy {
            mixed.to_space(ColorSpace::Rgb)
        } else if self.space.is_legacy() {
            mixed.to_space(ColorSpace::Srgb)
        } else {
            mixed.to_finite()
        };

        Ok(Resolved { color, legacy })
    }

    pub fn to_specified_string(&self, context: &Context<'_>) -> Result<String, ParseError> {
        let nested = context.nested()?;

        let mut serialized = format!("color-mix(in {}", self.space.name());
        if let Some(method) = self.hue_interpolation {
            serialized.push_str(&format!(" {} hue", method.name()));
        }

        for (color, percentage) in &self.colors {
            serialized.push_str(", ");
            serialized.push_str(&color.to_specified_string(&nested)?);
            if let Some(percentage) = percentage {
                serialized.push_str(&format!(" {}%", format_number(*percentage)));
            }
        }

        serialized.push(')');
        Ok(serialized)
    }
}

/// A color followed or preceded by an optional percentage
fn parse_component(parser: &mut Parser) -> Result<(ColorValue, Option<f64>), ParseError> {
    let leading_percentage = parser.parse_optional_value(parse_percentage);
    let color = parser.parse::<ColorValue>()?;

    let percentage = match leading_percentage {
        Some(percentage) => Some(percentage),
        None => parser.parse_optional_value(parse_percentage),
    };

    Ok((color, percentage))
}

/// A percentage between `0%` and `100%`, possibly computed by `calc()`
fn parse_percentage(parser: &mut Parser) -> Result<f64, ParseError> {
    let percentage = if parser
        .peek_token_ignoring_whitespace(0)
        .is_some_and(|token| token.is_function("calc"))
    {
        match CalcNode::parse(parser)?.evaluate(&Scope::default()) {
            Some(Term::Percentage(percentage)) => percentage,
            _ => return Err(ParseError),
        }
    } else {
        match parser.next_token_ignoring_whitespace() {
            Some(Token::Percentage(percentage)) => percentage,
            _ => return Err(ParseError),
        }
    };

    if !(0. ..=100.).contains(&percentage) {
        return Err(ParseError);
    }

    Ok(percentage)
}

/// Turn the two optional percentages into the weights of both colors and a factor
/// for the resulting alpha.
///
/// <https://drafts.csswg.org/css-color-5/#color-mix-percent-norm>
fn normalize_percentages(
    first: Option<f64>,
    second: Option<f64>,
) -> Result<([f64; 2], f64), ParseError> {
    let (first, second) = match (first, second) {
        (None, None) => (50., 50.),
        (Some(first), None) => (first, 100. - first),
        (None, Some(second)) => (100. - second, second),
        (Some(first), Some(second)) => (first, second),
    };

    let sum = first + second;
    if sum == 0. {
        log::debug!("color-mix() percentages add up to zero");
        return Err(ParseError);
    }

    let alpha_multiplier = if sum < 100. { sum / 100. } else { 1. };
    Ok(([first / sum, second / sum], alpha_multiplier))
}

/// Interpolate between two colors in the same space, with premultiplied alpha.
///
/// The weights of both colors must add up to one. They are passed separately
/// since computing one from the other loses precision.
#[must_use]
pub fn interpolate(
    first: &ColorTuple,
    second: &ColorTuple,
    [first_weight, second_weight]: [f64; 2],
    hue_interpolation: HueInterpolationMethod,
) -> ColorTuple {
    let lerp = |a: f64, b: f64| a * first_weight + b * second_weight;

    let first_alpha = first.alpha.value().or(second.alpha.value());
    let second_alpha = second.alpha.value().or(first.alpha.value());

    let (alpha, first_premultiplier, second_premultiplier) = match (first_alpha, second_alpha) {
        (Some(first_alpha), Some(second_alpha)) => (
            Channel::Number(lerp(first_alpha, second_alpha)),
            first_alpha,
            second_alpha,
        ),
        _ => (Channel::None, 1., 1.),
    };
    let result_alpha = alpha.value().unwrap_or(1.);

    let hue_index = first.space.hue_index();
    let mut channels = [Channel::None; 3];

    for (index, channel) in channels.iter_mut().enumerate() {
        let (a, b) = match (first.channels[index].value(), second.channels[index].value()) {
            (Some(a), Some(b)) => (a, b),
            (Some(a), None) => (a, a),
            (None, Some(b)) => (b, b),
            (None, None) => continue,
        };

        let value = if hue_index == Some(index) {
            let (a, b) = hue_interpolation.fix_up(a, b);
            normalize_hue(lerp(a, b))
        } else if result_alpha == 0. {
            lerp(a, b)
        } else {
            lerp(a * first_premultiplier, b * second_premultiplier) / result_alpha
        };
        *channel = Channel::Number(value);
    }

    ColorTuple {
        space: first.space,
        channels,
        alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::{interpolate, normalize_percentages, ColorMix, HueInterpolationMethod};
    use crate::{
        notation::{ColorValue, Context},
        options::Options,
        space::ColorSpace,
        syntax::{CSSParse, ParseError, Parser},
        tuple::{Channel, ColorTuple},
    };

    fn mix(source: &str) -> Result<ColorTuple, ParseError> {
        let options = Options::default();
        let value = ColorValue::parse_from_str(source)?;
        Ok(value.resolve(&Context::new(&options))?.color)
    }

    #[test]
    fn hue_fix_up() {
        use HueInterpolationMethod::*;

        assert_eq!(Shorter.fix_up(10., 350.), (370., 350.));
        assert_eq!(Shorter.fix_up(350., 10.), (350., 370.));
        assert_eq!(Shorter.fix_up(10., 20.), (10., 20.));
        assert_eq!(Longer.fix_up(10., 20.), (370., 20.));
        assert_eq!(Longer.fix_up(20., 10.), (20., 370.));
        assert_eq!(Increasing.fix_up(350., 10.), (350., 370.));
        assert_eq!(Decreasing.fix_up(10., 350.), (370., 350.));
    }

    #[test]
    fn percentages() {
        assert_eq!(normalize_percentages(None, None), Ok(([0.5, 0.5], 1.)));
        assert_eq!(normalize_percentages(Some(10.), None), Ok(([0.1, 0.9], 1.)));
        assert_eq!(
            normalize_percentages(None, Some(25.)),
            Ok(([0.75, 0.25], 1.))
        );
        assert_eq!(
            normalize_percentages(Some(20.), Some(20.)),
            Ok(([0.5, 0.5], 0.4))
        );
        assert_eq!(
            normalize_percentages(Some(100.), Some(100.)),
            Ok(([0.5, 0.5], 1.))
        );
        assert_eq!(normalize_percentages(Some(0.), Some(0.)), Err(ParseError));
    }

    #[test]
    fn parse() {
        let value = ColorValue::parse_from_str("color-mix(in lch longer hue, 30% red, blue)");
        let Ok(ColorValue::Mix(mix)) = value else {
            panic!("not a color-mix()");
        };
        assert_eq!(mix.space, ColorSpace::Lch);
        assert_eq!(mix.hue_interpolation, Some(HueInterpolationMethod::Longer));
        assert_eq!(mix.colors[0].1, Some(30.));
        assert_eq!(mix.colors[1].1, None);

        let mut parser = Parser::new("in srgb shorter hue, red, blue)");
        assert!(ColorMix::parse_arguments(&mut parser).is_err());
        for value in [
            "color-mix(in srgb, red 120%, blue)",
            "color-mix(in rgb, red, blue)",
        ] {
            assert!(ColorValue::parse_from_str(value).is_err());
        }
    }

    #[test]
    fn mix_in_srgb() {
        assert_eq!(
            mix("color-mix(in srgb, blue, red)"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [127.5, 0., 127.5], 1.))
        );
    }

    #[test]
    fn premultiplied_alpha() {
        let transparent_red = ColorTuple::new(ColorSpace::Srgb, [1., 0., 0.], 0.);
        let blue = ColorTuple::new(ColorSpace::Srgb, [0., 0., 1.], 1.);

        let mixed = interpolate(
            &transparent_red,
            &blue,
            [0.5, 0.5],
            HueInterpolationMethod::Shorter,
        );
        assert_eq!(mixed, ColorTuple::new(ColorSpace::Srgb, [0., 0., 1.], 0.5));
    }

    #[test]
    fn missing_channels_are_borrowed() {
        let first = ColorTuple {
            space: ColorSpace::Srgb,
            channels: [Channel::None, Channel::Number(0.5), Channel::None],
            alpha: Channel::None,
        };
        let second = ColorTuple {
            space: ColorSpace::Srgb,
            channels: [Channel::Number(1.), Channel::Number(0.), Channel::None],
            alpha: Channel::None,
        };

        let mixed = interpolate(&first, &second, [0.5, 0.5], HueInterpolationMethod::Shorter);
        assert_eq!(
            mixed.channels,
            [Channel::Number(1.), Channel::Number(0.25), Channel::None]
        );
        assert_eq!(mixed.alpha, Channel::None);
    }

    #[test]
    fn non_legacy_inputs() {
        let mixed = mix("color-mix(in oklab, oklab(0.2 0 0), oklab(0.6 0.1 -0.1))").unwrap();
        assert_eq!(mixed.space, ColorSpace::Oklab);
        let [l, a, b] = mixed.values();
        assert!((l - 0.4).abs() < 1e-9);
        assert!((a - 0.05).abs() < 1e-9);
        assert!((b + 0.05).abs() < 1e-9);

        let mixed = mix("color-mix(in hsl, lab(50 0 0), red)").unwrap();
        assert_eq!(mixed.space, ColorSpace::Srgb);
    }
}
