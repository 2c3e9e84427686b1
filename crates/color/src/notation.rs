//! Parsing and resolution of `<color>` values.
//!
//! <https://drafts.csswg.org/css-color/#color-syntax>
//!
//! Values are parsed into a [ColorValue] tree first. The tree is then either resolved
//! into a [ColorTuple] or serialized back into its specified form.

use crate::{
    calc::{angle_to_degrees, CalcNode, Scope, Term},
    conversion::normalize_hue,
    custom_property,
    mix::ColorMix,
    named,
    options::{Lookup, Options},
    relative,
    serialize::{format_number, serialize_color},
    space::ColorSpace,
    syntax::{CSSParse, ParseError, Parser, Token},
    tuple::{Channel, ColorTuple},
};

/// How deeply relative colors, `color-mix()` and `currentcolor` may be nested
pub const MAX_NESTING_DEPTH: usize = 32;

/// A single argument of a color function, as written
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelValue {
    None,
    Number(f64),

    /// Stored on a 0-100 scale
    Percentage(f64),
    Dimension(f64, String),

    /// A channel keyword of a relative color, like `r` or `alpha`
    Keyword(String),
    Calc(CalcNode),
}

impl ChannelValue {
    fn parse_modern(parser: &mut Parser) -> Result<Self, ParseError> {
        if parser
            .peek_token_ignoring_whitespace(0)
            .is_some_and(|token| token.is_function("calc"))
        {
            return Ok(Self::Calc(parser.parse()?));
        }

        let value = match parser.next_token_ignoring_whitespace() {
            Some(Token::Number(n)) => Self::Number(n),
            Some(Token::Percentage(p)) => Self::Percentage(p),
            Some(Token::Dimension(value, unit)) => Self::Dimension(value, unit),
            Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case("none") => Self::None,
            Some(Token::Ident(ident)) => Self::Keyword(ident.to_ascii_lowercase()),
            _ => return Err(ParseError),
        };
        Ok(value)
    }

    /// Legacy (comma separated) syntax allows neither `none` nor channel keywords
    fn parse_legacy(parser: &mut Parser) -> Result<Self, ParseError> {
        match Self::parse_modern(parser)? {
            Self::None | Self::Keyword(_) => Err(ParseError),
            value => Ok(value),
        }
    }

    /// Resolve the value to a number in the native units of its channel.
    ///
    /// Percentages are resolved against the scope's percentage basis and angles are only
    /// allowed if the scope converts them to degrees. The result is always finite.
    pub fn resolve(&self, scope: &Scope<'_>) -> Result<Channel, ParseError> {
        let value = match self {
            Self::None => return Ok(Channel::None),
            Self::Number(n) => *n,
            Self::Percentage(p) => p / 100. * scope.percentage_basis.ok_or(ParseError)?,
            Self::Dimension(value, unit) if scope.angles_as_degrees => {
                angle_to_degrees(*value, unit).ok_or(ParseError)?
            },
            Self::Dimension(..) => return Err(ParseError),
            Self::Keyword(name) => {
                let (_, channel) = scope
                    .variables
                    .iter()
                    .find(|(known, _)| known == name)
                    .ok_or(ParseError)?;
                return Ok(channel.to_finite());
            },
            Self::Calc(node) => match node.evaluate(scope) {
                None => return Ok(Channel::None),
                Some(Term::Number(n)) => n,
                Some(_) => return Err(ParseError),
            },
        };

        Ok(Channel::Number(value).to_finite())
    }

    /// Serialize the value as written, with `calc()` expressions simplified
    pub fn to_specified_string(&self, dimensions: &Lookup<f64>) -> Result<String, ParseError> {
        let serialized = match self {
            Self::None => "none".to_string(),
            Self::Number(n) => format_number(*n),
            Self::Percentage(p) => format!("{}%", format_number(*p)),
            Self::Dimension(value, unit) => format!("{}{unit}", format_number(*value)),
            Self::Keyword(keyword) => keyword.clone(),
            Self::Calc(node) => {
                let scope = Scope {
                    dimensions: Some(dimensions),
                    ..Scope::default()
                };
                node.evaluate(&scope).ok_or(ParseError)?.to_calc_string()
            },
        };
        Ok(serialized)
    }
}

/// One of `rgb()`, `hsl()`, `hwb()`, `lab()`, `lch()`, `oklab()`, `oklch()` or `color()`
#[derive(Clone, Debug, PartialEq)]
pub struct ColorFunction {
    pub space: ColorSpace,

    /// The origin of a relative color (`rgb(from <origin> ...)`)
    pub origin: Option<Box<ColorValue>>,
    pub channels: [ChannelValue; 3],
    pub alpha: Option<ChannelValue>,
}

impl ColorFunction {
    /// Parse the arguments of a color function, including the closing parenthesis.
    ///
    /// The function token itself must already have been consumed.
    fn parse_arguments(parser: &mut Parser, name: &str) -> Result<Self, ParseError> {
        let (space, allows_legacy_syntax) = match name.to_ascii_lowercase().as_str() {
            "rgb" | "rgba" => (Some(ColorSpace::Rgb), true),
            "hsl" | "hsla" => (Some(ColorSpace::Hsl), true),
            "hwb" => (Some(ColorSpace::Hwb), true),
            "lab" => (Some(ColorSpace::Lab), false),
            "lch" => (Some(ColorSpace::Lch), false),
            "oklab" => (Some(ColorSpace::Oklab), false),
            "oklch" => (Some(ColorSpace::Oklch), false),
            "color" => (None, false),
            _ => return Err(ParseError),
        };

        if let Some(space) = space.filter(|_| allows_legacy_syntax) {
            if let Some(function) =
                parser.parse_optional_value(|parser| Self::parse_legacy(parser, space))
            {
                return Ok(function);
            }
        }

        Self::parse_modern(parser, space)
    }

    /// <https://drafts.csswg.org/css-color/#typedef-legacy-rgb-syntax>
    fn parse_legacy(parser: &mut Parser, space: ColorSpace) -> Result<Self, ParseError> {
        let first = ChannelValue::parse_legacy(parser)?;
        parser.expect_token(Token::Comma)?;
        let second = ChannelValue::parse_legacy(parser)?;
        parser.expect_token(Token::Comma)?;
        let third = ChannelValue::parse_legacy(parser)?;

        let alpha = parser.parse_optional_value(|parser| {
            parser.expect_token(Token::Comma)?;
            ChannelValue::parse_legacy(parser)
        });
        parser.expect_token(Token::ParenthesisClose)?;

        let channels = [first, second, third];
        let is_valid = if space == ColorSpace::Rgb {
            // Either three numbers or three percentages, but not a mix of both
            let has_numbers = channels
                .iter()
                .any(|channel| matches!(channel, ChannelValue::Number(_)));
            let has_percentages = channels
                .iter()
                .any(|channel| matches!(channel, ChannelValue::Percentage(_)));
            let has_dimensions = channels
                .iter()
                .any(|channel| matches!(channel, ChannelValue::Dimension(..)));
            !(has_numbers && has_percentages) && !has_dimensions
        } else {
            channels[1..].iter().all(|channel| {
                matches!(channel, ChannelValue::Percentage(_) | ChannelValue::Calc(_))
            })
        };

        if !is_valid {
            return Err(ParseError);
        }

        Ok(Self {
            space,
            origin: None,
            channels,
            alpha,
        })
    }

    /// Space separated arguments, optionally with an origin color and a `/ alpha` suffix.
    ///
    /// If `space` is `None` then this is a `color()` function and the space is named
    /// by the arguments.
    fn parse_modern(parser: &mut Parser, space: Option<ColorSpace>) -> Result<Self, ParseError> {
        let origin = if parser
            .peek_token_ignoring_whitespace(0)
            .is_some_and(|token| token.is_ident("from"))
        {
            parser.expect_keyword("from")?;
            Some(Box::new(parser.parse::<ColorValue>()?))
        } else {
            None
        };

        let space = match space {
            Some(space) => space,
            None => ColorSpace::from_predefined_name(&parser.expect_identifier()?)
                .ok_or(ParseError)?,
        };

        let channels = [
            ChannelValue::parse_modern(parser)?,
            ChannelValue::parse_modern(parser)?,
            ChannelValue::parse_modern(parser)?,
        ];

        let alpha = parser.parse_optional_value(|parser| {
            parser.expect_token(Token::Delim('/'))?;
            ChannelValue::parse_modern(parser)
        });
        parser.expect_token(Token::ParenthesisClose)?;

        Ok(Self {
            space,
            origin,
            channels,
            alpha,
        })
    }

    pub fn resolve(&self, context: &Context<'_>) -> Result<Resolved, ParseError> {
        if let Some(origin) = &self.origin {
            return relative::resolve(self, origin, context);
        }

        let color = self.resolve_channels(&[], Channel::Number(1.), &context.options.dimension)?;
        Ok(Resolved {
            color,
            legacy: self.space.is_legacy(),
        })
    }

    /// Resolve every argument, with `variables` bound as channel keywords.
    ///
    /// `default_alpha` is used if the function has no alpha argument.
    pub fn resolve_channels(
        &self,
        variables: &[(&'static str, Channel)],
        default_alpha: Channel,
        dimensions: &Lookup<f64>,
    ) -> Result<ColorTuple, ParseError> {
        let bases = self.space.percentage_basis();
        let hue_index = self.space.hue_index();

        let mut channels = [Channel::None; 3];
        for (index, (channel, value)) in channels.iter_mut().zip(&self.channels).enumerate() {
            let is_hue = hue_index == Some(index);
            let scope = Scope {
                variables,
                percentage_basis: (!is_hue).then_some(bases[index]),
                angles_as_degrees: is_hue,
                dimensions: Some(dimensions),
            };
            *channel = value.resolve(&scope)?;
        }

        let alpha = match &self.alpha {
            Some(alpha) => {
                let scope = Scope {
                    variables,
                    percentage_basis: Some(1.),
                    angles_as_degrees: false,
                    dimensions: Some(dimensions),
                };
                alpha.resolve(&scope)?.map(|alpha| alpha.clamp(0., 1.))
            },
            None => default_alpha,
        };

        Ok(clamp_to_space(ColorTuple {
            space: self.space,
            channels,
            alpha,
        }))
    }
}

/// Apply the range restrictions that are enforced at parse time
fn clamp_to_space(mut color: ColorTuple) -> ColorTuple {
    let [lightness, chroma, _] = &mut color.channels;

    match color.space {
        ColorSpace::Lab => *lightness = lightness.map(|l| l.clamp(0., 100.)),
        ColorSpace::Lch => {
            *lightness = lightness.map(|l| l.clamp(0., 100.));
            *chroma = chroma.map(|c| c.max(0.));
        },
        ColorSpace::Oklab => *lightness = lightness.map(|l| l.clamp(0., 1.)),
        ColorSpace::Oklch => {
            *lightness = lightness.map(|l| l.clamp(0., 1.));
            *chroma = chroma.map(|c| c.max(0.));
        },
        ColorSpace::Hsl => *chroma = chroma.map(|saturation| saturation.max(0.)),
        _ => {},
    }

    if let Some(hue_index) = color.space.hue_index() {
        color.channels[hue_index] = color.channels[hue_index].map(|hue| {
            let hue = normalize_hue(hue);
            // Infinite hues
            if hue.is_nan() {
                0.
            } else {
                hue
            }
        });
    }

    color
}

/// <https://drafts.csswg.org/css-color/#typedef-color>
#[derive(Clone, Debug, PartialEq)]
pub enum ColorValue {
    /// A named color, in lowercase
    Named(String),
    Transparent,
    CurrentColor,
    Hex([u8; 4]),
    Function(ColorFunction),
    Mix(Box<ColorMix>),
}

impl ColorValue {
    fn from_keyword(keyword: &str) -> Result<Self, ParseError> {
        let keyword = keyword.to_ascii_lowercase();
        let value = match keyword.as_str() {
            "transparent" => Self::Transparent,
            "currentcolor" => Self::CurrentColor,
            name if named::lookup(name).is_some() => Self::Named(keyword),
            _ => return Err(ParseError),
        };
        Ok(value)
    }

    pub fn resolve(&self, context: &Context<'_>) -> Result<Resolved, ParseError> {
        match self {
            Self::Named(name) => {
                let [red, green, blue] = named::lookup(name).ok_or(ParseError)?;
                Ok(Resolved::legacy_rgb([red, green, blue, u8::MAX]))
            },
            Self::Transparent => Ok(Resolved {
                color: ColorTuple::transparent(),
                legacy: true,
            }),
            Self::CurrentColor => context.resolve_current_color(),
            Self::Hex(rgba) => Ok(Resolved::legacy_rgb(*rgba)),
            Self::Function(function) => function.resolve(context),
            Self::Mix(mix) => mix.resolve(context),
        }
    }

    /// Serialize the value the way it was specified.
    ///
    /// Keywords are kept, relative colors and `color-mix()` keep their structure and
    /// everything else is serialized like its computed value.
    pub fn to_specified_string(&self, context: &Context<'_>) -> Result<String, ParseError> {
        match self {
            Self::Named(name) => Ok(name.clone()),
            Self::Transparent => Ok("transparent".to_string()),
            Self::CurrentColor => Ok("currentcolor".to_string()),
            Self::Function(function) => match &function.origin {
                Some(origin) => relative::to_specified_string(function, origin, context),
                None => Ok(function.resolve(context)?.serialize()),
            },
            Self::Mix(mix) => mix.to_specified_string(context),
            Self::Hex(_) => Ok(self.resolve(context)?.serialize()),
        }
    }
}

impl CSSParse for ColorValue {
    fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let value = match parser.next_token_ignoring_whitespace() {
            Some(Token::Ident(keyword)) => Self::from_keyword(&keyword)?,
            Some(Token::Hash(digits, _)) => Self::Hex(parse_hex_digits(&digits)?),
            Some(Token::Function(name)) if name.eq_ignore_ascii_case("color-mix") => {
                let mix = parser.parse_nested_block(ColorMix::parse_arguments)?;
                Self::Mix(Box::new(mix))
            },
            Some(Token::Function(name)) => {
                let function = parser
                    .parse_nested_block(|parser| ColorFunction::parse_arguments(parser, &name))?;
                Self::Function(function)
            },
            _ => return Err(ParseError),
        };
        Ok(value)
    }
}

/// <https://drafts.csswg.org/css-color/#hex-notation>
fn parse_hex_digits(digits: &str) -> Result<[u8; 4], ParseError> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError);
    }

    let parse = |index: usize, length: usize| {
        u8::from_str_radix(&digits[index..index + length], 16).map_err(|_| ParseError)
    };
    let digit = |index: usize| parse(index, 1);
    let byte = |index: usize| parse(index, 2);

    let rgba = match digits.len() {
        // Shorter versions, each digit is "duplicated"
        3 => [digit(0)? * 0x11, digit(1)? * 0x11, digit(2)? * 0x11, u8::MAX],
        4 => [
            digit(0)? * 0x11,
            digit(1)? * 0x11,
            digit(2)? * 0x11,
            digit(3)? * 0x11,
        ],
        6 => [byte(0)?, byte(2)?, byte(4)?, u8::MAX],
        8 => [byte(0)?, byte(2)?, byte(4)?, byte(6)?],
        _ => return Err(ParseError),
    };
    Ok(rgba)
}

/// A color after resolution
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    pub color: ColorTuple,

    /// Whether the color was written in a legacy sRGB syntax (named colors, hex,
    /// `rgb()`, `hsl()` or `hwb()`)
    pub legacy: bool,
}

impl Resolved {
    fn legacy_rgb([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self {
            color: ColorTuple::new(
                ColorSpace::Rgb,
                [red.into(), green.into(), blue.into()],
                f64::from(alpha) / 255.,
            ),
            legacy: true,
        }
    }

    #[must_use]
    pub fn serialize(&self) -> String {
        serialize_color(&self.color)
    }
}

/// State that is carried through the resolution of nested colors
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    pub options: &'a Options,
    depth: usize,

    /// Set while the value of `currentcolor` is being resolved
    in_current_color: bool,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(options: &'a Options) -> Self {
        Self {
            options,
            depth: 0,
            in_current_color: false,
        }
    }

    /// The context for a color that is nested one level deeper
    pub fn nested(&self) -> Result<Self, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            log::debug!("Color is nested more than {MAX_NESTING_DEPTH} levels deep");
            return Err(ParseError);
        }

        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }

    fn resolve_current_color(&self) -> Result<Resolved, ParseError> {
        if self.in_current_color {
            log::debug!("currentcolor refers to itself");
            return Err(ParseError);
        }

        let value = self.options.current_color.as_deref().ok_or(ParseError)?;
        let mut parser = custom_property::parse_value(value, self.options)?;
        let color = ColorValue::parse_complete(&mut parser)?;

        let context = Self {
            in_current_color: true,
            ..self.nested()?
        };
        color.resolve(&context)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelValue, ColorFunction, ColorValue, Context};
    use crate::{
        options::Options,
        space::ColorSpace,
        syntax::{CSSParse, ParseError},
        tuple::{Channel, ColorTuple},
    };

    fn resolve(source: &str) -> Result<ColorTuple, ParseError> {
        let options = Options::default();
        let value = ColorValue::parse_from_str(source)?;
        Ok(value.resolve(&Context::new(&options))?.color)
    }

    #[test]
    fn parse_color_name() {
        assert_eq!(
            resolve("MistyRose"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [255., 228., 225.], 1.))
        );
        assert!(ColorValue::parse_from_str("notacolor").is_err());
    }

    #[test]
    fn parse_hex_color_code() {
        // 6 digit hex color
        assert_eq!(
            ColorValue::parse_from_str("#F00f10"),
            Ok(ColorValue::Hex([0xF0, 0x0F, 0x10, 0xFF]))
        );

        // 8 digit hex color
        assert_eq!(
            ColorValue::parse_from_str("#F00f10AB"),
            Ok(ColorValue::Hex([0xF0, 0x0F, 0x10, 0xAB]))
        );

        // 3 digit hex color
        assert_eq!(
            ColorValue::parse_from_str("#abc"),
            Ok(ColorValue::Hex([0xAA, 0xBB, 0xCC, 0xFF]))
        );

        // 4 digit hex color
        assert_eq!(
            ColorValue::parse_from_str("#abcd"),
            Ok(ColorValue::Hex([0xAA, 0xBB, 0xCC, 0xDD]))
        );

        assert!(ColorValue::parse_from_str("#abcde").is_err());
        assert!(ColorValue::parse_from_str("#ggg").is_err());
    }

    #[test]
    fn parse_legacy_rgb() {
        assert_eq!(
            resolve("rgb(255, 0, 0)"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [255., 0., 0.], 1.))
        );
        assert_eq!(
            resolve("rgba(100%, 50%, 0%, 0.5)"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [255., 127.5, 0.], 0.5))
        );

        // Numbers and percentages must not be mixed
        assert!(ColorValue::parse_from_str("rgb(255, 50%, 0)").is_err());

        // none is not allowed in legacy syntax
        assert!(ColorValue::parse_from_str("rgb(none, 0, 0)").is_err());
    }

    #[test]
    fn parse_modern_rgb() {
        assert_eq!(
            resolve("rgb(100% 0% 0% / 50%)"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [255., 0., 0.], 0.5))
        );
        assert_eq!(
            resolve("rgb(none 20 30 / none)"),
            Ok(ColorTuple {
                space: ColorSpace::Rgb,
                channels: [Channel::None, Channel::Number(20.), Channel::Number(30.)],
                alpha: Channel::None,
            })
        );
        assert!(ColorValue::parse_from_str("rgb(1 2 3 4)").is_err());
    }

    #[test]
    fn parse_hsl_and_hwb() {
        assert_eq!(
            resolve("hsl(-120, 100%, 50%)"),
            Ok(ColorTuple::new(ColorSpace::Hsl, [240., 100., 50.], 1.))
        );
        assert_eq!(
            resolve("hsla(0.5turn 50 50% / 0.25)"),
            Ok(ColorTuple::new(ColorSpace::Hsl, [180., 50., 50.], 0.25))
        );
        assert_eq!(
            resolve("hwb(90deg 10% 20%)"),
            Ok(ColorTuple::new(ColorSpace::Hwb, [90., 10., 20.], 1.))
        );

        // Hues are not percentages
        assert!(resolve("hsl(10% 50% 50%)").is_err());

        // Legacy saturation and lightness have to be percentages
        assert!(ColorValue::parse_from_str("hsl(120, 50, 50)").is_err());
    }

    #[test]
    fn parse_lab_family() {
        assert_eq!(
            resolve("lab(120% 50% -50%)"),
            Ok(ColorTuple::new(ColorSpace::Lab, [100., 62.5, -62.5], 1.))
        );
        assert_eq!(
            resolve("lch(50 -10 400)"),
            Ok(ColorTuple::new(ColorSpace::Lch, [50., 0., 40.], 1.))
        );
        assert_eq!(
            resolve("oklch(50% 0.2 -90 / 2)"),
            Ok(ColorTuple::new(ColorSpace::Oklch, [0.5, 0.2, 270.], 1.))
        );
        assert_eq!(
            resolve("oklab(0.5 100% 0)"),
            Ok(ColorTuple::new(ColorSpace::Oklab, [0.5, 0.4, 0.], 1.))
        );
    }

    #[test]
    fn parse_predefined() {
        assert_eq!(
            resolve("color(display-p3 1 50% 0)"),
            Ok(ColorTuple::new(ColorSpace::DisplayP3, [1., 0.5, 0.], 1.))
        );
        assert_eq!(
            resolve("color(xyz 0.5 0.5 0.5)"),
            Ok(ColorTuple::new(ColorSpace::XyzD65, [0.5; 3], 1.))
        );
        assert!(ColorValue::parse_from_str("color(unknown 1 0 0)").is_err());
        assert!(ColorValue::parse_from_str("color(srgb 1 0)").is_err());
    }

    #[test]
    fn calc_channels() {
        assert_eq!(
            resolve("rgb(calc(100 + 55) calc(50%) 0 / calc(1 / 4))"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [155., 127.5, 0.], 0.25))
        );
        assert_eq!(
            resolve("rgb(calc(nan) 0 0)"),
            Ok(ColorTuple::new(ColorSpace::Rgb, [0., 0., 0.], 1.))
        );
    }

    #[test]
    fn keywords_need_an_origin() {
        let function = ColorValue::parse_from_str("rgb(r g b)").unwrap();
        assert!(matches!(
            &function,
            ColorValue::Function(ColorFunction {
                channels: [ChannelValue::Keyword(_), _, _],
                ..
            })
        ));
        assert!(resolve("rgb(r g b)").is_err());
    }

    #[test]
    fn current_color() {
        let options = Options {
            current_color: Some("rgb(1 2 3)".to_string()),
            ..Options::default()
        };
        let value = ColorValue::parse_from_str("currentColor").unwrap();
        assert_eq!(
            value.resolve(&Context::new(&options)).map(|resolved| resolved.color),
            Ok(ColorTuple::new(ColorSpace::Rgb, [1., 2., 3.], 1.))
        );

        let cyclic = Options {
            current_color: Some("currentcolor".to_string()),
            ..Options::default()
        };
        assert!(value.resolve(&Context::new(&cyclic)).is_err());

        // No value for currentcolor
        assert!(resolve("currentcolor").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let mut source = "red".to_string();
        for _ in 0..40 {
            source = format!("rgb(from {source} r g b)");
        }
        assert!(resolve(&source).is_err());
    }
}
