//! `calc()` expressions.
//!
//! <https://drafts.csswg.org/css-values-4/#calc-func>
//!
//! Expressions are parsed into a [CalcNode] tree once and can then be evaluated
//! multiple times, for example once without bindings (to re-serialize a specified
//! value) and once with the channels of a relative color's origin.

mod calculator;

pub use calculator::{Calculator, ExpressionKind, Term};

use crate::{
    options::Lookup,
    syntax::{CSSParse, ParseError, Parser, Token},
    tuple::Channel,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CalcNode {
    /// A number, percentage, dimension or identifier
    Value(Term),
    Sum(Vec<(Operator, CalcNode)>),
    Product(Vec<(Operator, CalcNode)>),
}

/// Everything an expression may refer to while it is evaluated
#[derive(Clone, Copy, Default)]
pub struct Scope<'a> {
    /// Named channels of a relative color's origin
    pub variables: &'a [(&'static str, Channel)],

    /// If set, percentages resolve to numbers relative to this value
    pub percentage_basis: Option<f64>,

    /// Convert angles to plain numbers (in degrees), used for hue channels
    pub angles_as_degrees: bool,

    /// Pixel size of relative length units
    pub dimensions: Option<&'a Lookup<f64>>,
}

impl CalcNode {
    /// Parse everything up to (and including) the closing parenthesis of a block
    fn parse_block_contents(parser: &mut Parser) -> Result<Self, ParseError> {
        let node = Self::parse_sum(parser)?;
        parser.expect_token(Token::ParenthesisClose)?;
        Ok(node)
    }

    fn parse_sum(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut operands = vec![(Operator::Add, Self::parse_product(parser)?)];

        // "+" and "-" must be surrounded by whitespace
        while let Some(operand) = parser.parse_optional_value(|parser| {
            parser.expect_whitespace()?;
            let operator = match parser.next_token() {
                Some(Token::Delim('+')) => Operator::Add,
                Some(Token::Delim('-')) => Operator::Subtract,
                _ => return Err(ParseError),
            };
            parser.expect_whitespace()?;
            Ok((operator, Self::parse_product(parser)?))
        }) {
            operands.push(operand);
        }

        if operands.len() == 1 {
            Ok(operands.remove(0).1)
        } else {
            Ok(Self::Sum(operands))
        }
    }

    fn parse_product(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut operands = vec![(Operator::Multiply, Self::parse_value(parser)?)];

        while let Some(operand) = parser.parse_optional_value(|parser| {
            let operator = match parser.next_token_ignoring_whitespace() {
                Some(Token::Delim('*')) => Operator::Multiply,
                Some(Token::Delim('/')) => Operator::Divide,
                _ => return Err(ParseError),
            };
            Ok((operator, Self::parse_value(parser)?))
        }) {
            operands.push(operand);
        }

        if operands.len() == 1 {
            Ok(operands.remove(0).1)
        } else {
            Ok(Self::Product(operands))
        }
    }

    fn parse_value(parser: &mut Parser) -> Result<Self, ParseError> {
        let value = match parser.next_token_ignoring_whitespace() {
            Some(Token::Number(n)) => Self::Value(Term::Number(n)),
            Some(Token::Percentage(p)) => Self::Value(Term::Percentage(p)),
            Some(Token::Dimension(value, unit)) => Self::Value(Term::Dimension(value, unit)),
            Some(Token::Ident(name)) => Self::Value(Term::Symbol(name.to_ascii_lowercase())),
            Some(token) if token == Token::ParenthesisOpen || token.is_function("calc") => {
                parser.parse_nested_block(Self::parse_block_contents)?
            },
            _ => return Err(ParseError),
        };
        Ok(value)
    }

    /// Evaluate the expression.
    ///
    /// Returns `None` if the expression refers to a channel that is missing.
    #[must_use]
    pub fn evaluate(&self, scope: &Scope<'_>) -> Option<Term> {
        match self {
            Self::Value(term) => evaluate_leaf(term, scope),
            Self::Sum(operands) => {
                let mut calculator = Calculator::default();
                for (operator, operand) in operands {
                    let term = operand.evaluate(scope)?;
                    if *operator == Operator::Subtract {
                        calculator.subtract(term);
                    } else {
                        calculator.add(term);
                    }
                }
                calculator.sum()
            },
            Self::Product(operands) => {
                let mut calculator = Calculator::default();
                for (operator, operand) in operands {
                    let term = operand.evaluate(scope)?;
                    if *operator == Operator::Divide {
                        calculator.divide_by(term);
                    } else {
                        calculator.multiply_by(term);
                    }
                }
                calculator.multiply()
            },
        }
    }

    /// The identifiers in the expression that are not math constants
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Self::Value(Term::Symbol(name)) if constant(name).is_none() => vec![name.as_str()],
            Self::Value(_) => vec![],
            Self::Sum(operands) | Self::Product(operands) => operands
                .iter()
                .flat_map(|(_, operand)| operand.variables())
                .collect(),
        }
    }
}

impl CSSParse for CalcNode {
    /// Parse a `calc()` function
    fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        match parser.next_token_ignoring_whitespace() {
            Some(token) if token.is_function("calc") => {},
            _ => return Err(ParseError),
        }

        parser.parse_nested_block(Self::parse_block_contents)
    }
}

fn evaluate_leaf(term: &Term, scope: &Scope<'_>) -> Option<Term> {
    let evaluated = match term {
        Term::Percentage(p) => match scope.percentage_basis {
            Some(basis) => Term::Number(p / 100. * basis),
            None => Term::Percentage(*p),
        },
        Term::Dimension(value, unit) => {
            let degrees = angle_to_degrees(*value, unit).filter(|_| scope.angles_as_degrees);
            if let Some(degrees) = degrees {
                Term::Number(degrees)
            } else if let Some(pixels) = absolute_length_to_pixels(*value, unit) {
                Term::Dimension(pixels, "px".to_string())
            } else if let Some(factor) = scope.dimensions.and_then(|lookup| lookup.get(unit)) {
                Term::Dimension(value * factor, "px".to_string())
            } else {
                term.clone()
            }
        },
        Term::Symbol(name) => {
            if let Some((_, channel)) = scope.variables.iter().find(|(known, _)| known == name) {
                match channel {
                    Channel::Number(n) => Term::Number(*n),
                    Channel::None => return None,
                }
            } else if let Some(value) = constant(name) {
                Term::Number(value)
            } else {
                term.clone()
            }
        },
        other => other.clone(),
    };
    Some(evaluated)
}

/// <https://drafts.csswg.org/css-values-4/#calc-constants>
fn constant(name: &str) -> Option<f64> {
    let value = match name {
        "e" => std::f64::consts::E,
        "pi" => std::f64::consts::PI,
        "infinity" => f64::INFINITY,
        "-infinity" => f64::NEG_INFINITY,
        "nan" => f64::NAN,
        _ => return None,
    };
    Some(value)
}

/// <https://drafts.csswg.org/css-values-4/#angles>
#[must_use]
pub fn angle_to_degrees(value: f64, unit: &str) -> Option<f64> {
    let degrees = match unit {
        "deg" => value,
        "grad" => value * 0.9,
        "rad" => value.to_degrees(),
        "turn" => value * 360.,
        _ => return None,
    };
    Some(degrees)
}

/// <https://drafts.csswg.org/css-values-4/#absolute-lengths>
#[must_use]
pub fn absolute_length_to_pixels(value: f64, unit: &str) -> Option<f64> {
    let pixels = match unit {
        "px" => value,
        "in" => value * 96.,
        "cm" => value * 96. / 2.54,
        "mm" => value * 96. / 25.4,
        "q" => value * 96. / 101.6,
        "pt" => value * 4. / 3.,
        "pc" => value * 16.,
        _ => return None,
    };
    Some(pixels)
}

#[cfg(test)]
mod tests {
    use super::{CalcNode, Scope, Term};
    use crate::{options::Lookup, syntax::CSSParse, tuple::Channel};

    fn evaluate(source: &str, scope: &Scope<'_>) -> Option<String> {
        let node = CalcNode::parse_from_str(source).unwrap();
        node.evaluate(scope).map(|term| term.to_string())
    }

    #[test]
    fn arithmetic() {
        let scope = Scope::default();
        assert_eq!(evaluate("calc(1 / 2)", &scope).as_deref(), Some("0.5"));
        assert_eq!(
            evaluate("calc((1 + 2) * 3 - 4)", &scope).as_deref(),
            Some("5")
        );
        assert_eq!(
            evaluate("calc(10% + 5% * 2)", &scope).as_deref(),
            Some("20%")
        );
    }

    #[test]
    fn plus_requires_whitespace() {
        assert!(CalcNode::parse_from_str("calc(1+2)").is_err());
        assert!(CalcNode::parse_from_str("calc(1 +2)").is_err());
    }

    #[test]
    fn symbols_are_kept() {
        let scope = Scope::default();
        assert_eq!(
            evaluate("calc(a * 0.5 + a * 0.5)", &scope).as_deref(),
            Some("(0.5 * a) + (0.5 * a)")
        );
        assert_eq!(evaluate("calc(r + 10)", &scope).as_deref(), Some("10 + r"));
    }

    #[test]
    fn bound_variables() {
        let variables = [("r", Channel::Number(102.)), ("g", Channel::None)];
        let scope = Scope {
            variables: &variables,
            percentage_basis: Some(255.),
            ..Scope::default()
        };
        assert_eq!(evaluate("calc(r + 10%)", &scope).as_deref(), Some("127.5"));
        assert_eq!(evaluate("calc(g * 2)", &scope), None);
    }

    #[test]
    fn variables() {
        let node = CalcNode::parse_from_str("calc(r * pi + (e - alpha) / x)").unwrap();
        assert_eq!(node.variables(), ["r", "alpha", "x"]);
    }

    #[test]
    fn constants() {
        let scope = Scope::default();
        assert_eq!(evaluate("calc(pi / pi)", &scope).as_deref(), Some("1"));
        assert_eq!(
            evaluate("calc(infinity)", &scope).as_deref(),
            Some("Infinity")
        );
        assert_eq!(evaluate("calc(nan * 0)", &scope).as_deref(), Some("NaN"));
    }

    #[test]
    fn units() {
        let scope = Scope {
            angles_as_degrees: true,
            ..Scope::default()
        };
        assert_eq!(
            evaluate("calc(0.5turn + 10deg)", &scope).as_deref(),
            Some("190")
        );

        let scope = Scope::default();
        assert_eq!(
            evaluate("calc(1in + 4px)", &scope).as_deref(),
            Some("100px")
        );

        let dimensions = Lookup::Map([("em".to_string(), 16.)].into_iter().collect());
        let scope = Scope {
            dimensions: Some(&dimensions),
            ..Scope::default()
        };
        assert_eq!(evaluate("calc(2em - 2px)", &scope).as_deref(), Some("30px"));
        assert_eq!(
            CalcNode::parse_from_str("calc(2vw)")
                .unwrap()
                .evaluate(&scope),
            Some(Term::Dimension(2., "vw".to_string()))
        );
    }
}
