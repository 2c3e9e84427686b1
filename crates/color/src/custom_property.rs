//! `var()` substitution.
//!
//! <https://drafts.csswg.org/css-variables/#using-variables>

use crate::{
    options::{Lookup, Options},
    syntax::{ParseError, Parser, Token, Tokenizer, MAX_BLOCK_DEPTH},
};

/// Upper bound for the size of a value after substitution, counted in tokens
/// and `var()` references
const MAX_SUBSTITUTION_SIZE: usize = 1 << 16;

/// Tokenize a value and replace every `var()` reference in it.
///
/// Fails if a referenced property is undefined and has no fallback, if
/// properties refer to each other in a cycle or if the value grows too large.
pub fn parse_value(value: &str, options: &Options) -> Result<Parser, ParseError> {
    let tokens: Vec<Token> = Tokenizer::new(value).collect();

    if !tokens.iter().any(|token| token.is_function("var")) {
        return Ok(Parser::from_tokens(tokens));
    }

    let mut substitution = Substitution {
        lookup: &options.custom_property,
        in_progress: vec![],
        depth: 0,
        size: 0,
    };
    let substituted = substitution.substitute(tokens)?;
    Ok(Parser::from_tokens(substituted))
}

struct Substitution<'a> {
    lookup: &'a Lookup<String>,

    /// Names of the properties that are currently being expanded, innermost last
    in_progress: Vec<String>,

    /// Number of `var()` functions that are currently being expanded
    depth: usize,
    size: usize,
}

impl Substitution<'_> {
    fn grow(&mut self) -> Result<(), ParseError> {
        self.size += 1;
        if self.size > MAX_SUBSTITUTION_SIZE {
            log::debug!("Value exceeds {MAX_SUBSTITUTION_SIZE} tokens after var() substitution");
            return Err(ParseError);
        }
        Ok(())
    }

    fn substitute(&mut self, tokens: Vec<Token>) -> Result<Vec<Token>, ParseError> {
        let mut parser = Parser::from_tokens(tokens);
        let mut substituted = vec![];

        while let Some(token) = parser.next_token() {
            self.grow()?;

            if !token.is_function("var") {
                substituted.push(token);
                continue;
            }

            let arguments = parser.consume_block()?;
            substituted.extend(self.substitute_reference(arguments)?);
        }

        Ok(substituted)
    }

    /// Resolve the arguments of a single `var()` function
    fn substitute_reference(&mut self, arguments: Vec<Token>) -> Result<Vec<Token>, ParseError> {
        let mut parser = Parser::from_tokens(arguments);

        let name = parser.expect_identifier()?;
        if !name.starts_with("--") {
            return Err(ParseError);
        }

        let fallback = if parser.is_exhausted() {
            None
        } else {
            parser.expect_token(Token::Comma)?;
            Some(parser.remaining_tokens())
        };

        if self.in_progress.contains(&name) {
            log::debug!("Custom property {name} depends on itself");
            return Err(ParseError);
        }

        if self.depth >= MAX_BLOCK_DEPTH {
            log::debug!("var() references are nested too deeply");
            return Err(ParseError);
        }

        // An empty value or the initial value make the reference invalid, so the fallback is used
        let value = self.lookup.get(&name).filter(|value| {
            let value = value.trim();
            !value.is_empty() && !value.eq_ignore_ascii_case("initial")
        });

        self.depth += 1;
        let result = match (value, fallback) {
            (Some(value), _) => {
                self.in_progress.push(name);
                let result = self.substitute(Tokenizer::new(&value).collect());
                self.in_progress.pop();
                result
            },
            (None, Some(fallback)) => self.substitute(fallback),
            (None, None) => {
                log::debug!("Custom property {name} is not defined");
                Err(ParseError)
            },
        };
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::parse_value;
    use crate::{
        options::{Lookup, Options},
        syntax::ParseError,
    };

    fn options(properties: &[(&str, &str)]) -> Options {
        Options {
            custom_property: properties
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            ..Options::default()
        }
    }

    fn substituted(value: &str, options: &Options) -> Result<String, ParseError> {
        let mut parser = parse_value(value, options)?;
        Ok(parser
            .remaining_tokens()
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    #[test]
    fn simple_reference() {
        let options = options(&[("--red", "255"), ("--color", "rgb(var(--red) 0 0)")]);
        assert_eq!(
            substituted("var(--color)", &options).as_deref(),
            Ok("rgb(255 0 0)")
        );
    }

    #[test]
    fn fallback() {
        let options = options(&[("--empty", " "), ("--initial", "initial")]);
        assert_eq!(
            substituted("var(--missing, red)", &options).as_deref(),
            Ok(" red")
        );
        assert_eq!(
            substituted("var(--empty,blue)", &options).as_deref(),
            Ok("blue")
        );
        assert_eq!(
            substituted("var(--initial, var(--missing, green))", &options).as_deref(),
            Ok(" green")
        );
        assert_eq!(substituted("var(--missing)", &options), Err(ParseError));
    }

    #[test]
    fn cycles_are_rejected() {
        let options = options(&[("--a", "var(--b)"), ("--b", "var(--a)")]);
        assert_eq!(substituted("var(--a)", &options), Err(ParseError));
    }

    #[test]
    fn expansion_is_bounded() {
        // Every level doubles the size of the value
        let mut properties: Vec<(String, String)> = (0..30)
            .map(|level| {
                let next = level + 1;
                (format!("--p{level}"), format!("var(--p{next}) var(--p{next})"))
            })
            .collect();
        properties.push(("--p30".to_string(), "1".to_string()));

        let options = Options {
            custom_property: properties.into_iter().collect(),
            ..Options::default()
        };

        assert_eq!(
            substituted("var(--p27)", &options).as_deref(),
            Ok("1 1 1 1 1 1 1 1")
        );
        assert_eq!(substituted("var(--p0)", &options), Err(ParseError));
    }

    #[test]
    fn nested_fallbacks_are_bounded() {
        let options = Options::default();
        let nested = |depth: usize| "var(--missing, ".repeat(depth) + "red" + &")".repeat(depth);

        assert_eq!(substituted(&nested(10), &options).as_deref(), Ok(" red"));
        assert_eq!(substituted(&nested(1000), &options), Err(ParseError));
    }

    #[test]
    fn callback_lookup() {
        let options = Options {
            custom_property: Lookup::from_fn(|name| {
                (name == "--accent").then(|| "#ff0000".to_string())
            }),
            ..Options::default()
        };
        assert_eq!(
            substituted("var(--accent)", &options).as_deref(),
            Ok("#ff0000")
        );
    }

    #[test]
    fn names_must_be_custom_properties() {
        assert_eq!(
            substituted("var(color)", &Options::default()),
            Err(ParseError)
        );
    }
}
