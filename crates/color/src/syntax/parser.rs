//! Higher-level parsing functions.
//!
//! This is the next parsing stage after [Tokenization](super::tokenizer).
//!
//! # Parsing Rules
//! ## Error handling
//! Parser functions usually return `Result<T, ParseError>`. If the `Result` is `Ok`,
//! the parser will have consumed *exactly* the expected amount of tokens.
//! If `Err` is returned, the state of the parser is undefined. Callers that want to handle
//! optional values should use [Parser::parse_optional_value], which restores the previous
//! state on failure.
//!
//! ## Whitespace
//! Comments are dropped by the tokenizer and runs of whitespace are collapsed into a single
//! [Token::Whitespace].

use super::tokenizer::{Token, Tokenizer};

/// How many functions and parentheses may be nested inside each other
pub const MAX_BLOCK_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError;

/// A cursor over a fully tokenized color value
#[derive(Clone, Debug, Default)]
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,

    /// Number of blocks that are currently being parsed
    depth: usize,
}

impl Parser {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self::from_tokens(Tokenizer::new(source).collect())
    }

    /// Create a parser from tokens that were produced elsewhere, for example
    /// after `var()` substitution
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut collapsed: Vec<Token> = Vec::with_capacity(tokens.len());

        for token in tokens {
            let last_token_was_whitespace = collapsed.last().is_some_and(Token::is_whitespace);
            if token.is_whitespace() && last_token_was_whitespace {
                continue;
            }
            collapsed.push(token);
        }

        Self {
            tokens: collapsed,
            position: 0,
            depth: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> usize {
        self.position
    }

    pub fn set_state(&mut self, position: usize) {
        self.position = position;
    }

    #[must_use]
    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position)?.clone();
        self.position += 1;
        Some(token)
    }

    #[must_use]
    pub fn next_token_ignoring_whitespace(&mut self) -> Option<Token> {
        self.skip_whitespace();
        self.next_token()
    }

    #[must_use]
    pub fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Look at the `n`th non-whitespace token without consuming anything
    #[must_use]
    pub fn peek_token_ignoring_whitespace(&self, n: usize) -> Option<&Token> {
        self.tokens[self.position..]
            .iter()
            .filter(|token| !token.is_whitespace())
            .nth(n)
    }

    #[inline]
    pub fn expect_token(&mut self, expected_token: Token) -> Result<(), ParseError> {
        if self.next_token_ignoring_whitespace() == Some(expected_token) {
            Ok(())
        } else {
            Err(ParseError)
        }
    }

    /// Consume an identifier, comparing ASCII case-insensitively
    pub fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        match self.next_token_ignoring_whitespace() {
            Some(token) if token.is_ident(keyword) => Ok(()),
            _ => Err(ParseError),
        }
    }

    pub fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.next_token_ignoring_whitespace() {
            Some(Token::Ident(ident)) => Ok(ident),
            _ => Err(ParseError),
        }
    }

    pub fn expect_whitespace(&mut self) -> Result<(), ParseError> {
        match self.next_token() {
            Some(Token::Whitespace) => Ok(()),
            _ => Err(ParseError),
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek_token().is_some_and(Token::is_whitespace) {
            self.position += 1;
        }
    }

    /// Whether only whitespace is left in the token stream
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.peek_token_ignoring_whitespace(0).is_none()
    }

    /// Return an error if any tokens are left in the token stream.
    ///
    /// If `Err` is returned, the state of the parser is unspecified.
    pub fn expect_exhausted(&mut self) -> Result<(), ParseError> {
        if self.next_token_ignoring_whitespace().is_none() {
            Ok(())
        } else {
            Err(ParseError)
        }
    }

    /// Try to parse a value, resetting the parser to its previous state if that fails
    pub fn parse_optional_value<T, F>(&mut self, closure: F) -> Option<T>
    where
        F: FnOnce(&mut Self) -> Result<T, ParseError>,
    {
        let state = self.state();
        match closure(self) {
            Ok(parsed_value) => Some(parsed_value),
            Err(_) => {
                self.set_state(state);
                None
            },
        }
    }

    /// Parse the contents of a function or parenthesized block.
    ///
    /// Fails without calling `closure` if blocks are nested more than
    /// [MAX_BLOCK_DEPTH] levels deep.
    pub fn parse_nested_block<T, F>(&mut self, closure: F) -> Result<T, ParseError>
    where
        F: FnOnce(&mut Self) -> Result<T, ParseError>,
    {
        if self.depth >= MAX_BLOCK_DEPTH {
            log::debug!("Blocks are nested more than {MAX_BLOCK_DEPTH} levels deep");
            return Err(ParseError);
        }

        self.depth += 1;
        let result = closure(self);
        self.depth -= 1;
        result
    }

    pub fn parse<T: CSSParse>(&mut self) -> Result<T, ParseError> {
        T::parse(self)
    }

    /// Consume all tokens that are left
    pub fn remaining_tokens(&mut self) -> Vec<Token> {
        let remaining = self.tokens[self.position..].to_vec();
        self.position = self.tokens.len();
        remaining
    }

    /// Consume everything up to (and including) the parenthesis that closes the
    /// current block.
    ///
    /// The opening function or parenthesis token must already have been consumed.
    /// The closing parenthesis is not part of the returned tokens.
    pub fn consume_block(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut nesting_level = 0;
        let mut contents = vec![];

        loop {
            let token = self.next_token().ok_or(ParseError)?;

            if token.opens_parenthesis() {
                nesting_level += 1;
            } else if token == Token::ParenthesisClose {
                if nesting_level == 0 {
                    return Ok(contents);
                }
                nesting_level -= 1;
            }

            contents.push(token);
        }
    }
}

pub trait CSSParse: Sized {
    /// Try to parse an instance of the type from CSS source code.
    ///
    /// If any tokens remain in the source after the instance is parsed, an
    /// error is returned.
    fn parse_from_str(source: &str) -> Result<Self, ParseError> {
        Self::parse_complete(&mut Parser::new(source))
    }

    /// Try to parse an instance of the type from the parse source.
    ///
    /// If `Ok` is returned, the parser will have consumed all the tokens that belonged
    /// to the instance (but not more).
    fn parse(parser: &mut Parser) -> Result<Self, ParseError>;

    fn parse_complete(parser: &mut Parser) -> Result<Self, ParseError> {
        let parsed_value = Self::parse(parser)?;
        parser.expect_exhausted()?;
        Ok(parsed_value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ParseError, Parser, MAX_BLOCK_DEPTH};
    use crate::syntax::Token;

    fn nest(parser: &mut Parser, levels: usize) -> Result<usize, ParseError> {
        if levels == 0 {
            return Ok(0);
        }
        parser.parse_nested_block(|parser| Ok(nest(parser, levels - 1)? + 1))
    }

    #[test]
    fn whitespace_is_collapsed() {
        let mut parser = Parser::new("a  /**/  b");
        assert_eq!(parser.next_token(), Some(Token::Ident("a".to_string())));
        assert_eq!(parser.next_token(), Some(Token::Whitespace));
        assert_eq!(parser.next_token(), Some(Token::Ident("b".to_string())));
        assert!(parser.is_exhausted());
    }

    #[test]
    fn optional_values_restore_state() {
        let mut parser = Parser::new("1 2");
        let parsed: Option<()> = parser.parse_optional_value(|p| {
            p.expect_token(Token::Number(1.))?;
            p.expect_token(Token::Number(3.))
        });
        assert!(parsed.is_none());
        assert_eq!(parser.next_token(), Some(Token::Number(1.)));
    }

    #[test]
    fn blocks_respect_nesting() {
        let mut parser = Parser::new("calc((1 + 2) * 3) red");
        let calc = Token::Function("calc".to_string());
        assert_eq!(parser.next_token(), Some(calc));
        let block = parser.consume_block().unwrap();
        assert_eq!(block.len(), 11);
        assert_eq!(parser.next_token(), Some(Token::Whitespace));
        assert_eq!(parser.expect_keyword("RED"), Ok(()));
    }

    #[test]
    fn nesting_depth_is_limited() {
        let mut parser = Parser::new("");
        assert_eq!(nest(&mut parser, MAX_BLOCK_DEPTH), Ok(MAX_BLOCK_DEPTH));
        assert_eq!(nest(&mut parser, MAX_BLOCK_DEPTH + 1), Err(ParseError));

        // The depth is restored after a failure
        assert_eq!(nest(&mut parser, 1), Ok(1));
    }

    #[test]
    fn unclosed_block_is_an_error() {
        let mut parser = Parser::new("rgb(1 2 3");
        _ = parser.next_token();
        assert_eq!(parser.consume_block(), Err(ParseError));
    }
}
