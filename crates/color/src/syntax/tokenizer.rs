//! CSS tokenization
//!
//! <https://drafts.csswg.org/css-syntax/#tokenization>

use std::fmt;

use crate::serialize::format_number;

// characters are sort of unreadable and should
// be referenced via their name instead
const NEWLINE: char = '\n';
const CARRIAGE_RETURN: char = '\r';
const FORM_FEED: char = '\x0C';
const TAB: char = '\t';
const WHITESPACE: char = ' ';
const APOSTROPHE: char = '\'';
const BACKSLASH: char = '\\';
const REPLACEMENT: char = '\u{FFFD}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashFlag {
    Unrestricted,
    Id,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ident(String),
    Function(String),
    AtKeyword(String),
    Hash(String, HashFlag),
    String(String),
    BadString(String),
    Number(f64),
    /// The value is stored on a 0-100 scale, exactly as written
    Percentage(f64),
    Dimension(f64, String),
    Colon,
    Semicolon,
    Comma,
    CurlyBraceOpen,
    CurlyBraceClose,
    ParenthesisOpen,
    ParenthesisClose,
    BracketOpen,
    BracketClose,
    Whitespace,
    Delim(char),
}

impl Token {
    #[inline]
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }

    /// Whether this token opens a block that has to be closed by a [Token::ParenthesisClose]
    #[inline]
    #[must_use]
    pub fn opens_parenthesis(&self) -> bool {
        matches!(self, Self::Function(_) | Self::ParenthesisOpen)
    }

    /// Case-insensitive check for an identifier
    #[must_use]
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Self::Ident(ident) if ident.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive check for a function token
    #[must_use]
    pub fn is_function(&self, name: &str) -> bool {
        matches!(self, Self::Function(function) if function.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(ident) => f.write_str(ident),
            Self::Function(name) => write!(f, "{name}("),
            Self::AtKeyword(keyword) => write!(f, "@{keyword}"),
            Self::Hash(value, _) => write!(f, "#{value}"),
            Self::String(value) | Self::BadString(value) => write!(f, "{value:?}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Percentage(n) => write!(f, "{}%", format_number(*n)),
            Self::Dimension(n, unit) => write!(f, "{}{unit}", format_number(*n)),
            Self::Colon => f.write_str(":"),
            Self::Semicolon => f.write_str(";"),
            Self::Comma => f.write_str(","),
            Self::CurlyBraceOpen => f.write_str("{"),
            Self::CurlyBraceClose => f.write_str("}"),
            Self::ParenthesisOpen => f.write_str("("),
            Self::ParenthesisClose => f.write_str(")"),
            Self::BracketOpen => f.write_str("["),
            Self::BracketClose => f.write_str("]"),
            Self::Whitespace => f.write_str(" "),
            Self::Delim(c) => write!(f, "{c}"),
        }
    }
}

/// Splits CSS source text into [Tokens](Token).
///
/// Positions are byte offsets into the source.
#[derive(Clone, Copy, Debug)]
pub struct Tokenizer<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn peek_codepoint(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn next_codepoint(&mut self) -> Option<char> {
        let c = self.peek_codepoint(0)?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn reconsume(&mut self) {
        if let Some(c) = self.source[..self.position].chars().next_back() {
            self.position -= c.len_utf8();
        }
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.next_codepoint().is_none() {
                break;
            }
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#check-if-two-code-points-are-a-valid-escape>
    fn is_valid_escape_start(&self) -> bool {
        is_valid_escape(self.peek_codepoint(0), self.peek_codepoint(1))
    }

    /// <https://drafts.csswg.org/css-syntax/#check-if-three-code-points-would-start-an-ident-sequence>
    fn is_valid_ident_start(&self) -> bool {
        match self.peek_codepoint(0) {
            Some('-') => match self.peek_codepoint(1) {
                Some(c) if is_ident_start_code_point(c) || c == '-' => true,
                n2 => is_valid_escape(n2, self.peek_codepoint(2)),
            },
            Some(BACKSLASH) => is_valid_escape(Some(BACKSLASH), self.peek_codepoint(1)),
            Some(c) => is_ident_start_code_point(c),
            None => false,
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#check-if-three-code-points-would-start-a-number>
    fn is_valid_number_start(&self) -> bool {
        match self.peek_codepoint(0) {
            Some('+' | '-') => match self.peek_codepoint(1) {
                Some('0'..='9') => true,
                Some('.') => matches!(self.peek_codepoint(2), Some('0'..='9')),
                _ => false,
            },
            Some('.') => matches!(self.peek_codepoint(1), Some('0'..='9')),
            Some('0'..='9') => true,
            _ => false,
        }
    }

    fn consume_whitespace(&mut self) {
        while self.peek_codepoint(0).is_some_and(is_whitespace) {
            self.advance(1);
        }
    }

    fn consume_digits(&mut self) {
        while matches!(self.peek_codepoint(0), Some('0'..='9')) {
            self.advance(1);
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#consume-an-ident-sequence>
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();

        loop {
            match self.peek_codepoint(0) {
                Some(c) if is_ident_code_point(c) => {
                    self.advance(1);
                    result.push(c);
                },
                Some(BACKSLASH) if self.is_valid_escape_start() => {
                    self.advance(1);
                    result.push(self.consume_escaped_codepoint());
                },
                _ => return result,
            }
        }
    }

    /// <https://drafts.csswg.org/css-syntax-3/#consume-escaped-code-point>
    ///
    /// Assumes that the backslash has already been consumed.
    fn consume_escaped_codepoint(&mut self) -> char {
        match self.next_codepoint() {
            Some(c) if c.is_ascii_hexdigit() => {
                let mut value = c.to_digit(16).unwrap_or_default();

                // 1-6 hex digits in total
                for _ in 0..5 {
                    match self.peek_codepoint(0) {
                        Some(c) if c.is_ascii_hexdigit() => {
                            self.advance(1);
                            value = value * 16 + c.to_digit(16).unwrap_or_default();
                        },
                        _ => break,
                    }
                }

                // A single whitespace after the escape belongs to it
                if self.peek_codepoint(0).is_some_and(is_whitespace) {
                    self.advance(1);
                }

                if matches!(value, 0 | 0xD800..=0xDFFF) || value > 0x10FFFF {
                    REPLACEMENT
                } else {
                    char::from_u32(value).unwrap_or(REPLACEMENT)
                }
            },
            None => {
                log::warn!(target: "css", "Parse Error: EOF in escaped codepoint");
                REPLACEMENT
            },
            Some(c) => c,
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#consume-a-number>
    fn consume_number(&mut self) -> f64 {
        // NOTE we keep track of repr by remembering the starting position and slicing
        // the source string.
        let start = self.position;

        if matches!(self.peek_codepoint(0), Some('+' | '-')) {
            self.advance(1);
        }

        self.consume_digits();

        if self.peek_codepoint(0) == Some('.') && matches!(self.peek_codepoint(1), Some('0'..='9'))
        {
            self.advance(2);
            self.consume_digits();
        }

        if matches!(self.peek_codepoint(0), Some('e' | 'E')) {
            let exponent_follows = match self.peek_codepoint(1) {
                Some('0'..='9') => Some(1),
                Some('+' | '-') if matches!(self.peek_codepoint(2), Some('0'..='9')) => Some(2),
                _ => None,
            };

            if let Some(prefix_length) = exponent_follows {
                self.advance(1 + prefix_length);
                self.consume_digits();
            }
        }

        self.source[start..self.position]
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// <https://drafts.csswg.org/css-syntax/#consume-a-numeric-token>
    fn consume_numeric_token(&mut self) -> Token {
        let number = self.consume_number();

        if self.is_valid_ident_start() {
            let unit = self.consume_ident_sequence();
            Token::Dimension(number, unit.to_ascii_lowercase())
        } else if self.peek_codepoint(0) == Some('%') {
            self.advance(1);
            Token::Percentage(number)
        } else {
            Token::Number(number)
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#consume-an-ident-like-token>
    ///
    /// `url(` is not special-cased, color values never contain urls.
    fn consume_ident_like_token(&mut self) -> Token {
        let string = self.consume_ident_sequence();

        if self.peek_codepoint(0) == Some('(') {
            self.advance(1);
            Token::Function(string)
        } else {
            Token::Ident(string)
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#consume-a-string-token>
    fn consume_string_token(&mut self, end_token: char) -> Token {
        let mut string = String::new();

        loop {
            match self.next_codepoint() {
                Some(c) if c == end_token => return Token::String(string),
                Some(NEWLINE) => {
                    log::warn!(target: "css", "Parse Error: Newline in string token");
                    self.reconsume();
                    return Token::BadString(string);
                },
                Some(BACKSLASH) => match self.peek_codepoint(0) {
                    None => {},
                    Some(NEWLINE) => self.advance(1),
                    Some(_) => string.push(self.consume_escaped_codepoint()),
                },
                Some(c) => string.push(c),
                None => {
                    log::warn!(target: "css", "Parse Error: EOF in string token");
                    return Token::String(string);
                },
            }
        }
    }

    /// <https://drafts.csswg.org/css-syntax/#consume-comment>
    fn consume_comments(&mut self) {
        while self.remaining().starts_with("/*") {
            match self.remaining()[2..].find("*/") {
                Some(end) => self.position += end + 4,
                None => {
                    log::warn!(target: "css", "Parse Error: EOF in comment");
                    self.position = self.source.len();
                },
            }
        }
    }

    /// Read the next token from the input stream
    ///
    /// <https://drafts.csswg.org/css-syntax/#consume-token>
    pub fn next_token(&mut self) -> Option<Token> {
        self.consume_comments();

        let token = match self.next_codepoint()? {
            c if is_whitespace(c) => {
                self.consume_whitespace();
                Token::Whitespace
            },
            '"' => self.consume_string_token('"'),
            APOSTROPHE => self.consume_string_token(APOSTROPHE),
            '#' => match self.peek_codepoint(0) {
                Some(c) if is_ident_code_point(c) || self.is_valid_escape_start() => {
                    let flag = if self.is_valid_ident_start() {
                        HashFlag::Id
                    } else {
                        HashFlag::Unrestricted
                    };
                    Token::Hash(self.consume_ident_sequence(), flag)
                },
                _ => Token::Delim('#'),
            },
            '(' => Token::ParenthesisOpen,
            ')' => Token::ParenthesisClose,
            ',' => Token::Comma,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            '[' => Token::BracketOpen,
            ']' => Token::BracketClose,
            '{' => Token::CurlyBraceOpen,
            '}' => Token::CurlyBraceClose,
            '+' | '.' => {
                self.reconsume();
                if self.is_valid_number_start() {
                    self.consume_numeric_token()
                } else {
                    self.next_codepoint().map_or(Token::Delim('+'), Token::Delim)
                }
            },
            '-' => {
                self.reconsume();
                if self.is_valid_number_start() {
                    self.consume_numeric_token()
                } else if self.is_valid_ident_start() {
                    self.consume_ident_like_token()
                } else {
                    self.advance(1);
                    Token::Delim('-')
                }
            },
            '@' => {
                if self.is_valid_ident_start() {
                    Token::AtKeyword(self.consume_ident_sequence())
                } else {
                    Token::Delim('@')
                }
            },
            BACKSLASH => {
                self.reconsume();
                if self.is_valid_escape_start() {
                    self.consume_ident_like_token()
                } else {
                    log::warn!(
                        target: "css",
                        "Parse Error: Backslash character is not a valid escape start"
                    );
                    self.advance(1);
                    Token::Delim(BACKSLASH)
                }
            },
            '0'..='9' => {
                self.reconsume();
                self.consume_numeric_token()
            },
            c if is_ident_start_code_point(c) => {
                self.reconsume();
                self.consume_ident_like_token()
            },
            c => Token::Delim(c),
        };

        Some(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// <https://drafts.csswg.org/css-syntax/#whitespace>
#[inline]
fn is_whitespace(c: char) -> bool {
    matches!(c, NEWLINE | CARRIAGE_RETURN | FORM_FEED | TAB | WHITESPACE)
}

/// <https://drafts.csswg.org/css-syntax/#non-ascii-ident-code-point>
#[inline]
fn is_non_ascii_ident_code_point(c: char) -> bool {
    matches!(c, '\u{00B7}' | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}' | '\u{200D}' | '\u{203F}' | '\u{2040}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..)
}

/// <https://drafts.csswg.org/css-syntax/#ident-start-code-point>
#[inline]
fn is_ident_start_code_point(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_') || is_non_ascii_ident_code_point(c)
}

/// <https://drafts.csswg.org/css-syntax/#ident-code-point>
#[inline]
fn is_ident_code_point(c: char) -> bool {
    matches!(c, '-' | '0'..='9') || is_ident_start_code_point(c)
}

#[inline]
fn is_valid_escape(c1: Option<char>, c2: Option<char>) -> bool {
    c1 == Some(BACKSLASH) && c2.is_some_and(|c| c != NEWLINE)
}
