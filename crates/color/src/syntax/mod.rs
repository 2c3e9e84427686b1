//! CSS syntax: tokenization and the token-cursor parser used by every value parser.

mod parser;
mod tokenizer;

pub use parser::{CSSParse, ParseError, Parser, MAX_BLOCK_DEPTH};
pub use tokenizer::{HashFlag, Token, Tokenizer};
