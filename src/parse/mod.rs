//! Facilities for tokenizing debugger expressions.

mod lex;

pub use lex::{LexError, MAX_TOKENS, Token, TokenKind, TokenLexer, tokenize};

//===========================================================================//
