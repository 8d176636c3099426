use logos::{self, Logos};
use thiserror::Error;

//===========================================================================//

/// The maximum number of tokens a single expression may contain.
pub const MAX_TOKENS: usize = 32;

//===========================================================================//

/// An error encountered while tokenizing an expression.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum LexError {
    /// No lexical rule matches the input at the given byte offset.
    #[error("no token matches {text:?} at position {position}")]
    InvalidToken {
        /// The byte offset within the expression.
        position: usize,
        /// The unmatched input at that position.
        text: String,
    },
    /// The expression has more tokens than the token buffer can hold.
    #[error("expression has more than {limit} tokens")]
    TooManyTokens {
        /// The capacity of the token buffer.
        limit: usize,
    },
}

//===========================================================================//

/// The kinds of lexical token an expression can contain.
#[derive(Clone, Copy, Debug, Eq, Hash, Logos, PartialEq)]
#[logos(skip r"[ \t]+")]
pub enum TokenKind {
    /// A "`+`" symbol.
    #[token("+")]
    Plus,
    /// A "`-`" symbol.
    #[token("-")]
    Minus,
    /// A "`*`" symbol.
    #[token("*")]
    Star,
    /// A "`/`" symbol.
    #[token("/")]
    Slash,
    /// A "`(`" symbol.
    #[token("(")]
    LParen,
    /// A "`)`" symbol.
    #[token(")")]
    RParen,
    /// A "`==`" symbol.
    #[token("==")]
    Eq,
    /// A "`!=`" symbol.
    #[token("!=")]
    NotEq,
    /// A "`&&`" symbol.
    #[token("&&")]
    AndAnd,
    /// A "`||`" symbol.
    #[token("||")]
    OrOr,
    /// A register reference, such as `$t0`.
    #[regex(r"\$[a-z0-9]+")]
    Register,
    /// A hexadecimal literal, such as `0x1f`.
    #[regex(r"0[xX][0-9A-Fa-f]+")]
    HexLiteral,
    /// A decimal literal.
    #[regex(r"[0-9]+")]
    DecLiteral,
    /// A bare identifier.
    #[regex(r"[_A-Za-z][_A-Za-z0-9]*")]
    Identifier,
}

impl TokenKind {
    /// Returns the human-readable name for this kind of token.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::AndAnd
            | TokenKind::OrOr => "operator",
            TokenKind::Register => "register",
            TokenKind::HexLiteral => "hex literal",
            TokenKind::DecLiteral => "decimal literal",
            TokenKind::Identifier => "identifier",
        }
    }
}

//===========================================================================//

/// A single lexical token, including its source text.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: String,
    /// The byte offset of the start of the token.
    pub position: usize,
}

//===========================================================================//

/// A lexer for tokenizing a debug expression.
pub struct TokenLexer<'a> {
    lexer: logos::Lexer<'a, TokenKind>,
}

impl<'a> TokenLexer<'a> {
    /// Constructs a new lexer positioned at the start of `input`.
    pub fn new(input: &'a str) -> TokenLexer<'a> {
        TokenLexer { lexer: TokenKind::lexer(input) }
    }
}

impl<'a> Iterator for TokenLexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Result<Token, LexError>> {
        let result = self.lexer.next()?;
        let position = self.lexer.span().start;
        let text = self.lexer.slice().to_string();
        Some(match result {
            Ok(kind) => Ok(Token { kind, text, position }),
            Err(()) => Err(LexError::InvalidToken { position, text }),
        })
    }
}

/// Splits `input` into tokens, discarding whitespace.  Fails on the first
/// position that no rule matches, or if there are more than [`MAX_TOKENS`]
/// tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    for token in TokenLexer::new(input) {
        let token = token?;
        if tokens.len() == MAX_TOKENS {
            return Err(LexError::TooManyTokens { limit: MAX_TOKENS });
        }
        log::trace!(
            "token {} {:?} at {}",
            token.kind.name(),
            token.text,
            token.position
        );
        tokens.push(token);
    }
    Ok(tokens)
}

//===========================================================================//


//===========================================================================//
