use crate::parse::{LexError, TokenKind, tokenize};
use crate::proc::SimProc;
use thiserror::Error;

//===========================================================================//

/// An error encountered while evaluating a debug expression.
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
pub enum ExprError {
    /// The expression could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The expression contains no tokens.
    #[error("empty expression")]
    Empty,
    /// The expression is well-formed but is not a single register reference
    /// or literal.
    #[error("unsupported expression of {tokens} tokens")]
    Unsupported {
        /// How many tokens the expression had.
        tokens: usize,
    },
    /// The expression names a register that does not exist.
    #[error("no such register: {0}")]
    UnknownRegister(String),
    /// A literal that does not fit in 32 bits, or a lone token that is not a
    /// value at all.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

//===========================================================================//

/// Evaluates `expr` against the current state of `proc`.
///
/// Only single-token expressions are supported: a register reference such
/// as `$t0`, a hexadecimal literal such as `0x10`, or a decimal literal.
/// Anything longer fails with [`ExprError::Unsupported`], even if it is
/// well-formed arithmetic.
pub fn evaluate(expr: &str, proc: &dyn SimProc) -> Result<u32, ExprError> {
    let tokens = tokenize(expr)?;
    let token = match tokens.as_slice() {
        [] => return Err(ExprError::Empty),
        [token] => token,
        _ => return Err(ExprError::Unsupported { tokens: tokens.len() }),
    };
    let text = token.text.as_str();
    match token.kind {
        TokenKind::Register => {
            let name = &text[1..];
            proc.get_register(name)
                .ok_or_else(|| ExprError::UnknownRegister(text.to_string()))
        }
        TokenKind::HexLiteral => u32::from_str_radix(&text[2..], 16)
            .map_err(|_| ExprError::InvalidValue(text.to_string())),
        TokenKind::DecLiteral => text
            .parse::<u32>()
            .map_err(|_| ExprError::InvalidValue(text.to_string())),
        _ => Err(ExprError::InvalidValue(text.to_string())),
    }
}

//===========================================================================//


//===========================================================================//
