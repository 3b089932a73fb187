pub mod ast;
pub mod eval;
pub mod lex;
pub mod parse;

use miette::Diagnostic;
use thiserror::Error;

pub use ast::{BinaryOp, Expr, render};
pub use eval::{EvalError, evaluate};
pub use lex::{Lexer, Token, TokenKind, TokenizeError, tokenize};
pub use parse::{ParseError, Parser, parse};

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}

/// Tokenizes, parses and evaluates `input` in one go.
pub fn calculate(filename: Option<&str>, input: &str) -> Result<f64, Error> {
    let tokens = Lexer::new(filename, input).collect::<Result<Vec<_>, _>>()?;
    let expr = parse(&tokens)?;
    Ok(evaluate(&expr)?)
}
