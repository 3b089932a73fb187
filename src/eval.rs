use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{BinaryOp, Expr};

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum EvalError {
    #[error("Negative shift amount {amount}")]
    #[diagnostic(help("shift amounts are truncated to integers and must not be negative"))]
    NegativeShift { amount: i64 },

    #[error("Failed to evaluate the operands of `{op}`")]
    Operands {
        op: BinaryOp,
        #[related]
        causes: Vec<EvalError>,
    },
}

/// Reduces an expression tree to a number.
///
/// Arithmetic follows IEEE-754, so dividing by zero gives an infinity or NaN
/// rather than an error. Shifts truncate both operands to `i64` first.
pub fn evaluate(expr: &Expr) -> Result<f64, EvalError> {
    match expr {
        Expr::Atomic(value) => Ok(*value),
        Expr::Binary { op, left, right } => {
            let lhs = evaluate(left);
            let rhs = evaluate(right);
            match (lhs, rhs) {
                (Ok(lhs), Ok(rhs)) => apply(*op, lhs, rhs),
                (lhs, rhs) => Err(EvalError::Operands {
                    op: *op,
                    causes: lhs.err().into_iter().chain(rhs.err()).collect(),
                }),
            }
        }
    }
}

fn apply(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
    Ok(match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Subtract => lhs - rhs,
        BinaryOp::Multiply => lhs * rhs,
        BinaryOp::Divide => lhs / rhs,
        BinaryOp::Exponent => lhs.powf(rhs),
        BinaryOp::ShiftLeft => {
            let amount = shift_amount(rhs)?;
            // bits pushed past the word are lost; a too-wide shift clears it
            (lhs as i64).checked_shl(amount).unwrap_or(0) as f64
        }
        BinaryOp::ShiftRight => {
            let amount = shift_amount(rhs)?;
            let value = lhs as i64;
            value
                .checked_shr(amount)
                .unwrap_or(if value < 0 { -1 } else { 0 }) as f64
        }
    })
}

// `as` truncates toward zero and saturates, NaN becomes 0.
fn shift_amount(rhs: f64) -> Result<u32, EvalError> {
    let amount = rhs as i64;
    if amount < 0 {
        return Err(EvalError::NegativeShift { amount });
    }
    Ok(u32::try_from(amount).unwrap_or(u32::MAX))
}
