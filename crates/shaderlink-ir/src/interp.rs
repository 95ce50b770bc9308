//! Integer evaluation of SSA expressions.
//!
//! Used to check what a lowered index expression computes for given runtime inputs.

use crate::function::FunctionImpl;
use crate::instr::{AluOp, Instr, Literal, Value};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("%{0} is not defined in this function")]
    Undefined(Value),
    #[error("no value supplied for input location {0}")]
    MissingInput(u32),
    #[error("%{0} is not an integer expression")]
    NotInteger(Value),
}

/// Evaluates `value` as a 32-bit integer with wrapping arithmetic. `input` supplies the
/// runtime value of each `Input` location.
pub fn eval_int(
    body: &FunctionImpl,
    value: Value,
    input: &dyn Fn(u32) -> Option<i32>,
) -> Result<i32, EvalError> {
    let instr = body.instrs.get(value).ok_or(EvalError::Undefined(value))?;
    match instr {
        Instr::Const(Literal::I32(v)) => Ok(*v),
        Instr::Input { location } => input(*location).ok_or(EvalError::MissingInput(*location)),
        Instr::Alu { op, srcs } => {
            let args = srcs
                .iter()
                .map(|&src| eval_int(body, src, input))
                .collect::<Result<Vec<_>, _>>()?;
            match (op, args.as_slice()) {
                (AluOp::IAdd, [a, b]) => Ok(a.wrapping_add(*b)),
                (AluOp::IMul, [a, b]) => Ok(a.wrapping_mul(*b)),
                (AluOp::Mov, [a]) => Ok(*a),
                _ => Err(EvalError::NotInteger(value)),
            }
        }
        Instr::Const(Literal::F32(_)) | Instr::Tex(_) => Err(EvalError::NotInteger(value)),
    }
}
