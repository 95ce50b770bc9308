//! Structural IR validation, run by the linker around each pass.

use std::collections::HashSet;

use crate::arena::BadHandle;
use crate::function::FunctionImpl;
use crate::instr::{Instr, TexSrcKind, Value};
use crate::{Shader, Types};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("function `{function}`: {source}")]
    BadHandle {
        function: String,
        #[source]
        source: BadHandle,
    },
    #[error("function `{function}`: instruction %{instr} is placed in more than one block")]
    PlacedTwice { function: String, instr: Value },
    #[error("function `{function}`: block b{block} is reachable more than once")]
    BlockVisitedTwice { function: String, block: usize },
    #[error("function `{function}`: %{user} reads %{value} before it is defined")]
    UseBeforeDef {
        function: String,
        user: Value,
        value: Value,
    },
    #[error("function `{function}`: %{instr} expects {expected} operands, found {found}")]
    AluArity {
        function: String,
        instr: Value,
        expected: usize,
        found: usize,
    },
    #[error("function `{function}`: %{instr} has more than one {kind:?} source")]
    DuplicateTexSrc {
        function: String,
        instr: Value,
        kind: TexSrcKind,
    },
    #[error("function `{function}`: %{instr} samples through a non-sampler type")]
    NotASampler { function: String, instr: Value },
    #[error("function `{function}`: %{instr} has a sampler offset but no sampler array size")]
    MissingSamplerArraySize { function: String, instr: Value },
}

pub fn validate_shader(shader: &Shader) -> Result<(), ValidationError> {
    for func in &shader.functions {
        if let Some(body) = &func.body {
            validate_function(&shader.types, &func.name, body)?;
        }
    }
    Ok(())
}

fn validate_function(
    types: &Types,
    function: &str,
    body: &FunctionImpl,
) -> Result<(), ValidationError> {
    let bad_handle = |source| ValidationError::BadHandle {
        function: function.to_owned(),
        source,
    };

    let mut seen_blocks = HashSet::new();
    for block in body.blocks_in_order() {
        body.blocks.check_contains_handle(block).map_err(bad_handle)?;
        if !seen_blocks.insert(block) {
            return Err(ValidationError::BlockVisitedTwice {
                function: function.to_owned(),
                block: block.index(),
            });
        }
    }

    let mut defined = HashSet::new();
    for value in body.instrs_in_order() {
        let instr = body.instrs.try_get(value).map_err(bad_handle)?;
        for src in instr.sources() {
            body.instrs.check_contains_handle(src).map_err(bad_handle)?;
            if !defined.contains(&src) {
                return Err(ValidationError::UseBeforeDef {
                    function: function.to_owned(),
                    user: value,
                    value: src,
                });
            }
        }
        validate_instr(types, function, value, instr)?;
        if !defined.insert(value) {
            return Err(ValidationError::PlacedTwice {
                function: function.to_owned(),
                instr: value,
            });
        }
    }

    for condition in body.if_conditions() {
        body.instrs.check_contains_handle(condition).map_err(bad_handle)?;
    }

    Ok(())
}

fn validate_instr(
    types: &Types,
    function: &str,
    value: Value,
    instr: &Instr,
) -> Result<(), ValidationError> {
    match instr {
        Instr::Const(_) | Instr::Input { .. } => {}
        Instr::Alu { op, srcs } => {
            if srcs.len() != op.arity() {
                return Err(ValidationError::AluArity {
                    function: function.to_owned(),
                    instr: value,
                    expected: op.arity(),
                    found: srcs.len(),
                });
            }
        }
        Instr::Tex(tex) => {
            let mut kinds = HashSet::new();
            for src in &tex.srcs {
                if !kinds.insert(src.kind) {
                    return Err(ValidationError::DuplicateTexSrc {
                        function: function.to_owned(),
                        instr: value,
                        kind: src.kind,
                    });
                }
            }
            if let Some(chain) = &tex.sampler {
                if !types.is_sampler(chain.tail().ty) {
                    return Err(ValidationError::NotASampler {
                        function: function.to_owned(),
                        instr: value,
                    });
                }
            }
            if kinds.contains(&TexSrcKind::SamplerOffset) && tex.sampler_array_size == 0 {
                return Err(ValidationError::MissingSamplerArraySize {
                    function: function.to_owned(),
                    instr: value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AluOp, ArrayIndex, Builder, Deref, Function, SamplerDim, ShaderStage, TexInstr, TexOp,
        VarMode, Variable,
    };

    fn shader_with(body: FunctionImpl) -> Shader {
        let mut shader = Shader::new(ShaderStage::Vertex);
        shader.functions.push(Function {
            name: "main".into(),
            body: Some(body),
        });
        shader
    }

    #[test]
    fn accepts_well_formed_body() {
        let (mut body, entry) = FunctionImpl::new();
        let mut b = Builder::at_end(&mut body, entry);
        let x = b.input(0);
        let y = b.imm_int(3);
        b.imul(x, y);
        assert_eq!(validate_shader(&shader_with(body)), Ok(()));
    }

    #[test]
    fn rejects_use_before_def() {
        let (mut body, entry) = FunctionImpl::new();
        let late = body.instrs.append(Instr::Input { location: 1 });
        let user = body.instrs.append(Instr::Alu {
            op: AluOp::Mov,
            srcs: vec![late],
        });
        body.blocks[entry].instrs.extend([user, late]);

        let err = validate_shader(&shader_with(body)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UseBeforeDef {
                function: "main".into(),
                user,
                value: late,
            }
        );
    }

    #[test]
    fn rejects_wrong_alu_arity() {
        let (mut body, entry) = FunctionImpl::new();
        let mut b = Builder::at_end(&mut body, entry);
        let x = b.input(0);
        b.alu(AluOp::IAdd, vec![x]);
        assert!(matches!(
            validate_shader(&shader_with(body)),
            Err(ValidationError::AluArity {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn rejects_sampling_through_non_sampler() {
        let mut shader = Shader::new(ShaderStage::Fragment);
        let s = shader.types.sampler(SamplerDim::D2, false);
        let arr = shader.types.array(s, 2);
        let var = shader.variables.append(Variable {
            name: "t".into(),
            ty: arr,
            mode: VarMode::Uniform,
            location: 0,
        });
        let (mut body, entry) = FunctionImpl::new();
        {
            let mut b = Builder::at_end(&mut body, entry);
            // Array of samplers used without indexing.
            b.tex(TexInstr::new(TexOp::Tex, SamplerDim::D2, Deref::var(var, arr)));
            let chain = Deref::var(var, arr)
                .index(&shader.types, 0, ArrayIndex::Direct)
                .unwrap();
            b.tex(TexInstr::new(TexOp::Tex, SamplerDim::D2, chain));
        }
        shader.functions.push(Function {
            name: "main".into(),
            body: Some(body),
        });

        assert!(matches!(
            validate_shader(&shader),
            Err(ValidationError::NotASampler { .. })
        ));
    }
}
