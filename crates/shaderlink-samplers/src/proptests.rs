use proptest::prelude::*;

use shaderlink_ir::interp::eval_int;
use shaderlink_ir::{
    ArrayIndex, Builder, Deref, Function, FunctionImpl, Handle, SamplerDim, ScalarKind, Shader,
    ShaderStage, StructMember, TexInstr, TexOp, TexSrcKind, Type, VarMode, Variable,
};

use crate::{lower_samplers, UniformStorage, UniformStorageEntry};

const MAX_DIMS: usize = 3;
const MAX_LEN: u32 = 6;
const MAX_PAD_MEMBERS: u32 = 4;

/// One array level: declared length, constant part of the index, and the runtime part when
/// the level is indexed dynamically.
#[derive(Debug, Clone, Copy)]
struct Level {
    len: u32,
    base: u32,
    runtime: Option<u32>,
}

fn level_strategy() -> impl Strategy<Value = Level> {
    (1u32..=MAX_LEN)
        .prop_flat_map(|len| (Just(len), 0..len, proptest::option::of(0..len)))
        .prop_map(|(len, base, runtime)| Level {
            len,
            base,
            // Keep `base + runtime` in bounds; the pass does not care, but it mirrors real shaders.
            runtime: runtime.map(|r| r.min(len - 1 - base)),
        })
}

fn levels_strategy() -> impl Strategy<Value = Vec<Level>> {
    proptest::collection::vec(level_strategy(), 1..=MAX_DIMS)
}

/// When set, the sampler is the last member of a struct with this many scalar members ahead of
/// it, and the array levels wrap the struct.
fn member_strategy() -> impl Strategy<Value = Option<u32>> {
    proptest::option::of(0..MAX_PAD_MEMBERS)
}

struct Lowered {
    shader: Shader,
    tex: Handle<shaderlink_ir::Instr>,
}

/// Builds `tex[l0][l1]..` over `sampler2D[len0][len1]..` (or `tex[l0]...member` over an array
/// of structs) and lowers it. Storage location `n` is bound at `binding + n`.
fn lower_levels(levels: &[Level], member: Option<u32>, binding: u32) -> Lowered {
    let mut shader = Shader::new(ShaderStage::Fragment);
    let s = shader.types.sampler(SamplerDim::D2, false);
    let mut ty: Handle<Type> = s;
    if let Some(pad) = member {
        let float = shader.types.scalar(ScalarKind::Float);
        let mut members: Vec<StructMember> = (0..pad)
            .map(|i| StructMember {
                name: format!("pad{i}"),
                ty: float,
            })
            .collect();
        members.push(StructMember {
            name: "tex".into(),
            ty: s,
        });
        ty = shader.types.structure("Wrapped", members);
    }
    // Outermost level first in `levels`; build the type from the innermost outwards.
    for level in levels.iter().rev() {
        ty = shader.types.array(ty, level.len);
    }
    let var = shader.variables.append(Variable {
        name: "tex".into(),
        ty,
        mode: VarMode::Uniform,
        location: 0,
    });

    let (mut body, entry) = FunctionImpl::new();
    let tex = {
        let mut b = Builder::at_end(&mut body, entry);
        let mut chain = Deref::var(var, ty);
        for (i, level) in levels.iter().enumerate() {
            let index = match level.runtime {
                Some(_) => ArrayIndex::Indirect(b.input(i as u32)),
                None => ArrayIndex::Direct,
            };
            chain = chain.index(&shader.types, level.base, index).unwrap();
        }
        if let Some(pad) = member {
            chain = chain.field(&shader.types, pad).unwrap();
        }
        let coord = b.imm_float(0.5);
        b.tex(TexInstr::new(TexOp::Tex, SamplerDim::D2, chain).with_src(TexSrcKind::Coord, coord))
    };
    shader.functions.push(Function {
        name: "main".into(),
        body: Some(body),
    });

    let total: u32 = levels.iter().map(|level| level.len).product();
    let storage: UniformStorage = (0..=member.unwrap_or(0))
        .map(|location| {
            UniformStorageEntry::new(format!("tex{location}"), total)
                .with_binding(ShaderStage::Fragment, binding + location)
        })
        .collect();
    lower_samplers(&mut shader, &storage).unwrap();
    Lowered { shader, tex }
}

/// Row-major stride of each level: the product of the lengths of all inner levels.
fn strides(levels: &[Level]) -> Vec<u32> {
    let mut out = vec![1u32; levels.len()];
    for i in (0..levels.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] * levels[i + 1].len;
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_constant_chains_flatten_row_major(
        levels in levels_strategy().prop_map(|mut levels| {
            for level in &mut levels {
                level.runtime = None;
            }
            levels
        }),
        member in member_strategy(),
        binding in 0u32..32,
    ) {
        let Lowered { shader, tex } = lower_levels(&levels, member, binding);
        let body = shader.functions[0].body.as_ref().unwrap();
        let lowered = body.instrs[tex].as_tex().unwrap();

        let expected: u32 = levels
            .iter()
            .zip(strides(&levels))
            .map(|(level, stride)| level.base * stride)
            .sum();
        // Struct members select a storage location; they never scale the array strides.
        let location = member.unwrap_or(0);
        prop_assert_eq!(lowered.sampler_index, binding + location + expected);
        prop_assert_eq!(lowered.src(TexSrcKind::SamplerOffset), None);
        prop_assert!(lowered.is_lowered());
    }

    #[test]
    fn prop_runtime_offset_matches_flattened_index(
        levels in levels_strategy(),
        member in member_strategy(),
        binding in 0u32..32,
    ) {
        let Lowered { shader, tex } = lower_levels(&levels, member, binding);
        let body = shader.functions[0].body.as_ref().unwrap();
        let lowered = body.instrs[tex].as_tex().unwrap();
        let strides = strides(&levels);

        let static_part: u32 = levels
            .iter()
            .zip(&strides)
            .map(|(level, stride)| level.base * stride)
            .sum();
        let dynamic_part: u32 = levels
            .iter()
            .zip(&strides)
            .map(|(level, stride)| level.runtime.unwrap_or(0) * stride)
            .sum();
        let location = member.unwrap_or(0);
        prop_assert_eq!(lowered.sampler_index, binding + location + static_part);

        let any_runtime = levels.iter().any(|level| level.runtime.is_some());
        match lowered.src(TexSrcKind::SamplerOffset) {
            Some(offset) => {
                prop_assert!(any_runtime);
                let total: u32 = levels.iter().map(|level| level.len).product();
                prop_assert_eq!(lowered.sampler_array_size, total);
                let runtime = |loc: u32| {
                    levels
                        .get(loc as usize)
                        .and_then(|level| level.runtime)
                        .map(|r| r as i32)
                };
                prop_assert_eq!(eval_int(body, offset, &runtime), Ok(dynamic_part as i32));
            }
            None => {
                prop_assert!(!any_runtime);
            }
        }
    }
}
