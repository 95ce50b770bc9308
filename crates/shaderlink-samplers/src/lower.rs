//! Resolves symbolic sampler references to hardware sampler indices.
//!
//! A texture instruction reaches its sampler through a dereference chain such as
//! `lights[2].shadow[i]`. Lowering flattens the chain into:
//!
//! - a static sampler index: the uniform's hardware binding plus the row-major offset of every
//!   constant array index,
//! - for chains with runtime indices, an integer expression `Σ stride * index` attached to the
//!   instruction as a [`TexSrcKind::SamplerOffset`] source.
//!
//! Struct members do not contribute to the sampler index directly. They select a different
//! uniform location, and therefore a different entry of the [`UniformStorage`] table.

use shaderlink_ir::{
    Arena, ArrayIndex, Builder, Cursor, Deref, DerefKind, FunctionImpl, Instr, Shader,
    ShaderStage, TexSrc, TexSrcKind, Types, Value, Variable,
};

use crate::error::{LowerError, Site};
use crate::uniform_storage::UniformStorage;

/// Lowers every symbolic sampler reference in every defined function of `shader`.
///
/// Instructions whose sampler is already resolved are left untouched, so running the pass
/// again is a no-op. On error the offending instruction is left unmodified; instructions lowered
/// before it keep their new form, and the caller is expected to discard the shader.
pub fn lower_samplers(shader: &mut Shader, storage: &UniformStorage) -> Result<(), LowerError> {
    let Shader {
        stage,
        types,
        variables,
        functions,
    } = shader;

    let ctx = LowerContext {
        stage: *stage,
        types,
        variables,
        storage,
    };

    for func in functions.iter_mut() {
        let Some(body) = func.body.as_mut() else {
            continue;
        };
        let lowered = ctx.lower_impl(&func.name, body)?;
        if lowered > 0 {
            tracing::debug!(
                stage = %ctx.stage,
                function = %func.name,
                lowered,
                "resolved sampler references"
            );
        }
    }
    Ok(())
}

struct LowerContext<'a> {
    stage: ShaderStage,
    types: &'a Types,
    variables: &'a Arena<Variable>,
    storage: &'a UniformStorage,
}

/// Result of walking one dereference chain, computed before any IR is touched.
#[derive(Debug)]
struct SamplerOffsets {
    /// Row-major offset of the constant array indices.
    static_offset: u32,
    /// Uniform storage location, including struct member offsets.
    location: u32,
    /// Product of the lengths of every array level walked so far.
    array_elements: u32,
    /// `stride * index` terms, innermost array level first.
    indirect: Vec<IndirectTerm>,
}

#[derive(Debug, Clone, Copy)]
struct IndirectTerm {
    stride: i32,
    index: Value,
}

impl LowerContext<'_> {
    fn lower_impl(&self, function: &str, body: &mut FunctionImpl) -> Result<usize, LowerError> {
        let mut lowered = 0;
        for block in body.blocks_in_order() {
            let mut index = 0;
            while let Some(value) = body
                .blocks
                .get(block)
                .and_then(|b| b.instrs.get(index))
                .copied()
            {
                let symbolic = matches!(
                    body.instrs.get(value),
                    Some(Instr::Tex(tex)) if tex.sampler.is_some()
                );
                if symbolic {
                    let site = Site {
                        function: function.to_owned(),
                        instr: value,
                    };
                    // Skip whatever was inserted in front of the texture instruction.
                    index += self.lower_sampler(&site, body, Cursor::before(block, index))?;
                    lowered += 1;
                }
                index += 1;
            }
        }
        Ok(lowered)
    }

    /// Lowers the texture instruction at `cursor`. Returns the number of instructions inserted
    /// before it.
    fn lower_sampler(
        &self,
        site: &Site,
        body: &mut FunctionImpl,
        cursor: Cursor,
    ) -> Result<usize, LowerError> {
        let Some(chain) = body
            .instrs
            .get(site.instr)
            .and_then(Instr::as_tex)
            .and_then(|tex| tex.sampler.as_ref())
        else {
            return Ok(0);
        };

        let var_handle = chain.variable().ok_or_else(|| LowerError::MissingVariable {
            site: site.clone(),
        })?;
        let var = self
            .variables
            .get(var_handle)
            .ok_or_else(|| LowerError::UnknownVariable {
                site: site.clone(),
                var: var_handle,
            })?;

        let mut offsets = SamplerOffsets {
            static_offset: 0,
            location: var.location,
            array_elements: 1,
            indirect: Vec::new(),
        };
        self.calc_sampler_offsets(site, chain, &mut offsets)?;

        let binding = match self.storage.lookup(self.stage, offsets.location) {
            Some(binding) if binding.active => *binding,
            Some(_) => {
                return Err(LowerError::InactiveUniform {
                    site: site.clone(),
                    name: var.name.clone(),
                    location: offsets.location,
                    stage: self.stage,
                })
            }
            None => {
                return Err(LowerError::UnassignedLocation {
                    site: site.clone(),
                    name: var.name.clone(),
                    location: offsets.location,
                    count: self.storage.count(),
                })
            }
        };
        let sampler_index = offsets
            .static_offset
            .checked_add(binding.index)
            .ok_or_else(|| LowerError::Overflow { site: site.clone() })?;

        // Everything is validated; from here on the IR is rewritten.
        let mut builder = Builder::new(body, cursor);
        let mut sampler_offset: Option<Value> = None;
        for term in &offsets.indirect {
            let scaled = if term.stride == 1 {
                term.index
            } else {
                let stride = builder.imm_int(term.stride);
                builder.imul(stride, term.index)
            };
            sampler_offset = Some(match sampler_offset {
                Some(acc) => builder.iadd(acc, scaled),
                None => scaled,
            });
        }
        let inserted = builder.cursor().index - cursor.index;

        if let Some(tex) = body.instrs.get_mut(site.instr).and_then(Instr::as_tex_mut) {
            if let Some(value) = sampler_offset {
                tex.srcs.push(TexSrc {
                    kind: TexSrcKind::SamplerOffset,
                    value,
                });
                tex.sampler_array_size = offsets.array_elements;
            }
            tex.sampler_index = sampler_index;
            tex.sampler = None;
        }

        tracing::trace!(
            function = %site.function,
            instr = %site.instr,
            location = offsets.location,
            sampler_index,
            indirect = sampler_offset.is_some(),
            "lowered sampler"
        );
        Ok(inserted)
    }

    /// Walks the chain below `tail`, innermost level first.
    ///
    /// Recursing before applying an array level's own contribution means `array_elements`
    /// already holds the product of every nested dimension, which is exactly the stride of
    /// this level in row-major order.
    fn calc_sampler_offsets(
        &self,
        site: &Site,
        tail: &Deref,
        offsets: &mut SamplerOffsets,
    ) -> Result<(), LowerError> {
        let Some(child) = tail.child.as_deref() else {
            return Ok(());
        };

        match child.kind {
            DerefKind::Array(array) => {
                if !self.types.is_array(tail.ty) {
                    return Err(LowerError::NotAnArray {
                        site: site.clone(),
                        ty: tail.ty,
                    });
                }
                // Dynamic indices still need a constant extent to compute strides.
                let length =
                    self.types
                        .declared_length(tail.ty)
                        .ok_or_else(|| LowerError::UnsizedArray {
                            site: site.clone(),
                            ty: tail.ty,
                        })?;
                if array.index == ArrayIndex::Wildcard {
                    return Err(LowerError::WildcardIndex { site: site.clone() });
                }

                self.calc_sampler_offsets(site, child, offsets)?;

                let overflow = || LowerError::Overflow { site: site.clone() };
                offsets.static_offset = array
                    .base_offset
                    .checked_mul(offsets.array_elements)
                    .and_then(|v| v.checked_add(offsets.static_offset))
                    .ok_or_else(overflow)?;

                if let ArrayIndex::Indirect(index) = array.index {
                    let stride = i32::try_from(offsets.array_elements).map_err(|_| overflow())?;
                    offsets.indirect.push(IndirectTerm { stride, index });
                }

                offsets.array_elements = offsets
                    .array_elements
                    .checked_mul(length)
                    .ok_or_else(overflow)?;
            }
            DerefKind::Struct { member } => {
                if !self.types.is_struct(tail.ty) {
                    return Err(LowerError::NotAStruct {
                        site: site.clone(),
                        ty: tail.ty,
                        member,
                    });
                }
                if self.types.member(tail.ty, member).is_none() {
                    return Err(LowerError::MemberOutOfRange {
                        site: site.clone(),
                        ty: tail.ty,
                        member,
                    });
                }
                offsets.location = offsets
                    .location
                    .checked_add(self.types.record_location_offset(tail.ty, member))
                    .ok_or_else(|| LowerError::Overflow { site: site.clone() })?;

                self.calc_sampler_offsets(site, child, offsets)?;
            }
            DerefKind::Var(_) => {
                return Err(LowerError::MalformedDeref {
                    site: site.clone(),
                    found: "variable",
                });
            }
        }
        Ok(())
    }
}
