//! Program link driver.
//!
//! [`link_program`] runs the link-time passes over every stage attached to a [`ShaderProgram`]:
//! optional IR validation, sampler lowering against the program's [`UniformStorage`], and a
//! final check that every resolved sampler index lies within the units assigned to the stage.
//!
//! Linking is transactional. Passes run on copies of the attached shaders, which replace the
//! originals only when every stage succeeds.

mod options;
mod program;

pub use options::{LinkOptions, DUMP_IR_ENV, VALIDATE_IR_ENV};
pub use program::{ShaderProgram, StageMask};

use shaderlink_ir::{validate_shader, Shader, ShaderStage, TexSrcKind, ValidationError};
use shaderlink_samplers::{lower_samplers, LowerError, UniformStorage};

/// Number of hardware sampler units addressable by a stage.
pub const MAX_SAMPLER_UNITS: u32 = 32;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("program has no attached shaders")]
    EmptyProgram,

    #[error("{stage} shader failed sampler lowering: {source}")]
    Lower {
        stage: ShaderStage,
        #[source]
        source: LowerError,
    },

    #[error("{stage} shader failed IR validation: {source}")]
    Validation {
        stage: ShaderStage,
        #[source]
        source: ValidationError,
    },

    #[error(
        "{stage} uniform binds sampler unit {index}, past the {}-unit limit",
        MAX_SAMPLER_UNITS
    )]
    SamplerIndexOutOfRange { stage: ShaderStage, index: u32 },

    #[error("{stage} shader samples unit {index}, which no active uniform binds")]
    UnboundSampler { stage: ShaderStage, index: u32 },
}

impl LinkError {
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            LinkError::EmptyProgram => None,
            LinkError::Lower { stage, .. }
            | LinkError::Validation { stage, .. }
            | LinkError::SamplerIndexOutOfRange { stage, .. }
            | LinkError::UnboundSampler { stage, .. } => Some(*stage),
        }
    }
}

/// Per-stage outcome of a successful link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedStage {
    pub stage: ShaderStage,
    /// Bit `n` is set when hardware sampler unit `n` is bound by an active uniform.
    pub samplers_used: u32,
    /// Bit `n` is set when unit `n` holds a shadow sampler, either by the type of the uniform
    /// bound there or because a shadow texture instruction samples it.
    pub shadow_samplers: u32,
    /// Some texture instruction selects its sampler with a runtime offset.
    pub uses_indirect_sampler: bool,
    pub texture_instrs: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub stages: Vec<LinkedStage>,
}

impl LinkReport {
    pub fn stage(&self, stage: ShaderStage) -> Option<&LinkedStage> {
        self.stages.iter().find(|linked| linked.stage == stage)
    }
}

/// Links `program` against `storage`.
///
/// On success the attached shaders are replaced by their lowered forms, `link_status` is set and
/// `info_log` is cleared. On failure the attached shaders are untouched, `link_status` is cleared
/// and `info_log` holds the error message.
pub fn link_program(
    program: &mut ShaderProgram,
    storage: &UniformStorage,
    options: LinkOptions,
) -> Result<LinkReport, LinkError> {
    match link_stages(program, storage, options) {
        Ok((shaders, report)) => {
            program.replace_all(shaders);
            program.link_status = true;
            program.info_log.clear();
            tracing::debug!(
                program = program.name,
                stages = report.stages.len(),
                "linked program"
            );
            Ok(report)
        }
        Err(err) => {
            tracing::error!(program = program.name, error = %err, "link failed");
            program.link_status = false;
            program.info_log = err.to_string();
            Err(err)
        }
    }
}

fn link_stages(
    program: &ShaderProgram,
    storage: &UniformStorage,
    options: LinkOptions,
) -> Result<(Vec<Shader>, LinkReport), LinkError> {
    let mut shaders: Vec<Shader> = program.linked_shaders().cloned().collect();
    if shaders.is_empty() {
        return Err(LinkError::EmptyProgram);
    }

    let mut report = LinkReport::default();
    for shader in &mut shaders {
        report.stages.push(link_stage(shader, storage, options)?);
    }
    Ok((shaders, report))
}

fn link_stage(
    shader: &mut Shader,
    storage: &UniformStorage,
    options: LinkOptions,
) -> Result<LinkedStage, LinkError> {
    let stage = shader.stage;
    let validate = |shader: &Shader| {
        validate_shader(shader).map_err(|source| LinkError::Validation { stage, source })
    };

    if options.validate_ir {
        validate(shader)?;
    }
    lower_samplers(shader, storage).map_err(|source| LinkError::Lower { stage, source })?;
    if options.validate_ir {
        validate(shader)?;
    }

    let units = bound_units(storage, stage)?;
    let samplers_used = units.used;
    let mut shadow_samplers = units.shadow;
    let mut uses_indirect_sampler = false;
    let mut texture_instrs = 0;
    for (_, tex) in shader.tex_instrs() {
        texture_instrs += 1;
        if tex.src(TexSrcKind::SamplerOffset).is_some() {
            uses_indirect_sampler = true;
            if tex.is_shadow {
                shadow_samplers |= unit_range(tex.sampler_index, tex.sampler_array_size);
            }
            continue;
        }
        let index = tex.sampler_index;
        if index >= MAX_SAMPLER_UNITS || samplers_used & (1 << index) == 0 {
            return Err(LinkError::UnboundSampler { stage, index });
        }
        if tex.is_shadow {
            shadow_samplers |= 1 << index;
        }
    }

    if options.dump_ir {
        tracing::debug!(target: "shaderlink::dump", stage = %stage, "\n{}", shader.display());
    }

    Ok(LinkedStage {
        stage,
        samplers_used,
        shadow_samplers,
        uses_indirect_sampler,
        texture_instrs,
    })
}

#[derive(Debug, Default)]
struct BoundUnits {
    used: u32,
    shadow: u32,
}

/// Units bound in `stage` by active storage entries. An array of `n` samplers occupies `n`
/// consecutive units starting at its binding.
fn bound_units(storage: &UniformStorage, stage: ShaderStage) -> Result<BoundUnits, LinkError> {
    let mut units = BoundUnits::default();
    for (_, entry) in storage.iter() {
        let binding = entry.opaque[stage.index()];
        if !binding.active {
            continue;
        }
        let count = entry.array_elements.max(1);
        let end = binding.index.checked_add(count).unwrap_or(u32::MAX);
        if end > MAX_SAMPLER_UNITS {
            return Err(LinkError::SamplerIndexOutOfRange {
                stage,
                index: end - 1,
            });
        }
        let mask = unit_range(binding.index, count);
        units.used |= mask;
        if entry.shadow {
            units.shadow |= mask;
        }
    }
    Ok(units)
}

/// Mask of units `first .. first + count`, clipped to [`MAX_SAMPLER_UNITS`].
fn unit_range(first: u32, count: u32) -> u32 {
    let end = first.saturating_add(count).min(MAX_SAMPLER_UNITS);
    (first..end).fold(0, |mask, unit| mask | 1 << unit)
}
