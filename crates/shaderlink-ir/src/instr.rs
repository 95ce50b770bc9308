use crate::arena::Handle;
use crate::deref::Deref;
use crate::types::SamplerDim;

/// SSA value: the result of the instruction that defines it.
pub type Value = Handle<Instr>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    I32(i32),
    F32(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    IAdd,
    IMul,
    FAdd,
    FMul,
    Mov,
}

impl AluOp {
    pub fn name(self) -> &'static str {
        match self {
            AluOp::IAdd => "iadd",
            AluOp::IMul => "imul",
            AluOp::FAdd => "fadd",
            AluOp::FMul => "fmul",
            AluOp::Mov => "mov",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            AluOp::Mov => 1,
            AluOp::IAdd | AluOp::IMul | AluOp::FAdd | AluOp::FMul => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexOp {
    /// Regular sample.
    Tex,
    /// Sample with LOD bias.
    Txb,
    /// Sample with explicit LOD.
    Txl,
    /// Sample with explicit derivatives.
    Txd,
    /// Texel fetch.
    Txf,
    /// Multisample texel fetch.
    TxfMs,
    /// Texture size query.
    Txs,
    /// LOD query.
    Lod,
    /// Gather.
    Tg4,
    QueryLevels,
}

impl TexOp {
    pub fn name(self) -> &'static str {
        match self {
            TexOp::Tex => "tex",
            TexOp::Txb => "txb",
            TexOp::Txl => "txl",
            TexOp::Txd => "txd",
            TexOp::Txf => "txf",
            TexOp::TxfMs => "txf_ms",
            TexOp::Txs => "txs",
            TexOp::Lod => "lod",
            TexOp::Tg4 => "tg4",
            TexOp::QueryLevels => "query_levels",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexSrcKind {
    Coord,
    Projector,
    Comparator,
    Offset,
    Bias,
    Lod,
    MsIndex,
    Ddx,
    Ddy,
    /// Runtime part of the sampler index, added to `sampler_index` by the hardware.
    SamplerOffset,
}

impl TexSrcKind {
    pub fn name(self) -> &'static str {
        match self {
            TexSrcKind::Coord => "coord",
            TexSrcKind::Projector => "projector",
            TexSrcKind::Comparator => "comparator",
            TexSrcKind::Offset => "offset",
            TexSrcKind::Bias => "bias",
            TexSrcKind::Lod => "lod",
            TexSrcKind::MsIndex => "ms_index",
            TexSrcKind::Ddx => "ddx",
            TexSrcKind::Ddy => "ddy",
            TexSrcKind::SamplerOffset => "sampler_offset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexSrc {
    pub kind: TexSrcKind,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexInstr {
    pub op: TexOp,
    pub dim: SamplerDim,
    pub is_shadow: bool,
    pub srcs: Vec<TexSrc>,
    /// Symbolic sampler. `None` once the sampler has been resolved to `sampler_index`.
    pub sampler: Option<Deref>,
    pub sampler_index: u32,
    /// Number of samplers addressable through the `SamplerOffset` source.
    pub sampler_array_size: u32,
}

impl TexInstr {
    pub fn new(op: TexOp, dim: SamplerDim, sampler: Deref) -> Self {
        TexInstr {
            op,
            dim,
            is_shadow: false,
            srcs: Vec::new(),
            sampler: Some(sampler),
            sampler_index: 0,
            sampler_array_size: 0,
        }
    }

    pub fn with_src(mut self, kind: TexSrcKind, value: Value) -> Self {
        self.srcs.push(TexSrc { kind, value });
        self
    }

    pub fn src(&self, kind: TexSrcKind) -> Option<Value> {
        self.srcs.iter().find(|s| s.kind == kind).map(|s| s.value)
    }

    pub fn is_lowered(&self) -> bool {
        self.sampler.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Const(Literal),
    /// Runtime scalar read from input/uniform `location`.
    Input { location: u32 },
    Alu { op: AluOp, srcs: Vec<Value> },
    Tex(TexInstr),
}

impl Instr {
    pub fn as_tex(&self) -> Option<&TexInstr> {
        match self {
            Instr::Tex(tex) => Some(tex),
            _ => None,
        }
    }

    pub fn as_tex_mut(&mut self) -> Option<&mut TexInstr> {
        match self {
            Instr::Tex(tex) => Some(tex),
            _ => None,
        }
    }

    /// Every value this instruction reads, including indices reached through a symbolic
    /// sampler chain.
    pub fn sources(&self) -> Vec<Value> {
        match self {
            Instr::Const(_) | Instr::Input { .. } => Vec::new(),
            Instr::Alu { srcs, .. } => srcs.clone(),
            Instr::Tex(tex) => {
                let mut out: Vec<Value> = tex.srcs.iter().map(|s| s.value).collect();
                if let Some(chain) = &tex.sampler {
                    out.extend(chain.indirect_values());
                }
                out
            }
        }
    }
}
