//! Arena-based shader IR used by the shaderlink link-time passes.
//!
//! The IR is deliberately small: typed variables, dereference chains, scalar ALU and texture
//! instructions in SSA form, and structured control flow. Passes mutate it in place through
//! [`Builder`] and direct access to the arenas.

pub mod arena;
pub mod builder;
pub mod deref;
pub mod function;
pub mod instr;
pub mod interp;
pub mod print;
pub mod types;
pub mod validate;

pub use arena::{Arena, BadHandle, Handle};
pub use builder::{Builder, Cursor};
pub use deref::{ArrayDeref, ArrayIndex, Deref, DerefError, DerefKind, VarMode, Variable};
pub use function::{Block, CfNode, Function, FunctionImpl};
pub use instr::{AluOp, Instr, Literal, TexInstr, TexOp, TexSrc, TexSrcKind, Value};
pub use types::{ArraySize, SamplerDim, ScalarKind, StructMember, Type, TypeInner, Types};
pub use validate::{validate_shader, ValidationError};

/// Number of [`ShaderStage`] variants.
pub const STAGE_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    TessCtrl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Pipeline order.
    pub const ALL: [ShaderStage; STAGE_COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::TessCtrl,
        ShaderStage::TessEval,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessCtrl => "tessellation control",
            ShaderStage::TessEval => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        }
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VS",
            ShaderStage::TessCtrl => "TCS",
            ShaderStage::TessEval => "TES",
            ShaderStage::Geometry => "GS",
            ShaderStage::Fragment => "FS",
            ShaderStage::Compute => "CS",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One linked shader stage.
#[derive(Debug, Clone)]
pub struct Shader {
    pub stage: ShaderStage,
    pub types: Types,
    pub variables: Arena<Variable>,
    pub functions: Vec<Function>,
}

impl Shader {
    pub fn new(stage: ShaderStage) -> Self {
        Shader {
            stage,
            types: Types::new(),
            variables: Arena::new(),
            functions: Vec::new(),
        }
    }

    /// Texture instructions of every defined function, in structural order.
    pub fn tex_instrs(&self) -> impl Iterator<Item = (&Function, &TexInstr)> {
        self.functions.iter().flat_map(|func| {
            let body = func.body.as_ref();
            body.map(|body| body.instrs_in_order())
                .unwrap_or_default()
                .into_iter()
                .filter_map(move |value| {
                    body.and_then(|body| body.instrs.get(value))
                        .and_then(Instr::as_tex)
                        .map(|tex| (func, tex))
                })
        })
    }
}
