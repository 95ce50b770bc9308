use std::fmt;

use shaderlink_ir::{Handle, ShaderStage, Type, Value, Variable};

/// Instruction a lowering error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub function: String,
    pub instr: Value,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function `{}`, %{}", self.function, self.instr)
    }
}

/// Sampler lowering failure. Every variant is an internal inconsistency between the front-end,
/// the uniform assignment and the IR; none of them can be recovered by substituting an index.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LowerError {
    #[error("{site}: sampler chain does not start at a variable")]
    MissingVariable { site: Site },

    #[error("{site}: sampler chain names unknown variable {var:?}")]
    UnknownVariable { site: Site, var: Handle<Variable> },

    #[error("{site}: unexpected {found} node inside a sampler chain")]
    MalformedDeref { site: Site, found: &'static str },

    #[error("{site}: wildcard array index on a sampler")]
    WildcardIndex { site: Site },

    #[error("{site}: array index applied to non-array type {ty:?}")]
    NotAnArray { site: Site, ty: Handle<Type> },

    #[error("{site}: array level of type {ty:?} has no constant length")]
    UnsizedArray { site: Site, ty: Handle<Type> },

    #[error("{site}: member {member} selected from non-struct type {ty:?}")]
    NotAStruct {
        site: Site,
        ty: Handle<Type>,
        member: u32,
    },

    #[error("{site}: struct type {ty:?} has no member {member}")]
    MemberOutOfRange {
        site: Site,
        ty: Handle<Type>,
        member: u32,
    },

    #[error(
        "{site}: uniform `{name}` resolves to location {location}, \
         but only {count} storage entries exist"
    )]
    UnassignedLocation {
        site: Site,
        name: String,
        location: u32,
        count: u32,
    },

    #[error("{site}: uniform `{name}` (location {location}) has no {stage} sampler binding")]
    InactiveUniform {
        site: Site,
        name: String,
        location: u32,
        stage: ShaderStage,
    },

    #[error("{site}: sampler index arithmetic overflows")]
    Overflow { site: Site },
}

impl LowerError {
    pub fn site(&self) -> &Site {
        match self {
            LowerError::MissingVariable { site }
            | LowerError::UnknownVariable { site, .. }
            | LowerError::MalformedDeref { site, .. }
            | LowerError::WildcardIndex { site }
            | LowerError::NotAnArray { site, .. }
            | LowerError::UnsizedArray { site, .. }
            | LowerError::NotAStruct { site, .. }
            | LowerError::MemberOutOfRange { site, .. }
            | LowerError::UnassignedLocation { site, .. }
            | LowerError::InactiveUniform { site, .. }
            | LowerError::Overflow { site } => site,
        }
    }
}
