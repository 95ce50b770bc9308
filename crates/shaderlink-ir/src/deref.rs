//! Variables and dereference chains.
//!
//! A chain starts at a variable node and descends through array-index and struct-member nodes.
//! Chains are owned `Box`-linked lists: they are built once by the front-end, attached to the
//! instruction that reads through them and consumed by value when that instruction is lowered.

use crate::arena::Handle;
use crate::instr::Value;
use crate::types::{Type, Types};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarMode {
    Uniform,
    ShaderIn,
    ShaderOut,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub ty: Handle<Type>,
    pub mode: VarMode,
    /// First uniform storage location assigned to this variable by the linker.
    pub location: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIndex {
    /// Index is `base_offset`.
    Direct,
    /// Index is `base_offset + value`, with `value` only known at runtime.
    Indirect(Value),
    /// Every element (`a[*]`). Only produced by copy lowering, never valid on an opaque read.
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDeref {
    pub base_offset: u32,
    pub index: ArrayIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerefKind {
    Var(Handle<Variable>),
    Array(ArrayDeref),
    Struct { member: u32 },
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DerefError {
    #[error("cannot index non-array type {ty:?}")]
    NotAnArray { ty: Handle<Type> },
    #[error("cannot select member {member} of non-struct type {ty:?}")]
    NotAStruct { ty: Handle<Type>, member: u32 },
    #[error("struct type {ty:?} has no member {member}")]
    NoSuchMember { ty: Handle<Type>, member: u32 },
}

/// One node of a dereference chain.
///
/// `ty` is the type produced by this node: for the head it is the variable's type, for an
/// array node the element type, for a struct node the member type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deref {
    pub kind: DerefKind,
    pub ty: Handle<Type>,
    pub child: Option<Box<Deref>>,
}

impl Deref {
    pub fn var(var: Handle<Variable>, ty: Handle<Type>) -> Self {
        Deref {
            kind: DerefKind::Var(var),
            ty,
            child: None,
        }
    }

    /// Appends a node to the end of the chain without any type checking.
    pub fn push(mut self, kind: DerefKind, ty: Handle<Type>) -> Self {
        append_child(
            &mut self.child,
            Deref {
                kind,
                ty,
                child: None,
            },
        );
        self
    }

    /// Appends an array-index node, deriving the element type from the current tail.
    pub fn index(
        self,
        types: &Types,
        base_offset: u32,
        index: ArrayIndex,
    ) -> Result<Self, DerefError> {
        let parent = self.tail().ty;
        let elem = types
            .array_base(parent)
            .ok_or(DerefError::NotAnArray { ty: parent })?;
        Ok(self.push(DerefKind::Array(ArrayDeref { base_offset, index }), elem))
    }

    /// Appends a struct-member node, deriving the member type from the current tail.
    pub fn field(self, types: &Types, member: u32) -> Result<Self, DerefError> {
        let parent = self.tail().ty;
        if !types.is_struct(parent) {
            return Err(DerefError::NotAStruct { ty: parent, member });
        }
        let ty = types
            .member(parent, member)
            .ok_or(DerefError::NoSuchMember { ty: parent, member })?
            .ty;
        Ok(self.push(DerefKind::Struct { member }, ty))
    }

    /// Variable at the head of the chain, if the head is a variable node.
    pub fn variable(&self) -> Option<Handle<Variable>> {
        match self.kind {
            DerefKind::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn tail(&self) -> &Deref {
        let mut node = self;
        while let Some(child) = node.child.as_deref() {
            node = child;
        }
        node
    }

    /// Nodes from root to leaf.
    pub fn iter(&self) -> impl Iterator<Item = &Deref> {
        std::iter::successors(Some(self), |node| node.child.as_deref())
    }

    /// Runtime values used as array indices anywhere along the chain.
    pub fn indirect_values(&self) -> impl Iterator<Item = Value> + '_ {
        self.iter().filter_map(|node| match node.kind {
            DerefKind::Array(ArrayDeref {
                index: ArrayIndex::Indirect(value),
                ..
            }) => Some(value),
            _ => None,
        })
    }
}

fn append_child(slot: &mut Option<Box<Deref>>, node: Deref) {
    match slot {
        Some(child) => append_child(&mut child.child, node),
        None => *slot = Some(Box::new(node)),
    }
}
