use std::num::NonZeroU32;

use crate::arena::{Arena, Handle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Uint,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerDim {
    D1,
    D2,
    D3,
    Cube,
    Rect,
    Buffer,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArraySize {
    Constant(NonZeroU32),
    /// Unsized (`T[]`) array. Only legal as the last member of a buffer block; opaque uniforms
    /// never resolve through one.
    Runtime,
}

impl ArraySize {
    pub fn constant(len: u32) -> Option<Self> {
        NonZeroU32::new(len).map(ArraySize::Constant)
    }

    /// Element count used for uniform location layout. Runtime-sized arrays occupy a single
    /// element.
    fn layout_len(self) -> u32 {
        match self {
            ArraySize::Constant(len) => len.get(),
            ArraySize::Runtime => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructMember {
    pub name: String,
    pub ty: Handle<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeInner {
    Scalar(ScalarKind),
    Vector {
        kind: ScalarKind,
        size: u8,
    },
    Sampler {
        dim: SamplerDim,
        shadow: bool,
        arrayed: bool,
    },
    Array {
        base: Handle<Type>,
        size: ArraySize,
    },
    Struct {
        members: Vec<StructMember>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub name: Option<String>,
    pub inner: TypeInner,
}

/// The type table of a shader.
///
/// Besides storage, this answers the two layout questions sampler lowering needs:
/// [`Types::declared_length`] for array levels and [`Types::record_location_offset`] for
/// struct members.
#[derive(Debug, Default, Clone)]
pub struct Types {
    arena: Arena<Type>,
}

impl Types {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `ty`, reusing an existing handle for structurally equal types.
    pub fn insert(&mut self, ty: Type) -> Handle<Type> {
        self.arena.fetch_or_append(ty)
    }

    pub fn scalar(&mut self, kind: ScalarKind) -> Handle<Type> {
        self.insert(Type {
            name: None,
            inner: TypeInner::Scalar(kind),
        })
    }

    pub fn sampler(&mut self, dim: SamplerDim, shadow: bool) -> Handle<Type> {
        self.insert(Type {
            name: None,
            inner: TypeInner::Sampler {
                dim,
                shadow,
                arrayed: false,
            },
        })
    }

    /// Inserts `base[len]`. A `len` of zero produces a runtime-sized array.
    pub fn array(&mut self, base: Handle<Type>, len: u32) -> Handle<Type> {
        self.insert(Type {
            name: None,
            inner: TypeInner::Array {
                base,
                size: ArraySize::constant(len).unwrap_or(ArraySize::Runtime),
            },
        })
    }

    pub fn structure(&mut self, name: &str, members: Vec<StructMember>) -> Handle<Type> {
        self.insert(Type {
            name: Some(name.to_owned()),
            inner: TypeInner::Struct { members },
        })
    }

    pub fn get(&self, handle: Handle<Type>) -> Option<&Type> {
        self.arena.get(handle)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<Type>, &Type)> {
        self.arena.iter()
    }

    pub fn check_contains_handle(
        &self,
        handle: Handle<Type>,
    ) -> Result<(), crate::arena::BadHandle> {
        self.arena.check_contains_handle(handle)
    }

    pub fn is_array(&self, ty: Handle<Type>) -> bool {
        matches!(self.inner(ty), Some(TypeInner::Array { .. }))
    }

    pub fn is_struct(&self, ty: Handle<Type>) -> bool {
        matches!(self.inner(ty), Some(TypeInner::Struct { .. }))
    }

    pub fn is_sampler(&self, ty: Handle<Type>) -> bool {
        matches!(self.inner(ty), Some(TypeInner::Sampler { .. }))
    }

    /// Declared element count of an array type, or `None` for non-arrays and runtime-sized
    /// arrays.
    pub fn declared_length(&self, ty: Handle<Type>) -> Option<u32> {
        match self.inner(ty)? {
            TypeInner::Array {
                size: ArraySize::Constant(len),
                ..
            } => Some(len.get()),
            _ => None,
        }
    }

    pub fn array_base(&self, ty: Handle<Type>) -> Option<Handle<Type>> {
        match self.inner(ty)? {
            TypeInner::Array { base, .. } => Some(*base),
            _ => None,
        }
    }

    pub fn member(&self, ty: Handle<Type>, index: u32) -> Option<&StructMember> {
        match self.inner(ty)? {
            TypeInner::Struct { members } => members.get(index as usize),
            _ => None,
        }
    }

    /// Strips every array level from `ty`.
    pub fn without_array(&self, mut ty: Handle<Type>) -> Handle<Type> {
        while let Some(base) = self.array_base(ty) {
            ty = base;
        }
        ty
    }

    /// Product of every array dimension of `ty`, or 0 when `ty` is not an array.
    pub fn arrays_of_arrays_size(&self, mut ty: Handle<Type>) -> u32 {
        let mut total: Option<u32> = None;
        while let Some(TypeInner::Array { base, size }) = self.inner(ty) {
            total = Some(total.unwrap_or(1).saturating_mul(size.layout_len()));
            ty = *base;
        }
        total.unwrap_or(0)
    }

    /// Number of uniform locations occupied by the first `length` members of the struct
    /// underlying `ty` (array levels are stripped first).
    ///
    /// Each plain member occupies one location; a member that is a struct (or an array of
    /// structs) occupies the locations of every element; an array of arrays occupies one
    /// location per outer element. Returns 0 for non-struct types.
    pub fn record_location_offset(&self, ty: Handle<Type>, length: u32) -> u32 {
        let record = self.without_array(ty);
        let Some(TypeInner::Struct { members }) = self.inner(record) else {
            return 0;
        };

        let mut offset = 0u32;
        for member in members.iter().take(length as usize) {
            let st = member.ty;
            let wa = self.without_array(st);
            let slots = if self.is_struct(wa) {
                let inner = self.location_count(wa);
                if self.is_array(st) {
                    self.arrays_of_arrays_size(st).saturating_mul(inner)
                } else {
                    inner
                }
            } else {
                self.outer_array_size(st).unwrap_or(1)
            };
            offset = offset.saturating_add(slots);
        }
        offset
    }

    /// Number of uniform locations occupied by a whole struct.
    pub fn location_count(&self, ty: Handle<Type>) -> u32 {
        let record = self.without_array(ty);
        let len = match self.inner(record) {
            Some(TypeInner::Struct { members }) => members.len() as u32,
            _ => return 1,
        };
        self.record_location_offset(record, len)
    }

    /// For an array of arrays, the product of every dimension except the innermost one.
    fn outer_array_size(&self, ty: Handle<Type>) -> Option<u32> {
        let TypeInner::Array { base, size } = self.inner(ty)? else {
            return None;
        };
        if !self.is_array(*base) {
            return None;
        }
        let mut outer = size.layout_len();
        let mut base = *base;
        while let Some(TypeInner::Array {
            base: next,
            size: next_size,
        }) = self.inner(base)
        {
            if !self.is_array(*next) {
                break;
            }
            outer = outer.saturating_mul(next_size.layout_len());
            base = *next;
        }
        Some(outer)
    }

    fn inner(&self, ty: Handle<Type>) -> Option<&TypeInner> {
        self.arena.get(ty).map(|t| &t.inner)
    }
}

impl std::ops::Index<Handle<Type>> for Types {
    type Output = Type;
    fn index(&self, handle: Handle<Type>) -> &Type {
        &self.arena[handle]
    }
}
