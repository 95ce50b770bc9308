//! Link-time sampler resolution.
//!
//! [`lower_samplers`] rewrites texture instructions that still name their sampler through a
//! dereference chain so they carry a hardware sampler index instead, using the program's
//! [`UniformStorage`] to find each uniform's binding.

mod error;
mod lower;
mod uniform_storage;

pub use error::{LowerError, Site};
pub use lower::lower_samplers;
pub use uniform_storage::{OpaqueBinding, UniformStorage, UniformStorageEntry};

#[cfg(test)]
mod proptests;
