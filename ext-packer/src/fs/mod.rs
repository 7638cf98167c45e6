//! Filesystem access for packing: directory walk, dot-file policy, metadata.

pub mod metadata;
pub mod walker;
