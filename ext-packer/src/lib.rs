//! Extension packer library
//!
//! Turns an extension directory and its `ext_emconf.php` manifest into the
//! payload uploaded to the extension registry: extension metadata, the
//! ordered dependency list and one content record per shipped file.

pub mod error;
pub mod fs;
pub mod manifest;
pub mod packer;

// Re-export commonly used types
pub use error::{PackError, Result, INVALID_VERSION_CODE};
pub use manifest::{read_manifest, Manifest, ManifestValue, MANIFEST_FILE};
pub use packer::{pack, DependencyKind, DependencyRecord, FileRecord, Packer, Payload};
