//! Error types for the packaging pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Stable code attached to [`PackError::InvalidVersion`] so scripts can match on it.
pub const INVALID_VERSION_CODE: u64 = 1426383996;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("Directory \"{}\" does not contain an ext_emconf.php file", directory.display())]
    MissingManifest { directory: PathBuf },

    #[error("Syntax error in {} at line {line}: {message}", path.display())]
    ManifestSyntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{} does not declare $EM_CONF for extension \"{extension_key}\"", path.display())]
    MissingExtensionEntry {
        extension_key: String,
        path: PathBuf,
    },

    #[error(
        "Invalid version number \"{version}\" detected in ext_emconf.php, refusing to pack extension for upload (code {code})"
    )]
    InvalidVersion { version: String, code: u64 },

    #[error("Invalid dependency definition in constraints.{kind}! Dependencies must be an array indexed by extension key")]
    InvalidDependencyDefinition { kind: String },

    #[error("I/O error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_version(version: impl Into<String>) -> Self {
        PackError::InvalidVersion {
            version: version.into(),
            code: INVALID_VERSION_CODE,
        }
    }

    /// Numeric code for scripting, if this error kind carries one.
    pub fn code(&self) -> Option<u64> {
        match self {
            PackError::InvalidVersion { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;
