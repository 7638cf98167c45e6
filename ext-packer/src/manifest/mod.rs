//! Reading and validating an extension's `ext_emconf.php` manifest.

pub mod parser;
pub mod value;

use crate::error::{PackError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

pub use value::{Array, Key, ManifestValue};

/// Manifest file expected at the extension root.
pub const MANIFEST_FILE: &str = "ext_emconf.php";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,2}\.[0-9]{1,2}\.[0-9]{1,2}$").expect("version pattern is valid")
});

/// Validated metadata of one extension.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    entries: Array,
}

impl Manifest {
    /// Wrap an already-parsed entry, validating its version.
    pub fn from_entries(entries: Array) -> Result<Self> {
        let version = entries
            .get("version")
            .and_then(ManifestValue::to_text)
            .unwrap_or_default();
        validate_version(&version)?;
        Ok(Self { entries })
    }

    /// The validated `version` string.
    pub fn version(&self) -> String {
        self.entries
            .get("version")
            .and_then(ManifestValue::to_text)
            .unwrap_or_default()
    }

    /// Raw value for a manifest key; `None` when absent or `null`.
    pub fn get(&self, key: &str) -> Option<&ManifestValue> {
        self.entries.get(key).filter(|v| !v.is_null())
    }

    /// The `constraints` block, if it is an array.
    pub fn constraints(&self) -> Option<&Array> {
        self.get("constraints").and_then(ManifestValue::as_array)
    }

    pub fn entries(&self) -> &Array {
        &self.entries
    }
}

/// Check a version string against the `NN.NN.NN` pattern.
pub fn validate_version(version: &str) -> Result<()> {
    if VERSION_PATTERN.is_match(version) {
        Ok(())
    } else {
        Err(PackError::invalid_version(version))
    }
}

/// Load the manifest of `extension_key` from `directory/ext_emconf.php`.
pub fn read_manifest(extension_key: &str, directory: &Path) -> Result<Manifest> {
    let path = directory.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(PackError::MissingManifest {
            directory: directory.to_path_buf(),
        });
    }

    let source = std::fs::read(&path).map_err(|e| PackError::filesystem(&path, e))?;
    let source = String::from_utf8(source).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        PackError::ManifestSyntax {
            path: path.clone(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            message: "manifest is not valid UTF-8".to_string(),
        }
    })?;

    let em_conf = parser::parse_descriptor(&source, extension_key).map_err(|e| {
        PackError::ManifestSyntax {
            path: path.clone(),
            line: e.line,
            message: e.message,
        }
    })?;

    let entries = em_conf
        .get(extension_key)
        .and_then(ManifestValue::as_array)
        .cloned()
        .ok_or_else(|| PackError::MissingExtensionEntry {
            extension_key: extension_key.to_string(),
            path: path.clone(),
        })?;

    let manifest = Manifest::from_entries(entries)?;
    debug!(
        "Read manifest for {} version {} from {}",
        extension_key,
        manifest.version(),
        path.display()
    );
    Ok(manifest)
}
