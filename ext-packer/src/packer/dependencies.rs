//! Dependency records from the manifest's `constraints` block.

use super::payload::{DependencyKind, DependencyRecord};
use crate::error::{PackError, Result};
use crate::manifest::{Manifest, ManifestValue};

/// All `depends`, then `conflicts`, then `suggests` records, each kind in
/// declaration order. Kinds that are missing or not arrays contribute
/// nothing.
pub fn build_dependencies(manifest: &Manifest) -> Result<Vec<DependencyRecord>> {
    let mut records = Vec::new();
    let Some(constraints) = manifest.constraints() else {
        return Ok(records);
    };

    for kind in DependencyKind::ALL {
        let Some(entries) = constraints.get(kind.as_str()).and_then(ManifestValue::as_array) else {
            continue;
        };
        for (key, range) in entries.iter() {
            let invalid = || PackError::InvalidDependencyDefinition {
                kind: kind.as_str().to_string(),
            };
            let extension_key = key.as_str().ok_or_else(invalid)?;
            let version_range = range.to_text().ok_or_else(invalid)?;
            records.push(DependencyRecord {
                kind,
                extension_key: extension_key.to_string(),
                version_range,
            });
        }
    }

    Ok(records)
}
