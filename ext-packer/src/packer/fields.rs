//! Manifest → payload field mapping.
//!
//! One table holds every manifest-derived scalar of the payload: which
//! section it lands in, its wire name, the manifest key it is read from and
//! what to use when the key is absent. Table order is wire order.

use super::payload::FieldBlock;
use crate::manifest::{Manifest, ManifestValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    MetaData,
    TechnicalData,
    InfoData,
}

/// Policy for a missing (or `null`) manifest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Absent → `null`; present values pass through unchanged.
    Null,
    /// Absent → `false`; present values pass through unchanged.
    False,
    /// Always a boolean: present values are coerced, absent → `false`.
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub section: Section,
    pub wire: &'static str,
    pub source: &'static str,
    pub fallback: Fallback,
}

const fn rule(section: Section, wire: &'static str, source: &'static str, fallback: Fallback) -> FieldRule {
    FieldRule {
        section,
        wire,
        source,
        fallback,
    }
}

use Fallback::{Bool, False, Null};
use Section::{InfoData, MetaData, TechnicalData};

pub const FIELD_TABLE: &[FieldRule] = &[
    rule(MetaData, "title", "title", Null),
    rule(MetaData, "description", "description", Null),
    rule(MetaData, "category", "category", Null),
    rule(MetaData, "state", "state", Null),
    rule(MetaData, "authorName", "author", Null),
    rule(MetaData, "authorEmail", "author_email", Null),
    rule(MetaData, "authorCompany", "author_company", Null),
    rule(TechnicalData, "loadOrder", "loadOrder", Null),
    rule(TechnicalData, "uploadFolder", "uploadFolder", Bool),
    rule(TechnicalData, "createDirs", "createDirs", Null),
    rule(TechnicalData, "shy", "shy", False),
    rule(TechnicalData, "modules", "module", Null),
    rule(TechnicalData, "modifyTables", "modify_tables", Null),
    rule(TechnicalData, "priority", "priority", Null),
    rule(TechnicalData, "clearCacheOnLoad", "clearCacheOnLoad", Bool),
    rule(TechnicalData, "lockType", "lockType", Null),
    // Wire name kept exactly as the registry expects it.
    rule(TechnicalData, "doNotLoadInFEe", "doNotLoadInFE", Null),
    rule(TechnicalData, "docPath", "docPath", Null),
    rule(InfoData, "codingGuidelinesCompliance", "CGLcompliance", Null),
    rule(InfoData, "codingGuidelinesComplianceNotes", "CGLcompliance_note", Null),
];

impl FieldRule {
    /// Value of this field for `manifest`, with the fallback applied.
    pub fn resolve(&self, manifest: &Manifest) -> ManifestValue {
        let value = manifest.get(self.source);
        match self.fallback {
            Fallback::Null => value.cloned().unwrap_or(ManifestValue::Null),
            Fallback::False => value.cloned().unwrap_or(ManifestValue::Bool(false)),
            Fallback::Bool => ManifestValue::Bool(value.is_some_and(ManifestValue::is_truthy)),
        }
    }
}

/// Resolve every table entry of `section`, in table order.
pub fn build_section(section: Section, manifest: &Manifest) -> FieldBlock {
    let mut block = FieldBlock::default();
    for rule in FIELD_TABLE.iter().filter(|r| r.section == section) {
        block.push(rule.wire, rule.resolve(manifest));
    }
    block
}
