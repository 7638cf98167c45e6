//! Payload types handed to the registry client.
//!
//! Field names and their order are part of the registry contract; the
//! serde attributes here are the single place that defines them.

use crate::manifest::ManifestValue;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Fully assembled upload payload for one extension version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub extension_data: ExtensionData,
    pub files_data: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionData {
    pub extension_key: String,
    pub version: String,
    pub meta_data: FieldBlock,
    pub technical_data: TechnicalData,
    pub info_data: InfoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalData {
    pub dependencies: Vec<DependencyRecord>,
    #[serde(flatten)]
    pub fields: FieldBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoData {
    pub code_lines: u64,
    pub code_bytes: u64,
    #[serde(flatten)]
    pub fields: FieldBlock,
    pub upload_comment: String,
    pub tech_info: String,
}

/// Ordered manifest-derived fields of one payload section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldBlock(Vec<(&'static str, ManifestValue)>);

impl FieldBlock {
    pub fn push(&mut self, name: &'static str, value: ManifestValue) {
        self.0.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&ManifestValue> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(n, _)| *n)
    }
}

impl Serialize for FieldBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Relationship kind of a dependency record, in payload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Depends,
    Conflicts,
    Suggests,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 3] = [
        DependencyKind::Depends,
        DependencyKind::Conflicts,
        DependencyKind::Suggests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Depends => "depends",
            DependencyKind::Conflicts => "conflicts",
            DependencyKind::Suggests => "suggests",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    pub kind: DependencyKind,
    pub extension_key: String,
    pub version_range: String,
}

/// One packed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    pub modification_time: u64,
    #[serde(serialize_with = "serialize_flag")]
    pub is_executable: bool,
    #[serde(serialize_with = "serialize_base64")]
    pub content: Vec<u8>,
    #[serde(rename = "contentMD5")]
    pub content_md5: String,
    /// Line count for php/inc files; feeds the aggregate only.
    #[serde(skip)]
    pub code_lines: Option<u64>,
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

fn serialize_base64<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(content))
}

/// Totals used for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSummary {
    pub files: usize,
    pub total_bytes: u64,
    pub code_lines: u64,
    pub code_bytes: u64,
}

impl Payload {
    pub fn extension_key(&self) -> &str {
        &self.extension_data.extension_key
    }

    pub fn version(&self) -> &str {
        &self.extension_data.version
    }

    pub fn summary(&self) -> PayloadSummary {
        PayloadSummary {
            files: self.files_data.len(),
            total_bytes: self.files_data.iter().map(|f| f.size).sum(),
            code_lines: self.extension_data.info_data.code_lines,
            code_bytes: self.extension_data.info_data.code_bytes,
        }
    }
}
