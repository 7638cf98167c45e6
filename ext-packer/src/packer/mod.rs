//! Payload builder: walks an extension directory and assembles the upload payload.
//!
//! Packing is one sequential pass. Each file is opened, read and released
//! before the next one; aggregate code metrics accumulate in the builder.

pub mod dependencies;
pub mod fields;
pub mod payload;

use crate::error::{PackError, Result};
use crate::fs::metadata::FileMetadata;
use crate::fs::walker::{walk_directory_with_callback, FileInfo, WalkOptions};
use crate::manifest::{read_manifest, Manifest};
use fields::{build_section, Section};
use md5::{Digest, Md5};
use std::path::Path;
use tracing::{debug, info};

pub use payload::{
    DependencyKind, DependencyRecord, ExtensionData, FieldBlock, FileRecord, InfoData, Payload,
    PayloadSummary, TechnicalData,
};

/// Free-text technical info marker sent with every upload.
pub const TECH_INFO: &str = "All good, baby";

/// File extensions counted towards `codeLines`/`codeBytes`.
pub const CODE_EXTENSIONS: &[&str] = &["php", "inc"];

/// Running totals over code files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CodeMetrics {
    lines: u64,
    bytes: u64,
}

/// Hex-encoded MD5 of `content`.
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

/// Number of `\n`-separated segments in `content` (an empty file has one).
pub fn count_lines(content: &[u8]) -> u64 {
    content.iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

/// Whether `name` has one of the [`CODE_EXTENSIONS`] (case-sensitive).
pub fn is_code_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CODE_EXTENSIONS.contains(&e))
}

/// Build the record for one walked file.
pub fn build_file_record(file: &FileInfo) -> Result<FileRecord> {
    let metadata = FileMetadata::from_path(&file.path).map_err(|e| PackError::filesystem(&file.path, e))?;
    let content = std::fs::read(&file.path).map_err(|e| PackError::filesystem(&file.path, e))?;

    let code_lines = is_code_file(&file.relative_path).then(|| count_lines(&content));

    Ok(FileRecord {
        name: file.relative_path.clone(),
        size: metadata.size,
        modification_time: metadata.modified,
        is_executable: metadata.is_executable(),
        content_md5: content_hash(&content),
        content,
        code_lines,
    })
}

/// Packs extension directories with a fixed walk policy.
#[derive(Debug, Clone, Default)]
pub struct Packer {
    options: WalkOptions,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pack `directory` as version payload of `extension_key`.
    pub fn pack(&self, extension_key: &str, directory: &Path, comment: &str) -> Result<Payload> {
        let manifest = read_manifest(extension_key, directory)?;
        info!(
            "Packing extension {} version {} from {}",
            extension_key,
            manifest.version(),
            directory.display()
        );

        let mut files = Vec::new();
        let mut metrics = CodeMetrics::default();
        walk_directory_with_callback(directory, &self.options, |file| {
            let record = build_file_record(&file)?;
            if let Some(lines) = record.code_lines {
                metrics.lines += lines;
                metrics.bytes += record.size;
            }
            if file.is_symlink {
                debug!("Packed {} ({} bytes, via symlink)", record.name, record.size);
            } else {
                debug!("Packed {} ({} bytes)", record.name, record.size);
            }
            files.push(record);
            Ok(())
        })?;

        let payload = assemble(extension_key, &manifest, files, metrics, comment)?;
        let summary = payload.summary();
        info!(
            "Packed {} files ({} bytes), {} code lines in {} code bytes",
            summary.files, summary.total_bytes, summary.code_lines, summary.code_bytes
        );
        Ok(payload)
    }
}

fn assemble(
    extension_key: &str,
    manifest: &Manifest,
    files: Vec<FileRecord>,
    metrics: CodeMetrics,
    comment: &str,
) -> Result<Payload> {
    let dependencies = dependencies::build_dependencies(manifest)?;

    Ok(Payload {
        extension_data: ExtensionData {
            extension_key: extension_key.to_string(),
            version: manifest.version(),
            meta_data: build_section(Section::MetaData, manifest),
            technical_data: TechnicalData {
                dependencies,
                fields: build_section(Section::TechnicalData, manifest),
            },
            info_data: InfoData {
                code_lines: metrics.lines,
                code_bytes: metrics.bytes,
                fields: build_section(Section::InfoData, manifest),
                upload_comment: comment.to_string(),
                tech_info: TECH_INFO.to_string(),
            },
        },
        files_data: files,
    })
}

/// Pack `directory` with the default walk policy.
///
/// # Example
/// ```no_run
/// use std::path::Path;
///
/// let payload = ext_packer::pack("news", Path::new("./news"), "Bugfix release").unwrap();
/// println!("{} files", payload.files_data.len());
/// ```
pub fn pack(extension_key: &str, directory: &Path, comment: &str) -> Result<Payload> {
    Packer::new().pack(extension_key, directory, comment)
}
