//! `pack`: write the upload payload as JSON without contacting the registry.

use crate::cli::PackArgs;
use crate::utils::Result;
use tracing::info;

pub fn execute(args: &PackArgs) -> Result<Vec<String>> {
    let payload = ext_packer::pack(&args.extension_key, &args.directory, &args.comment)?;
    let json = serde_json::to_string_pretty(&payload)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote payload to {}", path.display());
            let summary = payload.summary();
            Ok(vec![format!(
                "Packed {} version {}: {} files, {} code lines",
                payload.extension_key(),
                payload.version(),
                summary.files,
                summary.code_lines
            )])
        }
        None => Ok(vec![json]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ext_packer::MANIFEST_FILE;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_pack_to_file() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "<?php $EM_CONF[$_EXTKEY] = ['title' => 'Demo', 'version' => '0.1.0'];",
        )?;
        let out = TempDir::new()?;
        let output = out.path().join("payload.json");

        let args = PackArgs {
            extension_key: "demo".to_string(),
            directory: dir.path().to_path_buf(),
            comment: String::new(),
            output: Some(output.clone()),
        };
        let lines = execute(&args).unwrap();
        assert_eq!(lines, vec!["Packed demo version 0.1.0: 1 files, 1 code lines"]);

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
        assert_eq!(written["extensionData"]["version"], "0.1.0");
        assert_eq!(written["extensionData"]["metaData"]["title"], "Demo");
        assert_eq!(written["filesData"][0]["name"], MANIFEST_FILE);
        Ok(())
    }

    #[test]
    fn test_pack_to_stdout_returns_json() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "<?php $EM_CONF[$_EXTKEY] = ['version' => '0.1.0'];",
        )?;

        let args = PackArgs {
            extension_key: "demo".to_string(),
            directory: dir.path().to_path_buf(),
            comment: "note".to_string(),
            output: None,
        };
        let lines = execute(&args).unwrap();
        assert_eq!(lines.len(), 1);
        let json: serde_json::Value = serde_json::from_str(&lines[0])?;
        assert_eq!(json["extensionData"]["infoData"]["uploadComment"], "note");
        Ok(())
    }
}
