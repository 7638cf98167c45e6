//! Command line interface definition.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack an extension directory and upload it as a new version
    Upload(UploadArgs),

    /// Remove a version of an extension from the registry (registry admins only)
    RemoveVersion(RemoveVersionArgs),

    /// Pack an extension directory and write the upload payload as JSON
    Pack(PackArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// Username of the account owning the extension
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password of the account owning the extension
    #[arg(short, long)]
    pub password: Option<String>,

    /// Alternative registry RPC endpoint (overrides config)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct UploadArgs {
    /// Extension key
    pub extension_key: String,

    /// Extension root directory containing ext_emconf.php
    pub directory: PathBuf,

    /// Upload comment shown in the registry
    #[arg(short = 'm', long, default_value = "")]
    pub comment: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RemoveVersionArgs {
    /// Extension key
    pub extension_key: String,

    /// Version to be removed from the registry
    pub version: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PackArgs {
    /// Extension key
    pub extension_key: String,

    /// Extension root directory containing ext_emconf.php
    pub directory: PathBuf,

    /// Upload comment to embed in the payload
    #[arg(short = 'm', long, default_value = "")]
    pub comment: String,

    /// Write the payload to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let args = Args::parse_from([
            "ter-client", "upload", "news", "./news", "-m", "Bugfix release", "-u", "jdoe",
        ]);
        match args.command {
            Command::Upload(upload) => {
                assert_eq!(upload.extension_key, "news");
                assert_eq!(upload.directory, PathBuf::from("./news"));
                assert_eq!(upload.comment, "Bugfix release");
                assert_eq!(upload.credentials.username.as_deref(), Some("jdoe"));
                assert!(upload.credentials.password.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_remove_version_with_endpoint() {
        let args = Args::parse_from([
            "ter-client",
            "remove-version",
            "news",
            "7.3.1",
            "--endpoint",
            "http://localhost:8080/rpc",
            "-l",
            "debug",
        ]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        match args.command {
            Command::RemoveVersion(remove) => {
                assert_eq!(remove.version, "7.3.1");
                assert_eq!(
                    remove.credentials.endpoint.as_deref(),
                    Some("http://localhost:8080/rpc")
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_upload_requires_directory() {
        assert!(Args::try_parse_from(["ter-client", "upload", "news"]).is_err());
    }
}
