//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filegate_service::ServiceConfig;

#[derive(Debug, Parser)]
#[command(name = "filegate", version, about = "Upload and download files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON config file
    #[arg(long, short = 'c', env = "FILEGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Metadata server base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Object store base URL
    #[arg(long, global = true)]
    pub object_url: Option<String>,

    /// Session token sent with credentialed requests
    #[arg(long, env = "FILEGATE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Session id sent with credentialed requests
    #[arg(long, env = "FILEGATE_SESSION_ID", global = true)]
    pub session_id: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a local file against the upload rules
    Validate { path: PathBuf },
    /// Upload a local file
    Upload {
        path: PathBuf,
        /// Logical name the object key is grouped under
        #[arg(long, short = 'n', default_value = "files")]
        name: String,
    },
    /// Download a stored file
    Download {
        filename: String,
        /// Name to save as when the server does not provide one
        #[arg(long = "as")]
        display_name: Option<String>,
        /// Target directory
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,
    },
    /// Show the metadata record of a stored file
    Info { file_id: String },
    /// Print the download or preview URL of a stored file
    Url {
        filename: String,
        #[arg(long)]
        preview: bool,
    },
    /// Print the category of a file name
    Type { filename: String },
}

impl Cli {
    /// Applies URL flags on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(url) = &self.object_url {
            config.object_base_url = url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_with_defaults() {
        let cli = Cli::try_parse_from(["filegate", "upload", "me.png"]).unwrap();
        match cli.command {
            Command::Upload { path, name } => {
                assert_eq!(path, PathBuf::from("me.png"));
                assert_eq!(name, "files");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_download_options() {
        let cli = Cli::try_parse_from([
            "filegate", "download", "abc.pdf", "--as", "Report.pdf", "-o", "/tmp",
        ])
        .unwrap();
        match cli.command {
            Command::Download {
                filename,
                display_name,
                out,
            } => {
                assert_eq!(filename, "abc.pdf");
                assert_eq!(display_name.as_deref(), Some("Report.pdf"));
                assert_eq!(out, PathBuf::from("/tmp"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn url_flags_override_config() {
        let cli = Cli::try_parse_from([
            "filegate",
            "url",
            "a.pdf",
            "--api-url",
            "https://api.example.com",
        ])
        .unwrap();
        let mut config = ServiceConfig::default();
        let object_before = config.object_base_url.clone();
        cli.apply_overrides(&mut config);
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.object_base_url, object_before);
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["filegate"]).is_err());
    }
}
