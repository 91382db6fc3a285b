//! filegate command-line entry point.

mod cli;

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use filegate_notify::LogNotifier;
use filegate_service::{
    AuthContext, AuthExpired, DirectorySaveSink, FileService, LocalFile, ProgressFn,
    ReqwestHttpClient, ServiceConfig, TransferResult,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        ServiceConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    tracing::debug!(api = %config.api_base_url, objects = %config.object_base_url, "configuration loaded");

    run(cli, config).await
}

async fn run(cli: Cli, config: ServiceConfig) -> Result<()> {
    let auth = AuthContext::new(
        cli.token.clone().unwrap_or_default(),
        cli.session_id.clone().unwrap_or_default(),
    );

    match cli.command {
        Command::Validate { path } => {
            let file = LocalFile::from_path(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let svc = service(&config, &auth, Path::new("."))?;
            match svc.validate(Some(&file.info)).reason() {
                None => println!("{}: ok", file.name()),
                Some(reason) => bail!("{}: {reason}", file.name()),
            }
        }
        Command::Upload { path, name } => {
            let file = LocalFile::from_path(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let svc = Arc::new(service(&config, &auth, Path::new("."))?);
            let interrupt = cancel_on_ctrl_c(Arc::clone(&svc), file.name().to_string());

            let progress: ProgressFn = Arc::new(|percent: u32| {
                eprint!("\ruploading... {percent:>3}%");
                let _ = std::io::stderr().flush();
            });
            let result = svc.upload(&file, Some(progress), &auth, &name).await;
            interrupt.abort();
            eprintln!();

            let uploaded = finish(result)?;
            println!("{}", serde_json::to_string_pretty(&uploaded.file)?);
        }
        Command::Download {
            filename,
            display_name,
            out,
        } => {
            let svc = service(&config, &auth, &out)?;
            let display = display_name.as_deref().unwrap_or(&filename);
            let downloaded = finish(svc.download(&filename, display).await)?;
            // Give the delayed release a chance to remove the staged copy.
            tokio::time::sleep(config.release_delay()).await;
            println!(
                "saved {} ({}, {} bytes)",
                downloaded.saved_to.display(),
                downloaded.content_type,
                downloaded.size_bytes
            );
        }
        Command::Info { file_id } => {
            let svc = service(&config, &auth, Path::new("."))?;
            let file = finish(svc.file_info(&file_id).await)?;
            println!("{}", serde_json::to_string_pretty(&file)?);
        }
        Command::Url { filename, preview } => {
            let svc = service(&config, &auth, Path::new("."))?;
            println!("{}", svc.file_url(&filename, preview));
        }
        Command::Type { filename } => {
            let svc = service(&config, &auth, Path::new("."))?;
            println!("{}", svc.file_type(&filename));
        }
    }
    Ok(())
}

fn service(config: &ServiceConfig, auth: &AuthContext, save_dir: &Path) -> Result<FileService> {
    let http = ReqwestHttpClient::new(Some(auth.clone())).context("failed to build HTTP client")?;
    let svc = FileService::new(
        config,
        Arc::new(http),
        Arc::new(LogNotifier),
        Arc::new(DirectorySaveSink::new(save_dir)),
    )?;
    Ok(svc)
}

/// Turns a transfer outcome into a value or a process error.
fn finish<T>(result: Result<TransferResult<T>, AuthExpired>) -> Result<T> {
    match result? {
        TransferResult::Success(value) => Ok(value),
        TransferResult::Failure(failure) => {
            if let Some(cause) = &failure.cause {
                tracing::debug!(%cause, kind = ?failure.kind, "transfer failed");
            }
            if failure.retryable {
                bail!("{} (retryable)", failure.message);
            }
            bail!("{}", failure.message)
        }
    }
}

fn cancel_on_ctrl_c(svc: Arc<FileService>, key: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let outcome = svc.cancel_upload(&key);
            tracing::info!(ok = outcome.ok, "{}", outcome.message);
        }
    })
}
