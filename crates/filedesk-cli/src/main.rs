//! filedesk CLI: manage the files in your storage namespace from a terminal.
//!
//! Reads configuration from the environment (and `.env`). With the Supabase backend set
//! SUPABASE_URL, SUPABASE_ANON_KEY and SUPABASE_ACCESS_TOKEN; with the local backend set
//! LOCAL_SIGNING_SECRET and FILEDESK_IDENTITY.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use filedesk_cli::{
    auth_client, format_file_row, init_tracing, into_cli_error, mount_view, resolve_identity,
};
use filedesk_core::models::UploadFile;
use filedesk_core::{AppError, Config};
use filedesk_view::{
    Clipboard, FileManagerView, GateDecision, MemoryClipboard, PrintOpener, SystemClipboard,
    SystemOpener, TwoFactorGate, UrlOpener,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "filedesk", about = "Upload, share and analyze your files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files in your namespace
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Upload a local file (an existing file with the same name is replaced)
    Upload {
        /// Path to the file to upload
        path: std::path::PathBuf,
    },
    /// Open a short-lived download link
    Download {
        name: String,
        /// Print the link instead of opening it
        #[arg(long)]
        print: bool,
    },
    /// Create a share link valid for 24 hours
    Share {
        name: String,
        /// Copy the link to the system clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Delete a file
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Send a PDF to the analysis endpoint
    Analyze { name: String },
    /// Check whether a verified TOTP factor is registered
    MfaStatus,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush().ok();
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// Cancel the running analysis on Ctrl-C. Never completes.
async fn cancel_on_ctrl_c(view: &FileManagerView) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Cancelling analysis");
        view.cancel_analysis();
    }
    std::future::pending::<()>().await
}

async fn mfa_status(config: &Config) -> anyhow::Result<()> {
    let gate = TwoFactorGate::new(Arc::new(auth_client(config)?));
    let decision = gate.check().await;
    print_json(&gate.snapshot())?;
    if decision == GateDecision::Failed {
        anyhow::bail!("MFA status check failed");
    }
    Ok(())
}

async fn open_view(
    config: &Config,
    clipboard: Arc<dyn Clipboard>,
    opener: Arc<dyn UrlOpener>,
) -> anyhow::Result<FileManagerView> {
    let identity = resolve_identity(config).await?;
    mount_view(config, identity, clipboard, opener).await
}

fn headless() -> (Arc<dyn Clipboard>, Arc<dyn UrlOpener>) {
    (Arc::new(MemoryClipboard::new()), Arc::new(PrintOpener))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::List { format } => {
            let (clipboard, opener) = headless();
            let view = open_view(&config, clipboard, opener).await?;
            let state = view.snapshot();
            match format {
                OutputFormat::Json => print_json(&state.files)?,
                OutputFormat::Table => {
                    if state.files.is_empty() {
                        println!("No files found.");
                    }
                    for file in &state.files {
                        println!("{}", format_file_row(file));
                    }
                }
            }
        }
        Commands::Upload { path } => {
            let file = UploadFile::from_path(&path).await.map_err(into_cli_error)?;
            let (clipboard, opener) = headless();
            let view = open_view(&config, clipboard, opener).await?;
            view.upload(file).await.map_err(into_cli_error)?;
            let state = view.snapshot();
            print_json(&serde_json::json!({
                "success": state.success,
                "files": state.files,
            }))?;
        }
        Commands::Download { name, print } => {
            let opener: Arc<dyn UrlOpener> = if print {
                Arc::new(PrintOpener)
            } else {
                Arc::new(SystemOpener)
            };
            let view = open_view(&config, Arc::new(MemoryClipboard::new()), opener).await?;
            view.download(&name).await.map_err(into_cli_error)?;
        }
        Commands::Share { name, copy } => {
            let clipboard: Arc<dyn Clipboard> = if copy {
                Arc::new(SystemClipboard::new())
            } else {
                Arc::new(MemoryClipboard::new())
            };
            let view = open_view(&config, clipboard, Arc::new(PrintOpener)).await?;
            let link = view.share(&name).await.map_err(into_cli_error)?;
            if copy {
                view.copy_share_link().await.map_err(into_cli_error)?;
            }
            let state = view.snapshot();
            print_json(&serde_json::json!({
                "title": state.share_dialog_title(),
                "url": link.url,
                "expires_at": link.expires_at(),
                "notice": state.share_expiry_notice(),
                "copied": state.show_copied,
            }))?;
        }
        Commands::Delete { name, yes } => {
            let (clipboard, opener) = headless();
            let view = open_view(&config, clipboard, opener).await?;
            view.request_delete(&name);
            if yes || confirm(&format!("Delete {}?", name))? {
                view.confirm_delete().await.map_err(into_cli_error)?;
                print_json(&serde_json::json!({
                    "success": view.snapshot().success,
                    "file": name,
                }))?;
            } else {
                view.cancel_delete();
                print_json(&serde_json::json!({ "cancelled": true, "file": name }))?;
            }
        }
        Commands::Analyze { name } => {
            let (clipboard, opener) = headless();
            let view = open_view(&config, clipboard, opener).await?;
            let result = tokio::select! {
                r = view.analyze(&name) => r,
                _ = cancel_on_ctrl_c(&view) => Err(AppError::Cancelled("analysis")),
            };
            let text = result.map_err(into_cli_error)?;
            let state = view.snapshot();
            print_json(&serde_json::json!({
                "title": state.analysis_dialog_title(),
                "paragraphs": state.analysis_paragraphs(),
                "raw": text,
            }))?;
        }
        Commands::MfaStatus => mfa_status(&config).await?,
    }

    Ok(())
}
