use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ChangeOutcome, HttpStorefrontClient, ImageFile, QuantitySyncController,
    RubleFormatter, SelectionSource, SubmitOutcome, ToastBoard, UploadController,
};
use futures::future::join_all;
use shared::domain::LineId;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{print_toasts, TerminalCartView, TerminalUploadView};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
struct Args {
    /// Overrides the configured storefront base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a pet photo and show matching products.
    Detect {
        path: PathBuf,
        /// Treat the file as dropped onto the page instead of picked.
        #[arg(long)]
        drop: bool,
    },
    /// Replay quantity edits against cart lines.
    Cart {
        /// Line as rendered by the server, `ID=QTY`.
        #[arg(long = "line", value_parser = parse_line, required = true)]
        lines: Vec<(LineId, u32)>,
        /// Change to apply, `ID=+`, `ID=-` or `ID=<typed value>`.
        #[arg(long = "change", value_parser = parse_change)]
        changes: Vec<(LineId, String)>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    info!(base_url = %settings.base_url, "storefront: settings loaded");

    let backend = Arc::new(HttpStorefrontClient::from_settings(&settings)?);
    let toasts = Arc::new(ToastBoard::new(Duration::from_secs(
        settings.notification_ttl_secs,
    )));

    match args.command {
        Command::Detect { path, drop } => {
            let controller = UploadController::new(
                backend,
                Arc::new(TerminalUploadView),
                Arc::new(RubleFormatter),
            )
            .with_upload_limit(settings.max_upload_bytes);
            detect(&controller, path, drop).await
        }
        Command::Cart { lines, changes } => {
            let controller = QuantitySyncController::new(
                backend,
                Arc::new(TerminalCartView),
                toasts.clone(),
                Arc::new(RubleFormatter),
            );
            let result = replay_cart(&controller, &lines, &changes).await;
            print_toasts(&toasts.active());
            result
        }
    }
}

async fn detect(controller: &UploadController, path: PathBuf, drop: bool) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let media_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");
    let source = if drop {
        SelectionSource::DragAndDrop
    } else {
        SelectionSource::Picker
    };

    controller.mount().await;
    if let Err(err) = controller
        .select(ImageFile::new(name, media_type, bytes), source)
        .await
    {
        bail!("file rejected: {err}");
    }

    match controller.submit().await {
        SubmitOutcome::Succeeded => Ok(()),
        SubmitOutcome::Failed => bail!("classification failed"),
        SubmitOutcome::Skipped | SubmitOutcome::Superseded => Ok(()),
    }
}

async fn replay_cart(
    controller: &QuantitySyncController,
    lines: &[(LineId, u32)],
    changes: &[(LineId, String)],
) -> Result<()> {
    for (line_id, quantity) in lines {
        controller.register_line(*line_id, *quantity).await;
    }

    // All changes start together so later edits to a line queue behind its request.
    let outcomes = join_all(changes.iter().map(|(line_id, raw)| async move {
        let outcome = match raw.as_str() {
            "+" => controller.increment(*line_id).await,
            "-" => controller.decrement(*line_id).await,
            typed => controller.edit(*line_id, typed).await,
        };
        (*line_id, outcome)
    }))
    .await;

    let mut failed = false;
    for (line_id, outcome) in outcomes {
        match outcome? {
            ChangeOutcome::Synced {
                confirmed,
                requests,
            } => info!(line_id = %line_id, confirmed, requests, "storefront: line synced"),
            ChangeOutcome::Failed { message } => {
                info!(line_id = %line_id, "storefront: line failed: {message}");
                failed = true;
            }
            ChangeOutcome::Queued | ChangeOutcome::Unchanged => {}
        }
    }
    if failed {
        bail!("cart update failed");
    }
    Ok(())
}

fn split_pair(raw: &str) -> Result<(LineId, &str), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{raw}'"))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid line id '{id}': {err}"))?;
    Ok((LineId(id), value.trim()))
}

fn parse_line(raw: &str) -> Result<(LineId, u32), String> {
    let (line_id, quantity) = split_pair(raw)?;
    let quantity = quantity
        .parse::<u32>()
        .map_err(|err| format!("invalid quantity '{quantity}': {err}"))?;
    Ok((line_id, quantity))
}

fn parse_change(raw: &str) -> Result<(LineId, String), String> {
    split_pair(raw).map(|(line_id, value)| (line_id, value.to_string()))
}
