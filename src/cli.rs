use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::config_loader::VaultConfig;
use crate::log_record::{DeleteMode, RecordDraft};
use crate::vaultweb::build_router;

/// Top-level CLI interface for logvault
#[derive(Parser)]
#[command(
    name = "logvault",
    version = "0.1.0",
    about = "Log record store and navigation service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (log routes and health checks)
    Serve {
        /// Host/IP to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Add a log entry
    Add {
        #[arg(long)]
        notes: String,
        #[arg(long)]
        source: String,
        /// INFO, SUCCESS, ERROR, DEBUG, WARNING, or CRITICAL
        #[arg(long)]
        level: String,
        /// new, onhold, active, blocked, complete, or closed
        #[arg(long)]
        status: String,
        /// Free-form JSON object stored alongside the entry
        #[arg(long)]
        misc: Option<String>,
    },

    /// Update a log entry by uuid
    Update {
        #[arg(long)]
        uuid: Uuid,
        #[arg(long)]
        notes: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        level: String,
        #[arg(long)]
        status: String,
        #[arg(long)]
        misc: Option<String>,
    },

    /// Delete a log entry (soft unless --admin)
    Delete {
        #[arg(long)]
        sequence_id: u64,
        #[arg(long)]
        uuid: Uuid,
        /// Hard-delete; also reaches soft-deleted entries
        #[arg(long)]
        admin: bool,
    },

    /// Show a log entry by uuid
    Show {
        #[arg(long)]
        uuid: Uuid,
        /// Include soft-deleted entries
        #[arg(long)]
        admin: bool,
    },
}

pub fn dispatch(cli: Cli, config: &VaultConfig) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port),
        Commands::Add {
            notes,
            source,
            level,
            status,
            misc,
        } => {
            let state = AppState::build(config)?;
            let draft = RecordDraft {
                notes: Some(notes),
                source: Some(source),
                level: Some(level),
                status: Some(status),
                misc: parse_misc(misc.as_deref())?,
            };
            let (sequence_id, uuid) = state.lifecycle.create(&draft)?;
            println!("created log entry {sequence_id} ({uuid})");
            Ok(())
        }
        Commands::Update {
            uuid,
            notes,
            source,
            level,
            status,
            misc,
        } => {
            let state = AppState::build(config)?;
            let draft = RecordDraft {
                notes: Some(notes),
                source: Some(source),
                level: Some(level),
                status: Some(status),
                misc: parse_misc(misc.as_deref())?,
            };
            state.lifecycle.update(uuid, &draft)?;
            println!("updated log entry {uuid}");
            Ok(())
        }
        Commands::Delete {
            sequence_id,
            uuid,
            admin,
        } => {
            let state = AppState::build(config)?;
            let mode = if admin {
                DeleteMode::Hard
            } else {
                DeleteMode::Soft
            };
            state.lifecycle.delete(sequence_id, uuid, mode)?;
            println!("deleted log entry {sequence_id}");
            Ok(())
        }
        Commands::Show { uuid, admin } => {
            let state = AppState::build(config)?;
            let record = state.lifecycle.fetch(uuid, admin)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    }
}

fn parse_misc(raw: Option<&str>) -> Result<Option<Map<String, Value>>> {
    match raw {
        None => Ok(None),
        Some(text) => {
            let value: Value =
                serde_json::from_str(text).context("misc must be a JSON object")?;
            match value {
                Value::Object(map) => Ok(Some(map)),
                _ => bail!("misc must be a JSON object"),
            }
        }
    }
}

fn serve(config: &VaultConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.api.host.clone());
    let port = port.unwrap_or(config.api.port);
    let addr = format!("{host}:{port}");

    let state = AppState::build(config)?;
    let app = build_router(state);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr.as_str())
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("HTTP server listening on http://{addr}");
        axum::serve(listener, app).await.context("server error")?;
        Ok(())
    })
}
