//! Tally server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API under `/api`.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use tally_api::{AppState, api_router};
use tally_store_sqlite::SqliteStore;
use tally_voice::{LlmClient, Transcriber, VoiceService};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Tally personal finance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  if cfg.llm.url.is_none() || cfg.llm.api_key.is_none() {
    tracing::warn!("llm.url or llm.api_key is unset; voice commands and insights will fail");
  }
  if cfg.transcription.url.is_none() || cfg.transcription.api_key.is_none() {
    tracing::warn!("transcription is not configured; audio uploads will fail");
  }

  let llm = LlmClient::new(cfg.llm.clone()).context("failed to build LLM client")?;
  let transcriber =
    Transcriber::new(cfg.transcription.clone()).context("failed to build transcription client")?;

  let state = AppState {
    voice:          VoiceService::new(
      Arc::clone(&store),
      llm,
      transcriber,
      cfg.default_monthly_income,
    ),
    store,
    default_income: cfg.default_monthly_income,
  };

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
