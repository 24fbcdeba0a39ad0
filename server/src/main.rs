use anyhow::Result;
use axum::Router;
use clap::Parser;
use docsearch_core::config::EngineConfig;
use docsearch_core::persist::{open_store, StoreFormat};
use docsearch_core::SearchEngine;
use docsearch_server::{build_app, AppOptions};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Document collection file
    #[arg(long, default_value = "./data/documents.json")]
    data: String,
    /// Store format: json or bincode
    #[arg(long, default_value = "json")]
    store_format: String,
    /// Engine config (JSON); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = EngineConfig::load_or_default(args.config.as_deref())?;
    let format: StoreFormat = args.store_format.parse()?;
    let store = open_store(&args.data, format);
    let engine = Arc::new(SearchEngine::open(config, store));
    tracing::info!(data = %args.data, num_docs = engine.len(), "engine ready");

    let app: Router = build_app(engine, AppOptions::from_env());
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
