//! Scouts game server binary.

use anyhow::Context;
use clap::Parser;
use scouts_server::api::{self, AppState};
use scouts_server::gameserver::GameManager;
use scouts_server::session::{CachedSessionStore, FsSessionStore, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "scouts-server")]
#[command(about = "Multiplayer server for the Scouts board game")]
struct Args {
    /// HTTP address to listen on.
    #[arg(long = "http", env = "SCOUTS_HTTP", default_value = "localhost:8080")]
    http: String,

    /// State directory for persisted sessions.
    #[arg(long = "state", env = "SCOUTS_STATE", default_value = "/tmp/scouts-server")]
    state: PathBuf,

    /// Enable debug logging.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let directive = if args.verbose {
        "scouts_server=debug"
    } else {
        "scouts_server=info"
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let backing = FsSessionStore::open(&args.state)
        .await
        .context("failed to open session storage")?;
    let sessions: Arc<dyn SessionStore> =
        Arc::new(CachedSessionStore::new(Arc::new(backing)));

    let games = Arc::new(GameManager::new());
    let gc = games.begin_gc();

    let state = Arc::new(AppState {
        games,
        sessions,
    });
    let router = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.http)
        .await
        .with_context(|| format!("failed to listen on {}", args.http))?;
    tracing::info!(addr = %args.http, state_dir = %args.state.display(), "scouts server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("server error")?;

    gc.cancel();
    Ok(())
}
