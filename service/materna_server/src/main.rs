use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use axum::http::Method;
use clap::Parser;
use log::{error, info, warn};
use tower_http::cors::{Any, CorsLayer};

use materna_model::ArtifactPair;
use materna_server::{router, AppState, RecordStore};

#[derive(Debug, Parser)]
#[command(
    name = "materna-server",
    version,
    about = "Serve maternal health-risk predictions over HTTP",
    long_about = "Loads the classifier/encoder artifact pair produced by materna-train,\n\
        persists every prediction to SQLite, and exposes POST /predict,\n\
        GET /latest and GET /health.\n\n\
        If the artifacts are missing or fail verification the server still\n\
        starts, but /predict answers with a model-unavailable error until\n\
        the process is restarted with valid artifacts."
)]
struct Cli {
    /// Address to listen on
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8720")]
    addr: SocketAddr,

    /// SQLite database file (created if absent)
    #[arg(long, value_name = "FILE", default_value = "materna.db")]
    db: PathBuf,

    /// Directory holding risk_model.json and label_encoder.json
    #[arg(long, value_name = "DIR", default_value = ".")]
    model_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let artifacts = match ArtifactPair::load(&cli.model_dir, &materna_schema::fingerprint()) {
        Ok(pair) => {
            info!(
                "loaded artifact pair (run {}) with {} classes",
                pair.run_id,
                pair.encoder.len()
            );
            Some(pair)
        }
        Err(e) => {
            warn!("artifact load failed, serving degraded: {e}");
            None
        }
    };

    let store = match RecordStore::open(&cli.db).await {
        Ok(store) => store,
        Err(e) => {
            error!("cannot open record store {}: {e}", cli.db.display());
            return ExitCode::FAILURE;
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = router(AppState::new(artifacts, store)).layer(cors);

    let listener = match tokio::net::TcpListener::bind(cli.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("cannot bind {}: {e}", cli.addr);
            return ExitCode::FAILURE;
        }
    };
    info!("materna-server listening on http://{}", cli.addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
