use std::net::SocketAddr;
use std::sync::Arc;

use subgen::{Pipeline, PipelineConfig};

mod server;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subgen=info".parse().unwrap())
                .add_directive("subgen_server=info".parse().unwrap()),
        )
        .init();

    let config = PipelineConfig::new()
        .uploads_dir(env_or("SUBGEN_UPLOADS_DIR", "uploads"))
        .downloads_dir(env_or("SUBGEN_DOWNLOADS_DIR", "downloads"));

    let pipeline = match Pipeline::new(config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Failed to initialize pipeline: {e}");
            std::process::exit(1);
        }
    };

    let app = server::build_app(server::AppState { pipeline });

    let bind = env_or("SUBGEN_BIND", "0.0.0.0:8000");
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid SUBGEN_BIND address {bind:?}: {e}");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "listening");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
