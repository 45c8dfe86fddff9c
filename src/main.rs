use std::path::PathBuf;
use std::time::Duration;

use axum::ServiceExt;
use axum::extract::Request;
use clap::Parser;
use profile_pins::config::{Backend, Cli, Config, default_config_dir, default_config_path};
use profile_pins::handler;
use profile_pins::kv::{KeyValueStore, LibsqlStore, MemoryStore, ObjectStore};
use profile_pins::pins::PinStore;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    // With --config the data directory is the config file's parent,
    // otherwise ~/.profile-pins/ holds both.
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("pins.svc starting");

    let cfg = Config::new(&config_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });

    let token = CancellationToken::new();

    match cfg.app.backend {
        Backend::Memory => {
            tracing::warn!("[kv] using in-memory store, pins are lost on restart");
            run(MemoryStore::new(), &cfg, token).await;
        }
        Backend::Libsql => {
            let store = LibsqlStore::new(&cfg.app, &data_dir).await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to setup database");
                std::process::exit(1);
            });
            run(store, &cfg, token).await;
        }
        Backend::S3 => {
            let Some(storage) = cfg.storage.as_ref() else {
                tracing::error!("backend s3 requires a storage section");
                std::process::exit(1);
            };
            run(ObjectStore::new(storage).await, &cfg, token).await;
        }
    }

    tracing::info!("pins.svc going off, graceful shutdown complete");
}

async fn run<K: KeyValueStore>(store: K, cfg: &Config, token: CancellationToken) {
    let pins = PinStore::with_prefix(store, &cfg.app.key_prefix);
    let app = handler::router(pins, Duration::from_secs(cfg.app.request_timeout_seconds));

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let signal_token = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
        signal_token.cancel();
    });

    tracing::info!("pins.svc running on {}", &address);
    if let Err(err) = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(token.cancelled_owned())
        .await
    {
        tracing::error!(error = %err, "server terminated");
        std::process::exit(1);
    }
}
