//! Serves the files given on the command line under `/<anything>/__localvideo?id=<file name>`.
//!
//! Kept under `demos/` and wired up through `[[example]]` in `Cargo.toml`.
//!
//! ```text
//! cargo run --example serve -- movie.mp4
//! curl -H 'x-client-id: demo' -H 'Range: bytes=0-99' 'http://127.0.0.1:3000/app/__localvideo?id=movie.mp4'
//! ```

use std::path::Path;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use axum_localvideo::control::{self, ControlHandle, ControlReply, Source};
use axum_localvideo::{intercept, ClientId, Config, FileEntry, Interceptor, MemoryPayload, Registry};

const DEMO_CLIENT: &str = "demo";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;
    let registry = Registry::new();

    let (envelopes, receiver) = mpsc::channel(16);
    let control_loop = tokio::spawn(control::run(registry.clone(), receiver));

    let (mailbox, mut inbox) = mpsc::unbounded_channel::<ControlReply>();
    let handle = ControlHandle::new(envelopes, Source { id: ClientId::from(DEMO_CLIENT), mailbox });
    tokio::spawn(async move {
        while let Some(reply) = inbox.recv().await {
            tracing::info!(?reply, "unsolicited control reply");
        }
    });

    for path in std::env::args().skip(1) {
        let payload = MemoryPayload::read_file(&path).await?;
        let file_id = Path::new(&path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        let file = FileEntry::with_fallback_type(payload, &config.default_mime_type);
        let file_id = handle.set_file(file_id, file).await?;
        tracing::info!(
            "serving {path} at http://{}/app/{}?id={file_id} for {}: {DEMO_CLIENT}",
            config.bind,
            config.marker,
            config.client_header,
        );
    }

    let interceptor = Interceptor::from_config(registry.clone(), &config);
    let router = Router::new()
        .route("/", get(|| async { "Hello, World!" }))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
        .layer(middleware::from_fn_with_state(interceptor, intercept));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    handle.close().await?;
    drop(handle);
    control_loop.await?;
    registry.shutdown();
    Ok(())
}
