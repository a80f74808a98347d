use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use orderiq_config::OrderIqConfig;
use orderiq_export::{ArtifactStore, XlsxSink};
use orderiq_gateway::{start_server, GatewayLimits, GatewayState};
use orderiq_providers::build_pipeline;

/// Build the pipeline, sink and download index from config and serve.
pub async fn run(config: OrderIqConfig, port: Option<u16>, bind: Option<String>) -> Result<()> {
    let port = port.unwrap_or_else(|| config.port());
    let bind = bind.unwrap_or_else(|| config.bind_address());
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {bind}:{port}"))?;

    let pipeline = build_pipeline(&config)?;
    let sink = XlsxSink::new(config.output_dir(), pipeline.schema().clone())
        .with_file_prefix(config.file_prefix());

    info!(
        addr = %addr,
        backend = %pipeline.backend_name(),
        output_dir = %config.output_dir().display(),
        "Starting OrderIQ"
    );

    let state = GatewayState::new(
        Arc::new(pipeline),
        Arc::new(sink),
        ArtifactStore::new(config.max_artifacts()),
    )
    .with_limits(GatewayLimits {
        cors_origins: config.cors_origins(),
        max_upload_bytes: config.max_upload_bytes(),
    });

    start_server(addr, state).await
}
