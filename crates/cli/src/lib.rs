//! `bidi-mapper` binary support: argument parsing, logging, and the serve loop.

pub mod cli;
pub mod connector;
pub mod error;
pub mod logging;
pub mod styles;

use std::sync::Arc;

use bidi_mapper::BidiMapper;
use bidi_runtime::{CdpConnection, WebSocketTransport};
use tokio::io::BufReader;

use crate::cli::Cli;
use crate::error::Result;

/// Connects to the browser and serves BiDi on stdin/stdout until either side closes.
pub async fn serve(cli: Cli) -> Result<()> {
	let url = connector::resolve_endpoint(&cli).await?;
	tracing::info!(url = %url, "Connecting to browser");

	let parts = WebSocketTransport::connect(&url).await?;
	let (connection, cdp_events) = CdpConnection::new(parts);
	let runner = Arc::clone(&connection);
	let connection_task = tokio::spawn(async move {
		if let Err(e) = runner.run().await {
			tracing::error!(error = %e, "CDP connection failed");
		}
	});

	let mapper = BidiMapper::from_connection(cli.mapper_config(), &connection);
	mapper.init().await?;
	tracing::info!("Serving WebDriver BiDi on stdio");

	let result = mapper
		.run(cdp_events, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
		.await;
	connection_task.abort();
	Ok(result?)
}
