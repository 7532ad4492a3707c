//! Resolves the browser's DevTools WebSocket endpoint.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// `/json/version` response subset.
#[derive(Debug, Deserialize)]
pub struct CdpVersionInfo {
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
	#[serde(rename = "Browser")]
	pub browser: Option<String>,
}

/// Returns `--cdp-url` as given, or discovers it from `--port`.
pub async fn resolve_endpoint(cli: &Cli) -> Result<String> {
	if let Some(url) = &cli.cdp_url {
		return Ok(url.clone());
	}
	let port = cli.port.ok_or(CliError::MissingEndpoint)?;
	let info = fetch_cdp_endpoint(port).await?;
	debug!(port, browser = ?info.browser, url = %info.web_socket_debugger_url, "Discovered CDP endpoint");
	Ok(info.web_socket_debugger_url)
}

/// Queries `/json/version` on `port`, trying each loopback spelling.
pub async fn fetch_cdp_endpoint(port: u16) -> Result<CdpVersionInfo> {
	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(400))
		.build()
		.map_err(|e| CliError::Discovery {
			port,
			reason: format!("failed to create HTTP client: {e}"),
		})?;
	let mut last_error = "no response".to_string();

	for url in [
		format!("http://127.0.0.1:{port}/json/version"),
		format!("http://localhost:{port}/json/version"),
		format!("http://[::1]:{port}/json/version"),
	] {
		let response = match client.get(&url).send().await {
			Ok(response) => response,
			Err(e) => {
				last_error = e.to_string();
				continue;
			}
		};

		if !response.status().is_success() {
			last_error = format!("unexpected status {}", response.status());
			continue;
		}

		return response.json().await.map_err(|e| CliError::Discovery {
			port,
			reason: format!("failed to parse /json/version: {e}"),
		});
	}

	Err(CliError::Discovery { port, reason: last_error })
}
