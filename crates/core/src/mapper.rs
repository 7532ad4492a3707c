//! The mapper loop.
//!
//! [`BidiMapper::run`] multiplexes three streams on one task: CDP events
//! from the connection, newline-delimited BiDi commands from the client,
//! and the client's outbox. CDP events are handled synchronously in arrival
//! order; commands run on spawned tasks and answer through the outbox.

use std::sync::Arc;

use bidi_protocol::OutgoingMessage;
use bidi_runtime::{CdpClient, CdpConnection, CdpSession, ConnectionEvent};
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::config::MapperConfig;
use crate::error::{Error, Result};
use crate::events::ClientId;
use crate::processor::CommandProcessor;
use crate::state::MapperState;
use crate::targets::{ClientFactory, TargetManager};

/// Client id used for the single stdio client.
pub const STDIO_CLIENT: ClientId = 1;

pub struct BidiMapper {
	shared: Arc<MapperState>,
	targets: TargetManager,
	processor: Arc<CommandProcessor>,
}

impl BidiMapper {
	pub fn new(config: MapperConfig, browser_client: Arc<dyn CdpClient>, client_factory: ClientFactory) -> Self {
		let shared = MapperState::new(config);
		let browser = Arc::new(CdpSession::new(browser_client));
		let processor = CommandProcessor::new(Arc::clone(&shared), Arc::clone(&browser));
		let targets = TargetManager::new(Arc::clone(&shared), browser, client_factory);
		Self {
			shared,
			targets,
			processor,
		}
	}

	/// Wires the mapper to a live CDP connection.
	pub fn from_connection(config: MapperConfig, connection: &Arc<CdpConnection>) -> Self {
		let sessions = Arc::clone(connection);
		Self::new(
			config,
			connection.browser_client(),
			Arc::new(move |session_id| sessions.session_client(session_id)),
		)
	}

	pub fn state(&self) -> &Arc<MapperState> {
		&self.shared
	}

	pub fn targets(&self) -> &TargetManager {
		&self.targets
	}

	pub fn processor(&self) -> &Arc<CommandProcessor> {
		&self.processor
	}

	/// Starts target discovery; existing and future pages attach paused.
	pub async fn init(&self) -> Result<()> {
		let browser = self.targets.browser_session();
		browser
			.send_no_result("Target.setDiscoverTargets", json!({"discover": true}))
			.await?;
		browser
			.send_no_result(
				"Target.setAutoAttach",
				json!({"autoAttach": true, "waitForDebuggerOnStart": true, "flatten": true}),
			)
			.await?;
		tracing::info!("Target discovery enabled");
		Ok(())
	}

	pub fn handle_cdp_event(&self, event: ConnectionEvent) {
		self.targets.handle_event(event.session_id.as_deref(), &event.event);
	}

	pub fn connect_client(&self, client: ClientId) -> mpsc::UnboundedReceiver<OutgoingMessage> {
		tracing::debug!(client, "Client connected");
		self.shared.events.add_client(client)
	}

	pub fn disconnect_client(&self, client: ClientId) {
		tracing::debug!(client, "Client disconnected");
		self.shared.events.remove_client(client);
	}

	pub fn handle_command_text(&self, client: ClientId, text: &str) {
		self.processor.dispatch(client, text);
	}

	/// Serves one client over newline-delimited JSON until either side closes.
	pub async fn run<R, W>(
		&self,
		mut cdp_events: mpsc::UnboundedReceiver<ConnectionEvent>,
		input: R,
		mut output: W,
	) -> Result<()>
	where
		R: AsyncBufRead + Unpin,
		W: AsyncWrite + Unpin,
	{
		let mut outbox = self.connect_client(STDIO_CLIENT);
		let mut lines = input.lines();

		loop {
			tokio::select! {
				biased;
				event = cdp_events.recv() => match event {
					Some(event) => self.handle_cdp_event(event),
					None => {
						tracing::info!("CDP connection closed");
						break;
					}
				},
				message = outbox.recv() => match message {
					Some(message) => write_message(&mut output, &message).await?,
					None => break,
				},
				line = lines.next_line() => match line? {
					Some(line) => {
						let line = line.trim();
						if !line.is_empty() {
							self.handle_command_text(STDIO_CLIENT, line);
						}
					}
					None => {
						tracing::info!("Client input closed");
						break;
					}
				},
			}
		}

		self.disconnect_client(STDIO_CLIENT);
		while let Ok(message) = outbox.try_recv() {
			write_message(&mut output, &message).await?;
		}
		output.flush().await?;
		Ok(())
	}
}

async fn write_message<W: AsyncWrite + Unpin>(output: &mut W, message: &OutgoingMessage) -> Result<()> {
	let mut line = serde_json::to_string(message).map_err(|e| Error::Internal(format!("Failed to encode message: {e}")))?;
	line.push('\n');
	output.write_all(line.as_bytes()).await?;
	output.flush().await?;
	Ok(())
}
