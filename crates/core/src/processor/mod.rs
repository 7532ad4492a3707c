//! BiDi command dispatch.
//!
//! [`CommandProcessor::dispatch`] parses one inbound frame and runs the
//! command on its own task, so a command waiting on a navigation never
//! blocks the ones behind it. Every command yields exactly one response,
//! queued to the client's outbox behind any events registered before it.

mod browsing_context;
mod script;
mod session;

use std::sync::Arc;

use bidi_protocol::{Command, OutgoingMessage};
use bidi_runtime::CdpSession;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::events::ClientId;
use crate::state::MapperState;

pub struct CommandProcessor {
	shared: Arc<MapperState>,
	browser: Arc<CdpSession>,
}

impl CommandProcessor {
	pub fn new(shared: Arc<MapperState>, browser: Arc<CdpSession>) -> Arc<Self> {
		Arc::new(Self { shared, browser })
	}

	/// Parses `text` and spawns the command. Parse failures are answered inline.
	pub fn dispatch(self: &Arc<Self>, client: ClientId, text: &str) {
		let command = match Command::parse(text) {
			Ok(command) => command,
			Err(e) => {
				tracing::debug!(client, id = ?e.id, error = %e.message, "Rejecting malformed command");
				self.shared
					.events
					.send(client, OutgoingMessage::error(e.id, e.code, e.message));
				return;
			}
		};

		let processor = Arc::clone(self);
		tokio::spawn(async move {
			let response = processor.respond(client, command).await;
			processor.shared.events.send(client, response);
		});
	}

	/// Runs `command` and wraps the outcome as a response.
	pub async fn respond(&self, client: ClientId, command: Command) -> OutgoingMessage {
		let Command { id, method, params } = command;
		tracing::debug!(client, id, method = %method, "Processing command");
		match self.process(client, &method, params).await {
			Ok(result) => OutgoingMessage::success(id, result),
			Err(e) => {
				tracing::debug!(client, id, method = %method, error = %e, "Command failed");
				OutgoingMessage::error(Some(id), e.error_code(), e.to_string())
			}
		}
	}

	pub async fn process(&self, client: ClientId, method: &str, params: Value) -> Result<Value> {
		match method {
			"browsingContext.activate" => to_value(self.activate(parse_params(params)?).await?),
			"browsingContext.captureScreenshot" => to_value(self.capture_screenshot(parse_params(params)?).await?),
			"browsingContext.close" => to_value(self.close(parse_params(params)?).await?),
			"browsingContext.create" => to_value(self.create(parse_params(params)?).await?),
			"browsingContext.getTree" => to_value(self.get_tree(parse_params(params)?)?),
			"browsingContext.handleUserPrompt" => to_value(self.handle_user_prompt(parse_params(params)?).await?),
			"browsingContext.navigate" => to_value(self.navigate(parse_params(params)?).await?),
			"browsingContext.print" => to_value(self.print(parse_params(params)?).await?),
			"browsingContext.reload" => to_value(self.reload(parse_params(params)?).await?),
			"browsingContext.setViewport" => to_value(self.set_viewport(parse_params(params)?).await?),
			"browser.close" => to_value(self.close_browser().await?),
			"script.getRealms" => to_value(self.get_realms(parse_params(params)?)?),
			"session.status" => to_value(self.status()),
			"session.subscribe" => to_value(self.subscribe(client, parse_params(params)?)?),
			"session.unsubscribe" => to_value(self.unsubscribe(client, parse_params(params)?)?),
			_ => Err(Error::UnknownCommand(method.to_string())),
		}
	}
}

fn parse_params<P: DeserializeOwned>(params: Value) -> Result<P> {
	serde_json::from_value(params).map_err(|e| Error::InvalidArgument(e.to_string()))
}

fn to_value<R: Serialize>(result: R) -> Result<Value> {
	serde_json::to_value(result).map_err(|e| Error::Internal(format!("Failed to serialize result: {e}")))
}

#[cfg(test)]
mod tests {
	use bidi_protocol::browsing_context::{NavigateParameters, ReadinessState};
	use serde_json::json;

	use super::*;

	#[test]
	fn test_bad_params_are_invalid_argument() {
		let err = parse_params::<NavigateParameters>(json!({"context": "A"})).unwrap_err();
		assert!(matches!(err, Error::InvalidArgument(_)));

		let err = parse_params::<NavigateParameters>(json!({"context": 1, "url": "about:blank"})).unwrap_err();
		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn test_wait_values_parse() {
		let params: NavigateParameters =
			parse_params(json!({"context": "A", "url": "about:blank", "wait": "complete"})).unwrap();
		assert_eq!(params.wait, ReadinessState::Complete);
		assert!(parse_params::<NavigateParameters>(json!({"context": "A", "url": "x", "wait": "eventually"})).is_err());
	}
}
