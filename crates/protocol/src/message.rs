//! Command envelopes and outgoing messages.
//!
//! Every inbound line is a [`Command`]; every outbound line is an
//! [`OutgoingMessage`]: a success response, an error response, or an event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_code::ErrorCode;
use crate::event::Event;

/// Command identifier chosen by the client (`js-uint`).
pub type CommandId = u64;

/// Inbound command envelope with an untyped `params` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
	pub id: CommandId,
	pub method: String,
	pub params: Value,
}

/// Failure to interpret an inbound envelope.
///
/// `id` is set whenever the envelope carried a usable id, so the error
/// response can still be correlated.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandParseError {
	pub id: Option<CommandId>,
	pub code: ErrorCode,
	pub message: String,
}

impl CommandParseError {
	fn invalid(id: Option<CommandId>, message: impl Into<String>) -> Self {
		Self {
			id,
			code: ErrorCode::InvalidArgument,
			message: message.into(),
		}
	}
}

impl Command {
	/// Parses a command from a raw text frame.
	pub fn parse(text: &str) -> Result<Self, CommandParseError> {
		let value: Value = serde_json::from_str(text).map_err(|e| CommandParseError::invalid(None, format!("Cannot parse data as JSON: {e}")))?;
		Self::from_value(value)
	}

	/// Parses a command from an already-decoded JSON value.
	pub fn from_value(value: Value) -> Result<Self, CommandParseError> {
		let Value::Object(mut map) = value else {
			return Err(CommandParseError::invalid(None, "Expected a JSON object"));
		};

		let id = match map.get("id") {
			Some(raw) => raw
				.as_u64()
				.ok_or_else(|| CommandParseError::invalid(None, format!("Expected unsigned integer id but got {raw}")))?,
			None => return Err(CommandParseError::invalid(None, "Command is missing 'id'")),
		};

		let method = match map.remove("method") {
			Some(Value::String(method)) => method,
			Some(other) => return Err(CommandParseError::invalid(Some(id), format!("Expected string method but got {other}"))),
			None => return Err(CommandParseError::invalid(Some(id), "Command is missing 'method'")),
		};

		let params = match map.remove("params") {
			Some(params @ Value::Object(_)) => params,
			Some(other) => return Err(CommandParseError::invalid(Some(id), format!("Expected object params but got {other}"))),
			None => return Err(CommandParseError::invalid(Some(id), "Command is missing 'params'")),
		};

		Ok(Self { id, method, params })
	}
}

/// Result of commands that return nothing (`{}` on the wire).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResult {}

/// A message sent from the mapper to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutgoingMessage {
	Success {
		id: CommandId,
		result: Value,
	},
	Error {
		/// `null` when the command id could not be parsed.
		id: Option<CommandId>,
		error: ErrorCode,
		message: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		stacktrace: Option<String>,
	},
	Event(Event),
}

impl OutgoingMessage {
	pub fn success(id: CommandId, result: Value) -> Self {
		Self::Success { id, result }
	}

	pub fn error(id: Option<CommandId>, error: ErrorCode, message: impl Into<String>) -> Self {
		Self::Error {
			id,
			error,
			message: message.into(),
			stacktrace: None,
		}
	}

	/// Returns the command id this message answers, if any.
	pub fn command_id(&self) -> Option<CommandId> {
		match self {
			Self::Success { id, .. } => Some(*id),
			Self::Error { id, .. } => *id,
			Self::Event(_) => None,
		}
	}
}
