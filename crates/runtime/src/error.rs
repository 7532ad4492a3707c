//! Error types for the CDP runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the browser.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish the WebSocket connection.
	#[error("Failed to connect to browser: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (socket read/write).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Malformed or unexpected CDP message.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// The browser rejected a command.
	#[error("{message}")]
	Cdp {
		/// CDP error code (JSON-RPC style, e.g. `-32000`).
		code: i64,
		/// Human-readable error message from the browser.
		message: String,
		/// Optional extra detail supplied by the browser.
		data: Option<String>,
	},

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Connection closed while a command was in flight.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Timeout waiting for operation.
	#[error("Timeout: {0}")]
	Timeout(String),
}

impl Error {
	/// Returns the browser's message if this is a rejected command.
	pub fn cdp_message(&self) -> Option<&str> {
		match self {
			Error::Cdp { message, .. } => Some(message),
			_ => None,
		}
	}

	/// Returns true if the connection went away.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed | Error::TransportError(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cdp_error_displays_message_only() {
		let err = Error::Cdp {
			code: -32000,
			message: "No target with given id found".to_string(),
			data: None,
		};
		assert_eq!(err.to_string(), "No target with given id found");
		assert_eq!(err.cdp_message(), Some("No target with given id found"));
		assert!(!err.is_closed());
	}

	#[test]
	fn test_closed_errors() {
		assert!(Error::ChannelClosed.is_closed());
		assert!(Error::TransportError("reset".into()).is_closed());
		assert!(Error::Timeout("x".into()).cdp_message().is_none());
	}
}
