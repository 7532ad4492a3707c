//! Error types for the mapper core.

use bidi_protocol::ErrorCode;
use thiserror::Error;

/// Result type alias for mapper operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a command handler can fail with.
///
/// Every variant maps onto a BiDi [`ErrorCode`] through [`Error::error_code`];
/// backend failures that were not recognized pass through as [`Error::Cdp`]
/// and surface as `unknown error` with the browser's message.
#[derive(Debug, Error)]
pub enum Error {
	#[error("{0}")]
	InvalidArgument(String),

	#[error("{0}")]
	UnsupportedOperation(String),

	#[error("{0}")]
	UnknownError(String),

	#[error("Context {0} not found")]
	NoSuchFrame(String),

	#[error("Unknown command '{0}'.")]
	UnknownCommand(String),

	#[error("{0}")]
	InvalidSessionId(String),

	/// The context went away while a command was waiting on it.
	#[error("Context {0} was disposed")]
	ContextDisposed(String),

	/// The browser state disagrees with what the mapper tracked.
	#[error("{0}")]
	Internal(String),

	#[error(transparent)]
	Cdp(#[from] bidi_runtime::Error),

	/// Client-side stream failure.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns the protocol error code reported to the client.
	pub fn error_code(&self) -> ErrorCode {
		match self {
			Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
			Error::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
			Error::NoSuchFrame(_) | Error::ContextDisposed(_) => ErrorCode::NoSuchFrame,
			Error::UnknownCommand(_) => ErrorCode::UnknownCommand,
			Error::InvalidSessionId(_) => ErrorCode::InvalidSessionId,
			Error::UnknownError(_) | Error::Internal(_) | Error::Cdp(_) | Error::Io(_) => ErrorCode::UnknownError,
		}
	}
}
