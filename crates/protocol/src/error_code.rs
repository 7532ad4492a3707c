//! Error codes carried by BiDi error responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of error codes a BiDi error response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
	#[serde(rename = "invalid argument")]
	InvalidArgument,
	#[serde(rename = "invalid session id")]
	InvalidSessionId,
	#[serde(rename = "move target out of bounds")]
	MoveTargetOutOfBounds,
	#[serde(rename = "no such alert")]
	NoSuchAlert,
	#[serde(rename = "no such element")]
	NoSuchElement,
	#[serde(rename = "no such frame")]
	NoSuchFrame,
	#[serde(rename = "no such handle")]
	NoSuchHandle,
	#[serde(rename = "no such node")]
	NoSuchNode,
	#[serde(rename = "no such script")]
	NoSuchScript,
	#[serde(rename = "session not created")]
	SessionNotCreated,
	#[serde(rename = "unable to capture screen")]
	UnableToCaptureScreen,
	#[serde(rename = "unable to close browser")]
	UnableToCloseBrowser,
	#[serde(rename = "unknown command")]
	UnknownCommand,
	#[serde(rename = "unknown error")]
	UnknownError,
	#[serde(rename = "unsupported operation")]
	UnsupportedOperation,
}

impl ErrorCode {
	/// Returns the wire representation of this code.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::InvalidArgument => "invalid argument",
			Self::InvalidSessionId => "invalid session id",
			Self::MoveTargetOutOfBounds => "move target out of bounds",
			Self::NoSuchAlert => "no such alert",
			Self::NoSuchElement => "no such element",
			Self::NoSuchFrame => "no such frame",
			Self::NoSuchHandle => "no such handle",
			Self::NoSuchNode => "no such node",
			Self::NoSuchScript => "no such script",
			Self::SessionNotCreated => "session not created",
			Self::UnableToCaptureScreen => "unable to capture screen",
			Self::UnableToCloseBrowser => "unable to close browser",
			Self::UnknownCommand => "unknown command",
			Self::UnknownError => "unknown error",
			Self::UnsupportedOperation => "unsupported operation",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
