//! Wire types for the WebDriver BiDi protocol.
//!
//! This crate contains the serde-serializable types exchanged with BiDi
//! clients: command envelopes, responses, events, and the per-module
//! parameter and result shapes. These types represent the "protocol layer",
//! the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization
//! - **1:1 with protocol**: Field names and optionality follow the BiDi CDDL
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Behavior (context tracking, CDP translation) lives in `bidi-mapper`.

pub mod browsing_context;
pub mod error_code;
pub mod event;
pub mod message;
pub mod script;
pub mod session;

pub use error_code::ErrorCode;
pub use event::Event;
pub use message::{Command, CommandId, CommandParseError, EmptyResult, OutgoingMessage};
