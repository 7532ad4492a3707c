//! BiDi mapper runtime: the CDP side of the bridge.
//!
//! This crate provides the low-level infrastructure for talking to a
//! Chromium browser over the Chrome DevTools Protocol:
//!
//! - **Transport**: Bidirectional JSON frames over a WebSocket
//! - **Connection**: Request/response correlation and flattened-session event routing
//! - **Session**: The [`CdpClient`] capability plus typed listener registration
//! - **Events**: Typed decoding of the CDP events the mapper consumes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ bidi-mapper  │  Navigable contexts, realms, BiDi events
//! └──────┬───────┘
//!        │ CdpClient / CdpSession::on
//! ┌──────▼───────┐
//! │ bidi-runtime │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  id correlation, sessionId routing
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket transport
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! # Decoupling via CdpClient
//!
//! The mapper only sees the [`CdpClient`] trait, so tests can drive it with
//! a scripted fake instead of a live browser.

pub mod connection;
pub mod error;
pub mod events;
pub mod handlers;
pub mod message;
pub mod session;
pub mod transport;

pub use connection::{CdpConnection, ConnectionEvent};
pub use error::{Error, Result};
pub use events::CdpEvent;
pub use handlers::{HandlerId, Subscription};
pub use session::{CdpClient, CdpSession, SessionId};
pub use transport::{Transport, TransportParts, TransportReceiver, WebSocketTransport};
