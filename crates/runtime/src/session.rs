//! Backend session capability.
//!
//! [`CdpClient`] is the only thing the mapper needs from the browser: send a
//! command, get a result. [`CdpSession`] pairs a client with a typed listener
//! registry that the connection loop feeds synchronously.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::events::CdpEvent;
use crate::handlers::{ListenerFn, ListenerMap, Subscription, next_handler_id};

/// Flattened CDP session identifier.
pub type SessionId = Arc<str>;

/// Command channel to one CDP session (or to the browser when `session_id` is `None`).
pub trait CdpClient: Send + Sync {
	/// Sends a command and awaits its result.
	///
	/// A command the browser rejects fails with [`Error::Cdp`](crate::Error::Cdp).
	fn send_command(&self, method: &str, params: Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>;

	/// The flattened session this client targets.
	fn session_id(&self) -> Option<&str>;
}

/// A CDP session: command client plus event listeners.
pub struct CdpSession {
	client: Arc<dyn CdpClient>,
	listeners: ListenerMap,
}

impl CdpSession {
	pub fn new(client: Arc<dyn CdpClient>) -> Self {
		Self {
			client,
			listeners: Arc::new(Mutex::new(IndexMap::new())),
		}
	}

	pub fn session_id(&self) -> Option<&str> {
		self.client.session_id()
	}

	pub fn client(&self) -> &Arc<dyn CdpClient> {
		&self.client
	}

	/// Sends a raw command.
	pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
		let params = if params.is_null() { Value::Object(Default::default()) } else { params };
		self.client.send_command(method, params).await
	}

	/// Sends a command and decodes its result.
	pub async fn send<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
		let params_value = serde_json::to_value(params)?;
		let response = self.send_command(method, params_value).await?;
		serde_json::from_value(response).map_err(Into::into)
	}

	/// Sends a command whose result is ignored.
	pub async fn send_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
		let _: Value = self.send(method, params).await?;
		Ok(())
	}

	/// Registers a listener for every event on this session.
	///
	/// Returns a [`Subscription`] that unregisters the listener when dropped.
	pub fn on<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&CdpEvent) + Send + Sync + 'static,
	{
		let id = next_handler_id();
		let listener: ListenerFn = Arc::new(listener);
		self.listeners.lock().insert(id, listener);
		Subscription::from_listener_map(id, &self.listeners)
	}

	/// Delivers an event to every listener, in registration order.
	///
	/// Listeners are snapshotted first, so a listener may register or drop
	/// subscriptions (including its own) while handling the event.
	pub fn emit(&self, event: &CdpEvent) {
		let listeners: Vec<ListenerFn> = self.listeners.lock().values().cloned().collect();
		tracing::trace!(session = ?self.session_id(), method = event.method(), listeners = listeners.len(), "Dispatching CDP event");
		for listener in listeners {
			listener(event);
		}
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}
}

impl std::fmt::Debug for CdpSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CdpSession")
			.field("session_id", &self.session_id())
			.field("listeners", &self.listener_count())
			.finish()
	}
}
