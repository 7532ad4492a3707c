//! CDP connection layer.
//!
//! Correlates command responses with pending requests and routes events by
//! their flattened `sessionId`.
//!
//! # Message Flow
//!
//! 1. A [`CdpClient`] calls [`CdpConnection::send_command`] with an optional session id
//! 2. The connection assigns a fresh id and parks a oneshot sender under it
//! 3. The request is queued for the writer task
//! 4. The run loop receives the response and completes the oneshot
//! 5. Events are decoded and forwarded, in arrival order, as [`ConnectionEvent`]s

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::events::CdpEvent;
use crate::message::{EventMessage, Message, Request};
use crate::session::{CdpClient, SessionId};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// An event together with the session it was emitted on.
#[derive(Debug, Clone)]
pub struct ConnectionEvent {
	/// `None` for browser-level events.
	pub session_id: Option<SessionId>,
	pub event: CdpEvent,
}

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<DashMap<u64, oneshot::Sender<Result<Value>>>>;

/// Removes the parked callback when a request future is dropped before completion.
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u64, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if !self.completed && self.callbacks.remove(&self.id).is_some() {
			tracing::debug!(id = self.id, "CancelGuard: removed orphaned callback");
		}
	}
}

/// Future returned by [`CdpConnection::send_command`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Connection to a browser's DevTools endpoint.
pub struct CdpConnection {
	last_id: AtomicU64,
	callbacks: CallbackMap,
	outbound_tx: mpsc::UnboundedSender<Value>,
	event_tx: mpsc::UnboundedSender<ConnectionEvent>,
	/// Taken once by [`run`](Self::run).
	transport_sender: Mutex<Option<Box<dyn Transport>>>,
	transport_receiver: Mutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl CdpConnection {
	/// Creates a connection over the given transport.
	///
	/// Returns the connection and the stream of events it will route once
	/// [`run`](Self::run) is polled.
	pub fn new(parts: TransportParts) -> (Arc<Self>, mpsc::UnboundedReceiver<ConnectionEvent>) {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (event_tx, event_rx) = mpsc::unbounded_channel();

		let connection = Self {
			last_id: AtomicU64::new(1),
			callbacks: Arc::new(DashMap::new()),
			outbound_tx,
			event_tx,
			transport_sender: Mutex::new(Some(sender)),
			transport_receiver: Mutex::new(Some(receiver)),
			message_rx: Mutex::new(Some(message_rx)),
			outbound_rx: Mutex::new(Some(outbound_rx)),
		};
		(Arc::new(connection), event_rx)
	}

	/// Sends a command and awaits the browser's response.
	pub async fn send_command(&self, session_id: Option<&str>, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		tracing::debug!(id, session = ?session_id, method, "Sending CDP command");

		let (tx, rx) = oneshot::channel();
		self.callbacks.insert(id, tx);
		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		let request = Request {
			id,
			method: method.to_string(),
			params,
			session_id: session_id.map(str::to_string),
		};
		let request_value = serde_json::to_value(&request)?;

		if self.outbound_tx.send(request_value).is_err() {
			tracing::error!(id, method, "Failed to queue command: outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Client for browser-level commands (no session id).
	pub fn browser_client(self: &Arc<Self>) -> Arc<dyn CdpClient> {
		Arc::new(ConnectionClient {
			connection: Arc::clone(self),
			session_id: None,
		})
	}

	/// Client bound to one flattened target session.
	pub fn session_client(self: &Arc<Self>, session_id: SessionId) -> Arc<dyn CdpClient> {
		Arc::new(ConnectionClient {
			connection: Arc::clone(self),
			session_id: Some(session_id),
		})
	}

	/// Number of commands awaiting a response.
	pub fn pending_commands(&self) -> usize {
		self.callbacks.len()
	}

	/// Runs the reader, writer, and dispatch loop until the transport closes.
	///
	/// Every command still pending when the loop ends fails with
	/// [`Error::ChannelClosed`].
	pub async fn run(self: &Arc<Self>) -> Result<()> {
		let (Some(mut transport_receiver), Some(mut transport_sender), Some(mut outbound_rx), Some(mut message_rx)) = (
			self.transport_receiver.lock().take(),
			self.transport_sender.lock().take(),
			self.outbound_rx.lock().take(),
			self.message_rx.lock().take(),
		) else {
			return Err(Error::ProtocolError("CdpConnection::run called more than once".to_string()));
		};

		let reader_handle = tokio::spawn(async move {
			if let Err(e) = transport_receiver.run().await {
				tracing::error!(error = %e, "Transport read error");
			}
		});

		let writer_handle = tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = transport_sender.send(message).await {
					tracing::error!(error = %e, "Transport write error");
					break;
				}
			}
		});

		while let Some(message_value) = message_rx.recv().await {
			match serde_json::from_value::<Message>(message_value) {
				Ok(message) => {
					if let Err(e) = self.dispatch(message) {
						tracing::warn!(error = %e, "Error dispatching CDP message");
					}
				}
				Err(e) => tracing::error!(error = %e, "Failed to parse CDP message"),
			}
		}

		tracing::debug!(pending = self.callbacks.len(), "CDP transport closed");
		self.callbacks.clear();
		writer_handle.abort();
		let _ = reader_handle.await;
		Ok(())
	}

	fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let (_, callback) = self
					.callbacks
					.remove(&response.id)
					.ok_or_else(|| Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id)))?;

				let result = match response.error {
					Some(payload) => Err(payload.into()),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};
				let _ = callback.send(result);
				Ok(())
			}
			Message::Event(event) => self.route_event(event),
			Message::Unknown(value) => {
				tracing::debug!(%value, "Unknown CDP message (ignored)");
				Ok(())
			}
		}
	}

	fn route_event(&self, message: EventMessage) -> Result<()> {
		let EventMessage {
			method,
			params,
			session_id,
		} = message;
		let event = CdpEvent::parse(&method, params)?;
		let routed = ConnectionEvent {
			session_id: session_id.map(SessionId::from),
			event,
		};
		if self.event_tx.send(routed).is_err() {
			tracing::trace!(method, "Event consumer gone, dropping event");
		}
		Ok(())
	}
}

/// [`CdpClient`] backed by a shared connection.
struct ConnectionClient {
	connection: Arc<CdpConnection>,
	session_id: Option<SessionId>,
}

impl CdpClient for ConnectionClient {
	fn send_command(&self, method: &str, params: Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
		let method = method.to_string();
		Box::pin(async move {
			self.connection
				.send_command(self.session_id.as_deref(), &method, params)
				.await
		})
	}

	fn session_id(&self) -> Option<&str> {
		self.session_id.as_deref()
	}
}
