//! WebSocket transport to the browser's DevTools endpoint.
//!
//! The transport is split into a sending half ([`Transport`]) and a reading
//! half ([`TransportReceiver`]) so the connection can drive them from
//! separate tasks. Decoded frames are forwarded as raw JSON over an unbounded
//! channel; correlation happens one layer up.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, connect_async};

use crate::error::{Error, Result};

/// Sending half of a transport.
pub trait Transport: Send {
	/// Writes one JSON message as a single frame.
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Reading half of a transport.
pub trait TransportReceiver: Send {
	/// Reads frames until the peer closes the socket or the consumer goes away.
	fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Both halves of a transport plus the channel the reader feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// CDP over WebSocket text frames.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Connects to a `ws://` or `wss://` DevTools endpoint.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		tracing::debug!(url, "Connecting to CDP endpoint");
		let (stream, response) = connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		tracing::debug!(status = %response.status(), "CDP WebSocket handshake complete");
		Ok(Self::from_stream(stream))
	}

	/// Wraps an already-established WebSocket stream.
	pub fn from_stream<S>(stream: WebSocketStream<S>) -> TransportParts
	where
		S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
	{
		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		TransportParts {
			sender: Box::new(WebSocketSender { sink }),
			receiver: Box::new(WebSocketReceiver { stream, message_tx }),
			message_rx,
		}
	}
}

struct WebSocketSender<S> {
	sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

impl<S> Transport for WebSocketSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			self.sink
				.send(WsMessage::Text(text))
				.await
				.map_err(|e| Error::TransportError(format!("Failed to write frame: {e}")))
		})
	}
}

struct WebSocketReceiver<S> {
	stream: SplitStream<WebSocketStream<S>>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<S> WebSocketReceiver<S> {
	/// Returns false once nobody is listening anymore.
	fn forward(&self, bytes: &[u8]) -> bool {
		match serde_json::from_slice::<Value>(bytes) {
			Ok(value) => self.message_tx.send(value).is_ok(),
			Err(e) => {
				tracing::warn!(error = %e, "Dropping non-JSON frame from browser");
				true
			}
		}
	}
}

impl<S> TransportReceiver for WebSocketReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			while let Some(frame) = self.stream.next().await {
				let frame = frame.map_err(|e| Error::TransportError(format!("Failed to read frame: {e}")))?;
				let keep_going = match frame {
					WsMessage::Text(text) => self.forward(text.as_bytes()),
					WsMessage::Binary(bytes) => self.forward(&bytes),
					WsMessage::Close(reason) => {
						tracing::debug!(?reason, "Browser closed the CDP socket");
						return Ok(());
					}
					_ => true,
				};
				if !keep_going {
					tracing::debug!("Message consumer gone, stopping transport reader");
					return Ok(());
				}
			}
			Ok(())
		})
	}
}

#[cfg(test)]
mod tests;
