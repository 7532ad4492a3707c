//! Subscription-filtered event distribution.
//!
//! Each connected client owns an unbounded outbox. [`EventManager::register_event`]
//! appends to every matching outbox while holding the same lock that guards
//! subscription changes, so an event is either fully before or fully after a
//! concurrent `subscribe`/`unsubscribe`. Outboxes are FIFO, which preserves
//! registration order for every client.
//!
//! Command responses travel through the same outbox so they interleave with
//! events in the order they were produced.

mod subscription;

use std::sync::Arc;

use bidi_protocol::browsing_context::BrowsingContextId;
use bidi_protocol::{Event, OutgoingMessage};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub use subscription::{SubscriptionManager, expand_event_names};

use crate::context::ContextRegistry;
use crate::error::Result;

/// Identifies one connected BiDi client.
pub type ClientId = u64;

struct Inner {
	outboxes: IndexMap<ClientId, mpsc::UnboundedSender<OutgoingMessage>>,
	subscriptions: SubscriptionManager,
}

pub struct EventManager {
	contexts: Arc<ContextRegistry>,
	inner: Mutex<Inner>,
}

impl EventManager {
	pub fn new(contexts: Arc<ContextRegistry>) -> Self {
		Self {
			contexts,
			inner: Mutex::new(Inner {
				outboxes: IndexMap::new(),
				subscriptions: SubscriptionManager::new(),
			}),
		}
	}

	/// Registers a client and returns the receiving end of its outbox.
	pub fn add_client(&self, client: ClientId) -> mpsc::UnboundedReceiver<OutgoingMessage> {
		let (tx, rx) = mpsc::unbounded_channel();
		let mut inner = self.inner.lock();
		if inner.outboxes.insert(client, tx).is_some() {
			tracing::warn!(client, "Client reconnected; previous outbox replaced");
		}
		rx
	}

	pub fn remove_client(&self, client: ClientId) {
		let mut inner = self.inner.lock();
		inner.outboxes.shift_remove(&client);
		inner.subscriptions.remove_client(client);
	}

	/// Queues a message for one client. Returns false if the client is gone.
	pub fn send(&self, client: ClientId, message: OutgoingMessage) -> bool {
		let inner = self.inner.lock();
		match inner.outboxes.get(&client) {
			Some(outbox) => outbox.send(message).is_ok(),
			None => {
				tracing::debug!(client, "Dropping message for disconnected client");
				false
			}
		}
	}

	pub fn subscribe(&self, client: ClientId, events: &[String], contexts: Option<&[BrowsingContextId]>) -> Result<()> {
		let events = expand_event_names(events)?;
		let top_levels = self.resolve_top_levels(contexts)?;
		tracing::debug!(client, ?events, contexts = ?top_levels, "Subscribing");
		self.inner
			.lock()
			.subscriptions
			.subscribe(client, &events, top_levels.as_deref());
		Ok(())
	}

	pub fn unsubscribe(&self, client: ClientId, events: &[String], contexts: Option<&[BrowsingContextId]>) -> Result<()> {
		let events = expand_event_names(events)?;
		let top_levels = self.resolve_top_levels(contexts)?;
		tracing::debug!(client, ?events, contexts = ?top_levels, "Unsubscribing");
		self.inner
			.lock()
			.subscriptions
			.unsubscribe(client, &events, top_levels.as_deref())
	}

	fn resolve_top_levels(&self, contexts: Option<&[BrowsingContextId]>) -> Result<Option<Vec<BrowsingContextId>>> {
		let Some(contexts) = contexts else {
			return Ok(None);
		};
		let mut top_levels = Vec::with_capacity(contexts.len());
		for id in contexts {
			self.contexts.get(id)?;
			let top_level = self.contexts.top_level_id(id);
			if !top_levels.contains(&top_level) {
				top_levels.push(top_level);
			}
		}
		Ok(Some(top_levels))
	}

	/// Delivers `event` to every client subscribed to it for `context_id`.
	///
	/// Delivery to a closed outbox is dropped silently. A top-level
	/// `contextDestroyed` also drops the subscriptions scoped to that context.
	pub fn register_event(&self, event: Event, context_id: Option<&str>) {
		let top_level = context_id.map(|id| self.contexts.top_level_id(id));
		let name = event.method();

		let mut inner = self.inner.lock();
		let mut delivered = 0usize;
		for (client, outbox) in &inner.outboxes {
			if inner.subscriptions.is_subscribed(*client, name, top_level.as_deref())
				&& outbox.send(OutgoingMessage::Event(event.clone())).is_ok()
			{
				delivered += 1;
			}
		}
		if let Event::ContextDestroyed(info) = &event {
			if top_level.as_deref() == Some(info.context.as_str()) {
				inner.subscriptions.remove_context(&info.context);
			}
		}
		tracing::trace!(event = name, context = ?context_id, delivered, "Event registered");
	}
}
