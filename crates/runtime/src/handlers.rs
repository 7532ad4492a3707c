//! CDP event listener registry.
//!
//! Listeners are stored in an [`IndexMap`] for O(1) removal and stable
//! insertion order, so events reach listeners in the order they registered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::events::CdpEvent;

/// Unique identifier for event listeners.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub(crate) fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Synchronous listener invoked on the mapper's control loop.
pub type ListenerFn = Arc<dyn Fn(&CdpEvent) + Send + Sync>;

/// Listener storage shared between a session and its subscriptions.
pub type ListenerMap = Arc<Mutex<IndexMap<HandlerId, ListenerFn>>>;

/// RAII handle that unregisters a listener on drop.
///
/// Holds a weak reference to the listener map, so dropping after the owning
/// session is gone is a no-op.
pub struct Subscription {
	id: HandlerId,
	listeners: Weak<Mutex<IndexMap<HandlerId, ListenerFn>>>,
}

impl Subscription {
	pub(crate) fn from_listener_map(id: HandlerId, listeners: &ListenerMap) -> Self {
		Self {
			id,
			listeners: Arc::downgrade(listeners),
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(map) = self.listeners.upgrade() {
			map.lock().shift_remove(&self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &(self.listeners.strong_count() > 0))
			.finish()
	}
}
