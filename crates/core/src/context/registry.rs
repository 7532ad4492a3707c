//! Navigable-context registry.
//!
//! Owns every [`NavigableContext`] by id. Parent links are ids resolved
//! through here. [`ContextRegistry::wait_for`] registers its waiter before
//! checking, so an `add` racing the check is never missed.

use std::sync::Arc;
use std::time::Duration;

use bidi_protocol::browsing_context::{BrowsingContextId, Info};
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::navigable::NavigableContext;
use crate::error::{Error, Result};

pub struct ContextRegistry {
	contexts: Mutex<IndexMap<BrowsingContextId, Arc<NavigableContext>>>,
	waiters: DashMap<BrowsingContextId, Arc<Notify>>,
}

impl Default for ContextRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl ContextRegistry {
	pub fn new() -> Self {
		Self {
			contexts: Mutex::new(IndexMap::new()),
			waiters: DashMap::new(),
		}
	}

	/// Registers a context and wakes anyone waiting for its id.
	pub fn add(&self, context: Arc<NavigableContext>) {
		let id = context.id().to_string();
		self.contexts.lock().insert(id.clone(), context);
		if let Some((_, notify)) = self.waiters.remove(&id) {
			notify.notify_waiters();
		}
	}

	pub fn get(&self, id: &str) -> Result<Arc<NavigableContext>> {
		self.find(id).ok_or_else(|| Error::NoSuchFrame(id.to_string()))
	}

	pub fn find(&self, id: &str) -> Option<Arc<NavigableContext>> {
		self.contexts.lock().get(id).cloned()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.contexts.lock().contains_key(id)
	}

	/// Removes the node only; use [`NavigableContext::dispose`] for a cascade.
	pub fn delete(&self, id: &str) -> Option<Arc<NavigableContext>> {
		self.contexts.lock().shift_remove(id)
	}

	pub fn top_level_contexts(&self) -> Vec<Arc<NavigableContext>> {
		self.contexts
			.lock()
			.values()
			.filter(|context| context.is_top_level())
			.cloned()
			.collect()
	}

	pub fn len(&self) -> usize {
		self.contexts.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.contexts.lock().is_empty()
	}

	/// Follows parent links up to the top-level traversable.
	///
	/// Unknown ids resolve to themselves.
	pub fn top_level_id(&self, id: &str) -> BrowsingContextId {
		let contexts = self.contexts.lock();
		let mut current = id;
		while let Some(parent) = contexts.get(current).and_then(|context| context.parent_id()) {
			if !contexts.contains_key(parent) {
				return parent.to_string();
			}
			current = parent;
		}
		current.to_string()
	}

	/// Snapshot of the tree, from `root` or from every top-level context.
	///
	/// `max_depth` of `Some(0)` omits children; `None` recurses fully.
	pub fn get_tree(&self, root: Option<&str>, max_depth: Option<u64>) -> Result<Vec<Info>> {
		let roots = match root {
			Some(id) => vec![self.get(id)?],
			None => self.top_level_contexts(),
		};
		Ok(roots
			.iter()
			.map(|context| self.serialize(context, max_depth, true))
			.collect())
	}

	/// Serializes one node. Only the outermost node carries `parent`.
	pub fn serialize(&self, context: &NavigableContext, max_depth: Option<u64>, include_parent: bool) -> Info {
		let children = match max_depth {
			Some(0) => None,
			depth => Some(
				context
					.children()
					.iter()
					.filter_map(|id| self.find(id))
					.map(|child| self.serialize(&child, depth.map(|d| d - 1), false))
					.collect(),
			),
		};
		Info {
			context: context.id().to_string(),
			url: context.url(),
			children,
			parent: include_parent.then(|| context.parent_id().map(str::to_string)),
		}
	}

	/// Waits up to `timeout` for `id` to be registered.
	pub async fn wait_for(&self, id: &str, timeout: Duration) -> Result<Arc<NavigableContext>> {
		let deadline = tokio::time::Instant::now() + timeout;

		loop {
			let notify = self
				.waiters
				.entry(id.to_string())
				.or_insert_with(|| Arc::new(Notify::new()))
				.clone();
			let notified = notify.notified();

			if let Some(context) = self.find(id) {
				return Ok(context);
			}

			let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
			if remaining.is_zero() {
				self.waiters.remove(id);
				return Err(Error::UnknownError(format!("Timed out waiting for context {id}")));
			}

			tokio::select! {
				biased;
				_ = notified => {}
				_ = tokio::time::sleep(remaining) => {
					self.waiters.remove(id);
					return Err(Error::UnknownError(format!("Timed out waiting for context {id}")));
				}
			}
		}
	}
}
