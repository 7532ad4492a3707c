//! Realm registry.
//!
//! Realms are keyed by their unique id and queried through [`RealmFilter`].
//! Adding and deleting realms registers `script.realmCreated` and
//! `script.realmDestroyed` with the [`EventManager`].

use std::sync::Arc;
use std::time::Duration;

use bidi_protocol::Event;
use bidi_protocol::browsing_context::BrowsingContextId;
use bidi_protocol::script::{RealmDestroyedParameters, RealmId, RealmType};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::realm::Realm;
use crate::error::{Error, Result};
use crate::events::EventManager;

/// Criteria for realm lookups. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealmFilter {
	pub realm_id: Option<RealmId>,
	pub context_id: Option<BrowsingContextId>,
	/// `Some(None)` matches only main-world realms.
	pub sandbox: Option<Option<String>>,
	pub cdp_session_id: Option<String>,
	pub execution_context_id: Option<i64>,
	pub realm_type: Option<RealmType>,
}

impl RealmFilter {
	pub fn for_context(context_id: impl Into<BrowsingContextId>) -> Self {
		Self {
			context_id: Some(context_id.into()),
			..Self::default()
		}
	}

	pub fn for_realm(realm_id: impl Into<RealmId>) -> Self {
		Self {
			realm_id: Some(realm_id.into()),
			..Self::default()
		}
	}

	pub fn with_sandbox(mut self, sandbox: Option<&str>) -> Self {
		self.sandbox = Some(sandbox.map(str::to_string));
		self
	}

	pub fn with_session(mut self, session_id: &str) -> Self {
		self.cdp_session_id = Some(session_id.to_string());
		self
	}

	pub fn with_execution_context(mut self, execution_context_id: i64) -> Self {
		self.execution_context_id = Some(execution_context_id);
		self
	}

	pub fn with_type(mut self, realm_type: Option<RealmType>) -> Self {
		self.realm_type = realm_type;
		self
	}

	pub fn matches(&self, realm: &Realm) -> bool {
		self.realm_id.as_deref().is_none_or(|id| id == realm.realm_id())
			&& self.context_id.as_deref().is_none_or(|id| id == realm.context_id())
			&& self.sandbox.as_ref().is_none_or(|sandbox| sandbox.as_deref() == realm.sandbox())
			&& self
				.cdp_session_id
				.as_deref()
				.is_none_or(|id| id == &**realm.cdp_session_id())
			&& self
				.execution_context_id
				.is_none_or(|id| id == realm.execution_context_id())
			&& self.realm_type.is_none_or(|kind| kind == realm.realm_type())
	}
}

/// Every live realm, across all contexts and sessions.
pub struct RealmRegistry {
	realms: Mutex<IndexMap<RealmId, Arc<Realm>>>,
	added: Notify,
	events: Arc<EventManager>,
}

impl RealmRegistry {
	pub fn new(events: Arc<EventManager>) -> Self {
		Self {
			realms: Mutex::new(IndexMap::new()),
			added: Notify::new(),
			events,
		}
	}

	pub fn add(&self, realm: Arc<Realm>) {
		tracing::debug!(
			realm = realm.realm_id(),
			context = realm.context_id(),
			sandbox = ?realm.sandbox(),
			"Realm created"
		);
		let replaced = self
			.realms
			.lock()
			.insert(realm.realm_id().to_string(), Arc::clone(&realm));
		if replaced.is_some() {
			tracing::warn!(realm = realm.realm_id(), "Realm id reused; replacing previous entry");
		}
		self.added.notify_waiters();
		self.events
			.register_event(Event::RealmCreated(realm.info()), Some(realm.context_id()));
	}

	pub fn find_realms(&self, filter: &RealmFilter) -> Vec<Arc<Realm>> {
		self.realms
			.lock()
			.values()
			.filter(|realm| filter.matches(realm))
			.cloned()
			.collect()
	}

	pub fn find_realm(&self, filter: &RealmFilter) -> Option<Arc<Realm>> {
		self.realms
			.lock()
			.values()
			.find(|realm| filter.matches(realm))
			.cloned()
	}

	/// Like [`find_realm`](Self::find_realm) but a miss is an error.
	pub fn get_realm(&self, filter: &RealmFilter) -> Result<Arc<Realm>> {
		self.find_realm(filter)
			.ok_or_else(|| Error::NoSuchFrame(format!("realm matching {filter:?}")))
	}

	/// Waits up to `timeout` for a realm matching `filter` to be added.
	pub async fn wait_for_realm(&self, filter: &RealmFilter, timeout: Duration) -> Option<Arc<Realm>> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			let added = self.added.notified();
			if let Some(realm) = self.find_realm(filter) {
				return Some(realm);
			}
			if tokio::time::timeout_at(deadline, added).await.is_err() {
				return None;
			}
		}
	}

	/// Removes every matching realm and returns how many were removed.
	pub fn delete_realms(&self, filter: &RealmFilter) -> usize {
		let removed: Vec<Arc<Realm>> = {
			let mut realms = self.realms.lock();
			let ids: Vec<RealmId> = realms
				.values()
				.filter(|realm| filter.matches(realm))
				.map(|realm| realm.realm_id().to_string())
				.collect();
			ids.iter().filter_map(|id| realms.shift_remove(id)).collect()
		};

		for realm in &removed {
			tracing::debug!(realm = realm.realm_id(), context = realm.context_id(), "Realm destroyed");
			self.events.register_event(
				Event::RealmDestroyed(RealmDestroyedParameters {
					realm: realm.realm_id().to_string(),
				}),
				Some(realm.context_id()),
			);
		}
		removed.len()
	}

	pub fn len(&self) -> usize {
		self.realms.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.realms.lock().is_empty()
	}
}
