//! Per-client interest sets.
//!
//! Context-scoped subscriptions are stored against top-level context ids;
//! callers resolve a context to its top-level traversable before asking.

use std::collections::{HashMap, HashSet};

use bidi_protocol::browsing_context::BrowsingContextId;
use bidi_protocol::event::{EVENT_NAMES, MODULES};

use super::ClientId;
use crate::error::{Error, Result};

/// Expands module names into their events and validates event names.
pub fn expand_event_names(names: &[String]) -> Result<Vec<&'static str>> {
	let mut expanded = Vec::new();
	for name in names {
		if let Some(module) = MODULES.iter().find(|module| **module == name.as_str()) {
			let prefix = format!("{module}.");
			expanded.extend(EVENT_NAMES.iter().copied().filter(|event| event.starts_with(&prefix)));
		} else if let Some(event) = EVENT_NAMES.iter().find(|event| **event == name.as_str()) {
			expanded.push(*event);
		} else {
			return Err(Error::InvalidArgument(format!("Unknown event: {name}")));
		}
	}
	let mut seen = HashSet::new();
	expanded.retain(|event| seen.insert(*event));
	Ok(expanded)
}

#[derive(Debug, Default)]
struct ClientSubscriptions {
	global: HashSet<&'static str>,
	by_context: HashMap<BrowsingContextId, HashSet<&'static str>>,
}

impl ClientSubscriptions {
	fn set_mut(&mut self, context: Option<&str>) -> &mut HashSet<&'static str> {
		match context {
			None => &mut self.global,
			Some(id) => self.by_context.entry(id.to_string()).or_default(),
		}
	}

	fn contains(&self, event: &str, context: Option<&str>) -> bool {
		match context {
			None => self.global.contains(event),
			Some(id) => self.by_context.get(id).is_some_and(|events| events.contains(event)),
		}
	}
}

/// Subscription state for every connected client.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
	clients: HashMap<ClientId, ClientSubscriptions>,
}

impl SubscriptionManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds interest in `events`, globally or for the given top-level contexts.
	pub fn subscribe(&mut self, client: ClientId, events: &[&'static str], contexts: Option<&[BrowsingContextId]>) {
		let subscriptions = self.clients.entry(client).or_default();
		match contexts {
			None => subscriptions.global.extend(events.iter().copied()),
			Some(contexts) => {
				for context in contexts {
					subscriptions.set_mut(Some(context)).extend(events.iter().copied());
				}
			}
		}
	}

	/// Removes interest. Fails without changing anything if any pair was not subscribed.
	pub fn unsubscribe(&mut self, client: ClientId, events: &[&'static str], contexts: Option<&[BrowsingContextId]>) -> Result<()> {
		let scopes: Vec<Option<&str>> = match contexts {
			None => vec![None],
			Some(contexts) => contexts.iter().map(|id| Some(id.as_str())).collect(),
		};

		let subscriptions = self.clients.entry(client).or_default();
		for scope in &scopes {
			for event in events {
				if !subscriptions.contains(event, *scope) {
					return Err(Error::InvalidArgument(match scope {
						None => format!("Cannot unsubscribe from {event}: not subscribed"),
						Some(id) => format!("Cannot unsubscribe from {event} for context {id}: not subscribed"),
					}));
				}
			}
		}

		for scope in scopes {
			let set = subscriptions.set_mut(scope);
			for event in events {
				set.remove(event);
			}
		}
		subscriptions.by_context.retain(|_, events| !events.is_empty());
		Ok(())
	}

	/// True if `client` wants `event` emitted for a context under `top_level`.
	///
	/// Events without a context only reach global subscribers.
	pub fn is_subscribed(&self, client: ClientId, event: &str, top_level: Option<&str>) -> bool {
		let Some(subscriptions) = self.clients.get(&client) else {
			return false;
		};
		subscriptions.global.contains(event) || top_level.is_some_and(|id| subscriptions.contains(event, Some(id)))
	}

	pub fn remove_client(&mut self, client: ClientId) {
		self.clients.remove(&client);
	}

	/// Drops every client's subscriptions scoped to a destroyed top-level context.
	pub fn remove_context(&mut self, top_level: &str) {
		for subscriptions in self.clients.values_mut() {
			subscriptions.by_context.remove(top_level);
		}
	}
}

#[cfg(test)]
mod tests {
	use bidi_protocol::Event;

	use super::*;

	fn names(names: &[&str]) -> Vec<String> {
		names.iter().map(|n| n.to_string()).collect()
	}

	#[test]
	fn test_module_name_expands() {
		let events = expand_event_names(&names(&["browsingContext"])).unwrap();
		assert!(events.contains(&Event::LOAD));
		assert!(events.contains(&Event::CONTEXT_CREATED));
		assert!(!events.contains(&Event::REALM_CREATED));
	}

	#[test]
	fn test_unknown_event_rejected() {
		let err = expand_event_names(&names(&["browsingContext.nope"])).unwrap_err();
		assert!(matches!(err, Error::InvalidArgument(_)));
	}

	#[test]
	fn test_duplicates_collapse() {
		let events = expand_event_names(&names(&["script", Event::REALM_CREATED])).unwrap();
		assert_eq!(events.iter().filter(|e| **e == Event::REALM_CREATED).count(), 1);
	}

	#[test]
	fn test_global_subscription_matches_every_context() {
		let mut manager = SubscriptionManager::new();
		manager.subscribe(1, &[Event::LOAD], None);
		assert!(manager.is_subscribed(1, Event::LOAD, Some("A")));
		assert!(manager.is_subscribed(1, Event::LOAD, Some("B")));
		assert!(manager.is_subscribed(1, Event::LOAD, None));
		assert!(!manager.is_subscribed(1, Event::DOM_CONTENT_LOADED, Some("A")));
		assert!(!manager.is_subscribed(2, Event::LOAD, Some("A")));
	}

	#[test]
	fn test_context_subscription_is_scoped() {
		let mut manager = SubscriptionManager::new();
		manager.subscribe(1, &[Event::LOAD], Some(&["A".to_string()][..]));
		assert!(manager.is_subscribed(1, Event::LOAD, Some("A")));
		assert!(!manager.is_subscribed(1, Event::LOAD, Some("B")));
		assert!(!manager.is_subscribed(1, Event::LOAD, None));
	}

	#[test]
	fn test_unsubscribe_removes_interest() {
		let mut manager = SubscriptionManager::new();
		manager.subscribe(1, &[Event::LOAD, Event::DOM_CONTENT_LOADED], None);
		manager.unsubscribe(1, &[Event::LOAD], None).unwrap();
		assert!(!manager.is_subscribed(1, Event::LOAD, Some("A")));
		assert!(manager.is_subscribed(1, Event::DOM_CONTENT_LOADED, Some("A")));
	}

	#[test]
	fn test_remove_context_keeps_global_and_other_contexts() {
		let mut manager = SubscriptionManager::new();
		let a = ["A".to_string()];
		manager.subscribe(1, &[Event::LOAD], Some(&a[..]));
		manager.subscribe(1, &[Event::LOAD], Some(&["B".to_string()][..]));
		manager.subscribe(2, &[Event::LOAD], Some(&a[..]));
		manager.subscribe(2, &[Event::CONTEXT_CREATED], None);

		manager.remove_context("A");

		assert!(!manager.is_subscribed(1, Event::LOAD, Some("A")));
		assert!(!manager.is_subscribed(2, Event::LOAD, Some("A")));
		assert!(manager.is_subscribed(1, Event::LOAD, Some("B")));
		assert!(manager.is_subscribed(2, Event::CONTEXT_CREATED, Some("A")));
		assert!(manager.unsubscribe(1, &[Event::LOAD], Some(&a[..])).is_err());
	}

	#[test]
	fn test_unsubscribe_unknown_pair_changes_nothing() {
		let mut manager = SubscriptionManager::new();
		manager.subscribe(1, &[Event::LOAD], None);
		let err = manager.unsubscribe(1, &[Event::LOAD, Event::CONTEXT_CREATED], None).unwrap_err();
		assert!(matches!(err, Error::InvalidArgument(_)));
		assert!(manager.is_subscribed(1, Event::LOAD, None));
	}
}
