//! BiDi events emitted by the mapper.

use serde::{Deserialize, Serialize};

use crate::browsing_context::{Info, NavigationInfo, UserPromptClosedParameters, UserPromptOpenedParameters};
use crate::script::{RealmDestroyedParameters, RealmInfo};

/// An event payload tagged with its method name.
///
/// Serializes as `{"method": "...", "params": {...}}`; the `type: "event"`
/// discriminator is added by [`OutgoingMessage`](crate::OutgoingMessage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Event {
	#[serde(rename = "browsingContext.contextCreated")]
	ContextCreated(Info),
	#[serde(rename = "browsingContext.contextDestroyed")]
	ContextDestroyed(Info),
	#[serde(rename = "browsingContext.navigationStarted")]
	NavigationStarted(NavigationInfo),
	#[serde(rename = "browsingContext.fragmentNavigated")]
	FragmentNavigated(NavigationInfo),
	#[serde(rename = "browsingContext.domContentLoaded")]
	DomContentLoaded(NavigationInfo),
	#[serde(rename = "browsingContext.load")]
	Load(NavigationInfo),
	#[serde(rename = "browsingContext.userPromptOpened")]
	UserPromptOpened(UserPromptOpenedParameters),
	#[serde(rename = "browsingContext.userPromptClosed")]
	UserPromptClosed(UserPromptClosedParameters),
	#[serde(rename = "script.realmCreated")]
	RealmCreated(RealmInfo),
	#[serde(rename = "script.realmDestroyed")]
	RealmDestroyed(RealmDestroyedParameters),
}

impl Event {
	pub const CONTEXT_CREATED: &'static str = "browsingContext.contextCreated";
	pub const CONTEXT_DESTROYED: &'static str = "browsingContext.contextDestroyed";
	pub const NAVIGATION_STARTED: &'static str = "browsingContext.navigationStarted";
	pub const FRAGMENT_NAVIGATED: &'static str = "browsingContext.fragmentNavigated";
	pub const DOM_CONTENT_LOADED: &'static str = "browsingContext.domContentLoaded";
	pub const LOAD: &'static str = "browsingContext.load";
	pub const USER_PROMPT_OPENED: &'static str = "browsingContext.userPromptOpened";
	pub const USER_PROMPT_CLOSED: &'static str = "browsingContext.userPromptClosed";
	pub const REALM_CREATED: &'static str = "script.realmCreated";
	pub const REALM_DESTROYED: &'static str = "script.realmDestroyed";

	/// Returns the wire method name of this event.
	pub fn method(&self) -> &'static str {
		match self {
			Self::ContextCreated(_) => Self::CONTEXT_CREATED,
			Self::ContextDestroyed(_) => Self::CONTEXT_DESTROYED,
			Self::NavigationStarted(_) => Self::NAVIGATION_STARTED,
			Self::FragmentNavigated(_) => Self::FRAGMENT_NAVIGATED,
			Self::DomContentLoaded(_) => Self::DOM_CONTENT_LOADED,
			Self::Load(_) => Self::LOAD,
			Self::UserPromptOpened(_) => Self::USER_PROMPT_OPENED,
			Self::UserPromptClosed(_) => Self::USER_PROMPT_CLOSED,
			Self::RealmCreated(_) => Self::REALM_CREATED,
			Self::RealmDestroyed(_) => Self::REALM_DESTROYED,
		}
	}
}

/// Module names a client may subscribe to as a whole.
pub const MODULES: &[&str] = &["browsingContext", "log", "network", "script"];

/// Every event name defined by the protocol revision this crate follows.
///
/// Subscriptions are validated against this list; the mapper emits only a
/// subset of them.
pub const EVENT_NAMES: &[&str] = &[
	Event::CONTEXT_CREATED,
	Event::CONTEXT_DESTROYED,
	Event::NAVIGATION_STARTED,
	Event::FRAGMENT_NAVIGATED,
	Event::DOM_CONTENT_LOADED,
	Event::LOAD,
	"browsingContext.downloadWillBegin",
	"browsingContext.navigationAborted",
	"browsingContext.navigationFailed",
	Event::USER_PROMPT_OPENED,
	Event::USER_PROMPT_CLOSED,
	"log.entryAdded",
	"network.beforeRequestSent",
	"network.fetchError",
	"network.responseStarted",
	"network.responseCompleted",
	"script.message",
	Event::REALM_CREATED,
	Event::REALM_DESTROYED,
];
