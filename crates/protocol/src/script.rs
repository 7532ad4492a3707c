//! `script` module types used by realm tracking.

use serde::{Deserialize, Serialize};

use crate::browsing_context::BrowsingContextId;

/// Identifier of a script realm (CDP execution context `uniqueId`).
pub type RealmId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealmType {
	Window,
	DedicatedWorker,
	SharedWorker,
	ServiceWorker,
	Worker,
	PaintWorklet,
	AudioWorklet,
	Worklet,
}

/// Serialized realm, carried by `script.realmCreated` and `script.getRealms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmInfo {
	pub realm: RealmId,
	pub origin: String,
	#[serde(rename = "type")]
	pub kind: RealmType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<BrowsingContextId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sandbox: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealmDestroyedParameters {
	pub realm: RealmId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetRealmsParameters {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub context: Option<BrowsingContextId>,
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<RealmType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRealmsResult {
	pub realms: Vec<RealmInfo>,
}
