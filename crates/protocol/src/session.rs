//! `session` module types.

use serde::{Deserialize, Serialize};

use crate::browsing_context::BrowsingContextId;

/// Parameters of `session.subscribe` and `session.unsubscribe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
	/// Event names (`browsingContext.load`) or module names (`browsingContext`).
	pub events: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contexts: Option<Vec<BrowsingContextId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
	pub ready: bool,
	pub message: String,
}
