//! `session.*` and `browser.*` commands.

use bidi_protocol::EmptyResult;
use bidi_protocol::session::{StatusResult, SubscriptionRequest};
use serde_json::json;

use super::CommandProcessor;
use crate::error::Result;
use crate::events::ClientId;

impl CommandProcessor {
	/// The mapper serves one connection, which is already established.
	pub(super) fn status(&self) -> StatusResult {
		StatusResult {
			ready: false,
			message: "already connected".to_string(),
		}
	}

	pub(super) fn subscribe(&self, client: ClientId, params: SubscriptionRequest) -> Result<EmptyResult> {
		self.shared
			.events
			.subscribe(client, &params.events, params.contexts.as_deref())?;
		Ok(EmptyResult {})
	}

	pub(super) fn unsubscribe(&self, client: ClientId, params: SubscriptionRequest) -> Result<EmptyResult> {
		self.shared
			.events
			.unsubscribe(client, &params.events, params.contexts.as_deref())?;
		Ok(EmptyResult {})
	}

	pub(super) async fn close_browser(&self) -> Result<EmptyResult> {
		self.browser.send_no_result("Browser.close", json!({})).await?;
		Ok(EmptyResult {})
	}
}
