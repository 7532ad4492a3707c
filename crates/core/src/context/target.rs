//! Attached CDP target.
//!
//! Targets attach paused (`waitForDebuggerOnStart`). [`CdpTarget::init`]
//! enables the domains the mapper listens to, arms auto-attach for nested
//! targets, and then lets the target run. Commands that drive the page wait
//! on [`CdpTarget::unblocked`] first.

use std::sync::Arc;

use bidi_runtime::CdpSession;
use serde_json::json;

use super::signal::Deferred;
use crate::error::Result;

pub struct CdpTarget {
	target_id: String,
	session: Arc<CdpSession>,
	unblocked: Deferred<()>,
}

impl CdpTarget {
	pub fn new(target_id: impl Into<String>, session: Arc<CdpSession>) -> Arc<Self> {
		Arc::new(Self {
			target_id: target_id.into(),
			session,
			unblocked: Deferred::new(),
		})
	}

	pub fn target_id(&self) -> &str {
		&self.target_id
	}

	pub fn session(&self) -> &Arc<CdpSession> {
		&self.session
	}

	pub fn session_id(&self) -> &str {
		self.session.session_id().unwrap_or_default()
	}

	/// Runs the attach sequence and unblocks the target.
	///
	/// Failures are logged; the target is unblocked regardless so no
	/// command waits on it forever.
	pub async fn init(&self) {
		if let Err(e) = self.enable_domains().await {
			tracing::warn!(target = %self.target_id, error = %e, "Target initialization failed");
		}
		self.unblocked.resolve(());
		tracing::debug!(target = %self.target_id, "Target unblocked");
	}

	async fn enable_domains(&self) -> Result<()> {
		self.session.send_no_result("Page.enable", json!({})).await?;
		self.session
			.send_no_result("Page.setLifecycleEventsEnabled", json!({"enabled": true}))
			.await?;
		self.session.send_no_result("Runtime.enable", json!({})).await?;
		self.session
			.send_no_result(
				"Target.setAutoAttach",
				json!({"autoAttach": true, "waitForDebuggerOnStart": true, "flatten": true}),
			)
			.await?;
		self.session
			.send_no_result("Runtime.runIfWaitingForDebugger", json!({}))
			.await?;
		Ok(())
	}

	pub fn is_unblocked(&self) -> bool {
		self.unblocked.is_finished()
	}

	/// Resolves once [`init`](Self::init) has finished.
	pub async fn unblocked(&self) {
		let _ = self.unblocked.waiter().wait().await;
	}
}

impl std::fmt::Debug for CdpTarget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CdpTarget")
			.field("target_id", &self.target_id)
			.field("session", &self.session.session_id())
			.field("unblocked", &self.is_unblocked())
			.finish()
	}
}
