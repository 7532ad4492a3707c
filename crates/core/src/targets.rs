//! Target and frame lifecycle.
//!
//! Turns `Target.*` attach/detach and `Page.frame*` events into navigable
//! context creation and disposal, and routes every CDP event to the
//! [`CdpSession`] it arrived on.

use std::sync::Arc;

use bidi_runtime::events::{AttachedToTarget, DetachedFromTarget, FrameAttached, FrameDetached, TargetInfo};
use bidi_runtime::{CdpClient, CdpEvent, CdpSession, SessionId};
use dashmap::DashMap;
use serde_json::json;

use crate::context::{CdpTarget, NavigableContext};
use crate::state::MapperState;

/// Builds a client bound to a flattened CDP session.
pub type ClientFactory = Arc<dyn Fn(SessionId) -> Arc<dyn CdpClient> + Send + Sync>;

pub struct TargetManager {
	shared: Arc<MapperState>,
	browser: Arc<CdpSession>,
	targets: DashMap<SessionId, Arc<CdpTarget>>,
	client_factory: ClientFactory,
}

impl TargetManager {
	pub fn new(shared: Arc<MapperState>, browser: Arc<CdpSession>, client_factory: ClientFactory) -> Self {
		Self {
			shared,
			browser,
			targets: DashMap::new(),
			client_factory,
		}
	}

	pub fn browser_session(&self) -> &Arc<CdpSession> {
		&self.browser
	}

	/// Session for `session_id`; `None` is the browser session.
	pub fn session(&self, session_id: Option<&str>) -> Option<Arc<CdpSession>> {
		match session_id {
			None => Some(Arc::clone(&self.browser)),
			Some(id) => self.targets.get(id).map(|target| Arc::clone(target.session())),
		}
	}

	pub fn target_count(&self) -> usize {
		self.targets.len()
	}

	/// Applies lifecycle effects of `event`, then hands it to its session's listeners.
	pub fn handle_event(&self, session_id: Option<&str>, event: &CdpEvent) {
		match event {
			CdpEvent::AttachedToTarget(params) => self.on_attached(params),
			CdpEvent::DetachedFromTarget(params) => self.on_detached(params),
			CdpEvent::FrameAttached(params) => self.on_frame_attached(params),
			CdpEvent::FrameDetached(params) => self.on_frame_detached(params),
			CdpEvent::TargetInfoChanged(params) => self.on_target_info_changed(&params.target_info),
			_ => {}
		}

		match self.session(session_id) {
			Some(session) => session.emit(event),
			None => tracing::trace!(session = ?session_id, method = event.method(), "Event for untracked session"),
		}
	}

	fn on_attached(&self, params: &AttachedToTarget) {
		let info = &params.target_info;
		let session_id = SessionId::from(params.session_id.as_str());
		let session = Arc::new(CdpSession::new((self.client_factory)(session_id.clone())));

		if !matches!(info.kind.as_str(), "page" | "iframe") {
			tracing::debug!(target = %info.target_id, kind = %info.kind, "Resuming untracked target");
			tokio::spawn(async move {
				if let Err(e) = session.send_no_result("Runtime.runIfWaitingForDebugger", json!({})).await {
					tracing::debug!(error = %e, "Failed to resume untracked target");
				}
			});
			return;
		}

		let target = CdpTarget::new(info.target_id.clone(), session);
		self.targets.insert(session_id, Arc::clone(&target));
		tracing::debug!(target = %info.target_id, kind = %info.kind, session = %params.session_id, "Target attached");

		if let Some(context) = self.shared.contexts.find(&info.target_id) {
			context.update_target(Arc::clone(&target));
		} else if info.kind == "page" {
			let url = Some(info.url.clone()).filter(|url| !url.is_empty());
			NavigableContext::create(
				Arc::clone(&self.shared),
				info.target_id.clone(),
				None,
				Arc::clone(&target),
				url,
			);
		} else {
			tracing::warn!(target = %info.target_id, "Attached iframe target has no known frame");
		}

		tokio::spawn(async move { target.init().await });
	}

	fn on_detached(&self, params: &DetachedFromTarget) {
		let Some((_, target)) = self.targets.remove(params.session_id.as_str()) else {
			return;
		};
		tracing::debug!(target = target.target_id(), session = %params.session_id, "Target detached");

		// A frame swapped back in-process keeps its context on the new session.
		let Some(context) = self.shared.contexts.find(target.target_id()) else {
			return;
		};
		if context.target().session_id() == params.session_id {
			context.dispose();
		}
	}

	fn on_frame_attached(&self, params: &FrameAttached) {
		let contexts = &self.shared.contexts;
		if contexts.contains(&params.frame_id) {
			return;
		}
		let Some(parent) = contexts.find(&params.parent_frame_id) else {
			tracing::debug!(frame = %params.frame_id, parent = %params.parent_frame_id, "Frame attached under unknown parent");
			return;
		};
		NavigableContext::create(
			Arc::clone(&self.shared),
			params.frame_id.clone(),
			Some(params.parent_frame_id.clone()),
			parent.target(),
			None,
		);
	}

	fn on_frame_detached(&self, params: &FrameDetached) {
		// `swap` moves the frame to another process; its context survives.
		if params.reason.as_deref() == Some("swap") {
			return;
		}
		if let Some(context) = self.shared.contexts.find(&params.frame_id) {
			context.dispose();
		}
	}

	fn on_target_info_changed(&self, info: &TargetInfo) {
		if let Some(context) = self.shared.contexts.find(&info.target_id) {
			context.set_url(&info.url);
		}
	}
}
