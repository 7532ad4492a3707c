//! Navigable context: one tab, window, or frame.
//!
//! A context mirrors its frame's navigation state from CDP events and
//! translates `browsingContext` commands into CDP commands on its target's
//! session. Commands that suspend re-check [`NavigableContext::revalidate`]
//! when they resume, because the context may have been disposed meanwhile.
//!
//! Navigation waits use three one-shot signals (same-document, DOM content
//! loaded, load). A signal is replaced only after it has resolved; a pending
//! one is kept so an in-flight wait still completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use bidi_protocol::Event;
use bidi_protocol::browsing_context::{
	BrowsingContextId, Info, NavigateResult, NavigationInfo, PrintParameters, ReadinessState,
	UserPromptClosedParameters, UserPromptOpenedParameters, UserPromptType, Viewport,
};
use bidi_protocol::script::{RealmId, RealmType};
use bidi_runtime::events::{ExecutionContextDescription, LifecycleEvent};
use bidi_runtime::{CdpEvent, SessionId, Subscription};
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::print::{self, EMPTY_CONTENT_AREA};
use super::signal::{Deferred, Waiter};
use super::target::CdpTarget;
use crate::error::{Error, Result};
use crate::script::{Realm, RealmFilter};
use crate::state::MapperState;

const ABOUT_BLANK: &str = "about:blank";

const NON_POSITIVE_VIEWPORT: &str = "Width and height values must be positive";

/// Evaluated in a subframe's default realm to find its screenshot clip.
const BOUNDING_RECT_FN: &str = "() => { const { x, y, width, height } = document.documentElement.getBoundingClientRect(); return { x, y, width, height }; }";

struct ContextState {
	url: String,
	loader_id: Option<String>,
	default_realm: Option<RealmId>,
	children: IndexSet<BrowsingContextId>,
	same_document: Deferred<()>,
	dom_content_loaded: Deferred<()>,
	load: Deferred<()>,
}

impl ContextState {
	fn new(url: String) -> Self {
		Self {
			url,
			loader_id: None,
			default_realm: None,
			children: IndexSet::new(),
			same_document: Deferred::new(),
			dom_content_loaded: Deferred::new(),
			load: Deferred::new(),
		}
	}
}

/// Rearms `signal` if it has settled; a pending signal is left for its waiters.
fn rearm(context: &str, name: &str, signal: &mut Deferred<()>) {
	if signal.is_finished() {
		*signal = Deferred::new();
	} else {
		tracing::debug!(context, signal = name, "Document changed before previous wait resolved");
	}
}

fn now_ms() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_millis() as u64)
		.unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageNavigateResponse {
	#[serde(default)]
	loader_id: Option<String>,
	#[serde(default)]
	error_text: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ClipRect {
	x: f64,
	y: f64,
	width: f64,
	height: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CssRect {
	x: f64,
	y: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CssViewport {
	client_width: f64,
	client_height: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutMetrics {
	css_content_size: CssRect,
	css_layout_viewport: CssViewport,
}

#[derive(Debug, Deserialize)]
struct RemoteObject {
	value: Option<ClipRect>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallFunctionResponse {
	result: RemoteObject,
	#[serde(default)]
	exception_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DataResponse {
	data: String,
}

/// A tab, window, or frame tracked by the mapper.
pub struct NavigableContext {
	id: BrowsingContextId,
	parent_id: Option<BrowsingContextId>,
	state: Mutex<ContextState>,
	target: Mutex<Arc<CdpTarget>>,
	listener: Mutex<Option<Subscription>>,
	disposed: AtomicBool,
	sandbox_lock: tokio::sync::Mutex<()>,
	shared: Arc<MapperState>,
}

impl NavigableContext {
	/// Creates a context, registers it, links it under its parent, and emits
	/// `browsingContext.contextCreated`.
	pub fn create(
		shared: Arc<MapperState>,
		id: impl Into<BrowsingContextId>,
		parent_id: Option<BrowsingContextId>,
		target: Arc<CdpTarget>,
		url: Option<String>,
	) -> Arc<Self> {
		let context = Arc::new(Self {
			id: id.into(),
			parent_id,
			state: Mutex::new(ContextState::new(url.unwrap_or_else(|| ABOUT_BLANK.to_string()))),
			target: Mutex::new(Arc::clone(&target)),
			listener: Mutex::new(None),
			disposed: AtomicBool::new(false),
			sandbox_lock: tokio::sync::Mutex::new(()),
			shared,
		});
		context.listen(&target);

		let contexts = &context.shared.contexts;
		contexts.add(Arc::clone(&context));
		if let Some(parent) = context.parent_id.as_deref().and_then(|id| contexts.find(id)) {
			parent.add_child(&context.id);
		}
		tracing::debug!(context = %context.id, parent = ?context.parent_id, target = target.target_id(), "Context created");

		let info = contexts.serialize(&context, Some(0), true);
		context
			.shared
			.events
			.register_event(Event::ContextCreated(info), Some(context.id.as_str()));
		context
	}

	fn listen(self: &Arc<Self>, target: &CdpTarget) {
		let weak: Weak<Self> = Arc::downgrade(self);
		let subscription = target.session().on(move |event| {
			if let Some(context) = weak.upgrade() {
				context.handle_event(event);
			}
		});
		*self.listener.lock() = Some(subscription);
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn parent_id(&self) -> Option<&str> {
		self.parent_id.as_deref()
	}

	pub fn is_top_level(&self) -> bool {
		self.parent_id.is_none()
	}

	pub fn url(&self) -> String {
		self.state.lock().url.clone()
	}

	pub fn loader_id(&self) -> Option<String> {
		self.state.lock().loader_id.clone()
	}

	pub fn children(&self) -> Vec<BrowsingContextId> {
		self.state.lock().children.iter().cloned().collect()
	}

	pub fn default_realm_id(&self) -> Option<RealmId> {
		self.state.lock().default_realm.clone()
	}

	pub fn target(&self) -> Arc<CdpTarget> {
		Arc::clone(&self.target.lock())
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::SeqCst)
	}

	pub(crate) fn add_child(&self, child: &str) {
		self.state.lock().children.insert(child.to_string());
	}

	pub(crate) fn remove_child(&self, child: &str) {
		self.state.lock().children.shift_remove(child);
	}

	pub(crate) fn set_url(&self, url: &str) {
		self.state.lock().url = url.to_string();
	}

	/// Moves the context onto a new target (out-of-process iframe swap).
	pub fn update_target(self: &Arc<Self>, target: Arc<CdpTarget>) {
		tracing::debug!(context = %self.id, target = target.target_id(), "Context moved to new target");
		*self.target.lock() = Arc::clone(&target);
		self.listen(&target);
	}

	/// Fails with [`Error::ContextDisposed`] once the context is gone.
	pub fn revalidate(&self) -> Result<()> {
		if self.is_disposed() || !self.shared.contexts.contains(&self.id) {
			return Err(Error::ContextDisposed(self.id.clone()));
		}
		Ok(())
	}

	pub fn serialize(&self, max_depth: Option<u64>, include_parent: bool) -> Info {
		self.shared.contexts.serialize(self, max_depth, include_parent)
	}

	/// Applies a document change reported for `loader_id`.
	///
	/// No loader id, or the current one, means a same-document change.
	pub fn document_changed(&self, loader_id: Option<&str>) {
		let mut state = self.state.lock();
		match loader_id {
			None => rearm(&self.id, "sameDocument", &mut state.same_document),
			Some(loader) if state.loader_id.as_deref() == Some(loader) => {
				rearm(&self.id, "sameDocument", &mut state.same_document)
			}
			Some(loader) => {
				rearm(&self.id, "domContentLoaded", &mut state.dom_content_loaded);
				rearm(&self.id, "load", &mut state.load);
				state.loader_id = Some(loader.to_string());
			}
		}
	}

	/// Picks the signal `wait` refers to, checked against disposal under the state lock.
	fn readiness_waiter(&self, wait: ReadinessState, same_document: bool) -> Result<Option<Waiter<()>>> {
		let state = self.state.lock();
		if self.is_disposed() {
			return Err(Error::ContextDisposed(self.id.clone()));
		}
		let signal = match (wait, same_document) {
			(ReadinessState::None, _) => return Ok(None),
			(_, true) => &state.same_document,
			(ReadinessState::Interactive, false) => &state.dom_content_loaded,
			(ReadinessState::Complete, false) => &state.load,
		};
		Ok(Some(signal.waiter()))
	}

	async fn await_readiness(&self, waiter: Option<Waiter<()>>) -> Result<()> {
		if let Some(waiter) = waiter {
			waiter
				.wait()
				.await
				.map_err(|_| Error::ContextDisposed(self.id.clone()))?;
			self.revalidate()?;
		}
		Ok(())
	}

	pub async fn navigate(&self, url: &str, wait: ReadinessState) -> Result<NavigateResult> {
		if Url::parse(url).is_err() {
			return Err(Error::InvalidArgument(format!("Invalid URL: {url}")));
		}

		let target = self.target();
		target.unblocked().await;
		self.revalidate()?;

		let response: PageNavigateResponse = target
			.session()
			.send("Page.navigate", json!({"url": url, "frameId": self.id}))
			.await?;
		if let Some(error_text) = response.error_text.filter(|text| !text.is_empty()) {
			return Err(Error::UnknownError(error_text));
		}
		self.revalidate()?;

		self.document_changed(response.loader_id.as_deref());
		let waiter = self.readiness_waiter(wait, response.loader_id.is_none())?;
		tracing::debug!(context = %self.id, url, navigation = ?response.loader_id, ?wait, "Navigation started");
		self.await_readiness(waiter).await?;

		Ok(NavigateResult {
			navigation: response.loader_id,
			url: url.to_string(),
		})
	}

	pub async fn reload(&self, ignore_cache: Option<bool>, wait: ReadinessState) -> Result<()> {
		let target = self.target();
		target.unblocked().await;
		self.revalidate()?;

		let mut params = json!({});
		if let Some(ignore_cache) = ignore_cache {
			params["ignoreCache"] = json!(ignore_cache);
		}
		target.session().send_no_result("Page.reload", params).await?;
		self.revalidate()?;

		{
			let mut state = self.state.lock();
			rearm(&self.id, "domContentLoaded", &mut state.dom_content_loaded);
			rearm(&self.id, "load", &mut state.load);
		}
		let waiter = self.readiness_waiter(wait, false)?;
		self.await_readiness(waiter).await
	}

	/// Returns the realm for `sandbox`, creating the isolated world on first use.
	///
	/// No sandbox name means the default realm, which must already exist.
	pub async fn get_or_create_sandbox(&self, sandbox: Option<&str>) -> Result<Arc<Realm>> {
		let Some(name) = sandbox.filter(|name| !name.is_empty()) else {
			let realm_id = self
				.default_realm_id()
				.ok_or_else(|| Error::Internal(format!("No default realm for context {}", self.id)))?;
			return self
				.shared
				.realms
				.get_realm(&RealmFilter::for_realm(realm_id))
				.map_err(|_| Error::Internal(format!("Default realm of context {} is gone", self.id)));
		};

		let _creating = self.sandbox_lock.lock().await;
		self.revalidate()?;
		let filter = RealmFilter::for_context(self.id.as_str()).with_sandbox(Some(name));
		if let Some(realm) = self.shared.realms.find_realm(&filter) {
			return Ok(realm);
		}

		let target = self.target();
		target
			.session()
			.send_no_result(
				"Page.createIsolatedWorld",
				json!({"frameId": self.id, "worldName": name, "grantUniveralAccess": true}),
			)
			.await?;
		self.revalidate()?;

		let timeout = self.shared.config.context_timeout;
		if self.shared.realms.wait_for_realm(&filter, timeout).await.is_none() {
			tracing::warn!(context = %self.id, sandbox = name, "Isolated world created but never reported");
		}
		let realms = self.shared.realms.find_realms(&filter);
		match realms.as_slice() {
			[realm] => Ok(Arc::clone(realm)),
			_ => Err(Error::Internal(format!(
				"Expected exactly one realm for sandbox '{name}' in context {}, found {}",
				self.id,
				realms.len()
			))),
		}
	}

	pub async fn set_viewport(&self, viewport: Option<Viewport>) -> Result<()> {
		let target = self.target();
		let session = target.session();
		match viewport {
			None => session
				.send_no_result("Emulation.clearDeviceMetricsOverride", json!({}))
				.await
				.map_err(Error::from),
			Some(viewport) => session
				.send_no_result(
					"Emulation.setDeviceMetricsOverride",
					json!({
						"width": viewport.width,
						"height": viewport.height,
						"deviceScaleFactor": 0,
						"mobile": false,
						"dontSetVisibleSize": true,
					}),
				)
				.await
				.map_err(|e| {
					if e.cdp_message().is_some_and(|message| message.starts_with(NON_POSITIVE_VIEWPORT)) {
						Error::UnsupportedOperation("Provided viewport dimensions are not supported".to_string())
					} else {
						e.into()
					}
				}),
		}
	}

	pub async fn capture_screenshot(&self) -> Result<String> {
		let target = self.target();
		let session = target.session();
		// Capturing stalls on a tab that is not in front.
		session.send_no_result("Page.bringToFront", json!({})).await?;
		self.revalidate()?;

		let clip = if self.is_top_level() {
			let metrics: LayoutMetrics = session.send("Page.getLayoutMetrics", json!({})).await?;
			ClipRect {
				x: metrics.css_content_size.x,
				y: metrics.css_content_size.y,
				width: metrics.css_layout_viewport.client_width,
				height: metrics.css_layout_viewport.client_height,
			}
		} else {
			let realm = self.get_or_create_sandbox(None).await?;
			let response: CallFunctionResponse = session
				.send(
					"Runtime.callFunctionOn",
					json!({
						"functionDeclaration": BOUNDING_RECT_FN,
						"executionContextId": realm.execution_context_id(),
						"returnByValue": true,
						"awaitPromise": false,
					}),
				)
				.await?;
			match (response.exception_details, response.result.value) {
				(None, Some(rect)) => rect,
				_ => {
					return Err(Error::UnknownError(format!(
						"Could not determine the bounding box of context {}",
						self.id
					)));
				}
			}
		};
		self.revalidate()?;

		let response: DataResponse = session
			.send(
				"Page.captureScreenshot",
				json!({"clip": {"x": clip.x, "y": clip.y, "width": clip.width, "height": clip.height, "scale": 1}}),
			)
			.await?;
		Ok(response.data)
	}

	pub async fn print(&self, params: &PrintParameters) -> Result<String> {
		let cdp_params = print::to_cdp_params(params)?;
		let target = self.target();
		let response: DataResponse = target
			.session()
			.send("Page.printToPDF", &cdp_params)
			.await
			.map_err(|e| {
				if e.cdp_message() == Some(EMPTY_CONTENT_AREA) {
					Error::UnsupportedOperation("Print content area is empty".to_string())
				} else {
					Error::from(e)
				}
			})?;
		Ok(response.data)
	}

	pub async fn handle_user_prompt(&self, accept: Option<bool>, user_text: Option<String>) -> Result<()> {
		let mut params = json!({"accept": accept.unwrap_or(true)});
		if let Some(text) = user_text {
			params["promptText"] = json!(text);
		}
		self.target()
			.session()
			.send_no_result("Page.handleJavaScriptDialog", params)
			.await?;
		Ok(())
	}

	pub async fn activate(&self) -> Result<()> {
		self.target()
			.session()
			.send_no_result("Page.bringToFront", json!({}))
			.await?;
		Ok(())
	}

	/// Closes the page. The context is disposed here unless the detach event
	/// already did it.
	pub async fn close(&self) -> Result<()> {
		self.target().session().send_no_result("Page.close", json!({})).await?;
		if self.shared.contexts.contains(&self.id) {
			self.dispose();
		}
		Ok(())
	}

	/// Removes this context and its subtree.
	///
	/// Children go first, then realms; the parent link is cut before
	/// `browsingContext.contextDestroyed` is emitted and the node leaves the
	/// registry last. Pending navigation waits fail with
	/// [`Error::ContextDisposed`].
	pub fn dispose(&self) {
		if self.disposed.swap(true, Ordering::SeqCst) {
			return;
		}
		let contexts = &self.shared.contexts;

		for child in self.children() {
			if let Some(child) = contexts.find(&child) {
				child.dispose();
			}
		}

		self.shared
			.realms
			.delete_realms(&RealmFilter::for_context(self.id.as_str()));

		if let Some(parent) = self.parent_id.as_deref().and_then(|id| contexts.find(id)) {
			parent.remove_child(&self.id);
		}

		let info = self.serialize(Some(0), true);
		self.shared
			.events
			.register_event(Event::ContextDestroyed(info), Some(self.id.as_str()));

		{
			let state = self.state.lock();
			state.same_document.reject("Context disposed");
			state.dom_content_loaded.reject("Context disposed");
			state.load.reject("Context disposed");
		}
		self.listener.lock().take();
		contexts.delete(&self.id);
		tracing::debug!(context = %self.id, "Context disposed");
	}

	fn navigation_info(&self) -> NavigationInfo {
		let state = self.state.lock();
		NavigationInfo {
			context: self.id.clone(),
			navigation: state.loader_id.clone(),
			timestamp: now_ms(),
			url: state.url.clone(),
		}
	}

	/// Page-domain dialog events are session-wide; only the frame its target was
	/// created for reports them, on behalf of its top-level context.
	fn owns_dialogs(&self) -> bool {
		self.target().target_id() == self.id
	}

	fn register_event(&self, event: Event) {
		self.shared.events.register_event(event, Some(self.id.as_str()));
	}

	/// Reacts to a CDP event from this context's session.
	pub fn handle_event(&self, event: &CdpEvent) {
		if self.is_disposed() {
			return;
		}
		match event {
			CdpEvent::FrameNavigated(params) if params.frame.id == self.id => {
				let frame = &params.frame;
				let url = format!("{}{}", frame.url, frame.url_fragment.as_deref().unwrap_or_default());
				self.set_url(&url);
				// The new document replaces the old frame tree.
				for child in self.children() {
					if let Some(child) = self.shared.contexts.find(&child) {
						child.dispose();
					}
				}
			}
			CdpEvent::NavigatedWithinDocument(params) if params.frame_id == self.id => {
				self.set_url(&params.url);
				self.state.lock().same_document.resolve(());
				self.register_event(Event::FragmentNavigated(NavigationInfo {
					context: self.id.clone(),
					navigation: None,
					timestamp: now_ms(),
					url: params.url.clone(),
				}));
			}
			CdpEvent::FrameStartedLoading(params) if params.frame_id == self.id => {
				// The target URL is not known until the frame commits.
				self.register_event(Event::NavigationStarted(NavigationInfo {
					context: self.id.clone(),
					navigation: None,
					timestamp: now_ms(),
					url: String::new(),
				}));
			}
			CdpEvent::LifecycleEvent(params) if params.frame_id == self.id => self.on_lifecycle(params),
			CdpEvent::ExecutionContextCreated(params)
				if params.context.aux_data.frame_id.as_deref() == Some(self.id.as_str()) =>
			{
				self.on_execution_context_created(&params.context);
			}
			CdpEvent::ExecutionContextDestroyed(params) => {
				let filter = RealmFilter::for_context(self.id.as_str())
					.with_session(self.target().session_id())
					.with_execution_context(params.execution_context_id);
				if self.shared.realms.delete_realms(&filter) > 0 {
					self.forget_missing_default_realm();
				}
			}
			CdpEvent::ExecutionContextsCleared => {
				let filter = RealmFilter::for_context(self.id.as_str()).with_session(self.target().session_id());
				self.shared.realms.delete_realms(&filter);
				self.state.lock().default_realm = None;
			}
			CdpEvent::JavascriptDialogOpening(params) if self.owns_dialogs() => {
				let Some(kind) = UserPromptType::from_cdp(&params.kind) else {
					tracing::warn!(context = %self.id, kind = %params.kind, "Unknown dialog type");
					return;
				};
				self.register_event(Event::UserPromptOpened(UserPromptOpenedParameters {
					context: self.shared.contexts.top_level_id(&self.id),
					kind,
					message: params.message.clone(),
				}));
			}
			CdpEvent::JavascriptDialogClosed(params) if self.owns_dialogs() => {
				self.register_event(Event::UserPromptClosed(UserPromptClosedParameters {
					context: self.shared.contexts.top_level_id(&self.id),
					accepted: params.result,
					user_text: Some(params.user_input.clone()).filter(|text| !text.is_empty()),
				}));
			}
			_ => {}
		}
	}

	fn on_lifecycle(&self, params: &LifecycleEvent) {
		match params.name.as_str() {
			"init" => self.document_changed(Some(params.loader_id.as_str())),
			"commit" => self.state.lock().loader_id = Some(params.loader_id.clone()),
			"DOMContentLoaded" | "load" => {
				let is_load = params.name == "load";
				{
					let state = self.state.lock();
					if state.loader_id.as_deref() != Some(params.loader_id.as_str()) {
						tracing::trace!(context = %self.id, loader = %params.loader_id, event = %params.name, "Ignoring lifecycle event for stale loader");
						return;
					}
					if is_load {
						state.load.resolve(());
					} else {
						state.dom_content_loaded.resolve(());
					}
				}
				let info = self.navigation_info();
				self.register_event(if is_load {
					Event::Load(info)
				} else {
					Event::DomContentLoaded(info)
				});
			}
			_ => {}
		}
	}

	fn on_execution_context_created(&self, description: &ExecutionContextDescription) {
		let aux = &description.aux_data;
		let (sandbox, origin) = match aux.kind.as_deref() {
			Some("default") => (None, description.origin.clone()),
			// Isolated worlds report no origin of their own.
			Some("isolated") => {
				let origin = self
					.default_realm_id()
					.and_then(|id| self.shared.realms.find_realm(&RealmFilter::for_realm(id)))
					.map(|realm| realm.origin().to_string())
					.unwrap_or_default();
				(Some(description.name.clone()), origin)
			}
			other => {
				tracing::trace!(context = %self.id, kind = ?other, "Ignoring execution context");
				return;
			}
		};

		let session_id = SessionId::from(self.target().session_id());
		let realm = Arc::new(Realm::new(
			description.unique_id.clone(),
			self.id.clone(),
			description.id,
			&origin,
			RealmType::Window,
			sandbox,
			session_id,
		));
		if aux.is_default && realm.sandbox().is_none() {
			self.state.lock().default_realm = Some(realm.realm_id().to_string());
		}
		self.shared.realms.add(realm);
	}

	fn forget_missing_default_realm(&self) {
		let Some(realm_id) = self.default_realm_id() else {
			return;
		};
		if self
			.shared
			.realms
			.find_realm(&RealmFilter::for_realm(realm_id.as_str()))
			.is_none()
		{
			let mut state = self.state.lock();
			if state.default_realm.as_deref() == Some(realm_id.as_str()) {
				state.default_realm = None;
			}
		}
	}
}

impl std::fmt::Debug for NavigableContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("NavigableContext")
			.field("id", &self.id)
			.field("parent_id", &self.parent_id)
			.field("url", &state.url)
			.field("loader_id", &state.loader_id)
			.field("children", &state.children)
			.field("disposed", &self.is_disposed())
			.finish()
	}
}
