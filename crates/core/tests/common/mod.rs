//! Scripted CDP browser for driving the mapper without Chromium.
//!
//! Every session's client records its calls in one shared log. Replies are
//! scripted per method and may carry CDP events, which are routed through the
//! mapper before the command returns, the way Chromium sends events ahead of
//! the response that caused them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use bidi_mapper::{BidiMapper, MapperConfig};
use bidi_protocol::{Command, Event, OutgoingMessage};
use bidi_runtime::events::{
	AttachedToTarget, AuxData, ExecutionContextCreated, ExecutionContextDescription, FrameAttached,
	LifecycleEvent, TargetInfo,
};
use bidi_runtime::{CdpClient, CdpEvent, SessionId};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const CLIENT: u64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
	pub session: Option<String>,
	pub method: String,
	pub params: Value,
}

/// A scripted response plus the events the browser sends ahead of it.
pub struct Reply {
	pub result: bidi_runtime::Result<Value>,
	pub events: Vec<(Option<String>, CdpEvent)>,
}

impl Reply {
	pub fn ok(result: Value) -> Self {
		Self {
			result: Ok(result),
			events: Vec::new(),
		}
	}

	pub fn error(message: &str) -> Self {
		Self {
			result: Err(bidi_runtime::Error::Cdp {
				code: -32000,
				message: message.to_string(),
				data: None,
			}),
			events: Vec::new(),
		}
	}

	pub fn with_event(mut self, session: Option<&str>, event: CdpEvent) -> Self {
		self.events.push((session.map(str::to_string), event));
		self
	}
}

type Responder = Arc<dyn Fn(&Call) -> Reply + Send + Sync>;

#[derive(Default)]
pub struct FakeBrowser {
	calls: Mutex<Vec<Call>>,
	responders: Mutex<HashMap<String, Responder>>,
	mapper: OnceLock<Weak<BidiMapper>>,
}

impl FakeBrowser {
	pub fn respond<F>(&self, method: &str, responder: F)
	where
		F: Fn(&Call) -> Reply + Send + Sync + 'static,
	{
		self.responders.lock().insert(method.to_string(), Arc::new(responder));
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn calls_to(&self, method: &str) -> Vec<Call> {
		self.calls.lock().iter().filter(|call| call.method == method).cloned().collect()
	}

	fn handle(&self, session: Option<String>, method: String, params: Value) -> bidi_runtime::Result<Value> {
		let call = Call { session, method, params };
		self.calls.lock().push(call.clone());
		let responder = self.responders.lock().get(&call.method).cloned();
		let reply = match responder {
			Some(responder) => responder(&call),
			None => Reply::ok(json!({})),
		};
		if let Some(mapper) = self.mapper.get().and_then(Weak::upgrade) {
			for (session, event) in &reply.events {
				mapper.targets().handle_event(session.as_deref(), event);
			}
		}
		reply.result
	}
}

struct FakeClient {
	browser: Arc<FakeBrowser>,
	session_id: Option<SessionId>,
}

impl CdpClient for FakeClient {
	fn send_command(&self, method: &str, params: Value) -> Pin<Box<dyn Future<Output = bidi_runtime::Result<Value>> + Send + '_>> {
		let method = method.to_string();
		let session = self.session_id.as_deref().map(str::to_string);
		Box::pin(async move { self.browser.handle(session, method, params) })
	}

	fn session_id(&self) -> Option<&str> {
		self.session_id.as_deref()
	}
}

pub struct Harness {
	pub browser: Arc<FakeBrowser>,
	pub mapper: Arc<BidiMapper>,
	pub outbox: mpsc::UnboundedReceiver<OutgoingMessage>,
	next_id: u64,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(MapperConfig::default().with_context_timeout(Duration::from_millis(200)))
	}

	pub fn with_config(config: MapperConfig) -> Self {
		let browser = Arc::new(FakeBrowser::default());
		let browser_client: Arc<dyn CdpClient> = Arc::new(FakeClient {
			browser: Arc::clone(&browser),
			session_id: None,
		});
		let factory_browser = Arc::clone(&browser);
		let mapper = Arc::new(BidiMapper::new(
			config,
			browser_client,
			Arc::new(move |session_id| {
				Arc::new(FakeClient {
					browser: Arc::clone(&factory_browser),
					session_id: Some(session_id),
				}) as Arc<dyn CdpClient>
			}),
		));
		let _ = browser.mapper.set(Arc::downgrade(&mapper));
		let outbox = mapper.connect_client(CLIENT);
		Self {
			browser,
			mapper,
			outbox,
			next_id: 1,
		}
	}

	pub fn emit(&self, session: Option<&str>, event: CdpEvent) {
		self.mapper.targets().handle_event(session, &event);
	}

	/// Attaches a page target; its id doubles as the top-level context id.
	pub fn attach_page(&self, target_id: &str, session_id: &str) {
		self.emit(None, attached(target_id, session_id, "page"));
	}

	pub fn attach_frame(&self, session_id: &str, frame_id: &str, parent_id: &str) {
		self.emit(
			Some(session_id),
			CdpEvent::FrameAttached(FrameAttached {
				frame_id: frame_id.to_string(),
				parent_frame_id: parent_id.to_string(),
			}),
		);
	}

	pub fn lifecycle(&self, session_id: &str, frame_id: &str, loader_id: &str, name: &str) {
		self.emit(Some(session_id), lifecycle(frame_id, loader_id, name));
	}

	/// Reports the main-world execution context of `frame_id`.
	pub fn default_realm(&self, session_id: &str, frame_id: &str, exec_id: i64, unique_id: &str) {
		self.emit(
			Some(session_id),
			execution_context(frame_id, exec_id, unique_id, "default", "", "https://example.com"),
		);
	}

	pub fn subscribe_all(&self) {
		self.mapper
			.state()
			.events
			.subscribe(CLIENT, &["browsingContext".to_string(), "script".to_string()], None)
			.expect("subscribe");
	}

	/// Runs a command on its own task, like the mapper loop does.
	pub fn spawn_command(&mut self, method: &str, params: Value) -> JoinHandle<OutgoingMessage> {
		let id = self.next_id;
		self.next_id += 1;
		let mapper = Arc::clone(&self.mapper);
		let command = Command {
			id,
			method: method.to_string(),
			params,
		};
		tokio::spawn(async move { mapper.processor().respond(CLIENT, command).await })
	}

	pub async fn command(&mut self, method: &str, params: Value) -> OutgoingMessage {
		self.spawn_command(method, params).await.expect("command task panicked")
	}

	/// Events queued for the client so far.
	pub fn events(&mut self) -> Vec<Event> {
		let mut events = Vec::new();
		while let Ok(message) = self.outbox.try_recv() {
			if let OutgoingMessage::Event(event) = message {
				events.push(event);
			}
		}
		events
	}
}

/// Lets spawned tasks run up to their next real suspension point.
pub async fn settle() {
	for _ in 0..32 {
		tokio::task::yield_now().await;
	}
}

pub fn attached(target_id: &str, session_id: &str, kind: &str) -> CdpEvent {
	CdpEvent::AttachedToTarget(AttachedToTarget {
		session_id: session_id.to_string(),
		target_info: TargetInfo {
			target_id: target_id.to_string(),
			kind: kind.to_string(),
			url: "about:blank".to_string(),
			title: String::new(),
			opener_id: None,
		},
		waiting_for_debugger: true,
	})
}

pub fn lifecycle(frame_id: &str, loader_id: &str, name: &str) -> CdpEvent {
	CdpEvent::LifecycleEvent(LifecycleEvent {
		frame_id: frame_id.to_string(),
		loader_id: loader_id.to_string(),
		name: name.to_string(),
		timestamp: 0.0,
	})
}

pub fn execution_context(frame_id: &str, exec_id: i64, unique_id: &str, kind: &str, name: &str, origin: &str) -> CdpEvent {
	CdpEvent::ExecutionContextCreated(ExecutionContextCreated {
		context: ExecutionContextDescription {
			id: exec_id,
			origin: origin.to_string(),
			name: name.to_string(),
			unique_id: unique_id.to_string(),
			aux_data: AuxData {
				frame_id: Some(frame_id.to_string()),
				is_default: kind == "default",
				kind: Some(kind.to_string()),
			},
		},
	})
}

pub fn success_result(message: &OutgoingMessage) -> &Value {
	match message {
		OutgoingMessage::Success { result, .. } => result,
		other => panic!("expected success, got {other:?}"),
	}
}

pub fn error_code(message: &OutgoingMessage) -> bidi_protocol::ErrorCode {
	match message {
		OutgoingMessage::Error { error, .. } => *error,
		other => panic!("expected error, got {other:?}"),
	}
}

pub fn event_names(events: &[Event]) -> Vec<&'static str> {
	events.iter().map(Event::method).collect()
}
