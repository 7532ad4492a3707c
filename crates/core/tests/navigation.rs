//! Navigation commands and the lifecycle signals they wait on.

mod common;

use bidi_protocol::{ErrorCode, Event, OutgoingMessage};
use bidi_runtime::CdpEvent;
use bidi_runtime::events::{DetachedFromTarget, FrameStartedLoading, NavigatedWithinDocument};
use common::{Harness, Reply, error_code, event_names, settle, success_result};
use serde_json::json;

fn page() -> Harness {
	let h = Harness::new();
	h.subscribe_all();
	h.attach_page("A", "S-A");
	h
}

fn navigate_to(loader_id: Option<&str>) -> impl Fn(&common::Call) -> Reply + Send + Sync + 'static {
	let result = match loader_id {
		Some(loader) => json!({"frameId": "A", "loaderId": loader}),
		None => json!({"frameId": "A"}),
	};
	move |_| Reply::ok(result.clone())
}

fn load_events(events: &[Event]) -> Vec<Option<String>> {
	events
		.iter()
		.filter_map(|event| match event {
			Event::Load(info) => Some(info.navigation.clone()),
			_ => None,
		})
		.collect()
}

#[tokio::test]
async fn test_navigate_without_wait_returns_on_ack() {
	let mut h = page();
	h.browser.respond("Page.navigate", navigate_to(Some("L1")));

	let response = h
		.command(
			"browsingContext.navigate",
			json!({"context": "A", "url": "https://example.com/", "wait": "none"}),
		)
		.await;
	assert_eq!(
		success_result(&response),
		&json!({"navigation": "L1", "url": "https://example.com/"})
	);

	let calls = h.browser.calls_to("Page.navigate");
	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].session.as_deref(), Some("S-A"));
	assert_eq!(calls[0].params, json!({"url": "https://example.com/", "frameId": "A"}));

	h.events();
	h.lifecycle("S-A", "A", "L1", "load");
	assert_eq!(load_events(&h.events()), [Some("L1".to_string())]);
}

#[tokio::test]
async fn test_navigate_complete_waits_for_matching_loader() {
	let mut h = page();
	h.browser.respond("Page.navigate", navigate_to(Some("L2")));

	let task = h.spawn_command(
		"browsingContext.navigate",
		json!({"context": "A", "url": "https://example.com/", "wait": "complete"}),
	);
	settle().await;
	assert!(!task.is_finished());

	h.lifecycle("S-A", "A", "L-old", "load");
	settle().await;
	assert!(!task.is_finished());

	h.lifecycle("S-A", "A", "L2", "DOMContentLoaded");
	settle().await;
	assert!(!task.is_finished());

	h.lifecycle("S-A", "A", "L2", "load");
	let response = task.await.unwrap();
	assert_eq!(success_result(&response)["navigation"], "L2");

	let events = h.events();
	assert_eq!(load_events(&events), [Some("L2".to_string())]);
	assert!(event_names(&events).contains(&Event::DOM_CONTENT_LOADED));
}

#[tokio::test]
async fn test_navigate_interactive_resolves_on_dom_content_loaded() {
	let mut h = page();
	h.browser.respond("Page.navigate", navigate_to(Some("L1")));

	let task = h.spawn_command(
		"browsingContext.navigate",
		json!({"context": "A", "url": "https://example.com/", "wait": "interactive"}),
	);
	settle().await;
	h.lifecycle("S-A", "A", "L1", "DOMContentLoaded");

	let response = task.await.unwrap();
	assert!(matches!(response, OutgoingMessage::Success { .. }));
}

#[tokio::test]
async fn test_same_document_navigation_waits_for_fragment() {
	let mut h = page();
	h.browser.respond("Page.navigate", navigate_to(None));

	let task = h.spawn_command(
		"browsingContext.navigate",
		json!({"context": "A", "url": "about:blank#section", "wait": "complete"}),
	);
	settle().await;
	assert!(!task.is_finished());

	h.events();
	h.emit(
		Some("S-A"),
		CdpEvent::NavigatedWithinDocument(NavigatedWithinDocument {
			frame_id: "A".into(),
			url: "about:blank#section".into(),
		}),
	);

	let response = task.await.unwrap();
	assert_eq!(
		success_result(&response),
		&json!({"navigation": null, "url": "about:blank#section"})
	);
	let events = h.events();
	assert_eq!(event_names(&events), [Event::FRAGMENT_NAVIGATED]);
	let Event::FragmentNavigated(info) = &events[0] else {
		unreachable!();
	};
	assert_eq!(info.url, "about:blank#section");
	assert_eq!(info.navigation, None);
	assert!(info.timestamp > 0);
	assert_eq!(h.mapper.state().contexts.get("A").unwrap().url(), "about:blank#section");
}

#[tokio::test]
async fn test_started_and_fragment_events_carry_no_navigation_id() {
	let mut h = page();
	h.lifecycle("S-A", "A", "L1", "init");
	h.lifecycle("S-A", "A", "L1", "load");
	h.events();

	h.emit(
		Some("S-A"),
		CdpEvent::NavigatedWithinDocument(NavigatedWithinDocument {
			frame_id: "A".into(),
			url: "about:blank#next".into(),
		}),
	);
	h.emit(
		Some("S-A"),
		CdpEvent::FrameStartedLoading(FrameStartedLoading { frame_id: "A".into() }),
	);

	let events = h.events();
	assert_eq!(
		event_names(&events),
		[Event::FRAGMENT_NAVIGATED, Event::NAVIGATION_STARTED]
	);
	let (Event::FragmentNavigated(fragment), Event::NavigationStarted(started)) = (&events[0], &events[1]) else {
		unreachable!();
	};
	assert_eq!(fragment.context, "A");
	assert_eq!(fragment.navigation, None);
	assert_eq!(fragment.url, "about:blank#next");
	assert_eq!(started.context, "A");
	assert_eq!(started.navigation, None);
	assert_eq!(started.url, "");
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_navigating() {
	let mut h = page();
	let response = h
		.command("browsingContext.navigate", json!({"context": "A", "url": "not a url"}))
		.await;
	assert_eq!(error_code(&response), ErrorCode::InvalidArgument);
	assert!(h.browser.calls_to("Page.navigate").is_empty());
}

#[tokio::test]
async fn test_navigation_error_text_is_unknown_error() {
	let mut h = page();
	h.browser.respond("Page.navigate", |_| {
		Reply::ok(json!({"frameId": "A", "loaderId": "L1", "errorText": "net::ERR_NAME_NOT_RESOLVED"}))
	});

	let response = h
		.command("browsingContext.navigate", json!({"context": "A", "url": "https://nowhere.invalid/"}))
		.await;
	match response {
		OutgoingMessage::Error { error, message, .. } => {
			assert_eq!(error, ErrorCode::UnknownError);
			assert_eq!(message, "net::ERR_NAME_NOT_RESOLVED");
		}
		other => panic!("expected error, got {other:?}"),
	}
}

#[tokio::test]
async fn test_navigate_unknown_context() {
	let mut h = page();
	let response = h
		.command("browsingContext.navigate", json!({"context": "Z", "url": "https://example.com/"}))
		.await;
	assert_eq!(error_code(&response), ErrorCode::NoSuchFrame);
}

#[tokio::test]
async fn test_dispose_fails_pending_navigation() {
	let mut h = page();
	h.browser.respond("Page.navigate", navigate_to(Some("L1")));

	let task = h.spawn_command(
		"browsingContext.navigate",
		json!({"context": "A", "url": "https://example.com/", "wait": "complete"}),
	);
	settle().await;
	assert!(!task.is_finished());

	h.emit(
		None,
		CdpEvent::DetachedFromTarget(DetachedFromTarget {
			session_id: "S-A".into(),
			target_id: Some("A".into()),
		}),
	);

	let response = task.await.unwrap();
	assert_eq!(error_code(&response), ErrorCode::NoSuchFrame);
}

#[tokio::test]
async fn test_reload_rearms_signals() {
	let mut h = page();
	h.browser.respond("Page.navigate", navigate_to(Some("L1")));
	h.command("browsingContext.navigate", json!({"context": "A", "url": "https://example.com/"}))
		.await;
	h.lifecycle("S-A", "A", "L1", "DOMContentLoaded");
	h.lifecycle("S-A", "A", "L1", "load");

	let task = h.spawn_command(
		"browsingContext.reload",
		json!({"context": "A", "ignoreCache": true, "wait": "complete"}),
	);
	settle().await;
	assert!(!task.is_finished(), "the previous load must not satisfy the reload");

	h.lifecycle("S-A", "A", "L2", "init");
	h.lifecycle("S-A", "A", "L2", "load");
	let response = task.await.unwrap();
	assert_eq!(success_result(&response), &json!({}));

	let reloads = h.browser.calls_to("Page.reload");
	assert_eq!(reloads[0].params, json!({"ignoreCache": true}));
	assert_eq!(
		h.mapper.state().contexts.get("A").unwrap().loader_id().as_deref(),
		Some("L2")
	);
}

#[tokio::test]
async fn test_commit_adopts_loader() {
	let mut h = page();
	let context = h.mapper.state().contexts.get("A").unwrap();
	h.events();

	h.lifecycle("S-A", "A", "L1", "commit");
	assert_eq!(context.loader_id().as_deref(), Some("L1"));

	h.lifecycle("S-A", "A", "L1", "load");
	assert_eq!(load_events(&h.events()), [Some("L1".to_string())]);
}

#[tokio::test]
async fn test_stale_lifecycle_events_are_not_reported() {
	let mut h = page();
	h.lifecycle("S-A", "A", "L1", "init");
	h.events();

	h.lifecycle("S-A", "A", "L0", "load");
	h.lifecycle("S-A", "A", "L0", "DOMContentLoaded");
	assert!(h.events().is_empty());

	h.lifecycle("S-A", "A", "L1", "load");
	assert_eq!(load_events(&h.events()), [Some("L1".to_string())]);
}
