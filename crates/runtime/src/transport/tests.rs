use futures_util::{SinkExt, StreamExt};
use tokio::io::{DuplexStream, duplex};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::Role;

use super::*;

/// Returns the transport (client role) and the browser end (server role).
async fn socket_pair() -> (TransportParts, WebSocketStream<DuplexStream>) {
	let (client, server) = duplex(64 * 1024);
	let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
	let server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;
	(WebSocketTransport::from_stream(client), server)
}

#[tokio::test]
async fn test_send_writes_text_frame() {
	let (parts, mut browser) = socket_pair().await;
	let TransportParts { mut sender, .. } = parts;

	let message = serde_json::json!({"id": 1, "method": "Page.enable", "params": {}});
	sender.send(message.clone()).await.unwrap();

	let frame = browser.next().await.unwrap().unwrap();
	let WsMessage::Text(text) = frame else {
		panic!("Expected text frame, got {frame:?}");
	};
	let received: Value = serde_json::from_str(&text).unwrap();
	assert_eq!(received, message);
}

#[tokio::test]
async fn test_receiver_forwards_frames_in_order() {
	let (parts, mut browser) = socket_pair().await;
	let TransportParts {
		mut receiver,
		mut message_rx,
		..
	} = parts;
	let read_task = tokio::spawn(async move { receiver.run().await });

	let messages = vec![
		serde_json::json!({"id": 1, "result": {}}),
		serde_json::json!({"method": "Page.frameStartedLoading", "params": {"frameId": "F"}}),
		serde_json::json!({"id": 2, "result": {"data": "x".repeat(100_000)}}),
	];
	for msg in &messages {
		browser.send(WsMessage::Text(msg.to_string())).await.unwrap();
	}

	for expected in &messages {
		assert_eq!(&message_rx.recv().await.unwrap(), expected);
	}

	browser.close(None).await.unwrap();
	assert!(read_task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_receiver_skips_garbage_frames() {
	let (parts, mut browser) = socket_pair().await;
	let TransportParts {
		mut receiver,
		mut message_rx,
		..
	} = parts;
	let read_task = tokio::spawn(async move { receiver.run().await });

	browser.send(WsMessage::Text("not json".to_string())).await.unwrap();
	browser.send(WsMessage::Text(r#"{"id": 7, "result": {}}"#.to_string())).await.unwrap();

	assert_eq!(message_rx.recv().await.unwrap()["id"], 7);

	drop(browser);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_receiver_stops_when_consumer_dropped() {
	let (parts, mut browser) = socket_pair().await;
	let TransportParts {
		mut receiver, message_rx, ..
	} = parts;
	drop(message_rx);

	let read_task = tokio::spawn(async move { receiver.run().await });
	browser.send(WsMessage::Text(r#"{"id": 1, "result": {}}"#.to_string())).await.unwrap();

	assert!(read_task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_connect_to_unreachable_endpoint_fails() {
	let err = WebSocketTransport::connect("ws://127.0.0.1:1/devtools/browser").await.err().unwrap();
	assert!(matches!(err, Error::ConnectionFailed(_)), "got {err:?}");
}
