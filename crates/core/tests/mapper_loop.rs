//! The stdio loop: NDJSON in, NDJSON out, CDP events interleaved.

mod common;

use bidi_runtime::ConnectionEvent;
use common::{CLIENT, Harness, attached};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

struct Client {
	lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
	writer: WriteHalf<DuplexStream>,
}

impl Client {
	async fn send(&mut self, line: &str) {
		self.writer.write_all(line.as_bytes()).await.unwrap();
		self.writer.write_all(b"\n").await.unwrap();
	}

	async fn recv(&mut self) -> Value {
		let line = self.lines.next_line().await.unwrap().expect("mapper closed its output");
		serde_json::from_str(&line).unwrap()
	}
}

fn start(h: &Harness) -> (Client, mpsc::UnboundedSender<ConnectionEvent>, tokio::task::JoinHandle<bidi_mapper::Result<()>>) {
	// The loop registers its own stdio client.
	h.mapper.disconnect_client(CLIENT);

	let (client_io, mapper_io) = tokio::io::duplex(64 * 1024);
	let (mapper_read, mapper_write) = tokio::io::split(mapper_io);
	let (client_read, client_write) = tokio::io::split(client_io);
	let (events_tx, events_rx) = mpsc::unbounded_channel();

	let mapper = std::sync::Arc::clone(&h.mapper);
	let task = tokio::spawn(async move { mapper.run(events_rx, BufReader::new(mapper_read), mapper_write).await });

	let client = Client {
		lines: BufReader::new(client_read).lines(),
		writer: client_write,
	};
	(client, events_tx, task)
}

#[tokio::test]
async fn test_round_trip_over_ndjson() {
	let h = Harness::new();
	let (mut client, events, task) = start(&h);

	client
		.send(r#"{"id": 1, "method": "session.subscribe", "params": {"events": ["browsingContext.contextCreated"]}}"#)
		.await;
	assert_eq!(client.recv().await, json!({"type": "success", "id": 1, "result": {}}));

	events
		.send(ConnectionEvent {
			session_id: None,
			event: attached("A", "S-A", "page"),
		})
		.unwrap();
	assert_eq!(
		client.recv().await,
		json!({
			"type": "event",
			"method": "browsingContext.contextCreated",
			"params": {"context": "A", "url": "about:blank", "children": null, "parent": null},
		})
	);

	client.send("not json").await;
	let error = client.recv().await;
	assert_eq!(error["type"], "error");
	assert_eq!(error["id"], Value::Null);
	assert_eq!(error["error"], "invalid argument");

	client.send("   ").await;
	client
		.send(r#"{"id": 2, "method": "browsingContext.getTree", "params": {}}"#)
		.await;
	let tree = client.recv().await;
	assert_eq!(tree["id"], 2);
	assert_eq!(tree["result"]["contexts"][0]["context"], "A");

	client.writer.shutdown().await.unwrap();
	task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_loop_ends_when_cdp_connection_closes() {
	let h = Harness::new();
	let (_client, events, task) = start(&h);

	drop(events);
	task.await.unwrap().unwrap();
	assert!(!h.mapper.state().events.send(CLIENT, bidi_protocol::OutgoingMessage::success(1, json!({}))));
}
