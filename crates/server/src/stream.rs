//! The live sync stream — server-sent events over tiny_http.
//!
//! One connection per active editor. The response body is an endless
//! reader that pulls events from a change feed and yields SSE frames;
//! tiny_http streams it chunked. When the client disconnects the write
//! fails, the response drops, and dropping the feed tears down the
//! filesystem watch.

use std::collections::VecDeque;
use std::io::Read;
use std::time::Duration;

use serde_json::{json, Value};
use tiny_http::{Header, Request, Response, StatusCode};
use tracing::{debug, warn};

use cs_store::WorkspacePaths;
use cs_sync::{ChangeFeed, FeedEvent, FsChangeFeed};

/// Quiet connections get a comment frame at this interval, so a dead
/// client is detected by the next write instead of never.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Serve one stream connection. Blocks the calling thread until the
/// consumer disconnects.
pub fn serve_stream(request: Request, paths: WorkspacePaths) {
    let feed = match FsChangeFeed::new(paths) {
        Ok(feed) => feed,
        Err(error) => {
            warn!(%error, "failed to start change feed for stream");
            let response = Response::from_string("stream unavailable").with_status_code(500);
            let _ = request.respond(response);
            return;
        }
    };

    let headers = vec![
        header("Content-Type", "text/event-stream"),
        header("Cache-Control", "no-cache"),
        header("Connection", "keep-alive"),
    ];
    let response = Response::new(
        StatusCode(200),
        headers,
        SseReader::new(feed),
        None,
        None,
    );
    // Blocks until the client goes away; feed teardown rides the drop.
    let _ = request.respond(response);
    debug!("stream consumer disconnected");
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("static header")
}

/// Endless reader yielding SSE frames from a change feed.
struct SseReader<F: ChangeFeed> {
    feed: F,
    pending: VecDeque<u8>,
}

impl<F: ChangeFeed> SseReader<F> {
    fn new(feed: F) -> Self {
        Self {
            feed,
            pending: VecDeque::new(),
        }
    }
}

impl<F: ChangeFeed> Read for SseReader<F> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.pending.is_empty() {
            match self.feed.next_event(KEEPALIVE_INTERVAL) {
                Some(event) => self.pending.extend(format_frame(&event).into_bytes()),
                None => self.pending.extend(b": keep-alive\n\n"),
            }
        }
        let mut written = 0;
        while written < buf.len() {
            match self.pending.pop_front() {
                Some(byte) => {
                    buf[written] = byte;
                    written += 1;
                }
                None => break,
            }
        }
        Ok(written)
    }
}

/// Format one feed event as an SSE frame.
pub fn format_frame(event: &FeedEvent) -> String {
    match event {
        FeedEvent::Connected => sse_frame("connected", &json!({"status": "ready"})),
        FeedEvent::SnapshotUpdate(document) => {
            // the stream carries only what consumers reconcile against
            let payload = json!({
                "tracks": document.get("tracks").cloned().unwrap_or_else(|| json!([])),
                "project": document.get("project").cloned().unwrap_or(Value::Null),
            });
            sse_frame("snapshot_update", &payload)
        }
        FeedEvent::Update(value) => sse_frame("update", value),
    }
}

fn sse_frame(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}
