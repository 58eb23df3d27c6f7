//! Scripted engine for client tests.
//!
//! [`FakeEngine`] holds the engine end of an in-memory duplex stream and
//! speaks newline-delimited JSON, so tests can read the client's requests,
//! answer them in any order and interleave push documents.

use std::time::Duration;

use parley_schema::{JsonValue, TOKEN_KEY, TYPE_KEY};
use serde_json::json;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Returns the client end of the channel and the engine driving the other.
pub fn channel() -> (DuplexStream, FakeEngine) {
    channel_with_capacity(64 * 1024)
}

/// Like [`channel`], buffering at most `bytes` in each direction. A small
/// capacity makes the client's writes block until the engine reads.
pub fn channel_with_capacity(bytes: usize) -> (DuplexStream, FakeEngine) {
    let (client, engine) = tokio::io::duplex(bytes);
    (client, FakeEngine::new(engine))
}

pub struct FakeEngine {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeEngine {
    pub fn new(stream: DuplexStream) -> Self {
        let (read, writer) = tokio::io::split(stream);
        Self { lines: BufReader::new(read).lines(), writer }
    }

    /// Next request written by the client, or `None` once it hung up.
    pub async fn next_request(&mut self) -> Option<JsonValue> {
        let line = tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("client wrote nothing within 5s")
            .expect("engine read")?;
        Some(serde_json::from_str(&line).expect("client wrote invalid JSON"))
    }

    pub async fn expect_request(&mut self) -> JsonValue {
        self.next_request().await.expect("client closed the channel")
    }

    /// Writes one raw line, unchecked.
    pub async fn send_raw(&mut self, line: &str) {
        self.send_bytes(line.as_bytes()).await;
    }

    /// Writes one line of arbitrary bytes, which need not be UTF-8.
    pub async fn send_bytes(&mut self, line: &[u8]) {
        self.writer.write_all(line).await.expect("engine write");
        self.writer.write_all(b"\n").await.expect("engine write");
        self.writer.flush().await.expect("engine flush");
    }

    pub async fn send(&mut self, document: &JsonValue) {
        self.send_raw(&document.to_string()).await;
    }

    /// Answers `request` with a `discriminant` document carrying its token.
    pub async fn reply(&mut self, request: &JsonValue, discriminant: &str, fields: JsonValue) {
        let mut document = match fields {
            JsonValue::Object(fields) => fields,
            JsonValue::Null => Default::default(),
            other => panic!("reply fields must be an object, got {other}"),
        };
        document.insert(TYPE_KEY.to_owned(), json!(discriminant));
        document.insert(TOKEN_KEY.to_owned(), token_of(request));
        self.send(&JsonValue::Object(document)).await;
    }

    pub async fn reply_error(&mut self, request: &JsonValue, code: i32, message: &str) {
        self.reply(request, "error", json!({ "code": code, "message": message })).await;
    }

    /// Closes the engine side; the client sees end of stream.
    pub async fn hang_up(mut self) {
        let _ = self.writer.shutdown().await;
    }
}

pub fn token_of(request: &JsonValue) -> JsonValue {
    request.get(TOKEN_KEY).cloned().expect("request carries no correlation token")
}
