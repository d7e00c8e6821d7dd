#![allow(dead_code)]

use futures::channel::mpsc as frame_channel;
use futures::future::BoxFuture;
use futures::{FutureExt, Sink, SinkExt, StreamExt, sink};
use queue_realtime_rs::websocket::{Transport, TransportFactory};
use queue_realtime_rs::{FeedClientBuilder, FeedClientOptions, RealtimeError, RealtimeFeedClient, Result};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, Sleep};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// What the next open attempt does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Fail,
    Open,
    /// Opens, but the close handshake takes [`SLOW_CLOSE`]
    OpenSlowClose,
}

pub const SLOW_CLOSE: Duration = Duration::from_secs(1);

/// Write half that accepts everything and takes a while to close
#[derive(Default)]
struct SlowCloseSink {
    closing: Option<Pin<Box<Sleep>>>,
}

impl Sink<Message> for SlowCloseSink {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, _item: Message) -> std::result::Result<(), WsError> {
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        let closing = self
            .get_mut()
            .closing
            .get_or_insert_with(|| Box::pin(time::sleep(SLOW_CLOSE)));
        closing.as_mut().poll(cx).map(Ok)
    }
}

type FrameSender = frame_channel::UnboundedSender<std::result::Result<Message, WsError>>;

struct Inner {
    script: VecDeque<Outcome>,
    attempts: Vec<Instant>,
    feeds: Vec<FrameSender>,
}

/// Transport factory that follows a script and records every attempt.
/// Attempts beyond the script fail.
#[derive(Clone)]
pub struct ScriptedFactory {
    inner: Arc<Mutex<Inner>>,
    attempt_count: Arc<watch::Sender<usize>>,
}

impl ScriptedFactory {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> Self {
        let (attempt_count, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                script: script.into_iter().collect(),
                attempts: Vec::new(),
                feeds: Vec::new(),
            })),
            attempt_count: Arc::new(attempt_count),
        }
    }

    /// Factory whose every attempt fails
    pub fn failing() -> Self {
        Self::new(std::iter::empty::<Outcome>())
    }

    pub fn attempts(&self) -> usize {
        self.inner.lock().unwrap().attempts.len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.inner.lock().unwrap().attempts.clone()
    }

    pub async fn wait_for_attempts(&self, count: usize) {
        let mut rx = self.attempt_count.subscribe();
        rx.wait_for(|attempts| *attempts >= count).await.unwrap();
    }

    fn latest_feed(&self) -> FrameSender {
        self.inner
            .lock()
            .unwrap()
            .feeds
            .last()
            .cloned()
            .expect("no transport has been opened")
    }

    pub fn send_frame(&self, frame: Message) {
        self.latest_feed().unbounded_send(Ok(frame)).unwrap();
    }

    pub fn send_text(&self, text: &str) {
        self.send_frame(Message::text(text.to_owned()));
    }

    /// Ends the read stream of the latest transport, as a dropped network would
    pub fn drop_connection(&self) {
        let feed = self.inner.lock().unwrap().feeds.pop();
        if let Some(feed) = feed {
            feed.close_channel();
        }
    }
}

impl TransportFactory for ScriptedFactory {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<Transport>> {
        let mut inner = self.inner.lock().unwrap();
        inner.attempts.push(Instant::now());
        let outcome = inner.script.pop_front().unwrap_or(Outcome::Fail);

        let result = match outcome {
            Outcome::Fail => Err(RealtimeError::TransportOpen(format!(
                "connection refused: {}",
                url
            ))),
            Outcome::Open => {
                let (tx, rx) = frame_channel::unbounded();
                inner.feeds.push(tx);
                let sink = sink::drain::<Message>()
                    .sink_map_err(|never: Infallible| -> WsError { match never {} });
                Ok(Transport::new(Box::pin(sink), rx.boxed()))
            }
            Outcome::OpenSlowClose => {
                let (tx, rx) = frame_channel::unbounded();
                inner.feeds.push(tx);
                Ok(Transport::new(Box::pin(SlowCloseSink::default()), rx.boxed()))
            }
        };

        let count = inner.attempts.len();
        drop(inner);
        self.attempt_count.send_replace(count);

        async move { result }.boxed()
    }
}

pub fn client_with(factory: &ScriptedFactory) -> RealtimeFeedClient {
    client_with_options(factory, FeedClientOptions::default())
}

pub fn client_with_options(factory: &ScriptedFactory, options: FeedClientOptions) -> RealtimeFeedClient {
    FeedClientBuilder::new("ws://queue.test/ws")
        .unwrap()
        .options(options)
        .transport(factory.clone())
        .build()
}

pub fn gaps(times: &[Instant]) -> Vec<Duration> {
    times.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

pub fn assert_delay(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(5),
        "expected a delay of {:?}, got {:?}",
        expected,
        actual
    );
}

pub fn queue_update(department_id: i64, queue_len: usize) -> String {
    let queue: Vec<serde_json::Value> = (0..queue_len)
        .map(|i| serde_json::json!({ "id": i + 1, "status": "waiting" }))
        .collect();
    serde_json::json!({
        "type": "queue_update",
        "department_id": department_id,
        "queue": queue,
    })
    .to_string()
}
