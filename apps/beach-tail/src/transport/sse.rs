use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest_eventsource::{retry::Constant, Event, EventSource, ReadyState};
use tail_stream::{ConnectionState, StreamEvent, Subscription, Transport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Reconnection delay browsers use when the server does not send `retry:`.
pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);

/// Server-sent events over HTTP.
///
/// Must be used from within a Tokio runtime; each subscription owns one task.
#[derive(Debug, Clone)]
pub struct SseTransport {
    http: reqwest::Client,
    origin: Option<Url>,
    retry: Duration,
}

impl SseTransport {
    pub fn new(origin: Option<Url>, retry: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            origin,
            retry,
        }
    }

    /// Resolves `endpoint` against the origin when it is not already absolute.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        match Url::parse(endpoint) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.origin {
                Some(origin) => origin.join(endpoint),
                None => Err(url::ParseError::RelativeUrlWithoutBase),
            },
            Err(err) => Err(err),
        }
    }
}

impl Transport for SseTransport {
    type Subscription = SseSubscription;

    fn subscribe(&mut self, endpoint: &str) -> SseSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(state_code(ConnectionState::Connecting)));

        let url = match self.resolve(endpoint) {
            Ok(url) => url,
            Err(err) => {
                warn!(target: "tail.sse", endpoint, error = %err, "cannot resolve event source url");
                return SseSubscription::failed(tx, rx, state);
            }
        };
        let mut source = match EventSource::new(self.http.get(url.clone())) {
            Ok(source) => source,
            Err(err) => {
                warn!(target: "tail.sse", %url, error = %err, "cannot build event source request");
                return SseSubscription::failed(tx, rx, state);
            }
        };
        source.set_retry_policy(Box::new(Constant::new(self.retry, None)));

        info!(target: "tail.sse", %url, "subscribing");
        let task = tokio::spawn(pump(source, tx, state.clone()));
        SseSubscription {
            rx,
            state,
            task: Some(task),
        }
    }
}

async fn pump(
    mut source: EventSource,
    tx: mpsc::UnboundedSender<StreamEvent>,
    state: Arc<AtomicU8>,
) {
    while let Some(item) = source.next().await {
        let current = connection_state(source.ready_state());
        state.store(state_code(current), Ordering::Release);
        let event = match item {
            Ok(Event::Open) => StreamEvent::Open,
            Ok(Event::Message(message)) => {
                debug!(target: "tail.sse", event = %message.event, id = %message.id, "message");
                StreamEvent::from_named(&message.event, message.data)
            }
            Err(err) => {
                warn!(target: "tail.sse", error = %err, state = %current, "event source error");
                StreamEvent::Error { state: current }
            }
        };
        if tx.send(event).is_err() {
            source.close();
            return;
        }
    }
    // The stream only ends once the retry policy gives up or the source closes.
    state.store(state_code(ConnectionState::Closed), Ordering::Release);
    let _ = tx.send(StreamEvent::Error {
        state: ConnectionState::Closed,
    });
}

/// Handle to one event-source connection.
///
/// Closing (or dropping) the handle aborts the pump task, which closes the
/// HTTP connection.
#[derive(Debug)]
pub struct SseSubscription {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    state: Arc<AtomicU8>,
    task: Option<JoinHandle<()>>,
}

impl SseSubscription {
    fn failed(
        tx: mpsc::UnboundedSender<StreamEvent>,
        rx: mpsc::UnboundedReceiver<StreamEvent>,
        state: Arc<AtomicU8>,
    ) -> Self {
        state.store(state_code(ConnectionState::Closed), Ordering::Release);
        let _ = tx.send(StreamEvent::Error {
            state: ConnectionState::Closed,
        });
        Self {
            rx,
            state,
            task: None,
        }
    }

    /// Next inbound event; `None` once the connection is gone and drained.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

impl Subscription for SseSubscription {
    fn ready_state(&self) -> ConnectionState {
        state_from_code(self.state.load(Ordering::Acquire))
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!(target: "tail.sse", "subscription closed");
        }
        self.rx.close();
        self.state
            .store(state_code(ConnectionState::Closed), Ordering::Release);
    }
}

impl Drop for SseSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn connection_state(state: ReadyState) -> ConnectionState {
    match state {
        ReadyState::Connecting => ConnectionState::Connecting,
        ReadyState::Open => ConnectionState::Open,
        ReadyState::Closed => ConnectionState::Closed,
    }
}

fn state_code(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Connecting => 0,
        ConnectionState::Open => 1,
        ConnectionState::Closed => 2,
    }
}

fn state_from_code(code: u8) -> ConnectionState {
    match code {
        0 => ConnectionState::Connecting,
        1 => ConnectionState::Open,
        _ => ConnectionState::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_endpoints_resolve_against_origin() {
        let origin = Url::parse("http://127.0.0.1:8080/app/").expect("origin");
        let transport = SseTransport::new(Some(origin), DEFAULT_RETRY);
        assert_eq!(
            transport.resolve("/events").expect("resolved").as_str(),
            "http://127.0.0.1:8080/events"
        );
        assert_eq!(
            transport
                .resolve("http://example.com/stream")
                .expect("absolute")
                .as_str(),
            "http://example.com/stream"
        );
    }

    #[test]
    fn relative_endpoint_without_origin_is_an_error() {
        let transport = SseTransport::new(None, DEFAULT_RETRY);
        assert!(transport.resolve("/events").is_err());
    }

    #[tokio::test]
    async fn unresolvable_endpoint_reports_closed_error() {
        let mut transport = SseTransport::new(None, DEFAULT_RETRY);
        let mut subscription = transport.subscribe("/events");
        assert_eq!(subscription.ready_state(), ConnectionState::Closed);
        assert_eq!(
            subscription.recv().await,
            Some(StreamEvent::Error {
                state: ConnectionState::Closed
            })
        );
        assert_eq!(subscription.recv().await, None);
    }

    #[tokio::test]
    async fn close_marks_subscription_closed() {
        let origin = Url::parse("http://127.0.0.1:9").expect("origin");
        let mut transport = SseTransport::new(Some(origin), Duration::from_secs(60));
        let mut subscription = transport.subscribe("/events");
        subscription.close();
        assert_eq!(subscription.ready_state(), ConnectionState::Closed);
    }

    #[test]
    fn failures_are_logged_under_sse_target() {
        use std::sync::Mutex;
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        #[derive(Clone, Default)]
        struct Targets(Arc<Mutex<Vec<String>>>);

        impl<S: tracing::Subscriber> Layer<S> for Targets {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                self.0
                    .lock()
                    .expect("targets lock")
                    .push(event.metadata().target().to_string());
            }
        }

        let targets = Targets::default();
        let subscriber = tracing_subscriber::registry().with(targets.clone());
        tracing::subscriber::with_default(subscriber, || {
            let mut transport = SseTransport::new(None, DEFAULT_RETRY);
            transport.subscribe("/events");
        });
        let seen = targets.0.lock().expect("targets lock").clone();
        assert_eq!(seen, ["tail.sse"]);
    }

    #[test]
    fn state_codes_round_trip() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closed,
        ] {
            assert_eq!(state_from_code(state_code(state)), state);
        }
    }
}
