use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{Event as TermEvent, EventStream};
use futures::StreamExt;
use tail_stream::{StartError, StreamConfig, StreamController, StreamEvent, Subscription};
use thiserror::Error;
use tracing::{debug, info};

use crate::transport::SseTransport;
use crate::view::tui::{self, StatusLine, TerminalGuard};
use crate::view::{Panes, PlainSurface, SingleHost};

/// Pane id the full-screen layout registers.
pub const EVENT_PANE: &str = "event-stream";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Start(#[from] StartError),
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

enum Input {
    Stream(Option<StreamEvent>),
    Key(Option<std::io::Result<TermEvent>>),
}

/// Streams rows to stdout until the subscription ends or Ctrl-C.
pub async fn run_plain(transport: SseTransport, config: StreamConfig) -> Result<(), AppError> {
    let surface = Rc::new(RefCell::new(PlainSurface::stdout()));
    let host = SingleHost::new(config.target_container_id.clone(), surface);
    let mut controller = StreamController::new(transport, host);
    controller.start(config)?;

    loop {
        let Some(subscription) = controller.subscription_mut() else {
            break;
        };
        let event = tokio::select! {
            event = subscription.recv() => event,
            _ = tokio::signal::ctrl_c() => None,
        };
        match event {
            Some(event) => controller.dispatch(event),
            None => {
                controller.stop();
            }
        }
    }
    info!(target: "tail.stream", "stream finished");
    Ok(())
}

/// Full-screen viewer: keeps drawing and accepting scroll keys after the
/// subscription terminates, until the user quits.
pub async fn run_tui(transport: SseTransport, config: StreamConfig) -> Result<(), AppError> {
    let mut panes = Panes::new();
    let view = panes.register(EVENT_PANE);
    let mut controller = StreamController::new(transport, panes);
    let endpoint = config.endpoint_url.clone();
    controller.start(config)?;

    let mut guard = TerminalGuard::enter()?;
    let mut keys = EventStream::new();

    loop {
        let status = StatusLine {
            endpoint: endpoint.clone(),
            connection: controller
                .subscription()
                .map(|subscription| subscription.ready_state().to_string())
                .unwrap_or_else(|| "CLOSED".to_string()),
        };
        guard.terminal().draw(|frame| {
            tui::fit(&mut view.borrow_mut(), frame.area());
            tui::draw(frame, &view.borrow(), &status);
        })?;

        let input = match controller.subscription_mut() {
            Some(subscription) => tokio::select! {
                event = subscription.recv() => Input::Stream(event),
                key = keys.next() => Input::Key(key),
            },
            None => Input::Key(keys.next().await),
        };

        match input {
            Input::Stream(Some(event)) => controller.dispatch(event),
            Input::Stream(None) => {
                debug!(target: "tail.stream", "transport channel drained");
                controller.stop();
            }
            Input::Key(Some(Ok(TermEvent::Key(key)))) => {
                if let Some(action) = tui::key_action(key) {
                    if !tui::apply(&mut view.borrow_mut(), action) {
                        break;
                    }
                }
            }
            Input::Key(Some(Ok(_))) => {}
            Input::Key(Some(Err(err))) => return Err(err.into()),
            Input::Key(None) => break,
        }
    }

    controller.stop();
    Ok(())
}
