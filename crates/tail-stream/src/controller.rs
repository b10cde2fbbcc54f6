use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ErrorStatus, StreamConfig};
use crate::decode;
use crate::event::{ConnectionState, DecodedLine, StreamEvent, BASE64_EVENT};
use crate::render::{Renderer, SurfaceHost};

pub const CONNECTED_TEXT: &str = "connected!";
pub const TERMINATED_STATUS: &str = "terminated.";
pub const RECONNECTING_STATUS: &str = "re-connecting";

/// Opens auto-retrying server-push subscriptions.
///
/// Opening never fails from the caller's point of view; problems surface as
/// [`StreamEvent::Error`] on the returned subscription.
pub trait Transport {
    type Subscription: Subscription;

    fn subscribe(&mut self, url: &str) -> Self::Subscription;
}

pub trait Subscription {
    fn ready_state(&self) -> ConnectionState;
    fn close(&mut self);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("no rendering surface with id '{id}'")]
    SurfaceNotFound { id: String },
}

struct Active<Sub, S: crate::render::Surface> {
    config: StreamConfig,
    subscription: Option<Sub>,
    renderer: Renderer<S>,
}

/// Owns one subscription and routes its events to the renderer.
pub struct StreamController<T: Transport, H: SurfaceHost> {
    transport: T,
    host: H,
    active: Option<Active<T::Subscription, H::Surface>>,
}

impl<T: Transport, H: SurfaceHost> StreamController<T, H> {
    pub fn new(transport: T, host: H) -> Self {
        Self {
            transport,
            host,
            active: None,
        }
    }

    /// Binds the target surface and opens a subscription to the configured
    /// endpoint, closing any subscription that is still running.
    pub fn start(&mut self, config: StreamConfig) -> Result<(), StartError> {
        let surface = self
            .host
            .locate(&config.target_container_id)
            .ok_or_else(|| StartError::SurfaceNotFound {
                id: config.target_container_id.clone(),
            })?;

        if self.stop() {
            info!(target: "tail.stream", "replaced active subscription");
        }

        info!(
            target: "tail.stream",
            endpoint = %config.endpoint_url,
            surface = %config.target_container_id,
            close_on_error = config.close_on_error,
            "watching events"
        );
        let subscription = self.transport.subscribe(&config.endpoint_url);
        let renderer = Renderer::new(surface, config.follow_threshold);
        self.active = Some(Active {
            config,
            subscription: Some(subscription),
            renderer,
        });
        Ok(())
    }

    /// Handles one inbound event. Events arriving after a terminal close, or
    /// before `start`, are dropped.
    pub fn dispatch(&mut self, event: StreamEvent) {
        let Some(active) = self.active.as_mut() else {
            debug!(target: "tail.stream", kind = event.kind(), "no subscription; event dropped");
            return;
        };
        if active.subscription.is_none() {
            debug!(target: "tail.stream", kind = event.kind(), "subscription closed; event dropped");
            return;
        }
        debug!(target: "tail.stream", event = ?event, "received");

        let line = match event {
            StreamEvent::Open => DecodedLine::success(CONNECTED_TEXT),
            StreamEvent::Message { name, data } => decode::message_line(name.as_deref(), &data),
            StreamEvent::Typed { kind, data } if kind == BASE64_EVENT => decode::base64_line(&data),
            StreamEvent::Typed { kind, data } => decode::message_line(Some(&kind), &data),
            StreamEvent::Error { state } => active.on_error(state),
        };
        active.renderer.render(line);
    }

    /// Closes the current subscription, if any. Returns whether one was open.
    pub fn stop(&mut self) -> bool {
        match self.active.as_mut().and_then(|active| active.subscription.take()) {
            Some(mut subscription) => {
                subscription.close();
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.subscription.is_some())
    }

    pub fn subscription(&self) -> Option<&T::Subscription> {
        self.active.as_ref()?.subscription.as_ref()
    }

    pub fn subscription_mut(&mut self) -> Option<&mut T::Subscription> {
        self.active.as_mut()?.subscription.as_mut()
    }

    pub fn config(&self) -> Option<&StreamConfig> {
        self.active.as_ref().map(|active| &active.config)
    }
}

impl<Sub: Subscription, S: crate::render::Surface> Active<Sub, S> {
    /// Classifies using the state carried by the event, then applies the
    /// close-on-error policy.
    fn on_error(&mut self, state: ConnectionState) -> DecodedLine {
        let status = if self.config.close_on_error {
            TERMINATED_STATUS
        } else {
            match self.config.error_status {
                ErrorStatus::ConnectionState => state.as_str(),
                ErrorStatus::Phrase => RECONNECTING_STATUS,
            }
        };
        warn!(
            target: "tail.stream",
            endpoint = %self.config.endpoint_url,
            state = %state,
            status,
            "event source failed"
        );
        if self.config.close_on_error {
            if let Some(mut subscription) = self.subscription.take() {
                subscription.close();
            }
            info!(target: "tail.stream", "subscription terminated");
        }
        DecodedLine::error(format!("error: disconnected ({status})"))
    }
}
