//! Tail Stream: the live-log core shared by Beach log viewers.
//!
//! Responsibilities:
//! - owning exactly one server-push subscription and its reconnect/terminate policy
//! - decoding inbound events into renderer-ready lines
//! - appending lines to a host surface without fighting a user who scrolled away
//!
//! The transport and the rendering surface are capabilities handed in by the host
//! (see [`Transport`] and [`SurfaceHost`]); nothing here performs I/O on its own.

pub mod config;
pub mod controller;
pub mod decode;
pub mod event;
pub mod mock;
pub mod render;

pub use config::{ErrorStatus, StreamConfig, DEFAULT_FOLLOW_THRESHOLD};
pub use controller::{StartError, StreamController, Subscription, Transport};
pub use decode::DecodeError;
pub use event::{ConnectionState, DecodedLine, StreamEvent, StyleHint, BASE64_EVENT};
pub use render::{Renderer, ScrollBehavior, Surface, SurfaceHost, ViewState};
