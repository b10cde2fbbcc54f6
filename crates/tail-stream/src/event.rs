use std::fmt;

/// Named event carrying base64-encoded text.
pub const BASE64_EVENT: &str = "base64";

/// Label used for untyped messages that carry no event name.
pub const DEFAULT_EVENT_NAME: &str = "message";

/// Connection state as reported by the transport at the moment of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound traffic from a subscription, consumed by a single dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Open,
    Message { name: Option<String>, data: String },
    Typed { kind: String, data: String },
    Error { state: ConnectionState },
}

impl StreamEvent {
    /// Classifies a raw server-sent event by its name: empty or `message` is an
    /// untyped message, anything else is a typed event.
    pub fn from_named(name: &str, data: impl Into<String>) -> Self {
        let data = data.into();
        if name.is_empty() || name == DEFAULT_EVENT_NAME {
            StreamEvent::Message { name: None, data }
        } else {
            StreamEvent::Typed {
                kind: name.to_string(),
                data,
            }
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            StreamEvent::Open => "open",
            StreamEvent::Message { .. } => DEFAULT_EVENT_NAME,
            StreamEvent::Typed { kind, .. } => kind,
            StreamEvent::Error { .. } => "error",
        }
    }
}

/// Semantic tag for a line; surfaces decide how each one is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleHint {
    Error,
    Success,
}

impl StyleHint {
    pub fn as_str(self) -> &'static str {
        match self {
            StyleHint::Error => "error",
            StyleHint::Success => "success",
        }
    }
}

/// One renderer-ready log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub text: String,
    pub style_hint: Option<StyleHint>,
}

impl DecodedLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style_hint: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style_hint: Some(StyleHint::Error),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style_hint: Some(StyleHint::Success),
        }
    }
}
