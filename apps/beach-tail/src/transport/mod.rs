pub mod sse;

pub use sse::{SseSubscription, SseTransport, DEFAULT_RETRY};
