pub mod app;
pub mod cli;
pub mod telemetry;
pub mod transport;
pub mod view;
