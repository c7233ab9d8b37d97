pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod queue;
pub mod telemetry;
