//! This crate contains the logging setup shared by the binaries of the
//! workspace: tracing subscriber initialization and a panic hook that routes
//! panic messages through `tracing`.
pub mod config;
pub mod panic_hook;
pub mod tracing;

pub use config::Config;
