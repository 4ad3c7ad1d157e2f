pub mod arguments;
pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod dependencies;
pub mod deployment;
pub mod http_client;
pub mod manifest;
pub mod run;

pub use run::run;
