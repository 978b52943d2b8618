pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod presenter;
pub mod types;

// Application ports/use cases and their infrastructure adapters
pub mod app;
pub mod infra;
