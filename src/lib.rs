pub mod browser;
pub mod commands;
pub mod config;
pub mod invite;
pub mod logging;
pub mod output;
pub mod quiz;
pub mod scoring;
pub mod stderr_buffer;
pub mod store;
pub mod tui;
