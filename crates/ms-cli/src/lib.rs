//! `MindSync` CLI library.
//!
//! Reads calendar exports, loads layered configuration, and renders
//! analyses produced by `ms-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{dirs_config_path, load_config};
