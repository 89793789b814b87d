//! # CLI Module
//!
//! Command-line interface for the tunnel.

mod app;
mod commands;
mod output;

pub use app::{exit_with_error, run};
