//! # Console Output
//!
//! Status lines printed by the `tomato` commands.

use console::style;

/// Tunnel is up and about to forward traffic
pub fn print_connected(msg: &str) {
    println!(" {} {}", style("▲").green().bold(), msg);
}

/// A command finished writing something to disk
pub fn print_success(msg: &str) {
    println!(" {} {}", style("✓").green(), msg);
}

/// Fatal diagnostic on stderr, printed right before exit
pub fn print_error(msg: impl std::fmt::Display) {
    eprintln!(" {} {}", style("✗ tomato:").red().bold(), msg);
}
