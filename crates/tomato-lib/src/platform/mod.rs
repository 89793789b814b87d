//! # Platform Module
//!
//! Platform-specific implementations with conditional compilation.

pub mod memory;

#[cfg(unix)]
pub mod unix;

#[cfg(unix)]
pub use unix::{bind_udp, TunDevice};
