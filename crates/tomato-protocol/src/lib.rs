//! # tomato-protocol
//!
//! Protocol types and definitions for the tomato tunnel.
//!
//! This crate provides:
//! - Wire constants (frame layout, size limits, timing defaults)
//! - Error types for all tunnel operations
//! - The plaintext frame header
//! - Anti-replay frontier

mod constants;
mod error;
mod frame;
mod replay;

pub use constants::*;
pub use error::{CryptoError, NetworkError, ProtocolError, Result, TunError, VpnError};
pub use frame::{Frame, FrameHeader};
pub use replay::{time_delta, unix_timestamp, ReplayFrontier};
