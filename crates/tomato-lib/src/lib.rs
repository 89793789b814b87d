//! # tomato-lib
//!
//! Tunnel library for the tomato VPN.
//!
//! This crate provides:
//! - Device traits the tunnel loops run against
//! - Platform implementations (Linux TUN, UDP) and an in-memory device
//! - Peer state, the sender and receiver loops, and tunnel wiring

#[cfg(not(unix))]
compile_error!("tomato needs a Unix TUN device");

pub mod device;
pub mod platform;
pub mod vpn;

// Re-export commonly used types
pub use device::{DatagramSocket, PacketDevice};
pub use platform::memory::{ChannelDevice, DeviceHandle};
pub use platform::unix::{bind_udp, TunDevice};
pub use vpn::{
    run_loops, run_receiver, run_sender, Acceptance, PeerPolicy, PeerState, Session, SharedPeer,
    Tunnel, TunnelKeys,
};
