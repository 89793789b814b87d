//! # Unix Platform Module
//!
//! Linux TUN device and UDP endpoint.

mod network;
mod tun;

pub use network::{bind_udp, SOCKET_BUFFER_SIZE};
pub use tun::TunDevice;
