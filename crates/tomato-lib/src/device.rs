//! # Device Traits
//!
//! The two blocking resources the tunnel loops are written against.

use std::io;
use std::net::SocketAddr;

/// Virtual interface carrying raw network-layer packets
pub trait PacketDevice: Send + Sync {
    /// Block until one packet is available; return its length
    fn recv_packet(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Inject one packet; return the number of bytes written
    fn send_packet(&self, packet: &[u8]) -> io::Result<usize>;
}

/// Bound datagram endpoint
pub trait DatagramSocket: Send + Sync {
    fn send_datagram(&self, datagram: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Block until one datagram arrives; return its length and source
    fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}
