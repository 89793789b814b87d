//! # Session
//!
//! State shared by both directions of one tunnel.

use std::net::SocketAddr;
use tomato_protocol::unix_timestamp;

use super::peer::{PeerPolicy, PeerState, SharedPeer};

/// Wall clock in unix seconds
pub type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

pub struct Session {
    pub peer: SharedPeer,
    /// Emit one log line per frame sent, received or dropped
    pub trace: bool,
    clock: Clock,
}

impl Session {
    pub fn new(peer_addr: SocketAddr, policy: PeerPolicy, trace: bool) -> Self {
        Self::with_clock(peer_addr, policy, trace, Box::new(unix_timestamp))
    }

    pub fn with_clock(peer_addr: SocketAddr, policy: PeerPolicy, trace: bool, clock: Clock) -> Self {
        Session {
            peer: SharedPeer::new(PeerState::new(peer_addr, policy)),
            trace,
            clock,
        }
    }

    #[inline]
    pub fn now(&self) -> u64 {
        (self.clock)()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer", &self.peer)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}
