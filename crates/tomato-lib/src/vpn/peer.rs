//! # Peer State
//!
//! Authoritative peer address and anti-replay frontier, shared by the
//! sender and receiver threads.
//!
//! Every composite read-modify-use sequence goes through `SharedPeer`,
//! which holds the mutex for the whole sequence.

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tomato_protocol::{time_delta, ReplayFrontier};

/// Fixed policy knobs, copied out of the configuration at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerPolicy {
    pub packet_valid_secs: u64,
    pub address_valid_secs: u64,
    pub roaming: bool,
}

/// Same host and port, treating `a.b.c.d` and `::ffff:a.b.c.d` as equal
#[inline]
pub fn same_endpoint(a: &SocketAddr, b: &SocketAddr) -> bool {
    a.port() == b.port() && a.ip().to_canonical() == b.ip().to_canonical()
}

#[derive(Debug, Clone)]
pub struct PeerState {
    addr: SocketAddr,
    frontier: ReplayFrontier,
    /// Local clock of the last accepted frame; 0 until first contact
    last_seen_at: u64,
    address_valid_secs: u64,
    roaming: bool,
}

impl PeerState {
    pub fn new(addr: SocketAddr, policy: PeerPolicy) -> Self {
        PeerState {
            addr,
            frontier: ReplayFrontier::new(policy.packet_valid_secs),
            last_seen_at: 0,
            address_valid_secs: policy.address_valid_secs,
            roaming: policy.roaming,
        }
    }

    #[inline]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[inline]
    pub fn last_seen_at(&self) -> u64 {
        self.last_seen_at
    }

    #[inline]
    pub fn frontier(&self) -> (u64, u32) {
        (self.frontier.last_timestamp(), self.frontier.last_sequence())
    }

    #[inline]
    pub fn is_fresh(&self, timestamp: u64, sequence: u32, now: u64) -> bool {
        self.frontier.is_fresh(timestamp, sequence, now)
    }

    #[inline]
    pub fn mark_accepted(&mut self, timestamp: u64, sequence: u32, now: u64) {
        self.frontier.advance(timestamp, sequence);
        self.last_seen_at = now;
    }

    #[inline]
    pub fn should_roam(&self, source: &SocketAddr) -> bool {
        self.roaming && !same_endpoint(source, &self.addr)
    }

    /// With roaming on, authentication alone decides who the peer is
    #[inline]
    pub fn is_authorized_source(&self, source: &SocketAddr) -> bool {
        self.roaming || same_endpoint(source, &self.addr)
    }

    #[inline]
    pub fn is_paused(&self, now: u64) -> bool {
        self.roaming && time_delta(now, self.last_seen_at) >= self.address_valid_secs
    }
}

/// Outcome of offering an authenticated frame header to the peer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Outside the freshness window or behind the frontier
    Stale,
    /// Frontier advanced; `roamed_from` is the replaced address, if any
    Accepted { roamed_from: Option<SocketAddr> },
}

/// Mutex-guarded `PeerState`
#[derive(Debug)]
pub struct SharedPeer {
    state: Mutex<PeerState>,
}

impl SharedPeer {
    pub fn new(state: PeerState) -> Self {
        SharedPeer {
            state: Mutex::new(state),
        }
    }

    // PeerState holds plain values only, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, PeerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn authorize(&self, source: &SocketAddr) -> bool {
        self.lock().is_authorized_source(source)
    }

    /// Freshness check, frontier advance and roaming as one critical section
    pub fn accept(&self, source: SocketAddr, timestamp: u64, sequence: u32, now: u64) -> Acceptance {
        let mut state = self.lock();
        if !state.is_fresh(timestamp, sequence, now) {
            return Acceptance::Stale;
        }
        state.mark_accepted(timestamp, sequence, now);

        let roamed_from = if state.should_roam(&source) {
            let old = state.addr;
            state.addr = source;
            Some(old)
        } else {
            None
        };
        Acceptance::Accepted { roamed_from }
    }

    /// Where to send right now; `None` while paused
    pub fn outbound_target(&self, now: u64) -> Option<SocketAddr> {
        let state = self.lock();
        if state.is_paused(now) {
            None
        } else {
            Some(state.addr)
        }
    }

    pub fn current_addr(&self) -> SocketAddr {
        self.lock().addr
    }

    pub fn snapshot(&self) -> PeerState {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const NOW: u64 = 1_700_000_000;

    fn policy(roaming: bool) -> PeerPolicy {
        PeerPolicy {
            packet_valid_secs: 10,
            address_valid_secs: 60,
            roaming,
        }
    }

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_anti_replay_monotonicity() {
        let peer = SharedPeer::new(PeerState::new(addr("10.0.0.1:1080"), policy(false)));
        let src = addr("10.0.0.1:1080");

        assert!(matches!(peer.accept(src, NOW, 5, NOW), Acceptance::Accepted { .. }));
        assert_eq!(peer.accept(src, NOW, 5, NOW), Acceptance::Stale);
        assert_eq!(peer.accept(src, NOW, 4, NOW), Acceptance::Stale);
        assert_eq!(peer.accept(src, NOW - 1, 100, NOW), Acceptance::Stale);
        assert!(matches!(peer.accept(src, NOW, 6, NOW), Acceptance::Accepted { .. }));
        assert!(matches!(peer.accept(src, NOW + 1, 0, NOW), Acceptance::Accepted { .. }));
        assert_eq!(peer.snapshot().frontier(), (NOW + 1, 0));
    }

    #[test]
    fn test_stale_leaves_state_unchanged() {
        let peer = SharedPeer::new(PeerState::new(addr("10.0.0.1:1080"), policy(true)));
        let before = peer.snapshot();

        assert_eq!(peer.accept(addr("10.0.0.9:5000"), NOW - 30, 1, NOW), Acceptance::Stale);
        let after = peer.snapshot();
        assert_eq!(after.addr(), before.addr());
        assert_eq!(after.frontier(), before.frontier());
        assert_eq!(after.last_seen_at(), 0);
    }

    #[test]
    fn test_roaming_updates_address() {
        let peer = SharedPeer::new(PeerState::new(addr("10.0.0.1:1080"), policy(true)));
        let new_src = addr("192.0.2.7:40000");

        assert!(peer.authorize(&new_src));
        assert_eq!(
            peer.accept(new_src, NOW, 1, NOW),
            Acceptance::Accepted {
                roamed_from: Some(addr("10.0.0.1:1080"))
            }
        );
        assert_eq!(peer.current_addr(), new_src);

        // Same source again is not a roam
        assert_eq!(
            peer.accept(new_src, NOW, 2, NOW),
            Acceptance::Accepted { roamed_from: None }
        );
    }

    #[test]
    fn test_no_roaming_rejects_foreign_source() {
        let state = PeerState::new(addr("10.0.0.1:1080"), policy(false));
        assert!(state.is_authorized_source(&addr("10.0.0.1:1080")));
        assert!(!state.is_authorized_source(&addr("10.0.0.1:1081")));
        assert!(!state.is_authorized_source(&addr("10.0.0.2:1080")));
        assert!(!state.should_roam(&addr("10.0.0.2:1080")));
    }

    #[test]
    fn test_mapped_ipv4_is_same_endpoint() {
        assert!(same_endpoint(
            &addr("127.0.0.1:9000"),
            &addr("[::ffff:127.0.0.1]:9000")
        ));
        assert!(!same_endpoint(
            &addr("127.0.0.1:9000"),
            &addr("[::ffff:127.0.0.1]:9001")
        ));
        let state = PeerState::new(addr("127.0.0.1:9000"), policy(true));
        assert!(!state.should_roam(&addr("[::ffff:127.0.0.1]:9000")));
    }

    #[test]
    fn test_pause_on_stale_contact() {
        let peer = SharedPeer::new(PeerState::new(addr("10.0.0.1:1080"), policy(true)));
        let src = addr("10.0.0.1:1080");

        // No contact yet
        assert_eq!(peer.outbound_target(NOW), None);

        peer.accept(src, NOW, 1, NOW);
        assert_eq!(peer.outbound_target(NOW + 59), Some(src));
        assert_eq!(peer.outbound_target(NOW + 60), None);

        // A fresh inbound frame resumes sending
        peer.accept(src, NOW + 70, 0, NOW + 70);
        assert_eq!(peer.outbound_target(NOW + 70), Some(src));
    }

    #[test]
    fn test_never_paused_without_roaming() {
        let peer = SharedPeer::new(PeerState::new(addr("10.0.0.1:1080"), policy(false)));
        assert_eq!(peer.outbound_target(NOW), Some(addr("10.0.0.1:1080")));
        assert_eq!(peer.outbound_target(u64::MAX), Some(addr("10.0.0.1:1080")));
    }

    #[test]
    fn test_concurrent_accepts_keep_frontier_strict() {
        let peer = Arc::new(SharedPeer::new(PeerState::new(
            addr("10.0.0.1:1080"),
            policy(false),
        )));
        let src = addr("10.0.0.1:1080");

        // Every thread offers the same 1000 pairs; each pair may win once
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let peer = Arc::clone(&peer);
                thread::spawn(move || {
                    (1..=1000u32)
                        .filter(|&seq| {
                            matches!(peer.accept(src, NOW, seq, NOW), Acceptance::Accepted { .. })
                        })
                        .count()
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(accepted <= 1000);
        assert!(accepted >= 1);
        assert_eq!(peer.snapshot().frontier(), (NOW, 1000));
    }
}
