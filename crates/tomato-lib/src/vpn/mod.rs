//! # Tunnel
//!
//! Wiring for one point-to-point tunnel: two threads, one per direction,
//! sharing a `Session`.
//!
//! ```text
//!   TUN ──read──▶ [sender]   ──seal(local key)──▶ UDP ──▶ peer
//!   TUN ◀─write── [receiver] ◀─open(peer key)──── UDP ◀── peer
//!                      └──── SharedPeer (mutex) ────┘
//! ```

mod peer;
mod receiver;
mod sender;
mod session;

pub use peer::{same_endpoint, Acceptance, PeerPolicy, PeerState, SharedPeer};
pub use receiver::run_receiver;
pub use sender::run_sender;
pub use session::{Clock, Session};

use std::io;
use std::net::UdpSocket;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use tomato_core::{FrameCipher, VpnConfig};
use tomato_protocol::{Result, VpnError};

use crate::device::{DatagramSocket, PacketDevice};
use crate::platform::{bind_udp, TunDevice};

/// Keys for both directions
pub struct TunnelKeys {
    /// Seals outbound frames
    pub local: FrameCipher,
    /// Opens inbound frames
    pub peer: FrameCipher,
}

impl TunnelKeys {
    pub fn from_passwords(local: &str, peer: &str) -> Self {
        TunnelKeys {
            local: FrameCipher::from_password(local),
            peer: FrameCipher::from_password(peer),
        }
    }
}

/// A fully opened tunnel, ready to run
pub struct Tunnel {
    device: Arc<TunDevice>,
    socket: Arc<UdpSocket>,
    keys: TunnelKeys,
    session: Arc<Session>,
}

impl Tunnel {
    /// Resolve addresses, bind the socket, open the interface, derive keys.
    ///
    /// Every failure here is a configuration error.
    pub fn open(cfg: &VpnConfig) -> Result<Self> {
        let config_err = |e: tomato_core::ConfigError| VpnError::Config(e.to_string());

        cfg.validate().map_err(config_err)?;
        let local_addr = cfg.local_addr().map_err(config_err)?;
        let peer_addr = cfg.peer_addr().map_err(config_err)?;
        let local_password = cfg.crypto.local_password().map_err(config_err)?;
        let peer_password = cfg.crypto.peer_password().map_err(config_err)?;
        let tun_ipv4 = cfg.tun_ipv4().map_err(config_err)?;

        let device = TunDevice::open(&cfg.tunnel.interface)?;
        if let Some(mtu) = cfg.tun.mtu {
            device.set_mtu(mtu)?;
        }
        if let Some(addr) = tun_ipv4 {
            device.set_ipv4_address(addr, cfg.tun.prefix)?;
        }
        if cfg.tun.wants_link_setup() {
            device.bring_up()?;
        } else {
            log::info!("No [tun] setup requested, leaving {} as configured", device.name());
        }

        let socket = bind_udp(local_addr)?;

        let policy = PeerPolicy {
            packet_valid_secs: cfg.tunnel.packet_valid_time,
            address_valid_secs: cfg.tunnel.address_valid_time,
            roaming: cfg.tunnel.roaming,
        };
        log::info!(
            "Tunnel {} <-> {} via {} (roaming: {})",
            local_addr,
            peer_addr,
            device.name(),
            if policy.roaming { "on" } else { "off" }
        );

        Ok(Tunnel {
            device: Arc::new(device),
            socket: Arc::new(socket),
            keys: TunnelKeys::from_passwords(&local_password, &peer_password),
            session: Arc::new(Session::new(peer_addr, policy, cfg.logging.trace)),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run both directions; returns when the first of them fails
    pub fn run(self) -> Result<()> {
        run_loops(self.device, self.socket, self.keys, self.session)
    }
}

/// Reports a direction's exit, including exit by panic
struct ExitNotice {
    direction: &'static str,
    tx: Option<Sender<(&'static str, Result<()>)>>,
}

impl ExitNotice {
    fn report(mut self, result: Result<()>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send((self.direction, result));
        }
    }
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let panicked = io::Error::new(io::ErrorKind::Other, "thread panicked");
            let _ = tx.send((self.direction, Err(panicked.into())));
        }
    }
}

/// Start the sender and receiver threads and wait for the first to stop.
///
/// The remaining thread stays blocked in its read; the caller is expected
/// to end the process.
pub fn run_loops<D, S>(
    device: Arc<D>,
    socket: Arc<S>,
    keys: TunnelKeys,
    session: Arc<Session>,
) -> Result<()>
where
    D: PacketDevice + 'static,
    S: DatagramSocket + 'static,
{
    let (tx, rx) = mpsc::channel();
    let TunnelKeys { local, peer } = keys;

    {
        let notice = ExitNotice {
            direction: "sender",
            tx: Some(tx.clone()),
        };
        let (device, socket, session) = (Arc::clone(&device), Arc::clone(&socket), Arc::clone(&session));
        thread::Builder::new()
            .name("tomato-sender".into())
            .spawn(move || notice.report(run_sender(&*device, &*socket, &local, &session)))?;
    }

    {
        let notice = ExitNotice {
            direction: "receiver",
            tx: Some(tx),
        };
        thread::Builder::new()
            .name("tomato-receiver".into())
            .spawn(move || notice.report(run_receiver(&*device, &*socket, &peer, &session)))?;
    }

    let (direction, result) = rx
        .recv()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "tunnel threads vanished"))?;

    match &result {
        Ok(()) => log::warn!("{} stopped", direction),
        Err(e) => log::error!("{} stopped: {}", direction, e),
    }
    result
}
