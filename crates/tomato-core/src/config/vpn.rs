//! # Tunnel Configuration
//!
//! TOML configuration for one point-to-point tunnel.

use super::common::*;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;
use tomato_protocol::IFNAMSIZ;

/// Environment fallbacks for the passwords
pub const LOCAL_PASSWORD_ENV: &str = "TOMATO_LOCAL_PASSWORD";
pub const PEER_PASSWORD_ENV: &str = "TOMATO_PEER_PASSWORD";

/// Tunnel configuration
#[derive(Debug, Default, Deserialize)]
pub struct VpnConfig {
    #[serde(default)]
    pub tunnel: TunnelSection,
    #[serde(default)]
    pub crypto: CryptoSection,
    #[serde(default)]
    pub tun: TunSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct TunnelSection {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_local_addr")]
    pub local: String,
    #[serde(default)]
    pub peer: Option<String>,
    /// Seconds a frame timestamp may differ from the local clock
    #[serde(default = "default_packet_valid_time")]
    pub packet_valid_time: u64,
    /// Seconds without inbound contact before a roaming endpoint pauses
    #[serde(default = "default_address_valid_time")]
    pub address_valid_time: u64,
    /// Learn the peer address from authenticated frames
    #[serde(default)]
    pub roaming: bool,
}

impl Default for TunnelSection {
    fn default() -> Self {
        TunnelSection {
            interface: default_interface(),
            local: default_local_addr(),
            peer: None,
            packet_valid_time: default_packet_valid_time(),
            address_valid_time: default_address_valid_time(),
            roaming: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CryptoSection {
    #[serde(default)]
    pub local_password: Option<String>,
    #[serde(default)]
    pub peer_password: Option<String>,
}

impl CryptoSection {
    pub fn local_password(&self) -> Result<String, ConfigError> {
        Self::lookup(&self.local_password, LOCAL_PASSWORD_ENV)
            .ok_or(ConfigError::MissingPassword("local", LOCAL_PASSWORD_ENV))
    }

    pub fn peer_password(&self) -> Result<String, ConfigError> {
        Self::lookup(&self.peer_password, PEER_PASSWORD_ENV)
            .ok_or(ConfigError::MissingPassword("peer", PEER_PASSWORD_ENV))
    }

    fn lookup(value: &Option<String>, env: &str) -> Option<String> {
        value.clone().or_else(|| std::env::var(env).ok())
    }
}

/// Optional link setup applied after the device is created
#[derive(Debug, Deserialize)]
pub struct TunSection {
    #[serde(default)]
    pub mtu: Option<u16>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_prefix_v4")]
    pub prefix: u8,
}

impl TunSection {
    /// Any link setup requested; the link is brought up after it
    pub fn wants_link_setup(&self) -> bool {
        self.mtu.is_some() || self.address.is_some()
    }
}

impl Default for TunSection {
    fn default() -> Self {
        TunSection {
            mtu: None,
            address: None,
            prefix: default_prefix_v4(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Per-frame trace lines
    #[serde(default)]
    pub trace: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            level: default_log_level(),
            trace: false,
        }
    }
}

impl VpnConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Check values that cannot be caught by the parser
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.tunnel.interface;
        if name.is_empty() || name.len() >= IFNAMSIZ || name.contains('\0') {
            return Err(ConfigError::InvalidInterface(name.clone()));
        }
        if self.tunnel.peer.is_none() {
            return Err(ConfigError::MissingPeer);
        }
        if self.tunnel.packet_valid_time == 0 {
            return Err(ConfigError::InvalidValue(
                "packet_valid_time must be at least 1 second".into(),
            ));
        }
        if self.tunnel.roaming && self.tunnel.address_valid_time == 0 {
            return Err(ConfigError::InvalidValue(
                "address_valid_time must be at least 1 second with roaming".into(),
            ));
        }
        if self.tun.prefix > 32 {
            return Err(ConfigError::InvalidValue(format!(
                "IPv4 prefix {} out of range",
                self.tun.prefix
            )));
        }
        Ok(())
    }

    /// Address to bind.
    ///
    /// A bare `:port` takes the unspecified address of the peer's family,
    /// so an IPv6 peer gets an IPv6 socket.
    pub fn local_addr(&self) -> Result<SocketAddr, ConfigError> {
        let Some(port) = wildcard_port(&self.tunnel.local) else {
            return resolve_udp_addr(&self.tunnel.local);
        };
        let ip = match self.tunnel.peer.as_deref().map(resolve_udp_addr) {
            Some(Ok(peer)) if peer.is_ipv6() => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            _ => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        Ok(SocketAddr::new(ip, port))
    }

    /// Peer address, resolved once, in a family the local socket can reach
    pub fn peer_addr(&self) -> Result<SocketAddr, ConfigError> {
        let peer = self.tunnel.peer.as_deref().ok_or(ConfigError::MissingPeer)?;
        resolve_udp_addr_for(peer, &self.local_addr()?)
    }

    pub fn tun_ipv4(&self) -> Result<Option<Ipv4Addr>, ConfigError> {
        match &self.tun.address {
            Some(addr) => addr
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidAddress(addr.clone())),
            None => Ok(None),
        }
    }
}

/// Generate example tunnel config
pub fn example_config() -> &'static str {
    r#"# tomato VPN Configuration
# Usage: sudo tomato vpn -c tomato.toml
#
# Both ends use the same layout with addresses and passwords swapped.

[tunnel]
interface = "tun0"
local = ":1080"
peer = "vpn.example.com:1080"
packet_valid_time = 10
address_valid_time = 60
# Learn the peer address from authenticated frames (server side)
roaming = false

[crypto]
# Encrypts what this end sends; the peer uses it as its peer_password
local_password = "CHANGE_ME_LOCAL"
# Decrypts what the peer sends
peer_password = "CHANGE_ME_PEER"

# ─────────────────────────────────────────────────────────────────────────────
# Link setup (optional)
# ─────────────────────────────────────────────────────────────────────────────
[tun]
# mtu = 1400
# address = "10.8.0.1"
prefix = 24

[logging]
level = "info"
trace = false
"#
}
