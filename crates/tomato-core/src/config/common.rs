//! # Common Configuration Types
//!
//! Shared configuration errors, defaults and address helpers.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use thiserror::Error;
use tomato_protocol::{DEFAULT_ADDRESS_VALID_SECS, DEFAULT_INTERFACE, DEFAULT_PACKET_VALID_SECS};

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULT VALUES
// ═══════════════════════════════════════════════════════════════════════════

pub fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}
pub fn default_local_addr() -> String {
    ":1080".to_string()
}
pub fn default_packet_valid_time() -> u64 {
    DEFAULT_PACKET_VALID_SECS
}
pub fn default_address_valid_time() -> u64 {
    DEFAULT_ADDRESS_VALID_SECS
}
pub fn default_prefix_v4() -> u8 {
    24
}
pub fn default_log_level() -> String {
    "info".to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid interface name: {0}")]
    InvalidInterface(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("No peer address provided (set tunnel.peer or --pa)")]
    MissingPeer,
    #[error("No {0} password provided (use the config file, a flag, or {1} env)")]
    MissingPassword(&'static str, &'static str),
}

// ═══════════════════════════════════════════════════════════════════════════
// UTILITIES
// ═══════════════════════════════════════════════════════════════════════════

/// Port of a bare `:port` address, `None` for any other form
pub fn wildcard_port(addr: &str) -> Option<u16> {
    addr.trim().strip_prefix(':')?.parse().ok()
}

fn lookup(addr: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    let addr = addr.trim();
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };

    let found: Vec<SocketAddr> = full
        .to_socket_addrs()
        .map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", addr, e)))?
        .collect();
    if found.is_empty() {
        return Err(ConfigError::InvalidAddress(addr.to_string()));
    }
    Ok(found)
}

/// Resolve `host:port`, preferring an IPv4 result.
///
/// A bare `:port` resolves to the IPv4 unspecified address.
pub fn resolve_udp_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    let found = lookup(addr)?;
    Ok(found
        .iter()
        .copied()
        .find(SocketAddr::is_ipv4)
        .unwrap_or(found[0]))
}

/// Resolve `host:port` to an address a socket bound to `local` can send to.
///
/// An IPv4 socket needs an IPv4 peer. An IPv6 socket prefers an IPv6 peer
/// and falls back to the IPv4-mapped form of an IPv4 one.
pub fn resolve_udp_addr_for(addr: &str, local: &SocketAddr) -> Result<SocketAddr, ConfigError> {
    let found = lookup(addr)?;
    let same_family = found.iter().find(|a| a.is_ipv4() == local.is_ipv4());

    match (same_family, local) {
        (Some(peer), _) => Ok(*peer),
        (None, SocketAddr::V6(_)) => {
            let v4 = found[0];
            let mapped = match v4.ip() {
                IpAddr::V4(ip) => ip.to_ipv6_mapped(),
                IpAddr::V6(ip) => ip,
            };
            Ok(SocketAddr::new(IpAddr::V6(mapped), v4.port()))
        }
        (None, SocketAddr::V4(_)) => Err(ConfigError::InvalidAddress(format!(
            "{} has no IPv4 address reachable from {}",
            addr.trim(),
            local
        ))),
    }
}

pub fn prefix_to_netmask_v4(prefix: u8) -> [u8; 4] {
    let mask = if prefix == 0 {
        0u32
    } else if prefix >= 32 {
        0xFFFFFFFFu32
    } else {
        !((1u32 << (32 - prefix)) - 1)
    };
    mask.to_be_bytes()
}
