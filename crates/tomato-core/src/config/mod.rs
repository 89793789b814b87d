//! # Configuration Module
//!
//! TOML-based configuration for the tunnel.

mod common;
mod vpn;

pub use common::{
    prefix_to_netmask_v4, resolve_udp_addr, resolve_udp_addr_for, wildcard_port, ConfigError,
};
pub use vpn::{
    example_config, CryptoSection, LoggingSection, TunSection, TunnelSection, VpnConfig,
    LOCAL_PASSWORD_ENV, PEER_PASSWORD_ENV,
};
