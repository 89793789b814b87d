//! # tomato-core
//!
//! Core functionality for the tomato tunnel.
//!
//! This crate provides:
//! - Configuration handling (TOML-based)
//! - Frame cryptography (AES-128-CTR + HMAC-MD5, password-derived keys)

pub mod config;
pub mod crypto;

// Re-export commonly used types
pub use config::{
    example_config, prefix_to_netmask_v4, resolve_udp_addr, resolve_udp_addr_for, wildcard_port,
    ConfigError, CryptoSection, LoggingSection, TunSection, TunnelSection, VpnConfig,
};
pub use crypto::{derive_key, FrameCipher, FrameKey};
