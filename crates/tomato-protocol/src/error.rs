//! # Error Module
//!
//! Unified error handling for the tunnel.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VpnError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TUN error: {0}")]
    Tun(#[from] TunError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum TunError {
    #[error("cannot open /dev/net/tun")]
    OpenFailed,
    #[error("ioctl failed: {0}")]
    IoctlFailed(String),
    #[error("permission denied (CAP_NET_ADMIN required)")]
    PermissionDenied,
    #[error("invalid interface name: {0}")]
    InvalidName(String),
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("random source failed")]
    RandomFailed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame too short: {got} < {min} bytes")]
    ShortFrame { min: usize, got: usize },
    #[error("frame too large: {got} > {max} bytes")]
    OversizeFrame { max: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed: {0}")]
    BindFailed(String),
    #[error("short send: {sent} of {expected} bytes")]
    ShortSend { expected: usize, sent: usize },
}

impl VpnError {
    /// True for errors caused by the content of a received frame.
    ///
    /// These are dropped by the receiver and never end the tunnel.
    pub fn is_frame_rejection(&self) -> bool {
        matches!(
            self,
            VpnError::Protocol(ProtocolError::ShortFrame { .. })
                | VpnError::Crypto(CryptoError::AuthenticationFailed)
        )
    }
}

pub type Result<T> = std::result::Result<T, VpnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejection_classification() {
        let short: VpnError = ProtocolError::ShortFrame { min: 44, got: 3 }.into();
        let auth: VpnError = CryptoError::AuthenticationFailed.into();
        let io: VpnError = io::Error::from(io::ErrorKind::BrokenPipe).into();

        assert!(short.is_frame_rejection());
        assert!(auth.is_frame_rejection());
        assert!(!io.is_frame_rejection());
    }

    #[test]
    fn test_display() {
        let e: VpnError = ProtocolError::OversizeFrame { max: 4096, got: 5000 }.into();
        assert_eq!(e.to_string(), "Protocol error: frame too large: 5000 > 4096 bytes");
    }
}
