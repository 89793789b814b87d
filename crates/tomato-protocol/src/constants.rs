//! # Constants
//!
//! Shared constants for the tunnel wire format.

// ═══════════════════════════════════════════════════════════════════════════
// FRAME LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

/// Random per-frame IV for the stream cipher
pub const NONCE_SIZE: usize = 16;

/// HMAC-MD5 tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Big-endian unix seconds
pub const TIMESTAMP_SIZE: usize = 8;

/// Big-endian 32-bit sequence counter
pub const SEQUENCE_SIZE: usize = 4;

/// Symmetric key size (MD5 digest of the password)
pub const KEY_SIZE: usize = 16;

/// Byte offsets of each field inside a frame
///
/// ```text
/// ┌──────────┬──────────┬─────────────┬────────────┬─────────────┐
/// │  Nonce   │   Tag    │  Timestamp  │  Sequence  │   Payload   │
/// │  0..16   │  16..32  │   32..40    │   40..44   │   44..      │
/// └──────────┴──────────┴─────────────┴────────────┴─────────────┘
///            └──────────── encrypted (AES-128-CTR) ──────────────┘
///                       └──────── authenticated (HMAC) ──────────┘
/// ```
pub const TAG_OFFSET: usize = NONCE_SIZE;
pub const TIMESTAMP_OFFSET: usize = TAG_OFFSET + TAG_SIZE;
pub const SEQUENCE_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
pub const PAYLOAD_OFFSET: usize = SEQUENCE_OFFSET + SEQUENCE_SIZE;

/// Smallest valid frame (a heartbeat)
pub const FRAME_HEADER_SIZE: usize = PAYLOAD_OFFSET;

/// Largest datagram the tunnel sends or accepts
pub const MAX_FRAME_SIZE: usize = 4096;

/// Largest payload that fits in one frame
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - FRAME_HEADER_SIZE;

// ═══════════════════════════════════════════════════════════════════════════
// TIMING DEFAULTS
// ═══════════════════════════════════════════════════════════════════════════

/// Frames whose timestamp is this many seconds away from now are stale
pub const DEFAULT_PACKET_VALID_SECS: u64 = 10;

/// With roaming on, stop sending after this many seconds without contact
pub const DEFAULT_ADDRESS_VALID_SECS: u64 = 60;

// ═══════════════════════════════════════════════════════════════════════════
// TUN
// ═══════════════════════════════════════════════════════════════════════════

/// Kernel limit on interface names, including the trailing NUL
pub const IFNAMSIZ: usize = 16;

/// Default TUN interface name
pub const DEFAULT_INTERFACE: &str = "tun0";
