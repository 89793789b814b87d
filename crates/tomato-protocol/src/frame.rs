//! # Frame Header
//!
//! Plaintext header carried inside every encrypted frame.

use crate::constants::{
    FRAME_HEADER_SIZE, PAYLOAD_OFFSET, SEQUENCE_OFFSET, TIMESTAMP_OFFSET,
};
use crate::error::{ProtocolError, Result};

/// Freshness header (12 bytes, big-endian)
///
/// ```text
/// ┌────────────────────────┬────────────┐
/// │       Timestamp        │  Sequence  │
/// │          (8)           │    (4)     │
/// └────────────────────────┴────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Sender wall clock, unix seconds
    pub timestamp: u64,
    pub sequence: u32,
}

impl FrameHeader {
    #[inline]
    pub fn new(timestamp: u64, sequence: u32) -> Self {
        FrameHeader {
            timestamp,
            sequence,
        }
    }

    /// Write the header at its wire offsets in a full frame buffer
    #[inline]
    pub fn serialize_into(&self, frame: &mut [u8]) {
        debug_assert!(frame.len() >= FRAME_HEADER_SIZE);
        frame[TIMESTAMP_OFFSET..SEQUENCE_OFFSET].copy_from_slice(&self.timestamp.to_be_bytes());
        frame[SEQUENCE_OFFSET..PAYLOAD_OFFSET].copy_from_slice(&self.sequence.to_be_bytes());
    }

    /// Read the header from a full (decrypted) frame buffer
    #[inline]
    pub fn deserialize(frame: &[u8]) -> Result<Self> {
        if frame.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::ShortFrame {
                min: FRAME_HEADER_SIZE,
                got: frame.len(),
            }
            .into());
        }

        let mut ts = [0u8; 8];
        ts.copy_from_slice(&frame[TIMESTAMP_OFFSET..SEQUENCE_OFFSET]);
        let mut seq = [0u8; 4];
        seq.copy_from_slice(&frame[SEQUENCE_OFFSET..PAYLOAD_OFFSET]);

        Ok(FrameHeader {
            timestamp: u64::from_be_bytes(ts),
            sequence: u32::from_be_bytes(seq),
        })
    }
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Zero-length payloads only refresh the peer state
    #[inline]
    pub fn is_heartbeat(&self) -> bool {
        self.payload.is_empty()
    }
}
