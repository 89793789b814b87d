//! # Cryptographic Module
//!
//! Frame cryptography using RustCrypto.
//!
//! One fixed suite, shared with every deployed peer:
//! - MD5 password digest as the key
//! - AES-128-CTR with a random 16-byte IV per frame
//! - HMAC-MD5 tag, verified in constant time

mod frame;
mod kdf;

pub use frame::FrameCipher;
pub use kdf::{derive_key, FrameKey};
