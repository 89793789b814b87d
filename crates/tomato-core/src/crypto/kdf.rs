//! # Key Derivation
//!
//! Password to key mapping for the pre-shared secrets.
//!
//! The key is the plain MD5 digest of the password bytes: no salt, no
//! iterations. Both peers must compute the exact same key from the same
//! string, so this is part of the wire contract. Hardening it requires a
//! new, versioned frame format.

use md5::{Digest, Md5};
use tomato_protocol::KEY_SIZE;
use zeroize::Zeroizing;

/// 128-bit key material, wiped on drop
pub type FrameKey = Zeroizing<[u8; KEY_SIZE]>;

/// Derive a frame key from a password
pub fn derive_key(password: &str) -> FrameKey {
    let digest = Md5::digest(password.as_bytes());
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&digest);
    key
}
