//! # Frame Cipher
//!
//! Encrypt-and-MAC framing: AES-128-CTR over `tag ‖ header ‖ payload`,
//! HMAC-MD5 over `header ‖ payload`, random 16-byte IV in front.

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use md5::Md5;
use rand_core::{OsRng, RngCore};

use super::kdf::{derive_key, FrameKey};
use tomato_protocol::{
    CryptoError, Frame, FrameHeader, ProtocolError, Result, FRAME_HEADER_SIZE, MAX_FRAME_SIZE,
    NONCE_SIZE, PAYLOAD_OFFSET, TAG_OFFSET, TAG_SIZE, TIMESTAMP_OFFSET,
};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type HmacMd5 = Hmac<Md5>;

/// Stateless frame encoder/decoder bound to one direction's key
pub struct FrameCipher {
    key: FrameKey,
}

impl FrameCipher {
    pub fn new(key: FrameKey) -> Self {
        FrameCipher { key }
    }

    pub fn from_password(password: &str) -> Self {
        Self::new(derive_key(password))
    }

    fn mac(&self) -> HmacMd5 {
        // HMAC takes keys of any length
        <HmacMd5 as Mac>::new_from_slice(&self.key[..]).expect("hmac accepts any key length")
    }

    fn apply_keystream(&self, nonce: &[u8; NONCE_SIZE], data: &mut [u8]) {
        let mut cipher = Aes128Ctr::new((&*self.key).into(), nonce.into());
        cipher.apply_keystream(data);
    }

    /// Seal a frame whose payload already sits at `buf[44..44 + payload_len]`.
    ///
    /// Returns the total frame length.
    pub fn seal_into(&self, buf: &mut [u8], payload_len: usize, header: FrameHeader) -> Result<usize> {
        let total = FRAME_HEADER_SIZE + payload_len;
        if total > MAX_FRAME_SIZE || total > buf.len() {
            return Err(ProtocolError::OversizeFrame {
                max: MAX_FRAME_SIZE.min(buf.len()),
                got: total,
            }
            .into());
        }
        let frame = &mut buf[..total];

        header.serialize_into(frame);

        let mut mac = self.mac();
        mac.update(&frame[TIMESTAMP_OFFSET..]);
        let tag = mac.finalize().into_bytes();
        frame[TAG_OFFSET..TIMESTAMP_OFFSET].copy_from_slice(&tag);

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|_| CryptoError::RandomFailed)?;
        frame[..NONCE_SIZE].copy_from_slice(&nonce);

        self.apply_keystream(&nonce, &mut frame[TAG_OFFSET..]);
        Ok(total)
    }

    /// Encode one payload into a new frame
    pub fn seal(&self, payload: &[u8], sequence: u32, timestamp: u64) -> Result<Vec<u8>> {
        let total = FRAME_HEADER_SIZE + payload.len();
        if total > MAX_FRAME_SIZE {
            return Err(ProtocolError::OversizeFrame {
                max: MAX_FRAME_SIZE,
                got: total,
            }
            .into());
        }

        let mut buf = vec![0u8; total];
        buf[PAYLOAD_OFFSET..].copy_from_slice(payload);
        self.seal_into(&mut buf, payload.len(), FrameHeader::new(timestamp, sequence))?;
        Ok(buf)
    }

    /// Decrypt and verify a frame in place.
    ///
    /// On success the plaintext payload is `frame[44..]`. On failure the
    /// buffer content is unspecified.
    pub fn open_in_place(&self, frame: &mut [u8]) -> Result<FrameHeader> {
        if frame.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::ShortFrame {
                min: FRAME_HEADER_SIZE,
                got: frame.len(),
            }
            .into());
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&frame[..NONCE_SIZE]);
        self.apply_keystream(&nonce, &mut frame[TAG_OFFSET..]);

        let mut mac = self.mac();
        mac.update(&frame[TIMESTAMP_OFFSET..]);
        mac.verify_slice(&frame[TAG_OFFSET..TAG_OFFSET + TAG_SIZE])
            .map_err(|_| CryptoError::AuthenticationFailed)?;

        FrameHeader::deserialize(frame)
    }

    /// Decode a frame into header and owned payload
    pub fn open(&self, frame: &[u8]) -> Result<Frame> {
        let mut buf = frame.to_vec();
        let header = self.open_in_place(&mut buf)?;
        let payload = buf.split_off(PAYLOAD_OFFSET);
        Ok(Frame { header, payload })
    }
}

impl std::fmt::Debug for FrameCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomato_protocol::{VpnError, MAX_PAYLOAD_SIZE};

    const TS: u64 = 1_700_000_000;

    #[test]
    fn test_roundtrip() {
        let cipher = FrameCipher::from_password("secret");
        let frame = cipher.seal(b"Hello tunnel!", 7, TS).unwrap();
        assert_eq!(frame.len(), 44 + 13);

        let opened = cipher.open(&frame).unwrap();
        assert_eq!(opened.header, FrameHeader::new(TS, 7));
        assert_eq!(opened.payload, b"Hello tunnel!");
    }

    #[test]
    fn test_roundtrip_every_length() {
        let cipher = FrameCipher::from_password("secret");
        for len in 0..=MAX_PAYLOAD_SIZE {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let frame = cipher.seal(&payload, len as u32, TS).unwrap();
            let opened = cipher.open(&frame).unwrap();
            assert_eq!(opened.payload, payload);
            assert_eq!(opened.header.sequence, len as u32);
        }
    }

    #[test]
    fn test_heartbeat() {
        let cipher = FrameCipher::from_password("secret");
        let frame = cipher.seal(&[], u32::MAX, TS).unwrap();
        assert_eq!(frame.len(), FRAME_HEADER_SIZE);
        assert!(cipher.open(&frame).unwrap().is_heartbeat());
    }

    #[test]
    fn test_oversize() {
        let cipher = FrameCipher::from_password("secret");
        let err = cipher.seal(&[0u8; MAX_PAYLOAD_SIZE + 1], 0, TS).unwrap_err();
        assert!(matches!(
            err,
            VpnError::Protocol(ProtocolError::OversizeFrame { got: 4097, .. })
        ));
    }

    #[test]
    fn test_short_frame() {
        let cipher = FrameCipher::from_password("secret");
        let err = cipher.open(&[0u8; 43]).unwrap_err();
        assert!(matches!(
            err,
            VpnError::Protocol(ProtocolError::ShortFrame { got: 43, .. })
        ));
    }

    #[test]
    fn test_every_bit_flip_fails() {
        let cipher = FrameCipher::from_password("secret");
        let frame = cipher.seal(b"payload", 1, TS).unwrap();

        for bit in 0..frame.len() * 8 {
            let mut tampered = frame.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            let err = cipher.open(&tampered).unwrap_err();
            assert!(
                matches!(err, VpnError::Crypto(CryptoError::AuthenticationFailed)),
                "bit {} accepted",
                bit
            );
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let local = FrameCipher::from_password("alice");
        let peer = FrameCipher::from_password("bob");
        let frame = local.seal(b"data", 1, TS).unwrap();
        assert!(peer.open(&frame).unwrap_err().is_frame_rejection());
    }

    #[test]
    fn test_nonce_is_fresh() {
        let cipher = FrameCipher::from_password("secret");
        let a = cipher.seal(b"same", 1, TS).unwrap();
        let b = cipher.seal(b"same", 1, TS).unwrap();
        assert_ne!(&a[..NONCE_SIZE], &b[..NONCE_SIZE]);
        assert_ne!(&a[NONCE_SIZE..], &b[NONCE_SIZE..]);
    }

    #[test]
    fn test_wire_layout() {
        // Decrypt by hand to pin the layout: CTR over [16..], HMAC over [32..]
        let key = derive_key("secret");
        let cipher = FrameCipher::new(derive_key("secret"));
        let mut frame = cipher.seal(b"xyz", 0x01020304, 0x0a0b0c0d0e0f1011).unwrap();

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&frame[..16]);
        let mut ctr = Aes128Ctr::new((&*key).into(), (&nonce).into());
        ctr.apply_keystream(&mut frame[16..]);

        assert_eq!(&frame[32..40], &[0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10, 0x11]);
        assert_eq!(&frame[40..44], &[1, 2, 3, 4]);
        assert_eq!(&frame[44..], b"xyz");

        let mut mac = <HmacMd5 as Mac>::new_from_slice(&key[..]).unwrap();
        mac.update(&frame[32..]);
        assert_eq!(&frame[16..32], &mac.finalize().into_bytes()[..]);
    }

    #[test]
    fn test_seal_into_buffer_too_small() {
        let cipher = FrameCipher::from_password("secret");
        let mut buf = [0u8; 50];
        assert!(cipher.seal_into(&mut buf, 10, FrameHeader::new(TS, 0)).is_err());
        assert_eq!(cipher.seal_into(&mut buf, 6, FrameHeader::new(TS, 0)).unwrap(), 50);
    }
}
