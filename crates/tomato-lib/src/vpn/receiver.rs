//! # Receiver Loop
//!
//! Peer → validated frame → virtual interface.
//!
//! Everything arriving here is untrusted. Malformed, forged, replayed or
//! misaddressed datagrams are dropped; only I/O failures end the loop.

use tomato_core::FrameCipher;
use tomato_protocol::{Result, TunError, FRAME_HEADER_SIZE, MAX_FRAME_SIZE, PAYLOAD_OFFSET};

use super::peer::Acceptance;
use super::session::Session;
use crate::device::{DatagramSocket, PacketDevice};

pub fn run_receiver<D, S>(device: &D, socket: &S, cipher: &FrameCipher, session: &Session) -> Result<()>
where
    D: PacketDevice + ?Sized,
    S: DatagramSocket + ?Sized,
{
    let mut buf = vec![0u8; MAX_FRAME_SIZE];

    loop {
        let (n, source) = socket.recv_datagram(&mut buf)?;

        if n < FRAME_HEADER_SIZE {
            if session.trace {
                log::debug!("invalid length from {}", source);
            }
            continue;
        }

        if !session.peer.authorize(&source) {
            if session.trace {
                log::debug!("invalid address from {}", source);
            }
            continue;
        }

        let header = match cipher.open_in_place(&mut buf[..n]) {
            Ok(header) => header,
            Err(e) if e.is_frame_rejection() => {
                if session.trace {
                    log::debug!("invalid hmac from {}", source);
                }
                continue;
            }
            Err(e) => return Err(e),
        };

        match session
            .peer
            .accept(source, header.timestamp, header.sequence, session.now())
        {
            Acceptance::Stale => {
                if session.trace {
                    log::debug!("invalid header from {}", source);
                }
                continue;
            }
            Acceptance::Accepted {
                roamed_from: Some(old),
            } => log::info!("update peer from {} to {}", old, source),
            Acceptance::Accepted { roamed_from: None } => {}
        }

        let payload = &buf[PAYLOAD_OFFSET..n];
        if payload.is_empty() {
            if session.trace {
                log::debug!("recv 0 bytes from {}", source);
            }
            continue;
        }

        let written = device.send_packet(payload)?;
        if written != payload.len() {
            return Err(TunError::ShortWrite {
                expected: payload.len(),
                written,
            }
            .into());
        }

        if session.trace {
            log::debug!("recv {} bytes from {}", written, source);
        }
    }
}
