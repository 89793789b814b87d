//! # Sender Loop
//!
//! Virtual interface → encrypted frame → peer.

use tomato_core::FrameCipher;
use tomato_protocol::{FrameHeader, NetworkError, Result, MAX_FRAME_SIZE, PAYLOAD_OFFSET};

use super::session::Session;
use crate::device::{DatagramSocket, PacketDevice};

/// Forward packets until the device or the socket fails.
///
/// Packets read while the session is paused are dropped. The sequence
/// counter wraps at `u32::MAX`.
pub fn run_sender<D, S>(device: &D, socket: &S, cipher: &FrameCipher, session: &Session) -> Result<()>
where
    D: PacketDevice + ?Sized,
    S: DatagramSocket + ?Sized,
{
    let mut buf = vec![0u8; MAX_FRAME_SIZE];
    let mut sequence: u32 = 0;

    loop {
        // The payload lands directly behind the header slot
        let n = device.recv_packet(&mut buf[PAYLOAD_OFFSET..])?;

        let now = session.now();
        let peer = match session.peer.outbound_target(now) {
            Some(peer) => peer,
            None => {
                if session.trace {
                    log::debug!("waiting for peer connection");
                }
                continue;
            }
        };

        let header = FrameHeader::new(now, sequence);
        sequence = sequence.wrapping_add(1);

        let len = cipher.seal_into(&mut buf, n, header)?;
        let sent = socket.send_datagram(&buf[..len], peer)?;
        if sent != len {
            return Err(NetworkError::ShortSend {
                expected: len,
                sent,
            }
            .into());
        }

        if session.trace {
            log::debug!("send {} bytes to {}", n, peer);
        }
    }
}
