//! # In-Memory Device
//!
//! Channel-backed `PacketDevice` for running a tunnel without a kernel
//! interface (tests, loopback setups).

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

use crate::device::PacketDevice;

/// Device side: what the tunnel reads from and writes to
pub struct ChannelDevice {
    inbound: Mutex<Receiver<Vec<u8>>>,
    outbound: Mutex<Sender<Vec<u8>>>,
}

/// Host side: injects packets into the device and collects what it emits
pub struct DeviceHandle {
    to_device: Sender<Vec<u8>>,
    from_device: Receiver<Vec<u8>>,
}

impl ChannelDevice {
    pub fn pair() -> (ChannelDevice, DeviceHandle) {
        let (to_device, inbound) = mpsc::channel();
        let (outbound, from_device) = mpsc::channel();
        (
            ChannelDevice {
                inbound: Mutex::new(inbound),
                outbound: Mutex::new(outbound),
            },
            DeviceHandle {
                to_device,
                from_device,
            },
        )
    }
}

impl PacketDevice for ChannelDevice {
    fn recv_packet(&self, buf: &mut [u8]) -> io::Result<usize> {
        let packet = self
            .inbound
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "device lock poisoned"))?
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "device handle closed"))?;

        // Oversized packets are truncated like a short read(2) on a TUN fd
        let n = packet.len().min(buf.len());
        buf[..n].copy_from_slice(&packet[..n]);
        Ok(n)
    }

    fn send_packet(&self, packet: &[u8]) -> io::Result<usize> {
        self.outbound
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "device lock poisoned"))?
            .send(packet.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "device handle closed"))?;
        Ok(packet.len())
    }
}

impl DeviceHandle {
    /// Queue a packet as if the host routed it into the interface
    pub fn inject(&self, packet: &[u8]) -> bool {
        self.to_device.send(packet.to_vec()).is_ok()
    }

    /// Wait for the next packet the tunnel delivered to the host
    pub fn next_packet(&self, timeout: Duration) -> Option<Vec<u8>> {
        match self.from_device.recv_timeout(timeout) {
            Ok(packet) => Some(packet),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
