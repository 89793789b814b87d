//! # Network Module (Unix)
//!
//! UDP endpoint for tunnel traffic.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::os::unix::io::AsRawFd;
use tomato_protocol::{NetworkError, Result};

use crate::device::DatagramSocket;

/// Socket buffer sizes requested from the kernel
pub const SOCKET_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Bind the blocking UDP socket the tunnel sends from and listens on
pub fn bind_udp(local_addr: SocketAddr) -> Result<UdpSocket> {
    log::info!("Binding UDP socket on {}", local_addr);

    let socket = UdpSocket::bind(local_addr)
        .map_err(|e| NetworkError::BindFailed(format!("{}: {}", local_addr, e)))?;

    set_socket_buffers(&socket, SOCKET_BUFFER_SIZE, SOCKET_BUFFER_SIZE);
    Ok(socket)
}

/// Best effort; the kernel clamps to its own limits
fn set_socket_buffers(socket: &UdpSocket, recv_size: usize, send_size: usize) {
    let fd = socket.as_raw_fd();

    unsafe {
        let recv_size = recv_size as libc::c_int;
        let send_size = send_size as libc::c_int;

        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &recv_size as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );

        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &send_size as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

impl DatagramSocket for UdpSocket {
    #[inline]
    fn send_datagram(&self, datagram: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.send_to(datagram, addr)
    }

    #[inline]
    fn recv_datagram(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.recv_from(buf)
    }
}
