//! # TUN Device Module (Unix)
//!
//! Blocking Linux TUN device carrying raw IP packets.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::net::Ipv4Addr;
use std::os::unix::io::{AsRawFd, RawFd};
use tomato_core::prefix_to_netmask_v4;
use tomato_protocol::{Result, TunError, VpnError, IFNAMSIZ};

use crate::device::PacketDevice;

// ═══════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════

const TUN_PATH: &str = "/dev/net/tun";

const IFF_TUN: libc::c_short = 0x0001;
const IFF_NO_PI: libc::c_short = 0x1000;

const TUNSETIFF: u32 = 0x400454ca;
const SIOCSIFMTU: u32 = 0x8922;
const SIOCSIFADDR: u32 = 0x8916;
const SIOCSIFNETMASK: u32 = 0x891c;
const SIOCGIFFLAGS: u32 = 0x8913;
const SIOCSIFFLAGS: u32 = 0x8914;

const IFF_UP: libc::c_short = 0x1;
const IFF_RUNNING: libc::c_short = 0x40;
const AF_INET: libc::sa_family_t = libc::AF_INET as libc::sa_family_t;

// ═══════════════════════════════════════════════════════════════════════════
// IOCTL WRAPPER
// ═══════════════════════════════════════════════════════════════════════════

#[inline]
unsafe fn ioctl_raw(fd: libc::c_int, request: u32, arg: *mut libc::c_void) -> libc::c_int {
    #[cfg(target_os = "linux")]
    {
        libc::ioctl(fd, request as libc::Ioctl, arg)
    }
    #[cfg(not(target_os = "linux"))]
    {
        libc::ioctl(fd, request as libc::c_ulong, arg)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IOCTL STRUCTURES
// ═══════════════════════════════════════════════════════════════════════════

fn ifr_name(name: &str) -> Result<[u8; IFNAMSIZ]> {
    if name.is_empty() || name.len() >= IFNAMSIZ || name.as_bytes().contains(&0) {
        return Err(TunError::InvalidName(name.to_string()).into());
    }
    let mut buf = [0u8; IFNAMSIZ];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    Ok(buf)
}

#[repr(C)]
struct IfReqFlags {
    ifr_name: [u8; IFNAMSIZ],
    ifr_flags: libc::c_short,
    _pad: [u8; 22],
}

impl IfReqFlags {
    fn new(name: &str, flags: libc::c_short) -> Result<Self> {
        Ok(IfReqFlags {
            ifr_name: ifr_name(name)?,
            ifr_flags: flags,
            _pad: [0; 22],
        })
    }
}

#[repr(C)]
struct IfReqMtu {
    ifr_name: [u8; IFNAMSIZ],
    ifr_mtu: libc::c_int,
    _pad: [u8; 20],
}

#[repr(C)]
struct SockAddrIn {
    sin_family: libc::sa_family_t,
    sin_port: u16,
    sin_addr: [u8; 4],
    sin_zero: [u8; 8],
}

#[repr(C)]
struct IfReqAddr4 {
    ifr_name: [u8; IFNAMSIZ],
    ifr_addr: SockAddrIn,
    _pad: [u8; 8],
}

impl IfReqAddr4 {
    fn new(name: &str, addr: [u8; 4]) -> Result<Self> {
        Ok(IfReqAddr4 {
            ifr_name: ifr_name(name)?,
            ifr_addr: SockAddrIn {
                sin_family: AF_INET,
                sin_port: 0,
                sin_addr: addr,
                sin_zero: [0; 8],
            },
            _pad: [0; 8],
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TUN DEVICE
// ═══════════════════════════════════════════════════════════════════════════

/// TUN device opened without packet information headers
pub struct TunDevice {
    file: File,
    name: String,
}

impl TunDevice {
    /// Attach to (or create) the TUN interface `name`
    pub fn open(name: &str) -> Result<Self> {
        log::info!("Opening TUN device: {}", name);

        let mut ifr = IfReqFlags::new(name, IFF_TUN | IFF_NO_PI)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(TUN_PATH)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    VpnError::Tun(TunError::PermissionDenied)
                } else {
                    VpnError::Tun(TunError::OpenFailed)
                }
            })?;

        let result = unsafe {
            ioctl_raw(
                file.as_raw_fd(),
                TUNSETIFF,
                &mut ifr as *mut _ as *mut libc::c_void,
            )
        };
        if result < 0 {
            let errno = io::Error::last_os_error();
            if errno.kind() == io::ErrorKind::PermissionDenied {
                return Err(TunError::PermissionDenied.into());
            }
            return Err(TunError::IoctlFailed(format!("TUNSETIFF: {}", errno)).into());
        }

        let actual_name = ifr
            .ifr_name
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as char)
            .collect::<String>();

        log::info!("TUN device ready: {}", actual_name);

        Ok(TunDevice {
            file,
            name: actual_name,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_mtu(&self, mtu: u16) -> Result<()> {
        log::debug!("Setting MTU: {}", mtu);
        let ifr = IfReqMtu {
            ifr_name: ifr_name(&self.name)?,
            ifr_mtu: mtu as libc::c_int,
            _pad: [0; 20],
        };
        self.ioctl_with_socket(SIOCSIFMTU, &ifr, "SIOCSIFMTU")
    }

    pub fn set_ipv4_address(&self, addr: Ipv4Addr, prefix: u8) -> Result<()> {
        log::info!("Setting IPv4 address: {}/{}", addr, prefix);

        let ifr = IfReqAddr4::new(&self.name, addr.octets())?;
        self.ioctl_with_socket(SIOCSIFADDR, &ifr, "SIOCSIFADDR")?;

        let ifr_mask = IfReqAddr4::new(&self.name, prefix_to_netmask_v4(prefix))?;
        self.ioctl_with_socket(SIOCSIFNETMASK, &ifr_mask, "SIOCSIFNETMASK")
    }

    pub fn bring_up(&self) -> Result<()> {
        log::info!("Bringing up interface: {}", self.name);

        let mut ifr = IfReqFlags::new(&self.name, 0)?;
        let sock = Self::control_socket()?;

        let result =
            unsafe { ioctl_raw(sock, SIOCGIFFLAGS, &mut ifr as *mut _ as *mut libc::c_void) };
        if result < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(sock) };
            return Err(TunError::IoctlFailed(format!("SIOCGIFFLAGS: {}", err)).into());
        }

        ifr.ifr_flags |= IFF_UP | IFF_RUNNING;

        let result =
            unsafe { ioctl_raw(sock, SIOCSIFFLAGS, &mut ifr as *mut _ as *mut libc::c_void) };
        let err = io::Error::last_os_error();
        unsafe { libc::close(sock) };

        if result < 0 {
            return Err(TunError::IoctlFailed(format!("SIOCSIFFLAGS: {}", err)).into());
        }

        log::info!("Interface {} is UP", self.name);
        Ok(())
    }

    fn ioctl_with_socket<T>(&self, request: u32, arg: &T, name: &str) -> Result<()> {
        let sock = Self::control_socket()?;
        let result = unsafe { ioctl_raw(sock, request, arg as *const T as *mut libc::c_void) };
        let err = io::Error::last_os_error();
        unsafe { libc::close(sock) };

        if result < 0 {
            return Err(TunError::IoctlFailed(format!("{}: {}", name, err)).into());
        }
        Ok(())
    }

    fn control_socket() -> Result<RawFd> {
        let sock = unsafe { libc::socket(AF_INET as libc::c_int, libc::SOCK_DGRAM, 0) };
        if sock < 0 {
            let err = io::Error::last_os_error();
            return Err(TunError::IoctlFailed(format!("control socket: {}", err)).into());
        }
        Ok(sock)
    }
}

impl PacketDevice for TunDevice {
    #[inline]
    fn recv_packet(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = (&self.file).read(buf)?;
        log::trace!("TUN read: {} bytes", n);
        Ok(n)
    }

    #[inline]
    fn send_packet(&self, packet: &[u8]) -> io::Result<usize> {
        let n = (&self.file).write(packet)?;
        log::trace!("TUN write: {} bytes", n);
        Ok(n)
    }
}

impl AsRawFd for TunDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
