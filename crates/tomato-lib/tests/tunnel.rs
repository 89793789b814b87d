//! End-to-end: two tunnel endpoints over loopback UDP with in-memory devices.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tomato_lib::{bind_udp, run_loops, ChannelDevice, DeviceHandle, PeerPolicy, Session, TunnelKeys};

const WAIT: Duration = Duration::from_secs(3);
const QUIET: Duration = Duration::from_millis(300);

struct Endpoint {
    handle: DeviceHandle,
    session: Arc<Session>,
    addr: SocketAddr,
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bind() -> UdpSocket {
    bind_udp("127.0.0.1:0".parse().unwrap()).unwrap()
}

fn spawn_endpoint(
    socket: UdpSocket,
    peer_addr: SocketAddr,
    local_password: &str,
    peer_password: &str,
    roaming: bool,
) -> Endpoint {
    let addr = socket.local_addr().unwrap();
    let (device, handle) = ChannelDevice::pair();
    let policy = PeerPolicy {
        packet_valid_secs: 10,
        address_valid_secs: 60,
        roaming,
    };
    let session = Arc::new(Session::new(peer_addr, policy, true));
    let keys = TunnelKeys::from_passwords(local_password, peer_password);

    {
        let session = Arc::clone(&session);
        thread::spawn(move || run_loops(Arc::new(device), Arc::new(socket), keys, session));
    }

    Endpoint {
        handle,
        session,
        addr,
    }
}

fn ipv4_packet(len: usize) -> Vec<u8> {
    let mut packet: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
    packet[0] = 0x45;
    packet
}

#[test]
fn test_payload_crosses_tunnel_unchanged() {
    init_logging();
    let (sock_a, sock_b) = (bind(), bind());
    let (addr_a, addr_b) = (sock_a.local_addr().unwrap(), sock_b.local_addr().unwrap());

    let a = spawn_endpoint(sock_a, addr_b, "alpha", "bravo", false);
    let b = spawn_endpoint(sock_b, addr_a, "bravo", "alpha", false);

    let packet = ipv4_packet(100);
    assert!(a.handle.inject(&packet));
    assert_eq!(b.handle.next_packet(WAIT), Some(packet.clone()));

    let reply = ipv4_packet(60);
    assert!(b.handle.inject(&reply));
    assert_eq!(a.handle.next_packet(WAIT), Some(reply));

    assert!(b.session.peer.snapshot().last_seen_at() > 0);
}

#[test]
fn test_many_packets_in_order() {
    init_logging();
    let (sock_a, sock_b) = (bind(), bind());
    let (addr_a, addr_b) = (sock_a.local_addr().unwrap(), sock_b.local_addr().unwrap());

    let a = spawn_endpoint(sock_a, addr_b, "alpha", "bravo", false);
    let b = spawn_endpoint(sock_b, addr_a, "bravo", "alpha", false);

    for i in 0..50u8 {
        let mut packet = ipv4_packet(40);
        packet[1] = i;
        a.handle.inject(&packet);
        assert_eq!(b.handle.next_packet(WAIT).map(|p| p[1]), Some(i));
    }
}

#[test]
fn test_mismatched_passwords_deliver_nothing() {
    init_logging();
    let (sock_a, sock_b) = (bind(), bind());
    let (addr_a, addr_b) = (sock_a.local_addr().unwrap(), sock_b.local_addr().unwrap());

    let a = spawn_endpoint(sock_a, addr_b, "alpha", "bravo", false);
    let b = spawn_endpoint(sock_b, addr_a, "bravo", "not-alpha", false);

    a.handle.inject(&ipv4_packet(100));
    assert_eq!(b.handle.next_packet(QUIET), None);
    assert_eq!(b.session.peer.snapshot().frontier(), (0, 0));
}

#[test]
fn test_roaming_endpoint_learns_peer_and_replies() {
    init_logging();
    let (sock_server, sock_client) = (bind(), bind());
    let server_addr = sock_server.local_addr().unwrap();

    // Server starts with a placeholder peer and waits to be contacted
    let placeholder: SocketAddr = "127.0.0.1:9".parse().unwrap();
    let server = spawn_endpoint(sock_server, placeholder, "srv", "cli", true);
    let client = spawn_endpoint(sock_client, server_addr, "cli", "srv", false);

    // Paused: nothing goes out before first contact
    server.handle.inject(&ipv4_packet(30));
    assert_eq!(client.handle.next_packet(QUIET), None);

    let hello = ipv4_packet(100);
    client.handle.inject(&hello);
    assert_eq!(server.handle.next_packet(WAIT), Some(hello));
    assert_eq!(server.session.peer.current_addr(), client.addr);

    let reply = ipv4_packet(80);
    server.handle.inject(&reply);
    assert_eq!(client.handle.next_packet(WAIT), Some(reply));
}

#[test]
fn test_closed_device_ends_tunnel() {
    init_logging();
    let (sock_a, sock_b) = (bind(), bind());
    let addr_b = sock_b.local_addr().unwrap();
    let (device, handle) = ChannelDevice::pair();
    let policy = PeerPolicy {
        packet_valid_secs: 10,
        address_valid_secs: 60,
        roaming: false,
    };
    let session = Arc::new(Session::new(addr_b, policy, false));
    let keys = TunnelKeys::from_passwords("alpha", "bravo");

    let worker =
        thread::spawn(move || run_loops(Arc::new(device), Arc::new(sock_a), keys, session));
    drop(handle);

    let result = worker.join().unwrap();
    assert!(result.is_err());
    drop(sock_b);
}
