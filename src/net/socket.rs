//! Raw ICMP socket used by the ping session.
//!
//! The session only ever talks to an [`IcmpTransport`], so tests can swap the
//! kernel socket for a scripted one.

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tracing::{trace, warn};

/// Capacity of the buffer incoming datagrams are read into.
pub const RECV_BUFFER_LEN: usize = 1024;

// ICMP has no ports; the kernel ignores this one.
const ECHO_REQUEST_PORT: u16 = 0;

/// Send/receive half of an ICMPv4 socket.
pub trait IcmpTransport {
    /// Sends `buf` as one datagram and returns the number of bytes written.
    fn send_to(&self, buf: &[u8], dest: Ipv4Addr) -> io::Result<usize>;

    /// Reads one datagram into `buf`, IP header included.
    ///
    /// Returns `WouldBlock` or `TimedOut` when nothing arrived within the
    /// transport's poll interval.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)>;
}

pub struct IcmpSocket {
    inner: Socket,
}

impl IcmpSocket {
    /// Opens a raw ICMPv4 socket (needs CAP_NET_RAW or root).
    ///
    /// `recv_buffer_hint` is applied best effort. `poll_interval` bounds how
    /// long a single `recv_from` blocks.
    pub fn new(recv_buffer_hint: usize, poll_interval: Duration) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        trace!("Created raw ICMPv4 socket");

        if let Err(e) = socket.set_recv_buffer_size(recv_buffer_hint) {
            warn!(size = recv_buffer_hint, "unable to set receive buffer size: {}", e);
        }
        socket.set_read_timeout(Some(poll_interval))?;

        Ok(Self { inner: socket })
    }
}

impl IcmpTransport for IcmpSocket {
    fn send_to(&self, buf: &[u8], dest: Ipv4Addr) -> io::Result<usize> {
        let addr = SocketAddrV4::new(dest, ECHO_REQUEST_PORT);
        self.inner.send_to(buf, &SockAddr::from(addr))
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        // socket2's recv_from requires uninit buffer
        let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
        let (n, addr) = self.inner.recv_from(uninit)?;
        let addr = addr.as_socket_ipv4().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "non-IPv4 sender address")
        })?;
        Ok((n, *addr.ip()))
    }
}
