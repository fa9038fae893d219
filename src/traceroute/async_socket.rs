use std::io;
use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr};
use std::os::fd::{AsRawFd, RawFd};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

/// A socket able to carry one probe and its reply.
///
/// `recv` fills `buf` with a whole IPv4 datagram, header included.
#[async_trait]
pub trait ProbeSocket: Send + Sync {
    fn set_ttl(&self, ttl: u32) -> io::Result<()>;
    async fn send_to(&self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize>;
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Hands out one fresh [`ProbeSocket`] per probe attempt.
pub trait ProbeSocketFactory: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn ProbeSocket>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RawIcmpSocketFactory;

impl ProbeSocketFactory for RawIcmpSocketFactory {
    fn open(&self) -> io::Result<Box<dyn ProbeSocket>> {
        let socket = AsyncSocket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        Ok(Box::new(socket))
    }
}

/// Non-blocking raw socket driven by the tokio reactor.
///
/// Creating one requires `CAP_NET_RAW` (or root); without it `new` fails with
/// a permission error.
pub struct AsyncSocket {
    socket_async_fd: AsyncFd<SocketWrapper>,
}

impl AsyncSocket {
    pub fn new(domain: Domain, ty: Type, protocol: Option<Protocol>) -> io::Result<Self> {
        let socket = SocketWrapper::new(domain, ty, protocol)?;

        let socket_async_fd = AsyncFd::new(socket)?;

        Ok(Self { socket_async_fd })
    }
}

#[async_trait]
impl ProbeSocket for AsyncSocket {
    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.socket_async_fd.get_ref().set_ttl(ttl)
    }

    async fn send_to(&self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let socket_addr = SocketAddr::new(destination.into(), 0);
        self.socket_async_fd
            .async_io(Interest::WRITABLE, |socket| socket.send_to(buf, socket_addr))
            .await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket_async_fd
            .async_io(Interest::READABLE, |socket| socket.recv(buf))
            .await
    }
}

struct SocketWrapper {
    socket: Socket,
}

impl SocketWrapper {
    fn new(domain: Domain, ty: Type, protocol: Option<Protocol>) -> io::Result<Self> {
        let socket = Socket::new(domain, ty, protocol)?;

        socket.set_nonblocking(true)?;

        Ok(Self { socket })
    }

    fn send_to(&self, buf: &[u8], socket_addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, &socket_addr.into())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.socket).read(buf)
    }

    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.socket.set_ttl(ttl)
    }
}

impl AsRawFd for SocketWrapper {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
