//! Blocking NETLINK_SOCK_DIAG socket.

use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tracing::debug;

use super::error::{Error, Result};

/// Receive timeout applied to every sock_diag socket.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Size of the receive scratch buffer.
pub const RECV_BUF_SIZE: usize = 32 * 1024;

/// A datagram channel to the kernel's sock_diag handler.
///
/// [`NetlinkSocket`] is the real implementation; the session driver is
/// generic over this trait so its receive loop can be fed recorded
/// datagrams.
pub trait Transport {
    /// Send one complete request message.
    fn send(&mut self, msg: &[u8]) -> Result<()>;

    /// Receive one datagram into `buf`, replacing its contents.
    ///
    /// Returns the number of bytes received.
    fn recv(&mut self, buf: &mut BytesMut) -> Result<usize>;

    /// Local port ID stamped into outgoing requests.
    fn port_id(&self) -> u32 {
        0
    }
}

/// Blocking netlink socket bound to NETLINK_SOCK_DIAG.
pub struct NetlinkSocket {
    socket: Socket,
    /// Local port ID (assigned by kernel).
    pid: u32,
}

impl NetlinkSocket {
    /// Open a socket with the default 1 second receive timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(RECV_TIMEOUT)
    }

    /// Open a socket whose receives give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_SOCK_DIAG)?;
        set_recv_timeout(socket.as_raw_fd(), timeout)?;

        // Bind to get a port ID
        let addr = socket.bind_auto()?;
        let pid = addr.port_number();

        debug!(pid, ?timeout, "opened sock_diag socket");

        Ok(Self { socket, pid })
    }
}

impl Transport for NetlinkSocket {
    fn send(&mut self, msg: &[u8]) -> Result<()> {
        let kernel = SocketAddr::new(0, 0);
        self.socket.send_to(msg, &kernel, 0)?;
        Ok(())
    }

    fn recv(&mut self, buf: &mut BytesMut) -> Result<usize> {
        buf.clear();
        if buf.capacity() < RECV_BUF_SIZE {
            buf.reserve(RECV_BUF_SIZE);
        }
        // recv fills the spare capacity and advances the length
        let n = self.socket.recv(buf, 0)?;
        Ok(n)
    }

    fn port_id(&self) -> u32 {
        self.pid
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

/// Set SO_RCVTIMEO so a silent kernel cannot block a receive forever.
fn set_recv_timeout(fd: RawFd, timeout: Duration) -> Result<()> {
    let tv = libc::timeval {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_usec: timeout.subsec_micros() as libc::suseconds_t,
    };

    // SAFETY: fd is an open socket owned by the caller, and tv is a valid
    // timeval that outlives the call; the length passed matches its size.
    let ret = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVTIMEO,
            &tv as *const libc::timeval as *const libc::c_void,
            std::mem::size_of::<libc::timeval>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(Error::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}
