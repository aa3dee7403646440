//! Session driver: one request, drained until the end-of-dump marker.

use std::time::Instant;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::netlink::{NetlinkSocket, RECV_BUF_SIZE, Result, Transport};

use super::codec::{self, Progress};
use super::store::SampleStore;
use super::types::AddressFamily;

/// Where the most recent sampling call got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No call in flight.
    #[default]
    Idle,
    /// The dump request has been sent.
    RequestSent,
    /// Receiving and decoding response datagrams.
    Draining,
    /// The last call saw the end-of-dump marker.
    Done,
    /// The last call returned an error.
    Failed,
}

/// An open sock_diag handle that can be sampled any number of times.
///
/// Calls are strictly sequential: `sample` takes `&mut self`, so one
/// session cannot serve two calls at once. Use one session per thread.
///
/// # Example
///
/// ```ignore
/// use tcpdiag::{AddressFamily, Session};
///
/// let mut session = Session::open()?;
/// let samples = session.sample(AddressFamily::Inet)?;
/// for s in &samples {
///     println!("{} -> {} rtt {:?}", s.local(), s.remote(), s.info().rtt());
/// }
/// session.close();
/// ```
pub struct Session<T: Transport = NetlinkSocket> {
    transport: T,
    buf: BytesMut,
    seq: u32,
    state: SessionState,
}

impl Session<NetlinkSocket> {
    /// Open a NETLINK_SOCK_DIAG socket with a 1 second receive timeout.
    pub fn open() -> Result<Self> {
        Ok(Self::with_transport(NetlinkSocket::new()?))
    }
}

impl<T: Transport> Session<T> {
    /// Drive sampling calls over an already open transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            buf: BytesMut::with_capacity(RECV_BUF_SIZE),
            seq: 0,
            state: SessionState::Idle,
        }
    }

    /// State reached by the most recent call.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Sample every established TCP connection of `family`.
    pub fn sample(&mut self, family: AddressFamily) -> Result<SampleStore> {
        let mut store = SampleStore::new();
        self.sample_into(family, &mut store)?;
        Ok(store)
    }

    /// Like [`sample`](Self::sample), but fills a caller-owned store.
    ///
    /// The store is reset first. If the call fails, samples decoded before
    /// the failure are left in it; they are not a complete result.
    pub fn sample_into(&mut self, family: AddressFamily, store: &mut SampleStore) -> Result<()> {
        store.reset();
        self.state = SessionState::Idle;
        let start = Instant::now();

        match self.drain(family, store) {
            Ok(()) => {
                self.state = SessionState::Done;
                store.set_elapsed(start.elapsed());
                debug!(
                    %family,
                    samples = store.len(),
                    elapsed = ?store.elapsed(),
                    "sampling call complete"
                );
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Sample each family in turn on this session.
    ///
    /// Returns one store per family, in the order given. Stops at the first
    /// failing call.
    pub fn sample_all(&mut self, families: &[AddressFamily]) -> Result<Vec<SampleStore>> {
        families.iter().map(|&family| self.sample(family)).collect()
    }

    /// Close the underlying handle.
    pub fn close(self) {
        debug!("closing sock_diag session");
    }

    fn drain(&mut self, family: AddressFamily, store: &mut SampleStore) -> Result<()> {
        let seq = self.next_seq();
        let request = codec::build_request(family, seq, self.transport.port_id());
        self.transport.send(&request)?;
        self.state = SessionState::RequestSent;
        debug!(%family, seq, "sent sock_diag dump request");

        self.state = SessionState::Draining;
        loop {
            let n = self.transport.recv(&mut self.buf)?;
            trace!(bytes = n, "received datagram");

            if codec::parse_datagram(&self.buf, seq, store)? == Progress::Done {
                return Ok(());
            }
        }
    }

    fn next_seq(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        if self.seq == 0 {
            self.seq = 1;
        }
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::{Error, NlMsgHdr};
    use crate::sockdiag::fixtures::*;
    use crate::sockdiag::wire::InetDiagReqV2;
    use std::collections::VecDeque;
    use std::io;
    use zerocopy::FromBytes;

    /// Replays queued datagrams; an empty queue behaves like a receive
    /// timeout.
    #[derive(Default)]
    struct ScriptedTransport {
        datagrams: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
        recvs: usize,
    }

    impl ScriptedTransport {
        fn new(datagrams: impl IntoIterator<Item = Vec<u8>>) -> Self {
            Self {
                datagrams: datagrams.into_iter().collect(),
                ..Default::default()
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, msg: &[u8]) -> Result<()> {
            self.sent.push(msg.to_vec());
            Ok(())
        }

        fn recv(&mut self, buf: &mut BytesMut) -> Result<usize> {
            self.recvs += 1;
            let data = self
                .datagrams
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))?;
            buf.clear();
            buf.extend_from_slice(&data);
            Ok(data.len())
        }

        fn port_id(&self) -> u32 {
            4242
        }
    }

    fn info(seq: u32, port: u16) -> Vec<u8> {
        let msg = ipv4_diag([127, 0, 0, 1], port, [127, 0, 0, 1], 8080);
        diag_envelope(seq, &msg, &tcp_info_payload(104))
    }

    #[test]
    fn test_drains_until_done() {
        let transport = ScriptedTransport::new([info(1, 1), info(1, 2), done_envelope(1), info(1, 3)]);
        let mut session = Session::with_transport(transport);

        let store = session.sample(AddressFamily::Inet).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(session.state(), SessionState::Done);
        // the trailing datagram is never received
        assert_eq!(session.transport.recvs, 3);
        assert_eq!(session.transport.datagrams.len(), 1);
    }

    #[test]
    fn test_request_is_sent_once() {
        let mut session = Session::with_transport(ScriptedTransport::new([done_envelope(1)]));
        session.sample(AddressFamily::Inet6).unwrap();

        assert_eq!(session.transport.sent.len(), 1);
        let sent = &session.transport.sent[0];
        let header = NlMsgHdr::from_bytes(sent).unwrap();
        assert_eq!(header.nlmsg_seq, 1);
        assert_eq!(header.nlmsg_pid, 4242);
        let (req, _) = InetDiagReqV2::read_from_prefix(&sent[16..]).unwrap();
        assert_eq!(req.sdiag_family, libc::AF_INET6 as u8);
    }

    #[test]
    fn test_kernel_error_fails_call() {
        let mut session =
            Session::with_transport(ScriptedTransport::new([info(1, 1), error_envelope(1, -libc::EPERM)]));

        let err = session.sample(AddressFamily::Inet).unwrap_err();
        assert!(matches!(err, Error::Kernel { errno, .. } if errno == libc::EPERM));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_truncated_error_fails_with_no_data() {
        let truncated = envelope(2, 1, &[0xff; 8]);
        let mut session = Session::with_transport(ScriptedTransport::new([truncated]));

        let err = session.sample(AddressFamily::Inet).unwrap_err();
        assert_eq!(err.errno(), Some(libc::ENODATA));
    }

    #[test]
    fn test_timeout_is_transport_error() {
        let mut session = Session::with_transport(ScriptedTransport::new([info(1, 1)]));

        let err = session.sample(AddressFamily::Inet).unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.transport.recvs, 2);
    }

    #[test]
    fn test_consecutive_calls_start_empty() {
        let transport = ScriptedTransport::new([
            info(1, 1),
            done_envelope(1),
            // a late duplicate of the first dump
            info(1, 1),
            done_envelope(2),
        ]);
        let mut session = Session::with_transport(transport);

        let first = session.sample(AddressFamily::Inet).unwrap();
        assert_eq!(first.len(), 1);

        let second = session.sample(AddressFamily::Inet).unwrap();
        assert!(second.is_empty());
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_sample_into_resets_store() {
        let transport = ScriptedTransport::new([
            [info(1, 1), info(1, 2)].concat(),
            done_envelope(1),
            [info(2, 3), done_envelope(2)].concat(),
        ]);
        let mut session = Session::with_transport(transport);
        let mut store = SampleStore::new();

        session.sample_into(AddressFamily::Inet, &mut store).unwrap();
        assert_eq!(store.len(), 2);

        session.sample_into(AddressFamily::Inet, &mut store).unwrap();
        let ports: Vec<u16> = store.iter().map(|s| s.local_port).collect();
        assert_eq!(ports, vec![3]);
    }

    #[test]
    fn test_sample_all_in_order() {
        let v6 = ipv6_diag(std::net::Ipv6Addr::LOCALHOST.octets(), 9, [0; 16], 10);
        let transport = ScriptedTransport::new([
            [info(1, 1), done_envelope(1)].concat(),
            [diag_envelope(2, &v6, &tcp_info_payload(232)), done_envelope(2)].concat(),
        ]);
        let mut session = Session::with_transport(transport);

        let stores = session
            .sample_all(&[AddressFamily::Inet, AddressFamily::Inet6])
            .unwrap();
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].get(0).unwrap().family, AddressFamily::Inet);
        assert_eq!(stores[1].get(0).unwrap().family, AddressFamily::Inet6);
        session.close();
    }

    #[test]
    fn test_sample_all_stops_at_first_error() {
        let transport = ScriptedTransport::new([error_envelope(1, -libc::EACCES), done_envelope(2)]);
        let mut session = Session::with_transport(transport);

        let err = session
            .sample_all(&[AddressFamily::Inet, AddressFamily::Inet6])
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert_eq!(session.transport.sent.len(), 1);
    }
}
