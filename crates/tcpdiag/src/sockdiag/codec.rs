//! sock_diag request construction and response decoding.

use tracing::trace;

use crate::netlink::message::{NLM_F_DUMP, NLM_F_REQUEST};
use crate::netlink::{
    AttrIter, Error, MessageBuilder, MessageIter, NlMsgError, NlMsgType, Result,
};

use super::sample::Sample;
use super::store::SampleStore;
use super::types::{AddressFamily, InetExtension, TcpState};
use super::wire::{InetDiagMsg, InetDiagReqV2};

/// What the receive loop should do after a datagram has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The dump is still running; receive again.
    Continue,
    /// The end-of-dump envelope was seen.
    Done,
}

/// Build the dump request for established TCP sockets of `family`, asking
/// for the INET_DIAG_INFO extension.
pub fn build_request(family: AddressFamily, seq: u32, pid: u32) -> Vec<u8> {
    let mut req = InetDiagReqV2::zeroed();
    req.sdiag_family = family as u8;
    req.sdiag_protocol = libc::IPPROTO_TCP as u8;
    req.idiag_states = TcpState::Established.mask();
    req.idiag_ext = InetExtension::Info.mask();

    let mut builder =
        MessageBuilder::new(NlMsgType::SOCK_DIAG_BY_FAMILY, NLM_F_REQUEST | NLM_F_DUMP);
    builder.set_seq(seq);
    builder.set_pid(pid);
    builder.append(&req);
    builder.finish()
}

/// Decode every envelope in one received datagram, appending samples to
/// `store` in receive order.
///
/// Envelopes answering a different request (sequence number other than
/// `seq`) are ignored. An envelope whose declared length does not fit the
/// datagram ends parsing of that datagram.
pub fn parse_datagram(data: &[u8], seq: u32, store: &mut SampleStore) -> Result<Progress> {
    let mut envelopes = MessageIter::new(data);
    for (header, payload) in envelopes.by_ref() {
        if header.nlmsg_seq != seq {
            trace!(
                got = header.nlmsg_seq,
                want = seq,
                "skipping envelope from another request"
            );
            continue;
        }

        match header.nlmsg_type {
            NlMsgType::DONE => return Ok(Progress::Done),
            NlMsgType::ERROR => {
                let err = NlMsgError::from_bytes(payload).map_err(|_| Error::no_data())?;
                if err.is_ack() {
                    continue;
                }
                return Err(Error::from_errno(err.error));
            }
            NlMsgType::NOOP => continue,
            _ => parse_diag(payload, store)?,
        }
    }

    if envelopes.remaining() > 0 {
        trace!(
            bytes = envelopes.remaining(),
            "dropping truncated envelope at end of datagram"
        );
    }

    Ok(Progress::Continue)
}

/// Decode one inet_diag record and its attributes.
fn parse_diag(payload: &[u8], store: &mut SampleStore) -> Result<()> {
    let Ok(msg) = InetDiagMsg::from_bytes(payload) else {
        trace!(len = payload.len(), "skipping short inet_diag record");
        return Ok(());
    };
    let Some(family) = AddressFamily::from_u8(msg.idiag_family) else {
        trace!(family = msg.idiag_family, "skipping record of unknown family");
        return Ok(());
    };

    let info_type = InetExtension::Info.attr_type();
    for (kind, data) in AttrIter::new(&payload[InetDiagMsg::SIZE..]) {
        if kind == info_type {
            store.append(Sample::from_diag(family, &msg, data))?;
        }
    }
    Ok(())
}
