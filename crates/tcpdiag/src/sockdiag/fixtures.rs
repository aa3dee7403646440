//! Synthetic kernel responses for tests.

use zerocopy::byteorder::network_endian::U16;
use zerocopy::{FromZeros, IntoBytes};

use crate::netlink::message::NLM_F_MULTI;
use crate::netlink::{MessageBuilder, NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};

use super::wire::InetDiagMsg;

/// One envelope with an arbitrary body.
pub fn envelope(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut builder = MessageBuilder::new(msg_type, NLM_F_MULTI);
    builder.set_seq(seq);
    builder.append_bytes(payload);
    let mut buf = builder.finish();
    // nlmsg_len counts the body without its trailing padding
    let len = (NLMSG_HDRLEN + payload.len()) as u32;
    buf[0..4].copy_from_slice(&len.to_ne_bytes());
    buf
}

/// One attribute, padded.
pub fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
    let mut builder = MessageBuilder::new(0, 0);
    builder.append_attr(kind, payload);
    builder.as_bytes()[NLMSG_HDRLEN..].to_vec()
}

/// A recognisable tcp_info payload of `len` bytes.
pub fn tcp_info_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 + 1).collect()
}

pub fn ipv4_diag(src: [u8; 4], sport: u16, dst: [u8; 4], dport: u16) -> InetDiagMsg {
    let mut msg = InetDiagMsg::new_zeroed();
    msg.idiag_family = libc::AF_INET as u8;
    msg.idiag_state = 1;
    msg.id.idiag_sport = U16::new(sport);
    msg.id.idiag_dport = U16::new(dport);
    msg.id.idiag_src[..4].copy_from_slice(&src);
    msg.id.idiag_dst[..4].copy_from_slice(&dst);
    msg
}

pub fn ipv6_diag(src: [u8; 16], sport: u16, dst: [u8; 16], dport: u16) -> InetDiagMsg {
    let mut msg = InetDiagMsg::new_zeroed();
    msg.idiag_family = libc::AF_INET6 as u8;
    msg.idiag_state = 1;
    msg.id.idiag_sport = U16::new(sport);
    msg.id.idiag_dport = U16::new(dport);
    msg.id.idiag_src = src;
    msg.id.idiag_dst = dst;
    msg
}

/// A diag envelope carrying `msg` and a single INET_DIAG_INFO attribute.
pub fn diag_envelope(seq: u32, msg: &InetDiagMsg, info: &[u8]) -> Vec<u8> {
    diag_envelope_with(seq, msg, &attr(2, info))
}

/// A diag envelope carrying `msg` followed by pre-encoded attributes.
pub fn diag_envelope_with(seq: u32, msg: &InetDiagMsg, attrs: &[u8]) -> Vec<u8> {
    let body = [msg.as_bytes(), attrs].concat();
    envelope(NlMsgType::SOCK_DIAG_BY_FAMILY, seq, &body)
}

pub fn done_envelope(seq: u32) -> Vec<u8> {
    envelope(NlMsgType::DONE, seq, &0i32.to_ne_bytes())
}

/// An error envelope with a complete `nlmsgerr` (code 0 is an ACK).
pub fn error_envelope(seq: u32, code: i32) -> Vec<u8> {
    let err = NlMsgError {
        error: code,
        msg: NlMsgHdr::new(NlMsgType::SOCK_DIAG_BY_FAMILY, 0),
    };
    envelope(NlMsgType::ERROR, seq, err.as_bytes())
}
