//! Minimal netlink plumbing for one sock_diag request/response exchange.
//!
//! This is not a general netlink library: it holds exactly what a dump
//! request to NETLINK_SOCK_DIAG needs, namely the envelope header and its
//! iterator, attribute walking, a request builder, and a blocking socket
//! with a receive timeout.

pub mod attr;
mod builder;
mod error;
pub mod message;
mod socket;

pub use attr::{AttrIter, NlAttr};
pub use builder::MessageBuilder;
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};
pub use socket::{NetlinkSocket, RECV_BUF_SIZE, RECV_TIMEOUT, Transport};
