//! Fixed-layout inet_diag records.
//!
//! Each record mirrors the kernel ABI in `linux/inet_diag.h` field for
//! field. Ports are declared big-endian; every other integer is in host
//! byte order. Records are always copied out of received buffers, never
//! borrowed in place, so the receive buffer's alignment does not matter.

use zerocopy::byteorder::network_endian::U16;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::netlink::{Error, Result};

/// Socket identity (mirrors struct inet_diag_sockid).
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagSockId {
    /// Source port (network byte order).
    pub idiag_sport: U16,
    /// Destination port (network byte order).
    pub idiag_dport: U16,
    /// Source address; only the first 4 bytes are used for IPv4.
    pub idiag_src: [u8; 16],
    /// Destination address; only the first 4 bytes are used for IPv4.
    pub idiag_dst: [u8; 16],
    /// Interface index.
    pub idiag_if: u32,
    /// Socket cookie.
    pub idiag_cookie: [u32; 2],
}

/// Dump request body (mirrors struct inet_diag_req_v2).
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagReqV2 {
    pub sdiag_family: u8,
    pub sdiag_protocol: u8,
    /// Bitmask of requested extensions.
    pub idiag_ext: u8,
    pub pad: u8,
    /// Bitmask of requested TCP states.
    pub idiag_states: u32,
    pub id: InetDiagSockId,
}

impl InetDiagReqV2 {
    /// An all-zero request; callers fill in family, protocol and masks.
    pub fn zeroed() -> Self {
        Self::new_zeroed()
    }
}

/// Per-socket response record (mirrors struct inet_diag_msg).
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagMsg {
    pub idiag_family: u8,
    pub idiag_state: u8,
    pub idiag_timer: u8,
    pub idiag_retrans: u8,
    pub id: InetDiagSockId,
    pub idiag_expires: u32,
    pub idiag_rqueue: u32,
    pub idiag_wqueue: u32,
    pub idiag_uid: u32,
    pub idiag_inode: u32,
}

impl InetDiagMsg {
    /// Size of the record on the wire.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Copy the record out of the front of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}
