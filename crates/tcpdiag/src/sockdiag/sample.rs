//! Connection samples.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::tcp_info::TcpInfo;
use super::types::AddressFamily;
use super::wire::InetDiagMsg;

/// Bytes of `struct tcp_info` kept per sample (Linux 6.7 layout).
pub const TCP_INFO_LEN: usize = 248;

/// The kernel's `tcp_info` block, copied verbatim.
///
/// Payloads shorter than [`TCP_INFO_LEN`] are zero-padded, longer ones are
/// cut at [`TCP_INFO_LEN`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawTcpInfo {
    bytes: [u8; TCP_INFO_LEN],
    reported_len: u16,
}

impl RawTcpInfo {
    /// Copy an INET_DIAG_INFO attribute payload.
    pub fn from_payload(payload: &[u8]) -> Self {
        let len = payload.len().min(TCP_INFO_LEN);
        let mut bytes = [0u8; TCP_INFO_LEN];
        bytes[..len].copy_from_slice(&payload[..len]);
        Self {
            bytes,
            reported_len: len as u16,
        }
    }

    /// The stored block, including any zero padding.
    pub fn as_bytes(&self) -> &[u8; TCP_INFO_LEN] {
        &self.bytes
    }

    /// How many bytes the kernel actually supplied (capped at
    /// [`TCP_INFO_LEN`]).
    pub fn reported_len(&self) -> usize {
        self.reported_len as usize
    }
}

impl Default for RawTcpInfo {
    fn default() -> Self {
        Self {
            bytes: [0u8; TCP_INFO_LEN],
            reported_len: 0,
        }
    }
}

impl std::fmt::Debug for RawTcpInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawTcpInfo")
            .field("reported_len", &self.reported_len)
            .finish_non_exhaustive()
    }
}

/// One point-in-time observation of an established TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Address family.
    pub family: AddressFamily,
    /// Local address; bytes past the family's length are zero.
    pub local_address: [u8; 16],
    /// Local port (host byte order).
    pub local_port: u16,
    /// Remote address; bytes past the family's length are zero.
    pub remote_address: [u8; 16],
    /// Remote port (host byte order).
    pub remote_port: u16,
    /// Kernel TCP statistics.
    pub tcp_info: RawTcpInfo,
}

impl Sample {
    /// Build a sample from a diag record and its INET_DIAG_INFO payload.
    pub fn from_diag(family: AddressFamily, msg: &InetDiagMsg, info: &[u8]) -> Self {
        let al = family.address_len();
        let mut local_address = [0u8; 16];
        let mut remote_address = [0u8; 16];
        local_address[..al].copy_from_slice(&msg.id.idiag_src[..al]);
        remote_address[..al].copy_from_slice(&msg.id.idiag_dst[..al]);

        Self {
            family,
            local_address,
            local_port: msg.id.idiag_sport.get(),
            remote_address,
            remote_port: msg.id.idiag_dport.get(),
            tcp_info: RawTcpInfo::from_payload(info),
        }
    }

    /// Local IP address.
    pub fn local_ip(&self) -> IpAddr {
        ip_addr(self.family, &self.local_address)
    }

    /// Remote IP address.
    pub fn remote_ip(&self) -> IpAddr {
        ip_addr(self.family, &self.remote_address)
    }

    /// Local socket address.
    pub fn local(&self) -> SocketAddr {
        SocketAddr::new(self.local_ip(), self.local_port)
    }

    /// Remote socket address.
    pub fn remote(&self) -> SocketAddr {
        SocketAddr::new(self.remote_ip(), self.remote_port)
    }

    /// Decode the `tcp_info` block into named fields.
    pub fn info(&self) -> TcpInfo {
        TcpInfo::from_raw(&self.tcp_info)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Sample {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Sample", 4)?;
        s.serialize_field("family", &self.family)?;
        s.serialize_field("local", &self.local())?;
        s.serialize_field("remote", &self.remote())?;
        s.serialize_field("tcp_info", &self.info())?;
        s.end()
    }
}

fn ip_addr(family: AddressFamily, bytes: &[u8; 16]) -> IpAddr {
    match family {
        AddressFamily::Inet => IpAddr::V4(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3])),
        AddressFamily::Inet6 => IpAddr::V6(Ipv6Addr::from(*bytes)),
    }
}
