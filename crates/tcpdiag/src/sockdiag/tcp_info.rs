//! Named view over the kernel's `struct tcp_info`.
//!
//! Samples keep the block as opaque bytes; [`TcpInfo`] is decoded on demand
//! for callers that want RTT, congestion window and rate figures. Fields the
//! running kernel did not report read as zero.

use std::time::Duration;

use zerocopy::{FromBytes, Immutable, KnownLayout};

use super::sample::{RawTcpInfo, TCP_INFO_LEN};
use super::types::TcpState;

/// Decoded `struct tcp_info` (include/uapi/linux/tcp.h).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TcpInfo {
    pub state: u8,
    pub ca_state: u8,
    pub retransmits: u8,
    pub probes: u8,
    pub backoff: u8,
    pub options: u8,
    /// Send scale in the low nibble, receive scale in the high nibble.
    pub wscale: u8,
    /// Bit 0: delivery rate app limited. Bits 1-2: fastopen client fail.
    pub flags: u8,

    /// Retransmit timeout (usec).
    pub rto: u32,
    /// Delayed ACK timeout (usec).
    pub ato: u32,
    pub snd_mss: u32,
    pub rcv_mss: u32,

    pub unacked: u32,
    pub sacked: u32,
    pub lost: u32,
    pub retrans: u32,
    pub fackets: u32,

    /// Times (msec ago).
    pub last_data_sent: u32,
    pub last_ack_sent: u32,
    pub last_data_recv: u32,
    pub last_ack_recv: u32,

    pub pmtu: u32,
    pub rcv_ssthresh: u32,
    /// Smoothed RTT (usec).
    pub rtt: u32,
    /// RTT variance (usec).
    pub rttvar: u32,
    pub snd_ssthresh: u32,
    /// Send congestion window (segments).
    pub snd_cwnd: u32,
    pub advmss: u32,
    pub reordering: u32,

    pub rcv_rtt: u32,
    pub rcv_space: u32,

    pub total_retrans: u32,

    /// Pacing rate (bytes/sec).
    pub pacing_rate: u64,
    pub max_pacing_rate: u64,
    pub bytes_acked: u64,
    pub bytes_received: u64,
    pub segs_out: u32,
    pub segs_in: u32,

    pub notsent_bytes: u32,
    /// Minimum RTT (usec).
    pub min_rtt: u32,
    pub data_segs_in: u32,
    pub data_segs_out: u32,

    /// Delivery rate (bytes/sec).
    pub delivery_rate: u64,

    /// Time (usec) busy sending data.
    pub busy_time: u64,
    /// Time (usec) limited by the receive window.
    pub rwnd_limited: u64,
    /// Time (usec) limited by the send buffer.
    pub sndbuf_limited: u64,

    pub delivered: u32,
    pub delivered_ce: u32,

    pub bytes_sent: u64,
    pub bytes_retrans: u64,
    pub dsack_dups: u32,
    pub reord_seen: u32,

    pub rcv_ooopack: u32,
    pub snd_wnd: u32,
    pub rcv_wnd: u32,
    pub rehash: u32,

    pub total_rto: u16,
    pub total_rto_recoveries: u16,
    /// Time (msec) spent in RTO recovery.
    pub total_rto_time: u32,
}

const _: () = assert!(std::mem::size_of::<TcpInfo>() == TCP_INFO_LEN);

impl TcpInfo {
    /// Decode a raw block.
    pub fn from_raw(raw: &RawTcpInfo) -> Self {
        // Sizes are equal (checked at compile time), so this cannot fail.
        Self::read_from_bytes(raw.as_bytes()).unwrap_or_default()
    }

    /// Connection state as reported inside tcp_info.
    pub fn tcp_state(&self) -> TcpState {
        TcpState::from_u8(self.state)
    }

    /// Smoothed round-trip time.
    pub fn rtt(&self) -> Duration {
        Duration::from_micros(self.rtt as u64)
    }

    /// Round-trip time variance.
    pub fn rttvar(&self) -> Duration {
        Duration::from_micros(self.rttvar as u64)
    }

    /// Minimum observed round-trip time.
    pub fn min_rtt(&self) -> Duration {
        Duration::from_micros(self.min_rtt as u64)
    }

    /// Delivery rate in bits per second.
    pub fn delivery_rate_bps(&self) -> u64 {
        self.delivery_rate.saturating_mul(8)
    }

    /// Pacing rate in bits per second.
    pub fn pacing_rate_bps(&self) -> u64 {
        self.pacing_rate.saturating_mul(8)
    }

    /// Send window scale.
    pub fn snd_wscale(&self) -> u8 {
        self.wscale & 0x0f
    }

    /// Receive window scale.
    pub fn rcv_wscale(&self) -> u8 {
        self.wscale >> 4
    }

    /// Whether the last delivery rate sample was application limited.
    pub fn delivery_rate_app_limited(&self) -> bool {
        self.flags & 0x01 != 0
    }
}
