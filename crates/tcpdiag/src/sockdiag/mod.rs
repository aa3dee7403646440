//! Sampling of established TCP connections through NETLINK_SOCK_DIAG.
//!
//! A [`Session`] sends one inet_diag dump request per call, restricted to
//! sockets in the ESTABLISHED state and asking for the `tcp_info`
//! extension. Every INET_DIAG_INFO attribute in the reply becomes one
//! [`Sample`] in a fresh [`SampleStore`].
//!
//! # Example
//!
//! ```ignore
//! use tcpdiag::sockdiag::{AddressFamily, Session};
//!
//! let mut session = Session::open()?;
//! for store in session.sample_all(&[AddressFamily::Inet, AddressFamily::Inet6])? {
//!     for sample in &store {
//!         let info = sample.info();
//!         println!(
//!             "{} -> {} rtt {:?} cwnd {}",
//!             sample.local(),
//!             sample.remote(),
//!             info.rtt(),
//!             info.snd_cwnd
//!         );
//!     }
//! }
//! session.close();
//! ```

pub mod codec;
mod sample;
mod session;
mod store;
mod tcp_info;
mod types;
pub mod wire;

#[cfg(test)]
mod fixtures;

pub use codec::{Progress, build_request, parse_datagram};
pub use sample::{RawTcpInfo, Sample, TCP_INFO_LEN};
pub use session::{Session, SessionState};
pub use store::{INITIAL_CAPACITY, SampleStore};
pub use tcp_info::TcpInfo;
pub use types::{AddressFamily, InetExtension, TcpState};
