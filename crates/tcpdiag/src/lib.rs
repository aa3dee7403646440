//! Established TCP connection sampling for Linux.
//!
//! Opens a NETLINK_SOCK_DIAG socket, dumps every ESTABLISHED TCP socket of
//! an address family together with the kernel's `tcp_info`, and hands the
//! result back as an owned [`SampleStore`].
//!
//! # Features
//!
//! - `serde` - `Serialize` for samples, address families and decoded `tcp_info`
//! - `integration` - tests that talk to the running kernel
//!
//! # Example
//!
//! ```ignore
//! use tcpdiag::{AddressFamily, Session};
//!
//! fn main() -> tcpdiag::Result<()> {
//!     let mut session = Session::open()?;
//!     let samples = session.sample(AddressFamily::Inet)?;
//!     println!("{} established connections", samples.len());
//!     session.close();
//!     Ok(())
//! }
//! ```

pub mod netlink;
pub mod sockdiag;

pub use netlink::{Error, Result};
pub use sockdiag::{AddressFamily, Sample, SampleStore, Session, TcpInfo};
