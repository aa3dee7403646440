//! Error types for socket diagnostics sampling.

use std::io;

/// Result type for sampling operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sampling TCP connections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations (open, sockopt, send, recv, timeout).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error envelope.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The (positive) errno value reported by the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// The sample store could not grow.
    #[error("out of memory: cannot grow sample store to {requested} samples")]
    OutOfMemory {
        /// Capacity that was being requested.
        requested: usize,
    },

    /// A fixed-layout record was shorter than its declared size.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected record length.
        expected: usize,
        /// Actual bytes available.
        actual: usize,
    },
}

impl Error {
    /// Create a kernel error from the raw (negative) code carried in an
    /// error envelope.
    pub fn from_errno(errno: i32) -> Self {
        let errno = errno.saturating_neg();
        let message = io::Error::from_raw_os_error(errno).to_string();
        Self::Kernel { errno, message }
    }

    /// The generic failure reported for an error envelope too short to hold
    /// its error record.
    pub fn no_data() -> Self {
        Self::from_errno(-libc::ENODATA)
    }

    /// Get the errno value if this is a kernel or OS error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            Self::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM | libc::EACCES))
    }

    /// Check if this is a "not found" error (ENOENT).
    pub fn is_not_found(&self) -> bool {
        self.errno() == Some(libc::ENOENT)
    }

    /// Check if a receive gave up because the socket timeout expired.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Check if the sample store failed to grow.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}
