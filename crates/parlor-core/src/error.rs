//! Error types for the Parlor protocol layer.
//!
//! Protocol-level denial codes (room full, bad password, …) are ordinary
//! `Confirm` payload values, never errors; this taxonomy covers only the
//! faults that make a byte stream or an encode request unusable.

use thiserror::Error;

/// Core error type for protocol operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The byte stream is inconsistent: bad kind tag, invalid string data,
    /// a count field that cannot fit the remaining bytes, a wrong legacy
    /// blob. The connection must be treated as unusable and closed.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// The factory has no entry for this identifier. Close the connection
    /// cleanly; the id is worth logging for diagnostics.
    #[error("unknown packet identifier: {0}")]
    UnknownIdentifier(u16),

    /// A field violates a wire width constraint at encode time (string over
    /// 65 535 encoded bytes, byte-count list over 255 entries). Surfaced
    /// before any byte is written.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Transport fault, propagated unchanged. This layer never retries.
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    /// The buffer holds a packet prefix but not a whole packet yet. Only
    /// the streaming reader observes this; whole-packet decoding converts
    /// it to [`Error::Malformed`].
    #[error("incomplete packet")]
    Incomplete,

    /// An operation was attempted in a handshake state that does not
    /// allow it (e.g. entering a room before access is granted).
    #[error("invalid session state: {0}")]
    BadState(&'static str),
}

/// Result type alias using the protocol [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error requires dropping the connection.
    ///
    /// Malformed streams and unknown identifiers leave the stream position
    /// undefined; there is no mid-packet recovery.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Malformed(_) | Error::UnknownIdentifier(_) | Error::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::Malformed("x".into()).is_fatal());
        assert!(Error::UnknownIdentifier(99).is_fatal());
        assert!(!Error::Encoding("x".into()).is_fatal());
        assert!(!Error::Incomplete.is_fatal());
    }

    #[test]
    fn test_display_carries_identifier() {
        let msg = Error::UnknownIdentifier(42).to_string();
        assert!(msg.contains("42"));
    }
}
