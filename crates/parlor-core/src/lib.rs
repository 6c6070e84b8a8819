//! # Parlor Core Library
//!
//! The wire protocol and session handshake for the Parlor multi-user chat
//! service: a closed set of typed, versioned binary packets exchanged
//! between a client and server over a persistent stream connection, plus
//! the factory that turns raw bytes into the right packet variant and the
//! access → authenticate → room membership state machine those packets
//! encode.
//!
//! ## What lives here
//!
//! - Byte-exact encoding compatible with the deployed Java peers
//!   (big-endian integers, length-prefixed modified-UTF-8 strings)
//! - The full packet catalog, from `Access` through `Report`
//! - The identifier registry, including the legacy `Access` framing used
//!   by pre-challenge clients
//! - Client-side handshake state machine and the server-side
//!   confirm/indication production rules
//!
//! ## What does not
//!
//! Sockets, UI, signature key material and property loading are external
//! collaborators reached through the [`session::Connection`] and
//! [`session::Signer`] traits.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           session (handshake)           │
//! ├─────────────────────────────────────────┤
//! │   protocol (catalog, factory, packet)   │
//! ├─────────────────────────────────────────┤
//! │            protocol::wire               │
//! └─────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum encoded length of a wire string in bytes (u16 length prefix).
pub const MAX_STRING_BYTES: usize = 65_535;

/// Maximum element count accepted for any u32-prefixed wire list.
///
/// The legacy peers trusted counts blindly; this ceiling is a deliberate
/// hardening against memory exhaustion from a corrupt or hostile stream.
pub const MAX_LIST_COUNT: usize = 100_000;

/// Maximum length of a byte blob (challenge/signature, u8 length prefix).
pub const MAX_BLOB_LEN: usize = 255;
