//! Wire protocol for the Parlor chat service.
//!
//! A strict binary, versioned protocol transmitted over a persistent
//! stream connection. Packets are self-describing: each begins with its
//! identifier, then a message-kind tag, then variant fields in fixed
//! order.
//!
//! ## Packet structure
//!
//! ```text
//! ┌────────────┬──────────┬──────────────────────────┐
//! │ Identifier │   Kind   │      Variant fields      │
//! │ (2 bytes)  │ (1 byte) │        (variable)        │
//! └────────────┴──────────┴──────────────────────────┘
//! ```
//!
//! The legacy `Access` framing (identifier 1) inserts a fixed 17-byte
//! class-name blob between the identifier and the kind tag; everything
//! else is unchanged. Which framing applies is decided once, from the
//! identifier read off the wire, never from payload content.
//!
//! Identifiers are assigned once per variant and never reused or changed
//! across protocol revisions; a mismatched client must fail with "unknown
//! identifier", not misparse.

pub mod factory;
pub mod messages;
pub mod packet;
pub mod pacing;
pub mod wire;

pub use factory::PacketFactory;
pub use packet::{MessageKind, Packet, PacketReader};
pub use pacing::{Pacing, PacingConfig};
