//! The packet envelope and stream framing.
//!
//! A [`Packet`] wraps one catalog body together with the local-only
//! `handled` flag. The flag never goes on the wire: it exists so that,
//! when several observers hold the same decoded instance (one connection,
//! many open windows), exactly one of them applies the side effects.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::{Buf, Bytes, BytesMut};
use tracing::warn;

use crate::error::{Error, Result};
use crate::logging::HexPreview;
use crate::protocol::factory::PacketFactory;
use crate::protocol::messages::Body;
use crate::protocol::wire::{WireReader, WireWriter};

/// Which phase of an exchange an encoded instance represents.
///
/// Always decoded before any variant field; every decoder validates the
/// tag against the kinds its variant supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    /// Outbound ask from a client.
    Request = 1,
    /// Server push not directly solicited by the recipient.
    Indication = 2,
    /// Server's direct reply to a request on the same connection.
    Confirm = 3,
    /// Liveness echo (ping only).
    Response = 4,
}

impl MessageKind {
    /// Parse the wire tag.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(Self::Request),
            2 => Ok(Self::Indication),
            3 => Ok(Self::Confirm),
            4 => Ok(Self::Response),
            _ => Err(Error::Malformed(format!("invalid message kind: {byte:#04x}"))),
        }
    }

    /// Convert to the wire tag.
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// One decoded or to-be-sent message.
///
/// A packet is created fresh for every logical exchange and never mutated
/// after being handed to the transport; the one exception is the handled
/// flag, flipped at most once by the first consumer.
#[derive(Debug)]
pub struct Packet {
    body: Body,
    handled: AtomicBool,
}

impl Packet {
    /// Wrap a catalog body.
    pub fn new(body: Body) -> Self {
        Self {
            body,
            handled: AtomicBool::new(false),
        }
    }

    /// The message body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Take the body out of the envelope.
    pub fn into_body(self) -> Body {
        self.body
    }

    /// The wire identifier of this variant.
    pub fn identifier(&self) -> u16 {
        self.body.identifier()
    }

    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// Claim this packet for processing.
    ///
    /// Returns true for exactly one caller across all threads; everyone
    /// else sees false and must not re-apply the side effects.
    pub fn mark_handled(&self) -> bool {
        self.handled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether some observer has already acted on this instance.
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Encode the whole packet.
    ///
    /// Either the complete byte sequence is produced or an error is
    /// returned before anything reaches the transport; there is no
    /// partially written packet.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut w = WireWriter::new();
        w.write_u16(self.body.identifier());
        self.body.write(&mut w)?;
        Ok(w.into_bytes())
    }
}

impl Clone for Packet {
    /// Cloning produces a fresh, unhandled instance.
    fn clone(&self) -> Self {
        Self::new(self.body.clone())
    }
}

impl PartialEq for Packet {
    /// Equality is over the body only; the handled flag is processing
    /// state, not message content.
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}

impl From<Body> for Packet {
    fn from(body: Body) -> Self {
        Self::new(body)
    }
}

/// Accumulates transport bytes and extracts whole packets.
///
/// Packets are self-describing with no outer length prefix, so the reader
/// attempts a decode on every call and distinguishes "not enough bytes
/// yet" from a genuinely bad stream.
#[derive(Debug, Default)]
pub struct PacketReader {
    buf: BytesMut,
}

impl PacketReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Add received bytes to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Try to extract one complete packet.
    ///
    /// Returns `Ok(Some(packet))` when a whole packet was decoded,
    /// `Ok(None)` when more bytes are needed, or an error for a bad
    /// stream. On error the buffer is cleared; the connection must be
    /// closed, there is no resynchronizing mid-stream.
    pub fn try_read(&mut self, factory: &PacketFactory) -> Result<Option<Packet>> {
        if self.buf.len() < 3 {
            return Ok(None);
        }
        let mut reader = WireReader::new(&self.buf);
        match factory.decode_body(&mut reader) {
            Ok(body) => {
                let consumed = reader.consumed();
                self.buf.advance(consumed);
                Ok(Some(Packet::new(body)))
            }
            Err(Error::Incomplete) => Ok(None),
            Err(e) => {
                warn!(preview = %HexPreview(&self.buf), "dropping malformed stream");
                self.buf.clear();
                Err(e)
            }
        }
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Clear the buffer (after a protocol error).
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
