//! Liveness probe packet.
//!
//! The one variant using the `Response` kind: no business payload in
//! either direction. What a missed response *means* is defined here (the
//! connection is dead); when to declare it missed is the transport's
//! timeout policy.

use crate::error::Result;
use crate::protocol::messages::read_kind;
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

/// Liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ping {
    /// Probe.
    Request,
    /// Echo.
    Response,
}

impl Ping {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Ping::Request => MessageKind::Request,
            Ping::Response => MessageKind::Response,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        Ok(())
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Response])?;
        Ok(match kind {
            MessageKind::Request => Self::Request,
            _ => Self::Response,
        })
    }
}
