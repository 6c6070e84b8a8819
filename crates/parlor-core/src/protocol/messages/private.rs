//! Private two-party session packets.
//!
//! A private session is keyed by a server-assigned integer id scoped to
//! the connection, not globally unique. Opening is three-phase: A's
//! request, an indication to B carrying A's details, and a confirm back
//! to A carrying B's details; both ends learn the id from their leg.

use crate::error::Result;
use crate::protocol::messages::read_kind;
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

/// Ask the server to open a private session with another occupant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterPrivateRequest {
    /// Public room where the other party was seen.
    pub room_name: String,
    /// Requester's name.
    pub from_user: String,
    /// Other party's name.
    pub to_user: String,
}

/// One end of an established private session: the indication tells B
/// about A, the confirm tells A about B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivatePeer {
    /// Server-assigned session id.
    pub room_id: i32,
    /// The peer's name.
    pub user_name: String,
    /// The peer's profile line.
    pub profile: String,
    /// The peer's host.
    pub host: String,
}

impl PrivatePeer {
    fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_i32(self.room_id);
        w.write_string(&self.user_name)?;
        w.write_string(&self.profile)?;
        w.write_string(&self.host)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            room_id: r.read_i32()?,
            user_name: r.read_string()?,
            profile: r.read_string()?,
            host: r.read_string()?,
        })
    }
}

/// Enter-private packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterPrivate {
    /// A asks for a session with B.
    Request(EnterPrivateRequest),
    /// Delivered to B with A's details.
    Indication(PrivatePeer),
    /// Delivered back to A with B's details.
    Confirm(PrivatePeer),
}

impl EnterPrivate {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            EnterPrivate::Request(_) => MessageKind::Request,
            EnterPrivate::Indication(_) => MessageKind::Indication,
            EnterPrivate::Confirm(_) => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            EnterPrivate::Request(req) => {
                w.write_string(&req.room_name)?;
                w.write_string(&req.from_user)?;
                w.write_string(&req.to_user)
            }
            EnterPrivate::Indication(peer) | EnterPrivate::Confirm(peer) => peer.write(w),
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(
            r,
            &[
                MessageKind::Request,
                MessageKind::Indication,
                MessageKind::Confirm,
            ],
        )?;
        Ok(match kind {
            MessageKind::Request => Self::Request(EnterPrivateRequest {
                room_name: r.read_string()?,
                from_user: r.read_string()?,
                to_user: r.read_string()?,
            }),
            MessageKind::Indication => Self::Indication(PrivatePeer::read(r)?),
            _ => Self::Confirm(PrivatePeer::read(r)?),
        })
    }
}

/// A private-session departure, claimed or as recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPrivateNotice {
    /// Session being closed.
    pub room_id: i32,
    /// Departing user.
    pub user_name: String,
}

/// Exit-private packet. As with public rooms, the indication carries the
/// identity the server has on record, never the requester's claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitPrivate {
    /// Client closes its end.
    Request(ExitPrivateNotice),
    /// Server tells the other end.
    Indication(ExitPrivateNotice),
}

impl ExitPrivate {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            ExitPrivate::Request(_) => MessageKind::Request,
            ExitPrivate::Indication(_) => MessageKind::Indication,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        let notice = match self {
            ExitPrivate::Request(n) | ExitPrivate::Indication(n) => n,
        };
        w.write_i32(notice.room_id);
        w.write_string(&notice.user_name)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Indication])?;
        let notice = ExitPrivateNotice {
            room_id: r.read_i32()?,
            user_name: r.read_string()?,
        };
        Ok(match kind {
            MessageKind::Request => Self::Request(notice),
            _ => Self::Indication(notice),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_phase_roundtrip() {
        let packets = [
            EnterPrivate::Request(EnterPrivateRequest {
                room_name: "Lobby".into(),
                from_user: "alice".into(),
                to_user: "bob".into(),
            }),
            EnterPrivate::Indication(PrivatePeer {
                room_id: 7,
                user_name: "alice".into(),
                profile: "hi".into(),
                host: "a.example.net".into(),
            }),
            EnterPrivate::Confirm(PrivatePeer {
                room_id: 7,
                user_name: "bob".into(),
                profile: String::new(),
                host: "b.example.net".into(),
            }),
        ];
        for packet in packets {
            let mut w = WireWriter::new();
            packet.write(&mut w).expect("write");
            let bytes = w.into_bytes();
            assert_eq!(
                EnterPrivate::read(&mut WireReader::new(&bytes)).expect("read"),
                packet
            );
        }
    }

    #[test]
    fn test_exit_private_roundtrip() {
        let packet = ExitPrivate::Request(ExitPrivateNotice {
            room_id: 7,
            user_name: "alice".into(),
        });
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(
            ExitPrivate::read(&mut WireReader::new(&bytes)).expect("read"),
            packet
        );
    }
}
