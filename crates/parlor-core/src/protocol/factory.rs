//! The identifier registry: raw bytes in, the right variant out.
//!
//! A fixed identifier→decoder table built once at startup. Unknown
//! identifiers are a recoverable error so the transport can close the
//! connection cleanly instead of crashing on a hostile or mismatched
//! peer.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Error, Result};
use crate::protocol::messages::{
    id, Access, AccessFraming, Authenticate, Beep, Body, Chat, CreateRooms, EnterPrivate,
    EnterRoom, ExitPrivate, ExitRoom, Halt, Kick, Monitor, PasswordAccess, Ping, Report,
    RoomList, UserList, Whisper,
};
use crate::protocol::packet::Packet;
use crate::protocol::wire::WireReader;

type DecodeFn = fn(&mut WireReader<'_>) -> Result<Body>;

/// Identifier→decoder registry.
///
/// Two identifiers resolve to `Access`: the legacy one selects the
/// legacy-framing decoder at the table, not via payload sniffing. The
/// restricted table leaves out the operator-only variants entirely; a
/// slimmed client build treats their identifiers like any other unknown
/// id, shrinking its decode surface on purpose.
#[derive(Debug)]
pub struct PacketFactory {
    table: HashMap<u16, DecodeFn>,
}

impl PacketFactory {
    /// The complete catalog.
    pub fn full() -> Self {
        let mut factory = Self::restricted();
        factory.table.insert(id::HALT, |r| Halt::read(r).map(Body::Halt));
        factory
            .table
            .insert(id::MONITOR, |r| Monitor::read(r).map(Body::Monitor));
        factory
            .table
            .insert(id::REPORT, |r| Report::read(r).map(Body::Report));
        factory
    }

    /// The catalog without the operator-only variants
    /// (`Halt`, `Monitor`, `Report`).
    pub fn restricted() -> Self {
        let mut table: HashMap<u16, DecodeFn> = HashMap::new();
        table.insert(id::ACCESS_OLD, |r| {
            Access::read(r, AccessFraming::Legacy).map(Body::Access)
        });
        table.insert(id::ACCESS, |r| {
            Access::read(r, AccessFraming::Standard).map(Body::Access)
        });
        table.insert(id::PASSWORD_ACCESS, |r| {
            PasswordAccess::read(r).map(Body::PasswordAccess)
        });
        table.insert(id::AUTHENTICATE, |r| {
            Authenticate::read(r).map(Body::Authenticate)
        });
        table.insert(id::ENTER_ROOM, |r| EnterRoom::read(r).map(Body::EnterRoom));
        table.insert(id::EXIT_ROOM, |r| ExitRoom::read(r).map(Body::ExitRoom));
        table.insert(id::ENTER_PRIVATE, |r| {
            EnterPrivate::read(r).map(Body::EnterPrivate)
        });
        table.insert(id::EXIT_PRIVATE, |r| {
            ExitPrivate::read(r).map(Body::ExitPrivate)
        });
        table.insert(id::CHAT, |r| Chat::read(r).map(Body::Chat));
        table.insert(id::WHISPER, |r| Whisper::read(r).map(Body::Whisper));
        table.insert(id::BEEP, |r| Beep::read(r).map(Body::Beep));
        table.insert(id::KICK, |r| Kick::read(r).map(Body::Kick));
        table.insert(id::ROOM_LIST, |r| RoomList::read(r).map(Body::RoomList));
        table.insert(id::USER_LIST, |r| UserList::read(r).map(Body::UserList));
        table.insert(id::CREATE_ROOMS, |r| {
            CreateRooms::read(r).map(Body::CreateRooms)
        });
        table.insert(id::PING, |r| Ping::read(r).map(Body::Ping));
        Self { table }
    }

    /// Whether this table resolves an identifier.
    pub fn knows(&self, identifier: u16) -> bool {
        self.table.contains_key(&identifier)
    }

    /// Decode one packet from a complete byte sequence.
    ///
    /// The buffer must hold exactly one packet: a truncated buffer or
    /// trailing bytes are both malformed.
    pub fn decode(&self, bytes: &[u8]) -> Result<Packet> {
        let mut reader = WireReader::new(bytes);
        let body = match self.decode_body(&mut reader) {
            Err(Error::Incomplete) => {
                return Err(Error::Malformed("truncated packet".into()));
            }
            other => other?,
        };
        if reader.remaining() != 0 {
            return Err(Error::Malformed(format!(
                "{} trailing bytes after packet",
                reader.remaining()
            )));
        }
        Ok(Packet::new(body))
    }

    /// Decode the identifier and dispatch to the variant decoder.
    pub(crate) fn decode_body(&self, reader: &mut WireReader<'_>) -> Result<Body> {
        let identifier = reader.read_u16()?;
        let decode = self.table.get(&identifier).ok_or_else(|| {
            warn!(identifier, "unknown packet identifier");
            Error::UnknownIdentifier(identifier)
        })?;
        decode(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{AccessRequest, ChatMessage, ChatTarget};

    fn encode(body: Body) -> Vec<u8> {
        Packet::new(body).to_bytes().expect("encode").to_vec()
    }

    #[test]
    fn test_full_table_resolves_whole_catalog() {
        let factory = PacketFactory::full();
        for identifier in 1..=19u16 {
            assert!(factory.knows(identifier), "missing identifier {identifier}");
        }
        assert!(!factory.knows(0));
        assert!(!factory.knows(20));
    }

    #[test]
    fn test_restricted_table_omits_operator_variants() {
        let restricted = PacketFactory::restricted();
        for identifier in [id::HALT, id::MONITOR, id::REPORT] {
            assert!(!restricted.knows(identifier));
        }
        // Everything else still resolves.
        for identifier in 1..=16u16 {
            assert!(restricted.knows(identifier));
        }
    }

    #[test]
    fn test_restricted_decode_fails_like_unknown() {
        let restricted = PacketFactory::restricted();
        let bytes = encode(Body::Halt(Halt::Request {
            password: "x".into(),
        }));
        match restricted.decode(&bytes) {
            Err(Error::UnknownIdentifier(got)) => assert_eq!(got, id::HALT),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_legacy_identifier_selects_legacy_framing() {
        let factory = PacketFactory::full();
        let legacy = Body::Access(Access::legacy_request(AccessRequest::default()));
        let packet = factory.decode(&encode(legacy.clone())).expect("decode");
        assert_eq!(packet.identifier(), id::ACCESS_OLD);
        assert_eq!(packet.body(), &legacy);

        let standard = Body::Access(Access::request(AccessRequest::default()));
        let packet = factory.decode(&encode(standard.clone())).expect("decode");
        assert_eq!(packet.identifier(), id::ACCESS);
        assert_eq!(packet.body(), &standard);
    }

    #[test]
    fn test_unknown_identifier_is_recoverable() {
        let factory = PacketFactory::full();
        let err = factory.decode(&[0x12, 0x34, 0x01]).unwrap_err();
        match err {
            Error::UnknownIdentifier(got) => assert_eq!(got, 0x1234),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_packet_is_malformed() {
        let factory = PacketFactory::full();
        let bytes = encode(Body::Chat(Chat::Request(ChatMessage {
            target: ChatTarget::Room("Lobby".into()),
            user_name: "alice".into(),
            text: "hello".into(),
        })));
        let err = factory.decode(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_trailing_bytes_are_malformed() {
        let factory = PacketFactory::full();
        let mut bytes = encode(Body::Ping(Ping::Request));
        bytes.push(0xAA);
        let err = factory.decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }
}
