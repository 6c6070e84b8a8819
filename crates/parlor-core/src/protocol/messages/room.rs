//! Public room membership and listing packets.

use crate::error::{Error, Result};
use crate::protocol::messages::{read_kind, RoomType, UserRecord, USER_RECORD_MIN_BYTES};
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

/// Result code for a granted enter confirm.
const RESULT_OKAY: i32 = 1;

/// Why a room could not be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EnterRoomDenial {
    /// The room is at capacity.
    RoomFull = 2,
    /// The requested name is already present in the room.
    NameTaken = 3,
    /// The requested name belongs to a registered member.
    MemberTaken = 4,
    /// No room by that name.
    NoSuchRoom = 5,
}

impl EnterRoomDenial {
    /// Parse from the wire result code.
    pub fn from_i32(v: i32) -> Result<Self> {
        match v {
            2 => Ok(Self::RoomFull),
            3 => Ok(Self::NameTaken),
            4 => Ok(Self::MemberTaken),
            5 => Ok(Self::NoSuchRoom),
            _ => Err(Error::Malformed(format!("unknown enter-room result: {v}"))),
        }
    }

    /// Convert to the wire result code.
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

/// Ask to join a public room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterRoomRequest {
    /// Room to join.
    pub room_name: String,
    /// Name to appear under.
    pub user_name: String,
    /// Profile line shown to other occupants.
    pub profile: String,
}

/// Broadcast to existing occupants when someone joins.
///
/// An audience entry (empty name and profile) is counted but never
/// listed; event rooms use it for silent spectators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterRoomIndication {
    /// Room joined.
    pub room_name: String,
    /// The new occupant, identity as recorded by the server.
    pub user: UserRecord,
}

/// Answer to the requester.
#[derive(Debug, Clone, PartialEq)]
pub enum EnterRoomConfirm {
    /// Joined; the occupant snapshot accompanies.
    Granted {
        /// How the room is classified.
        room_type: RoomType,
        /// Occupant count including unlisted audience members.
        occupants: i32,
        /// Listed occupants.
        users: Vec<UserRecord>,
    },
    /// Not joined; the session stays where it was.
    Denied(EnterRoomDenial),
}

/// Enter-room packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnterRoom {
    /// Client asks to join.
    Request(EnterRoomRequest),
    /// Server tells existing occupants.
    Indication(EnterRoomIndication),
    /// Server answers the requester.
    Confirm(EnterRoomConfirm),
}

impl EnterRoom {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            EnterRoom::Request(_) => MessageKind::Request,
            EnterRoom::Indication(_) => MessageKind::Indication,
            EnterRoom::Confirm(_) => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            EnterRoom::Request(req) => {
                w.write_string(&req.room_name)?;
                w.write_string(&req.user_name)?;
                w.write_string(&req.profile)
            }
            EnterRoom::Indication(ind) => {
                w.write_string(&ind.room_name)?;
                ind.user.write(w)
            }
            EnterRoom::Confirm(EnterRoomConfirm::Denied(code)) => {
                w.write_i32(code.to_i32());
                Ok(())
            }
            EnterRoom::Confirm(EnterRoomConfirm::Granted {
                room_type,
                occupants,
                users,
            }) => {
                w.write_i32(RESULT_OKAY);
                w.write_i32(room_type.to_i32());
                w.write_i32(*occupants);
                write_user_list(w, users)
            }
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
        match kind {
            MessageKind::Request => Ok(Self::Request(EnterRoomRequest {
                room_name: r.read_string()?,
                user_name: r.read_string()?,
                profile: r.read_string()?,
            })),
            MessageKind::Indication => Ok(Self::Indication(EnterRoomIndication {
                room_name: r.read_string()?,
                user: UserRecord::read(r)?,
            })),
            _ => {
                let result = r.read_i32()?;
                if result != RESULT_OKAY {
                    return Ok(Self::Confirm(EnterRoomConfirm::Denied(
                        EnterRoomDenial::from_i32(result)?,
                    )));
                }
                Ok(Self::Confirm(EnterRoomConfirm::Granted {
                    room_type: RoomType::from_i32(r.read_i32()?)?,
                    occupants: r.read_i32()?,
                    users: read_user_list(r)?,
                }))
            }
        }
    }
}

pub(crate) fn write_user_list(w: &mut WireWriter, users: &[UserRecord]) -> Result<()> {
    if users.len() > crate::MAX_LIST_COUNT {
        return Err(Error::Encoding(format!(
            "user list of {} entries exceeds the count ceiling",
            users.len()
        )));
    }
    w.write_u32(users.len() as u32);
    for user in users {
        user.write(w)?;
    }
    Ok(())
}

pub(crate) fn read_user_list(r: &mut WireReader<'_>) -> Result<Vec<UserRecord>> {
    let count = r.read_list_count(USER_RECORD_MIN_BYTES)?;
    let mut users = Vec::new();
    for _ in 0..count {
        users.push(UserRecord::read(r)?);
    }
    Ok(users)
}

// ---------------------------------------------------------------------
// ExitRoom
// ---------------------------------------------------------------------

/// A departure, as claimed (request) or as recorded (indication).
///
/// The server never rebroadcasts the requester's claimed identity: the
/// indication carries the name the server has on record for that
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRoomNotice {
    /// Room being left.
    pub room_name: String,
    /// Departing user.
    pub user_name: String,
}

/// Exit-room packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitRoom {
    /// Client announces its departure.
    Request(ExitRoomNotice),
    /// Server tells the remaining occupants.
    Indication(ExitRoomNotice),
}

impl ExitRoom {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            ExitRoom::Request(_) => MessageKind::Request,
            ExitRoom::Indication(_) => MessageKind::Indication,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        let notice = match self {
            ExitRoom::Request(n) | ExitRoom::Indication(n) => n,
        };
        w.write_string(&notice.room_name)?;
        w.write_string(&notice.user_name)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Indication])?;
        let notice = ExitRoomNotice {
            room_name: r.read_string()?,
            user_name: r.read_string()?,
        };
        Ok(match kind {
            MessageKind::Request => Self::Request(notice),
            _ => Self::Indication(notice),
        })
    }
}

// ---------------------------------------------------------------------
// RoomList / UserList / CreateRooms
// ---------------------------------------------------------------------

/// Room listing packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomList {
    /// Ask for room names, optionally filtered by substring.
    Request {
        /// Substring filter; empty lists everything.
        filter: String,
    },
    /// The matching room names.
    Confirm {
        /// Room names.
        rooms: Vec<String>,
    },
}

impl RoomList {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            RoomList::Request { .. } => MessageKind::Request,
            RoomList::Confirm { .. } => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            RoomList::Request { filter } => w.write_string(filter),
            RoomList::Confirm { rooms } => w.write_string_list(rooms),
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        Ok(match kind {
            MessageKind::Request => Self::Request {
                filter: r.read_string()?,
            },
            _ => Self::Confirm {
                rooms: r.read_string_list()?,
            },
        })
    }
}

/// Occupant listing confirm payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UserListConfirm {
    /// How the room is classified; personal rooms are told apart from
    /// their referring page by `document_base`.
    pub room_type: RoomType,
    /// Referring page for personal rooms; empty otherwise.
    pub document_base: String,
    /// Listed occupants.
    pub users: Vec<UserRecord>,
}

/// Occupant listing packet.
#[derive(Debug, Clone, PartialEq)]
pub enum UserList {
    /// Ask who is in a room.
    Request {
        /// Room to list.
        room_name: String,
    },
    /// The occupant snapshot.
    Confirm(UserListConfirm),
}

impl UserList {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            UserList::Request { .. } => MessageKind::Request,
            UserList::Confirm(_) => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            UserList::Request { room_name } => w.write_string(room_name),
            UserList::Confirm(confirm) => {
                w.write_i32(confirm.room_type.to_i32());
                w.write_string(&confirm.document_base)?;
                write_user_list(w, &confirm.users)
            }
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        Ok(match kind {
            MessageKind::Request => Self::Request {
                room_name: r.read_string()?,
            },
            _ => Self::Confirm(UserListConfirm {
                room_type: RoomType::from_i32(r.read_i32()?)?,
                document_base: r.read_string()?,
                users: read_user_list(r)?,
            }),
        })
    }
}

/// Bulk room creation packet.
///
/// The only list in the catalog with a u8 count prefix; 255 entries is a
/// hard wire limit, not a policy choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRooms {
    /// Rooms to create.
    Request {
        /// Room names, at most 255.
        rooms: Vec<String>,
    },
    /// Rooms actually created.
    Confirm {
        /// Created room names.
        rooms: Vec<String>,
    },
}

impl CreateRooms {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            CreateRooms::Request { .. } => MessageKind::Request,
            CreateRooms::Confirm { .. } => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        let rooms = match self {
            CreateRooms::Request { rooms } | CreateRooms::Confirm { rooms } => rooms,
        };
        w.write_short_string_list(rooms)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        let rooms = r.read_short_string_list()?;
        Ok(match kind {
            MessageKind::Request => Self::Request { rooms },
            _ => Self::Confirm { rooms },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::BoolToken;

    fn user(name: &str) -> UserRecord {
        UserRecord {
            name: name.into(),
            profile: format!("{name}'s profile"),
            host: "example.net".into(),
            member: BoolToken::no(),
            link: BoolToken::no(),
        }
    }

    fn roundtrip_enter(packet: &EnterRoom) -> EnterRoom {
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        EnterRoom::read(&mut WireReader::new(&bytes)).expect("read")
    }

    #[test]
    fn test_enter_room_request_roundtrip() {
        let packet = EnterRoom::Request(EnterRoomRequest {
            room_name: "Lobby".into(),
            user_name: "bob".into(),
            profile: String::new(),
        });
        assert_eq!(roundtrip_enter(&packet), packet);
    }

    #[test]
    fn test_enter_room_confirm_granted_roundtrip() {
        let packet = EnterRoom::Confirm(EnterRoomConfirm::Granted {
            room_type: RoomType::Public,
            occupants: 3,
            users: vec![user("alice"), user("bob")],
        });
        assert_eq!(roundtrip_enter(&packet), packet);
    }

    #[test]
    fn test_enter_room_denied_is_result_alone() {
        let packet = EnterRoom::Confirm(EnterRoomConfirm::Denied(EnterRoomDenial::RoomFull));
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 5);
        assert_eq!(roundtrip_enter(&packet), packet);
    }

    #[test]
    fn test_audience_indication_roundtrip() {
        let packet = EnterRoom::Indication(EnterRoomIndication {
            room_name: "Keynote".into(),
            user: UserRecord::audience("example.net"),
        });
        let back = roundtrip_enter(&packet);
        match &back {
            EnterRoom::Indication(ind) => assert!(ind.user.is_audience()),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(back, packet);
    }

    #[test]
    fn test_exit_room_roundtrip() {
        let packet = ExitRoom::Indication(ExitRoomNotice {
            room_name: "Lobby".into(),
            user_name: "alice".into(),
        });
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(ExitRoom::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }

    #[test]
    fn test_room_list_empty_confirm() {
        let packet = RoomList::Confirm { rooms: vec![] };
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(RoomList::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }

    #[test]
    fn test_user_list_confirm_roundtrip() {
        let packet = UserList::Confirm(UserListConfirm {
            room_type: RoomType::Personal,
            document_base: "http://example.net/page.html".into(),
            users: vec![user("carol")],
        });
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(UserList::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }

    #[test]
    fn test_user_list_count_overruns_buffer() {
        let mut w = WireWriter::new();
        w.write_u8(MessageKind::Confirm.to_byte());
        w.write_i32(RoomType::Public.to_i32());
        w.write_string("").expect("write");
        w.write_u32(50); // declares 50 records, carries none
        let bytes = w.into_bytes();
        let err = UserList::read(&mut WireReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, Error::Incomplete));
    }

    #[test]
    fn test_create_rooms_boundary() {
        let max: Vec<String> = (0..255).map(|i| format!("r{i}")).collect();
        let packet = CreateRooms::Request { rooms: max };
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(
            CreateRooms::read(&mut WireReader::new(&bytes)).expect("read"),
            packet
        );

        let over: Vec<String> = (0..256).map(|i| format!("r{i}")).collect();
        let packet = CreateRooms::Request { rooms: over };
        let mut w = WireWriter::new();
        assert!(matches!(packet.write(&mut w), Err(Error::Encoding(_))));
    }
}
