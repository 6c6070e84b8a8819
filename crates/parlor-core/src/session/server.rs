//! Server-side confirm/indication production rules.
//!
//! The directory owns what the protocol contract demands of a server:
//! capacity and duplicate-name checks on enter, identity substitution on
//! exit (a client's claim about *whose* exit it is, is never trusted),
//! private session id assignment, and audience bookkeeping for event
//! rooms. Persistence of room state beyond the process is out of scope.

use std::collections::HashMap;

use tracing::info;

use crate::protocol::messages::{
    BoolToken, CreateRooms, EnterPrivate, EnterPrivateRequest, EnterRoom, EnterRoomConfirm,
    EnterRoomDenial, EnterRoomIndication, EnterRoomRequest, ExitPrivate, ExitPrivateNotice,
    ExitRoom, ExitRoomNotice, PrivatePeer, RoomList, RoomType, UserList, UserListConfirm,
    UserRecord,
};

/// Default occupant ceiling for rooms created without an explicit one.
pub const DEFAULT_ROOM_CAPACITY: usize = 25;

/// Per-room configuration fixed at creation.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    /// How the room is classified.
    pub room_type: RoomType,
    /// Referring page for personal rooms; empty otherwise.
    pub document_base: String,
    /// Occupant ceiling, audience included.
    pub capacity: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            room_type: RoomType::Public,
            document_base: String::new(),
            capacity: DEFAULT_ROOM_CAPACITY,
        }
    }
}

#[derive(Debug)]
struct Room {
    settings: RoomSettings,
    users: Vec<UserRecord>,
    audience: i32,
}

impl Room {
    fn occupants(&self) -> i32 {
        self.users.len() as i32 + self.audience
    }
}

/// The server's room and private-session book.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, Room>,
    privates: HashMap<i32, (String, String)>,
    next_private_id: i32,
}

impl RoomDirectory {
    /// An empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one room; false if the name is taken. Room names are
    /// case-sensitive and unique per server.
    pub fn create_room(&mut self, name: impl Into<String>, settings: RoomSettings) -> bool {
        let name = name.into();
        if self.rooms.contains_key(&name) {
            return false;
        }
        info!(room = %name, "room created");
        self.rooms.insert(
            name,
            Room {
                settings,
                users: Vec::new(),
                audience: 0,
            },
        );
        true
    }

    /// Handle a bulk creation request; the confirm lists what was
    /// actually created (existing names are skipped, not errors).
    pub fn create_rooms(&mut self, names: &[String], settings: &RoomSettings) -> CreateRooms {
        let created: Vec<String> = names
            .iter()
            .filter(|name| self.create_room((*name).clone(), settings.clone()))
            .cloned()
            .collect();
        CreateRooms::Confirm { rooms: created }
    }

    /// Handle a room-list request.
    pub fn room_list(&self, filter: &str) -> RoomList {
        let mut rooms: Vec<String> = self
            .rooms
            .keys()
            .filter(|name| filter.is_empty() || name.contains(filter))
            .cloned()
            .collect();
        rooms.sort();
        RoomList::Confirm { rooms }
    }

    /// Handle a user-list request; `None` when the room does not exist.
    pub fn user_list(&self, room_name: &str) -> Option<UserList> {
        let room = self.rooms.get(room_name)?;
        Some(UserList::Confirm(UserListConfirm {
            room_type: room.settings.room_type,
            document_base: room.settings.document_base.clone(),
            users: room.users.clone(),
        }))
    }

    /// Handle an enter request from a connection whose host and member
    /// status the server already knows.
    ///
    /// Returns the confirm for the requester and, on success, the
    /// indication to broadcast to the room's existing occupants. An
    /// empty requested name enters as a silent audience member: counted,
    /// never listed.
    pub fn enter(
        &mut self,
        request: &EnterRoomRequest,
        host: &str,
        is_member: bool,
        show_link: bool,
    ) -> (EnterRoom, Option<EnterRoom>) {
        let Some(room) = self.rooms.get_mut(&request.room_name) else {
            return (denied(EnterRoomDenial::NoSuchRoom), None);
        };
        if room.occupants() as usize >= room.settings.capacity {
            return (denied(EnterRoomDenial::RoomFull), None);
        }
        if !request.user_name.is_empty() {
            if let Some(present) = room.users.iter().find(|u| u.name == request.user_name) {
                let reason = if present.member.is_true() {
                    EnterRoomDenial::MemberTaken
                } else {
                    EnterRoomDenial::NameTaken
                };
                return (denied(reason), None);
            }
        }

        let user = if request.user_name.is_empty() {
            room.audience += 1;
            UserRecord::audience(host)
        } else {
            let record = UserRecord {
                name: request.user_name.clone(),
                profile: request.profile.clone(),
                host: host.to_owned(),
                member: BoolToken::from(is_member),
                link: BoolToken::from(show_link),
            };
            room.users.push(record.clone());
            record
        };

        let confirm = EnterRoom::Confirm(EnterRoomConfirm::Granted {
            room_type: room.settings.room_type,
            occupants: room.occupants(),
            users: room.users.clone(),
        });
        let indication = EnterRoom::Indication(EnterRoomIndication {
            room_name: request.room_name.clone(),
            user,
        });
        (confirm, Some(indication))
    }

    /// Handle an exit request.
    ///
    /// `recorded_user` is the identity the server holds for the
    /// requesting connection; the claimed name inside the request is
    /// ignored, so a client cannot announce someone else's departure.
    /// Returns the indication for the remaining occupants, or `None`
    /// when the room or occupant is unknown.
    pub fn exit(&mut self, request: &ExitRoomNotice, recorded_user: &str) -> Option<ExitRoom> {
        let room = self.rooms.get_mut(&request.room_name)?;
        let at = room.users.iter().position(|u| u.name == recorded_user)?;
        room.users.remove(at);
        Some(ExitRoom::Indication(ExitRoomNotice {
            room_name: request.room_name.clone(),
            user_name: recorded_user.to_owned(),
        }))
    }

    /// One audience member left an event room.
    pub fn exit_audience(&mut self, room_name: &str) {
        if let Some(room) = self.rooms.get_mut(room_name) {
            room.audience = (room.audience - 1).max(0);
        }
    }

    /// Open a private session between two occupants of a room.
    ///
    /// Returns the assigned id, the indication for the invited party
    /// (carrying the requester's details) and the confirm for the
    /// requester (carrying the invited party's details). `None` when
    /// either party is not in the named room.
    pub fn open_private(
        &mut self,
        request: &EnterPrivateRequest,
    ) -> Option<(i32, EnterPrivate, EnterPrivate)> {
        let room = self.rooms.get(&request.room_name)?;
        let from = room.users.iter().find(|u| u.name == request.from_user)?;
        let to = room.users.iter().find(|u| u.name == request.to_user)?;

        self.next_private_id += 1;
        let room_id = self.next_private_id;
        self.privates
            .insert(room_id, (from.name.clone(), to.name.clone()));

        let indication = EnterPrivate::Indication(PrivatePeer {
            room_id,
            user_name: from.name.clone(),
            profile: from.profile.clone(),
            host: from.host.clone(),
        });
        let confirm = EnterPrivate::Confirm(PrivatePeer {
            room_id,
            user_name: to.name.clone(),
            profile: to.profile.clone(),
            host: to.host.clone(),
        });
        Some((room_id, indication, confirm))
    }

    /// Close a private session. As with rooms, the indication carries
    /// the recorded identity, not the claim.
    pub fn close_private(&mut self, room_id: i32, recorded_user: &str) -> Option<ExitPrivate> {
        let (a, b) = self.privates.remove(&room_id)?;
        if a != recorded_user && b != recorded_user {
            // Not a party to this session; nothing to indicate.
            self.privates.insert(room_id, (a, b));
            return None;
        }
        Some(ExitPrivate::Indication(ExitPrivateNotice {
            room_id,
            user_name: recorded_user.to_owned(),
        }))
    }

    /// Occupant count of a room, audience included.
    pub fn occupants(&self, room_name: &str) -> Option<i32> {
        self.rooms.get(room_name).map(Room::occupants)
    }
}

fn denied(reason: EnterRoomDenial) -> EnterRoom {
    EnterRoom::Confirm(EnterRoomConfirm::Denied(reason))
}
