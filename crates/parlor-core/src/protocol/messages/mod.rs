//! The packet catalog: every concrete message variant on the wire.
//!
//! Each variant is a tagged union over the message kinds it supports
//! (request, indication, confirm, response); the kind tag is always
//! decoded before any variant field. Denial outcomes are payload values
//! here, not errors.

mod access;
mod admin;
mod chat;
mod ping;
mod private;
mod room;

pub use access::{
    Access, AccessConfirm, AccessDenial, AccessFraming, AccessPayload, AccessRequest,
    Authenticate, AuthenticateConfirm, AuthenticateRequest, PasswordAccess,
    PasswordAccessConfirm, PasswordAccessRequest, LEGACY_ACCESS_TAG,
};
pub use admin::{Halt, Kick, KickMethod, KickRequest, Monitor, Report};
pub use chat::{Beep, BeepSignal, Chat, ChatMessage, ChatTarget, Whisper, WhisperMessage};
pub use ping::Ping;
pub use private::{
    EnterPrivate, EnterPrivateRequest, ExitPrivate, ExitPrivateNotice, PrivatePeer,
};
pub use room::{
    CreateRooms, EnterRoom, EnterRoomConfirm, EnterRoomDenial, EnterRoomIndication,
    EnterRoomRequest, ExitRoom, ExitRoomNotice, RoomList, UserList, UserListConfirm,
};

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

/// Stable numeric identifiers, one per variant (two for `Access`).
///
/// Never reuse or renumber these: a peer built against an older table must
/// fail with "unknown identifier", not decode the wrong variant.
pub mod id {
    /// Access in the legacy (pre-challenge) framing.
    pub const ACCESS_OLD: u16 = 1;
    /// Access in the standard framing.
    pub const ACCESS: u16 = 2;
    /// Member/monitor/admin access.
    pub const PASSWORD_ACCESS: u16 = 3;
    /// Challenge-response authentication.
    pub const AUTHENTICATE: u16 = 4;
    /// Enter a public room.
    pub const ENTER_ROOM: u16 = 5;
    /// Leave a public room.
    pub const EXIT_ROOM: u16 = 6;
    /// Open a private two-party session.
    pub const ENTER_PRIVATE: u16 = 7;
    /// Close a private session.
    pub const EXIT_PRIVATE: u16 = 8;
    /// Room or private-session chat line.
    pub const CHAT: u16 = 9;
    /// Targeted message inside a room.
    pub const WHISPER: u16 = 10;
    /// Attention signal to one occupant.
    pub const BEEP: u16 = 11;
    /// Remove/kick/ban an occupant.
    pub const KICK: u16 = 12;
    /// List public rooms.
    pub const ROOM_LIST: u16 = 13;
    /// List a room's occupants.
    pub const USER_LIST: u16 = 14;
    /// Create rooms in bulk.
    pub const CREATE_ROOMS: u16 = 15;
    /// Liveness probe.
    pub const PING: u16 = 16;
    /// Operator: shut the server down.
    pub const HALT: u16 = 17;
    /// Operator: watch a room.
    pub const MONITOR: u16 = 18;
    /// Operator: request a status report.
    pub const REPORT: u16 = 19;
}

// ---------------------------------------------------------------------
// Shared field types
// ---------------------------------------------------------------------

/// A boolean carried on the wire as the literal string `"true"`/`"false"`.
///
/// Older peers compare these tokens textually, so the token round-trips
/// byte-for-byte instead of collapsing to a native bool; a proxying hop
/// must not rewrite what it merely forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolToken(String);

impl BoolToken {
    /// The canonical true token.
    pub fn yes() -> Self {
        Self("true".into())
    }

    /// The canonical false token.
    pub fn no() -> Self {
        Self("false".into())
    }

    /// Wrap a raw token as read off the wire.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token text.
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Whether the token reads as true (exact match on `"true"`).
    pub fn is_true(&self) -> bool {
        self.0 == "true"
    }
}

impl From<bool> for BoolToken {
    fn from(v: bool) -> Self {
        if v {
            Self::yes()
        } else {
            Self::no()
        }
    }
}

/// One room occupant as carried in indications and confirms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Display name; empty for a counted-but-unlisted audience member.
    pub name: String,
    /// Free-text profile line; empty for audience members.
    pub profile: String,
    /// Host the user connected from.
    pub host: String,
    /// Member flag token.
    pub member: BoolToken,
    /// Profile-link flag token.
    pub link: BoolToken,
}

impl UserRecord {
    /// An audience entry: counted in the room but never listed.
    pub fn audience(host: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            profile: String::new(),
            host: host.into(),
            member: BoolToken::no(),
            link: BoolToken::no(),
        }
    }

    /// Whether this record is an audience entry.
    pub fn is_audience(&self) -> bool {
        self.name.is_empty() && self.profile.is_empty()
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_string(&self.name)?;
        w.write_string(&self.profile)?;
        w.write_string(&self.host)?;
        w.write_string(self.member.token())?;
        w.write_string(self.link.token())
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            name: r.read_string()?,
            profile: r.read_string()?,
            host: r.read_string()?,
            member: BoolToken::from_token(r.read_string()?),
            link: BoolToken::from_token(r.read_string()?),
        })
    }
}

/// Minimum encoded size of a [`UserRecord`]: five empty strings.
pub(crate) const USER_RECORD_MIN_BYTES: usize = 10;

/// How a room is classified in user-list confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RoomType {
    /// An ordinary public room.
    Public = 1,
    /// A moderated event room with a silent audience.
    Event = 2,
    /// An auto-created room tied to a referring page.
    Personal = 3,
}

impl RoomType {
    /// Parse from the wire integer.
    pub fn from_i32(v: i32) -> Result<Self> {
        match v {
            1 => Ok(Self::Public),
            2 => Ok(Self::Event),
            3 => Ok(Self::Personal),
            _ => Err(Error::Malformed(format!("unknown room type: {v}"))),
        }
    }

    /// Convert to the wire integer.
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

/// A password field: zeroed on drop, redacted in debug output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Wrap a password.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the cleartext for encoding.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<&str> for Secret {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

// ---------------------------------------------------------------------
// Body: the catalog as one sum type
// ---------------------------------------------------------------------

/// Every message variant the protocol knows.
///
/// Exhaustive matching here is what guarantees a new variant cannot ship
/// half-wired: adding one without an identifier, encoder and factory entry
/// does not compile.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Access negotiation (standard or legacy framing).
    Access(Access),
    /// Member/monitor/admin access negotiation.
    PasswordAccess(PasswordAccess),
    /// Challenge-response authentication.
    Authenticate(Authenticate),
    /// Enter a public room.
    EnterRoom(EnterRoom),
    /// Leave a public room.
    ExitRoom(ExitRoom),
    /// Open a private session.
    EnterPrivate(EnterPrivate),
    /// Close a private session.
    ExitPrivate(ExitPrivate),
    /// Chat line.
    Chat(Chat),
    /// Whisper.
    Whisper(Whisper),
    /// Beep.
    Beep(Beep),
    /// Occupant removal.
    Kick(Kick),
    /// Room listing.
    RoomList(RoomList),
    /// Occupant listing.
    UserList(UserList),
    /// Bulk room creation.
    CreateRooms(CreateRooms),
    /// Liveness probe.
    Ping(Ping),
    /// Operator shutdown.
    Halt(Halt),
    /// Operator room watch.
    Monitor(Monitor),
    /// Operator status report.
    Report(Report),
}

impl Body {
    /// The wire identifier for this variant (framing-sensitive for Access).
    pub fn identifier(&self) -> u16 {
        match self {
            Body::Access(a) => match a.framing {
                AccessFraming::Legacy => id::ACCESS_OLD,
                AccessFraming::Standard => id::ACCESS,
            },
            Body::PasswordAccess(_) => id::PASSWORD_ACCESS,
            Body::Authenticate(_) => id::AUTHENTICATE,
            Body::EnterRoom(_) => id::ENTER_ROOM,
            Body::ExitRoom(_) => id::EXIT_ROOM,
            Body::EnterPrivate(_) => id::ENTER_PRIVATE,
            Body::ExitPrivate(_) => id::EXIT_PRIVATE,
            Body::Chat(_) => id::CHAT,
            Body::Whisper(_) => id::WHISPER,
            Body::Beep(_) => id::BEEP,
            Body::Kick(_) => id::KICK,
            Body::RoomList(_) => id::ROOM_LIST,
            Body::UserList(_) => id::USER_LIST,
            Body::CreateRooms(_) => id::CREATE_ROOMS,
            Body::Ping(_) => id::PING,
            Body::Halt(_) => id::HALT,
            Body::Monitor(_) => id::MONITOR,
            Body::Report(_) => id::REPORT,
        }
    }

    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Body::Access(a) => a.kind(),
            Body::PasswordAccess(p) => p.kind(),
            Body::Authenticate(a) => a.kind(),
            Body::EnterRoom(e) => e.kind(),
            Body::ExitRoom(e) => e.kind(),
            Body::EnterPrivate(e) => e.kind(),
            Body::ExitPrivate(e) => e.kind(),
            Body::Chat(c) => c.kind(),
            Body::Whisper(w) => w.kind(),
            Body::Beep(b) => b.kind(),
            Body::Kick(_) => MessageKind::Request,
            Body::RoomList(r) => r.kind(),
            Body::UserList(u) => u.kind(),
            Body::CreateRooms(c) => c.kind(),
            Body::Ping(p) => p.kind(),
            Body::Halt(_) => MessageKind::Request,
            Body::Monitor(_) => MessageKind::Request,
            Body::Report(r) => r.kind(),
        }
    }

    /// Encode everything after the identifier (kind tag plus fields).
    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        match self {
            Body::Access(a) => a.write(w),
            Body::PasswordAccess(p) => p.write(w),
            Body::Authenticate(a) => a.write(w),
            Body::EnterRoom(e) => e.write(w),
            Body::ExitRoom(e) => e.write(w),
            Body::EnterPrivate(e) => e.write(w),
            Body::ExitPrivate(e) => e.write(w),
            Body::Chat(c) => c.write(w),
            Body::Whisper(wh) => wh.write(w),
            Body::Beep(b) => b.write(w),
            Body::Kick(k) => k.write(w),
            Body::RoomList(r) => r.write(w),
            Body::UserList(u) => u.write(w),
            Body::CreateRooms(c) => c.write(w),
            Body::Ping(p) => p.write(w),
            Body::Halt(h) => h.write(w),
            Body::Monitor(m) => m.write(w),
            Body::Report(r) => r.write(w),
        }
    }
}

/// Read and validate the kind tag against the kinds a variant supports.
pub(crate) fn read_kind(r: &mut WireReader<'_>, supported: &[MessageKind]) -> Result<MessageKind> {
    let kind = MessageKind::from_byte(r.read_u8()?)?;
    if !supported.contains(&kind) {
        return Err(Error::Malformed(format!(
            "kind {kind:?} not valid for this variant"
        )));
    }
    Ok(kind)
}
