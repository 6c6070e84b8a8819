//! Session layer: the handshake state machine and its collaborators.
//!
//! One session owns one connection's protocol state. Decoding happens on
//! the transport's reader thread; the decoded [`Packet`](crate::protocol::Packet)
//! moves to whatever thread drives the session, which is why packets are
//! ownership-movable and carry their own handled flag.
//!
//! ## Handshake
//!
//! ```text
//! Disconnected ──access request──▶ AwaitingAccessConfirm
//!      ▲                              │           │
//!      │ denial (terminal)            │ challenge │ granted, no challenge
//!      │                              ▼           │
//!      ├──────────────── AwaitingAuthenticateConfirm
//!      │                              │ granted
//!      │                              ▼           ▼
//!      └──disconnect──────────────── Ready ⇄ room membership
//! ```
//!
//! Any denial at any stage is terminal at this layer; retry policy, if
//! any, belongs to the caller.

mod client;
mod server;

pub use client::Session;
pub use server::{RoomDirectory, RoomSettings, DEFAULT_ROOM_CAPACITY};

use crate::error::Result;
use crate::protocol::messages::{
    AccessDenial, BeepSignal, ChatTarget, EnterRoomDenial, PrivatePeer, RoomType, UserListConfirm,
    UserRecord, WhisperMessage,
};
use crate::protocol::Packet;

/// Outbound half of the transport.
///
/// The session hands every packet it wants sent to this trait and never
/// touches a socket itself. Inbound traffic flows the other way: the
/// transport calls [`Session::handle_packet`] and
/// [`Session::handle_disconnect`].
pub trait Connection {
    /// Queue a packet for transmission.
    fn send(&mut self, packet: Packet) -> Result<()>;
}

/// Answers the access challenge.
///
/// Key material lives entirely behind this trait. An empty vector means
/// "no signature offered": it is sent as-is and the server's authenticate
/// confirm decides the outcome.
pub trait Signer {
    /// Sign the challenge bytes, or return an empty vector.
    fn sign(&self, challenge: &[u8]) -> Vec<u8>;
}

/// Where a session stands in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No access negotiation in flight.
    Disconnected,
    /// Access or password-access request sent.
    AwaitingAccessConfirm,
    /// Challenge answered, waiting for the verdict.
    AwaitingAuthenticateConfirm,
    /// Access complete; room operations allowed.
    Ready,
}

/// Session tuning and client identity.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Outstanding unconfirmed public chat lines before
    /// [`Session::chat_throttled`] reports true.
    pub max_unconfirmed_chat: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_unconfirmed_chat: 10,
        }
    }
}

/// What a handled packet meant to this session.
///
/// The consuming layer (UI, bots, logs) branches on these; protocol
/// denial codes arrive here as data, not as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Access refused; the handshake is over.
    AccessDenied(AccessDenial),
    /// Challenge received and answered; verdict pending.
    ChallengeAnswered,
    /// Signature rejected; the handshake is over.
    AuthenticateDenied,
    /// Access complete.
    Ready {
        /// Public rooms currently open.
        rooms: Vec<String>,
        /// Member profile, when access was by password.
        profile: Option<String>,
    },
    /// We are in the room.
    RoomEntered {
        /// Room joined.
        room_name: String,
        /// How the room is classified.
        room_type: RoomType,
        /// Occupant count including unlisted audience members.
        occupants: i32,
        /// Listed occupants.
        users: Vec<UserRecord>,
    },
    /// The server refused the room.
    EnterDenied {
        /// Room that refused us.
        room_name: String,
        /// Why.
        reason: EnterRoomDenial,
    },
    /// Someone else joined a room we are in.
    UserEntered {
        /// Room joined.
        room_name: String,
        /// Who, identity as recorded by the server.
        user: UserRecord,
    },
    /// Someone else left a room we are in.
    UserExited {
        /// Room left.
        room_name: String,
        /// Who.
        user_name: String,
    },
    /// We were removed from a room server-side.
    RoomExited {
        /// Room we are no longer in.
        room_name: String,
    },
    /// A chat line arrived.
    ChatReceived {
        /// Room or private session it belongs to.
        target: ChatTarget,
        /// Speaker.
        user_name: String,
        /// The line.
        text: String,
    },
    /// The server accepted one of our public chat lines.
    ChatAccepted {
        /// Room the line was for.
        room_name: String,
    },
    /// A whisper arrived.
    WhisperReceived(WhisperMessage),
    /// A beep arrived.
    BeepReceived(BeepSignal),
    /// A private session is open.
    PrivateOpened {
        /// The other end's details and the session id.
        peer: PrivatePeer,
        /// True when the peer initiated it.
        by_peer: bool,
    },
    /// A private session closed.
    PrivateClosed {
        /// Session id.
        room_id: i32,
        /// Who closed it.
        user_name: String,
    },
    /// Room listing arrived.
    RoomListReceived {
        /// Room names.
        rooms: Vec<String>,
    },
    /// Occupant listing arrived.
    UserListReceived(UserListConfirm),
    /// Bulk room creation was confirmed.
    RoomsCreated {
        /// Created room names.
        rooms: Vec<String>,
    },
    /// Operator status report arrived.
    ReportReceived {
        /// Free-form report text.
        report: String,
    },
    /// The liveness probe came back.
    Pong,
    /// The transport is gone; all state is reset.
    Disconnected,
}
