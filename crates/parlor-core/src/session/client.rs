//! Client-side session: drives the handshake and room membership.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::{Error, Result};
use crate::logging::RedactedBytes;
use crate::protocol::messages::{
    Access, AccessConfirm, AccessPayload, AccessRequest, Authenticate, AuthenticateConfirm,
    AuthenticateRequest, Beep, BeepSignal, Body, Chat, ChatMessage, ChatTarget, CreateRooms,
    EnterPrivate, EnterPrivateRequest, EnterRoom, EnterRoomConfirm, EnterRoomRequest,
    ExitPrivate, ExitPrivateNotice, ExitRoom, ExitRoomNotice, Halt, Kick, KickMethod,
    KickRequest, Monitor, PasswordAccess, PasswordAccessConfirm, PasswordAccessRequest, Ping,
    Report, RoomList, Secret, UserList, Whisper, WhisperMessage,
};
use crate::protocol::Packet;
use crate::session::{Connection, HandshakeState, SessionConfig, SessionEvent, Signer};

/// One connection's protocol state.
///
/// The transport calls [`handle_packet`](Session::handle_packet) for every
/// decoded inbound packet and [`handle_disconnect`](Session::handle_disconnect)
/// when the stream dies; everything else is outbound requests. A session
/// may be in any number of public rooms and private sessions at once,
/// each tracked independently.
pub struct Session<C: Connection, S: Signer> {
    conn: C,
    signer: S,
    config: SessionConfig,
    state: HandshakeState,
    /// Public rooms we are in, keyed by room name, with the name we
    /// entered under.
    rooms: HashMap<String, String>,
    /// Open private sessions by server-assigned id.
    privates: HashSet<i32>,
    /// Enter requests awaiting their confirm, oldest first. Confirms
    /// carry no room name, so order is the correlation.
    pending_enter: VecDeque<(String, String)>,
    /// Member profile from a password-access confirm, surfaced with the
    /// Ready event.
    pending_profile: Option<String>,
    unconfirmed_chat: usize,
    ping_outstanding: bool,
}

impl<C: Connection, S: Signer> Session<C, S> {
    /// Create a disconnected session over a transport and signer.
    pub fn new(conn: C, signer: S, config: SessionConfig) -> Self {
        Self {
            conn,
            signer,
            config,
            state: HandshakeState::Disconnected,
            rooms: HashMap::new(),
            privates: HashSet::new(),
            pending_enter: VecDeque::new(),
            pending_profile: None,
            unconfirmed_chat: 0,
            ping_outstanding: false,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Names of rooms we are currently in.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms.keys().map(String::as_str)
    }

    /// Whether we are in the given room.
    pub fn in_room(&self, room_name: &str) -> bool {
        self.rooms.contains_key(room_name)
    }

    /// Open private session ids.
    pub fn private_sessions(&self) -> impl Iterator<Item = i32> + '_ {
        self.privates.iter().copied()
    }

    /// Whether the unconfirmed-chat ceiling is reached; callers gray out
    /// input while this is true.
    pub fn chat_throttled(&self) -> bool {
        self.unconfirmed_chat >= self.config.max_unconfirmed_chat
    }

    /// Whether a liveness probe is unanswered. The transport's timeout
    /// decides when unanswered means dead.
    pub fn ping_outstanding(&self) -> bool {
        self.ping_outstanding
    }

    // -----------------------------------------------------------------
    // Outbound requests
    // -----------------------------------------------------------------

    /// Ask for plain access. First move of the handshake.
    pub fn request_access(&mut self, request: AccessRequest) -> Result<()> {
        self.start_access(Body::Access(Access::request(request)))
    }

    /// Ask for access in the legacy framing (old-client emulation).
    pub fn request_legacy_access(&mut self, request: AccessRequest) -> Result<()> {
        self.start_access(Body::Access(Access::legacy_request(request)))
    }

    /// Ask for member/monitor/admin access.
    pub fn request_password_access(&mut self, request: PasswordAccessRequest) -> Result<()> {
        self.start_access(Body::PasswordAccess(PasswordAccess::Request(request)))
    }

    fn start_access(&mut self, body: Body) -> Result<()> {
        if self.state != HandshakeState::Disconnected {
            return Err(Error::BadState("access already negotiated"));
        }
        self.conn.send(Packet::new(body))?;
        self.state = HandshakeState::AwaitingAccessConfirm;
        Ok(())
    }

    /// Ask to join a public room under a name and profile.
    pub fn enter_room(
        &mut self,
        room_name: impl Into<String>,
        user_name: impl Into<String>,
        profile: impl Into<String>,
    ) -> Result<()> {
        self.require_ready()?;
        let room_name = room_name.into();
        let user_name = user_name.into();
        self.conn.send(Packet::new(Body::EnterRoom(EnterRoom::Request(
            EnterRoomRequest {
                room_name: room_name.clone(),
                user_name: user_name.clone(),
                profile: profile.into(),
            },
        ))))?;
        self.pending_enter.push_back((room_name, user_name));
        Ok(())
    }

    /// Leave a public room. Membership ends locally on send; the server
    /// tells the remaining occupants.
    pub fn exit_room(&mut self, room_name: &str) -> Result<()> {
        let user_name = self
            .rooms
            .get(room_name)
            .cloned()
            .ok_or(Error::BadState("not in that room"))?;
        self.conn.send(Packet::new(Body::ExitRoom(ExitRoom::Request(
            ExitRoomNotice {
                room_name: room_name.to_owned(),
                user_name,
            },
        ))))?;
        self.rooms.remove(room_name);
        Ok(())
    }

    /// Send a chat line to a public room we are in.
    pub fn send_room_chat(&mut self, room_name: &str, text: impl Into<String>) -> Result<()> {
        let user_name = self
            .rooms
            .get(room_name)
            .cloned()
            .ok_or(Error::BadState("not in that room"))?;
        if self.chat_throttled() {
            debug!(room_name, "sending past the unconfirmed-chat ceiling");
        }
        self.conn.send(Packet::new(Body::Chat(Chat::Request(ChatMessage {
            target: ChatTarget::Room(room_name.to_owned()),
            user_name,
            text: text.into(),
        }))))?;
        self.unconfirmed_chat += 1;
        Ok(())
    }

    /// Send a chat line into an open private session.
    pub fn send_private_chat(
        &mut self,
        room_id: i32,
        user_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<()> {
        if !self.privates.contains(&room_id) {
            return Err(Error::BadState("no such private session"));
        }
        self.conn.send(Packet::new(Body::Chat(Chat::Request(ChatMessage {
            target: ChatTarget::Private(room_id),
            user_name: user_name.into(),
            text: text.into(),
        }))))
    }

    /// Whisper to one occupant of a room we are in.
    pub fn send_whisper(
        &mut self,
        room_name: &str,
        to_user: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<()> {
        let from_user = self
            .rooms
            .get(room_name)
            .cloned()
            .ok_or(Error::BadState("not in that room"))?;
        self.conn
            .send(Packet::new(Body::Whisper(Whisper::Request(WhisperMessage {
                room_name: room_name.to_owned(),
                from_user,
                to_user: to_user.into(),
                text: text.into(),
            }))))
    }

    /// Beep one occupant of a room we are in.
    pub fn send_beep(&mut self, room_name: &str, to_user: impl Into<String>) -> Result<()> {
        let from_user = self
            .rooms
            .get(room_name)
            .cloned()
            .ok_or(Error::BadState("not in that room"))?;
        self.conn.send(Packet::new(Body::Beep(Beep::Request(BeepSignal {
            room_name: room_name.to_owned(),
            from_user,
            to_user: to_user.into(),
        }))))
    }

    /// Ask to open a private session with another occupant.
    pub fn open_private(&mut self, room_name: &str, to_user: impl Into<String>) -> Result<()> {
        let from_user = self
            .rooms
            .get(room_name)
            .cloned()
            .ok_or(Error::BadState("not in that room"))?;
        self.conn
            .send(Packet::new(Body::EnterPrivate(EnterPrivate::Request(
                EnterPrivateRequest {
                    room_name: room_name.to_owned(),
                    from_user,
                    to_user: to_user.into(),
                },
            ))))
    }

    /// Close our end of a private session.
    pub fn exit_private(&mut self, room_id: i32, user_name: impl Into<String>) -> Result<()> {
        if !self.privates.remove(&room_id) {
            return Err(Error::BadState("no such private session"));
        }
        self.conn
            .send(Packet::new(Body::ExitPrivate(ExitPrivate::Request(
                ExitPrivateNotice {
                    room_id,
                    user_name: user_name.into(),
                },
            ))))
    }

    /// Ask for the public room list, optionally filtered.
    pub fn request_room_list(&mut self, filter: impl Into<String>) -> Result<()> {
        self.require_ready()?;
        self.conn.send(Packet::new(Body::RoomList(RoomList::Request {
            filter: filter.into(),
        })))
    }

    /// Ask who is in a room.
    pub fn request_user_list(&mut self, room_name: impl Into<String>) -> Result<()> {
        self.require_ready()?;
        self.conn.send(Packet::new(Body::UserList(UserList::Request {
            room_name: room_name.into(),
        })))
    }

    /// Ask the server to create rooms in bulk (255 at most per request).
    pub fn create_rooms(&mut self, rooms: Vec<String>) -> Result<()> {
        self.require_ready()?;
        self.conn
            .send(Packet::new(Body::CreateRooms(CreateRooms::Request { rooms })))
    }

    /// Ask the server to remove an occupant.
    pub fn kick(
        &mut self,
        room_name: impl Into<String>,
        user_name: impl Into<String>,
        address: impl Into<String>,
        method: KickMethod,
    ) -> Result<()> {
        self.require_ready()?;
        self.conn.send(Packet::new(Body::Kick(Kick::Request(KickRequest {
            room_name: room_name.into(),
            user_name: user_name.into(),
            address: address.into(),
            method,
        }))))
    }

    /// Send a liveness probe.
    pub fn send_ping(&mut self) -> Result<()> {
        self.conn.send(Packet::new(Body::Ping(Ping::Request)))?;
        self.ping_outstanding = true;
        Ok(())
    }

    /// Operator: shut the server down.
    pub fn send_halt(&mut self, password: Secret) -> Result<()> {
        self.require_ready()?;
        self.conn
            .send(Packet::new(Body::Halt(Halt::Request { password })))
    }

    /// Operator: watch a room.
    pub fn send_monitor(&mut self, password: Secret, room_name: impl Into<String>) -> Result<()> {
        self.require_ready()?;
        self.conn.send(Packet::new(Body::Monitor(Monitor::Request {
            password,
            room_name: room_name.into(),
        })))
    }

    /// Operator: ask for a status report.
    pub fn request_report(&mut self, password: Secret) -> Result<()> {
        self.require_ready()?;
        self.conn
            .send(Packet::new(Body::Report(Report::Request { password })))
    }

    fn require_ready(&self) -> Result<()> {
        if self.state != HandshakeState::Ready {
            return Err(Error::BadState("access not complete"));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------

    /// Process one decoded inbound packet.
    ///
    /// Claims the packet's handled flag; when another observer got there
    /// first this returns no events and changes nothing.
    pub fn handle_packet(&mut self, packet: &Packet) -> Result<Vec<SessionEvent>> {
        if !packet.mark_handled() {
            return Ok(Vec::new());
        }
        match packet.body().clone() {
            Body::Access(Access {
                payload: AccessPayload::Confirm(confirm),
                ..
            }) => self.on_access_confirm(confirm),
            Body::PasswordAccess(PasswordAccess::Confirm(confirm)) => {
                self.on_password_access_confirm(confirm)
            }
            Body::Authenticate(Authenticate::Confirm(confirm)) => {
                self.on_authenticate_confirm(confirm)
            }
            Body::EnterRoom(EnterRoom::Confirm(confirm)) => self.on_enter_confirm(confirm),
            Body::EnterRoom(EnterRoom::Indication(ind)) => Ok(vec![SessionEvent::UserEntered {
                room_name: ind.room_name,
                user: ind.user,
            }]),
            Body::ExitRoom(ExitRoom::Indication(notice)) => Ok(vec![self.on_exit_indication(notice)]),
            Body::Chat(Chat::Indication(msg)) => Ok(vec![SessionEvent::ChatReceived {
                target: msg.target,
                user_name: msg.user_name,
                text: msg.text,
            }]),
            Body::Chat(Chat::Confirm { room_name }) => {
                self.unconfirmed_chat = self.unconfirmed_chat.saturating_sub(1);
                Ok(vec![SessionEvent::ChatAccepted { room_name }])
            }
            Body::Whisper(Whisper::Indication(msg)) => {
                Ok(vec![SessionEvent::WhisperReceived(msg)])
            }
            Body::Beep(Beep::Indication(signal)) => Ok(vec![SessionEvent::BeepReceived(signal)]),
            Body::EnterPrivate(EnterPrivate::Indication(peer)) => {
                self.privates.insert(peer.room_id);
                Ok(vec![SessionEvent::PrivateOpened {
                    peer,
                    by_peer: true,
                }])
            }
            Body::EnterPrivate(EnterPrivate::Confirm(peer)) => {
                self.privates.insert(peer.room_id);
                Ok(vec![SessionEvent::PrivateOpened {
                    peer,
                    by_peer: false,
                }])
            }
            Body::ExitPrivate(ExitPrivate::Indication(notice)) => {
                self.privates.remove(&notice.room_id);
                Ok(vec![SessionEvent::PrivateClosed {
                    room_id: notice.room_id,
                    user_name: notice.user_name,
                }])
            }
            Body::RoomList(RoomList::Confirm { rooms }) => {
                Ok(vec![SessionEvent::RoomListReceived { rooms }])
            }
            Body::UserList(UserList::Confirm(confirm)) => {
                Ok(vec![SessionEvent::UserListReceived(confirm)])
            }
            Body::CreateRooms(CreateRooms::Confirm { rooms }) => {
                Ok(vec![SessionEvent::RoomsCreated { rooms }])
            }
            Body::Report(Report::Confirm { report }) => {
                Ok(vec![SessionEvent::ReportReceived { report }])
            }
            Body::Ping(Ping::Response) => {
                self.ping_outstanding = false;
                Ok(vec![SessionEvent::Pong])
            }
            other => {
                debug!(identifier = other.identifier(), "ignoring unexpected packet");
                Ok(Vec::new())
            }
        }
    }

    /// The transport is gone. Resets everything; the state machine has no
    /// retry of its own.
    pub fn handle_disconnect(&mut self) -> SessionEvent {
        self.state = HandshakeState::Disconnected;
        self.rooms.clear();
        self.privates.clear();
        self.pending_enter.clear();
        self.pending_profile = None;
        self.unconfirmed_chat = 0;
        self.ping_outstanding = false;
        SessionEvent::Disconnected
    }

    fn on_access_confirm(&mut self, confirm: AccessConfirm) -> Result<Vec<SessionEvent>> {
        if self.state != HandshakeState::AwaitingAccessConfirm {
            debug!("access confirm outside handshake, ignoring");
            return Ok(Vec::new());
        }
        match confirm {
            AccessConfirm::Denied(code) => {
                self.state = HandshakeState::Disconnected;
                Ok(vec![SessionEvent::AccessDenied(code)])
            }
            AccessConfirm::Granted { rooms, challenge } => self.on_granted(rooms, challenge),
        }
    }

    fn on_password_access_confirm(
        &mut self,
        confirm: PasswordAccessConfirm,
    ) -> Result<Vec<SessionEvent>> {
        if self.state != HandshakeState::AwaitingAccessConfirm {
            debug!("password access confirm outside handshake, ignoring");
            return Ok(Vec::new());
        }
        match confirm {
            PasswordAccessConfirm::Denied(code) => {
                self.state = HandshakeState::Disconnected;
                Ok(vec![SessionEvent::AccessDenied(code)])
            }
            PasswordAccessConfirm::Granted {
                rooms,
                challenge,
                profile,
            } => {
                self.pending_profile = Some(profile);
                self.on_granted(rooms, challenge)
            }
        }
    }

    /// Shared tail of both access confirms: an empty challenge completes
    /// the handshake, a non-empty one must be signed and answered before
    /// anything else.
    fn on_granted(&mut self, rooms: Vec<String>, challenge: Vec<u8>) -> Result<Vec<SessionEvent>> {
        if challenge.is_empty() {
            self.state = HandshakeState::Ready;
            return Ok(vec![SessionEvent::Ready {
                rooms,
                profile: self.pending_profile.take(),
            }]);
        }
        let signature = self.signer.sign(&challenge);
        debug!(signature = %RedactedBytes(&signature), "answering access challenge");
        self.conn
            .send(Packet::new(Body::Authenticate(Authenticate::Request(
                AuthenticateRequest { signature },
            ))))?;
        self.state = HandshakeState::AwaitingAuthenticateConfirm;
        Ok(vec![SessionEvent::ChallengeAnswered])
    }

    fn on_authenticate_confirm(
        &mut self,
        confirm: AuthenticateConfirm,
    ) -> Result<Vec<SessionEvent>> {
        if self.state != HandshakeState::AwaitingAuthenticateConfirm {
            debug!("authenticate confirm outside handshake, ignoring");
            return Ok(Vec::new());
        }
        match confirm {
            AuthenticateConfirm::Denied => {
                self.state = HandshakeState::Disconnected;
                Ok(vec![SessionEvent::AuthenticateDenied])
            }
            AuthenticateConfirm::Granted { rooms } => {
                self.state = HandshakeState::Ready;
                Ok(vec![SessionEvent::Ready {
                    rooms,
                    profile: self.pending_profile.take(),
                }])
            }
        }
    }

    fn on_enter_confirm(&mut self, confirm: EnterRoomConfirm) -> Result<Vec<SessionEvent>> {
        let Some((room_name, user_name)) = self.pending_enter.pop_front() else {
            debug!("enter confirm with nothing pending, ignoring");
            return Ok(Vec::new());
        };
        match confirm {
            EnterRoomConfirm::Denied(reason) => Ok(vec![SessionEvent::EnterDenied {
                room_name,
                reason,
            }]),
            EnterRoomConfirm::Granted {
                room_type,
                occupants,
                users,
            } => {
                self.rooms.insert(room_name.clone(), user_name);
                Ok(vec![SessionEvent::RoomEntered {
                    room_name,
                    room_type,
                    occupants,
                    users,
                }])
            }
        }
    }

    fn on_exit_indication(&mut self, notice: ExitRoomNotice) -> SessionEvent {
        let ours = self
            .rooms
            .get(&notice.room_name)
            .is_some_and(|name| *name == notice.user_name);
        if ours {
            self.rooms.remove(&notice.room_name);
            SessionEvent::RoomExited {
                room_name: notice.room_name,
            }
        } else {
            SessionEvent::UserExited {
                room_name: notice.room_name,
                user_name: notice.user_name,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{BoolToken, RoomType, UserRecord};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Captures sent packets for inspection.
    #[derive(Clone, Default)]
    struct TestConnection {
        sent: Rc<RefCell<Vec<Packet>>>,
    }

    impl Connection for TestConnection {
        fn send(&mut self, packet: Packet) -> crate::error::Result<()> {
            self.sent.borrow_mut().push(packet);
            Ok(())
        }
    }

    /// Signs by echoing the challenge reversed.
    struct TestSigner;

    impl Signer for TestSigner {
        fn sign(&self, challenge: &[u8]) -> Vec<u8> {
            challenge.iter().rev().copied().collect()
        }
    }

    fn session() -> (Session<TestConnection, TestSigner>, Rc<RefCell<Vec<Packet>>>) {
        let conn = TestConnection::default();
        let sent = conn.sent.clone();
        (
            Session::new(conn, TestSigner, SessionConfig::default()),
            sent,
        )
    }

    fn make_ready(s: &mut Session<TestConnection, TestSigner>) {
        s.request_access(AccessRequest::default()).expect("request");
        let confirm = Packet::new(Body::Access(Access::confirm(
            crate::protocol::messages::AccessFraming::Standard,
            AccessConfirm::Granted {
                rooms: vec!["Lobby".into()],
                challenge: vec![],
            },
        )));
        s.handle_packet(&confirm).expect("confirm");
        assert_eq!(s.state(), HandshakeState::Ready);
    }

    fn enter_lobby(s: &mut Session<TestConnection, TestSigner>) {
        s.enter_room("Lobby", "alice", "").expect("enter");
        let confirm = Packet::new(Body::EnterRoom(EnterRoom::Confirm(
            EnterRoomConfirm::Granted {
                room_type: RoomType::Public,
                occupants: 1,
                users: vec![],
            },
        )));
        s.handle_packet(&confirm).expect("confirm");
        assert!(s.in_room("Lobby"));
    }

    #[test]
    fn test_room_ops_require_ready() {
        let (mut s, _) = session();
        assert!(matches!(
            s.enter_room("Lobby", "alice", ""),
            Err(Error::BadState(_))
        ));
        assert!(matches!(s.request_room_list(""), Err(Error::BadState(_))));
    }

    #[test]
    fn test_access_cannot_be_restarted_mid_handshake() {
        let (mut s, _) = session();
        s.request_access(AccessRequest::default()).expect("request");
        assert!(matches!(
            s.request_access(AccessRequest::default()),
            Err(Error::BadState(_))
        ));
    }

    #[test]
    fn test_denial_is_terminal() {
        let (mut s, _) = session();
        s.request_access(AccessRequest::default()).expect("request");
        let confirm = Packet::new(Body::Access(Access::confirm(
            crate::protocol::messages::AccessFraming::Standard,
            AccessConfirm::Denied(crate::protocol::messages::AccessDenial::HostDenied),
        )));
        let events = s.handle_packet(&confirm).expect("handle");
        assert_eq!(
            events,
            vec![SessionEvent::AccessDenied(
                crate::protocol::messages::AccessDenial::HostDenied
            )]
        );
        assert_eq!(s.state(), HandshakeState::Disconnected);
    }

    #[test]
    fn test_challenge_triggers_authenticate() {
        let (mut s, sent) = session();
        s.request_access(AccessRequest::default()).expect("request");
        let confirm = Packet::new(Body::Access(Access::confirm(
            crate::protocol::messages::AccessFraming::Standard,
            AccessConfirm::Granted {
                rooms: vec![],
                challenge: vec![1, 2, 3],
            },
        )));
        let events = s.handle_packet(&confirm).expect("handle");
        assert_eq!(events, vec![SessionEvent::ChallengeAnswered]);
        assert_eq!(s.state(), HandshakeState::AwaitingAuthenticateConfirm);

        // The answer went out with the reversed-challenge signature.
        let packets = sent.borrow();
        match packets.last().map(Packet::body) {
            Some(Body::Authenticate(Authenticate::Request(req))) => {
                assert_eq!(req.signature, vec![3, 2, 1]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_handled_packet_is_processed_once() {
        let (mut s, _) = session();
        s.request_access(AccessRequest::default()).expect("request");
        let confirm = Packet::new(Body::Access(Access::confirm(
            crate::protocol::messages::AccessFraming::Standard,
            AccessConfirm::Granted {
                rooms: vec![],
                challenge: vec![],
            },
        )));
        assert_eq!(s.handle_packet(&confirm).expect("first").len(), 1);
        assert!(s.handle_packet(&confirm).expect("second").is_empty());
    }

    #[test]
    fn test_enter_denied_leaves_membership_unchanged() {
        let (mut s, _) = session();
        make_ready(&mut s);
        s.enter_room("Lobby", "bob", "").expect("enter");
        let confirm = Packet::new(Body::EnterRoom(EnterRoom::Confirm(
            EnterRoomConfirm::Denied(crate::protocol::messages::EnterRoomDenial::RoomFull),
        )));
        let events = s.handle_packet(&confirm).expect("handle");
        assert_eq!(
            events,
            vec![SessionEvent::EnterDenied {
                room_name: "Lobby".into(),
                reason: crate::protocol::messages::EnterRoomDenial::RoomFull,
            }]
        );
        assert!(!s.in_room("Lobby"));
        assert_eq!(s.state(), HandshakeState::Ready);
    }

    #[test]
    fn test_exit_indication_for_self_ends_membership() {
        let (mut s, _) = session();
        make_ready(&mut s);
        enter_lobby(&mut s);

        // A stranger leaves: still in the room.
        let other = Packet::new(Body::ExitRoom(ExitRoom::Indication(ExitRoomNotice {
            room_name: "Lobby".into(),
            user_name: "carol".into(),
        })));
        let events = s.handle_packet(&other).expect("handle");
        assert_eq!(
            events,
            vec![SessionEvent::UserExited {
                room_name: "Lobby".into(),
                user_name: "carol".into(),
            }]
        );
        assert!(s.in_room("Lobby"));

        // We are named (kicked server-side): membership ends.
        let kicked = Packet::new(Body::ExitRoom(ExitRoom::Indication(ExitRoomNotice {
            room_name: "Lobby".into(),
            user_name: "alice".into(),
        })));
        let events = s.handle_packet(&kicked).expect("handle");
        assert_eq!(
            events,
            vec![SessionEvent::RoomExited {
                room_name: "Lobby".into(),
            }]
        );
        assert!(!s.in_room("Lobby"));
    }

    #[test]
    fn test_chat_backpressure_counter() {
        let (mut s, _) = session();
        make_ready(&mut s);
        enter_lobby(&mut s);

        for _ in 0..s.config.max_unconfirmed_chat {
            s.send_room_chat("Lobby", "hi").expect("send");
        }
        assert!(s.chat_throttled());

        let confirm = Packet::new(Body::Chat(Chat::Confirm {
            room_name: "Lobby".into(),
        }));
        s.handle_packet(&confirm).expect("handle");
        assert!(!s.chat_throttled());
    }

    #[test]
    fn test_private_session_lifecycle() {
        let (mut s, _) = session();
        make_ready(&mut s);
        enter_lobby(&mut s);

        let peer = crate::protocol::messages::PrivatePeer {
            room_id: 7,
            user_name: "bob".into(),
            profile: String::new(),
            host: "b.example.net".into(),
        };
        let confirm = Packet::new(Body::EnterPrivate(EnterPrivate::Confirm(peer.clone())));
        let events = s.handle_packet(&confirm).expect("handle");
        assert_eq!(
            events,
            vec![SessionEvent::PrivateOpened {
                peer,
                by_peer: false,
            }]
        );
        assert!(s.private_sessions().any(|id| id == 7));

        s.send_private_chat(7, "alice", "psst").expect("send");
        s.exit_private(7, "alice").expect("exit");
        assert!(s.private_sessions().next().is_none());
        assert!(matches!(
            s.send_private_chat(7, "alice", "gone"),
            Err(Error::BadState(_))
        ));
    }

    #[test]
    fn test_ping_liveness_flag() {
        let (mut s, _) = session();
        make_ready(&mut s);
        s.send_ping().expect("send");
        assert!(s.ping_outstanding());
        let pong = Packet::new(Body::Ping(Ping::Response));
        let events = s.handle_packet(&pong).expect("handle");
        assert_eq!(events, vec![SessionEvent::Pong]);
        assert!(!s.ping_outstanding());
    }

    #[test]
    fn test_disconnect_resets_everything() {
        let (mut s, _) = session();
        make_ready(&mut s);
        enter_lobby(&mut s);
        s.send_ping().expect("send");

        assert_eq!(s.handle_disconnect(), SessionEvent::Disconnected);
        assert_eq!(s.state(), HandshakeState::Disconnected);
        assert!(s.rooms().next().is_none());
        assert!(!s.ping_outstanding());
    }

    #[test]
    fn test_whisper_uses_recorded_identity() {
        let (mut s, sent) = session();
        make_ready(&mut s);
        enter_lobby(&mut s);
        s.send_whisper("Lobby", "bob", "hey").expect("send");
        let packets = sent.borrow();
        match packets.last().map(Packet::body) {
            Some(Body::Whisper(Whisper::Request(msg))) => {
                assert_eq!(msg.from_user, "alice");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_user_entered_indication_forwarded() {
        let (mut s, _) = session();
        make_ready(&mut s);
        enter_lobby(&mut s);
        let ind = Packet::new(Body::EnterRoom(EnterRoom::Indication(
            crate::protocol::messages::EnterRoomIndication {
                room_name: "Lobby".into(),
                user: UserRecord {
                    name: "dave".into(),
                    profile: String::new(),
                    host: "d.example.net".into(),
                    member: BoolToken::no(),
                    link: BoolToken::no(),
                },
            },
        )));
        let events = s.handle_packet(&ind).expect("handle");
        assert!(matches!(events[0], SessionEvent::UserEntered { .. }));
    }
}
