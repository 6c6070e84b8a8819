//! Chat, whisper and beep packets.

use crate::error::{Error, Result};
use crate::protocol::messages::read_kind;
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

const TARGET_ROOM: u8 = 1;
const TARGET_PRIVATE: u8 = 2;

/// Where a chat line is going: a public room by name or a private
/// session by server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    /// A public room.
    Room(String),
    /// A private session.
    Private(i32),
}

impl ChatTarget {
    fn write(&self, w: &mut WireWriter) -> Result<()> {
        match self {
            ChatTarget::Room(name) => {
                w.write_u8(TARGET_ROOM);
                w.write_string(name)
            }
            ChatTarget::Private(room_id) => {
                w.write_u8(TARGET_PRIVATE);
                w.write_i32(*room_id);
                Ok(())
            }
        }
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        match r.read_u8()? {
            TARGET_ROOM => Ok(Self::Room(r.read_string()?)),
            TARGET_PRIVATE => Ok(Self::Private(r.read_i32()?)),
            other => Err(Error::Malformed(format!("unknown chat target tag: {other}"))),
        }
    }
}

/// A chat line as sent or rebroadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Destination room or private session.
    pub target: ChatTarget,
    /// Speaking user.
    pub user_name: String,
    /// The line itself.
    pub text: String,
}

/// Chat packet.
///
/// Public-room requests are confirmed back to the sender once accepted;
/// senders count outstanding unconfirmed lines to bound their own send
/// rate. Private-session lines are not confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chat {
    /// Client sends a line.
    Request(ChatMessage),
    /// Server delivers a line.
    Indication(ChatMessage),
    /// Server accepted a public-room line from this sender.
    Confirm {
        /// Room the accepted line was for.
        room_name: String,
    },
}

impl Chat {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Chat::Request(_) => MessageKind::Request,
            Chat::Indication(_) => MessageKind::Indication,
            Chat::Confirm { .. } => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            Chat::Request(msg) | Chat::Indication(msg) => {
                msg.target.write(w)?;
                w.write_string(&msg.user_name)?;
                w.write_string(&msg.text)
            }
            Chat::Confirm { room_name } => w.write_string(room_name),
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
            MessageKind::Confirm => Self::Confirm {
                room_name: r.read_string()?,
            },
            other => {
                let msg = ChatMessage {
                    target: ChatTarget::read(r)?,
                    user_name: r.read_string()?,
                    text: r.read_string()?,
                };
                if other == MessageKind::Request {
                    Self::Request(msg)
                } else {
                    Self::Indication(msg)
                }
            }
        })
    }
}

/// A targeted line inside a room, delivered to one occupant only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperMessage {
    /// Room both parties are in.
    pub room_name: String,
    /// Speaking user.
    pub from_user: String,
    /// Receiving user.
    pub to_user: String,
    /// The line itself.
    pub text: String,
}

/// Whisper packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Whisper {
    /// Client sends a whisper.
    Request(WhisperMessage),
    /// Server delivers it to the target.
    Indication(WhisperMessage),
}

impl Whisper {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Whisper::Request(_) => MessageKind::Request,
            Whisper::Indication(_) => MessageKind::Indication,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        let msg = match self {
            Whisper::Request(m) | Whisper::Indication(m) => m,
        };
        w.write_string(&msg.room_name)?;
        w.write_string(&msg.from_user)?;
        w.write_string(&msg.to_user)?;
        w.write_string(&msg.text)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Indication])?;
        let msg = WhisperMessage {
            room_name: r.read_string()?,
            from_user: r.read_string()?,
            to_user: r.read_string()?,
            text: r.read_string()?,
        };
        Ok(match kind {
            MessageKind::Request => Self::Request(msg),
            _ => Self::Indication(msg),
        })
    }
}

/// An attention signal to one occupant; no text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeepSignal {
    /// Room both parties are in.
    pub room_name: String,
    /// Signaling user.
    pub from_user: String,
    /// Signaled user.
    pub to_user: String,
}

/// Beep packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beep {
    /// Client sends a beep.
    Request(BeepSignal),
    /// Server delivers it to the target.
    Indication(BeepSignal),
}

impl Beep {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Beep::Request(_) => MessageKind::Request,
            Beep::Indication(_) => MessageKind::Indication,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        let signal = match self {
            Beep::Request(s) | Beep::Indication(s) => s,
        };
        w.write_string(&signal.room_name)?;
        w.write_string(&signal.from_user)?;
        w.write_string(&signal.to_user)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Indication])?;
        let signal = BeepSignal {
            room_name: r.read_string()?,
            from_user: r.read_string()?,
            to_user: r.read_string()?,
        };
        Ok(match kind {
            MessageKind::Request => Self::Request(signal),
            _ => Self::Indication(signal),
        })
    }
}
