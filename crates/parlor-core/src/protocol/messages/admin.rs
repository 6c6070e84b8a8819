//! Moderation and operator packets: `Kick`, `Halt`, `Monitor`, `Report`.
//!
//! `Halt`, `Monitor` and `Report` exist only in the full factory table;
//! slimmed-down client builds cannot even decode them.

use crate::error::{Error, Result};
use crate::protocol::messages::{read_kind, Secret};
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

/// How an occupant is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum KickMethod {
    /// Remove from the room.
    Remove = 1,
    /// Remove and drop the connection.
    Kick = 2,
    /// Kick and ban the host.
    Ban = 3,
}

impl KickMethod {
    /// Parse from the wire integer.
    pub fn from_i32(v: i32) -> Result<Self> {
        match v {
            1 => Ok(Self::Remove),
            2 => Ok(Self::Kick),
            3 => Ok(Self::Ban),
            _ => Err(Error::Malformed(format!("unknown kick method: {v}"))),
        }
    }

    /// Convert to the wire integer.
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

/// Ask the server to remove an occupant.
///
/// Fire-and-forget at this layer: enforcement is server policy and no
/// confirm is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickRequest {
    /// Room the target is in.
    pub room_name: String,
    /// Target's name.
    pub user_name: String,
    /// Target's address, for bans.
    pub address: String,
    /// Removal method.
    pub method: KickMethod,
}

/// Kick packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kick {
    /// The removal request.
    Request(KickRequest),
}

impl Kick {
    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(MessageKind::Request.to_byte());
        let Kick::Request(req) = self;
        w.write_string(&req.room_name)?;
        w.write_string(&req.user_name)?;
        w.write_string(&req.address)?;
        w.write_i32(req.method.to_i32());
        Ok(())
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        read_kind(r, &[MessageKind::Request])?;
        Ok(Self::Request(KickRequest {
            room_name: r.read_string()?,
            user_name: r.read_string()?,
            address: r.read_string()?,
            method: KickMethod::from_i32(r.read_i32()?)?,
        }))
    }
}

/// Operator shutdown packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// Shut the server down.
    Request {
        /// Operator password.
        password: Secret,
    },
}

impl Halt {
    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(MessageKind::Request.to_byte());
        let Halt::Request { password } = self;
        w.write_string(password.expose())
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        read_kind(r, &[MessageKind::Request])?;
        Ok(Self::Request {
            password: Secret::new(r.read_string()?),
        })
    }
}

/// Operator room-watch packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Monitor {
    /// Start watching a room.
    Request {
        /// Operator password.
        password: Secret,
        /// Room to watch.
        room_name: String,
    },
}

impl Monitor {
    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(MessageKind::Request.to_byte());
        let Monitor::Request {
            password,
            room_name,
        } = self;
        w.write_string(password.expose())?;
        w.write_string(room_name)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        read_kind(r, &[MessageKind::Request])?;
        Ok(Self::Request {
            password: Secret::new(r.read_string()?),
            room_name: r.read_string()?,
        })
    }
}

/// Operator status-report packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Ask for a status report.
    Request {
        /// Operator password.
        password: Secret,
    },
    /// The report text.
    Confirm {
        /// Free-form status report.
        report: String,
    },
}

impl Report {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Report::Request { .. } => MessageKind::Request,
            Report::Confirm { .. } => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            Report::Request { password } => w.write_string(password.expose()),
            Report::Confirm { report } => w.write_string(report),
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        Ok(match kind {
            MessageKind::Request => Self::Request {
                password: Secret::new(r.read_string()?),
            },
            _ => Self::Confirm {
                report: r.read_string()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kick_roundtrip() {
        let packet = Kick::Request(KickRequest {
            room_name: "Lobby".into(),
            user_name: "troll".into(),
            address: "198.51.100.7".into(),
            method: KickMethod::Ban,
        });
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(Kick::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }

    #[test]
    fn test_kick_method_closed_set() {
        assert!(KickMethod::from_i32(0).is_err());
        assert!(KickMethod::from_i32(4).is_err());
        assert_eq!(KickMethod::from_i32(2).expect("kick"), KickMethod::Kick);
    }

    #[test]
    fn test_halt_roundtrip() {
        let packet = Halt::Request {
            password: "opsecret".into(),
        };
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(Halt::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }

    #[test]
    fn test_monitor_roundtrip() {
        let packet = Monitor::Request {
            password: "opsecret".into(),
            room_name: "Keynote".into(),
        };
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(Monitor::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }

    #[test]
    fn test_report_roundtrip() {
        let packet = Report::Confirm {
            report: "14 rooms, 212 connections".into(),
        };
        let mut w = WireWriter::new();
        packet.write(&mut w).expect("write");
        let bytes = w.into_bytes();
        assert_eq!(Report::read(&mut WireReader::new(&bytes)).expect("read"), packet);
    }
}
