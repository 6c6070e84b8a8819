//! Access negotiation: `Access`, `PasswordAccess` and `Authenticate`.
//!
//! Gaining access is the first exchange on every connection. Plain clients
//! send `Access`; anything claiming member, monitor or admin status sends
//! `PasswordAccess`. A granted confirm may carry challenge bytes, in which
//! case the client must answer with `Authenticate` before anything else
//! and the room list is withheld until the authenticate confirm.

use crate::error::{Error, Result};
use crate::protocol::messages::{read_kind, Secret};
use crate::protocol::packet::MessageKind;
use crate::protocol::wire::{WireReader, WireWriter};

/// The fixed class-name blob carried by the legacy `Access` framing.
pub const LEGACY_ACCESS_TAG: &[u8; 17] = b"COM.volano.Access";

/// Which `Access` wire framing a packet instance uses.
///
/// Fixed at construction from the identifier read off the wire; payload
/// content never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFraming {
    /// Current framing: no tag blob, challenge bytes on a granted confirm.
    Standard,
    /// Pre-challenge framing used by old clients: the 17-byte tag blob
    /// follows the identifier and the challenge field does not exist.
    Legacy,
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AccessDenial {
    /// Connecting host is not allowed.
    HostDenied = 2,
    /// Referring document is not allowed.
    DocumentDenied = 3,
    /// Client version is too old.
    VersionDenied = 4,
    /// Wrong password.
    BadPassword = 5,
    /// Client runtime version is unsupported.
    BadJavaVersion = 6,
    /// The host already has a connection.
    HostDuplicate = 7,
}

impl AccessDenial {
    /// Parse from the wire result code.
    pub fn from_i32(v: i32) -> Result<Self> {
        match v {
            2 => Ok(Self::HostDenied),
            3 => Ok(Self::DocumentDenied),
            4 => Ok(Self::VersionDenied),
            5 => Ok(Self::BadPassword),
            6 => Ok(Self::BadJavaVersion),
            7 => Ok(Self::HostDuplicate),
            _ => Err(Error::Malformed(format!("unknown access result: {v}"))),
        }
    }

    /// Convert to the wire result code.
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

/// Result code for a granted access or authenticate confirm.
const RESULT_OKAY: i32 = 1;

/// Client environment description sent when asking for access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessRequest {
    /// Room to land in after the handshake.
    pub default_room: String,
    /// Client applet version string.
    pub applet_version: String,
    /// URL of the page embedding the client.
    pub document_base: String,
    /// URL the client code was loaded from.
    pub code_base: String,
    /// Runtime vendor.
    pub java_vendor: String,
    /// Runtime vendor URL.
    pub java_vendor_url: String,
    /// Runtime version.
    pub java_version: String,
    /// Runtime class-format version.
    pub java_class_version: String,
    /// Operating system name.
    pub os_name: String,
    /// Operating system version.
    pub os_version: String,
    /// Operating system architecture.
    pub os_arch: String,
}

impl AccessRequest {
    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_string(&self.default_room)?;
        w.write_string(&self.applet_version)?;
        w.write_string(&self.document_base)?;
        w.write_string(&self.code_base)?;
        w.write_string(&self.java_vendor)?;
        w.write_string(&self.java_vendor_url)?;
        w.write_string(&self.java_version)?;
        w.write_string(&self.java_class_version)?;
        w.write_string(&self.os_name)?;
        w.write_string(&self.os_version)?;
        w.write_string(&self.os_arch)
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            default_room: r.read_string()?,
            applet_version: r.read_string()?,
            document_base: r.read_string()?,
            code_base: r.read_string()?,
            java_vendor: r.read_string()?,
            java_vendor_url: r.read_string()?,
            java_version: r.read_string()?,
            java_class_version: r.read_string()?,
            os_name: r.read_string()?,
            os_version: r.read_string()?,
            os_arch: r.read_string()?,
        })
    }
}

/// Server's answer to an `Access` request.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessConfirm {
    /// Access granted. Empty challenge bytes mean no authentication step;
    /// the legacy framing never carries a challenge at all.
    Granted {
        /// Public rooms currently open.
        rooms: Vec<String>,
        /// Challenge to sign, or empty.
        challenge: Vec<u8>,
    },
    /// Access refused; the connection is done.
    Denied(AccessDenial),
}

/// Access negotiation packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Access {
    /// Wire framing, fixed at construction.
    pub framing: AccessFraming,
    /// Request or confirm payload.
    pub payload: AccessPayload,
}

/// The kinds `Access` supports.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessPayload {
    /// Client asks for access.
    Request(AccessRequest),
    /// Server grants or refuses.
    Confirm(AccessConfirm),
}

impl Access {
    /// Build a standard-framing request.
    pub fn request(req: AccessRequest) -> Self {
        Self {
            framing: AccessFraming::Standard,
            payload: AccessPayload::Request(req),
        }
    }

    /// Build a legacy-framing request.
    pub fn legacy_request(req: AccessRequest) -> Self {
        Self {
            framing: AccessFraming::Legacy,
            payload: AccessPayload::Request(req),
        }
    }

    /// Build a confirm in the given framing.
    pub fn confirm(framing: AccessFraming, confirm: AccessConfirm) -> Self {
        Self {
            framing,
            payload: AccessPayload::Confirm(confirm),
        }
    }

    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match &self.payload {
            AccessPayload::Request(_) => MessageKind::Request,
            AccessPayload::Confirm(_) => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        if self.framing == AccessFraming::Legacy {
            w.write_raw(LEGACY_ACCESS_TAG);
        }
        w.write_u8(self.kind().to_byte());
        match &self.payload {
            AccessPayload::Request(req) => req.write(w),
            AccessPayload::Confirm(AccessConfirm::Denied(code)) => {
                w.write_i32(code.to_i32());
                Ok(())
            }
            AccessPayload::Confirm(AccessConfirm::Granted { rooms, challenge }) => {
                w.write_i32(RESULT_OKAY);
                w.write_string_list(rooms)?;
                if self.framing == AccessFraming::Standard {
                    w.write_blob(challenge)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>, framing: AccessFraming) -> Result<Self> {
        if framing == AccessFraming::Legacy {
            let tag = r.take(LEGACY_ACCESS_TAG.len())?;
            if tag != LEGACY_ACCESS_TAG {
                return Err(Error::Malformed("bad legacy access tag".into()));
            }
        }
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        let payload = match kind {
            MessageKind::Request => AccessPayload::Request(AccessRequest::read(r)?),
            _ => AccessPayload::Confirm(read_access_confirm(r, framing)?),
        };
        Ok(Self { framing, payload })
    }
}

fn read_access_confirm(r: &mut WireReader<'_>, framing: AccessFraming) -> Result<AccessConfirm> {
    let result = r.read_i32()?;
    if result != RESULT_OKAY {
        return Ok(AccessConfirm::Denied(AccessDenial::from_i32(result)?));
    }
    let rooms = r.read_string_list()?;
    let challenge = match framing {
        AccessFraming::Standard => r.read_blob()?,
        AccessFraming::Legacy => Vec::new(),
    };
    Ok(AccessConfirm::Granted { rooms, challenge })
}

// ---------------------------------------------------------------------
// PasswordAccess
// ---------------------------------------------------------------------

/// Access request for connections claiming member, monitor or admin
/// status. Extends the plain request with credentials and event-stage
/// fields; the confirm additionally returns the member profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordAccessRequest {
    /// The plain access fields.
    pub base: AccessRequest,
    /// Claiming member status.
    pub member: bool,
    /// Claiming monitor status.
    pub monitor: bool,
    /// Claiming admin status.
    pub admin: bool,
    /// Member account name.
    pub member_name: String,
    /// Member account password.
    pub member_password: Secret,
    /// Room or server password.
    pub password: Secret,
    /// Connecting to an event stage.
    pub stage: bool,
    /// Event topic.
    pub topic: String,
}

impl PasswordAccessRequest {
    fn write(&self, w: &mut WireWriter) -> Result<()> {
        self.base.write(w)?;
        w.write_bool(self.member);
        w.write_bool(self.monitor);
        w.write_bool(self.admin);
        w.write_string(&self.member_name)?;
        w.write_string(self.member_password.expose())?;
        w.write_string(self.password.expose())?;
        w.write_bool(self.stage);
        w.write_string(&self.topic)
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        Ok(Self {
            base: AccessRequest::read(r)?,
            member: r.read_bool()?,
            monitor: r.read_bool()?,
            admin: r.read_bool()?,
            member_name: r.read_string()?,
            member_password: Secret::new(r.read_string()?),
            password: Secret::new(r.read_string()?),
            stage: r.read_bool()?,
            topic: r.read_string()?,
        })
    }
}

/// Server's answer to a `PasswordAccess` request.
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordAccessConfirm {
    /// Access granted; carries the member profile on top of the plain
    /// confirm fields.
    Granted {
        /// Public rooms currently open.
        rooms: Vec<String>,
        /// Challenge to sign, or empty.
        challenge: Vec<u8>,
        /// The member's stored profile line.
        profile: String,
    },
    /// Access refused.
    Denied(AccessDenial),
}

/// Member/monitor/admin access packet.
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordAccess {
    /// Client asks for privileged access.
    Request(PasswordAccessRequest),
    /// Server grants or refuses.
    Confirm(PasswordAccessConfirm),
}

impl PasswordAccess {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            PasswordAccess::Request(_) => MessageKind::Request,
            PasswordAccess::Confirm(_) => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            PasswordAccess::Request(req) => req.write(w),
            PasswordAccess::Confirm(PasswordAccessConfirm::Denied(code)) => {
                w.write_i32(code.to_i32());
                Ok(())
            }
            PasswordAccess::Confirm(PasswordAccessConfirm::Granted {
                rooms,
                challenge,
                profile,
            }) => {
                w.write_i32(RESULT_OKAY);
                w.write_string_list(rooms)?;
                w.write_blob(challenge)?;
                w.write_string(profile)
            }
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        match kind {
            MessageKind::Request => Ok(Self::Request(PasswordAccessRequest::read(r)?)),
            _ => {
                let result = r.read_i32()?;
                if result != RESULT_OKAY {
                    return Ok(Self::Confirm(PasswordAccessConfirm::Denied(
                        AccessDenial::from_i32(result)?,
                    )));
                }
                Ok(Self::Confirm(PasswordAccessConfirm::Granted {
                    rooms: r.read_string_list()?,
                    challenge: r.read_blob()?,
                    profile: r.read_string()?,
                }))
            }
        }
    }
}

// ---------------------------------------------------------------------
// Authenticate
// ---------------------------------------------------------------------

/// The client's answer to the access challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticateRequest {
    /// Signature over the challenge bytes; empty means "no signature
    /// offered" and is sent as-is for the server to judge.
    pub signature: Vec<u8>,
}

/// Server's verdict on the signature.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticateConfirm {
    /// Signature accepted; the withheld room list arrives here.
    Granted {
        /// Public rooms currently open.
        rooms: Vec<String>,
    },
    /// Signature rejected; the connection is done.
    Denied,
}

/// Wire result code for a rejected signature.
const AUTH_DENIED: i32 = 2;

/// Challenge-response authentication packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Authenticate {
    /// Client presents the signature.
    Request(AuthenticateRequest),
    /// Server accepts or rejects.
    Confirm(AuthenticateConfirm),
}

impl Authenticate {
    /// Which exchange phase this instance represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            Authenticate::Request(_) => MessageKind::Request,
            Authenticate::Confirm(_) => MessageKind::Confirm,
        }
    }

    pub(crate) fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_u8(self.kind().to_byte());
        match self {
            Authenticate::Request(req) => w.write_blob(&req.signature),
            Authenticate::Confirm(AuthenticateConfirm::Denied) => {
                w.write_i32(AUTH_DENIED);
                Ok(())
            }
            Authenticate::Confirm(AuthenticateConfirm::Granted { rooms }) => {
                w.write_i32(RESULT_OKAY);
                w.write_string_list(rooms)
            }
        }
    }

    pub(crate) fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let kind = read_kind(r, &[MessageKind::Request, MessageKind::Confirm])?;
        match kind {
            MessageKind::Request => Ok(Self::Request(AuthenticateRequest {
                signature: r.read_blob()?,
            })),
            _ => {
                let result = r.read_i32()?;
                match result {
                    RESULT_OKAY => Ok(Self::Confirm(AuthenticateConfirm::Granted {
                        rooms: r.read_string_list()?,
                    })),
                    AUTH_DENIED => Ok(Self::Confirm(AuthenticateConfirm::Denied)),
                    other => Err(Error::Malformed(format!(
                        "unknown authenticate result: {other}"
                    ))),
                }
            }
        }
    }
}
