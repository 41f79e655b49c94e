//! Messages, bulletins and announcements.
//!
//! The addressee is a fixed 9-character field followed by `:`. Addressees
//! starting with `BLN` are bulletins (`BLN0`–`BLN9`, optionally followed by
//! a group name) or announcements (`BLNA`–`BLNZ`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AprsError;

/// Width of the addressee field, padded with spaces.
pub const ADDRESSEE_LEN: usize = 9;
/// Longest message text the protocol allows.
pub const MAX_MESSAGE_LEN: usize = 67;
/// Longest message identifier.
pub const MAX_MESSAGE_ID_LEN: usize = 5;

static ACK_REJ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ack|rej)([A-Za-z0-9]{1,5})$").expect("ack/rej regex is valid"));

/// What a `:` packet is, derived from its addressee and text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    /// A message to a station.
    Message,
    /// `BLNn`: general bulletin `n`.
    Bulletin {
        /// Bulletin number 0–9.
        id: u8,
    },
    /// `BLNnGROUP`: bulletin `n` for a named group.
    GroupBulletin {
        /// Bulletin number 0–9.
        id: u8,
        /// Group name, up to 5 characters.
        group: String,
    },
    /// `BLNa`: announcement `a`.
    Announcement {
        /// Announcement letter A–Z.
        id: char,
    },
    /// `ackNNNNN`: acknowledges message `id`.
    Ack {
        /// Identifier of the acknowledged message.
        id: String,
    },
    /// `rejNNNNN`: rejects message `id`.
    Reject {
        /// Identifier of the rejected message.
        id: String,
    },
}

/// A message, bulletin, announcement, ack or reject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Addressee with padding removed (`BLN…` for bulletins).
    pub addressee: String,
    /// What the packet is.
    pub kind: MessageKind,
    /// Message text; empty for acks and rejects.
    pub text: String,
    /// Identifier after `{`, when the sender wants an acknowledgement.
    pub message_id: Option<String>,
}

impl Message {
    /// A message to `addressee`.
    pub fn new(addressee: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            addressee: addressee.into(),
            kind: MessageKind::Message,
            text: text.into(),
            message_id: None,
        }
    }

    /// Acknowledge message `id` from `addressee`.
    pub fn ack(addressee: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            addressee: addressee.into(),
            kind: MessageKind::Ack { id: id.into() },
            text: String::new(),
            message_id: None,
        }
    }

    /// Reject message `id` from `addressee`.
    pub fn reject(addressee: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            addressee: addressee.into(),
            kind: MessageKind::Reject { id: id.into() },
            text: String::new(),
            message_id: None,
        }
    }

    /// General bulletin number `id`.
    pub fn bulletin(id: u8, text: impl Into<String>) -> Self {
        Self {
            addressee: format!("BLN{id}"),
            kind: MessageKind::Bulletin { id },
            text: text.into(),
            message_id: None,
        }
    }

    /// Announcement `id`.
    pub fn announcement(id: char, text: impl Into<String>) -> Self {
        Self {
            addressee: format!("BLN{id}"),
            kind: MessageKind::Announcement { id },
            text: text.into(),
            message_id: None,
        }
    }

    /// Request an acknowledgement with the given identifier.
    #[must_use]
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Decode the info field of a `:` packet.
    pub fn decode(info: &str) -> Result<Self, AprsError> {
        match info.as_bytes().get(ADDRESSEE_LEN) {
            Some(b':') => {}
            Some(_) => {
                return Err(AprsError::parse(
                    "invalid message packet (missing ':' after the addressee)",
                ))
            }
            None => return Err(AprsError::parse("message packet is too short")),
        }
        let raw_addressee = &info[..ADDRESSEE_LEN];
        let addressee = raw_addressee.trim_end();
        let body = &info[ADDRESSEE_LEN + 1..];
        debug!(addressee, body, "decoding message");

        let (text, message_id) = match body.split_once('{') {
            Some((text, id)) => {
                if id.len() > MAX_MESSAGE_ID_LEN {
                    return Err(AprsError::parse(format!("invalid message ID \"{id}\"")));
                }
                (text, Some(id.to_string()))
            }
            None => (body, None),
        };
        if text.chars().count() > MAX_MESSAGE_LEN {
            warn!(
                length = text.chars().count(),
                "message text is longer than {MAX_MESSAGE_LEN} characters"
            );
        }

        let kind = if let Some(rest) = raw_addressee.strip_prefix("BLN") {
            bulletin_kind(rest)?
        } else if message_id.is_none() {
            match ACK_REJ_RE.captures(text) {
                Some(caps) if &caps[1] == "ack" => MessageKind::Ack {
                    id: caps[2].to_string(),
                },
                Some(caps) => MessageKind::Reject {
                    id: caps[2].to_string(),
                },
                None => MessageKind::Message,
            }
        } else {
            MessageKind::Message
        };

        let text = match kind {
            MessageKind::Ack { .. } | MessageKind::Reject { .. } => String::new(),
            _ => text.to_string(),
        };
        Ok(Self {
            addressee: addressee.to_string(),
            kind,
            text,
            message_id,
        })
    }

    /// Render the info field (everything after the `:` data type identifier).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        if self.addressee.is_empty() || self.addressee.len() > ADDRESSEE_LEN {
            return Err(AprsError::encode(format!(
                "addressee \"{}\" must be 1 to {ADDRESSEE_LEN} characters",
                self.addressee
            )));
        }
        let text = match &self.kind {
            MessageKind::Ack { id } => format!("ack{id}"),
            MessageKind::Reject { id } => format!("rej{id}"),
            _ => self.text.clone(),
        };
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(AprsError::encode(format!(
                "message text is longer than {MAX_MESSAGE_LEN} characters"
            )));
        }

        let mut out = format!("{:<width$}:{text}", self.addressee, width = ADDRESSEE_LEN);
        if let Some(id) = &self.message_id {
            if id.is_empty() || id.len() > MAX_MESSAGE_ID_LEN {
                return Err(AprsError::encode(format!("invalid message ID \"{id}\"")));
            }
            out.push('{');
            out.push_str(id);
        }
        Ok(out)
    }
}

fn bulletin_kind(rest: &str) -> Result<MessageKind, AprsError> {
    let group = rest.get(1..).unwrap_or_default().trim_end();
    match rest.as_bytes().first() {
        Some(&d @ b'0'..=b'9') => {
            let id = d - b'0';
            if group.is_empty() {
                Ok(MessageKind::Bulletin { id })
            } else {
                Ok(MessageKind::GroupBulletin {
                    id,
                    group: group.to_string(),
                })
            }
        }
        Some(&a @ b'A'..=b'Z') if group.is_empty() => Ok(MessageKind::Announcement {
            id: char::from(a),
        }),
        _ => Err(AprsError::parse(format!(
            "incorrectly formatted bulletin \"BLN{rest}\""
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_message_with_id() {
        let msg = Message::decode("XX1XX-1  :Hello world{12345").unwrap();
        assert_eq!(msg.addressee, "XX1XX-1");
        assert_eq!(msg.kind, MessageKind::Message);
        assert_eq!(msg.text, "Hello world");
        assert_eq!(msg.message_id.as_deref(), Some("12345"));
        assert_eq!(msg.encode_info().unwrap(), "XX1XX-1  :Hello world{12345");
    }

    #[test]
    fn missing_colon() {
        assert!(Message::decode("XX1XX-1   Hello").is_err());
        assert!(Message::decode("XX1XX").is_err());
    }

    #[test]
    fn message_id_too_long() {
        assert!(Message::decode("XX1XX    :Hello{123456").is_err());
    }

    #[test]
    fn long_text_is_kept() {
        let text = "x".repeat(70);
        let msg = Message::decode(&format!("XX1XX    :{text}")).unwrap();
        assert_eq!(msg.text, text);
        assert!(msg.encode_info().is_err());
    }

    #[test]
    fn bulletins_and_announcements() {
        let msg = Message::decode("BLN3     :Snow expected").unwrap();
        assert_eq!(msg.kind, MessageKind::Bulletin { id: 3 });

        let msg = Message::decode("BLN4WX   :Storm warning").unwrap();
        assert_eq!(
            msg.kind,
            MessageKind::GroupBulletin {
                id: 4,
                group: "WX".into()
            }
        );
        assert_eq!(msg.addressee, "BLN4WX");

        let msg = Message::decode("BLNQ     :Hamfest Saturday").unwrap();
        assert_eq!(msg.kind, MessageKind::Announcement { id: 'Q' });
        assert_eq!(msg.encode_info().unwrap(), "BLNQ     :Hamfest Saturday");
    }

    #[test]
    fn malformed_bulletins() {
        assert!(Message::decode("BLNQWX   :text").is_err());
        assert!(Message::decode("BLN      :text").is_err());
        assert!(Message::decode("BLN*     :text").is_err());
    }

    #[test]
    fn ack_and_reject() {
        let msg = Message::decode("N0CALL   :ack003").unwrap();
        assert_eq!(msg.kind, MessageKind::Ack { id: "003".into() });
        assert_eq!(msg.text, "");
        assert_eq!(msg.encode_info().unwrap(), "N0CALL   :ack003");

        let msg = Message::decode("N0CALL   :rejAB").unwrap();
        assert_eq!(msg.kind, MessageKind::Reject { id: "AB".into() });
        assert_eq!(Message::reject("N0CALL", "AB"), msg);
    }

    #[test]
    fn text_starting_with_ack_is_a_message() {
        let msg = Message::decode("N0CALL   :acknowledged, see you").unwrap();
        assert_eq!(msg.kind, MessageKind::Message);
    }

    #[test]
    fn constructors_encode() {
        assert_eq!(
            Message::new("N0CALL", "hi").with_message_id("1").encode_info().unwrap(),
            "N0CALL   :hi{1"
        );
        assert_eq!(
            Message::bulletin(0, "Net tonight").encode_info().unwrap(),
            "BLN0     :Net tonight"
        );
        assert!(Message::new("TOOLONGCALL", "hi").encode_info().is_err());
    }

    #[test]
    fn kind_names() {
        assert_eq!(MessageKind::Bulletin { id: 1 }.to_string(), "bulletin");
        let name: &'static str = (&MessageKind::Ack { id: "1".into() }).into();
        assert_eq!(name, "ack");
    }

    #[test]
    fn serde_roundtrip() {
        let msg = Message::decode("BLN4WX   :Storm warning").unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"group_bulletin\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
