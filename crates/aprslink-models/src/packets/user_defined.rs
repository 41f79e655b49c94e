//! User-defined data.

use serde::{Deserialize, Serialize};

use crate::error::AprsError;

/// User-defined data (`{`): a user id, a packet type and opaque data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserDefined {
    /// Identifier assigned to the author of the format.
    pub user_id: char,
    /// The author's packet type.
    pub packet_type: char,
    /// Everything after the packet type.
    pub data: String,
}

impl UserDefined {
    /// Decode the info field of a user-defined packet.
    pub fn decode(info: &str) -> Result<Self, AprsError> {
        let mut chars = info.chars();
        match (chars.next(), chars.next()) {
            (Some(user_id), Some(packet_type)) => Ok(Self {
                user_id,
                packet_type,
                data: chars.as_str().to_string(),
            }),
            _ => Err(AprsError::parse(
                "user-defined packet needs a user id and a packet type",
            )),
        }
    }

    /// Render the info field (everything after `{`).
    pub fn encode_info(&self) -> String {
        format!("{}{}{}", self.user_id, self.packet_type, self.data)
    }
}
