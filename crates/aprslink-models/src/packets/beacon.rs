//! Beacons and undecoded bodies.

use serde::{Deserialize, Serialize};

use crate::error::AprsError;

/// A packet sent to a beacon destination. The whole body, data type
/// identifier included, is free text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    /// Beacon text.
    pub text: String,
}

impl Beacon {
    /// Build from the data type identifier and the info field.
    pub fn decode(data_type_id: char, info: &str) -> Self {
        Self {
            text: format!("{data_type_id}{info}"),
        }
    }

    /// First character of the text, `None` when the text is empty.
    pub fn data_type_id(&self) -> Option<char> {
        self.text.chars().next()
    }

    /// The text after its first character.
    pub fn encode_info(&self) -> Result<String, AprsError> {
        let mut chars = self.text.chars();
        chars
            .next()
            .ok_or_else(|| AprsError::encode("beacon text is empty"))?;
        Ok(chars.as_str().to_string())
    }
}

/// A packet body kept verbatim because it could not be decoded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Generic {
    /// Data type identifier.
    pub data_type_id: char,
    /// Info field.
    pub info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_keeps_data_type_id() {
        let beacon = Beacon::decode('!', "Hello from the hills");
        assert_eq!(beacon.text, "!Hello from the hills");
        assert_eq!(beacon.data_type_id(), Some('!'));
        assert_eq!(beacon.encode_info().unwrap(), "Hello from the hills");
    }

    #[test]
    fn empty_beacon_cannot_be_encoded() {
        let beacon = Beacon { text: String::new() };
        assert_eq!(beacon.data_type_id(), None);
        assert!(beacon.encode_info().is_err());
    }
}
