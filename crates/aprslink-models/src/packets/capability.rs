//! Station capabilities.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AprsError;

/// Station capabilities (`<`): comma separated `TOKEN` or `TOKEN=value`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StationCapability {
    /// Tokens in wire order, with their values.
    pub capabilities: Vec<(String, Option<String>)>,
}

impl StationCapability {
    /// Decode the info field of a capabilities packet.
    pub fn decode(info: &str) -> Result<Self, AprsError> {
        let capabilities: Vec<(String, Option<String>)> = info
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| match c.split_once('=') {
                Some((token, value)) => (token.trim().to_string(), Some(value.trim().to_string())),
                None => (c.to_string(), None),
            })
            .collect();
        if capabilities.is_empty() {
            return Err(AprsError::parse("capabilities packet lists no capabilities"));
        }
        debug!(count = capabilities.len(), "decoded station capabilities");
        Ok(Self { capabilities })
    }

    /// The value of `token`, if listed with one.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|(t, _)| t == token)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Render the info field (everything after `<`).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        if self.capabilities.is_empty() {
            return Err(AprsError::encode("no capabilities to encode"));
        }
        Ok(self
            .capabilities
            .iter()
            .map(|(token, value)| match value {
                Some(value) => format!("{token}={value}"),
                None => token.clone(),
            })
            .collect::<Vec<_>>()
            .join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_and_encode() {
        let caps = StationCapability::decode("IGATE,MSG_CNT=43, LOC_CNT=14").unwrap();
        assert_eq!(
            caps.capabilities,
            vec![
                ("IGATE".to_string(), None),
                ("MSG_CNT".to_string(), Some("43".to_string())),
                ("LOC_CNT".to_string(), Some("14".to_string())),
            ]
        );
        assert_eq!(caps.get("MSG_CNT"), Some("43"));
        assert_eq!(caps.get("IGATE"), None);
        assert_eq!(
            caps.encode_info().unwrap(),
            "IGATE,MSG_CNT=43,LOC_CNT=14"
        );
    }

    #[test]
    fn empty_is_an_error() {
        assert!(StationCapability::decode(" , ").is_err());
        assert!(StationCapability::default().encode_info().is_err());
    }
}
