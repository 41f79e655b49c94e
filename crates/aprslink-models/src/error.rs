//! Error types for the `aprslink-models` crate.
//!
//! Every decoder and encoder in this crate returns [`AprsError`]. Decoding
//! distinguishes between input that is malformed ([`AprsError::Parse`]) and
//! input that is well-formed APRS but deliberately not decoded
//! ([`AprsError::Unsupported`]). Both carry the raw packet once it is known.

/// Errors produced while decoding or encoding APRS packets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AprsError {
    /// The input does not follow the expected packet layout.
    #[error("parse error: {reason}{}", packet_suffix(.packet))]
    Parse {
        /// Human-readable explanation.
        reason: String,
        /// The raw packet, when the failure happened inside a full packet parse.
        packet: Option<String>,
    },

    /// The input is valid APRS, but this packet format is not decoded.
    #[error("unsupported packet: {reason}{}", packet_suffix(.packet))]
    Unsupported {
        /// Human-readable explanation.
        reason: String,
        /// The raw packet, when the failure happened inside a full packet parse.
        packet: Option<String>,
    },

    /// A typed value cannot be rendered back to wire text.
    #[error("encode error: {reason}")]
    Encode {
        /// Human-readable explanation.
        reason: String,
    },
}

fn packet_suffix(packet: &Option<String>) -> String {
    match packet {
        Some(raw) => format!(" (packet: {raw})"),
        None => String::new(),
    }
}

impl AprsError {
    /// Build a [`AprsError::Parse`] without an attached packet.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
            packet: None,
        }
    }

    /// Build a [`AprsError::Unsupported`] without an attached packet.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
            packet: None,
        }
    }

    /// Build a [`AprsError::Encode`].
    pub fn encode(reason: impl Into<String>) -> Self {
        Self::Encode {
            reason: reason.into(),
        }
    }

    /// Attach the raw packet to a decode error.
    ///
    /// An already attached packet is kept. Encode errors are returned unchanged.
    #[must_use]
    pub fn with_packet(self, raw: &str) -> Self {
        match self {
            Self::Parse {
                reason,
                packet: None,
            } => Self::Parse {
                reason,
                packet: Some(raw.to_string()),
            },
            Self::Unsupported {
                reason,
                packet: None,
            } => Self::Unsupported {
                reason,
                packet: Some(raw.to_string()),
            },
            other => other,
        }
    }

    /// The raw packet attached to this error, if any.
    pub fn packet(&self) -> Option<&str> {
        match self {
            Self::Parse { packet, .. } | Self::Unsupported { packet, .. } => packet.as_deref(),
            Self::Encode { .. } => None,
        }
    }

    /// `true` for [`AprsError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_parse() {
        let err = AprsError::parse("latitude degrees out of range");
        assert_eq!(err.to_string(), "parse error: latitude degrees out of range");
    }

    #[test]
    fn error_display_parse_with_packet() {
        let err = AprsError::parse("packet is too short").with_packet("N0CALL>APRS:!12");
        assert_eq!(
            err.to_string(),
            "parse error: packet is too short (packet: N0CALL>APRS:!12)"
        );
        assert_eq!(err.packet(), Some("N0CALL>APRS:!12"));
    }

    #[test]
    fn error_display_unsupported() {
        let err = AprsError::unsupported("raw NMEA");
        assert_eq!(err.to_string(), "unsupported packet: raw NMEA");
        assert!(err.is_unsupported());
    }

    #[test]
    fn error_display_encode() {
        let err = AprsError::encode("latitude must be between -90 and 90");
        assert_eq!(
            err.to_string(),
            "encode error: latitude must be between -90 and 90"
        );
        assert_eq!(err.with_packet("ignored").packet(), None);
    }

    #[test]
    fn with_packet_keeps_first_packet() {
        let err = AprsError::parse("bad")
            .with_packet("first")
            .with_packet("second");
        assert_eq!(err.packet(), Some("first"));
    }
}
