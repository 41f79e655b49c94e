//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK. Decoder failures from the core are wrapped as
//! [`SdkError::Decode`] so callers can still reach the raw packet.

use aprslink_models::AprsError;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid configuration value (e.g. an unparsable boolean).
    #[error("configuration error: {0}")]
    Config(String),

    /// The login callsign is not a valid station.
    #[error("invalid callsign: {0}")]
    InvalidCallsign(String),

    /// A packet line could not be decoded.
    #[error(transparent)]
    Decode(#[from] AprsError),
}

impl SdkError {
    /// The raw packet carried by a decode error.
    pub fn packet(&self) -> Option<&str> {
        match self {
            Self::Decode(e) => e.packet(),
            Self::Config(_) | Self::InvalidCallsign(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_keeps_the_packet() {
        let err: SdkError = AprsError::parse("bad").with_packet("N0CALL>APRS:x").into();
        assert_eq!(err.packet(), Some("N0CALL>APRS:x"));
        assert_eq!(
            err.to_string(),
            "parse error: bad (packet: N0CALL>APRS:x)"
        );
    }

    #[test]
    fn config_display() {
        let err = SdkError::Config("APRS_BEST_EFFORT=maybe".into());
        assert_eq!(err.to_string(), "configuration error: APRS_BEST_EFFORT=maybe");
        assert_eq!(err.packet(), None);
    }
}
