//! Line-oriented decoding of an APRS-IS feed.

use aprslink_models::{AprsPacket, Payload};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::error::SdkError;

/// Decodes APRS-IS lines into packets.
///
/// Server comments (`#`) and blank lines are skipped. In best-effort mode a
/// line whose body cannot be decoded is kept as a [`Payload::Generic`]
/// packet as long as its header is valid.
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    config: DecoderConfig,
}

impl PacketDecoder {
    /// Create a decoder.
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one line, resolving timestamps against the current time.
    pub fn decode_line(&self, line: &str) -> Result<Option<AprsPacket>, SdkError> {
        self.decode_line_at(line, Utc::now())
    }

    /// Decode one line, resolving timestamps against `now`.
    ///
    /// Returns `Ok(None)` for blank lines and server comments.
    pub fn decode_line_at(
        &self,
        line: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AprsPacket>, SdkError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('#') {
            debug!(comment = line, "server comment");
            return Ok(None);
        }

        match AprsPacket::parse_at(line, now) {
            Ok(packet) => Ok(Some(packet)),
            Err(err) if self.config.best_effort => {
                warn!(error = %err, "keeping undecodable packet as generic");
                Ok(Some(AprsPacket::parse_generic(line)?))
            }
            Err(err) => Err(err.into()),
        }
    }
}
