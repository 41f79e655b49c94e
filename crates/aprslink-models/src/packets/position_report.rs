//! Position reports with and without timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AprsError;
use crate::extensions::DataExtension;
use crate::position::{decode_position_block, encode_position_block, Position};
use crate::timestamp::{Timestamp, TIMESTAMP_LEN};

const ZERO_TIMESTAMP: &str = "000000z";

/// A position report (`!`, `=`, `/`, `@`).
///
/// The data type identifier is not stored: it follows from whether a
/// timestamp is present and whether the station is message-capable.
///
/// | | no timestamp | timestamp |
/// |---|---|---|
/// | no messaging | `!` | `/` |
/// | messaging | `=` | `@` |
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionReport {
    /// Report time, for `/` and `@` reports.
    pub timestamp: Option<Timestamp>,
    /// A `/` or `@` report sent with the all-zero placeholder instead of a
    /// time. Such reports keep their data type identifier and are encoded
    /// with `000000z`.
    #[serde(default)]
    pub timestamp_placeholder: bool,
    /// The station accepts messages.
    pub messaging: bool,
    /// The position itself.
    pub position: Position,
    /// Data extension following the position.
    pub extension: Option<DataExtension>,
    /// Free text.
    pub comment: String,
    /// Banner text placed before the `!` by old digipeaters (X1J style),
    /// including the character that took the data type identifier's place.
    pub header: Option<String>,
}

impl PositionReport {
    /// A plain report without timestamp, extension or comment.
    pub fn new(position: Position) -> Self {
        Self {
            timestamp: None,
            timestamp_placeholder: false,
            messaging: false,
            position,
            extension: None,
            comment: String::new(),
            header: None,
        }
    }

    /// Decode the info field of a position report.
    pub fn decode(
        data_type_id: char,
        info: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, AprsError> {
        let (messaging, timestamped) = match data_type_id {
            '!' => (false, false),
            '=' => (true, false),
            '/' => (false, true),
            '@' => (true, true),
            other => {
                return Err(AprsError::parse(format!(
                    "{other:?} is not a position data type identifier"
                )))
            }
        };
        if info.len() < 4 {
            return Err(AprsError::parse("position report is too short"));
        }

        let (timestamp, data) = if timestamped {
            let raw = info
                .get(..TIMESTAMP_LEN)
                .ok_or_else(|| AprsError::parse("position report is missing its timestamp"))?;
            (Timestamp::decode_at(raw, now)?, &info[TIMESTAMP_LEN..])
        } else {
            (None, info)
        };

        let block = decode_position_block(data)?;
        debug!(messaging, ?timestamp, "decoded position report");
        Ok(Self {
            timestamp_placeholder: timestamped && timestamp.is_none(),
            timestamp,
            messaging,
            position: block.position,
            extension: block.extension,
            comment: block.comment,
            header: None,
        })
    }

    /// Decode a report whose real `!` sits at `offset` inside the info field,
    /// keeping everything before it as [`PositionReport::header`].
    pub fn decode_with_header(
        data_type_id: char,
        info: &str,
        offset: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, AprsError> {
        let banner = info
            .get(..offset)
            .ok_or_else(|| AprsError::parse("invalid position header offset"))?;
        let mut report = Self::decode('!', &info[offset + 1..], now)?;
        debug!(banner, "position report carries an X1J header");
        report.header = Some(format!("{data_type_id}{banner}"));
        Ok(report)
    }

    /// The data type identifier this report is sent with.
    pub fn data_type_id(&self) -> char {
        if let Some(first) = self.header.as_deref().and_then(|h| h.chars().next()) {
            return first;
        }
        match (self.has_timestamp(), self.messaging) {
            (false, false) => '!',
            (false, true) => '=',
            (true, false) => '/',
            (true, true) => '@',
        }
    }

    fn has_timestamp(&self) -> bool {
        self.timestamp.is_some() || self.timestamp_placeholder
    }

    /// Render the info field (everything after [`PositionReport::data_type_id`]).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        let mut out = String::new();
        if let Some(header) = self.header.as_deref().filter(|h| !h.is_empty()) {
            if self.has_timestamp() || self.messaging {
                return Err(AprsError::encode(
                    "a position report with a header cannot carry a timestamp or messaging flag",
                ));
            }
            let mut chars = header.chars();
            chars.next();
            out.push_str(chars.as_str());
            out.push('!');
        }
        if let Some(timestamp) = &self.timestamp {
            out.push_str(&timestamp.encode());
        } else if self.timestamp_placeholder {
            out.push_str(ZERO_TIMESTAMP);
        }
        out.push_str(&encode_position_block(
            &self.position,
            self.extension.as_ref(),
            &self.comment,
        )?);
        Ok(out)
    }
}
