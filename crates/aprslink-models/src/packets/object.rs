//! Objects and items.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AprsError;
use crate::extensions::DataExtension;
use crate::position::{
    decode_compressed_block, decode_position_block, decode_uncompressed_block,
    encode_position_block, Position,
};
use crate::timestamp::{Timestamp, TIMESTAMP_LEN};

/// Width of an object name, padded with spaces.
pub const OBJECT_NAME_LEN: usize = 9;

static ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([^!_]{3,9})([!_])(.*)$").expect("item regex is valid"));

fn live_marker(live: bool, alive: char, killed: char) -> char {
    if live {
        alive
    } else {
        killed
    }
}

// ─── Object ──────────────────────────────────────────────────────────

/// An object report (`;`): a named, timestamped position placed by a
/// station on behalf of something else.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Object {
    /// Object name with padding removed.
    pub name: String,
    /// `true` for a live object (`*`), `false` for a killed one (`_`).
    pub live: bool,
    /// Report time; `000000` on the wire when absent.
    pub timestamp: Option<Timestamp>,
    /// The object's position.
    pub position: Position,
    /// Data extension following the position.
    pub extension: Option<DataExtension>,
    /// Free text.
    pub comment: String,
}

impl Object {
    /// Decode the info field of an object report.
    pub fn decode(info: &str, now: DateTime<Utc>) -> Result<Self, AprsError> {
        let header_len = OBJECT_NAME_LEN + 1 + TIMESTAMP_LEN;
        let header = info
            .get(..header_len)
            .ok_or_else(|| AprsError::parse("object report is too short"))?;

        let live = match header.as_bytes()[OBJECT_NAME_LEN] {
            b'*' => true,
            b'_' => false,
            other => {
                return Err(AprsError::parse(format!(
                    "invalid object state {:?}",
                    char::from(other)
                )))
            }
        };
        // The state byte is ASCII, so both slices fall on char boundaries.
        let name = header[..OBJECT_NAME_LEN].trim_end();
        let timestamp = Timestamp::decode_at(&header[OBJECT_NAME_LEN + 1..], now)?;
        let block = decode_position_block(&info[header_len..])?;
        debug!(name, live, "decoded object");

        Ok(Self {
            name: name.to_string(),
            live,
            timestamp,
            position: block.position,
            extension: block.extension,
            comment: block.comment,
        })
    }

    /// Render the info field (everything after `;`).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        if self.name.is_empty() || self.name.chars().count() > OBJECT_NAME_LEN {
            return Err(AprsError::encode(format!(
                "object name \"{}\" must be 1 to {OBJECT_NAME_LEN} characters",
                self.name
            )));
        }
        let timestamp = self
            .timestamp
            .as_ref()
            .map_or_else(|| "000000z".to_string(), Timestamp::encode);
        Ok(format!(
            "{:<width$}{}{timestamp}{}",
            self.name,
            live_marker(self.live, '*', '_'),
            encode_position_block(&self.position, self.extension.as_ref(), &self.comment)?,
            width = OBJECT_NAME_LEN
        ))
    }
}

// ─── Item ────────────────────────────────────────────────────────────

/// An item report (`)`): like an object but without a timestamp.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item {
    /// Item name, 3 to 9 characters without `!` or `_`.
    pub name: String,
    /// `true` for a live item (`!`), `false` for a killed one (`_`).
    pub live: bool,
    /// The item's position.
    pub position: Position,
    /// Data extension following the position.
    pub extension: Option<DataExtension>,
    /// Free text.
    pub comment: String,
}

impl Item {
    /// Decode the info field of an item report.
    ///
    /// The position is uncompressed when its first character is a digit.
    pub fn decode(info: &str) -> Result<Self, AprsError> {
        let caps = ITEM_RE
            .captures(info)
            .ok_or_else(|| AprsError::parse("invalid item name or state"))?;
        let name = &caps[1];
        let live = &caps[2] == "!";
        let rest = caps.get(3).map_or("", |m| m.as_str());

        let block = if rest.starts_with(|c: char| c.is_ascii_digit()) {
            decode_uncompressed_block(rest)?
        } else {
            decode_compressed_block(rest)?
        };
        debug!(name, live, "decoded item");

        Ok(Self {
            name: name.to_string(),
            live,
            position: block.position,
            extension: block.extension,
            comment: block.comment,
        })
    }

    /// Render the info field (everything after `)`).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        let len = self.name.chars().count();
        if !(3..=9).contains(&len) || self.name.contains(|c| c == '!' || c == '_') {
            return Err(AprsError::encode(format!(
                "item name \"{}\" must be 3 to 9 characters without '!' or '_'",
                self.name
            )));
        }
        Ok(format!(
            "{}{}{}",
            self.name,
            live_marker(self.live, '!', '_'),
            encode_position_block(&self.position, self.extension.as_ref(), &self.comment)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::Directivity;
    use crate::timestamp::TimestampKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 10, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn object_roundtrip() {
        let info = "LEADER   *092345z4903.50N/07201.75W>088/036";
        let object = Object::decode(info, now()).unwrap();
        assert_eq!(object.name, "LEADER");
        assert!(object.live);
        assert_eq!(object.timestamp.unwrap().kind, TimestampKind::Zulu);
        assert_eq!(object.position.course, Some(88));
        assert_eq!(object.position.speed, Some(36.0));
        assert_eq!(object.encode_info().unwrap(), info);
    }

    #[test]
    fn killed_object_with_phg() {
        let info = "REPEATER _111111z4903.50N/07201.75WrPHG5132 146.52";
        let object = Object::decode(info, now()).unwrap();
        assert!(!object.live);
        match &object.extension {
            Some(DataExtension::Phg(phg)) => {
                assert_eq!(phg.power, 25);
                assert_eq!(phg.directivity, Directivity::Degrees(90));
            }
            other => panic!("unexpected extension {other:?}"),
        }
        assert_eq!(object.comment, " 146.52");
        assert_eq!(object.encode_info().unwrap(), info);
    }

    #[test]
    fn compressed_object() {
        let object = Object::decode("OBJ      *000000z/5L!!<*e7>7P[", now()).unwrap();
        assert!(object.timestamp.is_none());
        assert!(object.position.is_compressed());
        assert_eq!(object.encode_info().unwrap(), "OBJ      *000000z/5L!!<*e7>7P[");
    }

    #[test]
    fn object_errors() {
        assert!(Object::decode("SHORT*0923", now()).is_err());
        assert!(Object::decode("LEADER   #092345z4903.50N/07201.75W>", now()).is_err());
        assert!(Object::decode("LEADER   *0923a5z4903.50N/07201.75W>", now()).is_err());
    }

    #[test]
    fn item_uncompressed() {
        let item = Item::decode("AID #2!4903.50N/07201.75WA").unwrap();
        assert_eq!(item.name, "AID #2");
        assert!(item.live);
        assert_eq!(item.position.latitude, 49.058333);
        assert!(!item.position.is_compressed());
        assert_eq!(item.encode_info().unwrap(), "AID #2!4903.50N/07201.75WA");
    }

    #[test]
    fn item_compressed_and_killed() {
        let item = Item::decode("MOBIL_/5L!!<*e7>7P[").unwrap();
        assert!(!item.live);
        assert!(item.position.is_compressed());
        assert_eq!(item.position.longitude, -72.750004);
        assert_eq!(item.encode_info().unwrap(), "MOBIL_/5L!!<*e7>7P[");
    }

    #[test]
    fn item_name_rules() {
        assert!(Item::decode("AB!4903.50N/07201.75WA").is_err());
        assert!(Item::decode("ABCDEFGHIJ!4903.50N/07201.75WA").is_err());
        let mut item = Item::decode("AID #2!4903.50N/07201.75WA").unwrap();
        item.name = "A_B".into();
        assert!(item.encode_info().is_err());
    }
}
