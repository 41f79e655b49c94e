//! Status reports.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AprsError;
use crate::timestamp::{Timestamp, TimestampKind, TIMESTAMP_LEN};

static LOCATOR_6_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2}[0-9]{2}[A-Z]{2})([/\\0-9A-Z])(.)").expect("locator regex is valid")
});
static LOCATOR_4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2}[0-9]{2})([/\\0-9A-Z])(.)").expect("locator regex is valid")
});
static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}z").expect("status timestamp regex is valid"));
static BEAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^(..)$").expect("beam heading regex is valid"));

/// A Maidenhead grid locator with the station symbol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Maidenhead {
    /// 4 or 6 character locator, e.g. `IO91SX`.
    pub locator: String,
    /// Symbol table identifier.
    pub symbol_table: char,
    /// Symbol code.
    pub symbol_id: char,
}

/// A status report (`>`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Zulu timestamp prefix.
    pub timestamp: Option<Timestamp>,
    /// Grid locator prefix (never together with a timestamp).
    pub maidenhead: Option<Maidenhead>,
    /// Status text, including any `^` beam heading / ERP suffix.
    pub text: String,
}

impl Status {
    /// A plain text status.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            maidenhead: None,
            text: text.into(),
        }
    }

    /// Decode the info field of a status report.
    ///
    /// A grid locator is tried before a timestamp, which is tried before
    /// plain text. A leading `DDHHMMz` that does not decode is an error.
    pub fn decode(info: &str, now: DateTime<Utc>) -> Result<Self, AprsError> {
        let locator = LOCATOR_6_RE
            .captures(info)
            .or_else(|| LOCATOR_4_RE.captures(info));
        if let Some(caps) = locator {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let maidenhead = Maidenhead {
                locator: caps[1].to_string(),
                symbol_table: caps[2].chars().next().unwrap_or('/'),
                symbol_id: caps[3].chars().next().unwrap_or('/'),
            };
            debug!(?maidenhead, "status carries a grid locator");

            let rest = &info[whole..];
            let text = if rest.is_empty() {
                ""
            } else {
                rest.strip_prefix(' ').ok_or_else(|| {
                    AprsError::parse("status text after a grid locator must start with a space")
                })?
            };
            return Ok(Self {
                timestamp: None,
                maidenhead: Some(maidenhead),
                text: text.to_string(),
            });
        }

        if TIMESTAMP_RE.is_match(info) {
            let timestamp = Timestamp::decode_at(&info[..TIMESTAMP_LEN], now)?;
            return Ok(Self {
                timestamp,
                maidenhead: None,
                text: info[TIMESTAMP_LEN..].to_string(),
            });
        }

        Ok(Self::new(info))
    }

    /// The two characters of a trailing `^` beam heading / ERP suffix.
    pub fn beam_heading_power(&self) -> Option<&str> {
        BEAM_RE
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Render the info field (everything after `>`).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        match (&self.timestamp, &self.maidenhead) {
            (Some(_), Some(_)) => Err(AprsError::encode(
                "a status cannot carry both a timestamp and a grid locator",
            )),
            (Some(timestamp), None) => {
                if timestamp.kind != TimestampKind::Zulu {
                    return Err(AprsError::encode("status timestamps must be zulu"));
                }
                Ok(format!("{}{}", timestamp.encode(), self.text))
            }
            (None, Some(grid)) => {
                if !matches!(grid.locator.len(), 4 | 6) {
                    return Err(AprsError::encode(format!(
                        "grid locator \"{}\" must be 4 or 6 characters",
                        grid.locator
                    )));
                }
                let mut out = format!("{}{}{}", grid.locator, grid.symbol_table, grid.symbol_id);
                if !self.text.is_empty() {
                    out.push(' ');
                    out.push_str(&self.text);
                }
                Ok(out)
            }
            (None, None) => Ok(self.text.clone()),
        }
    }
}
