//! APRS timestamps.
//!
//! Three 7-character forms exist:
//!
//! | Form | Layout | Date context |
//! |------|--------|--------------|
//! | zulu | `DDHHMMz` | month and year taken from "now" |
//! | local | `DDHHMM/` | as zulu; the station's time zone is unknowable |
//! | hms | `HHMMSSh` | date taken from "now" |
//!
//! A decoded timestamp is never later than the reference time: a candidate
//! in the future is moved back one day (hms) or one month (zulu/local).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AprsError;

/// Length of a timestamp on the wire.
pub const TIMESTAMP_LEN: usize = 7;

/// The wire form a [`Timestamp`] was decoded from.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TimestampKind {
    /// Day / hour / minute in UTC.
    Zulu,
    /// Day / hour / minute in the sender's local time (decoded as UTC).
    Local,
    /// Hour / minute / second in UTC.
    Hms,
}

/// A decoded timestamp together with its wire form.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// The resolved instant.
    pub instant: DateTime<Utc>,
    /// The wire form.
    pub kind: TimestampKind,
}

impl Timestamp {
    /// Build a timestamp of the given kind.
    pub fn new(instant: DateTime<Utc>, kind: TimestampKind) -> Self {
        Self { instant, kind }
    }

    /// Decode against the current time. See [`Timestamp::decode_at`].
    pub fn decode(raw: &str) -> Result<Option<Self>, AprsError> {
        Self::decode_at(raw, Utc::now())
    }

    /// Decode a 7-character timestamp, resolving missing date fields against
    /// `now`.
    ///
    /// `000000` followed by any suffix means "no timestamp" and yields `None`.
    /// An unknown suffix is tolerated and decoded as zulu.
    ///
    /// # Examples
    ///
    /// ```
    /// use aprslink_models::{Timestamp, TimestampKind};
    /// use chrono::{TimeZone, Timelike, Datelike, Utc};
    ///
    /// let now = Utc.with_ymd_and_hms(2019, 10, 10, 12, 0, 0).unwrap();
    /// let ts = Timestamp::decode_at("302345z", now).unwrap().unwrap();
    /// assert_eq!(ts.kind, TimestampKind::Zulu);
    /// assert_eq!((ts.instant.month(), ts.instant.day()), (9, 30));
    /// assert_eq!((ts.instant.hour(), ts.instant.minute()), (23, 45));
    /// ```
    pub fn decode_at(raw: &str, now: DateTime<Utc>) -> Result<Option<Self>, AprsError> {
        let bytes = raw.as_bytes();
        if bytes.len() != TIMESTAMP_LEN || !bytes[..6].iter().all(u8::is_ascii_digit) {
            return Err(AprsError::parse(format!("invalid timestamp \"{raw}\"")));
        }
        let digits = &raw[..6];
        if digits == "000000" {
            debug!("timestamp is all zeros, treating as absent");
            return Ok(None);
        }

        let kind = match bytes[6] {
            b'z' | b'Z' => TimestampKind::Zulu,
            b'/' => {
                info!(timestamp = raw, "local time specified in timestamp, assuming UTC");
                TimestampKind::Local
            }
            b'h' => TimestampKind::Hms,
            other => {
                warn!(
                    timestamp = raw,
                    suffix = %char::from(other),
                    "unknown timestamp suffix, assuming zulu"
                );
                TimestampKind::Zulu
            }
        };

        let field = |i: usize| -> u32 {
            // Both bytes were checked to be ASCII digits above.
            u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0')
        };
        let (a, b, c) = (field(0), field(2), field(4));

        let instant = match kind {
            TimestampKind::Hms => resolve_hms(now, a, b, c),
            TimestampKind::Zulu | TimestampKind::Local => resolve_dhm(now, a, b, c),
        }
        .ok_or_else(|| AprsError::parse(format!("invalid timestamp \"{raw}\"")))?;

        debug!(%instant, %kind, "decoded timestamp");
        Ok(Some(Self { instant, kind }))
    }

    /// Encode back to the 7-character wire form of [`Timestamp::kind`].
    pub fn encode(&self) -> String {
        match self.kind {
            TimestampKind::Zulu => self.instant.format("%d%H%Mz").to_string(),
            TimestampKind::Local => self.instant.format("%d%H%M/").to_string(),
            TimestampKind::Hms => self.instant.format("%H%M%Sh").to_string(),
        }
    }
}

fn resolve_hms(now: DateTime<Utc>, hour: u32, minute: u32, second: u32) -> Option<DateTime<Utc>> {
    let candidate = now.date_naive().and_hms_opt(hour, minute, second)?;
    let candidate = Utc.from_utc_datetime(&candidate);
    if candidate > now {
        debug!("hms timestamp is in the future, moving back one day");
        Some(candidate - Duration::days(1))
    } else {
        Some(candidate)
    }
}

fn resolve_dhm(now: DateTime<Utc>, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let at = |year: i32, month: u32| {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
    };

    // The day may not exist in the current month (e.g. the 31st seen on the
    // 1st of a 30-day month); the previous month is tried in that case too.
    match at(now.year(), now.month()) {
        Some(candidate) if candidate <= now => Some(candidate),
        _ => {
            debug!("day/hour/minute timestamp is in the future, moving back one month");
            let (year, month) = if now.month() == 1 {
                (now.year() - 1, 12)
            } else {
                (now.year(), now.month() - 1)
            };
            at(year, month)
        }
    }
}

/// Decode a timestamp against the current time.
pub fn decode_timestamp(raw: &str) -> Result<Option<Timestamp>, AprsError> {
    Timestamp::decode(raw)
}

/// Decode a timestamp against an explicit reference time.
pub fn decode_timestamp_at(raw: &str, now: DateTime<Utc>) -> Result<Option<Timestamp>, AprsError> {
    Timestamp::decode_at(raw, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use strum::IntoEnumIterator;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 10, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn zulu_same_month() {
        let ts = decode_timestamp_at("092345z", now()).unwrap().unwrap();
        assert_eq!(ts.kind, TimestampKind::Zulu);
        assert_eq!(ts.instant.day(), 9);
        assert_eq!(ts.instant.hour(), 23);
        assert_eq!(ts.instant.minute(), 45);
        assert_eq!(ts.instant.month(), 10);
    }

    #[test]
    fn zulu_rolls_back_one_month() {
        let ts = decode_timestamp_at("302345z", now()).unwrap().unwrap();
        assert_eq!(
            ts.instant,
            Utc.with_ymd_and_hms(2019, 9, 30, 23, 45, 0).unwrap()
        );
    }

    #[test]
    fn zulu_rolls_back_across_year() {
        let now = Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap();
        let ts = decode_timestamp_at("202345z", now).unwrap().unwrap();
        assert_eq!(
            ts.instant,
            Utc.with_ymd_and_hms(2019, 12, 20, 23, 45, 0).unwrap()
        );
    }

    #[test]
    fn zulu_day_missing_from_current_month() {
        let now = Utc.with_ymd_and_hms(2019, 11, 1, 6, 0, 0).unwrap();
        let ts = decode_timestamp_at("311200z", now).unwrap().unwrap();
        assert_eq!(
            ts.instant,
            Utc.with_ymd_and_hms(2019, 10, 31, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn uppercase_z_is_zulu() {
        let ts = decode_timestamp_at("092345Z", now()).unwrap().unwrap();
        assert_eq!(ts.kind, TimestampKind::Zulu);
    }

    #[test]
    fn local_is_decoded_as_utc() {
        let local = decode_timestamp_at("092345/", now()).unwrap().unwrap();
        let zulu = decode_timestamp_at("092345z", now()).unwrap().unwrap();
        assert_eq!(local.kind, TimestampKind::Local);
        assert_eq!(local.instant, zulu.instant);
    }

    #[test]
    fn unknown_suffix_is_tolerated() {
        let ts = decode_timestamp_at("092345x", now()).unwrap().unwrap();
        assert_eq!(ts.kind, TimestampKind::Zulu);
    }

    #[test]
    fn hms_today_and_yesterday() {
        let ts = decode_timestamp_at("101500h", now()).unwrap().unwrap();
        assert_eq!(
            ts.instant,
            Utc.with_ymd_and_hms(2019, 10, 10, 10, 15, 0).unwrap()
        );

        let ts = decode_timestamp_at("235959h", now()).unwrap().unwrap();
        assert_eq!(
            ts.instant,
            Utc.with_ymd_and_hms(2019, 10, 9, 23, 59, 59).unwrap()
        );
    }

    #[test]
    fn zeros_mean_no_timestamp() {
        assert_eq!(decode_timestamp_at("000000z", now()).unwrap(), None);
        assert_eq!(decode_timestamp_at("000000h", now()).unwrap(), None);
    }

    #[test]
    fn invalid_timestamps() {
        assert!(decode_timestamp_at("2345z", now()).is_err());
        assert!(decode_timestamp_at("09234az", now()).is_err());
        assert!(decode_timestamp_at("322345z", now()).is_err());
        assert!(decode_timestamp_at("092545z", now()).is_err());
        assert!(decode_timestamp_at("246000h", now()).is_err());
    }

    #[test]
    fn encode_each_kind() {
        for raw in ["092345z", "092345/", "101500h"] {
            let ts = decode_timestamp_at(raw, now()).unwrap().unwrap();
            assert_eq!(ts.encode(), raw);
        }
        let ts = decode_timestamp_at("092345Z", now()).unwrap().unwrap();
        assert_eq!(ts.encode(), "092345z");
    }

    #[test]
    fn kind_strum() {
        assert_eq!(TimestampKind::Hms.to_string(), "hms");
        assert_eq!("local".parse::<TimestampKind>().unwrap(), TimestampKind::Local);
        assert_eq!(TimestampKind::iter().count(), 3);
    }

    #[test]
    fn serde_roundtrip() {
        let ts = decode_timestamp_at("092345z", now()).unwrap().unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
