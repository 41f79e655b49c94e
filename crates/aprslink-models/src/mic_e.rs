//! Mic-E position codec.
//!
//! Mic-E splits a position across two fields:
//!
//! * the **destination** callsign carries the latitude digits, the three
//!   message bits, the north/south flag, the longitude offset and the
//!   east/west flag;
//! * the first six **info** bytes carry longitude degrees / minutes /
//!   hundredths and speed / course.
//!
//! Each destination character falls into one of three sets:
//!
//! | Characters | Digit | Set | Message bit | N/S | Offset | E/W |
//! |------------|-------|-----|-------------|-----|--------|-----|
//! | `0`–`9`, `L` | as is / space | 1 | 0 | S | +0 | E |
//! | `A`–`J`, `K` | ord−65 / space | 2 | 1 (custom) | – | – | – |
//! | `P`–`Y`, `Z` | ord−80 / space | 3 | 1 | N | +100 | W |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinates::{
    decode_uncompressed_latitude, decode_uncompressed_longitude, encode_uncompressed_latitude,
    round_to,
};
use crate::error::AprsError;

/// One of the three Mic-E message bits.
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MicEBit {
    /// Bit clear.
    Zero,
    /// Bit set (standard message).
    One,
    /// Bit set (custom message).
    CustomOne,
}

/// The message type selected by the three message bits.
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MicEMessage {
    /// M0.
    OffDuty,
    /// M1.
    EnRoute,
    /// M2.
    InService,
    /// M3.
    Returning,
    /// M4.
    Committed,
    /// M5.
    Special,
    /// M6.
    Priority,
    /// C0.
    Custom0,
    /// C1.
    Custom1,
    /// C2.
    Custom2,
    /// C3.
    Custom3,
    /// C4.
    Custom4,
    /// C5.
    Custom5,
    /// C6.
    Custom6,
    /// All three bits clear.
    Emergency,
    /// Standard and custom bits mixed.
    Unknown,
}

impl MicEMessage {
    /// Resolve the message type from the three bits (A, B, C).
    pub fn from_bits(bits: [MicEBit; 3]) -> Self {
        let standard = bits.iter().any(|b| *b == MicEBit::One);
        let custom = bits.iter().any(|b| *b == MicEBit::CustomOne);
        let index = bits
            .iter()
            .fold(0u8, |acc, b| (acc << 1) | u8::from(*b != MicEBit::Zero));
        match (standard, custom, index) {
            (_, _, 0) => Self::Emergency,
            (true, true, _) => Self::Unknown,
            (true, false, i) => [
                Self::Priority,
                Self::Special,
                Self::Committed,
                Self::Returning,
                Self::InService,
                Self::EnRoute,
                Self::OffDuty,
            ][usize::from(i - 1)],
            (false, _, i) => [
                Self::Custom6,
                Self::Custom5,
                Self::Custom4,
                Self::Custom3,
                Self::Custom2,
                Self::Custom1,
                Self::Custom0,
            ][usize::from(i - 1)],
        }
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Everything the destination callsign carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicEDestination {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Number of blanked latitude digits.
    pub ambiguity: u8,
    /// Message bits A, B, C.
    pub bits: [MicEBit; 3],
    /// Add 100 to the longitude degrees.
    pub longitude_offset: bool,
    /// Longitude is east.
    pub east: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharSet {
    Digit,
    Custom,
    Standard,
}

fn classify(c: u8) -> Result<(u8, CharSet), AprsError> {
    match c {
        b'0'..=b'9' => Ok((c, CharSet::Digit)),
        b'A'..=b'J' => Ok((c - b'A' + b'0', CharSet::Custom)),
        b'P'..=b'Y' => Ok((c - b'P' + b'0', CharSet::Standard)),
        b'K' => Ok((b' ', CharSet::Custom)),
        b'L' => Ok((b' ', CharSet::Digit)),
        b'Z' => Ok((b' ', CharSet::Standard)),
        other => Err(AprsError::parse(format!(
            "invalid Mic-E destination character {:?}",
            char::from(other)
        ))),
    }
}

/// Decode the latitude and flags from a Mic-E destination callsign
/// (without SSID).
///
/// # Examples
///
/// ```
/// use aprslink_models::mic_e::decode_destination;
///
/// let dest = decode_destination("U1PRSS").unwrap();
/// assert_eq!(dest.latitude, 51.038833);
/// assert!(dest.longitude_offset);
/// assert!(!dest.east);
/// ```
pub fn decode_destination(callsign: &str) -> Result<MicEDestination, AprsError> {
    let bytes = callsign.as_bytes();
    if bytes.len() < 6 {
        return Err(AprsError::parse(format!(
            "Mic-E destination \"{callsign}\" must be at least 6 characters"
        )));
    }

    let mut digits = Vec::with_capacity(8);
    let mut bits = [MicEBit::Zero; 3];
    let mut north = false;
    let mut longitude_offset = false;
    let mut east = false;

    for (i, &c) in bytes[..6].iter().enumerate() {
        let (digit, set) = classify(c)?;
        digits.push(digit);
        match i {
            0..=2 => {
                bits[i] = match set {
                    CharSet::Digit => MicEBit::Zero,
                    CharSet::Custom => MicEBit::CustomOne,
                    CharSet::Standard => MicEBit::One,
                };
            }
            3 => {
                north = set != CharSet::Digit;
                digits.push(b'.');
            }
            4 => longitude_offset = set != CharSet::Digit,
            _ => east = set == CharSet::Digit,
        }
    }
    digits.push(if north { b'N' } else { b'S' });

    let latitude_raw = String::from_utf8_lossy(&digits);
    let (latitude, ambiguity) = decode_uncompressed_latitude(&latitude_raw)?;
    debug!(
        latitude,
        ambiguity,
        longitude_offset,
        east,
        ?bits,
        "decoded Mic-E destination"
    );

    Ok(MicEDestination {
        latitude,
        ambiguity,
        bits,
        longitude_offset,
        east,
    })
}

/// Encode latitude, message bits and longitude flags as a 6-character
/// destination callsign.
pub fn encode_destination(
    latitude: f64,
    ambiguity: u8,
    bits: [MicEBit; 3],
    longitude_offset: bool,
    east: bool,
) -> Result<String, AprsError> {
    let lat = encode_uncompressed_latitude(latitude, ambiguity)?;
    let lat = lat.as_bytes();
    let north = lat[7] == b'N';
    let digits = [lat[0], lat[1], lat[2], lat[3], lat[5], lat[6]];

    let encode = |digit: u8, set: CharSet| -> char {
        let (base, space) = match set {
            CharSet::Digit => (b'0', b'L'),
            CharSet::Custom => (b'A', b'K'),
            CharSet::Standard => (b'P', b'Z'),
        };
        char::from(if digit == b' ' {
            space
        } else {
            base + (digit - b'0')
        })
    };
    let flag = |set: bool| if set { CharSet::Standard } else { CharSet::Digit };

    let mut out = String::with_capacity(6);
    for (i, &digit) in digits.iter().enumerate() {
        let set = match i {
            0..=2 => match bits[i] {
                MicEBit::Zero => CharSet::Digit,
                MicEBit::One => CharSet::Standard,
                MicEBit::CustomOne => CharSet::Custom,
            },
            3 => flag(north),
            4 => flag(longitude_offset),
            _ => flag(!east),
        };
        out.push(encode(digit, set));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Info field
// ---------------------------------------------------------------------------

fn info_value(info: &[u8], i: usize, what: &str) -> Result<u16, AprsError> {
    info.get(i)
        .and_then(|b| b.checked_sub(28))
        .map(u16::from)
        .ok_or_else(|| AprsError::parse(format!("invalid or missing Mic-E {what} byte")))
}

/// Decode the longitude from info bytes 0–2.
pub fn decode_longitude(info: &[u8], longitude_offset: bool, east: bool) -> Result<f64, AprsError> {
    let mut degrees = info_value(info, 0, "longitude degrees")?;
    let mut minutes = info_value(info, 1, "longitude minutes")?;
    let hundredths = info_value(info, 2, "longitude hundredths")?;

    if longitude_offset {
        degrees += 100;
    }
    if (180..=189).contains(&degrees) {
        degrees -= 80;
    } else if (190..=199).contains(&degrees) {
        degrees -= 190;
    }
    if minutes >= 60 {
        minutes -= 60;
    }

    let raw = format!(
        "{degrees:03}{minutes:02}.{hundredths:02}{}",
        if east { 'E' } else { 'W' }
    );
    let longitude = decode_uncompressed_longitude(&raw, 0)?;
    debug!(longitude, "decoded Mic-E longitude");
    Ok(longitude)
}

/// Encode a longitude as info bytes 0–2, returning them with the longitude
/// offset flag the destination must carry.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_longitude(longitude: f64) -> Result<(String, bool), AprsError> {
    if longitude.is_nan() || longitude.abs() >= 180.0 {
        return Err(AprsError::encode(format!(
            "Mic-E longitude must be within (-180, 180) ({longitude} given)"
        )));
    }
    let value = longitude.abs();
    let mut degrees = value.floor() as u8;
    let mut total = round_to((value - value.floor()) * 6000.0, 0) as u16;
    if total >= 6000 {
        degrees += 1;
        total = 0;
    }
    if degrees >= 180 {
        return Err(AprsError::encode("Mic-E longitude rounds to 180 degrees"));
    }
    let (minutes, hundredths) = (total / 100, total % 100);

    let (d, offset) = match degrees {
        0..=9 => (degrees + 118, true),
        10..=99 => (degrees + 28, false),
        100..=109 => (degrees + 8, true),
        _ => (degrees - 72, true),
    };
    let m = if minutes < 10 { minutes + 88 } else { minutes + 28 };
    let h = hundredths + 28;

    let bytes = [d, to_byte(m)?, to_byte(h)?];
    Ok((String::from_utf8_lossy(&bytes).into_owned(), offset))
}

fn to_byte(v: u16) -> Result<u8, AprsError> {
    u8::try_from(v).map_err(|e| AprsError::encode(e.to_string()))
}

/// Decode speed (knots) and course (degrees) from info bytes 3–5.
pub fn decode_speed_course(info: &[u8]) -> Result<(u16, u16), AprsError> {
    let sp = info_value(info, 3, "speed")?;
    let dc = info_value(info, 4, "speed/course")?;
    let se = info_value(info, 5, "course")?;

    let mut speed = sp * 10 + dc / 10;
    if speed >= 800 {
        speed -= 800;
    }
    let mut course = (dc % 10) * 100 + se;
    if course >= 400 {
        course -= 400;
    }
    debug!(speed, course, "decoded Mic-E speed and course");
    Ok((speed, course))
}

/// Encode speed (knots) and course (degrees) as info bytes 3–5.
pub fn encode_speed_course(speed: u16, course: u16) -> Result<String, AprsError> {
    if speed >= 800 || course > 360 {
        return Err(AprsError::encode(format!(
            "Mic-E speed must be below 800 knots and course at most 360 ({speed}/{course} given)"
        )));
    }
    let mut sp = speed / 10 + 28;
    if sp < 32 {
        sp += 80;
    }
    let dc = (speed % 10) * 10 + course / 100 + 4 + 28;
    let se = course % 100 + 28;
    let bytes = [to_byte(sp)?, to_byte(dc)?, to_byte(se)?];
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn destination_decode() {
        let dest = decode_destination("U1PRSS").unwrap();
        assert_eq!(dest.latitude, 51.038833);
        assert_eq!(dest.ambiguity, 0);
        assert_eq!(dest.bits, [MicEBit::One, MicEBit::Zero, MicEBit::One]);
        assert!(dest.longitude_offset);
        assert!(!dest.east);
    }

    #[test]
    fn destination_south() {
        let dest = decode_destination("U1P2SS").unwrap();
        assert_eq!(dest.latitude, -51.038833);
    }

    #[test]
    fn destination_ambiguity() {
        for callsign in ["U1PRKK", "U1PRLL", "U1PRZZ"] {
            let dest = decode_destination(callsign).unwrap();
            assert_eq!(dest.latitude, 51.033333, "{callsign}");
            assert_eq!(dest.ambiguity, 2);
        }
    }

    #[test]
    fn destination_custom_bits() {
        let dest = decode_destination("E1ARSS").unwrap();
        assert_eq!(
            dest.bits,
            [MicEBit::CustomOne, MicEBit::Zero, MicEBit::CustomOne]
        );
        assert_eq!(MicEMessage::from_bits(dest.bits), MicEMessage::Custom2);
    }

    #[test]
    fn destination_invalid() {
        assert!(decode_destination("M1PRSS").is_err());
        assert!(decode_destination("U1PRS").is_err());
    }

    #[test]
    fn destination_encode_roundtrip() {
        for callsign in ["U1PRSS", "U1P2SS", "U1PR3S", "U1PRS3", "E1ARSS", "U1PRZZ"] {
            let dest = decode_destination(callsign).unwrap();
            let encoded = encode_destination(
                dest.latitude,
                dest.ambiguity,
                dest.bits,
                dest.longitude_offset,
                dest.east,
            )
            .unwrap();
            assert_eq!(encoded, callsign);
        }
    }

    #[test]
    fn longitude_decode() {
        let info = b"*\\Fl\"Bk/";
        assert_eq!(decode_longitude(info, true, false).unwrap(), -114.073667);
        assert_eq!(decode_longitude(info, false, false).unwrap(), -14.073667);
        assert_eq!(decode_longitude(info, true, true).unwrap(), 114.073667);
        assert_eq!(decode_longitude(b"l\\F", true, false).unwrap(), -100.073667);
        assert_eq!(decode_longitude(b"x\\F", true, false).unwrap(), -2.073667);
    }

    #[test]
    fn longitude_decode_rejects_short_info() {
        assert!(decode_longitude(b"*\\", true, false).is_err());
        assert!(decode_longitude(b"\x10\\F", true, false).is_err());
    }

    #[test]
    fn longitude_encode() {
        assert_eq!(
            encode_longitude(-114.073667).unwrap(),
            ("*\\F".to_string(), true)
        );
        for longitude in [-2.073667, -100.073667, 45.5, 7.25, 105.99, 179.5] {
            let (raw, offset) = encode_longitude(longitude).unwrap();
            let decoded = decode_longitude(raw.as_bytes(), offset, longitude > 0.0).unwrap();
            assert!((decoded - longitude).abs() < 0.0002, "{longitude} -> {decoded}");
        }
        assert!(encode_longitude(180.0).is_err());
    }

    #[test]
    fn speed_course_decode() {
        assert_eq!(decode_speed_course(b"*\\Fl\"Bk/").unwrap(), (0, 238));
    }

    #[test]
    fn speed_course_encode() {
        assert_eq!(encode_speed_course(0, 238).unwrap(), "l\"B");
        for (speed, course) in [(0, 0), (5, 90), (36, 359), (123, 360), (799, 1)] {
            let raw = encode_speed_course(speed, course).unwrap();
            let info = format!("000{raw}");
            assert_eq!(
                decode_speed_course(info.as_bytes()).unwrap(),
                (speed, course)
            );
        }
        assert!(encode_speed_course(800, 0).is_err());
    }

    #[test]
    fn message_types() {
        use MicEBit::{CustomOne as C, One as I, Zero as O};
        assert_eq!(MicEMessage::from_bits([I, I, I]), MicEMessage::OffDuty);
        assert_eq!(MicEMessage::from_bits([I, O, I]), MicEMessage::InService);
        assert_eq!(MicEMessage::from_bits([O, O, I]), MicEMessage::Priority);
        assert_eq!(MicEMessage::from_bits([O, O, O]), MicEMessage::Emergency);
        assert_eq!(MicEMessage::from_bits([C, C, C]), MicEMessage::Custom0);
        assert_eq!(MicEMessage::from_bits([C, O, I]), MicEMessage::Unknown);
        assert_eq!(MicEMessage::iter().count(), 16);
    }
}
