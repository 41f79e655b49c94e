//! Latitude / longitude codecs.
//!
//! APRS carries coordinates in two text forms:
//!
//! * **Uncompressed**: degrees and decimal minutes (`DDMM.HHN`, `DDDMM.HHW`).
//!   Trailing digits may be replaced by spaces to reduce precision
//!   ("ambiguity", levels 0–4).
//! * **Compressed**: four base-91 characters per axis.
//!
//! All decoded values are rounded to 6 decimal places.
//!
//! # Examples
//!
//! ```
//! use aprslink_models::coordinates::*;
//!
//! assert_eq!(decode_uncompressed_latitude("4903.55N").unwrap(), (49.059167, 0));
//! assert_eq!(decode_compressed_latitude("5L!!").unwrap(), 49.5);
//! assert_eq!(decode_compressed_longitude("<*e7").unwrap(), -72.750004);
//! assert_eq!(encode_uncompressed_latitude(51.473821, 1).unwrap(), "5128.4 N");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::AprsError;

/// Highest ambiguity level (everything but the degrees blanked).
pub const MAX_AMBIGUITY: u8 = 4;

static UNCOMPRESSED_LATITUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}[\d ]{2}\.[\d ]{2}[NS]$").expect("latitude regex is valid"));

static UNCOMPRESSED_LONGITUDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[01]\d{2}[\d ]{2}\.[\d ]{2}[EW]$").expect("longitude regex is valid")
});

/// Character offsets blanked for each ambiguity level, right to left,
/// within `DDMM.HH` (latitude) and `DDDMM.HH` (longitude).
const LATITUDE_AMBIGUITY_POSITIONS: [usize; 4] = [6, 5, 3, 2];
const LONGITUDE_AMBIGUITY_POSITIONS: [usize; 4] = [7, 6, 4, 3];

/// Round to the 6 decimal places every decoded coordinate carries.
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Uncompressed
// ---------------------------------------------------------------------------

/// Decode an 8-character uncompressed latitude (`DDMM.HHN`).
///
/// Returns the latitude and the ambiguity level, which is the number of
/// digits replaced by spaces.
pub fn decode_uncompressed_latitude(s: &str) -> Result<(f64, u8), AprsError> {
    if !UNCOMPRESSED_LATITUDE_RE.is_match(s) {
        return Err(AprsError::parse(format!("invalid latitude \"{s}\"")));
    }

    let ambiguity = u8::try_from(s.bytes().filter(|&b| b == b' ').count())
        .map_err(|_| AprsError::parse(format!("invalid latitude \"{s}\"")))?;
    let digits = s.replace(' ', "0");

    let degrees: f64 = parse_number(&digits[0..2], s)?;
    let minutes: f64 = parse_number(&digits[2..7], s)?;
    if degrees > 90.0 {
        return Err(AprsError::parse(format!(
            "latitude degrees out of range in \"{s}\""
        )));
    }

    let mut latitude = round6(degrees + minutes / 60.0);
    if latitude > 90.0 {
        return Err(AprsError::parse(format!("latitude out of range in \"{s}\"")));
    }
    if s.ends_with('S') {
        latitude = -latitude;
    }

    debug!(latitude, ambiguity, "decoded uncompressed latitude");
    Ok((latitude, ambiguity))
}

/// Decode a 9-character uncompressed longitude (`DDDMM.HHW`).
///
/// Longitude cannot express ambiguity on its own, so the level decoded from
/// the paired latitude is applied here by zeroing the same digits.
pub fn decode_uncompressed_longitude(s: &str, ambiguity: u8) -> Result<f64, AprsError> {
    if ambiguity > MAX_AMBIGUITY {
        return Err(AprsError::parse(format!(
            "ambiguity {ambiguity} is greater than {MAX_AMBIGUITY}"
        )));
    }
    if !UNCOMPRESSED_LONGITUDE_RE.is_match(s) {
        return Err(AprsError::parse(format!("invalid longitude \"{s}\"")));
    }

    let mut digits: Vec<u8> = s.as_bytes()[..8]
        .iter()
        .map(|&b| if b == b' ' { b'0' } else { b })
        .collect();
    for &pos in &LONGITUDE_AMBIGUITY_POSITIONS[..usize::from(ambiguity)] {
        digits[pos] = b'0';
    }
    let digits = String::from_utf8_lossy(&digits);

    let degrees: f64 = parse_number(&digits[0..3], s)?;
    let minutes: f64 = parse_number(&digits[3..8], s)?;
    if degrees > 180.0 {
        return Err(AprsError::parse(format!(
            "longitude degrees out of range in \"{s}\""
        )));
    }

    let mut longitude = round6(degrees + minutes / 60.0);
    if longitude > 180.0 {
        return Err(AprsError::parse(format!(
            "longitude out of range in \"{s}\""
        )));
    }
    if s.ends_with('W') {
        longitude = -longitude;
    }

    debug!(longitude, ambiguity, "decoded uncompressed longitude");
    Ok(longitude)
}

fn parse_number(digits: &str, original: &str) -> Result<f64, AprsError> {
    digits
        .parse()
        .map_err(|_| AprsError::parse(format!("invalid coordinate \"{original}\"")))
}

/// Encode a latitude as `DDMM.HHN`, blanking digits per `ambiguity`.
pub fn encode_uncompressed_latitude(latitude: f64, ambiguity: u8) -> Result<String, AprsError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AprsError::encode(format!(
            "latitude must be between -90 and 90 ({latitude} given)"
        )));
    }
    let direction = if latitude < 0.0 { 'S' } else { 'N' };
    let body = encode_degrees_minutes(latitude.abs(), 2, ambiguity, &LATITUDE_AMBIGUITY_POSITIONS)?;
    Ok(format!("{body}{direction}"))
}

/// Encode a longitude as `DDDMM.HHW`, blanking digits per `ambiguity`.
pub fn encode_uncompressed_longitude(longitude: f64, ambiguity: u8) -> Result<String, AprsError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AprsError::encode(format!(
            "longitude must be between -180 and 180 ({longitude} given)"
        )));
    }
    let direction = if longitude < 0.0 { 'W' } else { 'E' };
    let body =
        encode_degrees_minutes(longitude.abs(), 3, ambiguity, &LONGITUDE_AMBIGUITY_POSITIONS)?;
    Ok(format!("{body}{direction}"))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_degrees_minutes(
    value: f64,
    width: usize,
    ambiguity: u8,
    positions: &[usize; 4],
) -> Result<String, AprsError> {
    if ambiguity > MAX_AMBIGUITY {
        return Err(AprsError::encode(format!(
            "ambiguity must be between 0 and {MAX_AMBIGUITY} ({ambiguity} given)"
        )));
    }

    let mut degrees = value.floor() as u32;
    let mut minutes = round_to((value - value.floor()) * 60.0, 2);
    if minutes >= 60.0 {
        degrees += 1;
        minutes = 0.0;
    }

    let mut out: Vec<u8> = format!("{degrees:0width$}{minutes:05.2}").into_bytes();
    for &pos in &positions[..usize::from(ambiguity)] {
        out[pos] = b' ';
    }
    String::from_utf8(out).map_err(|e| AprsError::encode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Base-91
// ---------------------------------------------------------------------------

/// Decode a base-91 string (each character's ordinal minus 33 is one digit,
/// most significant first).
pub fn decode_base91(s: &str) -> Result<u32, AprsError> {
    s.bytes().try_fold(0u32, |acc, b| {
        if !(b'!'..=b'{').contains(&b) {
            return Err(AprsError::parse(format!(
                "invalid base-91 character {:?} in \"{s}\"",
                char::from(b)
            )));
        }
        acc.checked_mul(91)
            .and_then(|acc| acc.checked_add(u32::from(b - 33)))
            .ok_or_else(|| AprsError::parse(format!("base-91 value \"{s}\" overflows")))
    })
}

/// Encode `value` as `width` base-91 characters.
pub fn encode_base91(mut value: u32, width: usize) -> Result<String, AprsError> {
    let mut out = vec![b'!'; width];
    for slot in out.iter_mut().rev() {
        // value % 91 is always < 91, so the digit fits in a byte.
        let digit = u8::try_from(value % 91).unwrap_or(0);
        *slot = digit + 33;
        value /= 91;
    }
    if value != 0 {
        return Err(AprsError::encode(format!(
            "value does not fit in {width} base-91 characters"
        )));
    }
    String::from_utf8(out).map_err(|e| AprsError::encode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Compressed
// ---------------------------------------------------------------------------

const LATITUDE_SCALE: f64 = 380_926.0;
const LONGITUDE_SCALE: f64 = 190_463.0;

/// Decode a 4-character compressed latitude.
pub fn decode_compressed_latitude(s: &str) -> Result<f64, AprsError> {
    if s.len() != 4 {
        return Err(AprsError::parse(format!(
            "compressed latitude \"{s}\" must be 4 characters"
        )));
    }
    let latitude = round6(90.0 - f64::from(decode_base91(s)?) / LATITUDE_SCALE);
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AprsError::parse(format!(
            "compressed latitude \"{s}\" is out of range ({latitude})"
        )));
    }
    Ok(latitude)
}

/// Decode a 4-character compressed longitude.
pub fn decode_compressed_longitude(s: &str) -> Result<f64, AprsError> {
    if s.len() != 4 {
        return Err(AprsError::parse(format!(
            "compressed longitude \"{s}\" must be 4 characters"
        )));
    }
    let longitude = round6(-180.0 + f64::from(decode_base91(s)?) / LONGITUDE_SCALE);
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AprsError::parse(format!(
            "compressed longitude \"{s}\" is out of range ({longitude})"
        )));
    }
    Ok(longitude)
}

/// Encode a latitude as 4 base-91 characters.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_compressed_latitude(latitude: f64) -> Result<String, AprsError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AprsError::encode(format!(
            "latitude must be between -90 and 90 ({latitude} given)"
        )));
    }
    encode_base91(((90.0 - latitude) * LATITUDE_SCALE).round() as u32, 4)
}

/// Encode a longitude as 4 base-91 characters.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_compressed_longitude(longitude: f64) -> Result<String, AprsError> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AprsError::encode(format!(
            "longitude must be between -180 and 180 ({longitude} given)"
        )));
    }
    encode_base91(((180.0 + longitude) * LONGITUDE_SCALE).round() as u32, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_latitude() {
        assert_eq!(decode_uncompressed_latitude("4903.55N").unwrap(), (49.059167, 0));
        assert_eq!(decode_uncompressed_latitude("4903.55S").unwrap(), (-49.059167, 0));
        assert_eq!(decode_uncompressed_latitude("5030.50N").unwrap(), (50.508333, 0));
    }

    #[test]
    fn decode_latitude_ambiguity() {
        assert_eq!(decode_uncompressed_latitude("4903.5 N").unwrap(), (49.058333, 1));
        assert_eq!(decode_uncompressed_latitude("4903.  N").unwrap(), (49.05, 2));
        assert_eq!(decode_uncompressed_latitude("490 .  N").unwrap(), (49.0, 3));
        assert_eq!(decode_uncompressed_latitude("49  .  N").unwrap(), (49.0, 4));
    }

    #[test]
    fn decode_latitude_rejects_invalid() {
        assert!(decode_uncompressed_latitude("9103.55N").is_err());
        assert!(decode_uncompressed_latitude("4903.55E").is_err());
        assert!(decode_uncompressed_latitude("4903,55N").is_err());
        assert!(decode_uncompressed_latitude("4903.55").is_err());
        assert!(decode_uncompressed_latitude("9030.00N").is_err());
    }

    #[test]
    fn decode_longitude() {
        assert_eq!(decode_uncompressed_longitude("07201.75W", 0).unwrap(), -72.029167);
        assert_eq!(decode_uncompressed_longitude("07201.75E", 0).unwrap(), 72.029167);
        assert_eq!(decode_uncompressed_longitude("10020.30W", 0).unwrap(), -100.338333);
    }

    #[test]
    fn decode_longitude_applies_latitude_ambiguity() {
        assert_eq!(decode_uncompressed_longitude("07211.75W", 1).unwrap(), -72.195);
        assert_eq!(decode_uncompressed_longitude("07211.75W", 2).unwrap(), -72.183333);
        assert_eq!(decode_uncompressed_longitude("07211.75W", 3).unwrap(), -72.166667);
        assert_eq!(decode_uncompressed_longitude("07211.75W", 4).unwrap(), -72.0);
    }

    #[test]
    fn decode_longitude_rejects_invalid() {
        assert!(decode_uncompressed_longitude("18101.75W", 0).is_err());
        assert!(decode_uncompressed_longitude("07201.75N", 0).is_err());
        assert!(decode_uncompressed_longitude("27201.75W", 0).is_err());
        assert!(decode_uncompressed_longitude("07211.75W", 5).is_err());
    }

    #[test]
    fn encode_latitude_levels() {
        assert_eq!(encode_uncompressed_latitude(51.473821, 0).unwrap(), "5128.43N");
        assert_eq!(encode_uncompressed_latitude(51.473821, 1).unwrap(), "5128.4 N");
        assert_eq!(encode_uncompressed_latitude(51.473821, 2).unwrap(), "5128.  N");
        assert_eq!(encode_uncompressed_latitude(51.473821, 3).unwrap(), "512 .  N");
        assert_eq!(encode_uncompressed_latitude(51.473821, 4).unwrap(), "51  .  N");
        assert_eq!(encode_uncompressed_latitude(-1.5, 0).unwrap(), "0130.00S");
    }

    #[test]
    fn encode_longitude_levels() {
        assert_eq!(encode_uncompressed_longitude(-114.434325, 0).unwrap(), "11426.06W");
        assert_eq!(encode_uncompressed_longitude(-114.434325, 1).unwrap(), "11426.0 W");
        assert_eq!(encode_uncompressed_longitude(-114.434325, 2).unwrap(), "11426.  W");
        assert_eq!(encode_uncompressed_longitude(-114.434325, 3).unwrap(), "1142 .  W");
        assert_eq!(encode_uncompressed_longitude(-114.434325, 4).unwrap(), "114  .  W");
        assert_eq!(encode_uncompressed_longitude(7.5, 0).unwrap(), "00730.00E");
    }

    #[test]
    fn encode_carries_rounded_minutes() {
        assert_eq!(encode_uncompressed_latitude(10.999999, 0).unwrap(), "1100.00N");
    }

    #[test]
    fn encode_rejects_out_of_range() {
        assert!(encode_uncompressed_latitude(90.1, 0).is_err());
        assert!(encode_uncompressed_latitude(45.0, 5).is_err());
        assert!(encode_uncompressed_longitude(-180.5, 0).is_err());
        assert!(encode_compressed_latitude(-91.0).is_err());
        assert!(encode_compressed_longitude(181.0).is_err());
    }

    #[test]
    fn uncompressed_roundtrip_by_ambiguity() {
        let lat = 49.059167;
        for ambiguity in 0..=MAX_AMBIGUITY {
            let encoded = encode_uncompressed_latitude(lat, ambiguity).unwrap();
            let (decoded, level) = decode_uncompressed_latitude(&encoded).unwrap();
            assert_eq!(level, ambiguity);
            assert!((decoded - lat).abs() < 0.2, "{encoded} -> {decoded}");
        }
    }

    #[test]
    fn decode_compressed() {
        assert_eq!(decode_compressed_latitude("5L!!").unwrap(), 49.5);
        assert_eq!(decode_compressed_longitude("<*e7").unwrap(), -72.750004);
    }

    #[test]
    fn decode_compressed_rejects_invalid() {
        assert!(decode_compressed_latitude("5L!").is_err());
        assert!(decode_compressed_latitude("5L! ").is_err());
        assert!(decode_compressed_latitude("{{{{").is_err());
        assert!(decode_compressed_longitude("{{{{").is_err());
    }

    #[test]
    fn encode_compressed() {
        assert_eq!(encode_compressed_latitude(49.5).unwrap(), "5L!!");
        assert_eq!(
            decode_compressed_longitude(&encode_compressed_longitude(-72.75).unwrap()).unwrap(),
            -72.749999
        );
    }

    #[test]
    fn base91_helpers() {
        assert_eq!(decode_base91("\"?l").unwrap(), 11086);
        assert_eq!(encode_base91(11086, 3).unwrap(), "\"?l");
        assert!(encode_base91(91 * 91, 2).is_err());
        assert!(decode_base91("a b").is_err());
    }
}
