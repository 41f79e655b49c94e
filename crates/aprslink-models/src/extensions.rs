//! Position extension codecs.
//!
//! | Code | Meaning |
//! |------|---------|
//! | [`Phg`] | Power, antenna height / gain / directivity |
//! | [`Dfs`] | DF signal strength, antenna height / gain / directivity |
//! | [`Nrq`] | DF hit rate, range and bearing quality |
//! | [`CompressionType`] | The status byte of a compressed position |
//! | [`DataExtension`] | The 7-byte extension that may follow an uncompressed position |
//!
//! Altitude can also appear anywhere in a comment as `/A=nnnnnn`; see
//! [`extract_altitude`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AprsError;

static ALTITUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/A=(\d{6})").expect("altitude regex is valid"));

static COURSE_SPEED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3})/(\d{3})").expect("course/speed regex is valid"));

fn digit(c: u8, field: &str, raw: &str) -> Result<u8, AprsError> {
    if c.is_ascii_digit() {
        Ok(c - b'0')
    } else {
        Err(AprsError::parse(format!(
            "invalid {field} digit {:?} in \"{raw}\"",
            char::from(c)
        )))
    }
}

fn four_bytes<'a>(raw: &'a str, code: &str) -> Result<&'a [u8], AprsError> {
    let bytes = raw.as_bytes();
    if bytes.len() == 4 {
        Ok(bytes)
    } else {
        Err(AprsError::parse(format!(
            "{code} value \"{raw}\" must be 4 characters"
        )))
    }
}

// ---------------------------------------------------------------------------
// Directivity
// ---------------------------------------------------------------------------

/// Antenna directivity.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Directivity {
    /// Omni-directional antenna.
    Omni,
    /// Directional antenna pointing at the given bearing.
    Degrees(u16),
}

impl Directivity {
    fn decode(d: u8) -> Self {
        match d {
            0 => Self::Omni,
            d => Self::Degrees(u16::from(d) * 45),
        }
    }

    fn encode(self) -> Result<u8, AprsError> {
        match self {
            Self::Omni => Ok(0),
            Self::Degrees(deg) if deg % 45 == 0 && (45..=405).contains(&deg) => {
                u8::try_from(deg / 45).map_err(|e| AprsError::encode(e.to_string()))
            }
            Self::Degrees(deg) => Err(AprsError::encode(format!(
                "directivity must be a multiple of 45 degrees ({deg} given)"
            ))),
        }
    }
}

fn decode_height(h: u8, raw: &str) -> Result<u128, AprsError> {
    if h < b'0' || !h.is_ascii() {
        return Err(AprsError::parse(format!("invalid height code in \"{raw}\"")));
    }
    1u128.checked_shl(u32::from(h - b'0'))
        .and_then(|v| v.checked_mul(10))
        .ok_or_else(|| AprsError::parse(format!("height code out of range in \"{raw}\"")))
}

fn encode_height(height: u128) -> Result<char, AprsError> {
    let invalid = || {
        AprsError::encode(format!(
            "height must be 10 times a power of 2 ({height} given)"
        ))
    };
    if height % 10 != 0 || !(height / 10).is_power_of_two() {
        return Err(invalid());
    }
    let exponent = u8::try_from((height / 10).trailing_zeros()).map_err(|_| invalid())?;
    // '0' + exponent must remain printable ASCII.
    if exponent > b'~' - b'0' {
        return Err(invalid());
    }
    Ok(char::from(b'0' + exponent))
}

fn encode_gain(gain: u8) -> Result<u8, AprsError> {
    if gain <= 9 {
        Ok(gain)
    } else {
        Err(AprsError::encode(format!(
            "gain must be between 0 and 9 dB ({gain} given)"
        )))
    }
}

// ---------------------------------------------------------------------------
// PHG
// ---------------------------------------------------------------------------

/// Power / height / gain / directivity (`PHGphgd`).
///
/// # Examples
///
/// ```
/// use aprslink_models::{Directivity, Phg};
///
/// let phg = Phg::decode("5132").unwrap();
/// assert_eq!(phg, Phg { power: 25, height: 20, gain: 3, directivity: Directivity::Degrees(90) });
/// assert_eq!(phg.encode().unwrap(), "5132");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phg {
    /// Transmit power in watts.
    pub power: u16,
    /// Antenna height above average terrain in feet.
    pub height: u128,
    /// Antenna gain in dB.
    pub gain: u8,
    /// Antenna directivity.
    pub directivity: Directivity,
}

impl Phg {
    /// Decode the 4 characters following `PHG`.
    pub fn decode(raw: &str) -> Result<Self, AprsError> {
        let b = four_bytes(raw, "PHG")?;
        let p = digit(b[0], "power", raw)?;
        let phg = Self {
            power: u16::from(p) * u16::from(p),
            height: decode_height(b[1], raw)?,
            gain: digit(b[2], "gain", raw)?,
            directivity: Directivity::decode(digit(b[3], "directivity", raw)?),
        };
        debug!(?phg, "decoded PHG");
        Ok(phg)
    }

    /// Encode back to the 4 characters following `PHG`.
    pub fn encode(&self) -> Result<String, AprsError> {
        let root = (0u16..=9)
            .find(|p| p * p == self.power)
            .ok_or_else(|| {
                AprsError::encode(format!(
                    "power must be a square between 0 and 81 watts ({} given)",
                    self.power
                ))
            })?;
        Ok(format!(
            "{root}{}{}{}",
            encode_height(self.height)?,
            encode_gain(self.gain)?,
            self.directivity.encode()?
        ))
    }
}

// ---------------------------------------------------------------------------
// DFS
// ---------------------------------------------------------------------------

/// DF signal strength / height / gain / directivity (`DFSshgd`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dfs {
    /// Received signal strength in S-points (0–9).
    pub strength: u8,
    /// Antenna height above average terrain in feet.
    pub height: u128,
    /// Antenna gain in dB.
    pub gain: u8,
    /// Antenna directivity.
    pub directivity: Directivity,
}

impl Dfs {
    /// Decode the 4 characters following `DFS`.
    pub fn decode(raw: &str) -> Result<Self, AprsError> {
        let b = four_bytes(raw, "DFS")?;
        let dfs = Self {
            strength: digit(b[0], "strength", raw)?,
            height: decode_height(b[1], raw)?,
            gain: digit(b[2], "gain", raw)?,
            directivity: Directivity::decode(digit(b[3], "directivity", raw)?),
        };
        debug!(?dfs, "decoded DFS");
        Ok(dfs)
    }

    /// Encode back to the 4 characters following `DFS`.
    pub fn encode(&self) -> Result<String, AprsError> {
        if self.strength > 9 {
            return Err(AprsError::encode(format!(
                "strength must be between 0 and 9 ({} given)",
                self.strength
            )));
        }
        Ok(format!(
            "{}{}{}{}",
            self.strength,
            encode_height(self.height)?,
            encode_gain(self.gain)?,
            self.directivity.encode()?
        ))
    }
}

// ---------------------------------------------------------------------------
// NRQ
// ---------------------------------------------------------------------------

/// The `N` of an NRQ triple.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DfNumber {
    /// Hits per period as a percentage.
    Percent(f64),
    /// The report was entered manually.
    Manual,
}

/// DF number / range / quality.
///
/// An `N` of `0` marks the whole triple as meaningless, in which case every
/// field is `None`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Nrq {
    /// Hit rate, or manual report.
    pub number: Option<DfNumber>,
    /// Range in miles.
    pub range: Option<u16>,
    /// Bearing accuracy in degrees.
    pub quality: Option<u16>,
}

impl Nrq {
    /// Decode a 3-digit NRQ value.
    pub fn decode(raw: &str) -> Result<Self, AprsError> {
        let b = raw.as_bytes();
        if b.len() != 3 {
            return Err(AprsError::parse(format!(
                "NRQ value \"{raw}\" must be 3 digits"
            )));
        }
        let n = digit(b[0], "NRQ number", raw)?;
        let r = digit(b[1], "NRQ range", raw)?;
        let q = digit(b[2], "NRQ quality", raw)?;

        if n == 0 {
            return Ok(Self::default());
        }
        let number = match n {
            9 => DfNumber::Manual,
            n => DfNumber::Percent(12.5 * f64::from(n)),
        };
        let quality = match q {
            0 => None,
            1 => Some(240),
            2 => Some(120),
            q => Some(1u16 << (9 - q)),
        };
        Ok(Self {
            number: Some(number),
            range: Some(1u16 << r),
            quality,
        })
    }

    /// Encode back to 3 digits.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode(&self) -> Result<String, AprsError> {
        let Some(number) = self.number else {
            return Ok("000".to_string());
        };
        let n = match number {
            DfNumber::Manual => 9,
            DfNumber::Percent(p) => {
                let n = p / 12.5;
                if n.fract() != 0.0 || !(1.0..=8.0).contains(&n) {
                    return Err(AprsError::encode(format!(
                        "DF hit percentage must be a multiple of 12.5 up to 100 ({p} given)"
                    )));
                }
                n as u8
            }
        };
        let r = match self.range {
            Some(range) if range.is_power_of_two() && range <= 512 => range.trailing_zeros(),
            other => {
                return Err(AprsError::encode(format!(
                    "DF range must be a power of 2 up to 512 miles ({other:?} given)"
                )))
            }
        };
        let q = match self.quality {
            None => 0,
            Some(240) => 1,
            Some(120) => 2,
            Some(quality) if quality.is_power_of_two() && quality <= 64 => {
                9 - quality.trailing_zeros()
            }
            Some(quality) => {
                return Err(AprsError::encode(format!(
                    "invalid DF quality {quality} degrees"
                )))
            }
        };
        Ok(format!("{n}{r}{q}"))
    }
}

// ---------------------------------------------------------------------------
// Compression type
// ---------------------------------------------------------------------------

/// GPS fix state (bit 5 of the compression byte).
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
pub enum CompressionFix {
    /// Last known fix.
    Old,
    /// Current fix.
    Current,
}

/// NMEA sentence the position came from (bits 4–3).
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
pub enum CompressionSource {
    /// Other source.
    Other,
    /// `$GPGLL`.
    Gll,
    /// `$GPGGA`; the cs bytes then carry altitude.
    Gga,
    /// `$GPRMC`.
    Rmc,
}

/// What generated the compressed position (bits 2–0).
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
pub enum CompressionOrigin {
    /// Compressed.
    Compressed,
    /// TNC BText.
    TncBText,
    /// Software (DOS/Mac/Win/+SA).
    Software,
    /// Reserved.
    Tbd,
    /// KPC3.
    Kpc3,
    /// Pico.
    Pico,
    /// Other tracker.
    Other,
    /// Digipeater conversion.
    Digipeater,
}

/// The compression type byte of a compressed position.
///
/// # Examples
///
/// ```
/// use aprslink_models::{CompressionFix, CompressionOrigin, CompressionSource, CompressionType};
///
/// let t = CompressionType::decode('[').unwrap();
/// assert_eq!(t.fix, CompressionFix::Current);
/// assert_eq!(t.source, CompressionSource::Rmc);
/// assert_eq!(t.origin, CompressionOrigin::Software);
/// assert_eq!(t.encode(), '[');
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionType {
    /// GPS fix state.
    pub fix: CompressionFix,
    /// NMEA source.
    pub source: CompressionSource,
    /// Origin.
    pub origin: CompressionOrigin,
}

impl CompressionType {
    /// Decode the 8-bit field (ordinal already reduced by 33).
    pub fn from_bits(bits: u8) -> Self {
        let fix = if bits & 0b10_0000 == 0 {
            CompressionFix::Old
        } else {
            CompressionFix::Current
        };
        let source = match (bits >> 3) & 0b11 {
            0 => CompressionSource::Other,
            1 => CompressionSource::Gll,
            2 => CompressionSource::Gga,
            _ => CompressionSource::Rmc,
        };
        let origin = match bits & 0b111 {
            0 => CompressionOrigin::Compressed,
            1 => CompressionOrigin::TncBText,
            2 => CompressionOrigin::Software,
            3 => CompressionOrigin::Tbd,
            4 => CompressionOrigin::Kpc3,
            5 => CompressionOrigin::Pico,
            6 => CompressionOrigin::Other,
            _ => CompressionOrigin::Digipeater,
        };
        Self {
            fix,
            source,
            origin,
        }
    }

    /// Encode to the 8-bit field by OR-ing the three flag groups.
    pub fn to_bits(self) -> u8 {
        let fix = match self.fix {
            CompressionFix::Old => 0,
            CompressionFix::Current => 0b10_0000,
        };
        let source = match self.source {
            CompressionSource::Other => 0,
            CompressionSource::Gll => 0b0_1000,
            CompressionSource::Gga => 0b1_0000,
            CompressionSource::Rmc => 0b1_1000,
        };
        fix | source | self.origin as u8
    }

    /// Decode the wire character.
    pub fn decode(c: char) -> Result<Self, AprsError> {
        let byte = u8::try_from(c)
            .ok()
            .filter(|b| (b'!'..=b'`').contains(b))
            .ok_or_else(|| AprsError::parse(format!("invalid compression type {c:?}")))?;
        Ok(Self::from_bits(byte - 33))
    }

    /// Encode to the wire character.
    pub fn encode(self) -> char {
        char::from(self.to_bits() + 33)
    }
}

impl Default for CompressionType {
    fn default() -> Self {
        Self {
            fix: CompressionFix::Current,
            source: CompressionSource::Other,
            origin: CompressionOrigin::Software,
        }
    }
}

// ---------------------------------------------------------------------------
// Data extension
// ---------------------------------------------------------------------------

/// The fixed-width extension that may follow an uncompressed position, or
/// the DF bearing / NRQ carried by a DF report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DataExtension {
    /// `PHGphgd`.
    Phg(Phg),
    /// `RNGrrrr`, the omni-directional radio range in miles.
    Range(u16),
    /// `DFSshgd`.
    Dfs(Dfs),
    /// `/BRG/NRQ` following the course/speed of a DF report.
    DirectionFinding {
        /// Bearing in degrees.
        bearing: u16,
        /// Number / range / quality.
        nrq: Nrq,
    },
}

impl fmt::Display for DataExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl DataExtension {
    /// Encode to wire text.
    pub fn encode(&self) -> Result<String, AprsError> {
        Ok(match self {
            Self::Phg(phg) => format!("PHG{}", phg.encode()?),
            Self::Range(miles) if *miles <= 9999 => format!("RNG{miles:04}"),
            Self::Range(miles) => {
                return Err(AprsError::encode(format!(
                    "radio range must be at most 9999 miles ({miles} given)"
                )))
            }
            Self::Dfs(dfs) => format!("DFS{}", dfs.encode()?),
            Self::DirectionFinding { bearing, nrq } => {
                if *bearing > 360 {
                    return Err(AprsError::encode(format!(
                        "DF bearing must be between 0 and 360 ({bearing} given)"
                    )));
                }
                format!("/{bearing:03}/{}", nrq.encode()?)
            }
        })
    }
}

/// What [`decode_data_extension`] found at the start of a comment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedExtension {
    /// PHG / RNG / DFS.
    Extension(DataExtension),
    /// `ddd/ddd` course and speed (knots).
    CourseSpeed {
        /// Course in degrees.
        course: u16,
        /// Speed in knots.
        speed: u16,
    },
}

/// Look for a 7-byte data extension at the start of `data`.
///
/// Checked in order: `PHG`, `RNG`, `DFS`, then `ddd/ddd`. Returns the
/// extension (if any) and the remaining text.
pub fn decode_data_extension(data: &str) -> Result<(Option<ParsedExtension>, &str), AprsError> {
    let four_digits = |prefix: &str| {
        data.strip_prefix(prefix)
            .and_then(|rest| rest.get(..4))
            .filter(|v| v.bytes().all(|b| b.is_ascii_digit()))
    };

    if let Some(v) = four_digits("PHG") {
        let ext = DataExtension::Phg(Phg::decode(v)?);
        return Ok((Some(ParsedExtension::Extension(ext)), &data[7..]));
    }
    if let Some(v) = four_digits("RNG") {
        let miles = v
            .parse()
            .map_err(|_| AprsError::parse(format!("invalid radio range \"{v}\"")))?;
        debug!(miles, "decoded radio range");
        return Ok((
            Some(ParsedExtension::Extension(DataExtension::Range(miles))),
            &data[7..],
        ));
    }
    if let Some(v) = four_digits("DFS") {
        let ext = DataExtension::Dfs(Dfs::decode(v)?);
        return Ok((Some(ParsedExtension::Extension(ext)), &data[7..]));
    }
    if let Some(caps) = COURSE_SPEED_RE.captures(data) {
        let course = caps[1]
            .parse()
            .map_err(|_| AprsError::parse(format!("invalid course \"{}\"", &caps[1])))?;
        let speed = caps[2]
            .parse()
            .map_err(|_| AprsError::parse(format!("invalid speed \"{}\"", &caps[2])))?;
        debug!(course, speed, "decoded course and speed");
        return Ok((
            Some(ParsedExtension::CourseSpeed { course, speed }),
            &data[7..],
        ));
    }
    Ok((None, data))
}

// ---------------------------------------------------------------------------
// Altitude in comment
// ---------------------------------------------------------------------------

/// Find `/A=nnnnnn` (feet) anywhere in `comment`.
///
/// Returns the altitude and the comment with only the matched text removed.
///
/// # Examples
///
/// ```
/// use aprslink_models::extract_altitude;
///
/// assert_eq!(
///     extract_altitude("/A=005000Test packet"),
///     (Some(5000), "Test packet".to_string())
/// );
/// assert_eq!(extract_altitude("no altitude"), (None, "no altitude".to_string()));
/// ```
pub fn extract_altitude(comment: &str) -> (Option<u32>, String) {
    let Some(caps) = ALTITUDE_RE.captures(comment) else {
        return (None, comment.to_string());
    };
    let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
        return (None, comment.to_string());
    };
    let Ok(altitude) = digits.as_str().parse() else {
        return (None, comment.to_string());
    };
    debug!(altitude, "found altitude in comment");
    let mut stripped = String::with_capacity(comment.len());
    stripped.push_str(&comment[..whole.start()]);
    stripped.push_str(&comment[whole.end()..]);
    (Some(altitude), stripped)
}

/// Render an altitude in feet as `/A=nnnnnn`.
pub fn encode_altitude(feet: f64) -> Result<String, AprsError> {
    if !(0.0..=999_999.0).contains(&feet) {
        return Err(AprsError::encode(format!(
            "altitude must be between 0 and 999999 feet ({feet} given)"
        )));
    }
    Ok(format!("/A={feet:06.0}"))
}
