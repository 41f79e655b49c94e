//! The Mic-E payload.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coordinates::{decode_base91, encode_base91};
use crate::error::AprsError;
use crate::mic_e::{
    decode_destination, decode_longitude, decode_speed_course, encode_destination,
    encode_longitude, encode_speed_course, MicEBit, MicEMessage,
};
use crate::position::{Position, PositionFormat};
use crate::station::Station;

const ALTITUDE_OFFSET: f64 = 10_000.0;

/// A Mic-E position report (`` ` `` current, `'` old).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MicE {
    /// Position, with altitude in metres.
    pub position: Position,
    /// `true` for current GPS data (`` ` ``), `false` for old data (`'`).
    pub current: bool,
    /// Message bits A, B and C from the destination.
    pub bits: [MicEBit; 3],
    /// Manufacturer / type byte following the symbol.
    pub type_code: Option<char>,
    /// Status text after the altitude.
    pub comment: String,
}

impl MicE {
    /// Decode a Mic-E report from the destination callsign (without SSID)
    /// and the info field.
    pub fn decode(destination: &str, data_type_id: char, info: &str) -> Result<Self, AprsError> {
        let dest = decode_destination(destination)?;
        let bytes = info.as_bytes();
        if bytes.len() < 8 || !bytes[..8].is_ascii() {
            return Err(AprsError::parse("Mic-E info field must be at least 8 characters"));
        }

        let longitude = decode_longitude(bytes, dest.longitude_offset, dest.east)?;
        let (speed, course) = decode_speed_course(bytes)?;
        let mut position = Position {
            course: Some(course),
            speed: Some(f64::from(speed)),
            format: PositionFormat::Uncompressed {
                ambiguity: dest.ambiguity,
            },
            ..Position::uncompressed(
                dest.latitude,
                longitude,
                char::from(bytes[7]),
                char::from(bytes[6]),
            )
        };

        let mut rest = info[8..].chars();
        let type_code = rest.next();
        if matches!(type_code, Some(',' | '\u{1d}')) {
            return Err(AprsError::unsupported("Mic-E telemetry is not decoded"));
        }

        let status = rest.as_str();
        let comment = match status.as_bytes() {
            [a, b, c, b'}', ..] if [a, b, c].iter().all(|x| x.is_ascii()) => {
                let altitude = f64::from(decode_base91(&status[..3])?) - ALTITUDE_OFFSET;
                debug!(altitude, "decoded Mic-E altitude");
                position.altitude = Some(altitude);
                &status[4..]
            }
            _ => status,
        };

        Ok(Self {
            position,
            current: data_type_id == '`',
            bits: dest.bits,
            type_code,
            comment: comment.to_string(),
        })
    }

    /// The data type identifier this report is sent with.
    pub fn data_type_id(&self) -> char {
        if self.current {
            '`'
        } else {
            '\''
        }
    }

    /// The message type carried by [`MicE::bits`].
    pub fn message(&self) -> MicEMessage {
        MicEMessage::from_bits(self.bits)
    }

    /// Compute the destination address carrying the latitude and flags.
    pub fn encode_destination(&self, ssid: Option<&str>) -> Result<Station, AprsError> {
        let (_, longitude_offset) = encode_longitude(self.position.longitude)?;
        let callsign = encode_destination(
            self.position.latitude,
            self.position.ambiguity(),
            self.bits,
            longitude_offset,
            self.position.longitude >= 0.0,
        )?;
        Station::new(&callsign, ssid)
    }

    /// Render the info field (everything after [`MicE::data_type_id`]).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode_info(&self) -> Result<String, AprsError> {
        if self.position.is_compressed() {
            return Err(AprsError::encode("Mic-E positions cannot be compressed"));
        }
        let (longitude, _) = encode_longitude(self.position.longitude)?;
        let speed = self.position.speed.unwrap_or(0.0);
        if !(0.0..800.0).contains(&speed) {
            return Err(AprsError::encode(format!("Mic-E speed {speed} is out of range")));
        }

        let mut out = longitude;
        out.push_str(&encode_speed_course(
            speed.round() as u16,
            self.position.course.unwrap_or(0),
        )?);
        out.push(self.position.symbol_id);
        out.push(self.position.symbol_table);

        match self.type_code {
            Some(code) => out.push(code),
            None if self.position.altitude.is_some() || !self.comment.is_empty() => {
                return Err(AprsError::encode(
                    "Mic-E altitude or comment requires a type code",
                ));
            }
            None => return Ok(out),
        }

        if let Some(altitude) = self.position.altitude {
            let value = altitude.round() + ALTITUDE_OFFSET;
            if !(0.0..753_571.0).contains(&value) {
                return Err(AprsError::encode(format!(
                    "Mic-E altitude {altitude} is out of range"
                )));
            }
            out.push_str(&encode_base91(value as u32, 3)?);
            out.push('}');
        }
        out.push_str(&self.comment);
        Ok(out)
    }
}
