//! Packet classification.
//!
//! [`RawPacket::split`] cuts a line into its header fields, and [`classify`]
//! picks the packet variant from the destination, data type identifier and
//! info content. Rules are applied in order and the first match wins:
//!
//! 1. beacon destination
//! 2. `! / = @` position
//! 3. `` ` `` `'` Mic-E
//! 4. `;` object
//! 5. `)` item
//! 6. `:` telemetry definition (`PARM.`, `UNIT.`, `EQNS.`, `BITS.`) or message
//! 7. `T#` telemetry
//! 8. `>` status
//! 9. `<` station capabilities
//! 10. `{` user-defined
//! 11. `$ _ *` recognised but unsupported
//! 12. `!` within the first 41 info characters: position behind a banner
//! 13. otherwise a parse error

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AprsError;
use crate::station::MAX_ADDRESS_LEN;

static DESTINATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9]{1,6}(-[0-9]{1,2})?$").expect("destination regex is valid")
});

/// Destinations that mark a packet as a beacon (matched without SSID).
pub const BEACON_DESTINATIONS: &[&str] = &[
    "AIR", "ALL", "BEACON", "CQ", "DF", "DGPS", "DRILL", "DX", "GPS", "ID", "JAVA", "MAIL",
    "MICE", "QST", "QTH", "RTCM", "SKY", "SPACE", "SPC", "SYM", "TEL", "TEST", "TLM", "WX",
    "ZIP",
];

/// Furthest info offset at which a bare `!` still marks a position.
pub const MAX_POSITION_OFFSET: usize = 40;

// ---------------------------------------------------------------------------
// RawPacket
// ---------------------------------------------------------------------------

/// A packet line split into its header fields, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPacket<'a> {
    /// Source address, as written.
    pub source: &'a str,
    /// Destination address, as written.
    pub destination: &'a str,
    /// Comma-separated path, empty when the packet has none.
    pub path: &'a str,
    /// Data type identifier (first character after `:`).
    pub data_type_id: char,
    /// Everything after the data type identifier.
    pub info: &'a str,
}

impl<'a> RawPacket<'a> {
    /// Split `SOURCE>DEST[,PATH]:<dtid><info>` and check the address fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use aprslink_models::RawPacket;
    ///
    /// let raw = RawPacket::split("N0CALL>APRS,WIDE1-1:>Hello").unwrap();
    /// assert_eq!(raw.source, "N0CALL");
    /// assert_eq!(raw.destination, "APRS");
    /// assert_eq!(raw.path, "WIDE1-1");
    /// assert_eq!(raw.data_type_id, '>');
    /// assert_eq!(raw.info, "Hello");
    /// ```
    pub fn split(line: &'a str) -> Result<Self, AprsError> {
        let (header, body) = line
            .split_once(':')
            .ok_or_else(|| AprsError::parse("missing ':' after packet header"))?;
        let (source, addresses) = header
            .split_once('>')
            .ok_or_else(|| AprsError::parse("missing '>' after source address"))?;
        let (destination, path) = addresses.split_once(',').unwrap_or((addresses, ""));

        let mut chars = body.chars();
        let data_type_id = chars
            .next()
            .ok_or_else(|| AprsError::parse("missing data type identifier"))?;
        let info = chars.as_str();

        if source.is_empty()
            || !source
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(AprsError::parse(format!(
                "source address \"{source}\" is invalid"
            )));
        }
        if source.len() > MAX_ADDRESS_LEN {
            return Err(AprsError::parse(format!(
                "source address \"{source}\" is longer than {MAX_ADDRESS_LEN} characters"
            )));
        }
        check_destination(destination)?;

        Ok(Self {
            source,
            destination,
            path,
            data_type_id,
            info,
        })
    }

    /// The destination callsign without its SSID.
    pub fn destination_callsign(&self) -> &'a str {
        self.destination
            .split_once('-')
            .map_or(self.destination, |(callsign, _)| callsign)
    }
}

/// Check a destination address: at most 9 characters, an upper-case
/// callsign of up to 6 characters and an optional numeric SSID.
pub fn check_destination(destination: &str) -> Result<(), AprsError> {
    if destination.len() > MAX_ADDRESS_LEN {
        return Err(AprsError::parse(format!(
            "destination address \"{destination}\" is longer than {MAX_ADDRESS_LEN} characters"
        )));
    }
    if !DESTINATION_RE.is_match(destination) {
        return Err(AprsError::parse(format!(
            "destination address \"{destination}\" is invalid"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PacketKind
// ---------------------------------------------------------------------------

/// Which telemetry definition a `:`-packet carries.
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
pub enum TelemetryDefinitionKind {
    /// `PARM.` parameter names.
    #[strum(serialize = "PARM.")]
    ParameterName,
    /// `UNIT.` unit labels.
    #[strum(serialize = "UNIT.")]
    UnitLabel,
    /// `EQNS.` equation coefficients.
    #[strum(serialize = "EQNS.")]
    EquationCoefficients,
    /// `BITS.` bit sense and project name.
    #[strum(serialize = "BITS.")]
    BitSenseProjectName,
}

/// The variant [`classify`] selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Sent to a beacon destination.
    Beacon,
    /// Position report; `offset` is the index of `!` inside the info field
    /// when the packet starts with a banner instead of its data type.
    Position {
        /// Index of the real `!` within the info field.
        offset: Option<usize>,
    },
    /// Mic-E position.
    MicE,
    /// Object report.
    Object,
    /// Item report.
    Item,
    /// Message, bulletin or announcement.
    Message,
    /// Telemetry definition.
    TelemetryDefinition(TelemetryDefinitionKind),
    /// Telemetry report.
    Telemetry,
    /// Status report.
    Status,
    /// Station capabilities.
    StationCapability,
    /// User-defined data.
    UserDefined,
}

/// Select the packet variant for `raw`.
///
/// Fails with [`AprsError::Unsupported`] for raw NMEA and weather reports,
/// and with [`AprsError::Parse`] when no rule matches.
pub fn classify(raw: &RawPacket<'_>) -> Result<PacketKind, AprsError> {
    let kind = classify_inner(raw)?;
    debug!(?kind, data_type_id = %raw.data_type_id, "classified packet");
    Ok(kind)
}

fn classify_inner(raw: &RawPacket<'_>) -> Result<PacketKind, AprsError> {
    if BEACON_DESTINATIONS.contains(&raw.destination_callsign()) {
        return Ok(PacketKind::Beacon);
    }

    match raw.data_type_id {
        '!' | '/' | '=' | '@' => return Ok(PacketKind::Position { offset: None }),
        '`' | '\'' => return Ok(PacketKind::MicE),
        ';' => return Ok(PacketKind::Object),
        ')' => return Ok(PacketKind::Item),
        ':' => {
            return Ok(telemetry_definition_kind(raw.info)
                .map_or(PacketKind::Message, PacketKind::TelemetryDefinition))
        }
        'T' if raw.info.starts_with('#') => return Ok(PacketKind::Telemetry),
        '>' => return Ok(PacketKind::Status),
        '<' => return Ok(PacketKind::StationCapability),
        '{' => return Ok(PacketKind::UserDefined),
        '$' => return Err(AprsError::unsupported("raw NMEA sentences are not decoded")),
        '_' => {
            return Err(AprsError::unsupported(
                "positionless weather reports are not decoded",
            ))
        }
        '*' => {
            return Err(AprsError::unsupported(
                "complete weather reports are not decoded",
            ))
        }
        _ => {}
    }

    match raw.info.find('!') {
        Some(offset) if offset <= MAX_POSITION_OFFSET => Ok(PacketKind::Position {
            offset: Some(offset),
        }),
        _ => Err(AprsError::parse(format!(
            "could not determine packet type for data type identifier {:?}",
            raw.data_type_id
        ))),
    }
}

fn telemetry_definition_kind(info: &str) -> Option<TelemetryDefinitionKind> {
    if info.as_bytes().get(9) != Some(&b':') {
        return None;
    }
    info.get(10..15).and_then(|code| code.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn kind(line: &str) -> Result<PacketKind, AprsError> {
        classify(&RawPacket::split(line)?)
    }

    #[test]
    fn split_without_path() {
        let raw = RawPacket::split("N0CALL>APRS:!4903.50N/07201.75W-").unwrap();
        assert_eq!(raw.path, "");
        assert_eq!(raw.info, "4903.50N/07201.75W-");
    }

    #[test]
    fn split_keeps_colons_in_info() {
        let raw = RawPacket::split("N0CALL>APRS,TCPIP*::N0CALL-1 :hi:there").unwrap();
        assert_eq!(raw.data_type_id, ':');
        assert_eq!(raw.info, "N0CALL-1 :hi:there");
    }

    #[test]
    fn split_rejects_bad_addresses() {
        assert!(RawPacket::split("N0CALL>APRS").is_err());
        assert!(RawPacket::split("N0CALLAPRS:!").is_err());
        assert!(RawPacket::split("N0CALL>APRS:").is_err());
        assert!(RawPacket::split("N0CALL-1234>APRS:>x").is_err());
        assert!(RawPacket::split("N0CALL>APRSXYZ-12:>x").is_err());
        assert!(RawPacket::split("N0CALL>aprs:>x").is_err());
        assert!(RawPacket::split("N0 CALL>APRS:>x").is_err());
    }

    #[test]
    fn beacon_destination_wins() {
        assert_eq!(kind("N0CALL>BEACON:!ignored").unwrap(), PacketKind::Beacon);
        assert_eq!(kind("N0CALL>CQ-1:hello").unwrap(), PacketKind::Beacon);
    }

    #[test]
    fn aprs_destination_is_not_a_beacon() {
        assert_eq!(
            kind("N0CALL>APRS:=5030.50N/10020.30W$").unwrap(),
            PacketKind::Position { offset: None }
        );
    }

    #[test]
    fn data_type_table() {
        assert_eq!(kind("N0CALL>APRS:`abc").unwrap(), PacketKind::MicE);
        assert_eq!(kind("N0CALL>APRS:'abc").unwrap(), PacketKind::MicE);
        assert_eq!(kind("N0CALL>APRS:;OBJ").unwrap(), PacketKind::Object);
        assert_eq!(kind("N0CALL>APRS:)ITEM").unwrap(), PacketKind::Item);
        assert_eq!(kind("N0CALL>APRS::N0CALL   :hi").unwrap(), PacketKind::Message);
        assert_eq!(kind("N0CALL>APRS:T#001,1").unwrap(), PacketKind::Telemetry);
        assert_eq!(kind("N0CALL>APRS:>status").unwrap(), PacketKind::Status);
        assert_eq!(kind("N0CALL>APRS:<IGATE").unwrap(), PacketKind::StationCapability);
        assert_eq!(kind("N0CALL>APRS:{Qdata").unwrap(), PacketKind::UserDefined);
    }

    #[test]
    fn telemetry_definitions_before_messages() {
        assert_eq!(
            kind("N0CALL>APRS::N0CALL   :PARM.Battery").unwrap(),
            PacketKind::TelemetryDefinition(TelemetryDefinitionKind::ParameterName)
        );
        assert_eq!(
            kind("N0CALL>APRS::N0CALL   :BITS.11111111,Project").unwrap(),
            PacketKind::TelemetryDefinition(TelemetryDefinitionKind::BitSenseProjectName)
        );
        assert_eq!(
            kind("N0CALL>APRS::N0CALL   :PARMS").unwrap(),
            PacketKind::Message
        );
    }

    #[test]
    fn unsupported_types() {
        for line in [
            "N0CALL>APRS:$GPRMC,...",
            "N0CALL>APRS:_10090556c220s004",
            "N0CALL>APRS:*weather",
        ] {
            assert!(kind(line).unwrap_err().is_unsupported(), "{line}");
        }
    }

    #[test]
    fn t_without_hash_is_not_telemetry() {
        assert!(kind("N0CALL>APRS:T001,1").is_err());
    }

    #[test]
    fn banner_before_position() {
        assert_eq!(
            kind("N0CALL>APRS:TheNet X1J4 (BFLD)!4903.50N/07201.75W-").unwrap(),
            PacketKind::Position { offset: Some(17) }
        );
    }

    #[test]
    fn bang_too_far_is_unknown() {
        let line = format!("N0CALL>APRS:x{}!4903.50N/07201.75W-", "a".repeat(41));
        assert!(matches!(kind(&line), Err(AprsError::Parse { .. })));
    }

    #[test]
    fn definition_kind_strum() {
        assert_eq!(TelemetryDefinitionKind::UnitLabel.to_string(), "UNIT.");
        assert_eq!(TelemetryDefinitionKind::iter().count(), 4);
    }
}
