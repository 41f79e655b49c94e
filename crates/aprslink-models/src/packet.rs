//! The top-level packet: addresses, path and a typed payload.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{classify, PacketKind, RawPacket};
use crate::error::AprsError;
use crate::packets::{
    Beacon, Generic, Item, Message, MicE, Object, PositionReport, StationCapability, Status,
    Telemetry, TelemetryDefinition, UserDefined,
};
use crate::station::{Path, Station};

/// The decoded body of a packet, one variant per packet type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// Body kept verbatim; never produced by [`AprsPacket::parse`].
    Generic(Generic),
    /// Free text sent to a beacon destination.
    Beacon(Beacon),
    /// Uncompressed or compressed position report.
    Position(PositionReport),
    /// Mic-E position report.
    MicE(MicE),
    /// Object report.
    Object(Object),
    /// Item report.
    Item(Item),
    /// Message, bulletin, announcement, ack or reject.
    Message(Message),
    /// Status report.
    Status(Status),
    /// Telemetry report.
    Telemetry(Telemetry),
    /// Telemetry parameter names, units, equations or bit sense.
    TelemetryDefinition(TelemetryDefinition),
    /// Station capabilities.
    StationCapability(StationCapability),
    /// User-defined data.
    UserDefined(UserDefined),
}

impl Payload {
    /// Classify `raw` and decode its info field.
    pub fn decode(raw: &RawPacket<'_>, now: DateTime<Utc>) -> Result<Self, AprsError> {
        let dtid = raw.data_type_id;
        let info = raw.info;
        Ok(match classify(raw)? {
            PacketKind::Beacon => Self::Beacon(Beacon::decode(dtid, info)),
            PacketKind::Position { offset: None } => {
                Self::Position(PositionReport::decode(dtid, info, now)?)
            }
            PacketKind::Position {
                offset: Some(offset),
            } => Self::Position(PositionReport::decode_with_header(dtid, info, offset, now)?),
            PacketKind::MicE => Self::MicE(MicE::decode(raw.destination_callsign(), dtid, info)?),
            PacketKind::Object => Self::Object(Object::decode(info, now)?),
            PacketKind::Item => Self::Item(Item::decode(info)?),
            PacketKind::Message => Self::Message(Message::decode(info)?),
            PacketKind::TelemetryDefinition(kind) => {
                Self::TelemetryDefinition(TelemetryDefinition::decode(kind, info)?)
            }
            PacketKind::Telemetry => Self::Telemetry(Telemetry::decode(info)?),
            PacketKind::Status => Self::Status(Status::decode(info, now)?),
            PacketKind::StationCapability => {
                Self::StationCapability(StationCapability::decode(info)?)
            }
            PacketKind::UserDefined => Self::UserDefined(UserDefined::decode(info)?),
        })
    }

    /// The data type identifier this payload is sent with. `None` only for
    /// an empty beacon.
    pub fn data_type_id(&self) -> Option<char> {
        Some(match self {
            Self::Generic(g) => g.data_type_id,
            Self::Beacon(b) => return b.data_type_id(),
            Self::Position(p) => p.data_type_id(),
            Self::MicE(m) => m.data_type_id(),
            Self::Object(_) => ';',
            Self::Item(_) => ')',
            Self::Message(_) | Self::TelemetryDefinition(_) => ':',
            Self::Status(_) => '>',
            Self::Telemetry(_) => 'T',
            Self::StationCapability(_) => '<',
            Self::UserDefined(_) => '{',
        })
    }

    /// Render the data type identifier followed by the info field.
    pub fn encode(&self) -> Result<String, AprsError> {
        let info = match self {
            Self::Generic(g) => g.info.clone(),
            Self::Beacon(b) => b.encode_info()?,
            Self::Position(p) => p.encode_info()?,
            Self::MicE(m) => m.encode_info()?,
            Self::Object(o) => o.encode_info()?,
            Self::Item(i) => i.encode_info()?,
            Self::Message(m) => m.encode_info()?,
            Self::Status(s) => s.encode_info()?,
            Self::Telemetry(t) => t.encode_info()?,
            Self::TelemetryDefinition(d) => d.encode_info()?,
            Self::StationCapability(c) => c.encode_info()?,
            Self::UserDefined(u) => u.encode_info(),
        };
        let dtid = self
            .data_type_id()
            .ok_or_else(|| AprsError::encode("payload has no data type identifier"))?;
        Ok(format!("{dtid}{info}"))
    }
}

/// A complete APRS packet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AprsPacket {
    /// Sending station.
    pub source: Station,
    /// Destination address (often a software identifier, or Mic-E data).
    pub destination: Station,
    /// Digipeater / q-construct path.
    pub path: Path,
    /// Decoded body.
    pub payload: Payload,
}

impl AprsPacket {
    /// Parse a packet line, resolving timestamps against the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use aprslink_models::{AprsPacket, Payload};
    ///
    /// let packet = AprsPacket::parse(
    ///     "XX1XX>APRS,TCPIP*,qAC,FOURTH:=5030.50N/10020.30W$221/000/A=005000Test packet",
    /// )
    /// .unwrap();
    /// assert_eq!(packet.source.to_string(), "XX1XX");
    /// match packet.payload {
    ///     Payload::Position(report) => {
    ///         assert_eq!(report.position.latitude, 50.508333);
    ///         assert_eq!(report.position.longitude, -100.338333);
    ///         assert_eq!(report.comment, "Test packet");
    ///     }
    ///     other => panic!("expected a position, got {other:?}"),
    /// }
    /// ```
    pub fn parse(raw: &str) -> Result<Self, AprsError> {
        Self::parse_at(raw, Utc::now())
    }

    /// Parse a packet line, resolving timestamps against `now`.
    ///
    /// Errors carry the raw packet.
    pub fn parse_at(raw: &str, now: DateTime<Utc>) -> Result<Self, AprsError> {
        Self::parse_inner(raw, now).map_err(|e| e.with_packet(raw))
    }

    fn parse_inner(raw: &str, now: DateTime<Utc>) -> Result<Self, AprsError> {
        let split = RawPacket::split(raw)?;
        let (source, destination, path) = Self::addresses(&split)?;
        let payload = Payload::decode(&split, now)?;
        debug!(%source, %destination, data_type_id = %split.data_type_id, "decoded packet");
        Ok(Self {
            source,
            destination,
            path,
            payload,
        })
    }

    /// Parse only the header, keeping the body as a [`Payload::Generic`].
    pub fn parse_generic(raw: &str) -> Result<Self, AprsError> {
        let split = RawPacket::split(raw).map_err(|e| e.with_packet(raw))?;
        let (source, destination, path) =
            Self::addresses(&split).map_err(|e| e.with_packet(raw))?;
        Ok(Self {
            source,
            destination,
            path,
            payload: Payload::Generic(Generic {
                data_type_id: split.data_type_id,
                info: split.info.to_string(),
            }),
        })
    }

    fn addresses(split: &RawPacket<'_>) -> Result<(Station, Station, Path), AprsError> {
        Ok((
            split.source.parse()?,
            split.destination.parse()?,
            split.path.parse()?,
        ))
    }

    /// The payload's data type identifier.
    pub fn data_type_id(&self) -> Option<char> {
        self.payload.data_type_id()
    }

    /// Render the packet back to a line.
    pub fn encode(&self) -> Result<String, AprsError> {
        let mut out = format!("{}>{}", self.source, self.destination);
        if !self.path.is_empty() {
            out.push(',');
            out.push_str(&self.path.to_string());
        }
        out.push(':');
        out.push_str(&self.payload.encode()?);
        Ok(out)
    }
}

impl FromStr for AprsPacket {
    type Err = AprsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
