//! # Packet Builder
//!
//! Fluent construction of [`AprsPacket`] values with address validation
//! deferred to [`PacketBuilder::build`].
//!
//! ## Quick examples
//!
//! ```rust
//! use aprslink_models::{PacketBuilder, Position, PositionReport};
//!
//! // Status report
//! let packet = PacketBuilder::new("N0CALL-9", "APRS")
//!     .path("WIDE1-1,WIDE2-1")
//!     .status("On the air")
//!     .build()
//!     .unwrap();
//! assert_eq!(packet.encode().unwrap(), "N0CALL-9>APRS,WIDE1-1,WIDE2-1:>On the air");
//!
//! // Message with an acknowledgement request
//! let packet = PacketBuilder::new("N0CALL", "APRS")
//!     .message("XX1XX", "Hello")
//!     .message_id("7")
//!     .build()
//!     .unwrap();
//! assert_eq!(packet.encode().unwrap(), "N0CALL>APRS::XX1XX    :Hello{7");
//!
//! // Position report from a station that accepts messages
//! let mut report = PositionReport::new(Position::uncompressed(49.058333, -72.029167, '/', '-'));
//! report.messaging = true;
//! let packet = PacketBuilder::new("N0CALL", "APRS").position(report).build().unwrap();
//! assert_eq!(packet.encode().unwrap(), "N0CALL>APRS:=4903.50N/07201.75W-");
//! ```

use tracing::debug;

use crate::classifier::check_destination;
use crate::error::AprsError;
use crate::packet::{AprsPacket, Payload};
use crate::packets::{Message, MicE, PositionReport, Status};
use crate::station::{Path, Station};

// ─── Packet Builder ──────────────────────────────────────────────────

/// Builder for [`AprsPacket`].
///
/// Created via [`PacketBuilder::new`]; pick one payload, then call
/// [`PacketBuilder::build`].
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    source: String,
    destination: String,
    path: String,
    payload: Option<Payload>,
}

impl PacketBuilder {
    /// Start a packet from `source` to `destination`.
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            path: String::new(),
            payload: None,
        }
    }

    /// Set the comma-separated digipeater path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    // ─── Payload selectors ───────────────────────────────────────────

    /// Carry a position report.
    pub fn position(mut self, report: PositionReport) -> Self {
        self.payload = Some(Payload::Position(report));
        self
    }

    /// Carry a plain status text.
    pub fn status(mut self, text: impl Into<String>) -> Self {
        self.payload = Some(Payload::Status(Status::new(text)));
        self
    }

    /// Carry a message to `addressee`.
    pub fn message(mut self, addressee: impl Into<String>, text: impl Into<String>) -> Self {
        self.payload = Some(Payload::Message(Message::new(addressee, text)));
        self
    }

    /// Request an acknowledgement for the message set with
    /// [`PacketBuilder::message`]. Ignored for other payloads.
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        if let Some(Payload::Message(msg)) = &mut self.payload {
            msg.message_id = Some(id.into());
        }
        self
    }

    /// Carry a Mic-E report. The destination callsign is replaced by the
    /// one computed from the report; its SSID is kept.
    pub fn mic_e(mut self, mic_e: MicE) -> Self {
        self.payload = Some(Payload::MicE(mic_e));
        self
    }

    /// Carry any payload.
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    // ─── Build ───────────────────────────────────────────────────────

    /// Validate the addresses and assemble the packet.
    pub fn build(self) -> Result<AprsPacket, AprsError> {
        let source: Station = self.source.parse()?;
        let path: Path = self.path.parse()?;
        let payload = self
            .payload
            .ok_or_else(|| AprsError::encode("no payload selected"))?;

        let destination = match &payload {
            Payload::MicE(mic_e) => {
                let given: Station = self.destination.parse()?;
                mic_e.encode_destination(given.ssid())?
            }
            _ => {
                check_destination(&self.destination)?;
                self.destination.parse()?
            }
        };
        debug!(%source, %destination, "built packet");

        Ok(AprsPacket {
            source,
            destination,
            path,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::MessageKind;

    #[test]
    fn status_packet() {
        let packet = PacketBuilder::new("N0CALL", "APRS").status("hi").build().unwrap();
        assert!(packet.path.is_empty());
        assert_eq!(packet.encode().unwrap(), "N0CALL>APRS:>hi");
    }

    #[test]
    fn message_id_applies_to_messages_only() {
        let packet = PacketBuilder::new("N0CALL", "APRS")
            .message("XX1XX", "hello")
            .message_id("12")
            .build()
            .unwrap();
        let Payload::Message(msg) = &packet.payload else {
            panic!("expected a message");
        };
        assert_eq!(msg.kind, MessageKind::Message);
        assert_eq!(msg.message_id.as_deref(), Some("12"));

        let packet = PacketBuilder::new("N0CALL", "APRS")
            .status("x")
            .message_id("12")
            .build()
            .unwrap();
        assert_eq!(packet.encode().unwrap(), "N0CALL>APRS:>x");
    }

    #[test]
    fn mic_e_recomputes_destination() {
        let parsed = AprsPacket::parse(
            "VE6LY-9>U1PRSS-1,WIDE1-1:`*\\Fl\"Bk/]\"?l}146.850MHz",
        )
        .unwrap();
        let Payload::MicE(mic_e) = parsed.payload.clone() else {
            panic!("expected Mic-E");
        };
        let packet = PacketBuilder::new("VE6LY-9", "APRS-1")
            .path("WIDE1-1")
            .mic_e(mic_e)
            .build()
            .unwrap();
        assert_eq!(packet.destination.to_string(), "U1PRSS-1");
        assert_eq!(packet.encode().unwrap(), parsed.encode().unwrap());
    }

    #[test]
    fn invalid_addresses() {
        assert!(PacketBuilder::new("N0 CALL", "APRS").status("x").build().is_err());
        assert!(PacketBuilder::new("N0CALL", "aprs").status("x").build().is_err());
        assert!(PacketBuilder::new("N0CALL", "APRS")
            .path("WIDE1-1,TOOLONGHOP1")
            .status("x")
            .build()
            .is_err());
    }

    #[test]
    fn payload_is_required() {
        assert!(matches!(
            PacketBuilder::new("N0CALL", "APRS").build(),
            Err(AprsError::Encode { .. })
        ));
    }
}
