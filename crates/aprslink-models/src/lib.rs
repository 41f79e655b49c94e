#![deny(missing_docs)]

//! # APRSlink Models
//!
//! Typed APRS packets, the packet classifier and the wire codecs they are
//! built from. Everything here is synchronous and pure: each call works on
//! its input alone and returns a value or an [`AprsError`].
//!
//! ## Packet hierarchy
//!
//! ```text
//! AprsPacket
//! ├── source / destination: Station
//! ├── path: Path ── PathHop (Station | QConstruct, used flag)
//! └── payload: Payload
//!     ├── Position(PositionReport) ── Position + DataExtension + Timestamp
//!     ├── MicE
//!     ├── Object / Item
//!     ├── Message (message, bulletins, announcement, ack, reject)
//!     ├── Status
//!     ├── Telemetry / TelemetryDefinition
//!     ├── StationCapability / UserDefined
//!     └── Beacon / Generic
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`packet`] | `AprsPacket`, `Payload`, parse / encode |
//! | [`classifier`] | Line splitting and variant selection |
//! | [`packets`] | One payload type per variant |
//! | [`builder`] | `PacketBuilder` |
//! | [`station`] | Callsigns, q-constructs and paths |
//! | [`position`] | `Position` and the position block codec |
//! | [`coordinates`] | Uncompressed and base-91 coordinate codecs |
//! | [`extensions`] | PHG, RNG, DFS, NRQ, compression type, altitude |
//! | [`timestamp`] | Zulu, local and hms timestamps |
//! | [`mic_e`] | Mic-E destination and info field codecs |
//! | [`error`] | `AprsError` |

pub mod builder;
pub mod classifier;
pub mod coordinates;
pub mod error;
pub mod extensions;
pub mod mic_e;
pub mod packet;
pub mod packets;
pub mod position;
pub mod station;
pub mod timestamp;

// Re-export the public types at crate root for convenience.
// Downstream crates can use `aprslink_models::AprsPacket` directly.
pub use builder::*;
pub use classifier::*;
pub use coordinates::*;
pub use error::*;
pub use extensions::*;
pub use mic_e::{MicEBit, MicEDestination, MicEMessage};
pub use packet::*;
pub use packets::{
    Beacon, Generic, Item, Maidenhead, Message, MessageKind, MicE, Object, PositionReport,
    StationCapability, Status, Telemetry, TelemetryDefinition, TelemetryDefinitionValues,
    TelemetrySequence, UserDefined,
};
pub use position::*;
pub use station::*;
pub use timestamp::*;
