//! Payload types, one per packet variant.
//!
//! Each type decodes from the info field (the text after the data type
//! identifier) and renders back to it with `encode_info`.
//!
//! | Module | Data type identifiers | Types |
//! |--------|-----------------------|-------|
//! | [`position_report`] | `! = / @` | [`PositionReport`] |
//! | [`mic_e`] | `` ` `` `'` | [`MicE`] |
//! | [`object`] | `;` `)` | [`Object`], [`Item`] |
//! | [`message`] | `:` | [`Message`], [`MessageKind`] |
//! | [`telemetry`] | `T#`, `:` + `PARM.`/`UNIT.`/`EQNS.`/`BITS.` | [`Telemetry`], [`TelemetryDefinition`] |
//! | [`status`] | `>` | [`Status`], [`Maidenhead`] |
//! | [`capability`] | `<` | [`StationCapability`] |
//! | [`user_defined`] | `{` | [`UserDefined`] |
//! | [`beacon`] | any, by destination | [`Beacon`], [`Generic`] |

pub mod beacon;
pub mod capability;
pub mod message;
pub mod mic_e;
pub mod object;
pub mod position_report;
pub mod status;
pub mod telemetry;
pub mod user_defined;

pub use beacon::{Beacon, Generic};
pub use capability::StationCapability;
pub use message::{Message, MessageKind};
pub use mic_e::MicE;
pub use object::{Item, Object};
pub use position_report::PositionReport;
pub use status::{Maidenhead, Status};
pub use telemetry::{
    Telemetry, TelemetryDefinition, TelemetryDefinitionValues, TelemetrySequence,
};
pub use user_defined::UserDefined;
