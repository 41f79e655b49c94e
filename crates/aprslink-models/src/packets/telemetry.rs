//! Telemetry reports and the definitions that label them.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::TelemetryDefinitionKind;
use crate::error::AprsError;
use crate::packets::message::ADDRESSEE_LEN;

/// Number of analog channels in a telemetry report.
pub const ANALOG_CHANNELS: usize = 5;
/// Number of digital bits in a telemetry report.
pub const DIGITAL_BITS: usize = 8;
/// Parameter names and unit labels cover 5 analog and 8 digital channels.
pub const MAX_LABELS: usize = ANALOG_CHANNELS + DIGITAL_BITS;
/// One equation per analog channel.
pub const MAX_EQUATIONS: usize = ANALOG_CHANNELS;

static TELEMETRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^#(MIC|\d+),?(.*)$").expect("telemetry regex is valid"));
static DIGITAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([01]+)[\s,]?(.*)$").expect("digital value regex is valid"));

// ─── Telemetry report ────────────────────────────────────────────────

/// The sequence field of a telemetry report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TelemetrySequence {
    /// `MIC`, sent by Mic-E devices.
    Mic,
    /// A sequence number.
    Number(u32),
}

impl fmt::Display for TelemetrySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mic => write!(f, "MIC"),
            Self::Number(n) => write!(f, "{n:03}"),
        }
    }
}

/// A telemetry report (`T#`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Telemetry {
    /// Sequence number.
    pub sequence: TelemetrySequence,
    /// Analog channels; blank fields are `None`.
    pub analog: [Option<f64>; ANALOG_CHANNELS],
    /// Up to 8 binary digits.
    pub digital: Option<String>,
    /// Free text after the values.
    pub comment: String,
}

impl Telemetry {
    /// Decode the info field of a telemetry report (starting at `#`).
    pub fn decode(info: &str) -> Result<Self, AprsError> {
        let caps = TELEMETRY_RE
            .captures(info)
            .ok_or_else(|| AprsError::parse("failed to parse telemetry packet"))?;
        let sequence = match &caps[1] {
            "MIC" => TelemetrySequence::Mic,
            n => TelemetrySequence::Number(n.parse().map_err(|_| {
                AprsError::parse(format!("invalid telemetry sequence number \"{n}\""))
            })?),
        };

        let values = caps.get(2).map_or("", |m| m.as_str());
        let fields: Vec<&str> = values.splitn(ANALOG_CHANNELS + 1, ',').collect();
        if fields.len() <= ANALOG_CHANNELS {
            return Err(AprsError::parse(format!(
                "telemetry needs {ANALOG_CHANNELS} analog values ({} given)",
                fields.len()
            )));
        }

        let mut analog = [None; ANALOG_CHANNELS];
        for (slot, raw) in analog.iter_mut().zip(&fields) {
            let raw = raw.trim();
            if !raw.is_empty() {
                *slot = Some(raw.parse::<f64>().map_err(|_| {
                    AprsError::parse(format!("invalid analog value \"{raw}\""))
                })?);
            }
        }

        let remainder = fields[ANALOG_CHANNELS];
        let (digital, comment) = match DIGITAL_RE.captures(remainder) {
            Some(caps) => {
                let mut bits = caps[1].to_string();
                if bits.len() > DIGITAL_BITS {
                    warn!(
                        digital = %bits,
                        "telemetry has more than {DIGITAL_BITS} digital bits, ignoring the rest"
                    );
                    bits.truncate(DIGITAL_BITS);
                }
                let comment = caps.get(2).map_or("", |m| m.as_str());
                (Some(bits), comment.to_string())
            }
            None => (None, remainder.to_string()),
        };
        debug!(%sequence, ?analog, ?digital, "decoded telemetry");

        Ok(Self {
            sequence,
            analog,
            digital,
            comment,
        })
    }

    /// Render the info field (everything after `T`).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        let mut out = format!("#{},", self.sequence);
        let analog: Vec<String> = self
            .analog
            .iter()
            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
            .collect();
        out.push_str(&analog.join(","));
        out.push(',');

        if let Some(bits) = &self.digital {
            if bits.is_empty()
                || bits.len() > DIGITAL_BITS
                || !bits.bytes().all(|b| b == b'0' || b == b'1')
            {
                return Err(AprsError::encode(format!(
                    "digital value \"{bits}\" must be 1 to {DIGITAL_BITS} binary digits"
                )));
            }
            out.push_str(bits);
            if !self.comment.is_empty() {
                out.push(',');
            }
        }
        out.push_str(&self.comment);
        Ok(out)
    }
}

// ─── Telemetry definitions ───────────────────────────────────────────

/// The payload of a telemetry definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TelemetryDefinitionValues {
    /// `PARM.` names for the analog and digital channels.
    Parameters(Vec<String>),
    /// `UNIT.` labels for the analog and digital channels.
    Units(Vec<String>),
    /// `EQNS.` `a, b, c` coefficients per analog channel.
    Equations(Vec<[f64; 3]>),
    /// `BITS.` active levels of the digital bits and the project title.
    BitSense {
        /// Eight binary digits.
        bits: String,
        /// Project title.
        project: String,
    },
}

/// A telemetry definition sent as a message to the reporting station.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TelemetryDefinition {
    /// The station the definition applies to.
    pub addressee: String,
    /// The definition.
    pub values: TelemetryDefinitionValues,
}

impl TelemetryDefinition {
    /// Which definition this is.
    pub fn kind(&self) -> TelemetryDefinitionKind {
        match self.values {
            TelemetryDefinitionValues::Parameters(_) => TelemetryDefinitionKind::ParameterName,
            TelemetryDefinitionValues::Units(_) => TelemetryDefinitionKind::UnitLabel,
            TelemetryDefinitionValues::Equations(_) => {
                TelemetryDefinitionKind::EquationCoefficients
            }
            TelemetryDefinitionValues::BitSense { .. } => {
                TelemetryDefinitionKind::BitSenseProjectName
            }
        }
    }

    /// Decode the info field of a `:` packet already classified as `kind`.
    pub fn decode(kind: TelemetryDefinitionKind, info: &str) -> Result<Self, AprsError> {
        if info.as_bytes().get(ADDRESSEE_LEN) != Some(&b':') {
            return Err(AprsError::parse(
                "invalid telemetry definition (missing ':' after the addressee)",
            ));
        }
        let addressee = info[..ADDRESSEE_LEN].trim_end().to_string();
        let body = info
            .get(ADDRESSEE_LEN + 6..)
            .ok_or_else(|| AprsError::parse("telemetry definition is too short"))?;

        let values = match kind {
            TelemetryDefinitionKind::ParameterName => {
                TelemetryDefinitionValues::Parameters(decode_labels(body)?)
            }
            TelemetryDefinitionKind::UnitLabel => {
                TelemetryDefinitionValues::Units(decode_labels(body)?)
            }
            TelemetryDefinitionKind::EquationCoefficients => {
                TelemetryDefinitionValues::Equations(decode_equations(body)?)
            }
            TelemetryDefinitionKind::BitSenseProjectName => decode_bit_sense(body)?,
        };
        debug!(%kind, addressee, "decoded telemetry definition");
        Ok(Self { addressee, values })
    }

    /// Render the info field (everything after the `:` data type identifier).
    pub fn encode_info(&self) -> Result<String, AprsError> {
        if self.addressee.is_empty() || self.addressee.len() > ADDRESSEE_LEN {
            return Err(AprsError::encode(format!(
                "addressee \"{}\" must be 1 to {ADDRESSEE_LEN} characters",
                self.addressee
            )));
        }
        let body = match &self.values {
            TelemetryDefinitionValues::Parameters(labels)
            | TelemetryDefinitionValues::Units(labels) => {
                if labels.len() > MAX_LABELS {
                    return Err(AprsError::encode(format!(
                        "at most {MAX_LABELS} labels are allowed ({} given)",
                        labels.len()
                    )));
                }
                labels.join(",")
            }
            TelemetryDefinitionValues::Equations(equations) => {
                if equations.len() > MAX_EQUATIONS {
                    return Err(AprsError::encode(format!(
                        "at most {MAX_EQUATIONS} equations are allowed ({} given)",
                        equations.len()
                    )));
                }
                equations
                    .iter()
                    .flatten()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            }
            TelemetryDefinitionValues::BitSense { bits, project } => {
                check_bits(bits).map_err(|e| AprsError::encode(e.to_string()))?;
                format!("{bits},{project}")
            }
        };
        Ok(format!(
            "{:<width$}:{}{body}",
            self.addressee,
            self.kind(),
            width = ADDRESSEE_LEN
        ))
    }
}

fn decode_labels(body: &str) -> Result<Vec<String>, AprsError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let labels: Vec<String> = body.split(',').map(str::to_string).collect();
    if labels.len() > MAX_LABELS {
        return Err(AprsError::parse(format!(
            "telemetry definition has {} fields, at most {MAX_LABELS} are allowed",
            labels.len()
        )));
    }
    Ok(labels)
}

fn decode_equations(body: &str) -> Result<Vec<[f64; 3]>, AprsError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let coefficients = body
        .split(',')
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| AprsError::parse(format!("invalid equation coefficient \"{raw}\"")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if coefficients.len() % 3 != 0 {
        return Err(AprsError::parse(format!(
            "equation coefficients come in groups of 3 ({} given)",
            coefficients.len()
        )));
    }

    let mut equations: Vec<[f64; 3]> = coefficients
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    if equations.len() > MAX_EQUATIONS {
        warn!(
            count = equations.len(),
            "equation coefficients specify more than {MAX_EQUATIONS} channels, ignoring the rest"
        );
        equations.truncate(MAX_EQUATIONS);
    }
    Ok(equations)
}

fn decode_bit_sense(body: &str) -> Result<TelemetryDefinitionValues, AprsError> {
    let (bits, project) = body.split_once(',').unwrap_or((body, ""));
    check_bits(bits)?;
    Ok(TelemetryDefinitionValues::BitSense {
        bits: bits.to_string(),
        project: project.to_string(),
    })
}

fn check_bits(bits: &str) -> Result<(), AprsError> {
    if bits.len() == DIGITAL_BITS && bits.bytes().all(|b| b == b'0' || b == b'1') {
        Ok(())
    } else {
        Err(AprsError::parse(format!(
            "bit sense \"{bits}\" must be {DIGITAL_BITS} binary digits"
        )))
    }
}
