//! Station addressing: callsigns, path hops and digipeater paths.
//!
//! A [`Station`] is a callsign with an optional SSID. The packet path is a
//! list of [`PathHop`]s, each either a station or one of the reserved
//! APRS-IS [`QConstruct`] tokens, optionally marked as used with a trailing `*`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AprsError;

/// Longest address accepted in the source, destination or path fields.
pub const MAX_ADDRESS_LEN: usize = 9;

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A station callsign with an optional SSID (e.g. `"VE6LY-9"`).
///
/// Callsigns are 1–6 alphanumeric characters. The SSID is 1–2 alphanumeric
/// characters; only numeric SSIDs in `0..=15` are valid over AX.25, the rest
/// are APRS-IS only (see [`Station::is_valid_ax25`]).
///
/// # Examples
///
/// ```
/// use aprslink_models::Station;
///
/// let station: Station = "VE6LY-9".parse().unwrap();
/// assert_eq!(station.callsign(), "VE6LY");
/// assert_eq!(station.ssid(), Some("9"));
/// assert!(station.is_valid_ax25());
/// assert_eq!(station.to_string(), "VE6LY-9");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Station {
    callsign: String,
    ssid: Option<String>,
}

impl Station {
    /// Create a station from a bare callsign and an optional SSID.
    pub fn new(callsign: &str, ssid: Option<&str>) -> Result<Self, AprsError> {
        validate_callsign(callsign)?;
        if let Some(ssid) = ssid {
            validate_ssid(ssid)?;
        }
        Ok(Self {
            callsign: callsign.to_string(),
            ssid: ssid.map(str::to_string),
        })
    }

    /// The callsign without the SSID.
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// The SSID, if any.
    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_deref()
    }

    /// Return a copy of this station with a different SSID.
    pub fn with_ssid(&self, ssid: Option<&str>) -> Result<Self, AprsError> {
        Self::new(&self.callsign, ssid)
    }

    /// Whether the station can be expressed as an AX.25 address.
    pub fn is_valid_ax25(&self) -> bool {
        if self.callsign.len() > 6 {
            return false;
        }
        match &self.ssid {
            None => true,
            Some(ssid) => ssid.parse::<u8>().is_ok_and(|n| n <= 15),
        }
    }
}

fn validate_callsign(callsign: &str) -> Result<(), AprsError> {
    if callsign.is_empty() || callsign.len() > 6 {
        return Err(AprsError::parse(format!(
            "callsign \"{callsign}\" must be 1-6 characters"
        )));
    }
    if !callsign.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AprsError::parse(format!(
            "callsign \"{callsign}\" must be alphanumeric"
        )));
    }
    Ok(())
}

fn validate_ssid(ssid: &str) -> Result<(), AprsError> {
    if ssid.is_empty() || ssid.len() > 2 || !ssid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AprsError::parse(format!(
            "SSID \"{ssid}\" must be 1-2 alphanumeric characters"
        )));
    }
    Ok(())
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ssid {
            Some(ssid) => write!(f, "{}-{}", self.callsign, ssid),
            None => f.write_str(&self.callsign),
        }
    }
}

impl FromStr for Station {
    type Err = AprsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((callsign, ssid)) => Self::new(callsign, Some(ssid)),
            None => Self::new(s, None),
        }
    }
}

impl TryFrom<&str> for Station {
    type Error = AprsError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// QConstruct
// ---------------------------------------------------------------------------

/// Reserved APRS-IS path tokens describing how a packet entered the network.
///
/// The tokens are case-sensitive (`qAo` and `qAO` are different constructs).
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum QConstruct {
    /// Verified login via bidirectional port.
    #[strum(serialize = "qAC")]
    QAC,
    /// Unverified login.
    #[strum(serialize = "qAX")]
    QAX,
    /// Received via UDP.
    #[strum(serialize = "qAU")]
    QAU,
    /// Gated from RF by a client-only (non-bidirectional) IGate.
    #[strum(serialize = "qAo")]
    QAo,
    /// Gated from RF by a receive-only IGate.
    #[strum(serialize = "qAO")]
    QAO,
    /// Server-generated packet.
    #[strum(serialize = "qAS")]
    QAS,
    /// Gated from RF via an indirect path.
    #[strum(serialize = "qAr")]
    QAr,
    /// Gated from RF by a bidirectional IGate.
    #[strum(serialize = "qAR")]
    QAR,
    /// Server-client command packet.
    #[strum(serialize = "qAZ")]
    QAZ,
    /// Trace packet.
    #[strum(serialize = "qAI")]
    QAI,
}

// ---------------------------------------------------------------------------
// PathHop
// ---------------------------------------------------------------------------

/// The address carried by a single [`PathHop`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "value")]
pub enum HopAddress {
    /// A digipeater or alias (e.g. `WIDE1-1`, `CALGRY`).
    Station(Station),
    /// An APRS-IS q construct.
    QConstruct(QConstruct),
}

/// One hop of a packet path.
///
/// # Examples
///
/// ```
/// use aprslink_models::{HopAddress, PathHop, QConstruct};
///
/// let hop: PathHop = "TCPIP*".parse().unwrap();
/// assert!(hop.used);
///
/// let q: PathHop = "qAR".parse().unwrap();
/// assert_eq!(q.address, HopAddress::QConstruct(QConstruct::QAR));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PathHop {
    /// The hop address.
    pub address: HopAddress,
    /// Whether the hop has been used (trailing `*` on the wire).
    pub used: bool,
}

impl PathHop {
    /// A station hop.
    pub fn station(station: Station, used: bool) -> Self {
        Self {
            address: HopAddress::Station(station),
            used,
        }
    }

    /// A q-construct hop.
    pub fn q_construct(q: QConstruct) -> Self {
        Self {
            address: HopAddress::QConstruct(q),
            used: false,
        }
    }
}

impl fmt::Display for PathHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            HopAddress::Station(station) => write!(f, "{station}")?,
            HopAddress::QConstruct(q) => write!(f, "{q}")?,
        }
        if self.used {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl FromStr for PathHop {
    type Err = AprsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, used) = match s.strip_suffix('*') {
            Some(name) => (name, true),
            None => (s, false),
        };
        if name.len() > MAX_ADDRESS_LEN {
            return Err(AprsError::parse(format!(
                "path hop \"{s}\" is longer than {MAX_ADDRESS_LEN} characters"
            )));
        }
        let address = match name.parse::<QConstruct>() {
            Ok(q) => HopAddress::QConstruct(q),
            Err(_) => HopAddress::Station(name.parse()?),
        };
        Ok(Self { address, used })
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// An ordered digipeater / APRS-IS path.
///
/// # Examples
///
/// ```
/// use aprslink_models::{Path, QConstruct};
///
/// let path: Path = "WIDE1-1,WIDE2-2,qAR,CALGRY".parse().unwrap();
/// assert_eq!(path.hops().len(), 4);
/// assert_eq!(path.q_construct(), Some(QConstruct::QAR));
/// assert_eq!(path.to_string(), "WIDE1-1,WIDE2-2,qAR,CALGRY");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(Vec<PathHop>);

impl Path {
    /// Build a path from already-parsed hops.
    pub fn new(hops: Vec<PathHop>) -> Self {
        Self(hops)
    }

    /// The hops, in transmission order.
    pub fn hops(&self) -> &[PathHop] {
        &self.0
    }

    /// `true` when the packet carried no path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first q construct in the path, if the packet came through APRS-IS.
    pub fn q_construct(&self) -> Option<QConstruct> {
        self.0.iter().find_map(|hop| match hop.address {
            HopAddress::QConstruct(q) => Some(q),
            HopAddress::Station(_) => None,
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{hop}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = AprsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
