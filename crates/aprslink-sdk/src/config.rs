//! Decoder configuration loaded from environment variables.

use crate::error::SdkError;

/// Configuration for [`crate::PacketDecoder`] and the APRS-IS login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Keep undecodable lines as generic packets instead of failing.
    pub best_effort: bool,
    /// Login callsign.
    pub callsign: Option<String>,
    /// Software name sent in the login line.
    pub software_name: String,
    /// Server-side filter sent in the login line.
    pub filter: Option<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            best_effort: true,
            callsign: None,
            software_name: "aprslink".to_string(),
            filter: None,
        }
    }
}

impl DecoderConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |---|---|---|
    /// | `APRS_BEST_EFFORT` | `true` | `1`/`true`/`yes` or `0`/`false`/`no` |
    /// | `APRS_CALLSIGN` | (none) | Login callsign |
    /// | `APRS_SOFTWARE_NAME` | `aprslink` | Software name in the login line |
    /// | `APRS_FILTER` | (none) | Server-side filter |
    pub fn from_env() -> Result<Self, SdkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SdkError> {
        let defaults = Self::default();
        let best_effort = match lookup("APRS_BEST_EFFORT") {
            Some(raw) => parse_bool("APRS_BEST_EFFORT", &raw)?,
            None => defaults.best_effort,
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            best_effort,
            callsign: non_empty("APRS_CALLSIGN"),
            software_name: non_empty("APRS_SOFTWARE_NAME").unwrap_or(defaults.software_name),
            filter: non_empty("APRS_FILTER"),
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, SdkError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(SdkError::Config(format!("{key}={raw} is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = DecoderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DecoderConfig::default());
        assert!(config.best_effort);
        assert_eq!(config.software_name, "aprslink");
    }

    #[test]
    fn reads_all_variables() {
        let config = DecoderConfig::from_lookup(lookup(&[
            ("APRS_BEST_EFFORT", "No"),
            ("APRS_CALLSIGN", "N0CALL-9"),
            ("APRS_SOFTWARE_NAME", "igate"),
            ("APRS_FILTER", "r/49/-72/50"),
        ]))
        .unwrap();
        assert!(!config.best_effort);
        assert_eq!(config.callsign.as_deref(), Some("N0CALL-9"));
        assert_eq!(config.software_name, "igate");
        assert_eq!(config.filter.as_deref(), Some("r/49/-72/50"));
    }

    #[test]
    fn empty_values_fall_back() {
        let config = DecoderConfig::from_lookup(lookup(&[
            ("APRS_SOFTWARE_NAME", ""),
            ("APRS_BEST_EFFORT", "0"),
        ]))
        .unwrap();
        assert!(!config.best_effort);
        assert_eq!(config.software_name, "aprslink");
    }

    #[test]
    fn invalid_boolean() {
        let err = DecoderConfig::from_lookup(lookup(&[("APRS_BEST_EFFORT", "maybe")])).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }
}
