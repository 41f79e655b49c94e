//! APRS-IS login credentials.

use aprslink_models::Station;

use crate::error::SdkError;
use crate::passcode::passcode;

/// Passcode sent by stations that only want to receive.
pub const RECEIVE_ONLY: i32 = -1;

/// Credentials used to log in to an APRS-IS server.
///
/// * `callsign` – Login station, SSID included.
/// * `passcode` – Passcode for the base callsign, or [`RECEIVE_ONLY`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credentials {
    /// Login station.
    pub callsign: Station,
    /// APRS-IS passcode.
    pub passcode: i32,
}

impl Credentials {
    /// Credentials for `callsign` with its computed passcode.
    pub fn new(callsign: &str) -> Result<Self, SdkError> {
        let station: Station = callsign
            .parse()
            .map_err(|_| SdkError::InvalidCallsign(callsign.to_string()))?;
        Ok(Self {
            passcode: i32::from(passcode(callsign)),
            callsign: station,
        })
    }

    /// Receive-only credentials for `callsign`.
    pub fn receive_only(callsign: &str) -> Result<Self, SdkError> {
        let mut credentials = Self::new(callsign)?;
        credentials.passcode = RECEIVE_ONLY;
        Ok(credentials)
    }

    /// `true` when the server will accept packets sent with these credentials.
    pub fn can_transmit(&self) -> bool {
        self.passcode != RECEIVE_ONLY
    }

    /// The `user` line sent to the server after connecting.
    pub fn login_line(&self, software: &str, version: &str, filter: Option<&str>) -> String {
        let mut line = format!(
            "user {} pass {} vers {} {}",
            self.callsign, self.passcode, software, version
        );
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            line.push_str(" filter ");
            line.push_str(filter);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_passcode() {
        let credentials = Credentials::new("N0CALL-10").unwrap();
        assert_eq!(credentials.callsign.to_string(), "N0CALL-10");
        assert_eq!(credentials.passcode, 13023);
        assert!(credentials.can_transmit());
    }

    #[test]
    fn receive_only_login() {
        let credentials = Credentials::receive_only("XX1XX").unwrap();
        assert!(!credentials.can_transmit());
        assert_eq!(
            credentials.login_line("aprslink", "0.1.0", Some("r/49/-72/50")),
            "user XX1XX pass -1 vers aprslink 0.1.0 filter r/49/-72/50"
        );
    }

    #[test]
    fn login_without_filter() {
        let credentials = Credentials::new("XX1XX").unwrap();
        assert_eq!(
            credentials.login_line("aprslink", "0.1.0", None),
            "user XX1XX pass 17122 vers aprslink 0.1.0"
        );
    }

    #[test]
    fn invalid_callsign() {
        assert!(matches!(
            Credentials::new("NOT A CALL"),
            Err(SdkError::InvalidCallsign(_))
        ));
    }

    #[test]
    fn serde_shape() {
        let credentials = Credentials::new("N0CALL").unwrap();
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["passcode"], 13023);
        let back: Credentials = serde_json::from_value(json).unwrap();
        assert_eq!(back, credentials);
    }
}
