//! APRS-IS login passcodes.
//!
//! The passcode is a 15-bit hash of the base callsign: upper-cased, SSID
//! removed, folded two bytes at a time into an accumulator seeded with
//! `0x73e2`.

const SEED: u16 = 0x73e2;

/// Compute the APRS-IS passcode for `callsign`.
///
/// # Examples
///
/// ```
/// use aprslink_sdk::passcode;
///
/// assert_eq!(passcode("N0CALL"), 13023);
/// assert_eq!(passcode("n0call-9"), 13023);
/// ```
pub fn passcode(callsign: &str) -> u16 {
    let base = callsign
        .split_once('-')
        .map_or(callsign, |(base, _)| base)
        .to_ascii_uppercase();

    let mut hash = SEED;
    for pair in base.as_bytes().chunks(2) {
        hash ^= u16::from(pair[0]) << 8;
        if let Some(&lo) = pair.get(1) {
            hash ^= u16::from(lo);
        }
    }
    hash & 0x7fff
}

/// `true` when `code` is the passcode for `callsign`.
pub fn verify_passcode(callsign: &str, code: i32) -> bool {
    i32::from(passcode(callsign)) == code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_passcodes() {
        assert_eq!(passcode("N0CALL"), 13023);
        assert_eq!(passcode("XX1XX"), 17122);
        assert_eq!(passcode("VE6LY"), 19179);
    }

    #[test]
    fn ssid_and_case_are_ignored() {
        assert_eq!(passcode("xx1xx-15"), passcode("XX1XX"));
    }

    #[test]
    fn verify() {
        assert!(verify_passcode("N0CALL-1", 13023));
        assert!(!verify_passcode("N0CALL", 13024));
        assert!(!verify_passcode("N0CALL", -1));
    }
}
