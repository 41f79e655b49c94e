#![deny(missing_docs)]

//! # APRSlink SDK
//!
//! Helpers for feeding APRS-IS traffic through [`aprslink_models`].
//!
//! The SDK provides:
//!
//! * [`passcode()`] and [`verify_passcode`]: the APRS-IS login hash.
//! * [`Credentials`]: login station, passcode and the `user` line.
//! * [`DecoderConfig`]: settings loaded from the environment.
//! * [`PacketDecoder`]: line decoding, strict or best-effort.
//! * [`SdkError`]: unified error type for all SDK operations.
//!
//! The core crate is re-exported as [`aprslink_models`].
//!
//! # Quick start
//!
//! ```rust
//! use aprslink_sdk::{Credentials, DecoderConfig, PacketDecoder};
//!
//! let credentials = Credentials::new("N0CALL-10").unwrap();
//! assert_eq!(
//!     credentials.login_line("aprslink", "0.1.0", None),
//!     "user N0CALL-10 pass 13023 vers aprslink 0.1.0"
//! );
//!
//! let decoder = PacketDecoder::new(DecoderConfig::default());
//! let packet = decoder.decode_line("N0CALL>APRS:>Hello\r\n").unwrap().unwrap();
//! assert_eq!(packet.encode().unwrap(), "N0CALL>APRS:>Hello");
//! ```

pub mod config;
pub mod credentials;
pub mod decoder;
pub mod error;
pub mod passcode;

pub use aprslink_models;
pub use config::DecoderConfig;
pub use credentials::{Credentials, RECEIVE_ONLY};
pub use decoder::PacketDecoder;
pub use error::SdkError;
pub use passcode::{passcode, verify_passcode};

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Does nothing if a global subscriber is already set.
///
/// ```rust
/// aprslink_sdk::init_tracing();
/// // A second call keeps the first subscriber.
/// aprslink_sdk::init_tracing();
/// tracing::info!("subscriber installed");
/// ```
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        let packet = PacketDecoder::default()
            .decode_line("N0CALL>APRS:$GPRMC,bogus")
            .unwrap()
            .unwrap();
        assert_eq!(packet.data_type_id(), Some('$'));
    }
}
