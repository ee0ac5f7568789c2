//! Error types for the dinuso-rust-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth is not available")]
    BluetoothUnavailable,

    /// The advertisement source could not be started or refused a listener.
    #[error("Advertisement source unavailable: {reason}")]
    SourceUnavailable {
        /// Why the source could not provide a listener.
        reason: String,
    },

    /// A thermometer payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// A device address did not look like a MAC address.
    #[error("Invalid device address: {address}")]
    InvalidAddress {
        /// The rejected address text.
        address: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors produced by the payload decoder.
///
/// These never escape the aggregator: a bad advertisement is logged and
/// dropped without touching the current snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The service data is shorter than the fixed temperature header.
    #[error("Payload too short: {len} bytes (need at least {min})")]
    TooShort {
        /// Length of the rejected payload.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// The payload was long enough but produced an unusable value.
    #[error("Malformed payload: {context}")]
    Malformed {
        /// What went wrong.
        context: String,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
