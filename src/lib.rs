// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # dinuso-rust-ble
//!
//! A passive Bluetooth Low Energy listener for DINUSO meat thermometers.
//!
//! The thermometer never accepts connections. It broadcasts its probe
//! temperature and battery level as service data in every advertisement,
//! and this library turns that stream into a single connection snapshot
//! with liveness tracking.
//!
//! ## Features
//!
//! - **Payload Decoding**: Temperature and battery level from service data
//! - **Liveness Tracking**: A device that goes quiet is reported disconnected
//!   while its last reading stays available
//! - **Signal Quality**: RSSI classified into Excellent, Good, Fair and Poor
//! - **Sensor Views**: One entry per value for dashboards and home automation
//! - **Pluggable Sources**: Scan with btleplug or feed advertisements yourself
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dinuso_rust_ble::{BtleplugSource, Result, ThermometerConfig, ThermometerMonitor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Listen to the first thermometer heard
//!     let source = Arc::new(BtleplugSource::new().await?);
//!     let monitor = ThermometerMonitor::new(ThermometerConfig::default(), source)?;
//!     monitor.start().await?;
//!
//!     let mut updates = monitor.subscribe();
//!     while let Ok(snapshot) = updates.recv().await {
//!         if let Some(temperature) = snapshot.temperature {
//!             println!("{:.1}°C ({})", temperature, snapshot.connection_quality);
//!         }
//!     }
//!
//!     monitor.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Add `NSBluetoothAlwaysUsageDescription`
//! to your Info.plist for bundled apps. CoreBluetooth hides MAC addresses,
//! so devices are identified by their platform UUID instead.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod aggregator;
pub mod ble;
pub mod callback;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod protocol;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-exports for convenience
pub use aggregator::{IngestOutcome, LivenessAggregator};
pub use callback::CallbackHandle;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ThermometerConfig;
pub use error::{DecodeError, Error, Result};
pub use monitor::ThermometerMonitor;
pub use utils::{celsius_to_fahrenheit, fahrenheit_to_celsius};

// Re-export commonly used types from submodules
pub use ble::{
    AdvertisementSource, AdvertisementStream, BtleplugSource, ChannelSource, RawAdvertisement,
    DINUSO_SERVICE_UUID,
};
pub use data::{
    ConnectionQuality, ConnectionSnapshot, DecodedReading, RestoredValues, SensorKind,
    SensorValue, SensorView,
};
pub use protocol::{decode, decode_with_layout, BatteryLayout};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<ThermometerMonitor>();
        let _ = std::any::TypeId::of::<LivenessAggregator>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<ConnectionSnapshot>();
        let _ = std::any::TypeId::of::<DecodedReading>();
        let _ = std::any::TypeId::of::<SensorView>();
        let _ = std::any::TypeId::of::<ChannelSource>();
    }

    #[test]
    fn test_temperature_conversion() {
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 0.001);
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 0.001);
    }
}
