//! Data structures for thermometer readings.
//!
//! This module contains the decoded reading, the consumer-facing snapshot,
//! the restore hook and the per-value sensor views.

pub mod reading;
pub mod restore;
pub mod snapshot;
pub mod views;

pub use reading::DecodedReading;
pub use restore::RestoredValues;
pub use snapshot::{ConnectionQuality, ConnectionSnapshot};
pub use views::{project, SensorKind, SensorValue, SensorView};
