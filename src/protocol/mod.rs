//! Protocol module for parsing thermometer payloads.

pub mod payload;

pub use payload::{decode, decode_with_layout, BatteryLayout};
