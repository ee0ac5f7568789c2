//! Restoring last known values at startup.
//!
//! Hosts typically persist each exposed value as a string. Feeding those back
//! through [`RestoredValues`] lets the display show the previous session's
//! readings until the thermometer is heard again. Restored data is never
//! reported as connected.

use crate::data::snapshot::{ConnectionQuality, ConnectionSnapshot};
use crate::data::views::SensorKind;
use crate::error::{Error, Result};

/// Host placeholders meaning "no value was stored".
const EMPTY_STATES: [&str; 3] = ["", "unknown", "unavailable"];

/// Last known scalar values from a previous session.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestoredValues {
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// Temperature in whole °C.
    pub temperature_int: Option<i32>,
    /// Battery in percent.
    pub battery_percent: Option<u8>,
    /// Battery in bars.
    pub battery_bars: Option<u8>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

impl RestoredValues {
    /// Create an empty set of values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the persistable values of a snapshot.
    pub fn from_snapshot(snapshot: &ConnectionSnapshot) -> Self {
        Self {
            temperature: snapshot.temperature,
            temperature_int: snapshot.temperature_int,
            battery_percent: snapshot.battery_percent,
            battery_bars: snapshot.battery_bars,
            rssi: snapshot.rssi,
        }
    }

    /// Set one field from its serialized form.
    ///
    /// Empty, `unknown` and `unavailable` states leave the field unset.
    /// Kinds that are derived rather than stored (`connection_quality`,
    /// `connected`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the text does not parse or is
    /// out of range for the field.
    pub fn with_field(mut self, kind: SensorKind, text: &str) -> Result<Self> {
        let text = text.trim();
        if EMPTY_STATES.iter().any(|s| s.eq_ignore_ascii_case(text)) {
            return Ok(self);
        }

        let invalid = || Error::InvalidParameter {
            name: kind.key().to_string(),
            value: text.to_string(),
        };

        match kind {
            SensorKind::Temperature => {
                let value: f64 = text.parse().map_err(|_| invalid())?;
                if !value.is_finite() {
                    return Err(invalid());
                }
                self.temperature = Some(value);
            }
            SensorKind::TemperatureInt => {
                self.temperature_int = Some(text.parse().map_err(|_| invalid())?);
            }
            SensorKind::BatteryLevel => {
                let value: u8 = text.parse().map_err(|_| invalid())?;
                if value > 100 {
                    return Err(invalid());
                }
                self.battery_percent = Some(value);
            }
            SensorKind::BatteryBars => {
                let value: u8 = text.parse().map_err(|_| invalid())?;
                if value > crate::data::reading::MAX_BATTERY_BARS {
                    return Err(invalid());
                }
                self.battery_bars = Some(value);
            }
            SensorKind::Rssi => {
                self.rssi = Some(text.parse().map_err(|_| invalid())?);
            }
            SensorKind::ConnectionQuality | SensorKind::Connected => {}
        }

        Ok(self)
    }

    /// Whether nothing was restored.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// A disconnected snapshot showing these values.
    pub fn to_snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            connected: false,
            temperature: self.temperature,
            temperature_int: self.temperature_int,
            raw_value: None,
            battery_bars: self.battery_bars,
            battery_percent: self.battery_percent,
            rssi: self.rssi,
            connection_quality: ConnectionQuality::Disconnected,
            last_seen: None,
            address: None,
        }
    }
}
