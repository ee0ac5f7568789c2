//! The externally visible thermometer state.

use chrono::{DateTime, Utc};

use crate::data::reading::DecodedReading;

/// RSSI at or above which the link is rated excellent (dBm).
pub const RSSI_EXCELLENT: i16 = -50;
/// RSSI at or above which the link is rated good (dBm).
pub const RSSI_GOOD: i16 = -70;
/// RSSI at or above which the link is rated fair (dBm).
pub const RSSI_FAIR: i16 = -85;

/// Link quality label derived from signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionQuality {
    /// -50 dBm or better.
    Excellent,
    /// -70 dBm or better.
    Good,
    /// -85 dBm or better.
    Fair,
    /// Weaker than -85 dBm.
    Poor,
    /// No fresh advertisement within the device timeout.
    #[default]
    Disconnected,
}

impl ConnectionQuality {
    /// Rate a live signal strength.
    pub fn from_rssi(rssi: i16) -> Self {
        if rssi >= RSSI_EXCELLENT {
            Self::Excellent
        } else if rssi >= RSSI_GOOD {
            Self::Good
        } else if rssi >= RSSI_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Get the label as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Disconnected => "Disconnected",
        }
    }

    /// Material Design icon for this label.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Excellent => "mdi:signal-cellular-3",
            Self::Good => "mdi:signal-cellular-2",
            Self::Fair => "mdi:signal-cellular-1",
            Self::Poor => "mdi:signal-cellular-outline",
            Self::Disconnected => "mdi:signal-off",
        }
    }
}

impl std::fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consumer-facing state of one thermometer.
///
/// Once a reading has been accepted its fields stay populated even while
/// `connected` is false; only `connected` and `connection_quality` change
/// when the device goes quiet.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionSnapshot {
    /// Whether a valid advertisement arrived within the device timeout.
    pub connected: bool,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Temperature rounded to whole degrees Celsius.
    pub temperature_int: Option<i32>,
    /// Raw sensor value behind `temperature`.
    pub raw_value: Option<u16>,
    /// Battery level in bars (0-3).
    pub battery_bars: Option<u8>,
    /// Battery level in percent.
    pub battery_percent: Option<u8>,
    /// Signal strength of the last accepted advertisement (dBm).
    pub rssi: Option<i16>,
    /// Link quality label.
    pub connection_quality: ConnectionQuality,
    /// When the last accepted advertisement arrived.
    pub last_seen: Option<DateTime<Utc>>,
    /// Address of the device the data came from.
    pub address: Option<String>,
}

impl ConnectionSnapshot {
    /// Build a connected snapshot from a freshly accepted reading.
    pub fn live(
        reading: &DecodedReading,
        rssi: i16,
        address: impl Into<String>,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            connected: true,
            temperature: Some(reading.temperature),
            temperature_int: Some(reading.temperature_int),
            raw_value: Some(reading.raw_value),
            battery_bars: Some(reading.battery_bars),
            battery_percent: Some(reading.battery_percent),
            rssi: Some(rssi),
            connection_quality: ConnectionQuality::from_rssi(rssi),
            last_seen: Some(seen_at),
            address: Some(address.into()),
        }
    }

    /// The same data marked stale.
    pub fn into_disconnected(mut self) -> Self {
        self.connected = false;
        self.connection_quality = ConnectionQuality::Disconnected;
        self
    }

    /// Whether any reading (live or restored) is present.
    pub fn has_data(&self) -> bool {
        self.temperature.is_some()
    }

    /// The reading fields, if all of them are present.
    pub fn reading(&self) -> Option<DecodedReading> {
        Some(DecodedReading {
            temperature: self.temperature?,
            temperature_int: self.temperature_int?,
            raw_value: self.raw_value?,
            battery_bars: self.battery_bars?,
            battery_percent: self.battery_percent?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{epoch, TEST_ADDRESS};
    use pretty_assertions::assert_eq;

    fn reading() -> DecodedReading {
        DecodedReading {
            temperature: 21.9375,
            temperature_int: 22,
            raw_value: 1152,
            battery_bars: 2,
            battery_percent: 67,
        }
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(ConnectionQuality::from_rssi(-30), ConnectionQuality::Excellent);
        assert_eq!(ConnectionQuality::from_rssi(-50), ConnectionQuality::Excellent);
        assert_eq!(ConnectionQuality::from_rssi(-51), ConnectionQuality::Good);
        assert_eq!(ConnectionQuality::from_rssi(-60), ConnectionQuality::Good);
        assert_eq!(ConnectionQuality::from_rssi(-70), ConnectionQuality::Good);
        assert_eq!(ConnectionQuality::from_rssi(-85), ConnectionQuality::Fair);
        assert_eq!(ConnectionQuality::from_rssi(-86), ConnectionQuality::Poor);
        assert_eq!(ConnectionQuality::from_rssi(-90), ConnectionQuality::Poor);
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(ConnectionQuality::Good.to_string(), "Good");
        assert_eq!(ConnectionQuality::Disconnected.to_string(), "Disconnected");
        assert_eq!(ConnectionQuality::Poor.icon(), "mdi:signal-cellular-outline");
    }

    #[test]
    fn test_default_is_empty_and_disconnected() {
        let snapshot = ConnectionSnapshot::default();
        assert!(!snapshot.connected);
        assert!(!snapshot.has_data());
        assert_eq!(snapshot.connection_quality, ConnectionQuality::Disconnected);
        assert_eq!(snapshot.reading(), None);
    }

    #[test]
    fn test_disconnect_keeps_reading_fields() {
        let live = ConnectionSnapshot::live(&reading(), -60, TEST_ADDRESS, epoch());
        assert!(live.connected);
        assert_eq!(live.connection_quality, ConnectionQuality::Good);

        let stale = live.clone().into_disconnected();
        assert_eq!(
            stale,
            ConnectionSnapshot {
                connected: false,
                connection_quality: ConnectionQuality::Disconnected,
                ..live
            }
        );
        assert_eq!(stale.reading(), Some(reading()));
    }
}
