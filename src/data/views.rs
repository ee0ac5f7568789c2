//! Read-only sensor views over a snapshot.
//!
//! A dashboard or home-automation bridge usually wants one entity per value.
//! [`project`] splits a [`ConnectionSnapshot`] into those entities; every view
//! carries one named scalar plus the shared `connected` flag.

use std::collections::BTreeMap;

use crate::config::ThermometerConfig;
use crate::data::snapshot::ConnectionSnapshot;

/// The values a thermometer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// Temperature in °C.
    Temperature,
    /// Temperature in whole °C.
    TemperatureInt,
    /// Battery in percent.
    BatteryLevel,
    /// Battery in bars.
    BatteryBars,
    /// Signal strength in dBm.
    Rssi,
    /// Link quality label.
    ConnectionQuality,
    /// Connectivity flag.
    Connected,
}

impl SensorKind {
    /// Every kind, in display order.
    pub const ALL: [SensorKind; 7] = [
        Self::Temperature,
        Self::TemperatureInt,
        Self::BatteryLevel,
        Self::BatteryBars,
        Self::Rssi,
        Self::ConnectionQuality,
        Self::Connected,
    ];

    /// Stable key, used in unique IDs and restored state.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::TemperatureInt => "temperature_int",
            Self::BatteryLevel => "battery_level",
            Self::BatteryBars => "battery_bars",
            Self::Rssi => "rssi",
            Self::ConnectionQuality => "connection_quality",
            Self::Connected => "connected",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::TemperatureInt => "Temperature (Integer)",
            Self::BatteryLevel => "Battery Level",
            Self::BatteryBars => "Battery Bars",
            Self::Rssi => "Signal Strength",
            Self::ConnectionQuality => "Connection Quality",
            Self::Connected => "Connected",
        }
    }

    /// Unit of measurement, if any.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Temperature | Self::TemperatureInt => Some("°C"),
            Self::BatteryLevel => Some("%"),
            Self::Rssi => Some("dBm"),
            Self::BatteryBars | Self::ConnectionQuality | Self::Connected => None,
        }
    }

    /// Look up a kind by its key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A single exposed value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorValue {
    /// A measurement with a fractional part.
    Float(f64),
    /// A whole-number measurement.
    Int(i64),
    /// A label.
    Text(String),
    /// An on/off state.
    Bool(bool),
}

impl std::fmt::Display for SensorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", if *v { "on" } else { "off" }),
        }
    }
}

/// One entity's view of the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorView {
    /// Which value this view exposes.
    pub kind: SensorKind,
    /// `{address}_{key}`.
    pub unique_id: String,
    /// Display name.
    pub name: &'static str,
    /// Name of the device this view belongs to.
    pub device_name: String,
    /// Unit of measurement.
    pub unit: Option<&'static str>,
    /// Current value (`None` until any data exists).
    pub value: Option<SensorValue>,
    /// Whether consumers should treat the value as current.
    pub available: bool,
    /// Icon hint.
    pub icon: Option<&'static str>,
    /// Suggested number of decimals when displaying.
    pub display_precision: Option<u8>,
    /// Whether the view should be shown without opting in.
    pub enabled_by_default: bool,
    /// Extra state attributes.
    pub attributes: BTreeMap<&'static str, String>,
}

impl SensorView {
    /// Project a single value out of `snapshot`.
    pub fn project(
        kind: SensorKind,
        snapshot: &ConnectionSnapshot,
        config: &ThermometerConfig,
    ) -> Self {
        let address = config.target_address.as_deref().unwrap_or("unknown");
        let mut attributes = BTreeMap::new();

        let (value, icon, display_precision) = match kind {
            SensorKind::Temperature | SensorKind::TemperatureInt => {
                if let Some(last_seen) = snapshot.last_seen {
                    attributes.insert("last_updated", last_seen.to_rfc3339());
                }
                if let Some(raw) = snapshot.raw_value {
                    attributes.insert("raw_value", raw.to_string());
                }
                if kind == SensorKind::Temperature {
                    (snapshot.temperature.map(SensorValue::Float), None, Some(1))
                } else {
                    let value = snapshot
                        .temperature_int
                        .map(|t| SensorValue::Int(i64::from(t)));
                    (value, None, None)
                }
            }
            SensorKind::BatteryLevel => {
                if let Some(bars) = snapshot.battery_bars {
                    attributes.insert("battery_bars", bars.to_string());
                }
                let value = snapshot
                    .battery_percent
                    .map(|p| SensorValue::Int(i64::from(p)));
                (value, None, None)
            }
            SensorKind::BatteryBars => {
                let value = snapshot.battery_bars.map(|b| SensorValue::Int(i64::from(b)));
                (value, Some(battery_icon(snapshot.battery_bars)), None)
            }
            SensorKind::Rssi => (
                snapshot.rssi.map(|r| SensorValue::Int(i64::from(r))),
                None,
                None,
            ),
            SensorKind::ConnectionQuality => (
                Some(SensorValue::Text(snapshot.connection_quality.to_string())),
                Some(snapshot.connection_quality.icon()),
                None,
            ),
            SensorKind::Connected => {
                if let Some(last_seen) = snapshot.last_seen {
                    attributes.insert("last_seen", last_seen.to_rfc3339());
                }
                if let Some(ref mac) = snapshot.address {
                    attributes.insert("mac_address", mac.clone());
                }
                (Some(SensorValue::Bool(snapshot.connected)), None, None)
            }
        };

        Self {
            kind,
            unique_id: format!("{}_{}", address, kind.key()),
            name: kind.name(),
            device_name: config.device_name.clone(),
            unit: kind.unit(),
            value,
            available: kind == SensorKind::Connected || snapshot.connected,
            icon,
            display_precision,
            enabled_by_default: kind != SensorKind::Rssi,
            attributes,
        }
    }
}

fn battery_icon(bars: Option<u8>) -> &'static str {
    match bars {
        None => "mdi:battery-unknown",
        Some(0) => "mdi:battery-outline",
        Some(1) => "mdi:battery-30",
        Some(2) => "mdi:battery-60",
        Some(3) => "mdi:battery",
        Some(_) => "mdi:battery-unknown",
    }
}

/// Split a snapshot into one view per [`SensorKind`].
pub fn project(snapshot: &ConnectionSnapshot, config: &ThermometerConfig) -> Vec<SensorView> {
    SensorKind::ALL
        .into_iter()
        .map(|kind| SensorView::project(kind, snapshot, config))
        .collect()
}
