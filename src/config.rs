//! Thermometer configuration.

use std::time::Duration;
use uuid::Uuid;

use crate::ble::advertising::normalize_address;
use crate::ble::uuids::DINUSO_SERVICE_UUID;
use crate::error::{Error, Result};
use crate::protocol::BatteryLayout;

/// Settings for one monitored thermometer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermometerConfig {
    /// Address to listen to. `None` locks onto the first thermometer heard.
    pub target_address: Option<String>,
    /// Service data UUID carrying the payload.
    pub service_uuid: Uuid,
    /// How often connection status is re-evaluated.
    pub poll_interval: Duration,
    /// How long without an advertisement before the device is disconnected.
    pub device_timeout: Duration,
    /// Battery byte position for the monitored firmware.
    pub battery_layout: BatteryLayout,
    /// Display name for the device.
    pub device_name: String,
    /// Snapshots buffered per subscriber before the oldest are dropped.
    pub snapshot_buffer: usize,
}

impl ThermometerConfig {
    /// Default status re-evaluation interval (2 seconds).
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Default device timeout (40 seconds).
    pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(40);

    /// Default device display name.
    pub const DEFAULT_DEVICE_NAME: &'static str = "DINUSO Thermometer";

    /// Default per-subscriber snapshot buffer.
    pub const DEFAULT_SNAPSHOT_BUFFER: usize = 32;

    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept advertisements from `address`.
    ///
    /// An empty string clears the target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `address` is not a MAC address.
    pub fn with_target_address(mut self, address: &str) -> Result<Self> {
        if address.trim().is_empty() {
            self.target_address = None;
            return Ok(self);
        }

        let normalized = normalize_address(address).ok_or_else(|| Error::InvalidAddress {
            address: address.to_string(),
        })?;
        self.target_address = Some(normalized);
        Ok(self)
    }

    /// Set the service data UUID.
    pub fn with_service_uuid(mut self, uuid: Uuid) -> Self {
        self.service_uuid = uuid;
        self
    }

    /// Set the status re-evaluation interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the device timeout.
    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    /// Set the battery byte layout.
    pub fn with_battery_layout(mut self, layout: BatteryLayout) -> Self {
        self.battery_layout = layout;
        self
    }

    /// Set the display name.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the per-subscriber snapshot buffer.
    pub fn with_snapshot_buffer(mut self, capacity: usize) -> Self {
        self.snapshot_buffer = capacity;
        self
    }

    /// Check the configuration for values the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref address) = self.target_address {
            if normalize_address(address).is_none() {
                return Err(Error::InvalidAddress {
                    address: address.clone(),
                });
            }
        }

        if self.poll_interval.is_zero() {
            return Err(Error::InvalidParameter {
                name: "poll_interval".to_string(),
                value: format!("{:?}", self.poll_interval),
            });
        }

        if self.device_timeout.is_zero() {
            return Err(Error::InvalidParameter {
                name: "device_timeout".to_string(),
                value: format!("{:?}", self.device_timeout),
            });
        }

        if self.snapshot_buffer == 0 {
            return Err(Error::InvalidParameter {
                name: "snapshot_buffer".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ThermometerConfig {
    fn default() -> Self {
        Self {
            target_address: None,
            service_uuid: DINUSO_SERVICE_UUID,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            device_timeout: Self::DEFAULT_DEVICE_TIMEOUT,
            battery_layout: BatteryLayout::default(),
            device_name: Self::DEFAULT_DEVICE_NAME.to_string(),
            snapshot_buffer: Self::DEFAULT_SNAPSHOT_BUFFER,
        }
    }
}
