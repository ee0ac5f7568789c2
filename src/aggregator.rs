//! Liveness aggregation.
//!
//! The aggregator owns the thermometer's state. Advertisements replace the
//! last valid reading; poll ticks decide whether that reading is still live.
//! Connection status is recomputed from scratch on every tick:
//! `connected = last_seen.is_some() && now - last_seen <= device_timeout`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use crate::ble::advertising::{addresses_match, RawAdvertisement};
use crate::callback::CallbackHandle;
use crate::clock::{Clock, SystemClock};
use crate::config::ThermometerConfig;
use crate::data::{ConnectionSnapshot, DecodedReading, RestoredValues};
use crate::error::{DecodeError, Result};
use crate::protocol::decode_with_layout;

/// What happened to an advertisement handed to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The reading was accepted and published.
    Accepted,
    /// The advertisement came from a device other than the one monitored.
    AddressFiltered,
    /// The advertisement carried no payload for the thermometer service.
    NoServiceData,
    /// The payload could not be decoded.
    DecodeFailed(DecodeError),
}

impl IngestOutcome {
    /// Check if the advertisement changed the snapshot.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// The last reading that passed decoding.
#[derive(Debug, Clone)]
struct LastValid {
    reading: DecodedReading,
    rssi: i16,
    address: String,
}

struct AggregatorState {
    last_valid: Option<LastValid>,
    last_seen: Option<DateTime<Utc>>,
    /// Address adopted when no target is configured.
    locked_address: Option<String>,
    /// Values from a previous session, shown until the first live reading.
    restored: Option<RestoredValues>,
    /// Last computed snapshot.
    current: ConnectionSnapshot,
}

/// Tracks the last valid reading of one thermometer and its liveness.
pub struct LivenessAggregator {
    config: ThermometerConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<AggregatorState>,
    snapshot_tx: broadcast::Sender<ConnectionSnapshot>,
    callback_counter: AtomicU64,
}

impl LivenessAggregator {
    /// Create an aggregator using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ThermometerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an aggregator with an injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_clock(config: ThermometerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let (snapshot_tx, _) = broadcast::channel(config.snapshot_buffer);

        Ok(Self {
            config,
            clock,
            state: Mutex::new(AggregatorState {
                last_valid: None,
                last_seen: None,
                locked_address: None,
                restored: None,
                current: ConnectionSnapshot::default(),
            }),
            snapshot_tx,
            callback_counter: AtomicU64::new(0),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThermometerConfig {
        &self.config
    }

    /// Seed the snapshot with values from a previous session.
    ///
    /// Ignored once a live reading has been accepted. The seeded snapshot is
    /// always disconnected.
    pub fn restore(&self, values: RestoredValues) {
        let mut state = self.state.lock();

        if state.last_valid.is_some() {
            debug!("Ignoring restored values, a live reading is already present");
            return;
        }

        debug!("Restoring last known values: {:?}", values);
        state.current = values.to_snapshot();
        state.restored = Some(values);
        let _ = self.snapshot_tx.send(state.current.clone());
    }

    /// Handle one advertisement.
    ///
    /// Failures are logged and reported through the returned outcome; they
    /// never disturb the current snapshot.
    pub fn on_advertisement(&self, advertisement: &RawAdvertisement) -> IngestOutcome {
        if let Some(ref target) = self.config.target_address {
            if !addresses_match(target, &advertisement.address) {
                trace!("Ignoring advertisement from {}", advertisement.address);
                return IngestOutcome::AddressFiltered;
            }
        }

        if self.config.target_address.is_none() {
            if let Some(ref locked) = self.state.lock().locked_address {
                if !addresses_match(locked, &advertisement.address) {
                    trace!("Ignoring {}, already following {}", advertisement.address, locked);
                    return IngestOutcome::AddressFiltered;
                }
            }
        }

        let Some(payload) = advertisement.payload(&self.config.service_uuid) else {
            return IngestOutcome::NoServiceData;
        };

        trace!(
            "Thermometer payload from {} (rssi {}, received {}): {:02X?}",
            advertisement.address,
            advertisement.rssi,
            advertisement.received_at,
            payload
        );

        let reading = match decode_with_layout(payload, self.config.battery_layout) {
            Ok(reading) => reading,
            Err(e) => {
                match e {
                    DecodeError::TooShort { .. } => {
                        debug!("Discarding payload from {}: {}", advertisement.address, e)
                    }
                    DecodeError::Malformed { .. } => {
                        error!("Failed to decode payload from {}: {}", advertisement.address, e)
                    }
                }
                return IngestOutcome::DecodeFailed(e);
            }
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if self.config.target_address.is_none() {
            match state.locked_address {
                Some(ref locked) if !addresses_match(locked, &advertisement.address) => {
                    trace!(
                        "Ignoring {}, already following {}",
                        advertisement.address,
                        locked
                    );
                    return IngestOutcome::AddressFiltered;
                }
                Some(_) => {}
                None => {
                    info!("Following thermometer {}", advertisement.address);
                    state.locked_address = Some(advertisement.address.clone());
                }
            }
        }

        let now = self.clock.now();
        let was_connected = state.current.connected;

        state.last_valid = Some(LastValid {
            reading,
            rssi: advertisement.rssi,
            address: advertisement.address.clone(),
        });
        state.last_seen = Some(now);
        state.restored = None;
        state.current =
            ConnectionSnapshot::live(&reading, advertisement.rssi, &*advertisement.address, now);

        if !was_connected {
            info!(
                "Thermometer {} connected ({:.1}°C, {})",
                advertisement.address, reading.temperature, state.current.connection_quality
            );
        }

        let _ = self.snapshot_tx.send(state.current.clone());

        IngestOutcome::Accepted
    }

    /// Re-evaluate connection status against the device timeout.
    ///
    /// Subscribers are notified only if the snapshot changed.
    pub fn poll_tick(&self) -> ConnectionSnapshot {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let connected = self.is_fresh(state.last_seen, now);

        let next = match (&state.last_valid, state.last_seen) {
            (Some(last), Some(seen)) => {
                let live =
                    ConnectionSnapshot::live(&last.reading, last.rssi, last.address.clone(), seen);
                if connected {
                    live
                } else {
                    live.into_disconnected()
                }
            }
            _ => state
                .restored
                .as_ref()
                .map(RestoredValues::to_snapshot)
                .unwrap_or_default(),
        };

        if next != state.current {
            if state.current.connected && !next.connected {
                info!(
                    "Thermometer {} disconnected, no advertisement for {:?}",
                    next.address.as_deref().unwrap_or("unknown"),
                    self.config.device_timeout
                );
            }
            state.current = next;
            let _ = self.snapshot_tx.send(state.current.clone());
        } else {
            trace!("Poll tick, connected={}", state.current.connected);
        }

        state.current.clone()
    }

    fn is_fresh(&self, last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(seen) = last_seen else {
            return false;
        };

        let elapsed = now.signed_duration_since(seen);
        match chrono::Duration::from_std(self.config.device_timeout) {
            Ok(timeout) => elapsed <= timeout,
            // Timeout beyond chrono's range never expires.
            Err(_) => true,
        }
    }

    /// Get the last computed snapshot.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.lock().current.clone()
    }

    /// Check if the last computed snapshot is connected.
    pub fn is_connected(&self) -> bool {
        self.state.lock().current.connected
    }

    /// Address adopted when no target address is configured.
    pub fn locked_address(&self) -> Option<String> {
        self.state.lock().locked_address.clone()
    }

    /// Subscribe to snapshot changes.
    ///
    /// Each subscriber has a bounded queue; a slow subscriber loses the
    /// oldest snapshots rather than holding up ingestion.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Register a callback for snapshot changes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_snapshot_changed<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ConnectionSnapshot) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.snapshot_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(snapshot) => callback(&snapshot),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Snapshot callback lagged, skipped {} updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }
}

impl std::fmt::Debug for LivenessAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LivenessAggregator")
            .field("target_address", &self.config.target_address)
            .field("locked_address", &state.locked_address)
            .field("connected", &state.current.connected)
            .field("last_seen", &state.last_seen)
            .finish()
    }
}
