//! Runtime wiring for a monitored thermometer.
//!
//! [`ThermometerMonitor`] registers one listener on an advertisement source,
//! feeds everything it hears to the [`LivenessAggregator`] and drives the
//! poll timer. Stopping it releases the listener but keeps the last snapshot.

use futures::StreamExt;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::aggregator::LivenessAggregator;
use crate::ble::source::AdvertisementSource;
use crate::callback::CallbackHandle;
use crate::clock::{Clock, SystemClock};
use crate::config::ThermometerConfig;
use crate::data::{project, ConnectionSnapshot, RestoredValues, SensorView};
use crate::error::{Error, Result};

/// Monitors one thermometer through an advertisement source.
pub struct ThermometerMonitor {
    /// Where advertisements come from.
    source: Arc<dyn AdvertisementSource>,
    /// State and liveness.
    aggregator: Arc<LivenessAggregator>,
    /// Ingestion task handle.
    ingest_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Poll timer task handle.
    poll_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
    /// Running flag.
    is_running: AtomicBool,
    /// Serializes start and stop.
    lifecycle: tokio::sync::Mutex<()>,
}

impl ThermometerMonitor {
    /// Create a monitor using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ThermometerConfig, source: Arc<dyn AdvertisementSource>) -> Result<Self> {
        Self::with_clock(config, source, Arc::new(SystemClock))
    }

    /// Create a monitor with an injected clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_clock(
        config: ThermometerConfig,
        source: Arc<dyn AdvertisementSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let aggregator = LivenessAggregator::with_clock(config, clock)?;

        Ok(Self {
            source,
            aggregator: Arc::new(aggregator),
            ingest_handle: RwLock::new(None),
            poll_handle: RwLock::new(None),
            is_running: AtomicBool::new(false),
            lifecycle: tokio::sync::Mutex::new(()),
        })
    }

    /// Register with the source and start ingesting and polling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`] if the source refuses a listener.
    pub async fn start(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;

        if self.is_running.load(Ordering::SeqCst) {
            debug!("Monitor already running");
            return Ok(());
        }

        let mut advertisements = self.source.listen().await.map_err(|e| match e {
            Error::SourceUnavailable { .. } => e,
            other => Error::SourceUnavailable {
                reason: other.to_string(),
            },
        })?;

        let config = self.aggregator.config();
        info!(
            "Monitoring {} (timeout {:?}, poll every {:?})",
            config.target_address.as_deref().unwrap_or("first thermometer heard"),
            config.device_timeout,
            config.poll_interval
        );

        self.is_running.store(true, Ordering::SeqCst);

        let aggregator = self.aggregator.clone();
        let ingest = tokio::spawn(async move {
            while let Some(advertisement) = advertisements.next().await {
                aggregator.on_advertisement(&advertisement);
            }
            debug!("Advertisement stream ended");
        });

        let aggregator = self.aggregator.clone();
        let poll_interval = config.poll_interval;
        let poll = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                aggregator.poll_tick();
            }
        });

        for previous in [
            self.ingest_handle.write().replace(ingest),
            self.poll_handle.write().replace(poll),
        ]
        .into_iter()
        .flatten()
        {
            previous.abort();
        }

        Ok(())
    }

    /// Stop ingesting and polling and release the source listener.
    ///
    /// The last snapshot stays available and the monitor can be restarted.
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        if !self.is_running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping thermometer monitor");

        let ingest = self.ingest_handle.write().take();
        let poll = self.poll_handle.write().take();

        for handle in [ingest, poll].into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Check if the monitor is running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Seed the snapshot with values from a previous session.
    pub fn restore(&self, values: RestoredValues) {
        self.aggregator.restore(values);
    }

    /// Get the last computed snapshot.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.aggregator.snapshot()
    }

    /// Get the current snapshot split into per-value views.
    pub fn views(&self) -> Vec<SensorView> {
        project(&self.aggregator.snapshot(), self.aggregator.config())
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ConnectionSnapshot> {
        self.aggregator.subscribe()
    }

    /// Register a callback for snapshot changes.
    pub fn on_snapshot_changed<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&ConnectionSnapshot) + Send + Sync + 'static,
    {
        self.aggregator.on_snapshot_changed(callback)
    }

    /// Get the aggregator.
    pub fn aggregator(&self) -> &Arc<LivenessAggregator> {
        &self.aggregator
    }
}

impl Drop for ThermometerMonitor {
    fn drop(&mut self) {
        for handle in [
            self.ingest_handle.get_mut().take(),
            self.poll_handle.get_mut().take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ThermometerMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThermometerMonitor")
            .field("aggregator", &self.aggregator)
            .field("is_running", &self.is_running())
            .finish()
    }
}
