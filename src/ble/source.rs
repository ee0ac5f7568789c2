//! Advertisement sources.
//!
//! The aggregator does not talk to a radio. It asks an [`AdvertisementSource`]
//! for a stream of [`RawAdvertisement`]s and decides for itself which ones
//! matter, so a source should hand over everything it hears.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, error, info, trace, warn};

use crate::ble::advertising::RawAdvertisement;
use crate::error::{Error, Result};

/// A stream of advertisements. Dropping it releases the listener.
pub type AdvertisementStream = BoxStream<'static, RawAdvertisement>;

/// Buffered advertisements between the scan task and the listener.
const ADVERTISEMENT_BUFFER: usize = 100;

/// Something that can deliver advertisements as they are received.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvertisementSource: Send + Sync {
    /// Register a listener and return its advertisement stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be started.
    async fn listen(&self) -> Result<AdvertisementStream>;
}

/// A source fed by the host application.
///
/// Use this when advertisements already arrive through another BLE stack:
/// call [`publish`](Self::publish) for each one. Every listener gets its own
/// bounded queue; a listener that falls behind loses the oldest entries.
#[derive(Debug, Clone)]
pub struct ChannelSource {
    tx: broadcast::Sender<RawAdvertisement>,
}

impl ChannelSource {
    /// Default per-listener queue depth.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a source with a per-listener queue of `capacity` advertisements.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver an advertisement to every listener.
    ///
    /// Returns the number of listeners it was queued for.
    pub fn publish(&self, advertisement: RawAdvertisement) -> usize {
        self.tx.send(advertisement).unwrap_or(0)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl AdvertisementSource for ChannelSource {
    async fn listen(&self) -> Result<AdvertisementStream> {
        let rx = self.tx.subscribe();

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(advertisement) => return Some((advertisement, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Advertisement listener lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream.boxed())
    }
}

/// Listeners sharing one adapter scan.
///
/// The scan starts with the first listener and stops with the last. Both
/// transitions run under the count lock, so a release finishing late cannot
/// stop a scan that a newer listener depends on.
#[derive(Debug, Clone, Default)]
struct ScanListeners {
    count: Arc<Mutex<usize>>,
}

impl ScanListeners {
    /// Register a listener, running `start` if it is the first.
    async fn acquire<F, Fut>(&self, start: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut count = self.count.lock().await;
        if *count == 0 {
            start().await?;
        }
        *count += 1;
        Ok(())
    }

    /// Unregister a listener, running `stop` if it was the last.
    async fn release<F, Fut>(&self, stop: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut count = self.count.lock().await;
        *count = count.saturating_sub(1);
        if *count == 0 {
            stop().await;
        }
    }
}

/// A source that scans with the platform Bluetooth adapter.
pub struct BtleplugSource {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Active listeners on `adapter`.
    listeners: ScanListeners,
}

impl BtleplugSource {
    /// Create a source using the first Bluetooth adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self::with_adapter(adapter))
    }

    /// Create a source with a specific adapter.
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            listeners: ScanListeners::default(),
        }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Build an advertisement from a peripheral's current properties.
    async fn read_advertisement(
        adapter: &Adapter,
        id: &PeripheralId,
        rssi_cache: &mut HashMap<PeripheralId, i16>,
    ) -> Option<RawAdvertisement> {
        let peripheral = match adapter.peripheral(id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        let properties = match peripheral.properties().await {
            Ok(Some(p)) => p,
            _ => return None,
        };

        if properties.service_data.is_empty() {
            return None;
        }

        // Updates do not always carry RSSI; reuse the last value heard.
        let rssi = match properties.rssi {
            Some(rssi) => {
                rssi_cache.insert(id.clone(), rssi);
                rssi
            }
            None => *rssi_cache.get(id)?,
        };

        // Some platforms hide the MAC and report all zeros.
        let address = if properties.address.into_inner() == [0u8; 6] {
            id.to_string()
        } else {
            properties.address.to_string()
        };

        Some(RawAdvertisement {
            address,
            service_data: properties.service_data,
            rssi,
            received_at: Utc::now(),
        })
    }
}

#[async_trait]
impl AdvertisementSource for BtleplugSource {
    async fn listen(&self) -> Result<AdvertisementStream> {
        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.listeners
            .acquire(|| async {
                info!("Starting BLE scan for DINUSO thermometers");
                self.adapter
                    .start_scan(ScanFilter::default())
                    .await
                    .map_err(Error::Bluetooth)
            })
            .await?;

        let (tx, rx) = mpsc::channel(ADVERTISEMENT_BUFFER);
        let adapter = self.adapter.clone();
        let listeners = self.listeners.clone();

        tokio::spawn(async move {
            let mut rssi_cache = HashMap::new();

            loop {
                let event = tokio::select! {
                    _ = tx.closed() => break,
                    event = events.next() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                let id = match event {
                    CentralEvent::DeviceDiscovered(id)
                    | CentralEvent::DeviceUpdated(id)
                    | CentralEvent::ServiceDataAdvertisement { id, .. } => id,
                    _ => continue,
                };

                let Some(advertisement) =
                    Self::read_advertisement(&adapter, &id, &mut rssi_cache).await
                else {
                    continue;
                };

                if tx.send(advertisement).await.is_err() {
                    break;
                }
            }

            debug!("Scan listener released");
            listeners
                .release(|| async {
                    debug!("Last listener gone, stopping BLE scan");
                    if let Err(e) = adapter.stop_scan().await {
                        error!("Failed to stop BLE scan: {}", e);
                    }
                })
                .await;
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|advertisement| (advertisement, rx))
        });

        Ok(stream.boxed())
    }
}
