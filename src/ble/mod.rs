//! BLE module.
//!
//! This module provides the advertisement types and the sources that feed
//! them to the aggregator.

pub mod advertising;
pub mod source;
pub mod uuids;

pub use advertising::RawAdvertisement;
pub use source::{AdvertisementSource, AdvertisementStream, BtleplugSource, ChannelSource};
pub use uuids::*;
