use chrono::{DateTime, TimeZone, Utc};

use crate::ble::advertising::RawAdvertisement;
use crate::ble::uuids::DINUSO_SERVICE_UUID;
use crate::protocol::BatteryLayout;

/// A stable device address for unit tests.
pub const TEST_ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

/// A second device address for filtering tests.
pub const OTHER_ADDRESS: &str = "11:22:33:44:55:66";

/// Fixed start time for deterministic clocks.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Build a payload carrying `raw_value`, optionally with a battery byte.
///
/// Without a battery byte the payload stops right after the temperature.
pub fn encode_payload(raw_value: u16, battery: Option<u8>, layout: BatteryLayout) -> Vec<u8> {
    let [low, high] = raw_value.to_le_bytes();
    let mut data = vec![0x01, 0x02, 0x03, 0x04, low, high];
    if let Some(battery) = battery {
        data.resize(layout.offset() + 1, 0);
        data[layout.offset()] = battery;
    }
    data
}

/// Build an advertisement carrying an encoded payload for the DINUSO service.
pub fn advertisement(address: &str, rssi: i16, raw_value: u16, battery: u8) -> RawAdvertisement {
    RawAdvertisement::new(address, rssi, epoch()).with_service_data(
        DINUSO_SERVICE_UUID,
        encode_payload(raw_value, Some(battery), BatteryLayout::Offset7),
    )
}
