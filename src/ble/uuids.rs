//! BLE service UUIDs.
//!
//! The thermometer never accepts connections; everything it reports is carried
//! as service data under a single 16-bit vendor service.

use uuid::Uuid;

/// Service data UUID under which DINUSO thermometers broadcast their payload.
pub const DINUSO_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_ae65_0000_1000_8000_00805f9b34fb);

/// Bluetooth SIG base UUID, used to expand 16-bit short UUIDs.
const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_00805f9b34fb;

/// Expand a 16-bit short service UUID onto the Bluetooth base UUID.
pub const fn short_uuid(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Check if a service UUID is the DINUSO payload service.
pub fn is_dinuso_service(uuid: &Uuid) -> bool {
    *uuid == DINUSO_SERVICE_UUID
}
