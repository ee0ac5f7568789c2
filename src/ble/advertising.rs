//! Raw advertisement events and device addresses.
//!
//! A [`RawAdvertisement`] is what an advertisement source hands to the
//! aggregator: one received broadcast frame, consumed once and never stored.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// A single advertisement frame as delivered by the BLE stack.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAdvertisement {
    /// Device address (MAC-like string, e.g. `AA:BB:CC:DD:EE:FF`).
    pub address: String,
    /// Service data blobs keyed by service UUID.
    pub service_data: HashMap<Uuid, Vec<u8>>,
    /// Received signal strength in dBm.
    pub rssi: i16,
    /// When the frame was received.
    pub received_at: DateTime<Utc>,
}

impl RawAdvertisement {
    /// Create an advertisement with no service data.
    pub fn new(address: impl Into<String>, rssi: i16, received_at: DateTime<Utc>) -> Self {
        Self {
            address: address.into(),
            service_data: HashMap::new(),
            rssi,
            received_at,
        }
    }

    /// Attach a service data blob.
    pub fn with_service_data(mut self, uuid: Uuid, data: impl Into<Vec<u8>>) -> Self {
        self.service_data.insert(uuid, data.into());
        self
    }

    /// Get the payload advertised under `uuid`, if any.
    ///
    /// An empty blob counts as absent.
    pub fn payload(&self, uuid: &Uuid) -> Option<&[u8]> {
        self.service_data
            .get(uuid)
            .map(Vec::as_slice)
            .filter(|data| !data.is_empty())
    }
}

/// Normalise a MAC address to upper case with `:` separators.
///
/// Accepts `:` or `-` separated hex pairs in either case. Returns `None` if
/// the text is not a six-octet MAC address.
///
/// # Example
///
/// ```
/// use dinuso_rust_ble::ble::advertising::normalize_address;
///
/// assert_eq!(
///     normalize_address("aa-bb-cc-dd-ee-ff").as_deref(),
///     Some("AA:BB:CC:DD:EE:FF")
/// );
/// assert_eq!(normalize_address("AA:BB:CC"), None);
/// ```
pub fn normalize_address(address: &str) -> Option<String> {
    let parts: Vec<&str> = address.trim().split([':', '-']).collect();
    if parts.len() != 6 {
        return None;
    }

    let valid = parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return None;
    }

    Some(parts.join(":").to_ascii_uppercase())
}

/// Compare two device addresses ignoring case and separator style.
///
/// Addresses that are not MACs (some platforms hand out opaque identifiers)
/// fall back to a case-insensitive comparison.
pub fn addresses_match(a: &str, b: &str) -> bool {
    match (normalize_address(a), normalize_address(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::{short_uuid, DINUSO_SERVICE_UUID};

    #[test]
    fn test_payload_lookup() {
        let adv = RawAdvertisement::new("AA:BB:CC:DD:EE:FF", -60, Utc::now())
            .with_service_data(DINUSO_SERVICE_UUID, vec![1, 2, 3, 4, 5, 6])
            .with_service_data(short_uuid(0x180f), vec![9]);

        assert_eq!(adv.payload(&DINUSO_SERVICE_UUID), Some(&[1, 2, 3, 4, 5, 6][..]));
        assert_eq!(adv.payload(&short_uuid(0x180a)), None);
    }

    #[test]
    fn test_empty_payload_is_absent() {
        let adv = RawAdvertisement::new("AA:BB:CC:DD:EE:FF", -60, Utc::now())
            .with_service_data(DINUSO_SERVICE_UUID, Vec::new());
        assert_eq!(adv.payload(&DINUSO_SERVICE_UUID), None);
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("aa:bb:cc:dd:ee:ff").as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
        assert_eq!(
            normalize_address(" 01-23-45-67-89-ab ").as_deref(),
            Some("01:23:45:67:89:AB")
        );
        assert_eq!(normalize_address(""), None);
        assert_eq!(normalize_address("AA:BB:CC:DD:EE:GG"), None);
        assert_eq!(normalize_address("AAA:BB:CC:DD:EE:F"), None);
    }

    #[test]
    fn test_addresses_match() {
        assert!(addresses_match("aa:bb:cc:dd:ee:ff", "AA-BB-CC-DD-EE-FF"));
        assert!(!addresses_match("AA:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE:00"));
        assert!(addresses_match(
            "6c3a8f1e-0000-4000-8000-000000000001",
            "6C3A8F1E-0000-4000-8000-000000000001"
        ));
    }
}
