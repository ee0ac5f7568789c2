//! Service data payload decoding.
//!
//! The thermometer broadcasts a short vendor payload under the
//! [`DINUSO_SERVICE_UUID`](crate::ble::uuids::DINUSO_SERVICE_UUID) service:
//!
//! | Offset | Size | Meaning                                   |
//! |--------|------|-------------------------------------------|
//! | 0-3    | 4    | Unused by this decoder                    |
//! | 4-5    | 2    | Temperature sensor value (little-endian)  |
//! | 7      | 1    | Battery, 1/32 V per unit (current layout) |
//! | 11     | 1    | Battery, 1/32 V per unit (legacy layout)  |
//!
//! Temperature is `raw * 0.0625 - 50.0625` °C. The battery byte is optional;
//! a payload that ends before it still yields a valid temperature with an
//! empty battery.

use crate::data::reading::{battery_bars, battery_percent, battery_voltage, DecodedReading};
use crate::error::DecodeError;
use crate::utils::round_half_even;

/// Minimum payload length carrying a temperature.
pub const MIN_PAYLOAD_LEN: usize = 6;

/// Offset of the little-endian temperature value.
const TEMPERATURE_OFFSET: usize = 4;

/// Degrees Celsius per raw unit.
pub const TEMPERATURE_SCALE: f64 = 0.0625;

/// Offset subtracted after scaling, in degrees Celsius.
pub const TEMPERATURE_OFFSET_CELSIUS: f64 = 50.0625;

/// Where the battery byte sits in the payload.
///
/// Two firmware generations exist and the payload does not say which one
/// sent it, so the layout is an explicit configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BatteryLayout {
    /// Battery byte at offset 7 (current firmware).
    #[default]
    Offset7,
    /// Battery byte at offset 11 (early firmware).
    Offset11,
}

impl BatteryLayout {
    /// Byte offset of the battery value.
    pub fn offset(&self) -> usize {
        match self {
            Self::Offset7 => 7,
            Self::Offset11 => 11,
        }
    }
}

/// Convert a raw sensor value to degrees Celsius.
#[inline]
pub fn raw_to_celsius(raw: u16) -> f64 {
    f64::from(raw) * TEMPERATURE_SCALE - TEMPERATURE_OFFSET_CELSIUS
}

/// Decode a payload using the default battery layout.
///
/// # Example
///
/// ```
/// use dinuso_rust_ble::protocol::decode;
///
/// let reading = decode(&[0, 0, 0, 0, 0x10, 0x00, 0, 0x50]).unwrap();
/// assert_eq!(reading.raw_value, 16);
/// assert_eq!(reading.battery_bars, 3);
/// ```
pub fn decode(data: &[u8]) -> Result<DecodedReading, DecodeError> {
    decode_with_layout(data, BatteryLayout::default())
}

/// Decode a payload with an explicit battery layout.
///
/// # Errors
///
/// - [`DecodeError::TooShort`] if the payload is under [`MIN_PAYLOAD_LEN`] bytes.
/// - [`DecodeError::Malformed`] if the payload produces an unusable value.
pub fn decode_with_layout(
    data: &[u8],
    layout: BatteryLayout,
) -> Result<DecodedReading, DecodeError> {
    if data.len() < MIN_PAYLOAD_LEN {
        return Err(DecodeError::TooShort {
            len: data.len(),
            min: MIN_PAYLOAD_LEN,
        });
    }

    let raw_value = data
        .get(TEMPERATURE_OFFSET..TEMPERATURE_OFFSET + 2)
        .and_then(|bytes| <[u8; 2]>::try_from(bytes).ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| DecodeError::Malformed {
            context: "temperature field out of range".to_string(),
        })?;

    let temperature = raw_to_celsius(raw_value);
    let temperature_int = round_half_even(temperature).ok_or_else(|| DecodeError::Malformed {
        context: format!("temperature {} is not representable", temperature),
    })?;

    let (bars, percent) = match data.get(layout.offset()) {
        Some(&raw) => {
            let bars = battery_bars(battery_voltage(raw));
            (bars, battery_percent(bars))
        }
        None => (0, 0),
    };

    Ok(DecodedReading {
        temperature,
        temperature_int,
        raw_value,
        battery_bars: bars,
        battery_percent: percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::encode_payload;
    use proptest::prelude::*;

    #[test]
    fn test_current_layout_scenario() {
        let reading = decode(&[0xAA, 0xBB, 0xCC, 0xDD, 0x10, 0x00, 0xEE, 0x50]).unwrap();

        assert_eq!(reading.raw_value, 16);
        assert!((reading.temperature - (-49.0625)).abs() < 1e-9);
        assert_eq!(reading.temperature_int, -49);
        assert_eq!(reading.battery_bars, 3);
        assert_eq!(reading.battery_percent, 100);
    }

    #[test]
    fn test_legacy_layout_reads_offset_11() {
        let mut data = vec![0u8; 12];
        data[4] = 0x90;
        data[5] = 0x04; // 1168 -> 22.9375 °C
        data[7] = 0x50;
        data[11] = 0x36; // 1.6875 V -> 1 bar

        let current = decode_with_layout(&data, BatteryLayout::Offset7).unwrap();
        let legacy = decode_with_layout(&data, BatteryLayout::Offset11).unwrap();

        assert_eq!(current.battery_bars, 3);
        assert_eq!(legacy.battery_bars, 1);
        assert_eq!(legacy.battery_percent, 33);
        assert_eq!(current.raw_value, legacy.raw_value);
        assert!((legacy.temperature - 22.9375).abs() < 1e-9);
    }

    #[test]
    fn test_missing_battery_byte_is_partial_decode() {
        let reading = decode(&[0, 0, 0, 0, 0x20, 0x03, 0]).unwrap();
        assert_eq!(reading.raw_value, 0x0320);
        assert_eq!(reading.battery_bars, 0);
        assert_eq!(reading.battery_percent, 0);

        let reading = decode_with_layout(&[0u8; 11], BatteryLayout::Offset11).unwrap();
        assert_eq!(reading.battery_bars, 0);
    }

    #[test]
    fn test_battery_boundaries_through_payload() {
        // 1/32 V steps: 64 is exactly 2.0 V, 48 exactly 1.5 V, 55 the first step above 1.7 V.
        let cases = [(64u8, 3u8), (63, 2), (55, 2), (54, 1), (48, 1), (47, 0), (0, 0)];
        for (byte, bars) in cases {
            let reading = decode(&encode_payload(1000, Some(byte), BatteryLayout::Offset7)).unwrap();
            assert_eq!(reading.battery_bars, bars, "battery byte {}", byte);
        }
    }

    #[test]
    fn test_too_short() {
        assert_eq!(decode(&[]), Err(DecodeError::TooShort { len: 0, min: 6 }));
        assert_eq!(
            decode(&[1, 2, 3, 4, 5]),
            Err(DecodeError::TooShort { len: 5, min: 6 })
        );
    }

    #[test]
    fn test_integer_temperature_ties_to_even() {
        let int_temp = |raw| {
            decode(&encode_payload(raw, None, BatteryLayout::Offset7))
                .unwrap()
                .temperature_int
        };

        // 793 -> -0.5, 809 -> 0.5, 825 -> 1.5, 841 -> 2.5
        assert_eq!(int_temp(793), 0);
        assert_eq!(int_temp(809), 0);
        assert_eq!(int_temp(825), 2);
        assert_eq!(int_temp(841), 2);
        // 810 -> 0.5625
        assert_eq!(int_temp(810), 1);
    }

    #[test]
    fn test_extremes() {
        let low = decode(&encode_payload(0, None, BatteryLayout::Offset7)).unwrap();
        assert!((low.temperature - (-50.0625)).abs() < 1e-9);
        assert_eq!(low.temperature_int, -50);

        let high = decode(&encode_payload(u16::MAX, Some(u8::MAX), BatteryLayout::Offset7)).unwrap();
        assert!((high.temperature - 4045.875).abs() < 1e-9);
        assert_eq!(high.temperature_int, 4046);
        assert_eq!(high.battery_bars, 3);
    }

    proptest! {
        #[test]
        fn prop_short_payloads_are_rejected(data in proptest::collection::vec(any::<u8>(), 0..MIN_PAYLOAD_LEN)) {
            let len = data.len();
            prop_assert_eq!(decode(&data), Err(DecodeError::TooShort { len, min: MIN_PAYLOAD_LEN }));
        }

        #[test]
        fn prop_raw_value_and_temperature(data in proptest::collection::vec(any::<u8>(), MIN_PAYLOAD_LEN..32)) {
            let reading = decode(&data).unwrap();
            let expected_raw = u16::from(data[4]) | (u16::from(data[5]) << 8);
            prop_assert_eq!(reading.raw_value, expected_raw);
            let expected_temp = f64::from(expected_raw) * 0.0625 - 50.0625;
            prop_assert!((reading.temperature - expected_temp).abs() < 1e-9);
            prop_assert!(reading.battery_bars <= 3);
            prop_assert!(reading.battery_percent <= 100);
        }

        #[test]
        fn prop_encoded_raw_value_decodes_to_same_temperature(raw in any::<u16>(), battery in proptest::option::of(any::<u8>())) {
            let reading = decode(&encode_payload(raw, battery, BatteryLayout::Offset7)).unwrap();
            prop_assert_eq!(reading.raw_value, raw);
            prop_assert!((reading.temperature - raw_to_celsius(raw)).abs() < 1e-9);
        }
    }
}
