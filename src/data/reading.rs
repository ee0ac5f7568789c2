//! Decoded thermometer readings.

/// Volts per unit of the raw battery byte.
pub const BATTERY_VOLTS_PER_UNIT: f64 = 0.03125;

/// Number of bars shown for a full battery.
pub const MAX_BATTERY_BARS: u8 = 3;

/// One decoded advertisement payload.
///
/// Derived purely from the payload bytes; it carries no notion of time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedReading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Temperature rounded to the nearest degree (ties to even).
    pub temperature_int: i32,
    /// Raw 16-bit sensor value.
    pub raw_value: u16,
    /// Battery level in bars (0-3).
    pub battery_bars: u8,
    /// Battery level in percent (0-100).
    pub battery_percent: u8,
}

impl DecodedReading {
    /// Temperature in degrees Fahrenheit.
    pub fn temperature_fahrenheit(&self) -> f64 {
        crate::utils::celsius_to_fahrenheit(self.temperature)
    }
}

/// Convert the raw battery byte to volts.
pub fn battery_voltage(raw: u8) -> f64 {
    f64::from(raw) * BATTERY_VOLTS_PER_UNIT
}

/// Map a battery voltage to bars.
///
/// Thresholds are inclusive: 2.0 V and above is full, 1.7 V two bars,
/// 1.5 V one bar.
pub fn battery_bars(voltage: f64) -> u8 {
    if voltage >= 2.0 {
        3
    } else if voltage >= 1.7 {
        2
    } else if voltage >= 1.5 {
        1
    } else {
        0
    }
}

/// Convert bars to percent: `round(bars / 3 * 100)`, i.e. 0, 33, 67 or 100.
pub fn battery_percent(bars: u8) -> u8 {
    let bars = bars.min(MAX_BATTERY_BARS);
    (f64::from(bars) / f64::from(MAX_BATTERY_BARS) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_voltage() {
        assert!((battery_voltage(0x50) - 2.5).abs() < 1e-12);
        assert!((battery_voltage(64) - 2.0).abs() < 1e-12);
        assert_eq!(battery_voltage(0), 0.0);
    }

    #[test]
    fn test_battery_bars_boundaries() {
        assert_eq!(battery_bars(2.5), 3);
        assert_eq!(battery_bars(2.0), 3);
        assert_eq!(battery_bars(1.99999), 2);
        assert_eq!(battery_bars(1.7), 2);
        assert_eq!(battery_bars(1.69999), 1);
        assert_eq!(battery_bars(1.5), 1);
        assert_eq!(battery_bars(1.49999), 0);
        assert_eq!(battery_bars(0.0), 0);
    }

    #[test]
    fn test_battery_percent() {
        assert_eq!(battery_percent(0), 0);
        assert_eq!(battery_percent(1), 33);
        assert_eq!(battery_percent(2), 67);
        assert_eq!(battery_percent(3), 100);
        assert_eq!(battery_percent(7), 100);
    }

    #[test]
    fn test_temperature_fahrenheit() {
        let reading = DecodedReading {
            temperature: 100.0,
            temperature_int: 100,
            raw_value: 2401,
            battery_bars: 3,
            battery_percent: 100,
        };
        assert!((reading.temperature_fahrenheit() - 212.0).abs() < 0.001);
    }
}
