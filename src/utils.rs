//! Utility functions for the dinuso-rust-ble crate.

/// Convert Celsius to Fahrenheit.
///
/// # Example
///
/// ```
/// use dinuso_rust_ble::celsius_to_fahrenheit;
///
/// let fahrenheit = celsius_to_fahrenheit(100.0);
/// assert!((fahrenheit - 212.0).abs() < 0.001);
/// ```
#[inline]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Convert Fahrenheit to Celsius.
///
/// # Example
///
/// ```
/// use dinuso_rust_ble::fahrenheit_to_celsius;
///
/// let celsius = fahrenheit_to_celsius(212.0);
/// assert!((celsius - 100.0).abs() < 0.001);
/// ```
#[inline]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Round to the nearest integer, ties to even (banker's rounding).
///
/// Returns `None` for non-finite input or results outside the `i32` range.
///
/// # Example
///
/// ```
/// use dinuso_rust_ble::utils::round_half_even;
///
/// assert_eq!(round_half_even(2.5), Some(2));
/// assert_eq!(round_half_even(3.5), Some(4));
/// assert_eq!(round_half_even(-49.5), Some(-50));
/// ```
pub fn round_half_even(value: f64) -> Option<i32> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round_ties_even();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return None;
    }
    Some(rounded as i32)
}
