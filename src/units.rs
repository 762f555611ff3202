// src/units.rs - Temperature unit conversion

/// Convert a Celsius reading to Fahrenheit.
///
/// The sensor domain is Celsius; the display and log surface is
/// Fahrenheit. Exact affine transform, no rounding here - formatting
/// decides precision.
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}
