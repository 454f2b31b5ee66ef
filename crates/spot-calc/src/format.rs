/// Number of decimal places kept in a rendered result.
pub const ROUNDING_PRECISION: i32 = 10;

const ROUNDING_FACTOR: f64 = 1e10;

/// Rounds to the nearest integer, halves toward positive infinity.
///
/// `x - x.floor()` is exact for every finite `x`, so there is no
/// `0.49999999999999994 + 0.5` style carry into the next integer.
#[inline]
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Rounds to [`ROUNDING_PRECISION`] decimal places, halves toward positive
/// infinity (`-0.5` units round to zero, `-1.5` to `-1`).
///
/// Values too large to scale are returned untouched, they carry no fractional
/// noise worth removing anyway. Negative zero collapses to zero.
pub fn round_result(value: f64) -> f64 {
    let scaled = value * ROUNDING_FACTOR;
    let rounded = if scaled.is_finite() {
        round_half_up(scaled) / ROUNDING_FACTOR
    } else {
        value
    };

    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Renders a finite value as its shortest decimal representation.
#[inline]
pub fn format_result(value: f64) -> String {
    value.to_string()
}
