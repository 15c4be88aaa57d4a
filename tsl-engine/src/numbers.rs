//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a rank or count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Clamp a percentage to `0..=100` and widen it to f64.
#[must_use]
pub fn percent_to_f64(value: u8) -> f64 {
    f64::from(value.min(100))
}

/// Narrow a JSON percentage to `0..=100`, dropping any fraction.
///
/// Truncation keeps anything short of 100 from counting as a completion.
#[must_use]
pub fn percent_from_f64(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    cast::<f64, u8>(value.clamp(0.0, 100.0).trunc()).unwrap_or(0)
}

/// Round a f64 to `places` decimal digits, half away from zero.
///
/// Non-finite inputs collapse to 0.0 so totals never carry NaN into a sort.
#[must_use]
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let exponent = cast::<u32, i32>(places).unwrap_or(i32::MAX);
    let factor = 10_f64.powi(exponent);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_keeps_requested_places() {
        assert!((round_to_places(1.234_56, 3) - 1.235).abs() < f64::EPSILON);
        assert!((round_to_places(2.0004, 3) - 2.0).abs() < f64::EPSILON);
        assert!((round_to_places(0.5, 0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rounding_handles_non_finite() {
        assert!(round_to_places(f64::NAN, 3).abs() < f64::EPSILON);
        assert!(round_to_places(f64::INFINITY, 3).abs() < f64::EPSILON);
        assert!((round_to_places(f64::MAX, 3) - f64::MAX).abs() < f64::EPSILON);
    }

    #[test]
    fn json_percent_is_truncated_and_clamped() {
        assert_eq!(percent_from_f64(100.0), 100);
        assert_eq!(percent_from_f64(99.99), 99);
        assert_eq!(percent_from_f64(57.5), 57);
        assert_eq!(percent_from_f64(-3.0), 0);
        assert_eq!(percent_from_f64(1e9), 100);
        assert_eq!(percent_from_f64(f64::NAN), 0);
    }

    #[test]
    fn percent_is_clamped() {
        assert!((percent_to_f64(250) - 100.0).abs() < f64::EPSILON);
        assert!((percent_to_f64(42) - 42.0).abs() < f64::EPSILON);
        assert!((usize_to_f64(7) - 7.0).abs() < f64::EPSILON);
    }
}
