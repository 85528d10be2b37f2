//! Serialization of report numbers.
//!
//! Millisecond samples and percentages are carried as `f64`; whole values are
//! written as JSON integers so `150` stays `150` rather than `150.0`.

use serde::Serializer;

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn num<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let v = *value;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(v as i64)
    } else {
        serializer.serialize_f64(v)
    }
}

pub fn opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => num(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// Round to the nearest integer, halves towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to one decimal place, halves up.
pub fn round1(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// `part / total` as a percentage with one decimal; zero when `total` is zero.
pub fn share_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_half_up(part as f64 / total as f64 * 1000.0) / 10.0
}
