//! Nearest-rank percentiles over response-time samples.

use crate::number;
use runlens_common::PercentilePoint;
use serde::Serialize;

/// Nearest-rank percentile of an ascending slice.
///
/// Returns the sample at rank `ceil(p/100 * n) - 1`, clamped to `[0, n-1]`,
/// without interpolation. `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as i64 - 1;
    let idx = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    Some(sorted[idx])
}

/// Sort samples ascending in place.
pub fn sort_samples(samples: &mut [f64]) {
    samples.sort_by(|a, b| a.total_cmp(b));
}

/// p50/p90/p95/p99 of one sample set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PercentileSummary {
    #[serde(serialize_with = "number::opt")]
    pub p50: Option<f64>,
    #[serde(serialize_with = "number::opt")]
    pub p90: Option<f64>,
    #[serde(serialize_with = "number::opt")]
    pub p95: Option<f64>,
    #[serde(serialize_with = "number::opt")]
    pub p99: Option<f64>,
}

impl PercentileSummary {
    /// Summarize an ascending slice.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p50: percentile(sorted, PercentilePoint::P50.percent()),
            p90: percentile(sorted, PercentilePoint::P90.percent()),
            p95: percentile(sorted, PercentilePoint::P95.percent()),
            p99: percentile(sorted, PercentilePoint::P99.percent()),
        }
    }

    pub fn get(&self, point: PercentilePoint) -> Option<f64> {
        match point {
            PercentilePoint::P50 => self.p50,
            PercentilePoint::P90 => self.p90,
            PercentilePoint::P95 => self.p95,
            PercentilePoint::P99 => self.p99,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(PercentileSummary::from_sorted(&[]), PercentileSummary::default());
    }

    #[test]
    fn test_single_sample() {
        for p in [0.1, 50.0, 90.0, 99.0, 100.0] {
            assert_eq!(percentile(&[7.0], p), Some(7.0));
        }
    }

    #[test]
    fn test_nearest_rank_examples() {
        let samples = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&samples, 50.0), Some(20.0));
        assert_eq!(percentile(&samples, 90.0), Some(40.0));
        assert_eq!(percentile(&samples, 100.0), Some(40.0));
        assert_eq!(percentile(&samples, 1.0), Some(10.0));
    }

    #[test]
    fn test_ten_samples() {
        let samples: Vec<f64> = (1..=10).map(|v| v as f64 * 10.0).collect();
        let summary = PercentileSummary::from_sorted(&samples);
        assert_eq!(summary.p50, Some(50.0));
        assert_eq!(summary.p90, Some(90.0));
        assert_eq!(summary.p95, Some(100.0));
        assert_eq!(summary.p99, Some(100.0));
    }

    #[test]
    fn test_sort_samples() {
        let mut samples = vec![30.0, 10.5, 20.0, 10.0];
        sort_samples(&mut samples);
        assert_eq!(samples, vec![10.0, 10.5, 20.0, 30.0]);
    }

    #[test]
    fn test_serializes_integers_without_fraction() {
        let summary = PercentileSummary::from_sorted(&[12.0, 15.5]);
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"p50":12,"p90":15.5,"p95":15.5,"p99":15.5}"#);
    }
}
