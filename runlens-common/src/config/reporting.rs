//! Reporting configuration: failure clustering and the head-K concentration gate.

use super::env::EnvParser;
use super::source::ConfigSource;
use serde::{Deserialize, Serialize};

/// Default number of clusters listed in human-readable summaries.
pub const DEFAULT_TOP_N: usize = 10;
/// Default number of head clusters summed for the concentration gate.
pub const DEFAULT_HEAD_K: usize = 3;
/// Default head-K share threshold, in percent.
pub const DEFAULT_HEAD_K_THRESHOLD_PERCENT: f64 = 70.0;
/// Default number of example messages kept per cluster.
pub const DEFAULT_EXAMPLES_PER_CLUSTER: usize = 3;

/// Top-level reporting configuration (`newman-config.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingConfig {
    #[serde(default)]
    pub failure_clusters: FailureClusterConfig,
}

/// Failure clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailureClusterConfig {
    pub top_n: usize,
    pub head_k: usize,
    pub head_k_threshold_percent: f64,
    /// Exit with code 3 when the head-K share reaches the threshold.
    pub fail_on_head_k_threshold_breach: bool,
    pub examples_per_cluster: usize,
    pub normalize_messages: bool,
    pub normalization: NormalizationConfig,
}

impl Default for FailureClusterConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            head_k: DEFAULT_HEAD_K,
            head_k_threshold_percent: DEFAULT_HEAD_K_THRESHOLD_PERCENT,
            fail_on_head_k_threshold_breach: false,
            examples_per_cluster: DEFAULT_EXAMPLES_PER_CLUSTER,
            normalize_messages: true,
            normalization: NormalizationConfig::default(),
        }
    }
}

impl FailureClusterConfig {
    /// `headK` as used by the gate; zero falls back to the default.
    pub fn effective_head_k(&self) -> usize {
        if self.head_k == 0 {
            DEFAULT_HEAD_K
        } else {
            self.head_k
        }
    }

    /// Threshold as used by the gate; zero or non-finite falls back to the default.
    pub fn effective_threshold(&self) -> f64 {
        let t = self.head_k_threshold_percent;
        if t == 0.0 || !t.is_finite() {
            DEFAULT_HEAD_K_THRESHOLD_PERCENT
        } else {
            t
        }
    }

    /// Normalization rules in effect, all off when `normalizeMessages` is false.
    pub fn active_normalization(&self) -> NormalizationConfig {
        if self.normalize_messages {
            self.normalization
        } else {
            NormalizationConfig::disabled()
        }
    }
}

/// Failure message normalization switches.
///
/// The identifier and timestamp rules default on; the network/contact rules
/// default off because they over-match easily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    #[serde(rename = "stripUUID")]
    pub strip_uuid: bool,
    #[serde(rename = "stripHex")]
    pub strip_hex: bool,
    #[serde(rename = "stripNumbersLong")]
    pub strip_numbers_long: bool,
    #[serde(rename = "stripISODateTime")]
    pub strip_iso_date_time: bool,
    #[serde(rename = "stripEmail")]
    pub strip_email: bool,
    #[serde(rename = "stripIPv4")]
    pub strip_ipv4: bool,
    #[serde(rename = "stripIPv6")]
    pub strip_ipv6: bool,
    #[serde(rename = "stripPhone")]
    pub strip_phone: bool,
    #[serde(rename = "stripURLQueryValues")]
    pub strip_url_query_values: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            strip_uuid: true,
            strip_hex: true,
            strip_numbers_long: true,
            strip_iso_date_time: true,
            strip_email: false,
            strip_ipv4: false,
            strip_ipv6: false,
            strip_phone: false,
            strip_url_query_values: false,
        }
    }
}

impl NormalizationConfig {
    pub fn disabled() -> Self {
        Self {
            strip_uuid: false,
            strip_hex: false,
            strip_numbers_long: false,
            strip_iso_date_time: false,
            strip_email: false,
            strip_ipv4: false,
            strip_ipv6: false,
            strip_phone: false,
            strip_url_query_values: false,
        }
    }

    pub fn all() -> Self {
        Self {
            strip_uuid: true,
            strip_hex: true,
            strip_numbers_long: true,
            strip_iso_date_time: true,
            strip_email: true,
            strip_ipv4: true,
            strip_ipv6: true,
            strip_phone: true,
            strip_url_query_values: true,
        }
    }
}

/// Which environment overrides changed the file/default value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridesApplied {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_k: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_on: Option<bool>,
}

impl OverridesApplied {
    pub fn any(&self) -> bool {
        [self.head_k, self.threshold, self.gate_on]
            .into_iter()
            .any(|v| v == Some(true))
    }
}

/// Audit trail of environment overrides, echoed into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingMeta {
    /// `env` when at least one override changed a value, `file` otherwise.
    pub source: ConfigSource,
    pub overrides_applied: OverridesApplied,
    pub warnings: Vec<String>,
}

impl Default for ReportingMeta {
    fn default() -> Self {
        Self {
            source: ConfigSource::File,
            overrides_applied: OverridesApplied::default(),
            warnings: Vec::new(),
        }
    }
}

/// Apply `POSTMAN_HEADK_K`, `POSTMAN_HEADK_THRESHOLD` and
/// `POSTMAN_HEADK_GATE_ON` to the clustering config.
///
/// Invalid values are ignored and clamped values are kept; both are logged and
/// listed in the returned meta's warnings.
pub fn apply_failure_cluster_overrides(
    config: &mut FailureClusterConfig,
    env: &mut EnvParser,
) -> ReportingMeta {
    let mut meta = ReportingMeta::default();

    if let Some(k) = env.get_positive_usize("HEADK_K") {
        meta.overrides_applied.head_k = Some(config.head_k != k.value);
        config.head_k = k.value;
    }

    if let Some(threshold) = env.get_clamped_f64("HEADK_THRESHOLD", 1.0, 100.0) {
        meta.overrides_applied.threshold =
            Some(config.head_k_threshold_percent != threshold.value);
        config.head_k_threshold_percent = threshold.value;
    }

    if let Some(gate) = env.get_switch("HEADK_GATE_ON") {
        meta.overrides_applied.gate_on = Some(config.fail_on_head_k_threshold_breach != gate.value);
        config.fail_on_head_k_threshold_breach = gate.value;
    }

    for err in env.take_errors() {
        tracing::warn!("{}", err);
        meta.warnings.push(err.to_string());
    }

    if meta.overrides_applied.any() {
        meta.source = ConfigSource::Env;
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> EnvParser {
        EnvParser::from_vars(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_defaults() {
        let cfg = ReportingConfig::default().failure_clusters;
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.head_k, 3);
        assert_eq!(cfg.head_k_threshold_percent, 70.0);
        assert!(!cfg.fail_on_head_k_threshold_breach);
        assert_eq!(cfg.examples_per_cluster, 3);
        assert!(cfg.normalize_messages);
        assert!(cfg.normalization.strip_uuid && cfg.normalization.strip_iso_date_time);
        assert!(!cfg.normalization.strip_email && !cfg.normalization.strip_url_query_values);
    }

    #[test]
    fn test_partial_file_keeps_field_defaults() {
        let cfg: ReportingConfig = serde_json::from_str(
            r#"{"failureClusters": {"topN": 5, "normalization": {"stripEmail": true}}}"#,
        )
        .unwrap();
        let fc = cfg.failure_clusters;
        assert_eq!(fc.top_n, 5);
        assert_eq!(fc.head_k, 3);
        assert!(fc.normalization.strip_email);
        assert!(fc.normalization.strip_uuid);
    }

    #[test]
    fn test_serialized_keys_match_file_format() {
        let json = serde_json::to_value(ReportingConfig::default()).unwrap();
        let fc = &json["failureClusters"];
        assert_eq!(fc["headKThresholdPercent"], 70.0);
        assert_eq!(fc["failOnHeadKThresholdBreach"], false);
        assert_eq!(fc["normalization"]["stripUUID"], true);
        assert_eq!(fc["normalization"]["stripURLQueryValues"], false);
    }

    #[test]
    fn test_normalize_messages_off_disables_all_rules() {
        let cfg = FailureClusterConfig {
            normalize_messages: false,
            ..FailureClusterConfig::default()
        };
        assert_eq!(cfg.active_normalization(), NormalizationConfig::disabled());
    }

    #[test]
    fn test_effective_values_fall_back_on_zero() {
        let cfg = FailureClusterConfig {
            head_k: 0,
            head_k_threshold_percent: 0.0,
            ..FailureClusterConfig::default()
        };
        assert_eq!(cfg.effective_head_k(), 3);
        assert_eq!(cfg.effective_threshold(), 70.0);
    }

    #[test]
    fn test_overrides_applied_and_recorded() {
        let mut cfg = FailureClusterConfig::default();
        let meta = apply_failure_cluster_overrides(
            &mut cfg,
            &mut env(&[
                ("POSTMAN_HEADK_K", "2"),
                ("POSTMAN_HEADK_THRESHOLD", "70"),
                ("POSTMAN_HEADK_GATE_ON", "true"),
            ]),
        );

        assert_eq!(cfg.head_k, 2);
        assert!(cfg.fail_on_head_k_threshold_breach);
        assert_eq!(meta.source, ConfigSource::Env);
        assert_eq!(meta.overrides_applied.head_k, Some(true));
        // Same value as before: recorded, but not counted as a change.
        assert_eq!(meta.overrides_applied.threshold, Some(false));
        assert_eq!(meta.overrides_applied.gate_on, Some(true));
        assert!(meta.warnings.is_empty());
    }

    #[test]
    fn test_invalid_overrides_are_ignored_with_warnings() {
        let mut cfg = FailureClusterConfig::default();
        let meta = apply_failure_cluster_overrides(
            &mut cfg,
            &mut env(&[
                ("POSTMAN_HEADK_K", "zero"),
                ("POSTMAN_HEADK_THRESHOLD", "abc"),
                ("POSTMAN_HEADK_GATE_ON", "maybe"),
            ]),
        );

        assert_eq!(cfg, FailureClusterConfig::default());
        assert_eq!(meta.source, ConfigSource::File);
        assert_eq!(meta.overrides_applied, OverridesApplied::default());
        assert_eq!(meta.warnings.len(), 3);
    }

    #[test]
    fn test_threshold_is_clamped_with_warning() {
        let mut cfg = FailureClusterConfig::default();
        let meta = apply_failure_cluster_overrides(
            &mut cfg,
            &mut env(&[("POSTMAN_HEADK_THRESHOLD", "250")]),
        );
        assert_eq!(cfg.head_k_threshold_percent, 100.0);
        assert_eq!(meta.overrides_applied.threshold, Some(true));
        assert_eq!(meta.warnings.len(), 1);
        assert!(meta.warnings[0].contains("clamped to 100"));
    }

    #[test]
    fn test_meta_serialization_shape() {
        let meta = ReportingMeta {
            source: ConfigSource::Env,
            overrides_applied: OverridesApplied {
                head_k: Some(true),
                ..OverridesApplied::default()
            },
            warnings: vec![],
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["source"], "env");
        assert_eq!(json["overridesApplied"]["headK"], true);
        assert!(json["overridesApplied"].get("threshold").is_none());
    }
}
