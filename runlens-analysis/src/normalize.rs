//! Failure message normalization.
//!
//! Volatile tokens (ids, timestamps, addresses) are replaced with stable
//! placeholders so that failures of the same cause land in the same cluster
//! with readable, de-duplicated examples. Word boundaries are ASCII-only.

use regex::Regex;
use runlens_common::NormalizationConfig;

/// A single replacement rule.
#[derive(Debug)]
struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

/// Rules in application order: name, pattern, replacement, enabled.
fn rule_table(cfg: &NormalizationConfig) -> [(&'static str, &'static str, &'static str, bool); 9] {
    [
        (
            "uuid",
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
            "<UUID>",
            cfg.strip_uuid,
        ),
        (
            "hex",
            r"(?-u:\b)[0-9a-fA-F]{32,40}(?-u:\b)",
            "<HEX>",
            cfg.strip_hex,
        ),
        (
            "number",
            r"(?-u:\b)[0-9]{6,}(?-u:\b)",
            "<NUM>",
            cfg.strip_numbers_long,
        ),
        (
            "timestamp",
            r"(?-u:\b)[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?Z?(?-u:\b)",
            "<TIMESTAMP>",
            cfg.strip_iso_date_time,
        ),
        (
            "email",
            r"(?-u:\b)[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}(?-u:\b)",
            "<EMAIL>",
            cfg.strip_email,
        ),
        (
            "ipv4",
            r"(?-u:\b)(?:[0-9]{1,3}\.){3}[0-9]{1,3}(?-u:\b)",
            "<IPV4>",
            cfg.strip_ipv4,
        ),
        (
            "ipv6",
            r"(?-u:\b)(?:[0-9A-Fa-f]{1,4}:){2,7}[0-9A-Fa-f]{1,4}(?-u:\b)",
            "<IPV6>",
            cfg.strip_ipv6,
        ),
        (
            "phone",
            r"(?-u:\b)(?:\+?[0-9]{1,3}[-\s]?)?(?:[0-9]{3}[-\s]?){2}[0-9]{4}(?-u:\b)",
            "<PHONE>",
            cfg.strip_phone,
        ),
        (
            "query",
            r"([?&])([^=&]+)=([^&#]*)",
            "${1}${2}=<VAL>",
            cfg.strip_url_query_values,
        ),
    ]
}

/// Compiled set of the enabled normalization rules.
#[derive(Debug, Default)]
pub struct MessageNormalizer {
    rules: Vec<Rule>,
}

impl MessageNormalizer {
    /// Compile the rules enabled in `cfg`.
    pub fn new(cfg: &NormalizationConfig) -> Result<Self, regex::Error> {
        let mut rules = Vec::new();
        for (name, pattern, replacement, enabled) in rule_table(cfg) {
            if !enabled {
                continue;
            }
            rules.push(Rule {
                name,
                pattern: Regex::new(pattern)?,
                replacement,
            });
        }
        Ok(Self { rules })
    }

    /// A normalizer that leaves messages unchanged.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn is_passthrough(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the active rules, in application order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Apply every enabled rule in order.
    pub fn normalize(&self, message: &str) -> String {
        let mut out = message.to_string();
        for rule in &self.rules {
            out = rule.pattern.replace_all(&out, rule.replacement).into_owned();
        }
        out
    }
}
