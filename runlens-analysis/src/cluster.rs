//! Failure clustering by folder and assertion.
//!
//! Failures are keyed by `folder :: assertion`. Clusters are ordered by
//! descending count, and equal counts keep the order in which each cluster's
//! first failure appeared, which makes the output deterministic for a given
//! input.

use crate::index::{CollectionIndex, folder_key};
use crate::normalize::MessageNormalizer;
use crate::number;
use runlens_common::{Failure, FailureClusterConfig};
use serde::Serialize;
use std::collections::HashMap;

/// Failures sharing one `(folder, assertion)` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureCluster {
    pub folder: String,
    pub assertion: String,
    pub count: u64,
    /// First normalized messages, bounded by `examplesPerCluster`.
    pub examples: Vec<String>,
    /// Percentage of all failures, one decimal.
    #[serde(serialize_with = "number::num")]
    pub share: f64,
}

impl FailureCluster {
    pub fn key(&self) -> String {
        format!("{}::{}", self.folder, self.assertion)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMeta {
    pub total_failures: u64,
    pub cluster_count: u64,
    pub clustered_failures_count: u64,
    #[serde(serialize_with = "number::num")]
    pub coverage_percent: f64,
}

/// Group failures into clusters.
///
/// Folders are resolved from the failure's source id only; unresolved
/// failures belong to `(root)`.
pub fn cluster_failures(
    failures: &[Failure],
    index: &CollectionIndex,
    config: &FailureClusterConfig,
) -> (Vec<FailureCluster>, ClusterMeta) {
    let normalizer = build_normalizer(config);
    let limit = config.examples_per_cluster;

    let mut clusters: Vec<FailureCluster> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for failure in failures {
        let folder = folder_key(index.resolve_id(failure.source_id()));
        let assertion = failure.assertion_name();
        let key = format!("{folder}::{assertion}");

        let pos = *positions.entry(key).or_insert_with(|| {
            clusters.push(FailureCluster {
                folder,
                assertion: assertion.to_string(),
                count: 0,
                examples: Vec::new(),
                share: 0.0,
            });
            clusters.len() - 1
        });
        let cluster = &mut clusters[pos];
        cluster.count += 1;

        if cluster.examples.len() < limit
            && let Some(message) = failure.message()
        {
            let flattened = message.replace('\n', " ");
            cluster.examples.push(normalizer.normalize(&flattened));
        }
    }

    // `sort_by` is stable: equal counts stay in first-occurrence order.
    clusters.sort_by(|a, b| b.count.cmp(&a.count));

    let total = failures.len() as u64;
    let mut clustered = 0;
    for cluster in &mut clusters {
        clustered += cluster.count;
        cluster.share = number::share_percent(cluster.count, total);
    }

    let meta = ClusterMeta {
        total_failures: total,
        cluster_count: clusters.len() as u64,
        clustered_failures_count: clustered,
        coverage_percent: number::share_percent(clustered, total),
    };

    tracing::debug!(
        failures = total,
        clusters = meta.cluster_count,
        coverage = meta.coverage_percent,
        "clustered failures"
    );

    (clusters, meta)
}

fn build_normalizer(config: &FailureClusterConfig) -> MessageNormalizer {
    match MessageNormalizer::new(&config.active_normalization()) {
        Ok(normalizer) => normalizer,
        Err(e) => {
            tracing::warn!(error = %e, "message normalization disabled");
            MessageNormalizer::passthrough()
        }
    }
}

/// Sum of the shares of the first `k` clusters, rounded to one decimal.
pub fn head_share(clusters: &[FailureCluster], k: usize) -> f64 {
    let sum: f64 = clusters.iter().take(k).map(|c| c.share).sum();
    number::round1(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runlens_common::{CollectionNode, NormalizationConfig};
    use serde_json::json;

    fn failure(id: Option<&str>, test: &str, message: &str) -> Failure {
        let mut value = json!({
            "error": {"name": "AssertionError", "test": test, "message": message},
        });
        if let Some(id) = id {
            value["source"] = json!({"id": id, "name": "req"});
        }
        serde_json::from_value(value).unwrap()
    }

    fn index() -> CollectionIndex {
        let root = CollectionNode {
            item: Some(vec![
                CollectionNode::folder("Auth", vec![CollectionNode::request("itm-1", "Login")]),
                CollectionNode::folder("Order", vec![CollectionNode::request("itm-2", "List")]),
            ]),
            ..CollectionNode::default()
        };
        CollectionIndex::build(Some(&root))
    }

    #[test]
    fn test_groups_by_folder_and_assertion() {
        let failures = vec![
            failure(Some("itm-1"), "status_is_200", "expected 200"),
            failure(Some("itm-2"), "status_is_200", "expected 200"),
            failure(Some("itm-1"), "status_is_200", "expected 200 again"),
            failure(None, "body_ok", "bad body"),
        ];
        let (clusters, meta) = cluster_failures(&failures, &index(), &FailureClusterConfig::default());

        let keys: Vec<_> = clusters.iter().map(FailureCluster::key).collect();
        assert_eq!(
            keys,
            vec!["Auth::status_is_200", "Order::status_is_200", "(root)::body_ok"]
        );
        assert_eq!(clusters[0].count, 2);
        assert_eq!(clusters[0].share, 50.0);
        assert_eq!(clusters[1].share, 25.0);
        assert_eq!(meta.total_failures, 4);
        assert_eq!(meta.cluster_count, 3);
        assert_eq!(meta.clustered_failures_count, 4);
        assert_eq!(meta.coverage_percent, 100.0);
    }

    #[test]
    fn test_equal_counts_keep_first_occurrence_order() {
        let failures = vec![
            failure(None, "c", "m"),
            failure(None, "a", "m"),
            failure(None, "b", "m"),
            failure(None, "b", "m"),
        ];
        let (clusters, _) = cluster_failures(&failures, &index(), &FailureClusterConfig::default());
        let names: Vec<_> = clusters.iter().map(|c| c.assertion.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_examples_are_bounded_and_normalized() {
        let failures: Vec<Failure> = (0..5)
            .map(|i| {
                failure(
                    Some("itm-1"),
                    "trace",
                    &format!("line one\ntraceId=123e4567-e89b-12d3-a456-42661417400{i}"),
                )
            })
            .collect();
        let config = FailureClusterConfig {
            examples_per_cluster: 2,
            ..FailureClusterConfig::default()
        };
        let (clusters, _) = cluster_failures(&failures, &index(), &config);
        assert_eq!(clusters[0].count, 5);
        assert_eq!(
            clusters[0].examples,
            vec!["line one traceId=<UUID>", "line one traceId=<UUID>"]
        );
    }

    #[test]
    fn test_normalization_disabled() {
        let config = FailureClusterConfig {
            normalize_messages: false,
            normalization: NormalizationConfig::all(),
            ..FailureClusterConfig::default()
        };
        let failures = vec![failure(None, "t", "id 1234567")];
        let (clusters, _) = cluster_failures(&failures, &index(), &config);
        assert_eq!(clusters[0].examples, vec!["id 1234567"]);
    }

    #[test]
    fn test_missing_messages_and_names() {
        let failures: Vec<Failure> = vec![
            serde_json::from_value(json!({"error": {"name": "TypeError"}})).unwrap(),
            serde_json::from_value(json!({})).unwrap(),
        ];
        let (clusters, _) = cluster_failures(&failures, &index(), &FailureClusterConfig::default());
        assert_eq!(clusters[0].assertion, "TypeError");
        assert_eq!(clusters[1].assertion, "unknown-assert");
        assert!(clusters.iter().all(|c| c.examples.is_empty()));
    }

    #[test]
    fn test_empty_failures() {
        let (clusters, meta) = cluster_failures(&[], &index(), &FailureClusterConfig::default());
        assert!(clusters.is_empty());
        assert_eq!(meta, ClusterMeta::default());
    }

    #[test]
    fn test_name_lookup_is_not_used_for_failures() {
        let failure: Failure =
            serde_json::from_value(json!({"error": {"test": "t"}, "source": {"name": "Login"}})).unwrap();
        let (clusters, _) = cluster_failures(&[failure], &index(), &FailureClusterConfig::default());
        assert_eq!(clusters[0].folder, "(root)");
    }

    #[test]
    fn test_head_share() {
        let make = |share| FailureCluster {
            folder: "(root)".into(),
            assertion: "a".into(),
            count: 1,
            examples: vec![],
            share,
        };
        let clusters = vec![make(50.0), make(30.0), make(10.0)];
        assert_eq!(head_share(&clusters, 2), 80.0);
        assert_eq!(head_share(&clusters, 10), 90.0);
        assert_eq!(head_share(&[], 3), 0.0);
    }
}
