//! End-to-end refresh tests
//!
//! Drive the whole pipeline (connect, list, map, augment, publish) against
//! in-memory clusters.

#[cfg(test)]
mod pipeline_tests {
    use crate::cluster::mock::{
        deployment_pod, instance, sample, MockCluster, MockFactory, MockUsage,
    };
    use crate::cluster::RawPod;
    use crate::coordinator::RefreshCoordinator;
    use crate::models::{Credentials, DeploymentType, FaultScope, Field, InstanceConfig};
    use crate::query::{FilterChoices, PodFilter};
    use crate::scanner::{InstanceScanner, ScannerConfig};
    use crate::store::SnapshotStore;
    use std::sync::Arc;

    fn build(factory: MockFactory, store: SnapshotStore) -> RefreshCoordinator {
        let scanner = InstanceScanner::new(factory.into_arc(), ScannerConfig::default());
        RefreshCoordinator::builder()
            .scanner(Arc::new(scanner))
            .store(store)
            .build()
            .unwrap()
    }

    fn helm_pod(name: &str, namespace: &str) -> RawPod {
        serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": name,
                "namespace": namespace,
                "uid": "4f1c",
                "creationTimestamp": "not-a-date",
                "labels": {
                    "app.kubernetes.io/managed-by": "Helm",
                    "helm.sh/chart": "my-chart-0.1.2"
                },
                "ownerReferences": [
                    { "kind": "ReplicaSet", "name": "payment-api-7d9f8c6b59" }
                ]
            },
            "spec": {
                "containers": [{
                    "name": "api",
                    "image": "registry/payment:latest",
                    "resources": {
                        "requests": { "cpu": "250m", "memory": "128Mi" },
                        "limits": { "memory": "256Mi" }
                    }
                }]
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_failed_instance_contributes_nothing() {
        let factory = MockFactory::new().with_cluster(
            "b",
            MockCluster::new().with_pods(
                "apps",
                vec![
                    deployment_pod("b-1", "apps"),
                    deployment_pod("b-2", "apps"),
                    deployment_pod("b-3", "apps"),
                ],
            ),
        );
        let store = SnapshotStore::new();
        let coordinator = build(factory, store.clone());

        let report = coordinator
            .refresh(&[instance("a", &["apps"]), instance("b", &["apps"])])
            .await;

        let published = store.current();
        assert_eq!(published.len(), 3);
        assert!(published.records().iter().all(|r| r.data_center == "dc-b"));
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].instance, "a");
        assert_eq!(report.faults[0].scope, FaultScope::Instance);
    }

    #[tokio::test]
    async fn test_full_record_mapping() {
        let factory = MockFactory::new().with_cluster(
            "east",
            MockCluster::new()
                .with_pods("payments", vec![helm_pod("payment-api-7d9f8c6b59-x2kvq", "payments")])
                .with_default_usage(MockUsage::Sample(sample("12m", "96Mi"))),
        );
        let coordinator = build(factory, SnapshotStore::new());

        let report = coordinator.refresh(&[instance("east", &["payments"])]).await;

        let record = &report.snapshot.records()[0];
        assert_eq!(record.application_name, "payment-api");
        assert_eq!(record.application_version, Field::Absent);
        assert_eq!(record.deployment_type, DeploymentType::Helm);
        assert_eq!(record.helm_chart_info, "my-chart-0.1.2");
        assert_eq!(record.cpu_request, "250m");
        assert_eq!(record.memory_request, "128Mi");
        assert_eq!(record.cpu_limit, Field::Absent);
        assert_eq!(record.memory_limit, "256Mi");
        assert_eq!(record.cpu_usage, "12m");
        assert_eq!(record.memory_usage, "96Mi");
        assert_eq!(record.pod_status, "Unknown");
        assert_eq!(record.pod_ip, "N/A");
        assert_eq!(record.creation_timestamp, "N/A (Parse Error)");
        assert!(report.faults.is_empty());
    }

    #[tokio::test]
    async fn test_total_failure_yields_empty_snapshot() {
        let store = SnapshotStore::new();
        let coordinator = build(MockFactory::new(), store.clone());
        let anonymous = InstanceConfig::new("lab", "https://lab:6443")
            .with_namespaces(["default"])
            .with_credentials(Credentials::Anonymous);

        let report = coordinator
            .refresh(&[anonymous, instance("gone", &["x"])])
            .await;

        assert!(store.current().is_empty());
        assert!(store.current().is_published());
        assert_eq!(report.faults.len(), 2);
        assert_eq!(report.instances_failed(), 2);
    }

    #[tokio::test]
    async fn test_refresh_replaces_previous_snapshot() {
        let factory = MockFactory::new()
            .with_cluster("one", MockCluster::new().with_pods("a", vec![deployment_pod("one-1", "a")]))
            .with_cluster("two", MockCluster::new().with_pods("a", vec![deployment_pod("two-1", "a")]));
        let store = SnapshotStore::new();
        let coordinator = build(factory, store.clone());

        coordinator.refresh(&[instance("one", &["a"])]).await;
        let held = store.current();
        coordinator.refresh(&[instance("two", &["a"])]).await;

        assert_eq!(held.records()[0].pod_name, "one-1");
        let current = store.current();
        assert_eq!(current.generation, 2);
        assert_eq!(current.len(), 1);
        assert_eq!(current.records()[0].pod_name, "two-1");
    }

    #[tokio::test]
    async fn test_snapshot_feeds_dashboard_filters() {
        let factory = MockFactory::new()
            .with_cluster(
                "east",
                MockCluster::new().with_pods(
                    "shop",
                    vec![deployment_pod("web-1", "shop"), deployment_pod("web-2", "shop")],
                ),
            )
            .with_cluster(
                "west",
                MockCluster::new().with_pods("billing", vec![deployment_pod("bill-1", "billing")]),
            );
        let store = SnapshotStore::new();
        let coordinator = build(factory, store.clone());

        coordinator
            .refresh(&[instance("east", &["shop"]), instance("west", &["billing"])])
            .await;

        let snapshot = store.current();
        let choices = FilterChoices::from_records(snapshot.records());
        assert_eq!(choices.data_centers, ["dc-east", "dc-west"]);
        assert_eq!(choices.namespaces, ["billing", "shop"]);

        let filter = PodFilter {
            data_center: Some("DC-WEST".to_string()),
            ..Default::default()
        };
        let matched = filter.apply(snapshot.records());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].pod_name, "bill-1");
    }
}
