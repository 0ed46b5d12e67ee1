// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `lifecycle.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::{ClusterDnsConfig, DomainConfig, DnsSpec};
    use crate::labels::ManagedCategory;
    use crate::reconcilers::desired::external_dns;
    use crate::reconcilers::test_support::FakeCluster;
    use std::time::Duration;

    const NS: &str = "shoot--dev--a";

    fn external_config() -> ClusterDnsConfig {
        ClusterDnsConfig {
            dns: Some(DnsSpec {
                domain: Some("shoot.example.com".to_string()),
                providers: vec![],
            }),
            external_domain: Some(DomainConfig {
                provider: "aws-route53".to_string(),
                ..Default::default()
            }),
            external_cluster_domain: Some("shoot.example.com".to_string()),
            api_server_address: Some("10.0.0.1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_active_pipeline_is_provider_first() {
        let plan = external_dns(&external_config(), true);
        let [first, second] = category_pipeline(&plan);

        assert_eq!(first.action, Action::Deploy);
        assert_eq!(first.component.kind(), ResourceKind::DnsProvider);
        assert_eq!(second.action, Action::Deploy);
        assert_eq!(second.component.kind(), ResourceKind::DnsEntry);
    }

    #[test]
    fn test_inactive_pipeline_is_entry_first() {
        let plan = external_dns(&external_config(), false);
        let [first, second] = category_pipeline(&plan);

        assert_eq!(first.action, Action::Destroy);
        assert_eq!(first.component.kind(), ResourceKind::DnsEntry);
        assert_eq!(first.component.name(), "external");
        assert_eq!(second.action, Action::Destroy);
        assert_eq!(second.component.kind(), ResourceKind::DnsProvider);
    }

    #[tokio::test]
    async fn test_enabled_to_disabled_destroys_entry_first() {
        let cluster = FakeCluster::new();
        let ctx = cluster.context();
        let cancel = CancellationToken::new();
        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);

        orchestrator
            .run_category(&external_dns(&external_config(), true))
            .await
            .unwrap();
        assert_eq!(cluster.provider_names(), vec!["external"]);
        assert_eq!(cluster.entry_names(), vec!["external"]);
        cluster.clear_calls();

        orchestrator
            .run_category(&external_dns(&external_config(), false))
            .await
            .unwrap();

        assert_eq!(
            cluster.calls(),
            vec![
                "destroy DNSEntry/external",
                "wait-cleanup DNSEntry/external",
                "destroy DNSProvider/external",
                "wait-cleanup DNSProvider/external",
            ]
        );
        assert!(cluster.provider_names().is_empty());
        assert!(cluster.entry_names().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_to_enabled_deploys_provider_first() {
        let cluster = FakeCluster::new();
        let ctx = cluster.context();
        let cancel = CancellationToken::new();
        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);

        orchestrator
            .run_category(&external_dns(&external_config(), true))
            .await
            .unwrap();

        assert_eq!(
            cluster.calls(),
            vec![
                "deploy DNSProvider/external",
                "wait DNSProvider/external",
                "deploy DNSEntry/external",
                "wait DNSEntry/external",
            ]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_skips_entry() {
        let cluster = FakeCluster::new();
        cluster.fail("deploy DNSProvider/external");
        let ctx = cluster.context();
        let cancel = CancellationToken::new();
        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);

        let err = orchestrator
            .run_category(&external_dns(&external_config(), true))
            .await
            .unwrap_err();

        match err {
            DnsReconcileError::Apply {
                kind, name, action, ..
            } => {
                assert_eq!(kind, ResourceKind::DnsProvider);
                assert_eq!(name, "external");
                assert_eq!(action, Action::Deploy);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(cluster.calls(), vec!["deploy DNSProvider/external"]);
        assert!(cluster.entry_names().is_empty());
    }

    #[tokio::test]
    async fn test_entry_destroy_failure_keeps_provider() {
        let cluster = FakeCluster::new();
        cluster.add_provider(NS, "external", BTreeMap::new());
        cluster.fail("destroy DNSEntry/external");
        let ctx = cluster.context();
        let cancel = CancellationToken::new();
        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);

        let err = orchestrator
            .run_category(&external_dns(&external_config(), false))
            .await
            .unwrap_err();

        assert!(matches!(err, DnsReconcileError::Apply { .. }));
        assert_eq!(cluster.provider_names(), vec!["external"]);
    }

    #[tokio::test]
    async fn test_plan_continues_after_sibling_failure() {
        let cluster = FakeCluster::new();
        cluster.add_provider(NS, "b", ManagedCategory::Additional.labels());
        cluster.fail("deploy DNSProvider/a");
        let ctx = cluster.context();
        let cancel = CancellationToken::new();
        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);

        let plan: ReconcilePlan = BTreeMap::from([
            (
                "a".to_string(),
                Operation::Create(ProviderSpec {
                    name: "a".into(),
                    provider_type: Some("aws-route53".into()),
                    labels: ManagedCategory::Additional.labels(),
                    ..Default::default()
                }),
            ),
            (
                "b".to_string(),
                Operation::Destroy(ProviderSpec::destroy_only("b", ManagedCategory::Additional)),
            ),
        ]);

        let err = orchestrator.run_plan(&plan).await.unwrap_err();

        assert!(err.to_string().contains("\"a\""));
        assert_eq!(
            cluster.calls(),
            vec![
                "deploy DNSProvider/a",
                "destroy DNSProvider/b",
                "wait-cleanup DNSProvider/b",
            ]
        );
        assert!(cluster.provider_names().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_call() {
        let cluster = FakeCluster::new();
        cluster.hang("wait DNSProvider/external");
        let ctx = cluster.context();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);
        let err = orchestrator
            .run_category(&external_dns(&external_config(), true))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(!cluster
            .calls()
            .contains(&"deploy DNSEntry/external".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_waits_until_empty() {
        let cluster = FakeCluster::new();
        cluster.add_provider(NS, "external", BTreeMap::new());
        cluster.add_provider(NS, "aws-route53-a", ManagedCategory::Additional.labels());
        cluster.add_provider("other", "internal", BTreeMap::new());
        let ctx = cluster.context();
        let cancel = CancellationToken::new();

        LifecycleOrchestrator::new(&ctx, NS, &cancel)
            .delete_all_providers()
            .await
            .unwrap();

        assert_eq!(
            cluster.calls(),
            vec!["delete-all DNSProvider", "delete-all Secret"]
        );
        assert_eq!(cluster.provider_names(), vec!["internal"]);
        assert_eq!(cluster.state.lock().unwrap().list_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_removes_provider_credentials() {
        let cluster = FakeCluster::new();
        let ctx = cluster.context();
        let cancel = CancellationToken::new();
        let orchestrator = LifecycleOrchestrator::new(&ctx, NS, &cancel);

        orchestrator
            .run_category(&external_dns(&external_config(), true))
            .await
            .unwrap();
        assert_eq!(cluster.credential_names(NS), vec!["external"]);

        orchestrator.delete_all_providers().await.unwrap();

        assert!(cluster.provider_names().is_empty());
        assert!(cluster.credential_names(NS).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_times_out() {
        let cluster = FakeCluster::new();
        cluster.state.lock().unwrap().delete_all_removes = false;
        cluster.add_provider(NS, "external", BTreeMap::new());
        let ctx = cluster.context();
        let cancel = CancellationToken::new();

        let err = LifecycleOrchestrator::new(&ctx, NS, &cancel)
            .delete_all_providers()
            .await
            .unwrap_err();

        match err {
            DnsReconcileError::TeardownTimeout {
                namespace,
                timeout,
                remaining,
            } => {
                assert_eq!(namespace, NS);
                assert_eq!(timeout, Duration::from_secs(30));
                assert_eq!(remaining, vec!["external".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // 30s deadline polled every 5s: t=0,5,...,30
        assert_eq!(cluster.state.lock().unwrap().list_calls, 7);
        // credentials stay while a provider may still reference them
        assert!(!cluster.calls().contains(&"delete-all Secret".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_list_failure_is_query_error() {
        let cluster = FakeCluster::new();
        cluster.state.lock().unwrap().fail_list = true;
        let ctx = cluster.context();
        let cancel = CancellationToken::new();

        let err = LifecycleOrchestrator::new(&ctx, NS, &cancel)
            .delete_all_providers()
            .await
            .unwrap_err();

        assert!(matches!(err, DnsReconcileError::Query(_)));
        assert!(!err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancelled_while_polling() {
        let cluster = FakeCluster::new();
        cluster.state.lock().unwrap().delete_all_removes = false;
        cluster.add_provider(NS, "external", BTreeMap::new());
        let ctx = cluster.context();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            canceller.cancel();
        });

        let err = LifecycleOrchestrator::new(&ctx, NS, &cancel)
            .delete_all_providers()
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }
}
