// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory collaborators shared by the reconciler unit tests.
//!
//! [`FakeCluster`] implements every collaborator trait over a shared in-memory object
//! set and records each lifecycle call as `"<action> <Kind>/<name>"`.

#![allow(clippy::unwrap_used)]

use crate::client::{ComponentRenderer, DnsComponent, OrchestrationClient, SecretStore};
use crate::config::ReconcilerSettings;
use crate::context::Context;
use crate::types::{EntrySpec, ManagedResourceRef, ProviderSpec, ResourceKind};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct FakeState {
    pub providers: BTreeMap<String, ManagedResourceRef>,
    pub entries: BTreeMap<String, ManagedResourceRef>,
    pub secrets: BTreeMap<(String, String), BTreeMap<String, ByteString>>,
    /// Provider credentials secrets as (namespace, provider name), written on provider deploy
    pub credentials: BTreeSet<(String, String)>,
    pub calls: Vec<String>,
    /// Calls (same format as `calls`) that fail instead of taking effect
    pub failing: BTreeSet<String>,
    /// Calls that never complete
    pub hanging: BTreeSet<String>,
    pub fail_list: bool,
    /// Whether `delete_all_matching` actually removes anything
    pub delete_all_removes: bool,
    pub list_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakeCluster {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        let cluster = Self::default();
        cluster.state.lock().unwrap().delete_all_removes = true;
        cluster
    }

    pub fn context(&self) -> Context {
        let settings = ReconcilerSettings {
            teardown_poll_interval: Duration::from_secs(5),
            teardown_timeout: Duration::from_secs(30),
            ..Default::default()
        };
        Context::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            settings,
        )
    }

    pub fn add_secret(&self, namespace: &str, name: &str) {
        let data = BTreeMap::from([(
            "credentials".to_string(),
            ByteString(format!("{name}-data").into_bytes()),
        )]);
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert((namespace.to_string(), name.to_string()), data);
    }

    pub fn add_provider(&self, namespace: &str, name: &str, labels: BTreeMap<String, String>) {
        self.state.lock().unwrap().providers.insert(
            name.to_string(),
            ManagedResourceRef {
                name: name.to_string(),
                namespace: namespace.to_string(),
                labels,
            },
        );
    }

    pub fn fail(&self, call: &str) {
        self.state.lock().unwrap().failing.insert(call.to_string());
    }

    pub fn hang(&self, call: &str) {
        self.state.lock().unwrap().hanging.insert(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.state.lock().unwrap().providers.keys().cloned().collect()
    }

    pub fn credential_names(&self, namespace: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .credentials
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.state.lock().unwrap().entries.keys().cloned().collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

fn matches(labels: &BTreeMap<String, String>, selector: &BTreeMap<String, String>) -> bool {
    selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}

#[async_trait]
impl OrchestrationClient for FakeCluster {
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<ManagedResourceRef>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.fail_list {
            return Err(anyhow!("list {kind} failed"));
        }
        let objects = match kind {
            ResourceKind::DnsProvider => &state.providers,
            ResourceKind::DnsEntry => &state.entries,
        };
        Ok(objects
            .values()
            .filter(|r| r.namespace == namespace && matches(&r.labels, selector))
            .cloned()
            .collect())
    }

    async fn delete_all_matching(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete-all {kind}"));
        if !state.delete_all_removes {
            return Ok(());
        }
        let objects = match kind {
            ResourceKind::DnsProvider => &mut state.providers,
            ResourceKind::DnsEntry => &mut state.entries,
        };
        objects.retain(|_, r| !(r.namespace == namespace && matches(&r.labels, selector)));
        Ok(())
    }

    async fn delete_provider_credentials(
        &self,
        namespace: &str,
        _selector: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("delete-all Secret".to_string());
        // every fake credentials secret carries the credentials labels
        state.credentials.retain(|(ns, _)| ns != namespace);
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FakeCluster {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, ByteString>> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("secrets {name:?} not found"))
    }
}

struct FakeComponent {
    cluster: FakeCluster,
    kind: ResourceKind,
    object: ManagedResourceRef,
}

impl FakeComponent {
    async fn record(&self, action: &str) -> Result<()> {
        let call = format!("{action} {}/{}", self.kind, self.object.name);
        let (fails, hangs) = {
            let mut state = self.cluster.state.lock().unwrap();
            state.calls.push(call.clone());
            (state.failing.contains(&call), state.hanging.contains(&call))
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        if fails {
            return Err(anyhow!("{call} rejected"));
        }
        Ok(())
    }

    fn credentials_key(&self) -> (String, String) {
        (self.object.namespace.clone(), self.object.name.clone())
    }

    fn objects<'a>(&self, state: &'a mut FakeState) -> &'a mut BTreeMap<String, ManagedResourceRef> {
        match self.kind {
            ResourceKind::DnsProvider => &mut state.providers,
            ResourceKind::DnsEntry => &mut state.entries,
        }
    }
}

#[async_trait]
impl DnsComponent for FakeComponent {
    async fn deploy(&self) -> Result<()> {
        self.record("deploy").await?;
        let mut state = self.cluster.state.lock().unwrap();
        self.objects(&mut state)
            .insert(self.object.name.clone(), self.object.clone());
        if self.kind == ResourceKind::DnsProvider {
            state.credentials.insert(self.credentials_key());
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        self.record("destroy").await?;
        let mut state = self.cluster.state.lock().unwrap();
        self.objects(&mut state).remove(&self.object.name);
        if self.kind == ResourceKind::DnsProvider {
            state.credentials.remove(&self.credentials_key());
        }
        Ok(())
    }

    async fn wait(&self) -> Result<()> {
        self.record("wait").await
    }

    async fn wait_cleanup(&self) -> Result<()> {
        self.record("wait-cleanup").await
    }
}

impl ComponentRenderer for FakeCluster {
    fn provider(&self, namespace: &str, spec: &ProviderSpec) -> Box<dyn DnsComponent> {
        Box::new(FakeComponent {
            cluster: self.clone(),
            kind: ResourceKind::DnsProvider,
            object: ManagedResourceRef {
                name: spec.name.clone(),
                namespace: namespace.to_string(),
                labels: spec.labels.clone(),
            },
        })
    }

    fn entry(&self, namespace: &str, spec: &EntrySpec) -> Box<dyn DnsComponent> {
        Box::new(FakeComponent {
            cluster: self.clone(),
            kind: ResourceKind::DnsEntry,
            object: ManagedResourceRef {
                name: spec.name.clone(),
                namespace: namespace.to_string(),
                labels: BTreeMap::new(),
            },
        })
    }
}
