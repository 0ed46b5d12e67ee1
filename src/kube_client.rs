// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! kube-rs implementations of the collaborator traits.
//!
//! - [`KubeOrchestrationClient`] - label-scoped list and delete-collection
//! - [`KubeSecretStore`] - reads `Secret` data
//! - [`KubeComponentRenderer`] - renders specs into `DNSProvider` (plus its credentials
//!   `Secret`) and `DNSEntry` objects, applied with server-side apply
//!
//! # Example
//!
//! ```rust,no_run
//! use clusterdns::config::ReconcilerSettings;
//! use clusterdns::kube_client::kube_context;
//! use kube::Client;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Client::try_default().await?;
//! let ctx = kube_context(client, ReconcilerSettings::default());
//! # Ok(())
//! # }
//! ```

use crate::client::{ComponentRenderer, DnsComponent, OrchestrationClient, SecretStore};
use crate::config::ReconcilerSettings;
use crate::constants::PROVIDER_SECRET_PREFIX;
use crate::context::Context;
use crate::crd::{DNSEntry, DNSEntrySpec, DNSObjectStatus, DNSProvider, DNSProviderSpec, SecretReference};
use crate::labels::{
    provider_credentials_selector, selector_string, K8S_MANAGED_BY, MANAGED_BY_CLUSTERDNS,
    PURPOSE_ANNOTATION,
};
use crate::types::{EntrySpec, IncludeExclude, ManagedResourceRef, ProviderSpec, ResourceKind};
use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Build a [`Context`] whose collaborators all talk to the cluster behind `client`.
#[must_use]
pub fn kube_context(client: Client, settings: ReconcilerSettings) -> Context {
    Context::new(
        Arc::new(KubeOrchestrationClient::new(client.clone())),
        Arc::new(KubeSecretStore::new(client.clone())),
        Arc::new(KubeComponentRenderer::new(client, settings.clone())),
        settings,
    )
}

fn list_params(selector: &BTreeMap<String, String>) -> ListParams {
    if selector.is_empty() {
        ListParams::default()
    } else {
        ListParams::default().labels(&selector_string(selector))
    }
}

async fn list_refs<K>(
    client: &Client,
    namespace: &str,
    selector: &BTreeMap<String, String>,
) -> Result<Vec<ManagedResourceRef>>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let list = api
        .list(&list_params(selector))
        .await
        .with_context(|| format!("failed to list {} in namespace {namespace}", K::kind(&())))?;

    Ok(list
        .items
        .into_iter()
        .map(|item| ManagedResourceRef {
            name: item.name_any(),
            namespace: item.namespace().unwrap_or_else(|| namespace.to_string()),
            labels: item.labels().clone(),
        })
        .collect())
}

async fn delete_collection<K>(
    client: &Client,
    namespace: &str,
    selector: &BTreeMap<String, String>,
) -> Result<()>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.delete_collection(&DeleteParams::default(), &list_params(selector))
        .await
        .with_context(|| format!("failed to delete {} in namespace {namespace}", K::kind(&())))?;
    Ok(())
}

/// Orchestration API client backed by kube-rs.
#[derive(Clone)]
pub struct KubeOrchestrationClient {
    client: Client,
}

impl KubeOrchestrationClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrchestrationClient for KubeOrchestrationClient {
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<ManagedResourceRef>> {
        match kind {
            ResourceKind::DnsProvider => list_refs::<DNSProvider>(&self.client, namespace, selector).await,
            ResourceKind::DnsEntry => list_refs::<DNSEntry>(&self.client, namespace, selector).await,
        }
    }

    async fn delete_all_matching(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<()> {
        match kind {
            ResourceKind::DnsProvider => {
                delete_collection::<DNSProvider>(&self.client, namespace, selector).await
            }
            ResourceKind::DnsEntry => {
                delete_collection::<DNSEntry>(&self.client, namespace, selector).await
            }
        }
    }

    async fn delete_provider_credentials(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<()> {
        delete_collection::<Secret>(&self.client, namespace, selector).await
    }
}

/// Secret store backed by Kubernetes `Secret`s.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, ByteString>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get(name).await?;
        Ok(secret.data.unwrap_or_default())
    }
}

/// Create or update a resource using server-side apply.
///
/// Checks whether the resource exists; patches it with server-side apply if it does,
/// creates it otherwise.
///
/// # Errors
///
/// Returns an error if the resource has no name or an API call fails.
async fn create_or_apply<T>(
    client: &Client,
    namespace: &str,
    resource: &T,
    field_manager: &str,
) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + Debug
        + serde::Serialize
        + DeserializeOwned,
{
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| anyhow!("Resource must have a name"))?;

    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    debug!(
        namespace = %namespace,
        name = %name,
        kind = %T::kind(&()),
        "Creating or updating resource with Apply strategy"
    );

    if api.get_opt(name).await?.is_some() {
        api.patch(
            name,
            &PatchParams::apply(field_manager).force(),
            &Patch::Apply(resource),
        )
        .await?;
        info!("Updated {} {}/{}", T::kind(&()), namespace, name);
    } else {
        api.create(&PostParams::default(), resource).await?;
        info!("Created {} {}/{}", T::kind(&()), namespace, name);
    }

    Ok(())
}

/// Delete a resource, treating "already gone" as success.
async fn delete_if_present<T>(api: &Api<T>, name: &str) -> Result<()>
where
    T: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted {} {}", T::kind(&()), name);
            Ok(())
        }
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
            debug!("{} {} already gone", T::kind(&()), name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Poll `check` at `interval` until it reports `true` or `timeout` elapses.
///
/// # Errors
///
/// Returns the first error of `check`, or a timeout error naming `what`.
async fn wait_until<F, Fut>(what: &str, interval: Duration, timeout: Duration, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            anyhow::bail!("timed out after {timeout:?} waiting for {what}");
        }
        debug!(what = %what, retry_after = ?interval, "Still waiting");
        tokio::time::sleep(interval).await;
    }
}

async fn wait_ready<T, S>(api: &Api<T>, name: &str, settings: &ReconcilerSettings, status: S) -> Result<()>
where
    T: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
    S: Fn(&T) -> Option<&DNSObjectStatus>,
{
    let what = format!("{} {name} to become ready", T::kind(&()));
    let status = &status;
    wait_until(
        &what,
        settings.component_poll_interval,
        settings.component_wait_timeout,
        move || async move {
            let object = api.get_opt(name).await?;
            Ok(object.as_ref().and_then(status).is_some_and(DNSObjectStatus::is_ready))
        },
    )
    .await
}

async fn wait_gone<T>(api: &Api<T>, name: &str, settings: &ReconcilerSettings) -> Result<()>
where
    T: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned,
{
    let what = format!("{} {name} to be deleted", T::kind(&()));
    wait_until(
        &what,
        settings.component_poll_interval,
        settings.component_wait_timeout,
        move || async move { Ok(api.get_opt(name).await?.is_none()) },
    )
    .await
}

fn managed_labels(labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut labels = labels.clone();
    labels.insert(K8S_MANAGED_BY.to_string(), MANAGED_BY_CLUSTERDNS.to_string());
    labels
}

fn credentials_labels(labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut labels = labels.clone();
    labels.extend(provider_credentials_selector());
    labels
}

fn non_empty(filter: &IncludeExclude) -> Option<IncludeExclude> {
    (!filter.is_empty()).then(|| filter.clone())
}

/// Renders specs into kube-backed components.
#[derive(Clone)]
pub struct KubeComponentRenderer {
    client: Client,
    settings: ReconcilerSettings,
}

impl KubeComponentRenderer {
    #[must_use]
    pub fn new(client: Client, settings: ReconcilerSettings) -> Self {
        Self { client, settings }
    }
}

impl ComponentRenderer for KubeComponentRenderer {
    fn provider(&self, namespace: &str, spec: &ProviderSpec) -> Box<dyn DnsComponent> {
        Box::new(KubeProviderComponent {
            client: self.client.clone(),
            namespace: namespace.to_string(),
            spec: spec.clone(),
            settings: self.settings.clone(),
        })
    }

    fn entry(&self, namespace: &str, spec: &EntrySpec) -> Box<dyn DnsComponent> {
        Box::new(KubeEntryComponent {
            client: self.client.clone(),
            namespace: namespace.to_string(),
            spec: spec.clone(),
            settings: self.settings.clone(),
        })
    }
}

/// A `DNSProvider` together with its credentials `Secret`.
pub struct KubeProviderComponent {
    client: Client,
    namespace: String,
    spec: ProviderSpec,
    settings: ReconcilerSettings,
}

impl KubeProviderComponent {
    fn secret_name(&self) -> String {
        format!("{PROVIDER_SECRET_PREFIX}{}", self.spec.name)
    }

    /// Credentials secret for this provider.
    #[must_use]
    pub fn build_secret(&self) -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some(self.secret_name()),
                namespace: Some(self.namespace.clone()),
                labels: Some(credentials_labels(&self.spec.labels)),
                ..Default::default()
            },
            data: Some(self.spec.secret_data.clone()),
            type_: Some("Opaque".to_string()),
            ..Default::default()
        }
    }

    /// `DNSProvider` object for this provider.
    ///
    /// # Errors
    ///
    /// Returns an error for identity-only specs, which cannot be deployed.
    pub fn build_provider(&self) -> Result<DNSProvider> {
        let provider_type = self
            .spec
            .provider_type
            .clone()
            .ok_or_else(|| anyhow!("DNSProvider {} has no type and can only be destroyed", self.spec.name))?;

        let mut provider = DNSProvider::new(
            &self.spec.name,
            DNSProviderSpec {
                provider_type,
                secret_ref: SecretReference {
                    name: self.secret_name(),
                    namespace: None,
                },
                domains: non_empty(&self.spec.domains),
                zones: non_empty(&self.spec.zones),
            },
        );
        provider.metadata.namespace = Some(self.namespace.clone());
        provider.metadata.labels = Some(managed_labels(&self.spec.labels));
        provider.metadata.annotations = Some(BTreeMap::from([(
            PURPOSE_ANNOTATION.to_string(),
            self.spec.purpose.clone(),
        )]));
        Ok(provider)
    }

    fn providers(&self) -> Api<DNSProvider> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

#[async_trait]
impl DnsComponent for KubeProviderComponent {
    async fn deploy(&self) -> Result<()> {
        let provider = self.build_provider()?;
        let field_manager = &self.settings.field_manager;
        create_or_apply(&self.client, &self.namespace, &self.build_secret(), field_manager).await?;
        create_or_apply(&self.client, &self.namespace, &provider, field_manager).await
    }

    async fn destroy(&self) -> Result<()> {
        delete_if_present(&self.providers(), &self.spec.name).await?;
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &self.namespace);
        delete_if_present(&secrets, &self.secret_name()).await
    }

    async fn wait(&self) -> Result<()> {
        wait_ready(&self.providers(), &self.spec.name, &self.settings, |p: &DNSProvider| {
            p.status.as_ref()
        })
        .await
    }

    async fn wait_cleanup(&self) -> Result<()> {
        wait_gone(&self.providers(), &self.spec.name, &self.settings).await
    }
}

/// A `DNSEntry`.
pub struct KubeEntryComponent {
    client: Client,
    namespace: String,
    spec: EntrySpec,
    settings: ReconcilerSettings,
}

impl KubeEntryComponent {
    /// `DNSEntry` object for this entry.
    ///
    /// # Errors
    ///
    /// Returns an error for identity-only specs, which cannot be deployed.
    pub fn build_entry(&self) -> Result<DNSEntry> {
        let dns_name = self
            .spec
            .dns_name
            .clone()
            .ok_or_else(|| anyhow!("DNSEntry {} has no DNS name and can only be destroyed", self.spec.name))?;

        let mut entry = DNSEntry::new(
            &self.spec.name,
            DNSEntrySpec {
                dns_name,
                targets: self.spec.targets.clone(),
                ttl: self.spec.ttl,
            },
        );
        entry.metadata.namespace = Some(self.namespace.clone());
        entry.metadata.labels = Some(managed_labels(&BTreeMap::new()));
        Ok(entry)
    }

    fn entries(&self) -> Api<DNSEntry> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

#[async_trait]
impl DnsComponent for KubeEntryComponent {
    async fn deploy(&self) -> Result<()> {
        let entry = self.build_entry()?;
        create_or_apply(&self.client, &self.namespace, &entry, &self.settings.field_manager).await
    }

    async fn destroy(&self) -> Result<()> {
        delete_if_present(&self.entries(), &self.spec.name).await
    }

    async fn wait(&self) -> Result<()> {
        wait_ready(&self.entries(), &self.spec.name, &self.settings, |e: &DNSEntry| {
            e.status.as_ref()
        })
        .await
    }

    async fn wait_cleanup(&self) -> Result<()> {
        wait_gone(&self.entries(), &self.spec.name, &self.settings).await
    }
}

#[cfg(test)]
#[path = "kube_client_tests.rs"]
mod kube_client_tests;
