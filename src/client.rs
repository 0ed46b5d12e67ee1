// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Collaborator seams of the reconciliation core.
//!
//! The core never talks to the cluster directly. It goes through three traits:
//!
//! - [`OrchestrationClient`] - list and bulk-delete managed resources
//! - [`SecretStore`] - read credentials of additional providers
//! - [`ComponentRenderer`] - turn a provider or entry spec into a [`DnsComponent`]
//!   that can be deployed, destroyed and waited on
//!
//! [`crate::kube_client`] implements all three on top of kube-rs.

use crate::types::{EntrySpec, ManagedResourceRef, ProviderSpec, ResourceKind};
use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Orchestration API operations needed for live-state discovery and teardown.
#[async_trait]
pub trait OrchestrationClient: Send + Sync {
    /// List resources of `kind` in `namespace` whose labels contain all of `selector`.
    ///
    /// An empty selector matches everything.
    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<Vec<ManagedResourceRef>>;

    /// Delete every resource of `kind` in `namespace` matching `selector`.
    async fn delete_all_matching(
        &self,
        kind: ResourceKind,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Delete every provider credentials secret in `namespace` matching `selector`.
    async fn delete_provider_credentials(
        &self,
        namespace: &str,
        selector: &BTreeMap<String, String>,
    ) -> Result<()>;
}

/// Read access to secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the data of a secret. A missing secret is an error.
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<BTreeMap<String, ByteString>>;
}

/// A rendered DNS object whose lifecycle can be driven.
///
/// Every operation must be idempotent: deploying an object that already matches and
/// destroying an object that is already gone both succeed.
#[async_trait]
pub trait DnsComponent: Send + Sync {
    /// Create or re-apply the object.
    async fn deploy(&self) -> Result<()>;

    /// Delete the object.
    async fn destroy(&self) -> Result<()>;

    /// Wait until the object is ready after [`Self::deploy`].
    async fn wait(&self) -> Result<()> {
        Ok(())
    }

    /// Wait until the object is gone after [`Self::destroy`].
    async fn wait_cleanup(&self) -> Result<()> {
        Ok(())
    }
}

/// Renders specs into drivable components.
pub trait ComponentRenderer: Send + Sync {
    fn provider(&self, namespace: &str, spec: &ProviderSpec) -> Box<dyn DnsComponent>;

    fn entry(&self, namespace: &str, spec: &EntrySpec) -> Box<dyn DnsComponent>;
}
