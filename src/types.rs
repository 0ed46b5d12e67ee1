// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Intent types produced and consumed by a reconciliation pass.
//!
//! [`ProviderSpec`] and [`EntrySpec`] are transient: they are rebuilt from the
//! configuration snapshot on every pass and never stored. [`ManagedResourceRef`] is a
//! read-only snapshot of a live object, valid for the duration of one pass.

use crate::labels::ManagedCategory;
use k8s_openapi::ByteString;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Include/exclude filter pair restricting which domains or zones a provider acts on.
///
/// Exclusions are interpreted by the DNS controller; they are passed through as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncludeExclude {
    /// Names to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Names to exclude.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl IncludeExclude {
    /// Build a filter with `include` deduplicated (and sorted) and `exclude` kept verbatim.
    #[must_use]
    pub fn new<I>(include: I, exclude: Vec<String>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let include: BTreeSet<String> = include.into_iter().filter(|s| !s.is_empty()).collect();
        Self {
            include: include.into_iter().collect(),
            exclude,
        }
    }

    /// Whether neither list carries anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// A declared DNS provider.
///
/// A spec without `provider_type` is identity-only: it only names what to remove.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderSpec {
    /// Resource name, unique within the namespace.
    pub name: String,
    /// Purpose recorded on the provider; equal to the name for everything we build.
    pub purpose: String,
    /// Labels the provider (and its credentials secret) carry.
    pub labels: BTreeMap<String, String>,
    /// Provider type; `None` signals destroy-only intent.
    pub provider_type: Option<String>,
    /// Credentials handed to the provider.
    pub secret_data: BTreeMap<String, ByteString>,
    /// Domain filter.
    pub domains: IncludeExclude,
    /// Hosted-zone filter.
    pub zones: IncludeExclude,
}

impl ProviderSpec {
    /// Identity-only spec used to remove a provider.
    #[must_use]
    pub fn destroy_only(name: &str, category: ManagedCategory) -> Self {
        Self {
            name: name.to_string(),
            purpose: name.to_string(),
            labels: category.labels(),
            ..Default::default()
        }
    }

    /// Whether this spec carries no content and can only be destroyed.
    #[must_use]
    pub fn is_destroy_only(&self) -> bool {
        self.provider_type.is_none()
    }

    /// Management category, as far as it can be told from the labels.
    #[must_use]
    pub fn category(&self) -> Option<ManagedCategory> {
        ManagedCategory::from_labels(&self.labels)
    }
}

/// A declared DNS entry, tied to the provider of the same name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntrySpec {
    /// Resource name; shares the provider's name.
    pub name: String,
    /// Fully qualified record name; `None` for identity-only specs.
    pub dns_name: Option<String>,
    /// Record targets.
    pub targets: Vec<String>,
    /// Record TTL in seconds.
    pub ttl: Option<i64>,
}

impl EntrySpec {
    /// Identity-only spec used to remove an entry.
    #[must_use]
    pub fn destroy_only(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Lightweight handle to a live resource, used for diffing and destruction only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagedResourceRef {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

impl ManagedResourceRef {
    /// Management category derived from the marker label.
    #[must_use]
    pub fn category(&self) -> Option<ManagedCategory> {
        ManagedCategory::from_labels(&self.labels)
    }
}

/// Resource kinds this crate manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    DnsProvider,
    DnsEntry,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsProvider => f.write_str(crate::constants::KIND_DNS_PROVIDER),
            Self::DnsEntry => f.write_str(crate::constants::KIND_DNS_ENTRY),
        }
    }
}

/// Lifecycle operation for one resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation<T> {
    /// Deploy (or re-apply) the spec, then wait for it.
    Create(T),
    /// Remove the resource, then wait for it to disappear.
    Destroy(T),
}

impl<T> Operation<T> {
    /// The spec the operation acts on.
    pub fn spec(&self) -> &T {
        match self {
            Self::Create(spec) | Self::Destroy(spec) => spec,
        }
    }

    /// Action of this operation.
    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Deploy,
            Self::Destroy(_) => Action::Destroy,
        }
    }

    #[must_use]
    pub fn is_destroy(&self) -> bool {
        matches!(self, Self::Destroy(_))
    }
}

/// Direction of a lifecycle call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Deploy,
    Destroy,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deploy => f.write_str("deploy"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

/// Resource name → operation, rebuilt on every pass.
pub type ReconcilePlan = BTreeMap<String, Operation<ProviderSpec>>;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
