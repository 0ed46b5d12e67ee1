// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants and the typed management category.
//!
//! Live-state queries are scoped by a marker label. The marker is never compared as a
//! raw string at call sites; it is derived from [`ManagedCategory`] so that a user-set
//! label cannot be mistaken for one of ours.

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value for `app.kubernetes.io/managed-by` on everything this crate applies
pub const MANAGED_BY_CLUSTERDNS: &str = "clusterdns";

/// Standard label for the component within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Component value of the credentials `Secret` applied next to each DNS provider
pub const COMPONENT_PROVIDER_CREDENTIALS: &str = "dns-provider-credentials";

// ============================================================================
// Marker Labels
// ============================================================================

/// Label key carrying the management role of a DNS resource
pub const ROLE_LABEL: &str = "gardener.cloud/role";

/// Role value for additionally declared (non-primary) DNS providers
pub const ROLE_ADDITIONAL_PROVIDER: &str = "managed-dns-provider";

/// Annotation recording what a DNS provider is used for
pub const PURPOSE_ANNOTATION: &str = "dns.gardener.cloud/purpose";

/// Management category of a DNS resource.
///
/// The two built-in categories are addressed by their fixed names; only
/// [`ManagedCategory::Additional`] carries a marker label, so a cleanup query for
/// additional providers can never select the built-in pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManagedCategory {
    /// The provider/entry pair for the cluster's external domain
    External,
    /// The provider/entry pair for the cluster's internal domain
    Internal,
    /// A provider declared in the DNS specification beyond the primary one
    Additional,
}

impl ManagedCategory {
    /// Marker label (key, value) scoping live-state queries to this category.
    #[must_use]
    pub fn marker(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Additional => Some((ROLE_LABEL, ROLE_ADDITIONAL_PROVIDER)),
            Self::External | Self::Internal => None,
        }
    }

    /// Labels a resource of this category is created with.
    #[must_use]
    pub fn labels(self) -> BTreeMap<String, String> {
        self.marker()
            .map(|(key, value)| BTreeMap::from([(key.to_string(), value.to_string())]))
            .unwrap_or_default()
    }

    /// Label selector matching exactly the resources of this category.
    ///
    /// Returns `None` for the built-in categories, which are not discoverable by label.
    #[must_use]
    pub fn selector(self) -> Option<BTreeMap<String, String>> {
        self.marker().map(|_| self.labels())
    }

    /// Classify a live resource from its labels.
    ///
    /// Only the marker-bearing category can be recognised this way; anything else is
    /// `None`, including the built-in pair.
    #[must_use]
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Option<Self> {
        match labels.get(ROLE_LABEL).map(String::as_str) {
            Some(ROLE_ADDITIONAL_PROVIDER) => Some(Self::Additional),
            _ => None,
        }
    }
}

impl fmt::Display for ManagedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::External => "external",
            Self::Internal => "internal",
            Self::Additional => "additional",
        };
        f.write_str(s)
    }
}

/// Selector matching every provider credentials `Secret` this crate applied.
#[must_use]
pub fn provider_credentials_selector() -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_MANAGED_BY.to_string(), MANAGED_BY_CLUSTERDNS.to_string()),
        (
            K8S_COMPONENT.to_string(),
            COMPONENT_PROVIDER_CREDENTIALS.to_string(),
        ),
    ])
}

/// Render a label map as a Kubernetes label selector string (`k1=v1,k2=v2`).
///
/// An empty map renders as the empty selector, which matches everything.
#[must_use]
pub fn selector_string(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod labels_tests;
