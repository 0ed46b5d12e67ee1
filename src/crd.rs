// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions of the DNS management controller.
//!
//! These are the declarative intent objects this crate creates and removes. The DNS
//! controller that owns them (and talks to the actual DNS backends) is a separate
//! component; only the fields this crate writes or reads back are modelled here.
//!
//! # Resource Types
//!
//! - [`DNSProvider`] - A DNS backend with credentials and domain/zone filters
//! - [`DNSEntry`] - A DNS record served through one of the providers
//!
//! # Example: Declaring a DNS Entry
//!
//! ```rust,no_run
//! use clusterdns::crd::DNSEntrySpec;
//!
//! let spec = DNSEntrySpec {
//!     dns_name: "api.shoot.example.com".to_string(),
//!     targets: vec!["10.0.0.1".to_string()],
//!     ttl: Some(120),
//! };
//! ```

use crate::types::IncludeExclude;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to the `Secret` holding a provider's credentials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the secret.
    pub name: String,

    /// Namespace of the secret. Defaults to the provider's namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `DNSProvider` specification.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.gardener.cloud",
    version = "v1alpha1",
    kind = "DNSProvider",
    namespaced,
    doc = "DNSProvider declares a DNS backend (type and credentials) together with the domains and hosted zones it may act on."
)]
#[kube(status = "DNSObjectStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSProviderSpec {
    /// Provider type (e.g., "aws-route53", "google-clouddns").
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Credentials secret.
    pub secret_ref: SecretReference,

    /// Domains this provider is responsible for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<IncludeExclude>,

    /// Hosted zones this provider may use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<IncludeExclude>,
}

/// `DNSEntry` specification.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.gardener.cloud",
    version = "v1alpha1",
    kind = "DNSEntry",
    namespaced,
    doc = "DNSEntry declares a single DNS record served by whichever DNSProvider covers its name."
)]
#[kube(status = "DNSObjectStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSEntrySpec {
    /// Fully qualified record name.
    pub dns_name: String,

    /// Record targets (IP addresses or hostnames).
    pub targets: Vec<String>,

    /// Record TTL in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

/// Status reported by the DNS controller on both providers and entries.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSObjectStatus {
    /// Processing state ("Ready", "Pending", "Error", "Invalid", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Human-readable detail for the current state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation last processed by the DNS controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl DNSObjectStatus {
    /// Whether the DNS controller reports the object as ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.as_deref() == Some(crate::constants::STATE_READY)
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
