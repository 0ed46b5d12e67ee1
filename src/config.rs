// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration inputs of a reconciliation pass.
//!
//! - [`ClusterDnsConfig`] is the read-only snapshot of one cluster's DNS configuration.
//!   It is deserialized from YAML (camelCase keys); secret payloads are base64 encoded,
//!   exactly like a Kubernetes `Secret`'s `data`.
//! - [`ReconcilerSettings`] carries the timing knobs of the reconciler itself.
//!
//! # Example
//!
//! ```rust
//! use clusterdns::config::ClusterDnsConfig;
//!
//! let config: ClusterDnsConfig = serde_yaml::from_str(r"
//! projectNamespace: garden-dev
//! externalClusterDomain: shoot.example.com
//! dns:
//!   domain: shoot.example.com
//!   providers:
//!     - type: aws-route53
//!       secretName: route53-creds
//! externalDomain:
//!   provider: aws-route53
//!   secretData:
//!     accessKeyID: QUtJQQ==
//! ").unwrap();
//!
//! assert_eq!(config.dns_providers().len(), 1);
//! ```

use crate::constants::{
    COMPONENT_POLL_INTERVAL_SECS, DEFAULT_COMPONENT_WAIT_TIMEOUT_SECS, DEFAULT_FIELD_MANAGER,
    DEFAULT_TEARDOWN_TIMEOUT_SECS, TEARDOWN_POLL_INTERVAL_SECS,
};
use crate::types::IncludeExclude;
use anyhow::{Context as _, Result};
use k8s_openapi::ByteString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Read-only snapshot of one cluster's DNS configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDnsConfig {
    /// DNS management is switched off globally for this cluster.
    #[serde(default)]
    pub disable_dns: bool,

    /// DNS section of the cluster specification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsSpec>,

    /// Default domain the external domain is served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_domain: Option<DomainConfig>,

    /// Domain the internal (operator-facing) name is served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_domain: Option<DomainConfig>,

    /// The cluster's computed external domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_cluster_domain: Option<String>,

    /// The cluster's computed internal domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_cluster_domain: Option<String>,

    /// Namespace holding the secrets referenced by additional providers. Required as soon
    /// as any additional provider needs credentials.
    #[serde(default)]
    pub project_namespace: String,

    /// Address the built-in `api.` records point at, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_address: Option<String>,
}

/// DNS section of the cluster specification.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsSpec {
    /// Domain requested for the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Declared providers, in declaration order.
    #[serde(default)]
    pub providers: Vec<DnsProviderConfig>,
}

/// One declared DNS provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsProviderConfig {
    /// Provider type; required for non-primary providers.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    /// Credentials secret in the project namespace; required for non-primary providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    /// Marks the provider represented by the external domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<IncludeExclude>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<IncludeExclude>,
}

impl DnsProviderConfig {
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }
}

/// A domain together with the provider that serves it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfig {
    /// Provider type, or "unmanaged".
    pub provider: String,

    /// Provider credentials.
    #[serde(default)]
    pub secret_data: BTreeMap<String, ByteString>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_domains: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_zones: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_zones: Vec<String>,
}

impl ClusterDnsConfig {
    /// Load a snapshot from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for this type.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading cluster DNS configuration");
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Declared providers, empty when no DNS section exists.
    #[must_use]
    pub fn dns_providers(&self) -> &[DnsProviderConfig] {
        self.dns.as_ref().map_or(&[], |dns| dns.providers.as_slice())
    }
}

/// Timing and identity settings of the reconciler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Interval between list calls while waiting for a full teardown.
    pub teardown_poll_interval: Duration,
    /// Deadline for a full teardown.
    pub teardown_timeout: Duration,
    /// Interval between status checks while waiting on one component.
    pub component_poll_interval: Duration,
    /// Deadline for one component to become ready or disappear.
    pub component_wait_timeout: Duration,
    /// Field manager for server-side apply.
    pub field_manager: String,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            teardown_poll_interval: Duration::from_secs(TEARDOWN_POLL_INTERVAL_SECS),
            teardown_timeout: Duration::from_secs(DEFAULT_TEARDOWN_TIMEOUT_SECS),
            component_poll_interval: Duration::from_secs(COMPONENT_POLL_INTERVAL_SECS),
            component_wait_timeout: Duration::from_secs(DEFAULT_COMPONENT_WAIT_TIMEOUT_SECS),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl ReconcilerSettings {
    /// Build settings from `CLUSTERDNS_*` environment variables, falling back to defaults.
    ///
    /// Recognised variables (all durations in seconds):
    /// `CLUSTERDNS_TEARDOWN_POLL_INTERVAL`, `CLUSTERDNS_TEARDOWN_TIMEOUT`,
    /// `CLUSTERDNS_COMPONENT_POLL_INTERVAL`, `CLUSTERDNS_COMPONENT_WAIT_TIMEOUT`,
    /// `CLUSTERDNS_FIELD_MANAGER`.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration variable is set but is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration variable is set but is not a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => {
                    let value: u64 = raw
                        .trim()
                        .parse()
                        .with_context(|| format!("{key} must be a number of seconds, got {raw:?}"))?;
                    if value == 0 {
                        anyhow::bail!("{key} must be greater than zero");
                    }
                    Ok(Duration::from_secs(value))
                }
            }
        };

        Ok(Self {
            teardown_poll_interval: secs(
                "CLUSTERDNS_TEARDOWN_POLL_INTERVAL",
                defaults.teardown_poll_interval,
            )?,
            teardown_timeout: secs("CLUSTERDNS_TEARDOWN_TIMEOUT", defaults.teardown_timeout)?,
            component_poll_interval: secs(
                "CLUSTERDNS_COMPONENT_POLL_INTERVAL",
                defaults.component_poll_interval,
            )?,
            component_wait_timeout: secs(
                "CLUSTERDNS_COMPONENT_WAIT_TIMEOUT",
                defaults.component_wait_timeout,
            )?,
            field_manager: lookup("CLUSTERDNS_FIELD_MANAGER").unwrap_or(defaults.field_manager),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
