// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Predicates deciding which DNS categories a cluster needs.
//!
//! All three are pure functions of the configuration snapshot and are evaluated once
//! per pass. A `false` result does not mean "do nothing": it turns the category's
//! resources into destroy operations.

use crate::config::ClusterDnsConfig;
use crate::constants::{DNS_UNMANAGED, WILDCARD_DNS_SUFFIX};

/// Whether the cluster needs the external provider and entry.
#[must_use]
pub fn needs_external_dns(config: &ClusterDnsConfig) -> bool {
    let declares_domain = config
        .dns
        .as_ref()
        .and_then(|dns| dns.domain.as_deref())
        .is_some_and(|domain| !domain.is_empty());

    let has_routable_domain = config
        .external_cluster_domain
        .as_deref()
        .is_some_and(|domain| !domain.is_empty() && !domain.ends_with(WILDCARD_DNS_SUFFIX));

    !config.disable_dns
        && declares_domain
        && has_routable_domain
        && config
            .external_domain
            .as_ref()
            .is_some_and(|domain| domain.provider != DNS_UNMANAGED)
}

/// Whether the cluster needs the internal provider and entry.
#[must_use]
pub fn needs_internal_dns(config: &ClusterDnsConfig) -> bool {
    !config.disable_dns
        && config
            .internal_domain
            .as_ref()
            .is_some_and(|domain| domain.provider != DNS_UNMANAGED)
}

/// Whether the cluster declares providers beyond the built-in pair.
#[must_use]
pub fn needs_additional_dns_providers(config: &ClusterDnsConfig) -> bool {
    !config.disable_dns && !config.dns_providers().is_empty()
}

/// Outcome of all three predicates for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DnsRequirements {
    pub external: bool,
    pub internal: bool,
    pub additional: bool,
}

impl DnsRequirements {
    /// Evaluate all predicates against one snapshot.
    #[must_use]
    pub fn evaluate(config: &ClusterDnsConfig) -> Self {
        Self {
            external: needs_external_dns(config),
            internal: needs_internal_dns(config),
            additional: needs_additional_dns_providers(config),
        }
    }
}

#[cfg(test)]
#[path = "requirements_tests.rs"]
mod requirements_tests;
