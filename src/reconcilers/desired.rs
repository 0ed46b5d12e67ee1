// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state construction.
//!
//! The built-in external and internal categories are decided by pure functions
//! returning a [`CategoryPlan`]: when a category is not needed its provider and entry
//! become identity-only destroy operations instead of being left out.
//!
//! Additional providers are validated first (pure), then their credentials are
//! fetched. Both stages run before any mutating call is issued for the pass.

use crate::client::SecretStore;
use crate::config::{ClusterDnsConfig, DnsProviderConfig};
use crate::constants::{
    API_SERVER_RECORD_PREFIX, DEFAULT_ENTRY_TTL_SECS, DNS_EXTERNAL_NAME, DNS_INTERNAL_NAME,
    DNS_UNMANAGED,
};
use crate::errors::{DnsReconcileError, Result};
use crate::labels::ManagedCategory;
use crate::naming::generate_dns_provider_name;
use crate::reconcilers::with_cancellation;
use crate::types::{EntrySpec, IncludeExclude, Operation, ProviderSpec};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Provider and entry operations of one built-in category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryPlan {
    pub category: ManagedCategory,
    pub provider: Operation<ProviderSpec>,
    pub entry: Operation<EntrySpec>,
}

impl CategoryPlan {
    /// Whether the category's provider should exist after this pass.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.provider.is_destroy()
    }

    fn removed(name: &str, category: ManagedCategory) -> Self {
        Self {
            category,
            provider: Operation::Destroy(ProviderSpec::destroy_only(name, category)),
            entry: Operation::Destroy(EntrySpec::destroy_only(name)),
        }
    }
}

/// Entry operation for an active built-in category.
///
/// The entry is only created once its name and target are known; until then it is
/// removed.
fn api_entry(name: &str, cluster_domain: &str, api_server_address: Option<&str>) -> Operation<EntrySpec> {
    match api_server_address.filter(|address| !address.is_empty() && !cluster_domain.is_empty()) {
        Some(address) => Operation::Create(EntrySpec {
            name: name.to_string(),
            dns_name: Some(format!("{API_SERVER_RECORD_PREFIX}{cluster_domain}")),
            targets: vec![address.to_string()],
            ttl: Some(DEFAULT_ENTRY_TTL_SECS),
        }),
        None => Operation::Destroy(EntrySpec::destroy_only(name)),
    }
}

/// Decide the external category.
///
/// Includes the configured include-domains plus the cluster's own external domain.
#[must_use]
pub fn external_dns(config: &ClusterDnsConfig, needed: bool) -> CategoryPlan {
    let (true, Some(domain), Some(cluster_domain)) = (
        needed,
        config.external_domain.as_ref(),
        config.external_cluster_domain.as_deref(),
    ) else {
        return CategoryPlan::removed(DNS_EXTERNAL_NAME, ManagedCategory::External);
    };

    let include = domain
        .include_domains
        .iter()
        .cloned()
        .chain(std::iter::once(cluster_domain.to_string()));

    CategoryPlan {
        category: ManagedCategory::External,
        provider: Operation::Create(ProviderSpec {
            name: DNS_EXTERNAL_NAME.to_string(),
            purpose: DNS_EXTERNAL_NAME.to_string(),
            labels: ManagedCategory::External.labels(),
            provider_type: Some(domain.provider.clone()),
            secret_data: domain.secret_data.clone(),
            domains: IncludeExclude::new(include, domain.exclude_domains.clone()),
            zones: IncludeExclude::new(
                domain.include_zones.iter().cloned(),
                domain.exclude_zones.clone(),
            ),
        }),
        entry: api_entry(
            DNS_EXTERNAL_NAME,
            cluster_domain,
            config.api_server_address.as_deref(),
        ),
    }
}

/// Decide the internal category.
///
/// The cluster's own internal domain is the sole include; configured domain lists of
/// the internal domain are not used. Without an internal cluster domain the provider
/// would be unrestricted, so the category is removed until one is known.
#[must_use]
pub fn internal_dns(config: &ClusterDnsConfig, needed: bool) -> CategoryPlan {
    let (true, Some(domain), Some(cluster_domain)) = (
        needed,
        config.internal_domain.as_ref(),
        config
            .internal_cluster_domain
            .as_deref()
            .filter(|domain| !domain.is_empty()),
    ) else {
        return CategoryPlan::removed(DNS_INTERNAL_NAME, ManagedCategory::Internal);
    };

    CategoryPlan {
        category: ManagedCategory::Internal,
        provider: Operation::Create(ProviderSpec {
            name: DNS_INTERNAL_NAME.to_string(),
            purpose: DNS_INTERNAL_NAME.to_string(),
            labels: ManagedCategory::Internal.labels(),
            provider_type: Some(domain.provider.clone()),
            secret_data: domain.secret_data.clone(),
            domains: IncludeExclude::new(std::iter::once(cluster_domain.to_string()), Vec::new()),
            zones: IncludeExclude::new(
                domain.include_zones.iter().cloned(),
                domain.exclude_zones.clone(),
            ),
        }),
        entry: api_entry(
            DNS_INTERNAL_NAME,
            cluster_domain,
            config.api_server_address.as_deref(),
        ),
    }
}

/// A validated additional provider still missing its credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdditionalProviderDecl {
    /// Position in the declared list.
    pub index: usize,
    /// Generated resource name.
    pub name: String,
    pub provider_type: String,
    pub secret_name: String,
    pub domains: IncludeExclude,
    pub zones: IncludeExclude,
}

fn filter_or_default(filter: Option<&IncludeExclude>) -> IncludeExclude {
    filter
        .map(|f| IncludeExclude::new(f.include.iter().cloned(), f.exclude.clone()))
        .unwrap_or_default()
}

fn validate_additional(index: usize, provider: &DnsProviderConfig) -> Result<Option<AdditionalProviderDecl>> {
    let Some(provider_type) = provider.provider_type.as_deref() else {
        return Err(DnsReconcileError::Configuration {
            index,
            field: "type",
        });
    };

    if provider_type == DNS_UNMANAGED {
        info!(
            index,
            "Skipping deployment of DNS provider[{index}] since it specifies type {DNS_UNMANAGED:?}"
        );
        return Ok(None);
    }

    let Some(secret_name) = provider.secret_name.as_deref() else {
        return Err(DnsReconcileError::Configuration {
            index,
            field: "secretName",
        });
    };

    Ok(Some(AdditionalProviderDecl {
        index,
        name: generate_dns_provider_name(secret_name, provider_type),
        provider_type: provider_type.to_string(),
        secret_name: secret_name.to_string(),
        domains: filter_or_default(provider.domains.as_ref()),
        zones: filter_or_default(provider.zones.as_ref()),
    }))
}

/// Validate the declared additional providers in declaration order.
///
/// Primary providers and "unmanaged" providers are skipped.
///
/// # Errors
///
/// Returns [`DnsReconcileError::Configuration`] for the first provider (by index) that
/// lacks a type, or lacks a secret name while not being "unmanaged".
pub fn declared_additional_providers(config: &ClusterDnsConfig) -> Result<Vec<AdditionalProviderDecl>> {
    let mut declared = Vec::new();
    for (index, provider) in config.dns_providers().iter().enumerate() {
        if provider.is_primary() {
            debug!(index, "Skipping primary DNS provider; it is served by the external domain");
            continue;
        }
        if let Some(decl) = validate_additional(index, provider)? {
            declared.push(decl);
        }
    }
    Ok(declared)
}

/// Build the desired additional providers keyed by resource name.
///
/// Returns an empty map when additional providers are not needed, so that every live
/// additional provider becomes an orphan.
///
/// # Errors
///
/// - [`DnsReconcileError::Configuration`] - see [`declared_additional_providers`]
/// - [`DnsReconcileError::MissingProjectNamespace`] - providers need credentials but no
///   project namespace is configured
/// - [`DnsReconcileError::SecretResolution`] - a credentials secret could not be read
/// - [`DnsReconcileError::Cancelled`] - the caller cancelled during a secret fetch
pub async fn additional_dns_providers(
    secrets: &dyn SecretStore,
    config: &ClusterDnsConfig,
    needed: bool,
    cancel: &CancellationToken,
) -> Result<BTreeMap<String, ProviderSpec>> {
    let mut desired = BTreeMap::new();
    if !needed {
        return Ok(desired);
    }

    let declared = declared_additional_providers(config)?;
    if !declared.is_empty() && config.project_namespace.is_empty() {
        return Err(DnsReconcileError::MissingProjectNamespace);
    }

    for decl in declared {
        let secret_data = with_cancellation(
            cancel,
            secrets.get_secret(&config.project_namespace, &decl.secret_name),
        )
        .await?
        .map_err(|source| DnsReconcileError::SecretResolution {
            secret_name: decl.secret_name.clone(),
            source,
        })?;

        debug!(
            index = decl.index,
            name = %decl.name,
            secret = %decl.secret_name,
            "Resolved additional DNS provider"
        );

        desired.insert(
            decl.name.clone(),
            ProviderSpec {
                name: decl.name.clone(),
                purpose: decl.name,
                labels: ManagedCategory::Additional.labels(),
                provider_type: Some(decl.provider_type),
                secret_data,
                domains: decl.domains,
                zones: decl.zones,
            },
        );
    }

    Ok(desired)
}

#[cfg(test)]
#[path = "desired_tests.rs"]
mod desired_tests;
