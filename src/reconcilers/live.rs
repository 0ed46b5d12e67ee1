// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Live-state discovery of managed DNS providers.

use crate::client::OrchestrationClient;
use crate::errors::{DnsReconcileError, Result};
use crate::labels::ManagedCategory;
use crate::reconcilers::with_cancellation;
use crate::types::{ManagedResourceRef, ResourceKind};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// List the live providers of `category` in `namespace`.
///
/// Only marker-bearing categories are discoverable; the built-in pair is addressed by
/// name and yields an empty list here. Results are re-checked against the typed
/// category so a collaborator with a loose selector cannot leak other resources into
/// the cleanup set.
///
/// # Errors
///
/// - [`DnsReconcileError::Query`] - the list call failed
/// - [`DnsReconcileError::Cancelled`] - the caller cancelled during the call
pub async fn list_managed_providers(
    client: &dyn OrchestrationClient,
    namespace: &str,
    category: ManagedCategory,
    cancel: &CancellationToken,
) -> Result<Vec<ManagedResourceRef>> {
    let Some(selector) = category.selector() else {
        debug!(namespace = %namespace, %category, "Category has no marker label, nothing to discover");
        return Ok(Vec::new());
    };

    let live = with_cancellation(
        cancel,
        client.list(ResourceKind::DnsProvider, namespace, &selector),
    )
    .await?
    .map_err(DnsReconcileError::Query)?;

    let live: Vec<ManagedResourceRef> = live
        .into_iter()
        .filter(|resource| resource.category() == Some(category))
        .collect();

    debug!(
        namespace = %namespace,
        %category,
        count = live.len(),
        "Discovered live DNS providers"
    );

    Ok(live)
}

#[cfg(test)]
#[path = "live_tests.rs"]
mod live_tests;
