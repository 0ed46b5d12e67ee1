// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Entry points of a DNS reconciliation pass for one namespace.

use crate::config::ClusterDnsConfig;
use crate::context::Context;
use crate::errors::{DnsReconcileError, Result};
use crate::labels::ManagedCategory;
use crate::reconcilers::desired::{additional_dns_providers, external_dns, internal_dns, CategoryPlan};
use crate::reconcilers::lifecycle::LifecycleOrchestrator;
use crate::reconcilers::live::list_managed_providers;
use crate::reconcilers::plan::{diff, live_names};
use crate::requirements::DnsRequirements;
use crate::types::ReconcilePlan;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Everything one pass intends to do, computed before any mutating call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsPlan {
    pub requirements: DnsRequirements,
    pub internal: CategoryPlan,
    pub external: CategoryPlan,
    pub additional: ReconcilePlan,
}

impl DnsPlan {
    /// Names of additional providers scheduled for removal.
    #[must_use]
    pub fn destroyed_additional(&self) -> Vec<&str> {
        self.additional
            .iter()
            .filter(|(_, op)| op.is_destroy())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Compute the plan for `namespace` without mutating anything.
///
/// # Errors
///
/// - [`DnsReconcileError::Configuration`] - an additional provider is misdeclared
/// - [`DnsReconcileError::MissingProjectNamespace`] - no namespace to read credentials from
/// - [`DnsReconcileError::SecretResolution`] - a provider secret could not be read
/// - [`DnsReconcileError::Query`] - live providers could not be listed
/// - [`DnsReconcileError::Cancelled`] - the caller cancelled
pub async fn plan_dns(
    ctx: &Context,
    namespace: &str,
    config: &ClusterDnsConfig,
    cancel: &CancellationToken,
) -> Result<DnsPlan> {
    let requirements = DnsRequirements::evaluate(config);
    debug!(
        namespace = %namespace,
        external = requirements.external,
        internal = requirements.internal,
        additional = requirements.additional,
        "Evaluated DNS requirements"
    );

    let internal = internal_dns(config, requirements.internal);
    let external = external_dns(config, requirements.external);
    let desired =
        additional_dns_providers(ctx.secrets.as_ref(), config, requirements.additional, cancel)
            .await?;

    let live = list_managed_providers(
        ctx.client.as_ref(),
        namespace,
        ManagedCategory::Additional,
        cancel,
    )
    .await?;
    let additional = diff(desired, &live_names(&live));

    Ok(DnsPlan {
        requirements,
        internal,
        external,
        additional,
    })
}

/// Apply a computed plan: internal category, external category, then additional
/// providers.
///
/// The three groups are independent; a failure in one does not stop the others. The
/// first failure is returned after all groups ran. Cancellation stops immediately.
///
/// # Errors
///
/// - [`DnsReconcileError::Apply`] - a lifecycle call failed
/// - [`DnsReconcileError::Cancelled`] - the caller cancelled
pub async fn apply_dns_plan(
    ctx: &Context,
    namespace: &str,
    plan: &DnsPlan,
    cancel: &CancellationToken,
) -> Result<()> {
    let orchestrator = LifecycleOrchestrator::new(ctx, namespace, cancel);
    let mut first_failure: Option<DnsReconcileError> = None;

    for category in [&plan.internal, &plan.external] {
        match orchestrator.run_category(category).await {
            Err(DnsReconcileError::Cancelled) => return Err(DnsReconcileError::Cancelled),
            Err(e) => {
                first_failure.get_or_insert(e);
            }
            Ok(()) => {}
        }
    }

    match orchestrator.run_plan(&plan.additional).await {
        Err(DnsReconcileError::Cancelled) => return Err(DnsReconcileError::Cancelled),
        Err(e) => {
            first_failure.get_or_insert(e);
        }
        Ok(()) => {}
    }

    first_failure.map_or(Ok(()), Err)
}

/// Run one full reconciliation pass for `namespace`.
///
/// Every error of the planning stage aborts the pass before any mutating call.
///
/// # Errors
///
/// See [`plan_dns`] and [`apply_dns_plan`].
pub async fn reconcile_dns(
    ctx: &Context,
    namespace: &str,
    config: &ClusterDnsConfig,
    cancel: &CancellationToken,
) -> Result<DnsPlan> {
    info!(namespace = %namespace, "Reconciling DNS providers and entries");

    let plan = plan_dns(ctx, namespace, config, cancel).await?;
    apply_dns_plan(ctx, namespace, &plan, cancel).await?;

    info!(
        namespace = %namespace,
        external = plan.external.is_active(),
        internal = plan.internal.is_active(),
        additional = plan.additional.len(),
        removed = plan.destroyed_additional().len(),
        "DNS reconciliation complete"
    );
    Ok(plan)
}

/// Delete every DNS provider in `namespace` and wait for them to disappear.
///
/// # Errors
///
/// See [`LifecycleOrchestrator::delete_all_providers`].
pub async fn delete_dns_providers(
    ctx: &Context,
    namespace: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    LifecycleOrchestrator::new(ctx, namespace, cancel)
        .delete_all_providers()
        .await
}

#[cfg(test)]
#[path = "dns_tests.rs"]
mod dns_tests;
