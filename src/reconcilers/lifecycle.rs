// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ordered execution of DNS lifecycle operations.
//!
//! A built-in category is driven as an explicit two-step pipeline whose order depends
//! on its direction:
//!
//! | category | step 1           | step 2           |
//! |----------|------------------|------------------|
//! | active   | deploy provider  | deploy entry     |
//! | inactive | destroy entry    | destroy provider |
//!
//! An entry must never reference a provider that does not exist, so a failed step
//! skips the rest of its pipeline. Deploying waits for readiness, destroying waits for
//! the object to disappear.
//!
//! Full-namespace teardown is a single bulk delete followed by a bounded poll.

use crate::client::DnsComponent;
use crate::context::Context;
use crate::errors::{DnsReconcileError, Result};
use crate::labels::provider_credentials_selector;
use crate::reconcilers::desired::CategoryPlan;
use crate::reconcilers::with_cancellation;
use crate::types::{Action, EntrySpec, Operation, ProviderSpec, ReconcilePlan, ResourceKind};
use std::collections::BTreeMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The object a pipeline step acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Provider(ProviderSpec),
    Entry(EntrySpec),
}

impl Component {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Provider(_) => ResourceKind::DnsProvider,
            Self::Entry(_) => ResourceKind::DnsEntry,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Provider(spec) => &spec.name,
            Self::Entry(spec) => &spec.name,
        }
    }
}

/// One lifecycle call in a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub action: Action,
    pub component: Component,
}

impl Step {
    fn provider(op: &Operation<ProviderSpec>) -> Self {
        Self {
            action: op.action(),
            component: Component::Provider(op.spec().clone()),
        }
    }

    fn entry(op: &Operation<EntrySpec>) -> Self {
        Self {
            action: op.action(),
            component: Component::Entry(op.spec().clone()),
        }
    }
}

/// Order the provider and entry operations of a built-in category.
///
/// Provider first when the provider is being deployed, entry first otherwise.
#[must_use]
pub fn category_pipeline(plan: &CategoryPlan) -> [Step; 2] {
    if plan.is_active() {
        [Step::provider(&plan.provider), Step::entry(&plan.entry)]
    } else {
        [Step::entry(&plan.entry), Step::provider(&plan.provider)]
    }
}

/// Drives lifecycle calls for one namespace within one pass.
pub struct LifecycleOrchestrator<'a> {
    ctx: &'a Context,
    namespace: &'a str,
    cancel: &'a CancellationToken,
}

impl<'a> LifecycleOrchestrator<'a> {
    #[must_use]
    pub fn new(ctx: &'a Context, namespace: &'a str, cancel: &'a CancellationToken) -> Self {
        Self {
            ctx,
            namespace,
            cancel,
        }
    }

    fn render(&self, component: &Component) -> Box<dyn DnsComponent> {
        match component {
            Component::Provider(spec) => self.ctx.renderer.provider(self.namespace, spec),
            Component::Entry(spec) => self.ctx.renderer.entry(self.namespace, spec),
        }
    }

    /// Run one step: deploy + wait, or destroy + wait for cleanup.
    ///
    /// # Errors
    ///
    /// - [`DnsReconcileError::Apply`] - the collaborator rejected a call
    /// - [`DnsReconcileError::Cancelled`] - the caller cancelled during a call
    pub async fn run_step(&self, step: &Step) -> Result<()> {
        let kind = step.component.kind();
        let name = step.component.name();
        let rendered = self.render(&step.component);

        info!(
            namespace = %self.namespace,
            kind = %kind,
            name = %name,
            action = %step.action,
            "Applying DNS lifecycle step"
        );

        let outcome = match step.action {
            Action::Deploy => {
                match with_cancellation(self.cancel, rendered.deploy()).await? {
                    Ok(()) => with_cancellation(self.cancel, rendered.wait()).await?,
                    Err(e) => Err(e),
                }
            }
            Action::Destroy => {
                match with_cancellation(self.cancel, rendered.destroy()).await? {
                    Ok(()) => with_cancellation(self.cancel, rendered.wait_cleanup()).await?,
                    Err(e) => Err(e),
                }
            }
        };

        outcome.map_err(|source| DnsReconcileError::Apply {
            kind,
            name: name.to_string(),
            action: step.action,
            source,
        })
    }

    /// Run a category pipeline, stopping at the first failed step.
    ///
    /// # Errors
    ///
    /// Returns the error of the failed step; later steps are not attempted.
    pub async fn run_category(&self, plan: &CategoryPlan) -> Result<()> {
        for step in category_pipeline(plan) {
            if let Err(e) = self.run_step(&step).await {
                if !e.is_cancelled() {
                    error!(
                        namespace = %self.namespace,
                        category = %plan.category,
                        error = %e,
                        "DNS lifecycle step failed, skipping dependent steps"
                    );
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Apply every operation of an additional-provider plan, in name order.
    ///
    /// A failed operation does not stop its siblings; the first failure is returned
    /// once all of them have been attempted. Cancellation stops immediately.
    ///
    /// # Errors
    ///
    /// Returns the first [`DnsReconcileError::Apply`], or
    /// [`DnsReconcileError::Cancelled`].
    pub async fn run_plan(&self, plan: &ReconcilePlan) -> Result<()> {
        let mut first_failure = None;

        for (name, op) in plan {
            let step = Step::provider(op);
            match self.run_step(&step).await {
                Ok(()) => {}
                Err(DnsReconcileError::Cancelled) => return Err(DnsReconcileError::Cancelled),
                Err(e) => {
                    error!(
                        namespace = %self.namespace,
                        name = %name,
                        error = %e,
                        "Failed to apply additional DNS provider"
                    );
                    first_failure.get_or_insert(e);
                }
            }
        }

        first_failure.map_or(Ok(()), Err)
    }

    /// Delete every DNS provider in the namespace and wait until none is listed.
    ///
    /// Polls at the configured fixed interval until the list comes back empty or the
    /// teardown deadline elapses. The credentials secrets applied next to the providers
    /// are removed once no provider references them any more.
    ///
    /// # Errors
    ///
    /// - [`DnsReconcileError::Teardown`] - a bulk delete call failed
    /// - [`DnsReconcileError::Query`] - a poll list call failed
    /// - [`DnsReconcileError::TeardownTimeout`] - providers remained past the deadline
    /// - [`DnsReconcileError::Cancelled`] - the caller cancelled
    pub async fn delete_all_providers(&self) -> Result<()> {
        let everything = BTreeMap::new();
        let interval = self.ctx.settings.teardown_poll_interval;
        let timeout = self.ctx.settings.teardown_timeout;

        info!(namespace = %self.namespace, "Deleting all DNS providers");
        with_cancellation(
            self.cancel,
            self.ctx
                .client
                .delete_all_matching(ResourceKind::DnsProvider, self.namespace, &everything),
        )
        .await?
        .map_err(|source| DnsReconcileError::Teardown {
            namespace: self.namespace.to_string(),
            source,
        })?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = with_cancellation(
                self.cancel,
                self.ctx
                    .client
                    .list(ResourceKind::DnsProvider, self.namespace, &everything),
            )
            .await?
            .map_err(DnsReconcileError::Query)?;

            if remaining.is_empty() {
                info!(namespace = %self.namespace, "All DNS providers deleted");
                return self.delete_provider_credentials().await;
            }

            let remaining: Vec<String> = remaining.into_iter().map(|r| r.name).collect();
            if Instant::now() >= deadline {
                warn!(
                    namespace = %self.namespace,
                    remaining = ?remaining,
                    timeout = ?timeout,
                    "DNS providers still present after teardown deadline"
                );
                return Err(DnsReconcileError::TeardownTimeout {
                    namespace: self.namespace.to_string(),
                    timeout,
                    remaining,
                });
            }

            debug!(
                namespace = %self.namespace,
                remaining = remaining.len(),
                retry_after = ?interval,
                "Waiting for DNS providers to be deleted"
            );

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(DnsReconcileError::Cancelled),
                () = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn delete_provider_credentials(&self) -> Result<()> {
        with_cancellation(
            self.cancel,
            self.ctx
                .client
                .delete_provider_credentials(self.namespace, &provider_credentials_selector()),
        )
        .await?
        .map_err(|source| DnsReconcileError::Teardown {
            namespace: self.namespace.to_string(),
            source,
        })?;
        debug!(namespace = %self.namespace, "Deleted DNS provider credentials");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
