// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of a cluster's DNS providers and entries.
//!
//! One pass runs these stages strictly in sequence:
//!
//! 1. **Evaluate** - [`crate::requirements`] decides which categories are needed
//! 2. **Desire** - [`desired`] builds provider/entry specs (no mutating calls yet)
//! 3. **Observe** - [`live`] lists live additional providers by marker label
//! 4. **Diff** - [`plan`] turns desired + live into create/destroy operations
//! 5. **Apply** - [`lifecycle`] runs the operations in dependency order
//!
//! # Available Entry Points
//!
//! - [`reconcile_dns`] - Plan and apply one pass for a namespace
//! - [`plan_dns`] - Plan only; issues no mutating calls
//! - [`delete_dns_providers`] - Remove every provider in a namespace and wait
//!
//! # Example
//!
//! ```rust,no_run
//! use clusterdns::config::ClusterDnsConfig;
//! use clusterdns::context::Context;
//! use clusterdns::reconcilers::reconcile_dns;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn run(ctx: Context, config: ClusterDnsConfig) -> anyhow::Result<()> {
//!     let cancel = CancellationToken::new();
//!     reconcile_dns(&ctx, "shoot--dev--a", &config, &cancel).await?;
//!     Ok(())
//! }
//! ```

pub mod desired;
pub mod dns;
pub mod lifecycle;
pub mod live;
pub mod plan;

pub use dns::{apply_dns_plan, delete_dns_providers, plan_dns, reconcile_dns, DnsPlan};

use crate::errors::{DnsReconcileError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Run a collaborator call unless the caller cancels first.
///
/// Cancellation drops the in-flight future and surfaces as
/// [`DnsReconcileError::Cancelled`]; the call's own outcome is returned otherwise.
pub(crate) async fn with_cancellation<T, F>(
    cancel: &CancellationToken,
    call: F,
) -> Result<anyhow::Result<T>>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DnsReconcileError::Cancelled),
        outcome = call => Ok(outcome),
    }
}

#[cfg(test)]
pub(crate) mod test_support;
