// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for DNS reconciliation passes.
//!
//! Every variant is fatal for the pass that produced it. No rollback is attempted: the
//! cluster keeps whatever the already-issued calls produced and the next pass is
//! expected to converge it further.

use crate::types::{Action, ResourceKind};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a reconciliation or teardown pass.
#[derive(Error, Debug)]
pub enum DnsReconcileError {
    /// A declared additional provider is missing a required field.
    ///
    /// Raised while building the desired state, before any mutating call is issued.
    #[error("dns provider[{index}] doesn't specify a {field}")]
    Configuration {
        /// Position of the provider in the declared list
        index: usize,
        /// Name of the missing field ("type" or "secretName")
        field: &'static str,
    },

    /// Additional providers are declared but there is no namespace to read their
    /// credentials from.
    #[error("projectNamespace is required when additional DNS providers are declared")]
    MissingProjectNamespace,

    /// The credentials secret of an additional provider could not be read.
    #[error("could not get dns provider secret {secret_name:?}: {source}")]
    SecretResolution {
        /// Name of the secret that was requested
        secret_name: String,
        /// Underlying secret store error
        #[source]
        source: anyhow::Error,
    },

    /// Listing live resources failed; the desired/live diff cannot be trusted.
    #[error(transparent)]
    Query(anyhow::Error),

    /// A deploy or destroy call on a single resource failed.
    #[error("failed to {action} {kind} {name:?}: {source}")]
    Apply {
        /// Kind of the failed resource
        kind: ResourceKind,
        /// Name of the failed resource
        name: String,
        /// What was being attempted
        action: Action,
        /// Underlying collaborator error
        #[source]
        source: anyhow::Error,
    },

    /// The bulk delete call of a full teardown failed.
    #[error("failed to delete DNS providers in namespace {namespace:?}: {source}")]
    Teardown {
        namespace: String,
        #[source]
        source: anyhow::Error,
    },

    /// Resources were still present when the teardown deadline elapsed.
    #[error("DNS providers in namespace {namespace:?} still present after {timeout:?}")]
    TeardownTimeout {
        /// Namespace being torn down
        namespace: String,
        /// Deadline that elapsed
        timeout: Duration,
        /// Names still listed on the last poll
        remaining: Vec<String>,
    },

    /// The caller cancelled the pass while a call was in flight.
    #[error("DNS reconciliation cancelled")]
    Cancelled,
}

impl DnsReconcileError {
    /// Whether the pass ended because the caller cancelled it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the pass ended because the teardown deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TeardownTimeout { .. })
    }
}

/// Result alias used throughout the reconcilers.
pub type Result<T, E = DnsReconcileError> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
