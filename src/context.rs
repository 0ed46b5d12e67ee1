// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for reconciliation passes.
//!
//! A [`Context`] bundles the collaborators and settings a pass needs. It holds no
//! mutable state, so one context can serve passes for many namespaces concurrently.

use crate::client::{ComponentRenderer, OrchestrationClient, SecretStore};
use crate::config::ReconcilerSettings;
use std::sync::Arc;

/// Shared context passed to every reconciliation pass.
#[derive(Clone)]
pub struct Context {
    /// List and bulk-delete access to the orchestration API
    pub client: Arc<dyn OrchestrationClient>,

    /// Credentials lookup for additional providers
    pub secrets: Arc<dyn SecretStore>,

    /// Turns specs into deployable components
    pub renderer: Arc<dyn ComponentRenderer>,

    /// Timing and identity settings
    pub settings: ReconcilerSettings,
}

impl Context {
    #[must_use]
    pub fn new(
        client: Arc<dyn OrchestrationClient>,
        secrets: Arc<dyn SecretStore>,
        renderer: Arc<dyn ComponentRenderer>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            client,
            secrets,
            renderer,
            settings,
        }
    }
}
