// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired/live diff for additional DNS providers.
//!
//! The diff is a pure function over names. There is no field-level comparison: a
//! desired provider is always (re-)applied wholesale, and only live providers missing
//! from the desired set are destroyed.

use crate::labels::ManagedCategory;
use crate::types::{ManagedResourceRef, Operation, ProviderSpec, ReconcilePlan};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Names of live resources.
#[must_use]
pub fn live_names(live: &[ManagedResourceRef]) -> BTreeSet<String> {
    live.iter().map(|resource| resource.name.clone()).collect()
}

/// Compute the operations turning `live` into `desired`.
///
/// - desired (live or not) → [`Operation::Create`] with the freshly built spec
/// - live only → [`Operation::Destroy`] with an identity-only additional spec
#[must_use]
pub fn diff(desired: BTreeMap<String, ProviderSpec>, live: &BTreeSet<String>) -> ReconcilePlan {
    let mut plan: ReconcilePlan = desired
        .into_iter()
        .map(|(name, spec)| (name, Operation::Create(spec)))
        .collect();

    for name in live {
        if !plan.contains_key(name) {
            info!(name = %name, "DNS provider is no longer declared, scheduling removal");
            plan.insert(
                name.clone(),
                Operation::Destroy(ProviderSpec::destroy_only(name, ManagedCategory::Additional)),
            );
        }
    }

    plan
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod plan_tests;
