// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the cluster DNS reconciler.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group of the DNS management CRDs
pub const API_GROUP: &str = "dns.gardener.cloud";

/// API version of the DNS management CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Kind name for `DNSProvider` resource
pub const KIND_DNS_PROVIDER: &str = "DNSProvider";

/// Kind name for `DNSEntry` resource
pub const KIND_DNS_ENTRY: &str = "DNSEntry";

// ============================================================================
// Resource Names
// ============================================================================

/// Name (and purpose) of the DNS resources backing the internal domain
pub const DNS_INTERNAL_NAME: &str = "internal";

/// Name (and purpose) of the DNS resources backing the external domain
pub const DNS_EXTERNAL_NAME: &str = "external";

/// Prefix of the `Secret` holding a provider's credentials
pub const PROVIDER_SECRET_PREFIX: &str = "dnsprovider-";

/// Prefix prepended to a cluster domain to form the API server record name
pub const API_SERVER_RECORD_PREFIX: &str = "api.";

// ============================================================================
// Provider Sentinels
// ============================================================================

/// Provider type meaning "DNS for this domain is not managed by us"
pub const DNS_UNMANAGED: &str = "unmanaged";

/// Suffix of wildcard DNS services; such domains never get a provider
pub const WILDCARD_DNS_SUFFIX: &str = ".nip.io";

// ============================================================================
// Timing Constants
// ============================================================================

/// Interval between list calls while waiting for a full teardown (5 seconds)
pub const TEARDOWN_POLL_INTERVAL_SECS: u64 = 5;

/// Default deadline for a full teardown (5 minutes)
pub const DEFAULT_TEARDOWN_TIMEOUT_SECS: u64 = 300;

/// Default deadline for a single component to become ready or disappear (2 minutes)
pub const DEFAULT_COMPONENT_WAIT_TIMEOUT_SECS: u64 = 120;

/// Interval between status checks while waiting on a single component (2 seconds)
pub const COMPONENT_POLL_INTERVAL_SECS: u64 = 2;

/// Default TTL for the built-in DNS entries (2 minutes)
pub const DEFAULT_ENTRY_TTL_SECS: i64 = 120;

// ============================================================================
// Controller Identity
// ============================================================================

/// Field manager used for server-side apply
pub const DEFAULT_FIELD_MANAGER: &str = "clusterdns";

/// `DNSProvider` / `DNSEntry` status state once the DNS controller has accepted it
pub const STATE_READY: &str = "Ready";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;
