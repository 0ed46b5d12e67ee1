// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # clusterdns - DNS provider and entry reconciliation for managed clusters
//!
//! clusterdns keeps the DNS objects of one managed-cluster namespace in line with the
//! cluster's declared DNS configuration. It drives `DNSProvider` and `DNSEntry` custom
//! resources that a separate DNS controller turns into real records.
//!
//! ## Overview
//!
//! A reconciliation pass:
//!
//! - evaluates which DNS categories the cluster needs (external, internal, additional)
//! - builds the desired provider and entry specs for each category
//! - discovers live additional providers by their marker label and diffs them against
//!   the desired set
//! - applies everything in dependency order (provider before entry on the way up, entry
//!   before provider on the way down)
//!
//! ## Modules
//!
//! - [`requirements`] - Which DNS categories are needed
//! - [`reconcilers`] - Desired state, live state, diff and lifecycle ordering
//! - [`client`] - Collaborator traits the reconcilers talk through
//! - [`kube_client`] - kube-rs implementations of those traits
//! - [`config`] - Cluster DNS configuration and reconciler settings
//! - [`crd`] - `DNSProvider` and `DNSEntry` custom resources
//!
//! ## Example
//!
//! ```rust,no_run
//! use clusterdns::config::{ClusterDnsConfig, ReconcilerSettings};
//! use clusterdns::kube_client::kube_context;
//! use clusterdns::reconcilers::reconcile_dns;
//! use kube::Client;
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClusterDnsConfig::from_yaml_file(Path::new("cluster-dns.yaml"))?;
//! let ctx = kube_context(Client::try_default().await?, ReconcilerSettings::from_env()?);
//!
//! let plan = reconcile_dns(&ctx, "shoot--dev--a", &config, &CancellationToken::new()).await?;
//! println!("removed: {:?}", plan.destroyed_additional());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod kube_client;
pub mod labels;
pub mod naming;
pub mod reconcilers;
pub mod requirements;
pub mod types;
