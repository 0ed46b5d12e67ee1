// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use clusterdns::{
    config::{ClusterDnsConfig, ReconcilerSettings},
    constants::TOKIO_WORKER_THREADS,
    crd::{DNSEntry, DNSProvider},
    errors::DnsReconcileError,
    kube_client::kube_context,
    reconcilers::{apply_dns_plan, delete_dns_providers, plan_dns, DnsPlan},
};
use kube::{Client, CustomResourceExt};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Exit code for any other failure
const EXIT_FAILURE: u8 = 1;

/// Exit code when the caller interrupted the run
const EXIT_CANCELLED: u8 = 130;

/// Exit code when teardown gave up waiting for providers to disappear
const EXIT_TEARDOWN_TIMEOUT: u8 = 2;

/// clusterdns - DNS provider and entry reconciliation for a managed cluster namespace
#[derive(Parser, Debug)]
#[command(name = "clusterdns", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass for a namespace
    Reconcile {
        /// Namespace holding the cluster's DNS objects
        #[arg(long, env = "CLUSTERDNS_NAMESPACE")]
        namespace: String,

        /// Cluster DNS configuration (YAML)
        #[arg(long, env = "CLUSTERDNS_CONFIG")]
        config: PathBuf,

        /// Compute and print the plan without applying it
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete every DNS provider in a namespace and wait until they are gone
    Teardown {
        /// Namespace holding the cluster's DNS objects
        #[arg(long, env = "CLUSTERDNS_NAMESPACE")]
        namespace: String,

        /// Seconds to wait for providers to disappear
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print the DNSProvider and DNSEntry CRDs as YAML
    Crds,
}

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("clusterdns")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to build tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async_main())
}

fn init_tracing() {
    // Respects RUST_LOG (default info) and RUST_LOG_FORMAT (json|text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    debug!("Logging initialized with file and line number tracking");

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    match run(cli.command, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(exit_code(&e)),
    }
}

/// Map a failed run to a process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DnsReconcileError>() {
        Some(e) if e.is_cancelled() => {
            warn!("{e}");
            EXIT_CANCELLED
        }
        Some(e) if e.is_timeout() => {
            error!("{e}");
            EXIT_TEARDOWN_TIMEOUT
        }
        _ => {
            error!("{err:#}");
            EXIT_FAILURE
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    cancel_on_signal(tokio::signal::ctrl_c(), cancel).await;
}

/// Cancel `cancel` once `signal` fires; a failed listener leaves it untouched.
async fn cancel_on_signal<F>(signal: F, cancel: CancellationToken)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
        Err(e) => error!("Failed to listen for interrupt: {e}"),
    }
}

async fn run(command: Commands, cancel: &CancellationToken) -> Result<()> {
    match command {
        Commands::Reconcile {
            namespace,
            config,
            dry_run,
        } => reconcile(&namespace, &config, dry_run, cancel).await,
        Commands::Teardown { namespace, timeout } => teardown(&namespace, timeout, cancel).await,
        Commands::Crds => print_crds(),
    }
}

async fn connect(settings: ReconcilerSettings) -> Result<clusterdns::context::Context> {
    debug!("Initializing Kubernetes client");
    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    debug!("Kubernetes client initialized successfully");
    Ok(kube_context(client, settings))
}

async fn reconcile(
    namespace: &str,
    config_path: &Path,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = ClusterDnsConfig::from_yaml_file(config_path)?;
    let ctx = connect(ReconcilerSettings::from_env()?).await?;

    info!(namespace = %namespace, dry_run, "Starting DNS reconciliation");
    let plan = plan_dns(&ctx, namespace, &config, cancel).await?;
    log_plan(namespace, &plan);

    if dry_run {
        return Ok(());
    }
    apply_dns_plan(&ctx, namespace, &plan, cancel).await?;
    info!(namespace = %namespace, "DNS reconciliation complete");
    Ok(())
}

fn log_plan(namespace: &str, plan: &DnsPlan) {
    for category in [&plan.internal, &plan.external] {
        info!(
            namespace = %namespace,
            category = %category.category,
            action = %category.provider.action(),
            "Planned DNS category"
        );
    }
    for (name, op) in &plan.additional {
        info!(
            namespace = %namespace,
            provider = %name,
            action = %op.action(),
            "Planned additional DNS provider"
        );
    }
}

async fn teardown(namespace: &str, timeout: Option<u64>, cancel: &CancellationToken) -> Result<()> {
    let mut settings = ReconcilerSettings::from_env()?;
    if let Some(secs) = timeout {
        anyhow::ensure!(secs > 0, "--timeout must be greater than zero");
        settings.teardown_timeout = Duration::from_secs(secs);
    }
    let ctx = connect(settings).await?;

    delete_dns_providers(&ctx, namespace, cancel).await?;
    Ok(())
}

fn print_crds() -> Result<()> {
    for crd in [DNSProvider::crd(), DNSEntry::crd()] {
        let yaml = serde_yaml::to_string(&crd).context("failed to serialize CRD")?;
        println!("---\n{yaml}");
    }
    Ok(())
}
