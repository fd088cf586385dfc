// SPDX-License-Identifier: PMPL-1.0-or-later
//! billstore-migrator binary
//!
//! Runs the version gate or a migration pass against a BillStore backend.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use billstore_engine::{Family, StorageKind, VersionError};
use billstore_migrator::{Migrator, MigratorConfig, DEFAULT_TENANT};
use billstore_storage::{InMemoryBackend, StorageBackend};
use clap::Parser;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Offline schema migrator for BillStore billing data.
#[derive(Parser, Debug)]
#[command(name = "billstore-migrator", version = VERSION)]
struct Cli {
    /// Comma-separated family tags to migrate, e.g. `*accounts,*stats`.
    #[arg(long)]
    migrate: Option<String>,

    /// redb database file. Needs the `redb-backend` feature.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Storage engine kind; selects which families are versioned.
    #[arg(long, default_value = "internal")]
    storage_kind: String,

    /// Tenant for entities whose legacy form had none.
    #[arg(long, default_value = DEFAULT_TENANT)]
    tenant: String,

    /// Leave legacy records in place after migrating them.
    #[arg(long)]
    keep_legacy: bool,

    /// Report unsupported families instead of stopping at the first one.
    #[arg(long)]
    continue_on_unsupported: bool,

    /// Transform and log, but write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Only run the version gate and print the remediation command.
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn config(&self) -> anyhow::Result<MigratorConfig> {
        let storage_kind: StorageKind = self.storage_kind.parse()?;
        Ok(MigratorConfig {
            default_tenant: self.tenant.clone(),
            consume_legacy: !self.keep_legacy,
            continue_on_unsupported: self.continue_on_unsupported,
            dry_run: self.dry_run,
            storage_kind,
        })
    }
}

/// Accept the historical single-dash spelling `-migrate=...`.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            if arg == "-migrate" || arg.starts_with("-migrate=") {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

async fn run<B: StorageBackend + Clone>(
    backend: B,
    cli: &Cli,
    config: MigratorConfig,
) -> anyhow::Result<ExitCode> {
    let migrator = Migrator::new(backend, config)?;

    if cli.check {
        return match migrator.check().await {
            Ok(()) => {
                info!(class = %migrator.class(), "stored schema is current");
                Ok(ExitCode::SUCCESS)
            }
            Err(VersionError::Stale { remediation }) => {
                println!("{remediation}");
                Ok(ExitCode::FAILURE)
            }
            Err(VersionError::MigrationRequired) => {
                println!("billstore-migrator");
                Ok(ExitCode::FAILURE)
            }
            Err(err) => Err(err.into()),
        };
    }

    let Some(tags) = cli.migrate.as_deref() else {
        bail!("nothing to do: pass --migrate=<families> or --check");
    };
    let families = Family::parse_list(tags)?;

    match migrator.migrate(&families).await {
        Ok(report) => {
            migrator
                .data()
                .backend()
                .flush()
                .await
                .context("flushing backend")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            info!(migrated = report.migrated(), "migration finished");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(family = ?err.family(), error = %err, "migration failed");
            Err(err.into())
        }
    }
}

#[cfg(feature = "redb-backend")]
async fn open_and_run(cli: &Cli, config: MigratorConfig) -> anyhow::Result<ExitCode> {
    match cli.db_path.as_ref() {
        Some(path) => {
            let backend = billstore_storage::RedbBackend::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            run(backend, cli, config).await
        }
        None => run(InMemoryBackend::new(), cli, config).await,
    }
}

#[cfg(not(feature = "redb-backend"))]
async fn open_and_run(cli: &Cli, config: MigratorConfig) -> anyhow::Result<ExitCode> {
    if let Some(path) = cli.db_path.as_ref() {
        tracing::warn!(path = %path.display(), "built without redb-backend, using an in-memory store");
    }
    run(InMemoryBackend::new(), cli, config).await
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_from(normalize_args(std::env::args()));
    let config = cli.config()?;

    info!(
        storage_kind = %config.storage_kind,
        tenant = %config.default_tenant,
        dry_run = config.dry_run,
        "starting billstore-migrator {VERSION}"
    );

    open_and_run(&cli, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_single_dash_migrate_is_accepted() {
        let normalized = normalize_args(args(&["billstore-migrator", "-migrate=*accounts,*stats"]));
        let cli = Cli::parse_from(normalized);
        assert_eq!(cli.migrate.as_deref(), Some("*accounts,*stats"));

        let normalized = normalize_args(args(&["billstore-migrator", "-migrate", "*stats"]));
        assert_eq!(Cli::parse_from(normalized).migrate.as_deref(), Some("*stats"));
    }

    #[test]
    fn test_flags_build_config() {
        let cli = Cli::parse_from(args(&[
            "billstore-migrator",
            "--storage-kind",
            "redis",
            "--keep-legacy",
            "--dry-run",
            "--tenant",
            "acme",
        ]));
        let config = cli.config().unwrap();
        assert_eq!(config.storage_kind, StorageKind::Redis);
        assert!(!config.consume_legacy);
        assert!(config.dry_run);
        assert!(!config.continue_on_unsupported);
        assert_eq!(config.default_tenant, "acme");
    }

    #[test]
    fn test_unknown_storage_kind_is_rejected() {
        let cli = Cli::parse_from(args(&["billstore-migrator", "--storage-kind", "oracle"]));
        assert!(cli.config().is_err());
    }
}
