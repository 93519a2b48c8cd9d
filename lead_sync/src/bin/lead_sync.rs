use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Parser, Subcommand};
use crm_client::directory::rest::RestDirectory;
use lead_sync::config::{self, JobConfig};
use lead_sync::reconcile::{ReconcileOptions, SyncMode, reconcile_leads};
use lead_sync::{archive, db, report};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Referral lead synchronization jobs")]
struct Cli {
    /// Path to the TOML job configuration. Built-in defaults apply when
    /// omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Reconcile leads still marked new/pending against the CRM.
    New,
    /// Reconcile every live lead, then archive this month's snapshots.
    Monthly,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 1) Job config (TOML file or built-in defaults), normalized either way.
    let cfg = match &cli.config {
        Some(path) => config::load_config_path(path)?,
        None => {
            let mut cfg = JobConfig::default();
            cfg.normalize()?;
            cfg
        }
    };

    // 2) Storage: migrate, then open the one connection this run will use.
    let database_url = std::env::var("DATABASE_URL")?;
    db::migrate::run_sqlite(&database_url)?;
    let mut conn = db::connection::connect_sqlite(&database_url)?;

    // 3) CRM client from CRM_BASE_URL / CRM_ACCESS_TOKEN.
    let directory = RestDirectory::from_env(cfg.directory_options())?;

    // Ctrl-C finishes the in-flight lead and stops the loop cleanly.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let mode = match &cli.cmd {
        Cmd::New => SyncMode::Incremental,
        Cmd::Monthly => SyncMode::Full,
    };
    let opt = ReconcileOptions {
        mode,
        conversions: cfg.conversion_set(),
        deadline: cfg.deadline(),
    };

    let summary = reconcile_leads(&mut conn, &directory, &opt, &cancel).await?;

    match cli.cmd {
        Cmd::New => println!("{summary}"),
        Cmd::Monthly => {
            let report = report::full_report(&mut conn, summary)?;
            let archived = archive::archive_month(&mut conn, &archive::current_month())?;
            println!("{report}");
            println!(
                "archived {} ambassador snapshots for {}",
                archived.ambassadors, archived.month
            );
        }
    }

    Ok(())
}
