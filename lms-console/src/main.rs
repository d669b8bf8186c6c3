//! LMS console
//!
//! Drives one admin screen against an in-memory backend:
//! 1. Seeds an admin account and a document per collection
//! 2. Signs the admin in through the login gate
//! 3. Mounts the chosen screen, submits a sample form and prints the list
//!
//! Usage:
//!   lms-console --section course-registration --verbose

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use lms_console::{format_row, page, page_count, sample_payload, DemoBackend, DEMO_ADMIN_PASSWORD};
use lms_sync::{AdminSection, ListView, LmsConfig, LoginGate, Route};
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "lms-console")]
#[command(about = "Demo console for the LMS client core")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Admin section to drive
    #[arg(short, long, default_value = "course-registration")]
    section: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => LmsConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LmsConfig::default(),
    }
    .with_env_overrides();

    let section = AdminSection::from_path(&args.section)
        .with_context(|| format!("Unknown section: {}", args.section))?;

    let backend = DemoBackend::seeded(&config);
    let gate = LoginGate::new(backend.client.clone(), backend.auth.clone());
    let session = gate
        .sign_in(&config.admin_email, DEMO_ADMIN_PASSWORD)
        .await
        .context("Admin sign-in failed")?;
    if session.route != Route::AdminDashboard {
        anyhow::bail!("{} is not an admin", session.identity.email);
    }
    info!("Signed in as {}", session.identity.email);

    let mut screen = backend.screen(section, &config);
    let mut rx = screen.watch();
    screen.mount().await?;
    let loaded = wait_until(&mut rx, |v| !v.loading).await?;
    info!("{}: {} rows loaded", section.title(), loaded.len());

    let view = match screen.add(sample_payload(section)).await {
        Ok(outcome) => {
            info!("Added {}", outcome.id);
            wait_until(&mut rx, |v| v.contains(&outcome.id)).await?
        }
        Err(e) => {
            warn!("Add rejected: {}", e);
            screen.view()
        }
    };
    if let Some(notice) = screen.notice() {
        info!("Notice ({:?}): {}", notice.level, notice);
    }

    let pages = page_count(view.len(), config.page_size);
    println!("\n========================================");
    println!("  {} ({} rows)", section.title(), view.len());
    println!("========================================");
    for p in 0..pages {
        println!("  -- page {}/{} --", p + 1, pages);
        for item in page(&view.items, p, config.page_size) {
            println!("  {}", format_row(item));
        }
    }
    println!("========================================\n");

    screen.unmount();
    gate.sign_out().await?;
    Ok(())
}

async fn wait_until(
    rx: &mut watch::Receiver<ListView>,
    pred: impl FnMut(&ListView) -> bool,
) -> Result<ListView> {
    let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .context("Timed out waiting for the list")?
        .context("List view closed")?
        .clone();
    Ok(view)
}
