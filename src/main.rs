//! # editor-projects
//!
//! Find Sublime Text and VS Code project files anywhere on disk and keep a
//! cached list of them that launchers can query instantly.
//!
//! Projects are discovered through up to three sources (a native directory
//! walk over configured roots, `mdfind`, and `locate`), each rerun only once
//! its own interval has passed. Listing never waits for a scan: it prints the
//! cached list and, when a rescan is due, starts one in the background.
//!
//! ## Usage
//!
//! ```bash
//! # Scan now (sources that are not due replay their cached results)
//! editor-projects rescan
//!
//! # Print cached projects, refreshing in the background if needed
//! editor-projects list
//! editor-projects --mode vscode list --json
//!
//! # Inspect sources and cache
//! editor-projects status
//! ```

mod cli;

use std::{
    path::Path,
    process::{Command, Stdio, exit},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use cli::{Action, Cli};
use colored::Colorize;
use editor_projects::{
    cache::Cache,
    config::Config,
    lock::RescanLock,
    project::{Project, clean_path},
    scanner::ScanManager,
};
use humansize::{DECIMAL, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Entry point for the editor-projects application.
///
/// This function handles all errors gracefully by calling [`inner_main`] and printing
/// any errors to stderr before exiting with a non-zero status code.
fn main() {
    if let Err(err) = inner_main() {
        eprintln!("Error: {err:#}");

        exit(1);
    }
}

/// Main application logic that can return errors.
///
/// # Errors
///
/// This function can return errors from:
/// - Configuration loading
/// - Locating or creating the cache directory
/// - Persisting scan results
/// - JSON serialization
fn inner_main() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose());

    let config = Config::load(args.mode()).context("failed to load configuration")?;
    let cache_dir = Cache::default_dir().context("could not determine the cache directory")?;
    let manager = ScanManager::new(config, Cache::new(cache_dir));

    match args.action() {
        Action::Rescan {
            force,
            quiet,
            spinner,
        } => rescan(manager.with_force(force), quiet, spinner),
        Action::List { json, rescan } => list(&manager, json, rescan),
        Action::Folders(path) => folders(&manager, &path),
        Action::Status => status(&manager),
    }
}

/// Log to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn rescan(manager: ScanManager, quiet: bool, show_spinner: bool) -> Result<()> {
    let lock_path = RescanLock::path_for(manager.cache(), manager.config().mode);
    let Some(_lock) = RescanLock::try_acquire(&lock_path)? else {
        info!("a rescan is already running");
        return Ok(());
    };

    let spinner = if !show_spinner {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.set_message(format!("Scanning for {} projects...", manager.config().mode));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let result = runtime.block_on(manager.scan());
    spinner.finish_and_clear();

    let projects = result?;
    if !quiet {
        println!(
            "{} {} project(s) cached",
            "✔".green(),
            projects.len().to_string().bold()
        );
    }

    Ok(())
}

fn list(manager: &ScanManager, json: bool, allow_rescan: bool) -> Result<()> {
    if allow_rescan {
        spawn_background_rescan(manager);
    }

    let projects = manager.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    for project in &projects {
        println!(
            "{}\t{}\t{}",
            project.name(),
            project.folder().display(),
            project.path.display()
        );
    }

    Ok(())
}

/// Start `rescan` as a detached child if one is due and none is running.
///
/// Failures only cost freshness, so they are logged and otherwise ignored.
fn spawn_background_rescan(manager: &ScanManager) {
    let lock_path = RescanLock::path_for(manager.cache(), manager.config().mode);
    if RescanLock::is_held(&lock_path) {
        debug!("rescan already in progress");
        return;
    }
    if !manager.scan_due() {
        return;
    }

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            warn!("cannot start background rescan: {e}");
            return;
        }
    };

    let spawned = Command::new(exe)
        .args(["--mode", &manager.config().mode.to_string(), "rescan", "--quiet"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(child) => debug!("background rescan started (pid {})", child.id()),
        Err(e) => warn!("cannot start background rescan: {e}"),
    }
}

fn folders(manager: &ScanManager, path: &Path) -> Result<()> {
    let path = std::path::absolute(path)
        .map(|p| clean_path(&p))
        .with_context(|| format!("invalid path {}", path.display()))?;

    let cached = manager.load()?.into_iter().find(|p| p.path == path);
    let project = match cached {
        Some(project) => project,
        None => Project::from_file(&path)?,
    };

    for folder in &project.folders {
        println!("{}", folder.display());
    }

    Ok(())
}

fn status(manager: &ScanManager) -> Result<()> {
    let config = manager.config();
    let cache = manager.cache();

    println!("{} {}", "Mode:".bold(), config.mode);
    match &config.config_path {
        Some(path) if path.exists() => println!("{} {}", "Config:".bold(), path.display()),
        Some(path) => println!(
            "{} {} {}",
            "Config:".bold(),
            path.display(),
            "(not found)".dimmed()
        ),
        None => println!("{} {}", "Config:".bold(), "(none)".dimmed()),
    }
    println!("{} {}", "Cache:".bold(), cache.dir().display());

    let lock_path = RescanLock::path_for(cache, config.mode);
    if RescanLock::is_held(&lock_path) {
        println!("{}", "A rescan is running".yellow());
    }

    println!("\n{}", "Sources:".bold());
    for s in manager.status() {
        let state = if !s.active {
            format!("{:<12}", "disabled").dimmed()
        } else if !s.ready {
            format!("{:<12}", "unavailable").red()
        } else if s.due {
            format!("{:<12}", "due").yellow()
        } else {
            format!("{:<12}", "fresh").green()
        };
        let age = s
            .cache_age
            .map_or_else(|| "never".to_string(), |age| format!("{} ago", format_age(age)));

        println!(
            "  {:<8} every {:<10} {} cached {}",
            s.name,
            humantime::format_duration(s.interval).to_string(),
            state,
            age
        );
    }

    println!("\n{}", "Projects:".bold());
    let key = manager.projects_key();
    match cache.modified(&key) {
        Ok(modified) => {
            let size = std::fs::metadata(cache.path(&key)).map_or(0, |m| m.len());
            println!(
                "  {} cached, {} written {}",
                manager.load()?.len(),
                format_size(size, DECIMAL),
                format_time(modified)
            );
        }
        Err(_) => println!("  {}", "no scan has completed yet".dimmed()),
    }

    Ok(())
}

/// Age rounded to whole seconds.
fn format_age(age: Duration) -> String {
    humantime::format_duration(Duration::from_secs(age.as_secs())).to_string()
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
