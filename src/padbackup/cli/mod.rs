//! # CLI Layer
//!
//! One client of the padbackup library, and the only place that:
//! - Parses arguments (clap, `setup.rs`)
//! - Installs the tracing subscriber (`logging.rs`)
//! - Prints reports for humans (`render.rs`)
//! - Decides the exit code
//!
//! Configuration is loaded once, CLI overrides are applied, and from then on
//! it is only ever borrowed.

mod logging;
mod render;
mod setup;

use clap::Parser;
use padbackup::api::BackupApi;
use padbackup::config::{BackupConfig, CONFIG_FILENAME};
use padbackup::error::{BackupError, Result};
use padbackup::model::SiteName;
use padbackup::sites::LiveSites;
use setup::{Cli, Commands};
use std::path::PathBuf;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init(cli.verbose, config.log_file.as_deref())?;

    match cli.command.unwrap_or(Commands::Run { list: None }) {
        Commands::Run { list } => handle_run(&config, list),
        Commands::Site { name } => handle_site(&config, &name),
        Commands::Status { name, pad } => handle_status(&config, &name, pad.as_deref()),
        Commands::Config => {
            print!("{}", render::render_config(&config));
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<BackupConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    if cli.config.is_some() && !path.exists() {
        return Err(BackupError::Config(format!(
            "config file {} does not exist",
            path.display()
        )));
    }
    let mut config = BackupConfig::load(&path)?;
    if cli.out_of_order {
        config.out_of_order_commit = true;
    }
    if let Some(delay) = cli.delay {
        config.delay_secs = delay;
    }
    config.validate()?;
    Ok(config)
}

fn api(config: &BackupConfig) -> Result<BackupApi<LiveSites<'_>>> {
    Ok(BackupApi::new(LiveSites::new(config), config.backup_options()?))
}

fn handle_run(config: &BackupConfig, list: Option<PathBuf>) -> Result<()> {
    let list = list.unwrap_or_else(|| config.backup_list_file.clone());
    let report = api(config)?.run_list(&list)?;
    print!("{}", render::render_run_report(&report));
    if report.failed() > 0 {
        return Err(BackupError::SitesFailed {
            failed: report.failed(),
            total: report.outcomes.len(),
        });
    }
    Ok(())
}

fn handle_site(config: &BackupConfig, name: &str) -> Result<()> {
    let site = SiteName::new(name)?;
    let report = api(config)?.backup_site(&site)?;
    print!("{}", render::render_site_report(&report));
    Ok(())
}

fn handle_status(config: &BackupConfig, name: &str, pad: Option<&str>) -> Result<()> {
    let site = SiteName::new(name)?;
    let status = api(config)?.status(&site, pad)?;
    print!("{}", render::render_status(&status));
    Ok(())
}
