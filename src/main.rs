//! Entry point for sslbuild.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Set up `tracing` output at the requested level.
//! 3. Describe the cross toolchain.
//! 4. Run the OpenSSL recipe: unpack, configure, make, make install.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sslbuild::arch::OPENSSL_TARGETS;
use sslbuild::config::Config;
use sslbuild::openssl::{OpenSslProject, INSTALLED};
use sslbuild::process::{DryRunRunner, Runner, SystemRunner};
use sslbuild::project::{MakeProject, Recipe};
use sslbuild::toolchain::Toolchain;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log level '{}'", config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if config.list_targets {
        for (arch, target) in OPENSSL_TARGETS {
            println!("{:<24}{}", arch, target);
        }
        return Ok(());
    }

    let archive = config.archive.as_deref().context("no source archive given")?;
    let toolchain = Toolchain::from_config(&config)?;

    let mut base = MakeProject::new(archive, INSTALLED)?;
    if let Some(jobs) = config.jobs {
        base = base.with_jobs(jobs);
    }
    let project = OpenSslProject::new(base);

    if !config.force && project.project().is_installed(&toolchain) {
        tracing::info!(
            prefix = %toolchain.install_prefix.display(),
            "{} is already installed, skipping",
            project.name()
        );
        return Ok(());
    }

    let runner: &dyn Runner = if config.dry_run {
        &DryRunRunner
    } else {
        &SystemRunner
    };
    project
        .build(&toolchain, runner)
        .with_context(|| format!("failed to build {} for {}", project.name(), toolchain.arch))?;

    if !config.dry_run {
        println!(
            "Installed {} to {}",
            project.name(),
            toolchain.install_prefix.display()
        );
    }
    Ok(())
}
