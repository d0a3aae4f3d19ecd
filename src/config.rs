//! Configuration module.
//!
//! This module defines the command-line interface (CLI) using `clap`: the
//! source archive, the target toolchain and the work directories.

use clap::Parser;
use std::path::PathBuf;

use crate::error::Error;

/// Cross-compiles the OpenSSL static libraries.
///
/// Unpacks an OpenSSL source tarball, runs `Configure` for the target
/// architecture and installs headers and static libraries into the prefix.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// OpenSSL source tarball
    #[arg(required_unless_present = "list_targets")]
    pub archive: Option<PathBuf>,

    /// Target host triplet, e.g. aarch64-linux-android
    #[arg(long, required_unless_present = "list_targets")]
    pub arch: Option<String>,

    /// Install prefix
    #[arg(long, required_unless_present = "list_targets")]
    pub prefix: Option<PathBuf>,

    /// C compiler (default: <ARCH>-gcc)
    #[arg(long)]
    pub cc: Option<String>,

    /// C compiler flags (default: -Os)
    #[arg(long, allow_hyphen_values = true)]
    pub cflags: Option<String>,

    /// Preprocessor flags (default: -isystem <PREFIX>/include)
    #[arg(long, allow_hyphen_values = true)]
    pub cppflags: Option<String>,

    /// Archiver (default: <ARCH>-ar)
    #[arg(long)]
    pub ar: Option<String>,

    /// Archive indexer (default: <ARCH>-ranlib)
    #[arg(long)]
    pub ranlib: Option<String>,

    /// Directory source tarballs are unpacked into
    #[arg(long, default_value = "build/src")]
    pub src_dir: PathBuf,

    /// Directory for out-of-tree builds
    #[arg(long, default_value = "build/build")]
    pub build_dir: PathBuf,

    /// Simultaneous make jobs (default: twice the CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Extra environment for child processes
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_assignment)]
    pub env: Vec<(String, String)>,

    /// Build even if the libraries are already installed
    #[arg(long)]
    pub force: bool,

    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the supported architectures and exit
    #[arg(long)]
    pub list_targets: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

/// Parses a `KEY=VALUE` argument. The value may be empty or contain `=`.
pub fn parse_env_assignment(arg: &str) -> Result<(String, String), Error> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(Error::InvalidEnv(arg.to_string())),
    }
}
