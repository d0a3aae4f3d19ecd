//! Cross-compilation toolchain description.
//!
//! A [`Toolchain`] is built once per run and then only borrowed. Its `env`
//! map is the complete environment every child process receives.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Host triplet, e.g. `aarch64-linux-android`.
    pub arch: String,
    pub cc: String,
    pub cflags: String,
    pub cppflags: String,
    pub ar: String,
    pub ranlib: String,
    pub install_prefix: PathBuf,
    /// Where source tarballs are unpacked.
    pub src_path: PathBuf,
    /// Root of out-of-tree build directories.
    pub build_path: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl Toolchain {
    /// Creates a toolchain using `<arch>-gcc`, `<arch>-ar` and
    /// `<arch>-ranlib` from `PATH`, with the host environment as the base
    /// of `env`.
    pub fn new(arch: &str, install_prefix: &Path, work_dir: &Path) -> Self {
        let mut toolchain = Self {
            arch: arch.to_string(),
            cc: format!("{}-gcc", arch),
            cflags: "-Os".to_string(),
            cppflags: format!("-isystem {}", install_prefix.join("include").display()),
            ar: format!("{}-ar", arch),
            ranlib: format!("{}-ranlib", arch),
            install_prefix: install_prefix.to_path_buf(),
            src_path: work_dir.join("src"),
            build_path: work_dir.join("build"),
            env: BTreeMap::new(),
        };
        toolchain.env = toolchain.compose_env(host_env(), &[]);
        toolchain
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let arch = config.arch.as_deref().context("no target architecture given")?;
        let prefix = config.prefix.as_deref().context("no install prefix given")?;
        let install_prefix = absolute_dir(prefix)?;

        let mut toolchain = Self::new(arch, &install_prefix, Path::new("."));
        if let Some(cc) = &config.cc {
            toolchain.cc = cc.clone();
        }
        if let Some(cflags) = &config.cflags {
            toolchain.cflags = cflags.clone();
        }
        if let Some(cppflags) = &config.cppflags {
            toolchain.cppflags = cppflags.clone();
        }
        if let Some(ar) = &config.ar {
            toolchain.ar = ar.clone();
        }
        if let Some(ranlib) = &config.ranlib {
            toolchain.ranlib = ranlib.clone();
        }
        toolchain.src_path = absolute_dir(&config.src_dir)?;
        toolchain.build_path = absolute_dir(&config.build_dir)?;
        toolchain.env = toolchain.compose_env(host_env(), &config.env);

        tracing::debug!(
            arch = %toolchain.arch,
            cc = %toolchain.cc,
            prefix = %toolchain.install_prefix.display(),
            "toolchain configured"
        );
        Ok(toolchain)
    }

    /// Layers the toolchain's variables over `host`, then applies
    /// `overrides` last.
    pub fn compose_env<I>(
        &self,
        host: I,
        overrides: &[(String, String)],
    ) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env: BTreeMap<String, String> = host.into_iter().collect();

        let bin = self.install_prefix.join("bin");
        let path = match env.get("PATH") {
            Some(host_path) if !host_path.is_empty() => {
                format!("{}:{}", bin.display(), host_path)
            }
            _ => bin.display().to_string(),
        };
        env.insert("PATH".to_string(), path);

        env.insert("CC".to_string(), self.cc.clone());
        env.insert("CFLAGS".to_string(), self.cflags.clone());
        env.insert("CPPFLAGS".to_string(), self.cppflags.clone());
        env.insert("AR".to_string(), self.ar.clone());
        env.insert("RANLIB".to_string(), self.ranlib.clone());
        env.insert(
            "PKG_CONFIG_LIBDIR".to_string(),
            self.install_prefix.join("lib").join("pkgconfig").display().to_string(),
        );

        for (key, value) in overrides {
            env.insert(key.clone(), value.clone());
        }
        env
    }
}

fn absolute_dir(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("failed to resolve {}", path.display()))
}

/// The driver's environment, skipping variables that are not valid UTF-8.
fn host_env() -> impl Iterator<Item = (String, String)> {
    env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}
