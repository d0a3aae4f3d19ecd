//! OpenSSL build recipe.
//!
//! OpenSSL does not build out of tree reliably and has its own `Configure`
//! script instead of autoconf, so this recipe unpacks in place, runs
//! `./Configure` for the mapped target and then hands over to the generic
//! make flow with OpenSSL's own make variables.

use anyhow::Result;
use std::path::Path;

use crate::arch::openssl_target;
use crate::process::{Invocation, Runner};
use crate::project::{MakeProject, Recipe};
use crate::toolchain::Toolchain;

/// Installs headers and static libraries only.
pub const INSTALL_TARGET: &str = "install_dev";

/// Marker checked by [`MakeProject::is_installed`].
pub const INSTALLED: &str = "lib/libssl.a";

/// Features switched off in every build. `no-asm` because the assembly
/// routines break some cross builds (notably Windows).
pub const CONFIGURE_FLAGS: &[&str] = &[
    "no-shared",
    "no-module",
    "no-engine",
    "no-static-engine",
    "no-async",
    "no-tests",
    "no-asm",
];

/// Arguments for `./Configure`: the fixed feature flags, the OpenSSL
/// target, then the install prefix.
pub fn configure_args(target: &str, install_prefix: &Path) -> Vec<String> {
    CONFIGURE_FLAGS
        .iter()
        .map(|flag| flag.to_string())
        .chain([target.to_string(), format!("--prefix={}", install_prefix.display())])
        .collect()
}

#[derive(Debug, Clone)]
pub struct OpenSslProject {
    base: MakeProject,
}

impl OpenSslProject {
    pub fn new(base: MakeProject) -> Self {
        Self {
            base: base.with_install_target(INSTALL_TARGET),
        }
    }

    pub fn project(&self) -> &MakeProject {
        &self.base
    }
}

impl Recipe for OpenSslProject {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn make_args(&self, toolchain: &Toolchain) -> Vec<String> {
        let mut args = self.base.make_args(toolchain);
        args.extend([
            format!("CC={}", toolchain.cc),
            format!("CFLAGS={}", toolchain.cflags),
            format!("CPPFLAGS={}", toolchain.cppflags),
            format!("AR={}", toolchain.ar),
            format!("RANLIB={}", toolchain.ranlib),
            "build_libs".to_string(),
        ]);
        args
    }

    fn make_install_args(&self, toolchain: &Toolchain) -> Vec<String> {
        // the install step runs ranlib on the static libraries again
        let mut args = self.base.make_install_args(toolchain);
        args.push(format!("RANLIB={}", toolchain.ranlib));
        args
    }

    fn build(&self, toolchain: &Toolchain, runner: &dyn Runner) -> Result<()> {
        let target = openssl_target(&toolchain.arch)?;
        tracing::debug!(
            arch = %toolchain.arch,
            openssl_target = target,
            "resolved OpenSSL target"
        );

        let src = self.base.unpack(toolchain, false, runner)?;

        tracing::info!(recipe = self.name(), openssl_target = target, "configuring");
        let configure = Invocation::new("./Configure", &src, &toolchain.env)
            .args(configure_args(target, &toolchain.install_prefix));
        runner.run(&configure)?;

        self.build_make(toolchain, &src, runner)
    }
}
