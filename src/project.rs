//! Generic Make-based build recipe.
//!
//! [`Recipe`] is the capability a library build exposes to the driver. The
//! provided [`Recipe::build_make`] runs `make` and `make install` with
//! whatever argument lists the implementor returns, so a library-specific
//! recipe only overrides the argument methods and its own `build`.
//!
//! [`MakeProject`] is the plain implementation: unpack, `make`,
//! `make install`. Library adapters wrap one and delegate to it.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::{Invocation, Runner};
use crate::toolchain::Toolchain;
use crate::utils::{archive_base_name, simultaneous_jobs};

pub trait Recipe {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn make_args(&self, toolchain: &Toolchain) -> Vec<String>;

    fn make_install_args(&self, toolchain: &Toolchain) -> Vec<String>;

    /// Builds and installs into `toolchain.install_prefix`.
    fn build(&self, toolchain: &Toolchain, runner: &dyn Runner) -> Result<()>;

    /// Runs `make` in `wd`, then `make` again with the install arguments.
    /// The first failing step aborts the sequence.
    fn build_make(&self, toolchain: &Toolchain, wd: &Path, runner: &dyn Runner) -> Result<()> {
        tracing::info!(recipe = self.name(), "building");
        let make = Invocation::new("make", wd, &toolchain.env).args(self.make_args(toolchain));
        runner.run(&make)?;

        tracing::info!(recipe = self.name(), "installing");
        let install =
            Invocation::new("make", wd, &toolchain.env).args(self.make_install_args(toolchain));
        runner.run(&install)
    }
}

/// A source tarball built with plain `make` / `make <install_target>`.
#[derive(Debug, Clone)]
pub struct MakeProject {
    archive: PathBuf,
    base: String,
    installed: PathBuf,
    install_target: String,
    jobs: usize,
}

impl MakeProject {
    /// `installed` is a file relative to the install prefix whose presence
    /// marks the project as built, e.g. `lib/libssl.a`.
    pub fn new(archive: &Path, installed: impl Into<PathBuf>) -> Result<Self> {
        let base = archive_base_name(archive)
            .with_context(|| {
                format!("cannot derive a source directory from {}", archive.display())
            })?
            .to_string();
        Ok(Self {
            archive: archive.to_path_buf(),
            base,
            installed: installed.into(),
            install_target: "install".to_string(),
            jobs: simultaneous_jobs(),
        })
    }

    pub fn with_install_target(mut self, target: &str) -> Self {
        self.install_target = target.to_string();
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Name of the directory the archive unpacks to, e.g. `openssl-3.3.1`.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn install_target(&self) -> &str {
        &self.install_target
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Unpacks the archive into `toolchain.src_path`, replacing any stale
    /// tree. Returns the directory to build in: the source tree itself, or
    /// a fresh `toolchain.build_path/<base>` when `out_of_tree` is set.
    ///
    /// With a runner that does not execute, the directories are left as
    /// they are and only the paths are computed.
    pub fn unpack(
        &self,
        toolchain: &Toolchain,
        out_of_tree: bool,
        runner: &dyn Runner,
    ) -> Result<PathBuf> {
        if !self.archive.is_file() {
            bail!("source archive {} not found", self.archive.display());
        }
        let archive = fs::canonicalize(&self.archive)
            .with_context(|| format!("failed to resolve {}", self.archive.display()))?;

        let src = toolchain.src_path.join(&self.base);
        if runner.executes() {
            if src.exists() {
                fs::remove_dir_all(&src)
                    .with_context(|| format!("failed to remove {}", src.display()))?;
            }
            fs::create_dir_all(&toolchain.src_path)
                .with_context(|| format!("failed to create {}", toolchain.src_path.display()))?;
        } else {
            tracing::debug!(dest = %src.display(), "dry run, keeping existing source tree");
        }

        tracing::info!(archive = %archive.display(), dest = %src.display(), "unpacking");
        let untar = Invocation::new("tar", &toolchain.src_path, &toolchain.env)
            .arg("xf")
            .arg(archive.display().to_string())
            .arg("-C")
            .arg(toolchain.src_path.display().to_string());
        runner.run(&untar)?;

        if !out_of_tree {
            return Ok(src);
        }
        let build = toolchain.build_path.join(&self.base);
        if runner.executes() {
            recreate_dir(&build)?;
        }
        Ok(build)
    }

    /// True if the marker file exists in the prefix and is not older than
    /// the source archive.
    pub fn is_installed(&self, toolchain: &Toolchain) -> bool {
        let installed = toolchain.install_prefix.join(&self.installed);
        let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
        match (modified(&installed), modified(&self.archive)) {
            (Some(installed), Some(archive)) => installed >= archive,
            _ => false,
        }
    }
}

fn recreate_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
}

impl Recipe for MakeProject {
    fn name(&self) -> &str {
        &self.base
    }

    fn make_args(&self, _toolchain: &Toolchain) -> Vec<String> {
        vec!["--quiet".to_string(), format!("-j{}", self.jobs)]
    }

    fn make_install_args(&self, _toolchain: &Toolchain) -> Vec<String> {
        vec!["--quiet".to_string(), self.install_target.clone()]
    }

    fn build(&self, toolchain: &Toolchain, runner: &dyn Runner) -> Result<()> {
        let wd = self.unpack(toolchain, false, runner)?;
        self.build_make(toolchain, &wd, runner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::process::testing::RecordingRunner;
    use crate::process::DryRunRunner;
    use std::fs::File;

    struct Fixture {
        dir: tempfile::TempDir,
        toolchain: Toolchain,
        archive: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("prefix");
        let toolchain = Toolchain::new("arm-linux-gnueabihf", &prefix, dir.path());
        let archive = dir.path().join("zlib-1.3.1.tar.xz");
        File::create(&archive).unwrap();
        Fixture { dir, toolchain, archive }
    }

    #[test]
    fn base_args() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap().with_jobs(6);
        assert_eq!(project.make_args(&f.toolchain), vec!["--quiet", "-j6"]);
        assert_eq!(project.make_install_args(&f.toolchain), vec!["--quiet", "install"]);

        let project = project.with_install_target("install_dev");
        assert_eq!(project.make_install_args(&f.toolchain), vec!["--quiet", "install_dev"]);
    }

    #[test]
    fn zero_jobs_is_clamped() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap().with_jobs(0);
        assert_eq!(project.jobs(), 1);
    }

    #[test]
    fn unpack_in_tree() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap();
        let stale = f.toolchain.src_path.join("zlib-1.3.1");
        fs::create_dir_all(&stale).unwrap();
        File::create(stale.join("leftover.o")).unwrap();

        let runner = RecordingRunner::default();
        let wd = project.unpack(&f.toolchain, false, &runner).unwrap();

        assert_eq!(wd, stale);
        assert!(!stale.join("leftover.o").exists());
        let invocations = runner.invocations.borrow();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].program, "tar");
        assert_eq!(invocations[0].cwd, f.toolchain.src_path);
        assert_eq!(invocations[0].args[0], "xf");
        assert_eq!(invocations[0].args[2], "-C");
    }

    #[test]
    fn unpack_out_of_tree() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap();
        let runner = RecordingRunner::default();
        let wd = project.unpack(&f.toolchain, true, &runner).unwrap();
        assert_eq!(wd, f.dir.path().join("build").join("zlib-1.3.1"));
        assert!(wd.is_dir());
    }

    #[test]
    fn dry_run_keeps_existing_trees() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap();
        let src = f.toolchain.src_path.join("zlib-1.3.1");
        let build = f.toolchain.build_path.join("zlib-1.3.1");
        for dir in [&src, &build] {
            fs::create_dir_all(dir).unwrap();
            File::create(dir.join("Makefile")).unwrap();
        }

        assert_eq!(project.unpack(&f.toolchain, false, &DryRunRunner).unwrap(), src);
        assert_eq!(project.unpack(&f.toolchain, true, &DryRunRunner).unwrap(), build);

        assert!(src.join("Makefile").exists());
        assert!(build.join("Makefile").exists());
    }

    #[test]
    fn dry_run_creates_nothing() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap();
        project.build(&f.toolchain, &DryRunRunner).unwrap();
        assert!(!f.toolchain.src_path.exists());
        assert!(!f.toolchain.build_path.exists());
    }

    #[test]
    fn missing_archive_fails_before_tar() {
        let f = fixture();
        let archive = f.dir.path().join("gone-1.0.tar.gz");
        let project = MakeProject::new(&archive, "lib/libgone.a").unwrap();
        let runner = RecordingRunner::default();
        let err = project.unpack(&f.toolchain, false, &runner).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(runner.programs().is_empty());
    }

    #[test]
    fn build_runs_make_then_install() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap().with_jobs(2);
        let runner = RecordingRunner::default();
        project.build(&f.toolchain, &runner).unwrap();

        assert_eq!(runner.programs(), vec!["tar", "make", "make"]);
        let invocations = runner.invocations.borrow();
        assert_eq!(invocations[1].args, vec!["--quiet", "-j2"]);
        assert_eq!(invocations[2].args, vec!["--quiet", "install"]);
        assert_eq!(invocations[1].cwd, f.toolchain.src_path.join("zlib-1.3.1"));
        assert_eq!(invocations[2].env, f.toolchain.env);
    }

    #[test]
    fn failed_make_skips_install() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap();
        let runner = RecordingRunner::failing_on("make");
        let err = project.build(&f.toolchain, &runner).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ProcessFailed { .. })));
        assert_eq!(runner.programs(), vec!["tar", "make"]);
    }

    #[test]
    fn installed_marker() {
        let f = fixture();
        let project = MakeProject::new(&f.archive, "lib/libz.a").unwrap();
        assert!(!project.is_installed(&f.toolchain));

        let lib = f.toolchain.install_prefix.join("lib");
        fs::create_dir_all(&lib).unwrap();
        File::create(lib.join("libz.a")).unwrap();
        assert!(project.is_installed(&f.toolchain));
    }

    #[test]
    fn rejects_nameless_archive() {
        assert!(MakeProject::new(Path::new("/"), "lib/libx.a").is_err());
    }
}
