//! Child process execution.
//!
//! Every external step of a build (`tar`, `./Configure`, `make`) is described
//! by an [`Invocation`] and handed to a [`Runner`]. The working directory and
//! the environment are part of the invocation; nothing relies on the
//! driver's own current directory or environment.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

/// A fully specified child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: &Path, env: &BTreeMap<String, String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: env.clone(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./,:+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Executes invocations. Returning `Ok` means the step succeeded.
pub trait Runner {
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// False when invocations are only reported. Callers must then leave the
    /// filesystem alone as well.
    fn executes(&self) -> bool {
        true
    }
}

/// Spawns real processes and blocks until they exit.
///
/// The inherited environment is cleared and replaced by the invocation's
/// map. Standard streams are inherited.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::info!(cwd = %invocation.cwd.display(), "running {}", invocation);

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .env_clear()
            .envs(&invocation.env)
            .status()
            .with_context(|| {
                format!(
                    "failed to spawn {} in {}",
                    invocation.program,
                    invocation.cwd.display()
                )
            })?;

        if !status.success() {
            return Err(Error::ProcessFailed {
                program: invocation.program.clone(),
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

/// Prints what would be run instead of running it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl DryRunRunner {
    /// The line printed for `invocation`, e.g. `(cd /src && make --quiet)`.
    pub fn describe(invocation: &Invocation) -> String {
        format!("(cd {} && {})", quote(&invocation.cwd.display().to_string()), invocation)
    }
}

impl Runner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::debug!(
            cwd = %invocation.cwd.display(),
            "dry run, skipping {}",
            invocation.program
        );
        println!("{}", Self::describe(invocation));
        Ok(())
    }

    fn executes(&self) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Records invocations instead of spawning them, failing any whose
    /// program matches `fail_on`.
    #[derive(Default)]
    pub struct RecordingRunner {
        pub invocations: RefCell<Vec<Invocation>>,
        pub fail_on: Option<String>,
    }

    impl RecordingRunner {
        pub fn failing_on(program: &str) -> Self {
            Self {
                invocations: RefCell::default(),
                fail_on: Some(program.to_string()),
            }
        }

        pub fn programs(&self) -> Vec<String> {
            self.invocations
                .borrow()
                .iter()
                .map(|i| i.program.clone())
                .collect()
        }
    }

    impl Runner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            self.invocations.borrow_mut().push(invocation.clone());
            if self.fail_on.as_deref() == Some(invocation.program.as_str()) {
                return Err(Error::ProcessFailed {
                    program: invocation.program.clone(),
                    code: Some(1),
                }
                .into());
            }
            Ok(())
        }
    }
}
