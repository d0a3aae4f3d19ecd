//! Error taxonomy.
//!
//! Failures that callers may want to tell apart are typed here and carried
//! inside `anyhow::Error`, so they can be recovered with `downcast_ref`.

use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The toolchain's architecture has no OpenSSL target.
    UnsupportedArch(String),
    /// A child process exited with a non-zero status. `code` is `None` when
    /// the process was terminated by a signal.
    ProcessFailed { program: String, code: Option<i32> },
    /// A `KEY=VALUE` environment override without `=` or with an empty key.
    InvalidEnv(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedArch(arch) => {
                write!(f, "architecture {} is not supported for OpenSSL", arch)
            }
            Error::ProcessFailed { program, code: Some(code) } => {
                write!(f, "{} exited with non-zero exit code, {}", program, code)
            }
            Error::ProcessFailed { program, code: None } => {
                write!(f, "{} was terminated by a signal", program)
            }
            Error::InvalidEnv(arg) => {
                write!(f, "invalid environment assignment '{}', expected KEY=VALUE", arg)
            }
        }
    }
}

impl error::Error for Error {}
