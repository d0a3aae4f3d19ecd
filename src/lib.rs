//! OpenSSL cross-build driver.
//!
//! This library drives OpenSSL's own build system for a cross toolchain.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `arch`: Host triplet to OpenSSL target mapping.
//! - `toolchain`: Compiler, tools, prefix and child environment.
//! - `process`: Child process invocations and runners.
//! - `project`: The generic Make-based recipe.
//! - `openssl`: The OpenSSL recipe.

pub mod arch;
pub mod config;
pub mod error;
pub mod openssl;
pub mod process;
pub mod project;
pub mod toolchain;
pub mod utils;
