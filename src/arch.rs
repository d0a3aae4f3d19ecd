//! Architecture mapping.
//!
//! OpenSSL has its own target vocabulary with lots of hard-coded
//! architectures. This module translates our host triplets into it.

use anyhow::Result;

use crate::error::Error;

/// Host triplet to OpenSSL `Configure` target.
///
/// Android triplets use the generic Linux targets instead of `android-*`:
/// those want to locate the NDK themselves, while our toolchain already
/// looks like a plain Linux cross build.
pub const OPENSSL_TARGETS: &[(&str, &str)] = &[
    // Android
    ("arm-linux-androideabi", "linux-generic32"),
    ("aarch64-linux-android", "linux-aarch64"),
    ("i686-linux-android", "linux-x86-clang"),
    ("x86_64-linux-android", "linux-x86_64-clang"),
    // generic Linux
    ("arm-linux-gnueabihf", "linux-generic32"),
    // Windows
    ("i686-w64-mingw32", "mingw"),
    ("x86_64-w64-mingw32", "mingw64"),
    // Apple
    ("x86_64-apple-darwin", "darwin64-x86_64-cc"),
    ("aarch64-apple-darwin", "darwin64-arm64-cc"),
];

/// Looks up the OpenSSL target for `arch`.
///
/// Fails with [`Error::UnsupportedArch`]; there is no fallback target.
pub fn openssl_target(arch: &str) -> Result<&'static str> {
    OPENSSL_TARGETS
        .iter()
        .find(|(triplet, _)| *triplet == arch)
        .map(|(_, target)| *target)
        .ok_or_else(|| Error::UnsupportedArch(arch.to_string()).into())
}

/// All host triplets that have an OpenSSL target.
pub fn supported_arches() -> impl Iterator<Item = &'static str> {
    OPENSSL_TARGETS.iter().map(|(triplet, _)| *triplet)
}
