//! Utility functions.

use std::path::Path;
use std::thread;

const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tar.xz", ".tar.bz2", ".tar.zst", ".tar", ".tgz"];

/// Returns the directory name a source tarball unpacks to, e.g.
/// `openssl-3.3.1` for `/tmp/openssl-3.3.1.tar.gz`.
pub fn archive_base_name(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    let base = ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name);
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

/// Twice as many simultaneous make jobs as there are CPU cores, or 12
/// when the core count is unknown.
pub fn simultaneous_jobs() -> usize {
    thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(12)
}
