//! Shared utility functions.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Concurrency used when none is configured: the number of available
/// execution units, or 1 if that cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Directory holding a project's locally installed executables.
pub fn bin_dir(root: &Path) -> PathBuf {
    root.join("node_modules").join(".bin")
}

/// The ambient `PATH` with the project's bin directory prepended.
pub fn path_with_bin_dir(root: &Path) -> OsString {
    let ambient = std::env::var_os("PATH").unwrap_or_default();
    let entries = std::iter::once(bin_dir(root)).chain(std::env::split_paths(&ambient));
    std::env::join_paths(entries).unwrap_or(ambient)
}
