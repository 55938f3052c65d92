// arturo-core - Host path derivation
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Host directories derived from the environment.
//!
//! The package manager and other external collaborators keep their caches
//! under `<home>/.arturo/`; the core only knows how to find it.

use std::env;
use std::path::PathBuf;

/// The user's home directory, from `HOME` or `USERPROFILE`.
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// The root of Arturo's per-user state.
pub fn arturo_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".arturo"))
}

/// Where downloaded packages live.
pub fn packages_dir() -> Option<PathBuf> {
    arturo_dir().map(|d| d.join("packages"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packages_dir_is_under_home() {
        if let Some(dir) = packages_dir() {
            assert!(dir.ends_with(".arturo/packages"));
        }
    }
}
