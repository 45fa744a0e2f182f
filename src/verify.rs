//! Post-patch verification: scan the patched files for the forbidden
//! construct and report any file where it survived.
//!
//! Verification is a best-effort sanity check, not the primary action: a
//! file that cannot be read is skipped silently, asymmetric with the
//! applier's fatal treatment of missing targets.

use crate::store::FileStore;
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "VerifyStatus should be checked for failures"]
pub enum VerifyStatus {
    /// Forbidden pattern is absent.
    Clean,
    /// Forbidden pattern survived patching; the fix is incomplete.
    StillPresent,
}

/// Scan each readable file for `forbidden`. Unreadable or missing files
/// are omitted from the result.
pub fn verify(
    files: &[PathBuf],
    forbidden: &Regex,
    store: &dyn FileStore,
) -> Vec<(PathBuf, VerifyStatus)> {
    files
        .iter()
        .filter_map(|path| scan_file(path, forbidden, store).map(|status| (path.clone(), status)))
        .collect()
}

fn scan_file(path: &Path, forbidden: &Regex, store: &dyn FileStore) -> Option<VerifyStatus> {
    if !store.exists(path) {
        return None;
    }
    let content = store.read(path).ok()?;
    if forbidden.is_match(&content) {
        Some(VerifyStatus::StillPresent)
    } else {
        Some(VerifyStatus::Clean)
    }
}
