//! Patch applier: runs every spec against a [`FileStore`], collecting
//! per-file outcomes instead of aborting on the first failure.
//!
//! Files are isolated from each other: a missing target or an I/O failure
//! is recorded for that file and the run moves on to the next spec.

use crate::catalog::PatchSpec;
use crate::replace::replace_count;
use crate::store::FileStore;
use std::path::PathBuf;

/// Per-file accounting for one applier pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyResult {
    /// Total occurrences replaced across all rules for the file.
    pub occurrences_applied: usize,
    /// Zero-based indices of rules whose search text was absent.
    pub missed_rules: Vec<usize>,
}

impl ApplyResult {
    pub fn rules_not_found(&self) -> usize {
        self.missed_rules.len()
    }
}

/// Outcome of attempting one [`PatchSpec`].
#[derive(Debug)]
#[must_use = "FileStatus should be checked for success/failure"]
pub enum FileStatus {
    /// At least one rule matched and the rewritten content was stored.
    Patched(ApplyResult),
    /// No rule matched anything. Either the file is already patched or
    /// upstream changed incompatibly; the applier cannot tell which.
    NoEffect(ApplyResult),
    /// Target file does not exist at the expected path.
    Missing,
    /// Reading or writing the target failed.
    Failed { source: std::io::Error },
}

impl FileStatus {
    /// True for statuses where the file exists and was subject to
    /// patching, i.e. the set the verifier should scan afterwards.
    pub fn file_was_patchable(&self) -> bool {
        matches!(self, FileStatus::Patched(_) | FileStatus::NoEffect(_))
    }
}

/// One spec's target path paired with its outcome.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Apply every spec in order. Always attempts all specs; failures are
/// collected in the returned reports, one per spec, in input order.
pub fn run(specs: &[PatchSpec], store: &mut dyn FileStore) -> Vec<FileReport> {
    specs.iter().map(|spec| apply_spec(spec, store)).collect()
}

fn apply_spec(spec: &PatchSpec, store: &mut dyn FileStore) -> FileReport {
    let path = spec.target_path.clone();

    if !store.exists(&path) {
        return FileReport {
            path,
            status: FileStatus::Missing,
        };
    }

    let mut content = match store.read(&path) {
        Ok(content) => content,
        Err(source) => {
            return FileReport {
                path,
                status: FileStatus::Failed { source },
            }
        }
    };

    // Rules apply sequentially to the evolving content: rule N sees the
    // output of rule N-1, never the original in parallel.
    let mut result = ApplyResult::default();
    for (idx, rule) in spec.replacements.iter().enumerate() {
        let (next, count) = replace_count(&content, &rule.search_text, &rule.replace_text);
        if count == 0 {
            result.missed_rules.push(idx);
        } else {
            result.occurrences_applied += count;
            content = next;
        }
    }

    if result.occurrences_applied == 0 {
        return FileReport {
            path,
            status: FileStatus::NoEffect(result),
        };
    }

    if let Err(source) = store.write(&path, &content) {
        return FileReport {
            path,
            status: FileStatus::Failed { source },
        };
    }

    FileReport {
        path,
        status: FileStatus::Patched(result),
    }
}
