//! Aggregation of applier and verifier outcomes into one process result.

use crate::apply::{self, FileReport, FileStatus};
use crate::catalog::PatchSpec;
use crate::store::FileStore;
use crate::verify::{self, VerifyStatus};
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Human-facing diagnostics, one per recorded problem.
#[derive(Error, Debug)]
pub enum Diagnostic {
    #[error("File not found: {path}")]
    MissingTarget { path: PathBuf },

    #[error("Pattern #{rule} not found in {file} (already patched, or upstream source changed)")]
    PatternNotFound { file: String, rule: usize },

    #[error("No replacements made in {file}")]
    NoEffect { file: String },

    #[error("{file} still contains the forbidden construct, patch incomplete")]
    VerificationFailed { file: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything one invocation produced: per-file applier outcomes plus the
/// verification scan over the patchable file set.
#[derive(Debug)]
#[must_use = "RunReport decides the process exit status"]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub verification: Vec<(PathBuf, VerifyStatus)>,
}

impl RunReport {
    /// Missing targets, I/O failures, missed rules and no-effect files all
    /// count toward the error total.
    pub fn error_count(&self) -> usize {
        self.files
            .iter()
            .map(|report| match &report.status {
                FileStatus::Missing | FileStatus::Failed { .. } => 1,
                FileStatus::Patched(result) => result.rules_not_found(),
                FileStatus::NoEffect(result) => result.rules_not_found() + 1,
            })
            .sum()
    }

    /// Total occurrences replaced across all files.
    pub fn total_applied(&self) -> usize {
        self.files
            .iter()
            .map(|report| match &report.status {
                FileStatus::Patched(result) => result.occurrences_applied,
                _ => 0,
            })
            .sum()
    }

    pub fn verify_failures(&self) -> usize {
        self.verification
            .iter()
            .filter(|(_, status)| *status == VerifyStatus::StillPresent)
            .count()
    }

    pub fn success(&self) -> bool {
        self.error_count() == 0 && self.verify_failures() == 0
    }

    /// Flatten every recorded problem into displayable diagnostics, in
    /// file order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        for report in &self.files {
            let file = short_name(&report.path);
            match &report.status {
                FileStatus::Missing => out.push(Diagnostic::MissingTarget {
                    path: report.path.clone(),
                }),
                FileStatus::Failed { source } => out.push(Diagnostic::Io {
                    path: report.path.clone(),
                    // io::Error is not Clone; rebuild one from kind + text.
                    source: std::io::Error::new(source.kind(), source.to_string()),
                }),
                FileStatus::Patched(result) => {
                    for &rule in &result.missed_rules {
                        out.push(Diagnostic::PatternNotFound {
                            file: file.clone(),
                            rule,
                        });
                    }
                }
                FileStatus::NoEffect(result) => {
                    for &rule in &result.missed_rules {
                        out.push(Diagnostic::PatternNotFound {
                            file: file.clone(),
                            rule,
                        });
                    }
                    out.push(Diagnostic::NoEffect { file: file.clone() });
                }
            }
        }

        for (path, status) in &self.verification {
            if *status == VerifyStatus::StillPresent {
                out.push(Diagnostic::VerificationFailed {
                    file: short_name(path),
                });
            }
        }

        out
    }
}

fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Apply every spec, then verify exactly the files the run was able to
/// patch (missing targets stay out of the scan).
pub fn run_and_verify(
    specs: &[PatchSpec],
    forbidden: &Regex,
    store: &mut dyn FileStore,
) -> RunReport {
    let files = apply::run(specs, store);

    let patchable: Vec<PathBuf> = files
        .iter()
        .filter(|report| report.status.file_was_patchable())
        .map(|report| report.path.clone())
        .collect();
    let verification = verify::verify(&patchable, forbidden, store);

    RunReport {
        files,
        verification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PatchSpec, ReplacementRule};
    use crate::store::MemStore;

    fn one_rule_spec(path: &str, search: &str, replace: &str) -> PatchSpec {
        PatchSpec::new(path, vec![ReplacementRule::new(search, replace)])
    }

    fn forbidden() -> Regex {
        Regex::new(r"eq\(.*,''\)").unwrap()
    }

    #[test]
    fn test_clean_run_is_success() {
        let mut store = MemStore::new();
        store.insert("f.php", "X = isNull(f) OR eq(f,'');");

        let specs = vec![one_rule_spec(
            "f.php",
            "X = isNull(f) OR eq(f,'');",
            "X = isNull(f);",
        )];

        let report = run_and_verify(&specs, &forbidden(), &mut store);
        assert!(report.success());
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.total_applied(), 1);
        assert_eq!(report.verify_failures(), 0);
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn test_incomplete_patch_fails_verification() {
        let mut store = MemStore::new();
        // Two constructs, only one covered by a rule.
        store.insert("f.php", "eq(a,'');\neq(b,'');");

        let specs = vec![one_rule_spec("f.php", "eq(a,'');", "isNull(a);")];

        let report = run_and_verify(&specs, &forbidden(), &mut store);
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.verify_failures(), 1);
        assert!(!report.success());
        assert!(report
            .diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::VerificationFailed { .. })));
    }

    #[test]
    fn test_no_effect_run_is_an_error_without_corruption() {
        let mut store = MemStore::new();
        store.insert("f.php", "X = isNull(f);");

        let specs = vec![one_rule_spec(
            "f.php",
            "X = isNull(f) OR eq(f,'');",
            "X = isNull(f);",
        )];

        let report = run_and_verify(&specs, &forbidden(), &mut store);
        assert!(!report.success());
        assert_eq!(report.total_applied(), 0);
        // Already-patched content still gets the verification scan.
        assert_eq!(report.verification.len(), 1);
        assert_eq!(report.verify_failures(), 0);

        let diags = report.diagnostics();
        assert!(diags
            .iter()
            .any(|d| matches!(d, Diagnostic::PatternNotFound { rule: 0, .. })));
        assert!(diags.iter().any(|d| matches!(d, Diagnostic::NoEffect { .. })));
    }

    #[test]
    fn test_missing_target_is_counted_and_skipped_by_verifier() {
        let mut store = MemStore::new();
        store.insert("present.php", "before");

        let specs = vec![
            one_rule_spec("absent.php", "before", "after"),
            one_rule_spec("present.php", "before", "after"),
        ];

        let report = run_and_verify(&specs, &forbidden(), &mut store);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.total_applied(), 1);
        assert_eq!(report.verification.len(), 1);
        assert!(!report.success());
        assert!(report
            .diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::MissingTarget { .. })));
    }

    #[test]
    fn test_diagnostic_messages_name_the_file() {
        let diag = Diagnostic::NoEffect {
            file: "Builder.php".to_string(),
        };
        assert_eq!(diag.to_string(), "No replacements made in Builder.php");

        let diag = Diagnostic::PatternNotFound {
            file: "Builder.php".to_string(),
            rule: 1,
        };
        assert!(diag.to_string().contains("Pattern #1"));
        assert!(diag.to_string().contains("Builder.php"));
    }
}
