//! Mautic Datefix: literal source patching for the MySQL empty-date fix
//!
//! Mautic's segment filter builders emit `date_col = ''` comparisons that
//! MySQL 8.0.16+ rejects on DATE/DATETIME columns. This crate carries the
//! corresponding source fix as a catalog of exact-text replacement rules
//! and applies it to an installed Mautic tree.
//!
//! # Architecture
//!
//! All patching compiles down to a single primitive:
//! [`replace::replace_count`], an exact all-occurrences substring
//! replacement that reports how many matches it replaced. The applier runs
//! each spec's rules sequentially over the evolving file content, the
//! verifier re-scans the patched files for the forbidden `literal('')`
//! construct, and [`RunReport`] aggregates both into the process result.
//!
//! # Safety
//!
//! - Exact byte-for-byte matching; a rule that does not match is reported,
//!   never approximated
//! - Atomic file writes (tempfile + fsync + rename)
//! - Idempotent: a second run reports no-effect and changes nothing
//! - Files are isolated; one failure never stops the remaining specs
//!
//! # Example
//!
//! ```
//! use mautic_datefix::{run_and_verify, MemStore, PatchSpec, ReplacementRule};
//! use regex::Regex;
//!
//! let mut store = MemStore::new();
//! store.insert("f.php", "X = isNull(f) OR eq(f,'');");
//!
//! let specs = vec![PatchSpec::new(
//!     "f.php",
//!     vec![ReplacementRule::new(
//!         "X = isNull(f) OR eq(f,'');",
//!         "X = isNull(f);",
//!     )],
//! )];
//!
//! let forbidden = Regex::new(r"eq\(.*,''\)").unwrap();
//! let report = run_and_verify(&specs, &forbidden, &mut store);
//! assert!(report.success());
//! ```

pub mod apply;
pub mod catalog;
pub mod replace;
pub mod report;
pub mod store;
pub mod verify;

// Re-exports
pub use apply::{run, ApplyResult, FileReport, FileStatus};
pub use catalog::{
    date_empty_filter_patches, forbidden_empty_literal, PatchSpec, ReplacementRule,
    FORBIDDEN_EMPTY_LITERAL,
};
pub use replace::replace_count;
pub use report::{run_and_verify, Diagnostic, RunReport};
pub use store::{DiskStore, FileStore, MemStore};
pub use verify::{verify, VerifyStatus};
