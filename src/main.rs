use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use mautic_datefix::{
    date_empty_filter_patches, forbidden_empty_literal, run_and_verify, Diagnostic, DiskStore,
    FileStatus, FileStore, MemStore, RunReport, VerifyStatus,
};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mautic-datefix")]
#[command(about = "Patch Mautic's segment filter builders for MySQL 8.0.16+ empty-date comparisons", long_about = None)]
#[command(version)]
struct Cli {
    /// Mautic installation root the target paths resolve against
    #[arg(long, default_value = "/var/www/html")]
    root: PathBuf,

    /// Dry run - apply to an in-memory copy and report, touching nothing on disk
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of rewritten files
    #[arg(long)]
    diff: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let specs = date_empty_filter_patches(&cli.root);
    let forbidden = forbidden_empty_literal();
    let targets: Vec<PathBuf> = specs.iter().map(|s| s.target_path.clone()).collect();

    println!("Root: {}", cli.root.display());
    if cli.dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
    }
    println!();

    // Capture pre-patch contents for --diff output.
    let mut before: HashMap<PathBuf, String> = HashMap::new();
    if cli.diff {
        let disk = DiskStore::new();
        for path in &targets {
            if disk.exists(path) {
                if let Ok(content) = disk.read(path) {
                    before.insert(path.clone(), content);
                }
            }
        }
    }

    let mut after: HashMap<PathBuf, String> = HashMap::new();
    let report = if cli.dry_run {
        let mut mem = MemStore::mirror_from(&DiskStore::new(), &targets)?;
        let report = run_and_verify(&specs, &forbidden, &mut mem);
        if cli.diff {
            for file in &report.files {
                if let Some(content) = mem.get(&file.path) {
                    after.insert(file.path.clone(), content.to_string());
                }
            }
        }
        report
    } else {
        let mut disk = DiskStore::new();
        let report = run_and_verify(&specs, &forbidden, &mut disk);
        if cli.diff {
            for file in &report.files {
                if disk.exists(&file.path) {
                    if let Ok(content) = disk.read(&file.path) {
                        after.insert(file.path.clone(), content);
                    }
                }
            }
        }
        report
    };

    print_report(&report, cli.dry_run);

    if cli.diff {
        for file in &report.files {
            if let FileStatus::Patched(_) = file.status {
                if let (Some(old), Some(new)) = (before.get(&file.path), after.get(&file.path)) {
                    if old != new {
                        display_diff(&file.path, old, new);
                    }
                }
            }
        }
    }

    print_summary(&report, cli.dry_run);

    if !report.success() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool) {
    for file in &report.files {
        if let FileStatus::Patched(result) = &file.status {
            let verb = if dry_run { "Would patch" } else { "Patched" };
            println!(
                "{} {} {} ({} replacements)",
                "✓".green(),
                verb,
                short_name(&file.path),
                result.occurrences_applied
            );
        }
    }

    for diag in report.diagnostics() {
        match diag {
            // Ambiguous between "already patched" and "upstream drifted";
            // a human has to judge, so warn rather than shout.
            Diagnostic::PatternNotFound { .. } => {
                eprintln!("{} {}", "⊙".yellow(), diag.to_string().yellow());
            }
            Diagnostic::VerificationFailed { .. } => {
                eprintln!("{} VERIFY FAIL: {}", "✗".red(), diag.to_string().red());
            }
            _ => {
                eprintln!("{} {}", "✗".red(), diag.to_string().red());
            }
        }
    }

    println!();
    println!("--- Verification ---");
    for (path, status) in &report.verification {
        if *status == VerifyStatus::Clean {
            println!(
                "{} VERIFY OK: {}, no literal('') found",
                "✓".green(),
                short_name(path)
            );
        }
    }
}

fn print_summary(report: &RunReport, dry_run: bool) {
    println!();
    if report.success() {
        let verb = if dry_run {
            "would be applied"
        } else {
            "applied and verified successfully"
        };
        println!(
            "{}",
            format!("All {} replacements {}", report.total_applied(), verb).green()
        );
    } else {
        eprintln!(
            "{}",
            format!(
                "PATCH FAILED: {} pattern errors, {} verification errors",
                report.error_count(),
                report.verify_failures()
            )
            .red()
            .bold()
        );
    }
}

fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Show unified diff between original and patched content.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
