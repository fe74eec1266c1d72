//! The test driver: runs each script file through the Match Runner in
//! turn, printing per-test results and a final summary, the way a CI
//! harness reports a suite.

use std::path::Path;

use ataxx_harness_core::Outcome;
use ataxx_harness_match::run_match;

#[derive(Default)]
struct Summary {
    total: usize,
    passed: usize,
    errors: usize,
    problematic: usize,
}

/// Runs every script in `paths` to completion, printing one result line per
/// test and a final summary to stderr. Returns `true` iff every test was OK.
pub async fn run_all(paths: &[std::path::PathBuf], verbose: bool) -> bool {
    let mut summary = Summary::default();

    for path in paths {
        summary.total += 1;
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                summary.problematic += 1;
                eprintln!("{basename}: FAIL ({err})");
                continue;
            }
        };

        let result = run_match(&text, verbose).await;
        report_logs(&result.logs, verbose);

        match result.outcome {
            Outcome::Ok => {
                summary.passed += 1;
                eprintln!("{basename}: OK");
            }
            Outcome::Fail => {
                summary.problematic += 1;
                eprintln!("{basename}: FAIL ({})", result.detail.unwrap_or_default());
            }
            Outcome::Error => {
                summary.errors += 1;
                eprintln!("{basename}: ERROR ({})", result.detail.unwrap_or_default());
            }
        }
    }

    eprintln!("-----");
    eprintln!("total: {}", summary.total);
    eprintln!("passed: {}", summary.passed);
    eprintln!("errors: {}", summary.errors);
    eprintln!("problematic: {}", summary.problematic);

    summary.passed == summary.total
}

fn report_logs(logs: &[(String, Vec<String>)], verbose: bool) {
    if !verbose {
        return;
    }
    for (title, lines) in logs {
        eprintln!("----- {title} -----");
        for line in lines {
            eprintln!("{line}");
        }
        eprintln!("-----");
    }
}
