//! Batch report rendering.

use codesync_sync::BatchReport;
use std::fmt::Write;
use std::process::ExitCode;

/// Renders per-kind counts, the total, then any warnings and failures.
pub fn render(report: &BatchReport) -> String {
    let mut out = String::new();
    for (kind, summary) in report.by_kind() {
        let _ = writeln!(
            out,
            "{:<10} {} succeeded, {} failed",
            kind.as_str(),
            summary.succeeded,
            summary.failed
        );
    }
    let _ = writeln!(
        out,
        "{:<10} {} succeeded, {} failed",
        "total",
        report.success_count(),
        report.failed_count()
    );

    let warnings = report.warnings();
    if !warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for (name, message) in warnings {
            let _ = writeln!(out, "  {name}: {message}");
        }
    }

    let failures = report.failures();
    if !failures.is_empty() {
        out.push_str("\nFailed:\n");
        for (name, message) in failures {
            let _ = writeln!(out, "  {name}: {message}");
        }
    }
    out
}

/// Exit status: failure when any resource failed.
pub fn exit_code(report: &BatchReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
