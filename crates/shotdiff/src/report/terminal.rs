use std::io::Write;
use std::time::Duration;

use shotdiff::{InsightResult, Severity};

use super::PairStatus;

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print a single comparison result line.
pub fn print_line(name: &str, status: &PairStatus, elapsed: Duration) {
    clear_line();
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));

    match status {
        PairStatus::Pass => {
            println!("  \x1b[32mPASS\x1b[0m  {name}{time_suffix}");
        }
        PairStatus::Fail {
            mismatched,
            percent,
        } => {
            println!(
                "  \x1b[31mFAIL\x1b[0m  {name}  ({mismatched} pixels, {percent:.4}%){time_suffix}"
            );
        }
        PairStatus::SizeChanged {
            baseline: (bw, bh),
            current: (cw, ch),
        } => {
            println!(
                "  \x1b[31mFAIL\x1b[0m  {name}  (cannot compare, size changed: {bw}x{bh} -> {cw}x{ch}){time_suffix}"
            );
        }
        PairStatus::Error(msg) => {
            println!("  \x1b[31m ERR\x1b[0m  {name}  ({msg}){time_suffix}");
        }
    }
}

/// Print a line for a pair with only one side present.
pub fn print_missing_line(name: &str, missing: &str) {
    clear_line();
    println!("  \x1b[33mMISS\x1b[0m  {name}  \x1b[2m(no {missing})\x1b[0m");
}

/// Show comparison progress indicator.
pub fn show_progress(done: usize, total: usize) {
    if done < total {
        print!("  Comparing  [{done}/{total}]");
        let _ = std::io::stdout().flush();
    }
}

/// Print names grouped by status. Only prints sections with at least one entry.
pub fn print_actionable_summary(
    failed: &[String],
    errored: &[String],
    missing_current: &[String],
    missing_baseline: &[String],
) {
    let sections = [
        ("Failed", failed),
        ("Errored", errored),
        ("No current capture", missing_current),
        ("No baseline", missing_baseline),
    ];
    if sections.iter().all(|(_, names)| names.is_empty()) {
        return;
    }

    clear_line();
    println!();
    println!("Actionable comparisons:");

    for (label, names) in sections {
        if !names.is_empty() {
            println!();
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    {name}");
            }
        }
    }
}

/// Totals for the final summary.
pub struct Totals {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub missing_current: usize,
    pub missing_baseline: usize,
}

/// Print the final summary.
pub fn print_summary(t: &Totals, elapsed: Duration) {
    clear_line();
    println!();
    print!(
        "Pairs:  {} total, \x1b[32m{} passed\x1b[0m, \x1b[31m{} failed\x1b[0m",
        t.total, t.passed, t.failed
    );
    if t.errored > 0 {
        print!(", \x1b[31m{} errored\x1b[0m", t.errored);
    }
    if t.missing_current > 0 {
        print!(", \x1b[33m{} without current\x1b[0m", t.missing_current);
    }
    if t.missing_baseline > 0 {
        print!(", \x1b[2m{} without baseline\x1b[0m", t.missing_baseline);
    }
    println!();
    println!("Time:   {}", format_duration(elapsed));
}

fn severity_label(s: Severity) -> String {
    let color = match s {
        Severity::Pass => "32",
        Severity::Minor => "33",
        Severity::Major | Severity::Critical => "31",
    };
    format!("\x1b[{color}m{}\x1b[0m", s.as_str().to_uppercase())
}

/// Print a classifier verdict.
pub fn print_insight(insight: &InsightResult) {
    println!();
    println!("Insight:  {}", severity_label(insight.severity));
    println!("  {}", insight.summary);
    if let Some(verdict) = &insight.verdict {
        println!("  \x1b[2mVerdict:\x1b[0m {verdict}");
    }

    if !insight.issues.is_empty() {
        println!();
        println!("Issues ({}):", insight.issues.len());
        for (i, issue) in insight.issues.iter().enumerate() {
            println!(
                "  {}. [{}] {}  \x1b[2m({}, {})\x1b[0m",
                i + 1,
                severity_label(issue.severity),
                issue.title,
                issue.category,
                issue.location,
            );
            println!("     evidence: {}", issue.evidence);
            println!("     fix:      {}", issue.recommendation);
        }
    }

    if !insight.quick_wins.is_empty() {
        println!();
        println!("Quick wins:");
        for win in &insight.quick_wins {
            println!("  - {win}");
        }
    }
}
