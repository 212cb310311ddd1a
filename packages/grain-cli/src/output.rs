//! Human-readable and JSON rendering of run results.

use anyhow::Result;
use colored::Colorize;
use grain_graph::{BatchSummary, BondType, BuildReport, RunOutcome, TopicEntry};

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn bond_label(bond: BondType) -> colored::ColoredString {
    match bond {
        BondType::Genesis => bond.to_string().bright_green(),
        BondType::Derived => bond.to_string().bright_blue(),
        BondType::Contradicts => bond.to_string().bright_red(),
    }
}

fn print_report(report: &BuildReport) {
    for record in &report.written {
        let indent = "  ".repeat(usize::from(record.depth) + 1);
        println!(
            "{}{} {} {}",
            indent,
            bond_label(record.claim.bond_type),
            record.claim.content,
            record.id.to_string().dimmed()
        );
    }

    for failure in &report.failures {
        println!(
            "  {} {} ({}; {} below it skipped)",
            "✗".red(),
            failure.content,
            failure.error,
            failure.abandoned
        );
    }

    println!(
        "  {} written, {} minted, {} reused, {} skipped",
        report.write_count().to_string().bold(),
        report.topics_minted,
        report.topics_reused,
        report.skipped
    );
}

pub fn print_outcome(url: &str, outcome: &RunOutcome) {
    println!("{} {}", "▶".bright_cyan(), url.bold());
    match outcome {
        RunOutcome::Skipped { reason } => println!("  {} fetch failed: {}", "skipped".yellow(), reason),
        RunOutcome::ExtractFailed { reason } => {
            println!("  {} extraction failed: {}", "skipped".yellow(), reason)
        }
        RunOutcome::NoClaims => println!("  {}", "no claims extracted".yellow()),
        RunOutcome::Built { report } => print_report(report),
    }
}

pub fn print_summary(summary: &BatchSummary) {
    for result in &summary.results {
        print_outcome(&result.url, &result.outcome);
    }
    println!();
    println!(
        "{} {} URLs, {} skipped, {} claims written, {} write failures",
        "Batch complete:".bright_green().bold(),
        summary.processed(),
        summary.skipped(),
        summary.total_writes(),
        summary.total_failures()
    );
}

pub fn print_index(entries: &[TopicEntry], capacity: usize) {
    if entries.is_empty() {
        println!("{}", "Topic index is empty".dimmed());
        return;
    }
    println!("{} ({}/{})", "Known topics".bold(), entries.len(), capacity);
    for (i, entry) in entries.iter().enumerate().rev() {
        println!("  {:>2}. {} {}", i + 1, entry.content, entry.id.to_string().dimmed());
    }
}
