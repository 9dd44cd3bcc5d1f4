use brokerdesk_db::{EntryState, FileOutcome, FileStatus, RunReport, StatusReport};

const WIDTH: usize = 60;

/// Print the run header with the target database and migrations directory.
pub fn print_header(database: &str, dir: &str) {
    let version = env!("CARGO_PKG_VERSION");
    let title = format!("BrokerDesk migrate v{version}");
    let title_dashes = WIDTH.saturating_sub(title.len() + 7); // 7 for "╭─── " + " ╮"
    let row = |l: &str, r: &str| format!("│ {l:<11}{r:<w$}│", w = WIDTH - 14);

    println!("╭─── {title} {}╮", "─".repeat(title_dashes));
    println!("{}", row("Database", &shorten(database, WIDTH - 14)));
    println!("{}", row("Directory", &shorten(dir, WIDTH - 14)));
    println!("╰{}╯", "─".repeat(WIDTH - 2));
}

pub fn print_discovered(files: &[String]) {
    if files.is_empty() {
        println!("No migration files found.");
        return;
    }
    println!(
        "Found {} migration file{}:",
        files.len(),
        if files.len() == 1 { "" } else { "s" }
    );
    for name in files {
        println!("  - {name}");
    }
    println!();
}

pub fn print_outcome(outcome: &FileOutcome) {
    println!("{}", outcome_line(outcome));
}

fn outcome_line(outcome: &FileOutcome) -> String {
    match &outcome.status {
        FileStatus::Applied => format!("  [applied] {}", outcome.filename),
        FileStatus::Skipped => format!("  [skipped] {}", outcome.filename),
        FileStatus::Failed { message } => {
            format!("  [FAILED]  {}\n            {message}", outcome.filename)
        }
    }
}

pub fn print_run_summary(report: &RunReport) {
    println!();
    println!("{}", tally_line(report));
    if report.not_attempted() > 0 {
        println!(
            "{} later migration(s) were not attempted. Fix the failing file and re-run.",
            report.not_attempted()
        );
    }
}

fn tally_line(report: &RunReport) -> String {
    format!(
        "Summary: {} applied, {} skipped, {} failed ({} total)",
        report.succeeded(),
        report.skipped(),
        report.failed(),
        report.discovered.len()
    )
}

pub fn print_status(status: &StatusReport, ledger_table: &str) {
    if !status.ledger_present {
        println!("Ledger table {ledger_table} does not exist yet; nothing has been applied.");
    }
    for entry in &status.entries {
        match &entry.state {
            EntryState::Applied { executed_at } => println!(
                "  [applied]  {:<40} {}",
                entry.filename,
                executed_at.format("%Y-%m-%d %H:%M:%S")
            ),
            EntryState::Pending => println!("  [pending]  {}", entry.filename),
            EntryState::Orphaned { executed_at } => println!(
                "  [orphaned] {:<40} {} (file missing)",
                entry.filename,
                executed_at.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
    println!();
    println!(
        "{} applied, {} pending, {} orphaned",
        status.applied(),
        status.pending(),
        status.orphaned()
    );
}

/// Keep the tail of long paths so the file name stays visible.
fn shorten(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let tail: String = s.chars().skip(count - (max - 1)).collect();
    format!("…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_keeps_tail() {
        assert_eq!(shorten("office.db", 20), "office.db");
        assert_eq!(shorten("/var/lib/brokerdesk/office.db", 10), "…office.db");
    }

    #[test]
    fn failed_line_carries_message() {
        let line = outcome_line(&FileOutcome {
            filename: "0004_payments.sql".into(),
            status: FileStatus::Failed {
                message: "no such table: contracts".into(),
            },
        });
        assert!(line.contains("[FAILED]"));
        assert!(line.contains("0004_payments.sql"));
        assert!(line.contains("no such table: contracts"));
    }

    #[test]
    fn tally_counts_everything_discovered() {
        let report = RunReport {
            discovered: vec!["a.sql".into(), "b.sql".into()],
            outcomes: vec![FileOutcome {
                filename: "a.sql".into(),
                status: FileStatus::Skipped,
            }],
        };
        assert_eq!(
            tally_line(&report),
            "Summary: 0 applied, 1 skipped, 0 failed (2 total)"
        );
    }
}
