//! Terminal output for the harness.

use crate::counter;
use crate::registry::WorkloadReport;
use terminal_size::{terminal_size, Width};

/// Get the current terminal width, constrained to a reasonable range.
fn get_term_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        (w as usize).clamp(40, 200)
    } else {
        80 // Safe default
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else if max > 3 {
        format!("{}...", &s[..max - 3])
    } else {
        s[..max].to_string()
    }
}

/// Print the harness header box.
pub fn print_header() {
    let width = get_term_width().saturating_sub(4).max(40);
    let title = format!(
        "cycle-probe: chained multiplication latency ({})",
        counter::unit_name()
    );
    let content = truncate(&title, width);
    let border = "─".repeat(content.len() + 2);

    println!("┌{}┐", border);
    println!("│ {} │", content);
    println!("└{}┘", border);
}

/// Print the per-workload report table.
pub fn print_report(reports: &[WorkloadReport]) {
    let unit = counter::unit_name();
    println!(
        "{:<10} {:<45} {:>12} {:>14} {:>9}",
        "workload",
        "description",
        format!("{}/mul", unit),
        format!("span ({})", unit),
        "samples"
    );

    for report in reports {
        println!(
            "{:<10} {:<45} {:>12.3} {:>14} {:>9}",
            report.name,
            truncate(report.description, 45),
            report.cycles_per_op,
            report.span_cycles,
            report.sample_count
        );
    }
}

/// Print the residue byte that keeps the multiplication chains observable.
/// The value itself is meaningless.
pub fn print_residue(byte: u8) {
    println!("({})", byte);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_limit() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer string", 10), "a longe...");
        assert_eq!(truncate("abcdef", 3), "abc");
    }
}
