//! Terminal rendering for the `run`, `plan` and `config` commands.
//!
//! Status lines go to stdout, except warnings, which go to stderr so that
//! `config show` and `--format json` output stays machine-readable.
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

use crate::pipeline::RunSummary;
use crate::tools::blast::TaskInvocation;

pub fn section_header(title: &str) {
    println!("\n{}", title.bold().cyan());
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Table with bold headers in the shared rounded style
fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

pub fn plan_table(invocations: &[TaskInvocation]) -> Table {
    let mut table = new_table(&["Sample", "Query", "Output", "Command"]);
    for invocation in invocations {
        table.add_row(vec![
            Cell::new(&invocation.sample_id).fg(TableColor::Cyan),
            Cell::new(invocation.flag_value("-q").unwrap_or_default()),
            Cell::new(invocation.output_file.display()),
            Cell::new(invocation.command_line()),
        ]);
    }
    table
}

pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = new_table(&["Sample", "Status", "Hits", "Output"]);
    for result in &summary.results {
        let hits = result
            .hits
            .map(|h| h.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&result.sample_id),
            Cell::new("done").fg(TableColor::Green),
            Cell::new(hits),
            Cell::new(result.output_file.display()),
        ]);
    }
    for failure in &summary.failures {
        table.add_row(vec![
            Cell::new(&failure.sample_id),
            Cell::new("failed").fg(TableColor::Red),
            Cell::new("-"),
            Cell::new(&failure.error),
        ]);
    }
    table
}
