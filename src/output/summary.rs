use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::analysis::{AnalysisReport, ChangeReason, DependencyIssue, OptimizeReport};

use super::styling::{alert, bullet, emphasis, heading, label, name, ok};
use super::tables::{create_table, format_duration, severity_cell};

/// Prints a human-readable summary of a dependency analysis to stdout.
///
/// Displays color-coded sections showing:
/// - Overview: File, platform, job/edge counts, serial vs. parallel time
/// - Dependency Issues: Cycles, missing and redundant dependencies
/// - Execution Stages: Jobs grouped by the earliest stage they can run in
/// - Critical Path: The duration-weighted longest chain
/// - Bottlenecks: Jobs that block the most downstream work
/// - Suggestions: Parallelization and restructuring opportunities
pub fn print_analysis(report: &AnalysisReport) {
    println!("{}", render_analysis(report));
}

/// Prints a human-readable summary of an optimize run to stdout.
pub fn print_optimize(report: &OptimizeReport) {
    println!("{}", render_optimize(report));
}

// Helper functions

fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", heading(emoji), heading(title).underlined());
}

fn change_reason_label(reason: ChangeReason) -> &'static str {
    match reason {
        ChangeReason::RemoveRedundantDependency => "redundant dependency",
        ChangeReason::EnableParallelization => "enable parallelization",
    }
}

#[allow(clippy::too_many_lines, clippy::format_push_string)]
fn render_analysis(report: &AnalysisReport) -> String {
    let result = &report.result;
    let mut output = String::new();

    // Overview section
    add_section_header(&mut output, "📊", "Overview");

    let has_cycle = result
        .issues
        .iter()
        .any(|issue| matches!(issue, DependencyIssue::CircularDependency { .. }));
    let speedup_display = if result.optimal_parallel_time > 0 {
        #[allow(clippy::cast_precision_loss)]
        let speedup = result.total_serial_time as f64 / result.optimal_parallel_time as f64;
        if speedup > 1.5 {
            ok(format!("{speedup:.1}x"))
        } else {
            emphasis(format!("{speedup:.1}x"))
        }
    } else {
        alert("n/a")
    };

    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        label("File:"),
        name(&report.file),
        label("Platform:"),
        name(report.platform),
        label("Jobs:"),
        emphasis(result.jobs.len()),
        label("Dependency edges:"),
        emphasis(result.edges.len()),
        label("Serial time:"),
        emphasis(format_duration(result.total_serial_time)),
        label("Best parallel time:"),
        emphasis(format_duration(result.optimal_parallel_time)),
        label("Potential speedup:"),
        speedup_display,
        label("Analysis date:"),
        label(report.analyzed_at.format("%Y-%m-%d %H:%M UTC"))
    ));

    // Dependency Issues
    add_section_header(&mut output, "⚠️", "Dependency Issues");

    if result.issues.is_empty() {
        output.push_str(&format!(
            "  {}\n\n",
            ok("No dependency issues found.")
        ));
    } else {
        let mut issues_table = create_table();
        issues_table.set_header(create_cyan_header(&["Severity", "Issue", "Suggested Fix"]));
        for issue in &result.issues {
            issues_table.add_row(vec![
                severity_cell(issue.severity()),
                Cell::new(issue.message()),
                Cell::new(issue.suggestion()),
            ]);
        }
        output.push_str(&format!("{issues_table}\n\n"));
    }

    // Execution Stages
    add_section_header(&mut output, "📋", "Execution Stages");

    if has_cycle {
        output.push_str(&format!(
            "  {}\n\n",
            alert("Stages unavailable: resolve the circular dependency first.")
        ));
    } else {
        let mut stages_table = create_table();
        stages_table.set_header(create_cyan_header(&["Stage", "Jobs", "Width"]));
        for (idx, stage) in result.execution_stages.iter().enumerate() {
            stages_table.add_row(vec![
                Cell::new(idx + 1),
                Cell::new(stage.join("\n")),
                Cell::new(stage.len()),
            ]);
        }
        output.push_str(&format!("{stages_table}\n\n"));
    }

    // Critical Path
    if !result.critical_path.jobs.is_empty() {
        add_section_header(&mut output, "🎯", "Critical Path");
        output.push_str(&format!(
            "  {} {}\n\n",
            name(result.critical_path.jobs.join(" -> ")),
            label(format!(
                "({})",
                format_duration(result.critical_path.total_duration)
            ))
        ));
    }

    // Bottlenecks
    if !result.bottlenecks.is_empty() {
        add_section_header(&mut output, "🚧", "Bottlenecks");
        for job in &result.bottlenecks {
            let blocked = result
                .edges
                .iter()
                .filter(|(from, _)| from == job)
                .count();
            output.push_str(&format!(
                "  {} {} {}\n",
                bullet(),
                emphasis(job),
                label(format!("blocks {blocked} job(s)"))
            ));
        }
        output.push('\n');
    }

    // Suggestions
    if !result.suggestions.is_empty() {
        add_section_header(&mut output, "💡", "Suggestions");

        let mut suggestions_table = create_table();
        suggestions_table.set_header(create_cyan_header(&[
            "Severity",
            "Finding",
            "Recommendation",
        ]));
        for suggestion in &result.suggestions {
            suggestions_table.add_row(vec![
                severity_cell(suggestion.severity()),
                Cell::new(suggestion.message()),
                Cell::new(suggestion.suggestion()),
            ]);
        }
        output.push_str(&format!("{suggestions_table}\n\n"));

        output.push_str(&format!(
            "  {} Run {} to rewrite redundant dependencies automatically\n",
            bullet(),
            emphasis("daglens optimize <file> --apply")
        ));
    }

    output
}

fn render_optimize(report: &OptimizeReport) -> String {
    let result = &report.result;
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let applied_display = if report.applied {
        ok("written back to file")
    } else {
        emphasis("dry run")
    };
    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        label("File:"),
        name(&report.file),
        label("Platform:"),
        name(report.platform),
        label("Changes:"),
        emphasis(result.changes.len()),
        label("Mode:"),
        applied_display
    ));

    if result.changes.is_empty() {
        output.push_str(&format!(
            "  {}\n",
            ok("Dependencies are already optimal.")
        ));
        return output;
    }

    add_section_header(&mut output, "🔧", "Dependency Changes");

    let mut changes_table = create_table();
    changes_table.set_header(create_cyan_header(&["Job", "Removed", "Reason"]));
    for change in &result.changes {
        changes_table.add_row(vec![
            Cell::new(&change.job),
            Cell::new(change.removed.join("\n")),
            Cell::new(change_reason_label(change.reason)),
        ]);
    }
    output.push_str(&format!("{changes_table}\n\n"));

    if !report.applied {
        output.push_str(&format!(
            "  {} Re-run with {} to write these changes back to the file\n",
            bullet(),
            emphasis("--apply")
        ));
    }

    output
}
