mod exports;
mod styling;
mod summary;
mod tables;

pub use exports::export_report;
pub use summary::{print_analysis, print_optimize};

use styling::{banner_title, label};

/// Prints the `DagLens` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        banner_title("🧭 DagLens"),
        label(env!("CARGO_PKG_VERSION")),
        label("CI/CD Dependency Graph Analyzer")
    );
}
