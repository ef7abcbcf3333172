//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting run summaries, workspace contents and the format registry.

use tabled::{Table, Tabled};

use geoclip_core::cleanup::StrippedField;
use geoclip_core::formats::ExportFormat;
use geoclip_core::pipeline::RunSummary;
use geoclip_core::types::CollectionInfo;

/// Table row representation for displaying export format information.
#[derive(Tabled)]
pub struct FormatRow {
    /// Token passed to the engine (e.g. `MITAB`).
    #[tabled(rename = "Format")]
    pub short_name: String,
    /// Full descriptive name of the format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// CAD or Interchange.
    #[tabled(rename = "Family")]
    pub family: String,
    /// What the format needs besides the format token.
    #[tabled(rename = "Requires")]
    pub requires: String,
}

impl From<&ExportFormat> for FormatRow {
    fn from(format: &ExportFormat) -> Self {
        let requires = if format.extensions().is_empty() {
            "output folder".to_string()
        } else {
            format!("extension ({})", format.extensions().join(", "))
        };
        Self {
            short_name: format.short_name.to_string(),
            long_name: format.long_name.to_string(),
            family: format.family.as_str().to_string(),
            requires,
        }
    }
}

/// Table row representation for a feature collection.
#[derive(Tabled)]
pub struct CollectionRow {
    /// Collection name.
    #[tabled(rename = "Feature Class")]
    pub name: String,
    /// Number of rows.
    #[tabled(rename = "Rows")]
    pub rows: u64,
    /// Comma-separated field names.
    #[tabled(rename = "Fields")]
    pub fields: String,
}

impl From<&CollectionInfo> for CollectionRow {
    fn from(info: &CollectionInfo) -> Self {
        Self {
            name: info.name.clone(),
            rows: info.row_count,
            fields: info.fields.join(", "),
        }
    }
}

/// Table row for one step of a run.
#[derive(Tabled)]
pub struct ActionRow {
    /// Pipeline phase.
    #[tabled(rename = "Step")]
    pub step: String,
    /// Collection acted on.
    #[tabled(rename = "Feature Class")]
    pub target: String,
    /// Result of the step.
    #[tabled(rename = "Detail")]
    pub detail: String,
}

fn action(step: &str, target: &str, detail: String) -> ActionRow {
    ActionRow {
        step: step.to_string(),
        target: target.to_string(),
        detail,
    }
}

/// Converts stripped fields into table rows.
#[must_use]
pub fn stripped_rows(stripped: &[StrippedField]) -> Vec<ActionRow> {
    stripped
        .iter()
        .map(|s| action("Delete field", &s.collection, s.field.clone()))
        .collect()
}

/// Converts a run summary into table rows, in pipeline order.
#[must_use]
pub fn summary_rows(summary: &RunSummary) -> Vec<ActionRow> {
    let mut rows: Vec<ActionRow> = summary
        .clipped
        .iter()
        .map(|path| action("Clip", path, "created".to_string()))
        .collect();
    rows.extend(
        summary
            .cleanup
            .removed_collections
            .iter()
            .map(|name| action("Remove empty", name, "0 rows".to_string())),
    );
    rows.extend(stripped_rows(&summary.cleanup.stripped_fields));
    rows.extend(
        summary
            .exports
            .iter()
            .map(|e| action("Export", &e.collection, e.destination.clone())),
    );
    rows
}

/// Display a run summary.
pub fn display_summary(summary: &RunSummary) {
    println!("\nDatasets: {}", summary.datasets.join(", "));

    let rows = summary_rows(summary);
    if rows.is_empty() {
        println!("Nothing to do.");
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Display the collections of a workspace.
pub fn display_collections(workspace: &str, collections: &[CollectionInfo]) {
    println!("\nWorkspace: {workspace}");
    if collections.is_empty() {
        println!("No feature classes.");
        return;
    }
    let rows: Vec<CollectionRow> = collections.iter().map(CollectionRow::from).collect();
    println!("{}", Table::new(rows));
}
