//! The clip, cleanup and export pipeline.
//!
//! Phases run strictly one after another; each completes for every item
//! before the next starts, and the first failure ends the run. A failed run
//! leaves the output workspace as it was at the point of failure.

use log::info;

use crate::cleanup::{CleanupReport, cleanup};
use crate::clip::clip_features;
use crate::config::PipelineConfig;
use crate::engine::SpatialEngine;
use crate::error::Result;
use crate::export::{ExportRecord, ExportRequest, export_features};
use crate::selection::{DatasetSelection, list_features, list_selected_datasets};
use crate::types::{BoundaryPolygon, Workspace};

/// Raw export parameters, validated when the run starts exporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportParameters {
    /// Format token (e.g. `"MITAB"`, `"DWG_R2010"`)
    pub format: String,
    /// Output folder; required for interchange formats
    pub output_folder: String,
    /// File extension; required for CAD formats
    pub extension: String,
}

/// Typed parameters of a run.
#[derive(Debug, Clone)]
pub struct RunParameters {
    /// Input workspace
    pub source: Workspace,
    /// Output workspace
    pub output: Workspace,
    /// Datasets to process
    pub datasets: DatasetSelection,
    /// Clip mask
    pub boundary: BoundaryPolygon,
    /// Export settings; `None` skips the export phase
    pub export: Option<ExportParameters>,
}

/// What a run did, phase by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Datasets that were processed
    pub datasets: Vec<String>,
    /// Output paths written by the clip phase
    pub clipped: Vec<String>,
    /// Cleanup results
    pub cleanup: CleanupReport,
    /// Completed exports
    pub exports: Vec<ExportRecord>,
}

/// Runs the pipeline.
///
/// # Errors
///
/// Returns the first configuration, capability or engine error.
pub fn run<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    params: &RunParameters,
    config: &PipelineConfig,
) -> Result<RunSummary> {
    info!(
        "Clipping {} into {} by {}",
        params.source, params.output, params.boundary.reference
    );

    let datasets = list_selected_datasets(engine, &params.source, &params.datasets)?;
    let mut clipped = Vec::new();
    for dataset in &datasets {
        engine.notify(&format!("Getting features from dataset: {dataset}"));
        let features = list_features(
            engine,
            &params.source,
            dataset,
            &config.excluded_collections,
        )?;
        clipped.extend(clip_features(
            engine,
            &params.source,
            &params.output,
            &features,
            &params.boundary,
            config.xy_tolerance,
        )?);
    }

    let cleanup = cleanup(engine, &params.output, &config.fields_to_delete)?;

    let mut exports = Vec::new();
    if let Some(export) = &params.export {
        engine.notify("Validating input variables...");
        let request = ExportRequest::new(&export.format, &export.output_folder, &export.extension)?;
        engine.notify("Exporting...");
        exports = export_features(engine, &params.output, &request, &config.export_capability)?;
    }

    info!(
        "Run complete: {} clipped, {} removed, {} exported",
        clipped.len(),
        cleanup.removed_collections.len(),
        exports.len()
    );
    Ok(RunSummary {
        datasets,
        clipped,
        cleanup,
        exports,
    })
}
