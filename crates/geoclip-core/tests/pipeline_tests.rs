//! End-to-end pipeline tests against the in-memory engine.

use geoclip_core::cleanup::{cleanup, delete_fields_in_workspace};
use geoclip_core::config::PipelineConfig;
use geoclip_core::engine::SpatialEngine;
use geoclip_core::error::{CapabilityError, ConfigError, EngineError, GeoClipError};
use geoclip_core::memory::{
    Dataset, Envelope, ExportKind, FeatureCollection, MemoryEngine, Record, Store,
};
use geoclip_core::pipeline::{ExportParameters, RunParameters, run};
use geoclip_core::selection::DatasetSelection;
use geoclip_core::types::{BoundaryPolygon, GeometryType, Workspace};

const CAPABILITY: &str = "DataInteroperability";

fn source() -> Workspace {
    Workspace::new("C:/gis/source.gdb")
}

fn output() -> Workspace {
    Workspace::new("C:/gis/out.gdb")
}

/// Workspace with dataset "Utilities" holding Pipe (inside the study area),
/// an administrative collection, and Hydrant (outside the study area).
fn utilities_engine() -> MemoryEngine {
    let utilities = Dataset::new("Utilities")
        .with_collection(
            FeatureCollection::new(
                "Pipe",
                GeometryType::Line,
                &["OBJECTID", "DIAMETER", "CREATEDBY"],
            )
            .with_record(
                Record::new(Envelope::new(1.0, 1.0, 4.0, 2.0))
                    .with_attribute("DIAMETER", 150)
                    .with_attribute("CREATEDBY", "jj"),
            ),
        )
        .with_collection(
            FeatureCollection::new("JJGIS.wSConnection", GeometryType::Point, &["OBJECTID"])
                .with_record(Record::at(2.0, 2.0)),
        )
        .with_collection(
            FeatureCollection::new("Hydrant", GeometryType::Point, &["OBJECTID", "CREATEDBY"])
                .with_record(Record::at(50.0, 50.0)),
        );

    let sewer = Dataset::new("Sewer").with_collection(
        FeatureCollection::new("Manhole", GeometryType::Point, &["OBJECTID"])
            .with_record(Record::at(3.0, 3.0)),
    );

    MemoryEngine::new()
        .with_workspace(
            &source(),
            Store::default()
                .with_collection(
                    FeatureCollection::new("StudyArea", GeometryType::Polygon, &["OBJECTID"])
                        .with_record(Record::new(Envelope::new(0.0, 0.0, 10.0, 10.0))),
                )
                .with_dataset(sewer)
                .with_dataset(utilities),
        )
        .with_workspace(&output(), Store::default())
        .with_capability(CAPABILITY, true)
}

fn params(datasets: DatasetSelection, export: Option<ExportParameters>) -> RunParameters {
    RunParameters {
        source: source(),
        output: output(),
        datasets,
        boundary: BoundaryPolygon::new("StudyArea"),
        export,
    }
}

fn output_names(engine: &MemoryEngine) -> Vec<String> {
    engine
        .store(&output())
        .unwrap()
        .collections
        .iter()
        .map(|c| c.name.clone())
        .collect()
}

#[test]
fn test_utilities_scenario() {
    let mut engine = utilities_engine();
    let selection = DatasetSelection::Named(vec!["Utilities".to_string()]);

    let summary = run(&mut engine, &params(selection, None), &PipelineConfig::default()).unwrap();

    assert_eq!(summary.datasets, vec!["Utilities"]);
    assert_eq!(
        summary.clipped,
        vec!["C:/gis/out.gdb/Pipe_clp", "C:/gis/out.gdb/Hydrant_clp"]
    );
    assert_eq!(summary.cleanup.removed_collections, vec!["Hydrant_clp"]);
    assert_eq!(output_names(&engine), vec!["Pipe_clp"]);
    assert!(summary.exports.is_empty());

    // The input workspace is never modified
    assert_eq!(engine.row_count(&source(), "Hydrant").unwrap(), 1);
    assert!(engine.collection(&source(), "JJGIS.wSConnection").is_some());
}

#[test]
fn test_all_datasets_in_store_order() {
    let mut engine = utilities_engine();
    let summary = run(
        &mut engine,
        &params(DatasetSelection::All, None),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(summary.datasets, vec!["Sewer", "Utilities"]);
    assert_eq!(output_names(&engine), vec!["Manhole_clp", "Pipe_clp"]);
}

#[test]
fn test_requested_order_is_ignored() {
    let mut engine = utilities_engine();
    let selection: DatasetSelection = "Utilities, Sewer, Gas".parse().unwrap();
    let summary = run(&mut engine, &params(selection, None), &PipelineConfig::default()).unwrap();
    assert_eq!(summary.datasets, vec!["Sewer", "Utilities"]);
}

#[test]
fn test_output_workspace_with_trailing_separator() {
    let mut engine = utilities_engine();
    let params = RunParameters {
        output: Workspace::new("C:/gis/out.gdb/"),
        ..params(DatasetSelection::Named(vec!["Utilities".to_string()]), None)
    };

    let summary = run(&mut engine, &params, &PipelineConfig::default()).unwrap();

    assert_eq!(
        summary.clipped,
        vec![
            "C:/gis/out.gdb/Pipe_clp".to_string(),
            "C:/gis/out.gdb/Hydrant_clp".to_string()
        ]
    );
    assert_eq!(output_names(&engine), vec!["Pipe_clp"]);
}

#[test]
fn test_empty_deny_list_clips_everything() {
    let mut engine = utilities_engine();
    let config = PipelineConfig {
        excluded_collections: Vec::new(),
        ..PipelineConfig::default()
    };
    let selection = DatasetSelection::Named(vec!["Utilities".to_string()]);
    run(&mut engine, &params(selection, None), &config).unwrap();

    assert_eq!(
        output_names(&engine),
        vec!["Pipe_clp", "JJGIS.wSConnection_clp"]
    );
}

#[test]
fn test_progress_messages_and_workspace_switches() {
    let mut engine = utilities_engine();
    let selection = DatasetSelection::Named(vec!["Utilities".to_string()]);
    run(&mut engine, &params(selection, None), &PipelineConfig::default()).unwrap();

    assert_eq!(
        engine.messages(),
        [
            "Getting features from dataset: Utilities",
            "Clipping feature Pipe",
            "Clipping feature Hydrant",
            "Removing empty feature classes...",
            "Removing restricted fields...",
        ]
    );

    // Input is activated for listing and for each clip, output for each cleanup step
    let src = source().path;
    let out = output().path;
    assert_eq!(
        engine.workspace_switches(),
        [src.clone(), src.clone(), src, out.clone(), out]
    );
}

#[test]
fn test_fields_are_stripped_from_outputs_only() {
    let mut engine = utilities_engine();
    let config = PipelineConfig::default().with_fields_to_delete(["CREATEDBY", "MISSING"]);
    let summary = run(&mut engine, &params(DatasetSelection::All, None), &config).unwrap();

    assert_eq!(summary.cleanup.stripped_fields.len(), 1);
    assert_eq!(summary.cleanup.stripped_fields[0].collection, "Pipe_clp");

    let pipe = engine.collection(&output(), "Pipe_clp").unwrap();
    assert_eq!(pipe.fields, vec!["OBJECTID", "DIAMETER"]);
    assert!(!pipe.records[0].attributes.contains_key("CREATEDBY"));

    let source_pipe = engine.collection(&source(), "Pipe").unwrap();
    assert!(source_pipe.fields.contains(&"CREATEDBY".to_string()));
}

#[test]
fn test_cleanup_is_idempotent() {
    let mut engine = utilities_engine();
    let config = PipelineConfig::default().with_fields_to_delete(["CREATEDBY"]);
    run(&mut engine, &params(DatasetSelection::All, None), &config).unwrap();

    let before = engine.store(&output()).unwrap().clone();
    let report = cleanup(&mut engine, &output(), &config.fields_to_delete).unwrap();

    assert!(report.is_empty());
    assert_eq!(engine.store(&output()).unwrap(), &before);
}

#[test]
fn test_protected_field_aborts_run() {
    let mut engine = utilities_engine();
    let config = PipelineConfig::default().with_fields_to_delete(["OBJECTID"]);
    let err = run(&mut engine, &params(DatasetSelection::All, None), &config).unwrap_err();

    assert!(matches!(
        err,
        GeoClipError::Engine(EngineError::ProtectedField { .. })
    ));
    // Clip results stay behind, there is no rollback
    assert!(!output_names(&engine).is_empty());
}

#[test]
fn test_locked_empty_collection_aborts_cleanup() {
    let mut engine = utilities_engine();
    engine.ensure_workspace(&output());
    let mut store = engine.store(&output()).unwrap().clone();
    store
        .collections
        .push(FeatureCollection::new("Old_clp", GeometryType::Point, &[]).locked());
    let mut engine = engine.with_workspace(&output(), store);

    let err = run(
        &mut engine,
        &params(DatasetSelection::All, None),
        &PipelineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, GeoClipError::Engine(EngineError::Locked { .. })));
}

#[test]
fn test_missing_boundary_is_fatal() {
    let mut engine = utilities_engine();
    let mut run_params = params(DatasetSelection::All, None);
    run_params.boundary = BoundaryPolygon::new("NoSuchArea");

    let err = run(&mut engine, &run_params, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, GeoClipError::Engine(EngineError::NotFound { .. })));
    assert!(output_names(&engine).is_empty());
}

#[test]
fn test_cad_export_dispatch() {
    let mut engine = utilities_engine();
    let selection = DatasetSelection::Named(vec!["Utilities".to_string()]);
    let export = ExportParameters {
        format: "DWG_R2010".to_string(),
        output_folder: "C:/cad".to_string(),
        extension: "dwg".to_string(),
    };

    let summary = run(
        &mut engine,
        &params(selection, Some(export)),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(engine.exports.len(), 1);
    let entry = &engine.exports[0];
    assert_eq!(entry.kind, ExportKind::Cad);
    assert_eq!(entry.collection, "Pipe_clp");
    assert_eq!(entry.destination, "C:/cad/Pipe_clp.dwg");
    assert_eq!(entry.workspace, output().path);
    assert!(entry.options.contains(&"Use_Filenames_in_Tables".to_string()));
    assert!(entry.options.contains(&"Overwrite_Existing_Files".to_string()));

    assert_eq!(summary.exports.len(), 1);
    assert_eq!(engine.capability_checks(), 1);
    assert_eq!(engine.activated_capabilities(), [CAPABILITY.to_string()]);
    assert!(
        engine
            .messages()
            .contains(&"Exporting feature: Pipe_clp to C:/cad/Pipe_clp.dwg".to_string())
    );
}

#[test]
fn test_interchange_export_dispatch() {
    let mut engine = utilities_engine();
    let export = ExportParameters {
        format: "MITAB".to_string(),
        output_folder: "C:/mapinfo".to_string(),
        extension: String::new(),
    };

    run(
        &mut engine,
        &params(DatasetSelection::All, Some(export)),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(engine.exports.len(), 2);
    assert!(engine.exports.iter().all(|e| e.kind == ExportKind::Interchange));
    assert!(
        engine
            .exports
            .iter()
            .all(|e| e.destination == "MITAB,C:/mapinfo")
    );
    // One capability check for the whole run, not one per feature
    assert_eq!(engine.capability_checks(), 1);
}

#[test]
fn test_invalid_export_request_is_fatal_before_exporting() {
    let mut engine = utilities_engine();
    let export = ExportParameters {
        format: "DWG_R2010".to_string(),
        output_folder: String::new(),
        extension: "shp".to_string(),
    };

    let err = run(
        &mut engine,
        &params(DatasetSelection::All, Some(export)),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        GeoClipError::Config(ConfigError::InvalidExportRequest { .. })
    ));
    assert!(engine.exports.is_empty());
    assert_eq!(engine.capability_checks(), 0);
}

#[test]
fn test_missing_capability_stops_before_export() {
    let mut engine = utilities_engine().with_capability(CAPABILITY, false);
    let export = ExportParameters {
        format: "SHAPE".to_string(),
        output_folder: "C:/shp".to_string(),
        extension: String::new(),
    };

    let err = run(
        &mut engine,
        &params(DatasetSelection::All, Some(export)),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        GeoClipError::Capability(CapabilityError::Unavailable { .. })
    ));
    assert!(engine.exports.is_empty());
    assert_eq!(engine.capability_checks(), 1);
    assert!(engine.activated_capabilities().is_empty());
}

#[test]
fn test_export_failure_aborts_remaining_exports() {
    let mut engine = utilities_engine();
    let mut store = engine.store(&output()).unwrap().clone();
    store.collections.push(
        FeatureCollection::new("A_locked", GeometryType::Point, &[])
            .with_record(Record::at(1.0, 1.0))
            .locked(),
    );
    let mut engine = engine.with_workspace(&output(), store);
    let export = ExportParameters {
        format: "MIF".to_string(),
        output_folder: "C:/mif".to_string(),
        extension: String::new(),
    };

    let err = run(
        &mut engine,
        &params(DatasetSelection::All, Some(export)),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, GeoClipError::Engine(EngineError::Locked { .. })));
    // The locked collection comes first in the output store
    assert!(engine.exports.is_empty());
}

#[test]
fn test_standalone_field_deletion_covers_datasets() {
    let mut engine = utilities_engine();
    let fields = vec!["CREATEDBY".to_string(), "CREATEDATE".to_string()];

    let stripped = delete_fields_in_workspace(&mut engine, &source(), &fields).unwrap();

    let collections: Vec<&str> = stripped.iter().map(|s| s.collection.as_str()).collect();
    assert_eq!(collections, vec!["Pipe", "Hydrant"]);
    assert!(
        !engine
            .collection(&source(), "Hydrant")
            .unwrap()
            .fields
            .contains(&"CREATEDBY".to_string())
    );

    // Second pass finds nothing left to delete
    assert!(
        delete_fields_in_workspace(&mut engine, &source(), &fields)
            .unwrap()
            .is_empty()
    );
}
