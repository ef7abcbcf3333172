//! In-memory [`SpatialEngine`] backed by a JSON snapshot.
//!
//! `MemoryEngine` keeps every workspace in memory: datasets, feature
//! collections, and per-record envelopes with attributes. It is used by the
//! test-suite and by the CLI, which loads a snapshot file, runs the pipeline
//! and writes the snapshot back.
//!
//! Geometry is reduced to axis-aligned envelopes. A clip keeps every record
//! whose envelope intersects the envelope of a boundary record (grown by the
//! XY tolerance) and trims it to that intersection. Exports are not written
//! to disk; they are appended to the snapshot's export log.
//!
//! # Examples
//!
//! ```
//! use geoclip_core::engine::SpatialEngine;
//! use geoclip_core::memory::{Dataset, FeatureCollection, MemoryEngine, Record, Store};
//! use geoclip_core::types::{GeometryType, Workspace};
//!
//! let source = Workspace::new("source.gdb");
//! let engine = MemoryEngine::new().with_workspace(
//!     &source,
//!     Store::default().with_dataset(Dataset::new("Utilities").with_collection(
//!         FeatureCollection::new("Pipe", GeometryType::Line, &["DIAMETER"])
//!             .with_record(Record::at(1.0, 1.0)),
//!     )),
//! );
//!
//! assert_eq!(engine.list_datasets(&source, "*").unwrap(), vec!["Utilities"]);
//! assert_eq!(engine.row_count(&source, "Pipe").unwrap(), 1);
//! ```

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::engine::{CAD_OVERWRITE, CAD_TABLE_NAMING, SpatialEngine, matches_pattern};
use crate::error::{EngineError, EngineResult, IoErrorExt, Result};
use crate::formats::ExportFormat;
use crate::types::{
    BoundaryPolygon, CapabilityStatus, CollectionInfo, FieldDescriptor, GeometryFilter,
    GeometryType, Workspace,
};

/// Fields an engine refuses to delete.
pub const DEFAULT_PROTECTED_FIELDS: &[&str] = &["OBJECTID", "Shape"];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Minimum X
    pub min_x: f64,
    /// Minimum Y
    pub min_y: f64,
    /// Maximum X
    pub max_x: f64,
    /// Maximum Y
    pub max_y: f64,
}

impl Envelope {
    /// Creates an envelope, normalising the corner order.
    #[must_use]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Grows the envelope by `distance` on every side.
    #[must_use]
    pub fn expand(&self, distance: f64) -> Self {
        Self {
            min_x: self.min_x - distance,
            min_y: self.min_y - distance,
            max_x: self.max_x + distance,
            max_y: self.max_y + distance,
        }
    }

    /// Returns the overlap with `other`, if any. Touching edges overlap.
    #[must_use]
    pub fn intersection(&self, other: &Envelope) -> Option<Envelope> {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        (min_x <= max_x && min_y <= max_y).then_some(Envelope {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }
}

/// A single feature: its envelope and attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Extent of the geometry; `None` for table rows
    #[serde(default)]
    pub envelope: Option<Envelope>,
    /// Attribute values keyed by field name
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Creates a record with the given extent.
    #[must_use]
    pub fn new(envelope: Envelope) -> Self {
        Self {
            envelope: Some(envelope),
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a point record.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self::new(Envelope::new(x, y, x, y))
    }

    /// Sets an attribute value.
    #[must_use]
    pub fn with_attribute(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(field.to_string(), value.into());
        self
    }
}

/// A named, typed collection of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Collection name, unique within its workspace
    pub name: String,
    /// Geometry type
    pub geometry: GeometryType,
    /// Field names in schema order
    #[serde(default)]
    pub fields: Vec<String>,
    /// Records
    #[serde(default)]
    pub records: Vec<Record>,
    /// Whether another process holds a lock on the collection
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl FeatureCollection {
    /// Creates an empty collection with the given schema.
    #[must_use]
    pub fn new(name: &str, geometry: GeometryType, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            fields: fields.iter().map(ToString::to_string).collect(),
            records: Vec::new(),
            locked: false,
        }
    }

    /// Adds a record.
    #[must_use]
    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Marks the collection as locked.
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// A named group of collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name
    pub name: String,
    /// Collections in store order
    #[serde(default)]
    pub collections: Vec<FeatureCollection>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collections: Vec::new(),
        }
    }

    /// Adds a collection.
    #[must_use]
    pub fn with_collection(mut self, collection: FeatureCollection) -> Self {
        self.collections.push(collection);
        self
    }
}

/// Contents of one workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Datasets in store order
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    /// Standalone collections at the workspace root
    #[serde(default)]
    pub collections: Vec<FeatureCollection>,
}

impl Store {
    /// Adds a dataset.
    #[must_use]
    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.push(dataset);
        self
    }

    /// Adds a standalone collection.
    #[must_use]
    pub fn with_collection(mut self, collection: FeatureCollection) -> Self {
        self.collections.push(collection);
        self
    }

    /// Finds a collection at the root or inside any dataset.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FeatureCollection> {
        self.collections
            .iter()
            .chain(self.datasets.iter().flat_map(|d| d.collections.iter()))
            .find(|c| c.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut FeatureCollection> {
        self.collections
            .iter_mut()
            .chain(self.datasets.iter_mut().flat_map(|d| d.collections.iter_mut()))
            .find(|c| c.name == name)
    }

    fn remove(&mut self, name: &str) {
        self.collections.retain(|c| c.name != name);
        for dataset in &mut self.datasets {
            dataset.collections.retain(|c| c.name != name);
        }
    }
}

/// Which export path produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// `export_cad`
    Cad,
    /// `export_interchange`
    Interchange,
}

/// An export performed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLogEntry {
    /// Export path
    pub kind: ExportKind,
    /// Workspace the collection was read from
    pub workspace: String,
    /// Collection name
    pub collection: String,
    /// CAD file path or interchange descriptor
    pub destination: String,
    /// Engine option keywords
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_protected_fields() -> Vec<String> {
    DEFAULT_PROTECTED_FIELDS
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// In-memory spatial engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEngine {
    /// Workspaces keyed by path
    #[serde(default)]
    pub workspaces: BTreeMap<String, Store>,
    /// Fields that cannot be deleted
    #[serde(default = "default_protected_fields")]
    pub protected_fields: Vec<String>,
    /// Licensed extensions and whether they are available
    #[serde(default)]
    pub capabilities: BTreeMap<String, bool>,
    /// Exports performed so far
    #[serde(default)]
    pub exports: Vec<ExportLogEntry>,
    #[serde(skip)]
    active: Option<Workspace>,
    #[serde(skip)]
    workspace_switches: Vec<String>,
    #[serde(skip)]
    messages: Vec<String>,
    #[serde(skip)]
    capability_checks: Cell<usize>,
    #[serde(skip)]
    activated: Vec<String>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self {
            workspaces: BTreeMap::new(),
            protected_fields: default_protected_fields(),
            capabilities: BTreeMap::new(),
            exports: Vec::new(),
            active: None,
            workspace_switches: Vec::new(),
            messages: Vec::new(),
            capability_checks: Cell::new(0),
            activated: Vec::new(),
        }
    }
}

impl MemoryEngine {
    /// Creates an engine with no workspaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a workspace.
    #[must_use]
    pub fn with_workspace(mut self, workspace: &Workspace, store: Store) -> Self {
        self.workspaces.insert(workspace.path.clone(), store);
        self
    }

    /// Sets the availability of a licensed extension.
    #[must_use]
    pub fn with_capability(mut self, name: &str, available: bool) -> Self {
        self.capabilities.insert(name.to_string(), available);
        self
    }

    /// Creates an empty workspace unless it already exists.
    pub fn ensure_workspace(&mut self, workspace: &Workspace) {
        self.workspaces.entry(workspace.path.clone()).or_default();
    }

    /// Loads an engine from a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_read_context("snapshot", path)?;
        let engine: Self = serde_json::from_str(&text).with_read_context("snapshot", path)?;
        debug!(
            "Loaded snapshot {} with {} workspace(s)",
            path.display(),
            engine.workspaces.len()
        );
        Ok(engine)
    }

    /// Writes the engine state to a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).with_write_context("snapshot", path)?;
        std::fs::write(path, text).with_write_context("snapshot", path)
    }

    /// Returns a workspace's contents.
    #[must_use]
    pub fn store(&self, workspace: &Workspace) -> Option<&Store> {
        self.workspaces.get(&workspace.path)
    }

    /// Returns a collection by name.
    #[must_use]
    pub fn collection(&self, workspace: &Workspace, name: &str) -> Option<&FeatureCollection> {
        self.store(workspace).and_then(|s| s.find(name))
    }

    /// Summarises every collection of a workspace, datasets included.
    #[must_use]
    pub fn describe(&self, workspace: &Workspace) -> Vec<CollectionInfo> {
        self.store(workspace)
            .map(|store| {
                store
                    .collections
                    .iter()
                    .chain(store.datasets.iter().flat_map(|d| d.collections.iter()))
                    .map(|c| CollectionInfo {
                        name: c.name.clone(),
                        row_count: c.records.len() as u64,
                        fields: c.fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The workspace most recently activated.
    #[must_use]
    pub fn active_workspace(&self) -> Option<&Workspace> {
        self.active.as_ref()
    }

    /// Every workspace activation, in call order.
    #[must_use]
    pub fn workspace_switches(&self) -> &[String] {
        &self.workspace_switches
    }

    /// Progress messages received through [`SpatialEngine::notify`].
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Number of capability checks performed.
    #[must_use]
    pub fn capability_checks(&self) -> usize {
        self.capability_checks.get()
    }

    /// Extensions checked out so far.
    #[must_use]
    pub fn activated_capabilities(&self) -> &[String] {
        &self.activated
    }

    fn store_ref(&self, workspace: &Workspace) -> EngineResult<&Store> {
        self.workspaces
            .get(&workspace.path)
            .ok_or_else(|| EngineError::not_found("Workspace", &workspace.path))
    }

    fn store_mut(&mut self, workspace: &Workspace) -> EngineResult<&mut Store> {
        self.workspaces
            .get_mut(&workspace.path)
            .ok_or_else(|| EngineError::not_found("Workspace", &workspace.path))
    }

    fn existing(&self, workspace: &Workspace, name: &str) -> EngineResult<&FeatureCollection> {
        self.store_ref(workspace)?
            .find(name)
            .ok_or_else(|| EngineError::not_found("Feature class", name))
    }

    /// Resolves a boundary reference: a bare name is looked up in `workspace`
    /// first, a `<workspace>/<name>` path in that workspace.
    fn boundary(
        &self,
        workspace: &Workspace,
        mask: &BoundaryPolygon,
    ) -> EngineResult<&FeatureCollection> {
        let found = match mask.reference.rsplit_once('/') {
            Some((path, name)) => self.workspaces.get(path).and_then(|s| s.find(name)),
            None => self
                .workspaces
                .get(&workspace.path)
                .and_then(|s| s.find(&mask.reference))
                .or_else(|| self.workspaces.values().find_map(|s| s.find(&mask.reference))),
        };
        found.ok_or_else(|| EngineError::not_found("Feature class", &mask.reference))
    }

    fn export_source(&self, workspace: &Workspace, collection: &str) -> EngineResult<()> {
        let source = self.existing(workspace, collection)?;
        if source.locked {
            return Err(EngineError::Locked {
                target: collection.to_string(),
            });
        }
        Ok(())
    }
}

impl SpatialEngine for MemoryEngine {
    fn set_active_workspace(&mut self, workspace: &Workspace) -> EngineResult<()> {
        self.store_ref(workspace)?;
        self.workspace_switches.push(workspace.path.clone());
        self.active = Some(workspace.clone());
        Ok(())
    }

    fn list_datasets(&self, workspace: &Workspace, pattern: &str) -> EngineResult<Vec<String>> {
        Ok(self
            .store_ref(workspace)?
            .datasets
            .iter()
            .filter(|d| matches_pattern(&d.name, pattern))
            .map(|d| d.name.clone())
            .collect())
    }

    fn list_feature_collections(
        &self,
        workspace: &Workspace,
        dataset: Option<&str>,
        geometry: GeometryFilter,
        pattern: &str,
    ) -> EngineResult<Vec<String>> {
        let store = self.store_ref(workspace)?;
        let collections = match dataset {
            Some(name) => match store.datasets.iter().find(|d| d.name == name) {
                Some(dataset) => &dataset.collections,
                None => return Ok(Vec::new()),
            },
            None => &store.collections,
        };
        Ok(collections
            .iter()
            .filter(|c| c.geometry != GeometryType::Table && geometry.accepts(c.geometry))
            .filter(|c| matches_pattern(&c.name, pattern))
            .map(|c| c.name.clone())
            .collect())
    }

    fn list_fields(
        &self,
        workspace: &Workspace,
        collection: &str,
    ) -> EngineResult<Vec<FieldDescriptor>> {
        Ok(self
            .existing(workspace, collection)?
            .fields
            .iter()
            .map(|name| FieldDescriptor { name: name.clone() })
            .collect())
    }

    fn row_count(&self, workspace: &Workspace, collection: &str) -> EngineResult<u64> {
        Ok(self.existing(workspace, collection)?.records.len() as u64)
    }

    fn clip(
        &mut self,
        workspace: &Workspace,
        source: &str,
        mask: &BoundaryPolygon,
        destination: &str,
        tolerance: Option<f64>,
    ) -> EngineResult<String> {
        let input = self.existing(workspace, source)?;
        if input.geometry == GeometryType::Table {
            return Err(EngineError::Geometry {
                target: source.to_string(),
                message: "tables cannot be clipped".to_string(),
            });
        }

        let boundary = self.boundary(workspace, mask)?;
        if boundary.geometry != GeometryType::Polygon {
            return Err(EngineError::Geometry {
                target: mask.reference.clone(),
                message: format!(
                    "clip features must be polygons, found {}",
                    boundary.geometry.as_str()
                ),
            });
        }

        let distance = tolerance.unwrap_or(0.0);
        let masks: Vec<Envelope> = boundary
            .records
            .iter()
            .filter_map(|r| r.envelope.map(|e| e.expand(distance)))
            .collect();

        let records: Vec<Record> = input
            .records
            .iter()
            .filter_map(|record| {
                let envelope = record.envelope?;
                let clipped = masks.iter().find_map(|m| envelope.intersection(m))?;
                Some(Record {
                    envelope: Some(clipped),
                    attributes: record.attributes.clone(),
                })
            })
            .collect();

        let (out_path, out_name) = destination.rsplit_once('/').ok_or_else(|| {
            EngineError::operation("Clip", destination, "destination must be <workspace>/<name>")
        })?;
        let output = FeatureCollection {
            name: out_name.to_string(),
            geometry: input.geometry,
            fields: input.fields.clone(),
            records,
            locked: false,
        };
        debug!(
            "Clipped {source}: {} of {} record(s) kept",
            output.records.len(),
            input.records.len()
        );

        let store = self
            .workspaces
            .get_mut(out_path)
            .ok_or_else(|| EngineError::not_found("Workspace", out_path))?;
        if store.find(out_name).is_some_and(|c| c.locked) {
            return Err(EngineError::Locked {
                target: destination.to_string(),
            });
        }
        store.remove(out_name);
        store.collections.push(output);
        Ok(destination.to_string())
    }

    fn delete_feature_collection(&mut self, workspace: &Workspace, name: &str) -> EngineResult<()> {
        let store = self.store_mut(workspace)?;
        let Some(existing) = store.find(name) else {
            return Ok(());
        };
        if existing.locked {
            return Err(EngineError::Locked {
                target: name.to_string(),
            });
        }
        store.remove(name);
        Ok(())
    }

    fn delete_field(
        &mut self,
        workspace: &Workspace,
        collection: &str,
        field: &str,
    ) -> EngineResult<()> {
        let protected = self.protected_fields.iter().any(|p| p == field);
        let Some(target) = self.store_mut(workspace)?.find_mut(collection) else {
            return Ok(());
        };
        if !target.fields.iter().any(|f| f == field) {
            return Ok(());
        }
        if protected {
            return Err(EngineError::ProtectedField {
                collection: collection.to_string(),
                field: field.to_string(),
            });
        }
        if target.locked {
            return Err(EngineError::Locked {
                target: collection.to_string(),
            });
        }

        target.fields.retain(|f| f != field);
        for record in &mut target.records {
            record.attributes.remove(field);
        }
        Ok(())
    }

    fn check_capability(&self, name: &str) -> EngineResult<CapabilityStatus> {
        self.capability_checks.set(self.capability_checks.get() + 1);
        let available = self.capabilities.get(name).copied().unwrap_or(false);
        Ok(if available {
            CapabilityStatus::Available
        } else {
            CapabilityStatus::Unavailable
        })
    }

    fn activate_capability(&mut self, name: &str) -> EngineResult<()> {
        if !self.capabilities.get(name).copied().unwrap_or(false) {
            return Err(EngineError::operation(
                "CheckOutExtension",
                name,
                "extension is not available",
            ));
        }
        self.activated.push(name.to_string());
        Ok(())
    }

    fn export_cad(
        &mut self,
        workspace: &Workspace,
        collection: &str,
        format: &ExportFormat,
        destination: &Path,
    ) -> EngineResult<()> {
        self.export_source(workspace, collection)?;
        self.exports.push(ExportLogEntry {
            kind: ExportKind::Cad,
            workspace: workspace.path.clone(),
            collection: collection.to_string(),
            destination: destination.to_string_lossy().into_owned(),
            options: vec![
                format.short_name.to_string(),
                CAD_TABLE_NAMING.to_string(),
                CAD_OVERWRITE.to_string(),
            ],
        });
        Ok(())
    }

    fn export_interchange(
        &mut self,
        workspace: &Workspace,
        collection: &str,
        descriptor: &str,
    ) -> EngineResult<()> {
        self.export_source(workspace, collection)?;
        self.exports.push(ExportLogEntry {
            kind: ExportKind::Interchange,
            workspace: workspace.path.clone(),
            collection: collection.to_string(),
            destination: descriptor.to_string(),
            options: Vec::new(),
        });
        Ok(())
    }

    fn notify(&mut self, message: &str) {
        info!("{message}");
        self.messages.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Workspace {
        Workspace::new("source.gdb")
    }

    fn output() -> Workspace {
        Workspace::new("out.gdb")
    }

    fn engine() -> MemoryEngine {
        MemoryEngine::new()
            .with_workspace(
                &source(),
                Store::default()
                    .with_collection(
                        FeatureCollection::new("StudyArea", GeometryType::Polygon, &[])
                            .with_record(Record::new(Envelope::new(0.0, 0.0, 10.0, 10.0))),
                    )
                    .with_dataset(
                        Dataset::new("Roads").with_collection(
                            FeatureCollection::new("Road", GeometryType::Line, &["NAME"])
                                .with_record(Record::new(Envelope::new(5.0, 5.0, 15.0, 6.0)))
                                .with_record(Record::at(20.0, 20.0)),
                        ),
                    ),
            )
            .with_workspace(&output(), Store::default())
    }

    #[test]
    fn test_envelope_intersection() {
        let a = Envelope::new(0.0, 0.0, 10.0, 10.0);
        let b = Envelope::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.intersection(&b), Some(Envelope::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(a.intersection(&Envelope::new(11.0, 0.0, 12.0, 1.0)), None);
        // Touching edges overlap
        assert!(a.intersection(&Envelope::new(10.0, 0.0, 12.0, 1.0)).is_some());
    }

    #[test]
    fn test_clip_trims_and_drops_records() {
        let mut engine = engine();
        let name = engine
            .clip(
                &source(),
                "Road",
                &BoundaryPolygon::new("StudyArea"),
                "out.gdb/Road_clp",
                None,
            )
            .unwrap();
        assert_eq!(name, "out.gdb/Road_clp");

        let clipped = engine.collection(&output(), "Road_clp").unwrap();
        assert_eq!(clipped.records.len(), 1);
        assert_eq!(
            clipped.records[0].envelope,
            Some(Envelope::new(5.0, 5.0, 10.0, 6.0))
        );
        assert_eq!(clipped.fields, vec!["NAME".to_string()]);
        // Input is untouched
        assert_eq!(engine.row_count(&source(), "Road").unwrap(), 2);
    }

    #[test]
    fn test_clip_tolerance_grows_mask() {
        let mut engine = engine();
        engine
            .clip(
                &source(),
                "Road",
                &BoundaryPolygon::new("source.gdb/StudyArea"),
                "out.gdb/Road_clp",
                Some(10.0),
            )
            .unwrap();
        assert_eq!(engine.row_count(&output(), "Road_clp").unwrap(), 2);
    }

    #[test]
    fn test_clip_requires_polygon_mask() {
        let mut engine = engine();
        let err = engine
            .clip(
                &source(),
                "Road",
                &BoundaryPolygon::new("Road"),
                "out.gdb/Road_clp",
                None,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Geometry { .. }));
    }

    #[test]
    fn test_clip_missing_output_workspace() {
        let mut engine = engine();
        let err = engine
            .clip(
                &source(),
                "Road",
                &BoundaryPolygon::new("StudyArea"),
                "missing.gdb/Road_clp",
                None,
            )
            .unwrap_err();
        assert_eq!(err, EngineError::not_found("Workspace", "missing.gdb"));
    }

    #[test]
    fn test_delete_missing_targets_is_noop() {
        let mut engine = engine();
        engine.delete_feature_collection(&source(), "Nope").unwrap();
        engine.delete_field(&source(), "Road", "NOPE").unwrap();
        engine.delete_field(&source(), "Nope", "NAME").unwrap();
        assert_eq!(engine.list_fields(&source(), "Road").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_protected_field_fails() {
        let mut engine = MemoryEngine::new().with_workspace(
            &output(),
            Store::default().with_collection(FeatureCollection::new(
                "Pipe_clp",
                GeometryType::Line,
                &["OBJECTID", "CREATEDBY"],
            )),
        );
        let err = engine
            .delete_field(&output(), "Pipe_clp", "OBJECTID")
            .unwrap_err();
        assert!(matches!(err, EngineError::ProtectedField { .. }));
        engine.delete_field(&output(), "Pipe_clp", "CREATEDBY").unwrap();
    }

    #[test]
    fn test_listing_respects_dataset_and_pattern() {
        let engine = engine();
        assert_eq!(
            engine
                .list_feature_collections(&source(), None, GeometryFilter::All, "*")
                .unwrap(),
            vec!["StudyArea".to_string()]
        );
        assert_eq!(
            engine
                .list_feature_collections(&source(), Some("Roads"), GeometryFilter::All, "R*")
                .unwrap(),
            vec!["Road".to_string()]
        );
        assert!(
            engine
                .list_feature_collections(&source(), Some("Nope"), GeometryFilter::All, "*")
                .unwrap()
                .is_empty()
        );
        assert!(
            engine
                .list_feature_collections(
                    &source(),
                    Some("Roads"),
                    GeometryFilter::Only(GeometryType::Polygon),
                    "*"
                )
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_set_active_workspace_records_switch() {
        let mut engine = engine();
        engine.set_active_workspace(&output()).unwrap();
        assert_eq!(engine.active_workspace(), Some(&output()));
        assert_eq!(engine.workspace_switches(), ["out.gdb".to_string()]);
        assert!(
            engine
                .set_active_workspace(&Workspace::new("missing.gdb"))
                .is_err()
        );
    }

    #[test]
    fn test_snapshot_round_trip_keeps_exports() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut engine = engine().with_capability("DataInteroperability", true);
        engine
            .export_interchange(&source(), "StudyArea", "MITAB,C:/out")
            .unwrap();
        engine.save(&path).unwrap();

        let loaded = MemoryEngine::load(&path).unwrap();
        assert_eq!(loaded.workspaces, engine.workspaces);
        assert_eq!(loaded.exports.len(), 1);
        assert_eq!(loaded.protected_fields, engine.protected_fields);
        assert!(loaded.capabilities["DataInteroperability"]);
    }

    #[test]
    fn test_snapshot_defaults() {
        let engine: MemoryEngine = serde_json::from_str(r#"{"workspaces": {}}"#).unwrap();
        assert_eq!(engine.protected_fields, vec!["OBJECTID", "Shape"]);
        assert!(engine.capabilities.is_empty());
    }
}
