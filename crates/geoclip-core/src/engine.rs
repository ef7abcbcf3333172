//! The spatial engine capability interface.
//!
//! The pipeline never performs geometry work itself. Clipping, counting,
//! listing, deletion and format conversion are delegated to an implementation
//! of [`SpatialEngine`]. All calls are blocking and every failure is reported
//! as an [`EngineError`], which the pipeline propagates unchanged.

use std::path::Path;

use log::info;

use crate::error::EngineResult;
use crate::formats::ExportFormat;
use crate::types::{BoundaryPolygon, CapabilityStatus, FieldDescriptor, GeometryFilter, Workspace};

/// Layer table naming keyword sent with every CAD export.
pub const CAD_TABLE_NAMING: &str = "Use_Filenames_in_Tables";

/// Existing-file policy keyword sent with every CAD export.
pub const CAD_OVERWRITE: &str = "Overwrite_Existing_Files";

/// Capabilities the pipeline needs from the underlying spatial engine.
///
/// Methods that only read take `&self`; methods that change a store take
/// `&mut self`. Every method receives the workspace it operates on. Engines
/// that keep an ambient "current workspace" are also told about each switch
/// through [`SpatialEngine::set_active_workspace`], which the pipeline calls
/// at every phase boundary.
pub trait SpatialEngine {
    /// Makes `workspace` the engine's current store.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be opened.
    fn set_active_workspace(&mut self, workspace: &Workspace) -> EngineResult<()>;

    /// Lists dataset names matching `pattern` (`*` matches everything), in
    /// store order.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be read.
    fn list_datasets(&self, workspace: &Workspace, pattern: &str) -> EngineResult<Vec<String>>;

    /// Lists feature collection names, in store order.
    ///
    /// With `dataset` set, lists the collections inside that dataset;
    /// otherwise lists the standalone collections at the workspace root.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be read.
    fn list_feature_collections(
        &self,
        workspace: &Workspace,
        dataset: Option<&str>,
        geometry: GeometryFilter,
        pattern: &str,
    ) -> EngineResult<Vec<String>>;

    /// Lists the fields of a collection, in schema order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist.
    fn list_fields(&self, workspace: &Workspace, collection: &str)
    -> EngineResult<Vec<FieldDescriptor>>;

    /// Counts the rows of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist.
    fn row_count(&self, workspace: &Workspace, collection: &str) -> EngineResult<u64>;

    /// Clips `source` (in `workspace`) by `mask` and writes the result to
    /// `destination`, returning the destination name.
    ///
    /// `tolerance` of `None` selects the engine's default XY tolerance.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid geometry, a non-polygon mask or a locked
    /// destination.
    fn clip(
        &mut self,
        workspace: &Workspace,
        source: &str,
        mask: &BoundaryPolygon,
        destination: &str,
        tolerance: Option<f64>,
    ) -> EngineResult<String>;

    /// Deletes a collection. Deleting an absent collection is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is locked.
    fn delete_feature_collection(&mut self, workspace: &Workspace, name: &str) -> EngineResult<()>;

    /// Deletes a field from a collection. Deleting an absent field is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is protected or the collection is locked.
    fn delete_field(
        &mut self,
        workspace: &Workspace,
        collection: &str,
        field: &str,
    ) -> EngineResult<()>;

    /// Reports whether a licensed extension is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the license manager cannot be queried.
    fn check_capability(&self, name: &str) -> EngineResult<CapabilityStatus>;

    /// Checks out a licensed extension for the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension cannot be checked out.
    fn activate_capability(&mut self, name: &str) -> EngineResult<()>;

    /// Exports one collection to a CAD drawing at `destination`, naming
    /// tables after the file ([`CAD_TABLE_NAMING`]) and replacing any
    /// existing drawing ([`CAD_OVERWRITE`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn export_cad(
        &mut self,
        workspace: &Workspace,
        collection: &str,
        format: &ExportFormat,
        destination: &Path,
    ) -> EngineResult<()>;

    /// Exports one collection through the interchange translator using a
    /// `"<format>,<folder>"` descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails.
    fn export_interchange(
        &mut self,
        workspace: &Workspace,
        collection: &str,
        descriptor: &str,
    ) -> EngineResult<()>;

    /// Progress sink. Fire-and-forget; the default forwards to the `log`
    /// facade.
    fn notify(&mut self, message: &str) {
        info!("{message}");
    }
}

/// Returns `true` if `name` matches a listing `pattern`.
///
/// Supports the `*` wildcard anywhere in the pattern; matching is
/// case-insensitive like geodatabase listings.
///
/// # Examples
///
/// ```
/// use geoclip_core::engine::matches_pattern;
///
/// assert!(matches_pattern("Pipe_clp", "*"));
/// assert!(matches_pattern("Pipe_clp", "*_CLP"));
/// assert!(!matches_pattern("Pipe", "H*"));
/// ```
#[must_use]
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return name == pattern;
    }

    let mut rest = name.as_str();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}
