//! Cleanup stage: removes empty clip results and restricted fields.
//!
//! Both steps re-list the output workspace instead of trusting what the clip
//! stage produced, so they always see the current state of the store.

use log::debug;

use crate::engine::SpatialEngine;
use crate::error::EngineResult;
use crate::types::{GeometryFilter, Workspace};

/// A field removed from a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedField {
    /// Collection the field was removed from
    pub collection: String,
    /// Field name
    pub field: String,
}

/// What a cleanup pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Collections deleted because they had no rows
    pub removed_collections: Vec<String>,
    /// Fields deleted from surviving collections
    pub stripped_fields: Vec<StrippedField>,
}

impl CleanupReport {
    /// Returns `true` if the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed_collections.is_empty() && self.stripped_fields.is_empty()
    }
}

/// Deletes every standalone collection of `output` that has zero rows.
///
/// # Errors
///
/// Returns the first engine failure (e.g. a locked collection).
pub fn remove_empty_collections<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    output: &Workspace,
) -> EngineResult<Vec<String>> {
    engine.set_active_workspace(output)?;
    let collections = engine.list_feature_collections(output, None, GeometryFilter::All, "*")?;

    let mut removed = Vec::new();
    for collection in collections {
        let rows = engine.row_count(output, &collection)?;
        if rows == 0 {
            debug!("Deleting empty collection {}", output.join(&collection));
            engine.delete_feature_collection(output, &collection)?;
            removed.push(collection);
        }
    }
    Ok(removed)
}

/// Deletes the configured fields from each of `collections`.
///
/// Fields missing from a collection are skipped.
///
/// # Errors
///
/// Returns the first engine failure (e.g. a protected field).
pub fn strip_fields<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    workspace: &Workspace,
    collections: &[String],
    fields_to_delete: &[String],
) -> EngineResult<Vec<StrippedField>> {
    let mut stripped = Vec::new();
    if fields_to_delete.is_empty() {
        return Ok(stripped);
    }

    for collection in collections {
        let field_names: Vec<String> = engine
            .list_fields(workspace, collection)?
            .into_iter()
            .map(|f| f.name)
            .collect();

        for field in fields_to_delete {
            if field_names.contains(field) {
                debug!("Deleting field {field} from {collection}");
                engine.delete_field(workspace, collection, field)?;
                stripped.push(StrippedField {
                    collection: collection.clone(),
                    field: field.clone(),
                });
            }
        }
    }
    Ok(stripped)
}

/// Deletes the configured fields from every standalone collection of `output`.
///
/// # Errors
///
/// Returns the first engine failure.
pub fn remove_fields<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    output: &Workspace,
    fields_to_delete: &[String],
) -> EngineResult<Vec<StrippedField>> {
    engine.set_active_workspace(output)?;
    let collections = engine.list_feature_collections(output, None, GeometryFilter::All, "*")?;
    strip_fields(engine, output, &collections, fields_to_delete)
}

/// Runs both cleanup steps against the output workspace.
///
/// # Errors
///
/// Returns the first engine failure.
pub fn cleanup<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    output: &Workspace,
    fields_to_delete: &[String],
) -> EngineResult<CleanupReport> {
    engine.notify("Removing empty feature classes...");
    let removed_collections = remove_empty_collections(engine, output)?;
    engine.notify("Removing restricted fields...");
    let stripped_fields = remove_fields(engine, output, fields_to_delete)?;
    Ok(CleanupReport {
        removed_collections,
        stripped_fields,
    })
}

/// Deletes fields from every collection of a workspace, including the
/// collections inside its datasets.
///
/// This is the standalone field-deletion utility; it does not touch row
/// counts.
///
/// # Errors
///
/// Returns the first engine failure.
pub fn delete_fields_in_workspace<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    workspace: &Workspace,
    fields_to_delete: &[String],
) -> EngineResult<Vec<StrippedField>> {
    engine.set_active_workspace(workspace)?;
    let collections = list_all_collections(engine, workspace)?;
    strip_fields(engine, workspace, &collections, fields_to_delete)
}

/// Lists standalone collections followed by the collections of each dataset.
///
/// # Errors
///
/// Propagates engine failures.
pub fn list_all_collections<E: SpatialEngine + ?Sized>(
    engine: &E,
    workspace: &Workspace,
) -> EngineResult<Vec<String>> {
    let mut collections =
        engine.list_feature_collections(workspace, None, GeometryFilter::All, "*")?;
    for dataset in engine.list_datasets(workspace, "*")? {
        collections.extend(engine.list_feature_collections(
            workspace,
            Some(&dataset),
            GeometryFilter::All,
            "*",
        )?);
    }
    Ok(collections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_is_empty() {
        let mut report = CleanupReport::default();
        assert!(report.is_empty());
        report.removed_collections.push("Hydrant_clp".to_string());
        assert!(!report.is_empty());
    }
}
