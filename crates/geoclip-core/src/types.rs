//! Data types shared by the pipeline stages and the engine interface.
//!
//! This module defines the workspace handle threaded through every engine call,
//! the geometry-type filter used when listing collections, and the small
//! descriptor structs returned by engine queries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix appended to every clipped feature collection name.
pub const CLIP_SUFFIX: &str = "_clp";

/// An addressable spatial data store (geodatabase, directory, ...).
///
/// The pipeline never relies on an ambient "current workspace": every engine
/// call receives the workspace it operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Workspace {
    /// Path or connection string identifying the store.
    pub path: String,
}

impl Workspace {
    /// Creates a workspace handle for the given path.
    ///
    /// Trailing `/` and `\` separators are dropped, so `out.gdb/` and
    /// `out.gdb` name the same store.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let mut path = path.into();
        let trimmed = path.trim_end_matches(['/', '\\']).len();
        if trimmed > 0 {
            path.truncate(trimmed);
        }
        Self { path }
    }

    /// Joins a collection name onto this workspace path (`<path>/<name>`).
    #[must_use]
    pub fn join(&self, name: &str) -> String {
        format!("{}/{name}", self.path)
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Geometry type of a feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    /// Point or multipoint features
    Point,
    /// Polyline features
    Line,
    /// Polygon features
    Polygon,
    /// Non-spatial table
    Table,
}

impl GeometryType {
    /// Returns the string representation of this geometry type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::Line => "Line",
            GeometryType::Polygon => "Polygon",
            GeometryType::Table => "Table",
        }
    }
}

/// Geometry filter applied when listing feature collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryFilter {
    /// Every geometry type
    #[default]
    All,
    /// Only collections of the given type
    Only(GeometryType),
}

impl GeometryFilter {
    /// Returns `true` if a collection of `geometry` passes the filter.
    #[must_use]
    pub fn accepts(&self, geometry: GeometryType) -> bool {
        match self {
            GeometryFilter::All => true,
            GeometryFilter::Only(expected) => *expected == geometry,
        }
    }
}

/// Reference to the polygon feature collection used as the clip mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryPolygon {
    /// Name or path of the polygon collection.
    pub reference: String,
}

impl BoundaryPolygon {
    /// Creates a boundary reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Field descriptor returned by [`crate::engine::SpatialEngine::list_fields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
}

/// Information about a feature collection, used for display.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Number of rows
    pub row_count: u64,
    /// Field names in schema order
    pub fields: Vec<String>,
}

/// Status reported by a capability (licensed extension) check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    /// The capability can be activated.
    Available,
    /// The capability is missing or not licensed.
    Unavailable,
}

impl CapabilityStatus {
    /// Returns `true` if the capability can be activated.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, CapabilityStatus::Available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_join() {
        let ws = Workspace::new("C:/data/out.gdb");
        assert_eq!(ws.join("Road_clp"), "C:/data/out.gdb/Road_clp");
    }

    #[test]
    fn test_workspace_join_trailing_separator() {
        let ws = Workspace::new("out.gdb/");
        assert_eq!(ws.path, "out.gdb");
        assert_eq!(ws, Workspace::new("out.gdb"));
        assert_eq!(ws.join("Pipe"), "out.gdb/Pipe");
        assert_eq!(Workspace::new("C:\\gis\\out.gdb\\\\").path, "C:\\gis\\out.gdb");
        assert_eq!(Workspace::new("/").path, "/");
    }

    #[test]
    fn test_geometry_filter() {
        assert!(GeometryFilter::All.accepts(GeometryType::Table));
        assert!(GeometryFilter::Only(GeometryType::Polygon).accepts(GeometryType::Polygon));
        assert!(!GeometryFilter::Only(GeometryType::Polygon).accepts(GeometryType::Line));
    }
}
