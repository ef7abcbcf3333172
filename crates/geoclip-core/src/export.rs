//! Export validation and dispatch.
//!
//! An [`ExportRequest`] can only be built from a self-consistent combination
//! of format, output folder and extension, so the dispatcher never has to
//! re-check string membership while exporting.

use std::path::PathBuf;

use log::info;

use crate::engine::SpatialEngine;
use crate::error::{CapabilityError, ConfigError, Result};
use crate::formats::{ExportFormat, FormatFamily, find_format};
use crate::types::{GeometryFilter, Workspace};

/// A validated export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    /// CAD drawing per collection at `<output_folder>/<name>.<extension>`.
    Cad {
        /// CAD format
        format: ExportFormat,
        /// Destination folder; may be empty
        output_folder: String,
        /// File extension (`dwg` or `dxf`)
        extension: String,
    },
    /// Interchange export through a `"<format>,<output_folder>"` descriptor.
    Interchange {
        /// Interchange format
        format: ExportFormat,
        /// Destination folder; never empty
        output_folder: String,
    },
}

impl ExportRequest {
    /// Validates the raw export parameters.
    ///
    /// A CAD format is valid with a CAD extension whatever the output folder.
    /// An interchange format is valid with a non-empty output folder whatever
    /// the extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidExportRequest`] for any other
    /// combination, including unknown formats.
    pub fn new(format: &str, output_folder: &str, extension: &str) -> Result<Self> {
        let invalid = || ConfigError::InvalidExportRequest {
            format: format.to_string(),
            output_folder: output_folder.to_string(),
            extension: extension.to_string(),
        };

        let export_format = find_format(format).ok_or_else(invalid)?;
        match export_format.family {
            FormatFamily::Cad if export_format.accepts_extension(extension) => Ok(Self::Cad {
                format: export_format,
                output_folder: output_folder.to_string(),
                extension: extension.to_string(),
            }),
            FormatFamily::Interchange if !output_folder.is_empty() => Ok(Self::Interchange {
                format: export_format,
                output_folder: output_folder.to_string(),
            }),
            _ => Err(invalid().into()),
        }
    }

    /// Returns the requested format.
    #[must_use]
    pub fn format(&self) -> &ExportFormat {
        match self {
            Self::Cad { format, .. } | Self::Interchange { format, .. } => format,
        }
    }

    /// Returns the destination of `collection` for display and notification.
    #[must_use]
    pub fn destination(&self, collection: &str) -> String {
        match self {
            Self::Cad {
                output_folder,
                extension,
                ..
            } => format!("{output_folder}/{}", cad_file_name(collection, extension)),
            Self::Interchange {
                format,
                output_folder,
            } => interchange_descriptor(format, output_folder),
        }
    }
}

/// Returns `true` if the export parameters form a valid request.
///
/// # Examples
///
/// ```
/// use geoclip_core::export::validate;
///
/// assert!(validate("DWG_R2010", "", "dwg"));
/// assert!(validate("MITAB", "C:\\out", ""));
/// assert!(!validate("MITAB", "", ""));
/// assert!(!validate("DWG_R2010", "", "shp"));
/// assert!(!validate("UNKNOWN", "x", "y"));
/// ```
#[must_use]
pub fn validate(format: &str, output_folder: &str, extension: &str) -> bool {
    ExportRequest::new(format, output_folder, extension).is_ok()
}

/// Builds a CAD file name from the base name of `collection`.
#[must_use]
pub fn cad_file_name(collection: &str, extension: &str) -> String {
    let base = collection.rsplit('/').next().unwrap_or(collection).trim();
    format!("{base}.{extension}")
}

/// Builds the interchange destination descriptor `"<format>,<folder>"`.
#[must_use]
pub fn interchange_descriptor(format: &ExportFormat, output_folder: &str) -> String {
    format!("{},{output_folder}", format.short_name)
}

/// One completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Source collection in the output workspace
    pub collection: String,
    /// Destination file or descriptor
    pub destination: String,
}

/// Checks the licensed extension and activates it.
///
/// # Errors
///
/// Returns [`CapabilityError::Unavailable`] if the extension is missing, or
/// the engine failure.
pub fn ensure_capability<E: SpatialEngine + ?Sized>(engine: &mut E, name: &str) -> Result<()> {
    if engine.check_capability(name)?.is_available() {
        engine.activate_capability(name)?;
        Ok(())
    } else {
        Err(CapabilityError::Unavailable {
            name: name.to_string(),
        }
        .into())
    }
}

/// Exports every collection of the output workspace.
///
/// The capability is checked once, before the first export. The first
/// failing export aborts the rest.
///
/// # Errors
///
/// Returns a capability error or the first engine failure.
pub fn export_features<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    output: &Workspace,
    request: &ExportRequest,
    capability: &str,
) -> Result<Vec<ExportRecord>> {
    ensure_capability(engine, capability)?;

    engine.set_active_workspace(output)?;
    let collections = engine.list_feature_collections(output, None, GeometryFilter::All, "*")?;
    info!(
        "Exporting {} collection(s) as {}",
        collections.len(),
        request.format().short_name
    );

    let mut records = Vec::with_capacity(collections.len());
    for collection in collections {
        let destination = request.destination(&collection);
        engine.notify(&format!(
            "Exporting feature: {collection} to {destination}"
        ));

        match request {
            ExportRequest::Cad { format, .. } => {
                engine.export_cad(
                    output,
                    &collection,
                    format,
                    &PathBuf::from(&destination),
                )?;
            },
            ExportRequest::Interchange { .. } => {
                engine.export_interchange(output, &collection, &destination)?;
            },
        }

        records.push(ExportRecord {
            collection,
            destination,
        });
    }
    Ok(records)
}
