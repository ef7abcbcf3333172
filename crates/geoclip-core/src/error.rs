//! Custom error types for `GeoClip` operations.
//!
//! Every failure of the pipeline is fatal: nothing is caught and recovered
//! locally. Lookup misses (an unknown dataset name, a field that is already
//! gone) are not errors at all and never reach these types.

use std::path::PathBuf;
use thiserror::Error;

use crate::formats::{CAD_EXTENSIONS, FormatFamily, format_names};

/// Main error type for `GeoClip` operations.
///
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum GeoClipError {
    /// Invalid parameters or configuration, detected before any work starts
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A licensed engine extension is missing
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Failures reported by the spatial engine, propagated unchanged
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// I/O errors (snapshot and config files)
    #[error(transparent)]
    Io(#[from] IoError),

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The export format, output folder and extension do not fit together
    #[error(
        "Export format '{format}' mismatched with output folder '{output_folder}' or extension '{extension}'"
    )]
    InvalidExportRequest {
        /// The requested format token
        format: String,
        /// The requested output folder
        output_folder: String,
        /// The requested file extension
        extension: String,
    },

    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },
}

/// Capability (extension licensing) errors.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The capability is not installed or not licensed
    #[error("Capability '{name}' is not available")]
    Unavailable {
        /// The capability name
        name: String,
    },
}

/// Errors reported by a [`crate::engine::SpatialEngine`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Geometry is invalid or of the wrong type for the operation
    #[error("Invalid geometry for '{target}': {message}")]
    Geometry {
        /// The collection involved
        target: String,
        /// Description of the geometry problem
        message: String,
    },

    /// The target is locked by another process
    #[error("'{target}' is locked")]
    Locked {
        /// The locked collection
        target: String,
    },

    /// A required field cannot be deleted
    #[error("Field '{field}' of '{collection}' is required and cannot be deleted")]
    ProtectedField {
        /// The collection
        collection: String,
        /// The protected field
        field: String,
    },

    /// A referenced workspace, dataset or collection does not exist
    #[error("{kind} '{name}' does not exist")]
    NotFound {
        /// What was looked up ("Workspace", "Dataset", "Feature class")
        kind: String,
        /// The missing name
        name: String,
    },

    /// Any other failure of an engine operation
    #[error("{operation} failed for '{target}': {message}")]
    Operation {
        /// The operation name (e.g. "Clip", "ExportCAD")
        operation: String,
        /// The target of the operation
        target: String,
        /// Engine message
        message: String,
    },
}

/// I/O related errors.
#[derive(Debug, Error)]
pub enum IoError {
    /// Failed to read from a file
    #[error("Failed to read {format} file '{path}': {source}")]
    Read {
        /// The format being read (e.g., "snapshot", "config")
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write to a file
    #[error("Failed to write {format} file '{path}': {source}")]
    Write {
        /// The format being written
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Type alias for Results using `GeoClipError`.
pub type Result<T> = std::result::Result<T, GeoClipError>;

/// Type alias for Results returned by engine calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl GeoClipError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Capability(e) => format!("License error: {e}"),
            Self::Engine(e) => format!("Engine error: {e}"),
            Self::Io(e) => e.to_string(),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Config(ConfigError::InvalidExportRequest { .. }) => Some(format!(
                "{} need a '{}' extension; {} need an output folder. Run 'geoclip formats' to list them.",
                format_names(FormatFamily::Cad).join(", "),
                CAD_EXTENSIONS.join("' or '"),
                format_names(FormatFamily::Interchange).join(", "),
            )),
            Self::Capability(CapabilityError::Unavailable { name }) => {
                Some(format!("Please install the {name} extension!"))
            },
            Self::Engine(e) => e.recovery_suggestion(),
            _ => None,
        }
    }

    /// Check if this error was raised before any data was modified.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl EngineError {
    /// Helper for [`EngineError::NotFound`].
    #[must_use]
    pub fn not_found(kind: &str, name: &str) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Helper for [`EngineError::Operation`].
    #[must_use]
    pub fn operation(operation: &str, target: &str, message: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.to_string(),
            target: target.to_string(),
            message: message.into(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Locked { .. } => {
                Some("Close other applications using the workspace and rerun.".to_string())
            },
            Self::Geometry { .. } => {
                Some("Repair geometries and check the boundary is a polygon layer.".to_string())
            },
            Self::ProtectedField { .. } => {
                Some("Remove the field from the fields_to_delete setting.".to_string())
            },
            _ => None,
        }
    }
}

/// Extension trait for adding file context to errors.
pub trait IoErrorExt<T> {
    /// Add read context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Read`] if the underlying operation fails.
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;

    /// Add write context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Write`] if the underlying operation fails.
    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T, E> IoErrorExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            GeoClipError::Io(IoError::Read {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }

    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            GeoClipError::Io(IoError::Write {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }
}
