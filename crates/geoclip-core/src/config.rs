//! Pipeline configuration.
//!
//! Settings that stay the same between runs (deny-list, fields to strip,
//! tolerance, licensed extension name) live in a TOML file. Every key is
//! optional and falls back to the defaults below.
//!
//! ```toml
//! excluded_collections = ["JJGIS.wSConnection"]
//! fields_to_delete = ["CREATEDBY", "CREATEDATE"]
//! xy_tolerance = 0.001
//! export_capability = "DataInteroperability"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IoErrorExt, Result};

/// Administrative collections that are never clipped.
pub const DEFAULT_EXCLUDED_COLLECTIONS: &[&str] =
    &["JJGIS.wSConnection", "JJGIS.wNMeter", "JJGIS.wConnection"];

/// Fields stripped by the standalone `delete-fields` command.
pub const DEFAULT_AUDIT_FIELDS: &[&str] = &["CREATEDBY", "CREATEDATE"];

/// Licensed extension required for exports.
pub const DEFAULT_EXPORT_CAPABILITY: &str = "DataInteroperability";

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Collections skipped by the feature filter.
    pub excluded_collections: Vec<String>,
    /// Fields removed from every output collection. Empty means no-op.
    pub fields_to_delete: Vec<String>,
    /// XY tolerance passed to the clip; `None` uses the engine default.
    pub xy_tolerance: Option<f64>,
    /// Extension checked out before exporting.
    pub export_capability: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            excluded_collections: DEFAULT_EXCLUDED_COLLECTIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            fields_to_delete: Vec::new(),
            xy_tolerance: None,
            export_capability: DEFAULT_EXPORT_CAPABILITY.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] if the text is not valid TOML,
    /// a key has the wrong type, or the tolerance is negative.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::InvalidOption {
            option: "config".to_string(),
            message: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a configuration
    /// error if its content is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_read_context("config", path)?;
        Self::from_toml_str(&text)
    }

    /// Returns a copy with a different tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] if the tolerance is negative or
    /// not finite.
    pub fn with_xy_tolerance(mut self, tolerance: Option<f64>) -> Result<Self> {
        self.xy_tolerance = tolerance;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with a different field delete set.
    #[must_use]
    pub fn with_fields_to_delete<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields_to_delete = fields.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(tolerance) = self.xy_tolerance.filter(|t| !(t.is_finite() && *t >= 0.0)) {
            return Err(ConfigError::InvalidOption {
                option: "xy_tolerance".to_string(),
                message: format!("must be a non-negative number, got {tolerance}"),
            }
            .into());
        }
        if self.export_capability.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                option: "export_capability".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
