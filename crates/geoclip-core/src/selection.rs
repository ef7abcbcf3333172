//! Dataset selection and feature filtering.
//!
//! Both steps preserve the store's native ordering: the requested list only
//! decides membership, never order.

use std::str::FromStr;

use crate::engine::SpatialEngine;
use crate::error::{ConfigError, EngineResult, GeoClipError};
use crate::types::{GeometryFilter, Workspace};

/// Sentinel accepted in place of a dataset list.
pub const ALL_DATASETS: &str = "All";

/// Which datasets of the input workspace take part in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSelection {
    /// Every dataset in the workspace.
    All,
    /// Only datasets whose name appears in the list.
    Named(Vec<String>),
}

impl FromStr for DatasetSelection {
    type Err = GeoClipError;

    /// Parses `"All"` or a comma-separated list of names.
    ///
    /// Names are trimmed and empty pieces are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoclip_core::selection::DatasetSelection;
    ///
    /// let selection: DatasetSelection = "Data1, Data2".parse().unwrap();
    /// assert_eq!(
    ///     selection,
    ///     DatasetSelection::Named(vec!["Data1".to_string(), "Data2".to_string()])
    /// );
    /// assert_eq!("All".parse::<DatasetSelection>().unwrap(), DatasetSelection::All);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_DATASETS {
            return Ok(Self::All);
        }

        let names: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect();

        if names.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "datasets".to_string(),
                message: format!("expected '{ALL_DATASETS}' or a comma-separated list, got '{s}'"),
            }
            .into());
        }
        Ok(Self::Named(names))
    }
}

/// Resolves the datasets to process from the full list in the store.
///
/// Requested names that are not in `all_dataset_names` are dropped silently.
#[must_use]
pub fn select_datasets(all_dataset_names: &[String], requested: &DatasetSelection) -> Vec<String> {
    match requested {
        DatasetSelection::All => all_dataset_names.to_vec(),
        DatasetSelection::Named(names) => all_dataset_names
            .iter()
            .filter(|dataset| names.contains(dataset))
            .cloned()
            .collect(),
    }
}

/// Removes deny-listed names from a feature list, keeping order.
#[must_use]
pub fn filter_features(features: &[String], deny_list: &[String]) -> Vec<String> {
    features
        .iter()
        .filter(|feature| !deny_list.contains(feature))
        .cloned()
        .collect()
}

/// Lists the datasets of `input` that take part in the run.
///
/// # Errors
///
/// Propagates engine failures.
pub fn list_selected_datasets<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    input: &Workspace,
    requested: &DatasetSelection,
) -> EngineResult<Vec<String>> {
    engine.set_active_workspace(input)?;
    let all = engine.list_datasets(input, "*")?;
    Ok(select_datasets(&all, requested))
}

/// Lists the feature collections of `dataset` that should be clipped.
///
/// # Errors
///
/// Propagates engine failures.
pub fn list_features<E: SpatialEngine + ?Sized>(
    engine: &E,
    input: &Workspace,
    dataset: &str,
    deny_list: &[String],
) -> EngineResult<Vec<String>> {
    let all = engine.list_feature_collections(input, Some(dataset), GeometryFilter::All, "*")?;
    Ok(filter_features(&all, deny_list))
}
