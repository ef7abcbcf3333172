//! Clip stage: clips input feature collections by the boundary polygon.

use log::debug;

use crate::engine::SpatialEngine;
use crate::error::EngineResult;
use crate::types::{BoundaryPolygon, CLIP_SUFFIX, Workspace};

/// Returns the output path of a clipped feature: `<output>/<feature>_clp`.
///
/// # Examples
///
/// ```
/// use geoclip_core::clip::clip_output_name;
/// use geoclip_core::types::Workspace;
///
/// let out = Workspace::new("out.gdb");
/// assert_eq!(clip_output_name(&out, "Road"), "out.gdb/Road_clp");
/// ```
#[must_use]
pub fn clip_output_name(output: &Workspace, feature: &str) -> String {
    output.join(&format!("{feature}{CLIP_SUFFIX}"))
}

/// Clips one feature collection of `input` into `output`.
///
/// The input workspace is re-activated before every clip and a progress
/// notification naming the feature is sent before the engine is called.
///
/// # Errors
///
/// Any engine failure is returned unchanged.
pub fn clip_feature<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    input: &Workspace,
    output: &Workspace,
    feature: &str,
    boundary: &BoundaryPolygon,
    tolerance: Option<f64>,
) -> EngineResult<String> {
    engine.set_active_workspace(input)?;
    engine.notify(&format!("Clipping feature {feature}"));
    let destination = clip_output_name(output, feature);
    debug!(
        "Clip {feature} by {} into {destination} (tolerance: {tolerance:?})",
        boundary.reference
    );
    engine.clip(input, feature, boundary, &destination, tolerance)
}

/// Clips every feature in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first engine failure.
pub fn clip_features<E: SpatialEngine + ?Sized>(
    engine: &mut E,
    input: &Workspace,
    output: &Workspace,
    features: &[String],
    boundary: &BoundaryPolygon,
    tolerance: Option<f64>,
) -> EngineResult<Vec<String>> {
    let mut clipped = Vec::with_capacity(features.len());
    for feature in features {
        clipped.push(clip_feature(engine, input, output, feature, boundary, tolerance)?);
    }
    Ok(clipped)
}
