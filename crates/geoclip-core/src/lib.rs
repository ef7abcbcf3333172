//! `geoclip-core` is the core library for the `GeoClip` project: a batch pipeline
//! that clips every feature collection of a spatial database against a boundary
//! polygon, removes empty results and restricted fields, and exports what is left
//! to CAD or interchange formats.
//!
//! This crate includes:
//! - **Engine Interface**: the [`engine::SpatialEngine`] trait the pipeline drives,
//!   and an in-memory implementation in [`memory`].
//! - **Pipeline Stages**: dataset selection and feature filtering, clipping,
//!   cleanup, export validation and dispatch.
//! - **Format Registry**: the export formats and the family each belongs to.
//!
//! The [`pipeline::run`] function ties the stages together.

pub mod cleanup;
pub mod clip;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod formats;
pub mod memory;
pub mod pipeline;
pub mod selection;
pub mod types;
