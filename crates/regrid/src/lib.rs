//! # mecgrid-regrid
//!
//! Reconstruct gridded fields from CLM "vector" output computed on Multiple
//! Elevation Classes (MEC).
//!
//! With `hist_dov2xy = .false.` CLM writes one record per column (or PFT)
//! instead of one value per grid cell. Over glaciated cells each column
//! belongs to one of [`GLC_NEC`] elevation classes, encoded in the column
//! type as `400 + class`. This crate maps those records back onto a dense
//! `(time, lat, lon, class)` array and derives 2-D or custom-level fields
//! from it.
//!
//! ## Pipeline
//!
//! ```text
//! VectorVariable ──scatter_records()──▶ Gridded3d (time, lat, lon, class)
//!                                          │
//!            ┌─────────────────────────────┼──────────────────────────────┐
//!            ▼                             ▼                              ▼
//!   collapse_classes()          interpolate_to_levels()        regional_profile()
//!   + FractionField             + TopographyField              + FractionField
//!            │                             │
//!            ▼                             ▼
//!   Gridded2d (time, lat, lon)  Gridded3d (time, lat, lon, height)
//!                                          │
//!                                          ▼
//!                               downscale_to_elevation()
//! ```
//!
//! Cells are validity-tagged (`Option<f64>`): `None` marks a cell that no
//! record reached, a source fill value, or an undefined result.
//!
//! [`VariableState`] bundles a variable with the optional fraction and
//! topography fields and checks, per operation, that the field it needs has
//! been attached.

mod downscale;
mod error;
mod field;
mod fraction;
mod grid;
mod index;
mod interpolate;
mod profile;
mod scatter;
mod series;
mod spline;
mod state;
mod topography;
mod variable;

pub use downscale::{DownscaleConfig, downscale_to_elevation};
pub use error::RegridError;
pub use field::{Gridded2d, Gridded3d, LevelAxis};
pub use fraction::{CollapseConfig, FractionField, collapse_classes};
pub use grid::GridDescriptor;
pub use index::{ElevationClassCode, GridIndex, RecordLocation};
pub use interpolate::{InterpolationReport, InterpolationResult, interpolate_to_levels};
pub use profile::{ClassProfile, RegionBounds, default_bin_centres, regional_profile};
pub use scatter::{CollisionPolicy, ScatterConfig, replicate_structured, scatter_records};
pub use series::{SeriesData, VariableKind};
pub use spline::{Extrapolation, LinearStencil};
pub use state::VariableState;
pub use topography::TopographyField;
pub use variable::{TimeAxis, VariableMeta, VectorVariable};

/// Number of non-tundra glacier elevation classes in the input.
pub const GLC_NEC: usize = 10;

/// Column type offset for glacier MEC columns (`itype_col = 400 + class`).
pub const ELEVATION_CLASS_BASE: i32 = 400;

/// Values above this are unconverted fill values and are treated as missing.
pub const MISSING_VALUE_THRESHOLD: f64 = 1.0e34;

/// Fractions above this ceiling are invalid (coupler fill values).
pub const FRACTION_CEILING: f64 = 2.0;

/// Class heights below this (m) mean the class is absent at that grid point.
pub const MIN_CLASS_HEIGHT: f64 = 1.0e-3;

/// Classes whose area fraction is below this are virtual and carry no area.
pub const VIRTUAL_FRACTION_THRESHOLD: f64 = 1.0e-3;

/// Map a raw value to a validity-tagged cell.
///
/// Non-finite values and values above [`MISSING_VALUE_THRESHOLD`] are missing.
pub(crate) fn valid_value(v: f64) -> Option<f64> {
    (v.is_finite() && v <= MISSING_VALUE_THRESHOLD).then_some(v)
}
