//! Elevation-class heights and target elevation fields.

use std::path::Path;

use mecgrid_regrid::{GridDescriptor, ScatterConfig, TopographyField};
use ndarray::Array2;
use tracing::info;

use crate::coupler::{CouplerConfig, read_class_stack};
use crate::error::IoError;
use crate::netcdf_read;
use crate::reader::{ReaderConfig, read_vector_variable};

/// Column-level surface height in CLM vector history files.
pub const DEFAULT_TOPOGRAPHY_VAR: &str = "TOPO_COL";

/// Read the per-class surface heights from a coupler history file.
///
/// # Errors
///
/// Returns [`IoError`] if the file or a class field is missing or a field
/// does not cover the grid.
pub fn read_topography_coupler(
    path: &Path,
    grid: &GridDescriptor,
    config: &CouplerConfig,
) -> Result<TopographyField, IoError> {
    config.validate()?;
    let raw = read_class_stack(path, grid, |class| config.topography_field(class))?;
    info!(path = %path.display(), "read coupler topography");
    Ok(TopographyField::from_classes(raw)?)
}

/// Read the per-class surface heights from a column variable of a vector
/// history file, gridded at step `time`.
///
/// This is [`read_vector_variable`] followed by
/// [`TopographyField::from_variable`]; tundra heights are not available this
/// way.
///
/// # Errors
///
/// Propagates reader and gridding errors.
pub fn read_topography_history(
    path: &Path,
    variable: &str,
    reader: &ReaderConfig,
    scatter: &ScatterConfig,
    time: usize,
) -> Result<TopographyField, IoError> {
    let heights = read_vector_variable(path, variable, reader)?;
    info!(path = %path.display(), variable, time, "gridding class topography");
    Ok(TopographyField::from_variable(&heights, scatter, time)?)
}

/// Read a 2-D target elevation field (m) on `grid`.
///
/// # Errors
///
/// Returns [`IoError::DimensionMismatch`] if the variable does not cover the
/// grid.
pub fn read_elevation_2d(
    path: &Path,
    variable: &str,
    grid: &GridDescriptor,
) -> Result<Array2<f64>, IoError> {
    let file = netcdf_read::open_file(path)?;
    netcdf_read::read_grid_slice(&file, variable, grid, path)
}
