//! Elevation-class area fractions.

use std::path::Path;

use mecgrid_regrid::{FractionField, GLC_NEC, GridDescriptor};
use ndarray::{Array3, Axis, Ix2, s};
use tracing::info;

use crate::coupler::{CouplerConfig, read_class_stack};
use crate::error::IoError;
use crate::netcdf_read;

/// Surface-dataset variable with the percentage of each grid cell covered
/// by each ice-sheet elevation class, `(nglcec, lsmlat, lsmlon)`.
pub const SURFDAT_FRACTION_VAR: &str = "PCT_GLC_MEC_ICESHEET";

/// Read the per-class ice cover fractions from a coupler history file.
///
/// Values above the fraction ceiling (coupler fill) become invalid.
///
/// # Errors
///
/// Returns [`IoError`] if the file or a class field is missing or a field
/// does not cover the grid.
pub fn read_fraction_coupler(
    path: &Path,
    grid: &GridDescriptor,
    config: &CouplerConfig,
) -> Result<FractionField, IoError> {
    config.validate()?;
    let raw = read_class_stack(path, grid, |class| config.fraction_field(class))?;
    info!(path = %path.display(), "read coupler fractions");
    Ok(FractionField::from_classes(raw)?)
}

/// Read the per-class ice sheet fractions from a CLM surface dataset.
///
/// Classes `1..=GLC_NEC` come from slices `0..GLC_NEC` of
/// [`SURFDAT_FRACTION_VAR`], converted from percent. The tundra class stays
/// 0.
///
/// # Errors
///
/// Returns [`IoError::DimensionMismatch`] if the variable does not have
/// `GLC_NEC` classes over the grid.
pub fn read_fraction_surfdat(path: &Path, grid: &GridDescriptor) -> Result<FractionField, IoError> {
    let file = netcdf_read::open_file(path)?;
    let (pct, _) = netcdf_read::read_nd_f64(&file, SURFDAT_FRACTION_VAR, path)?;
    let (nlat, nlon) = grid.shape();
    let expected = [GLC_NEC, nlat, nlon];
    if pct.shape() != expected {
        return Err(IoError::DimensionMismatch {
            name: SURFDAT_FRACTION_VAR.to_string(),
            expected: expected.iter().product(),
            got: pct.len(),
        });
    }

    let mut raw = Array3::zeros((GLC_NEC + 1, nlat, nlon));
    for (i, slab) in pct.axis_iter(Axis(0)).enumerate() {
        raw.slice_mut(s![i + 1, .., ..])
            .assign(&slab.mapv(|p| p / 100.0).into_dimensionality::<Ix2>()?);
    }
    info!(path = %path.display(), "read surface dataset fractions");
    Ok(FractionField::from_classes(raw)?)
}
