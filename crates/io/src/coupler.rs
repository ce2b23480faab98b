//! Per-class fields from CESM coupler history files.

use std::path::Path;

use mecgrid_regrid::{GLC_NEC, GridDescriptor};
use ndarray::{Array3, Axis};
use tracing::debug;

use crate::error::IoError;
use crate::netcdf_read;
use crate::validate::ValidationCollector;

/// Names of the per-class coupler fields.
///
/// Field `class` of a family is `{prefix}{class:02}`, for classes
/// `0..=GLC_NEC` with class 0 the tundra.
#[derive(Debug, Clone)]
pub struct CouplerConfig {
    fraction_prefix: String,
    topography_prefix: String,
}

impl Default for CouplerConfig {
    fn default() -> Self {
        Self {
            fraction_prefix: "x2lavg_Sg_ice_covered".into(),
            topography_prefix: "x2l_Sg_topo".into(),
        }
    }
}

impl CouplerConfig {
    /// Set the prefix of the area-fraction fields.
    pub fn with_fraction_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fraction_prefix = prefix.into();
        self
    }

    /// Set the prefix of the class-height fields.
    pub fn with_topography_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topography_prefix = prefix.into();
        self
    }

    /// Name of the area-fraction field of `class`.
    pub fn fraction_field(&self, class: usize) -> String {
        format!("{}{class:02}", self.fraction_prefix)
    }

    /// Name of the class-height field of `class`.
    pub fn topography_field(&self, class: usize) -> String {
        format!("{}{class:02}", self.topography_prefix)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if a prefix is empty.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut c = ValidationCollector::new();
        c.require_name("fraction_prefix", &self.fraction_prefix);
        c.require_name("topography_prefix", &self.topography_prefix);
        c.finish()
    }
}

/// Stack the `GLC_NEC + 1` fields named by `field_name` into a
/// `(class, lat, lon)` array.
pub(crate) fn read_class_stack(
    path: &Path,
    grid: &GridDescriptor,
    field_name: impl Fn(usize) -> String,
) -> Result<Array3<f64>, IoError> {
    let file = netcdf_read::open_file(path)?;
    let (nlat, nlon) = grid.shape();
    let mut raw = Array3::zeros((GLC_NEC + 1, nlat, nlon));
    for (class, mut slab) in raw.axis_iter_mut(Axis(0)).enumerate() {
        let name = field_name(class);
        slab.assign(&netcdf_read::read_grid_slice(&file, &name, grid, path)?);
    }
    debug!(path = %path.display(), classes = GLC_NEC + 1, "read coupler class fields");
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_zero_padded() {
        let config = CouplerConfig::default();
        assert_eq!(config.fraction_field(0), "x2lavg_Sg_ice_covered00");
        assert_eq!(config.topography_field(10), "x2l_Sg_topo10");

        let custom = CouplerConfig::default().with_topography_prefix("Sg_topo");
        assert_eq!(custom.topography_field(3), "Sg_topo03");
    }

    #[test]
    fn empty_prefix_rejected() {
        let err = CouplerConfig::default()
            .with_fraction_prefix("")
            .validate()
            .unwrap_err();
        assert!(matches!(err, IoError::Validation { count: 1, .. }));
    }
}
