//! Elevation-class area fractions and the fraction-weighted 2-D collapse.

use ndarray::{Array3, Zip};
use tracing::{debug, info};

use crate::error::RegridError;
use crate::field::{Gridded2d, Gridded3d, LevelAxis};
use crate::{FRACTION_CEILING, GLC_NEC};

/// Per-class area fraction on the grid, shape `(GLC_NEC + 1, nlat, nlon)`.
///
/// Class 0 is the tundra share of the grid cell; classes `1..=GLC_NEC` are
/// the glaciated elevation bins. Entries that are not finite or exceed
/// [`FRACTION_CEILING`] are invalid.
#[derive(Debug, Clone, PartialEq)]
pub struct FractionField {
    values: Array3<Option<f64>>,
}

impl FractionField {
    /// Build from raw per-class fractions.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] if the class axis is not
    /// `GLC_NEC + 1` long.
    pub fn from_classes(raw: Array3<f64>) -> Result<Self, RegridError> {
        let (nclass, nlat, nlon) = raw.dim();
        if nclass != GLC_NEC + 1 {
            return Err(RegridError::ShapeMismatch {
                name: "fraction classes".to_string(),
                expected: vec![GLC_NEC + 1, nlat, nlon],
                got: vec![nclass, nlat, nlon],
            });
        }
        let values = raw.mapv(|v| (v.is_finite() && v <= FRACTION_CEILING).then_some(v));
        Ok(Self { values })
    }

    /// Fraction of `class` (0 = tundra) at a grid point.
    pub fn get(&self, class: usize, iy: usize, ix: usize) -> Option<f64> {
        self.values[[class, iy, ix]]
    }

    /// `(nlat, nlon)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        let (_, ny, nx) = self.values.dim();
        (ny, nx)
    }

    /// Sum of valid non-tundra fractions at a grid point.
    pub fn ice_fraction(&self, iy: usize, ix: usize) -> f64 {
        (1..=GLC_NEC).filter_map(|c| self.get(c, iy, ix)).sum()
    }
}

/// Configuration for [`collapse_classes`].
#[derive(Debug, Clone, Default)]
pub struct CollapseConfig {
    min_valid: Option<f64>,
}

impl CollapseConfig {
    /// Default configuration: no post-collapse masking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask collapsed values below `threshold`.
    pub fn with_min_valid(mut self, threshold: Option<f64>) -> Self {
        self.min_valid = threshold;
        self
    }

    /// Post-collapse masking threshold.
    pub fn min_valid(&self) -> Option<f64> {
        self.min_valid
    }
}

/// Collapse the class axis into a fraction-weighted mean.
///
/// Per grid point and time step:
///
/// ```text
/// value = Σ_c frac[c] · v[c-1]  /  Σ_c frac[c]      c = 1..=GLC_NEC
/// ```
///
/// Missing values contribute zero to the numerator; invalid fractions count
/// as zero in both sums. Dividing by the total ice fraction means a cell
/// fully covered by ice is not scaled down by a missing tundra share. The
/// cell is masked when the total is zero or no class contributed a valid
/// value.
///
/// # Errors
///
/// Returns [`RegridError::ShapeMismatch`] if the field is not on elevation
/// classes or the grids differ.
pub fn collapse_classes(
    field: &Gridded3d,
    fraction: &FractionField,
    config: &CollapseConfig,
) -> Result<Gridded2d, RegridError> {
    let (ntime, nlat, nlon, nlev) = field.dim();
    if *field.levels() != LevelAxis::ElevationClasses {
        return Err(RegridError::ShapeMismatch {
            name: "class-weighted collapse input".to_string(),
            expected: vec![ntime, nlat, nlon, GLC_NEC],
            got: vec![ntime, nlat, nlon, nlev],
        });
    }
    if fraction.grid_shape() != (nlat, nlon) {
        let (fy, fx) = fraction.grid_shape();
        return Err(RegridError::ShapeMismatch {
            name: "fraction grid".to_string(),
            expected: vec![nlat, nlon],
            got: vec![fy, fx],
        });
    }

    let mut out = Gridded2d::masked(ntime, nlat, nlon);
    let mut zero_fraction_points = 0usize;

    for iy in 0..nlat {
        for ix in 0..nlon {
            let total = fraction.ice_fraction(iy, ix);
            if total == 0.0 {
                zero_fraction_points += 1;
                continue;
            }
            for t in 0..ntime {
                let mut acc = 0.0;
                let mut contributed = false;
                for class in 1..=GLC_NEC {
                    let (Some(frac), Some(v)) =
                        (fraction.get(class, iy, ix), field.get(t, iy, ix, class - 1))
                    else {
                        continue;
                    };
                    acc += frac * v;
                    contributed = true;
                }
                if contributed {
                    out.values_mut()[[t, iy, ix]] = Some(acc / total);
                }
            }
        }
    }

    if let Some(threshold) = config.min_valid() {
        Zip::from(out.values_mut()).for_each(|cell| {
            if cell.is_some_and(|v| v < threshold) {
                *cell = None;
            }
        });
    }

    debug!(zero_fraction_points, "points without ice cover");
    info!(valid = out.count_valid(), ntime, "collapsed elevation classes");
    Ok(out)
}
