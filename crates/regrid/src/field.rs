//! Dense validity-tagged gridded fields.

use ndarray::{Array3, Array4, ArrayView1, Axis, s};

use crate::GLC_NEC;
use crate::error::RegridError;

/// Meaning of the level axis of a [`Gridded3d`].
#[derive(Debug, Clone, PartialEq)]
pub enum LevelAxis {
    /// The [`GLC_NEC`] glacier elevation classes, in class order.
    ElevationClasses,
    /// Fixed heights (m), identical at every grid point.
    Heights(Vec<f64>),
}

impl LevelAxis {
    /// Number of levels.
    pub fn len(&self) -> usize {
        match self {
            Self::ElevationClasses => GLC_NEC,
            Self::Heights(h) => h.len(),
        }
    }

    /// Returns `true` for an empty height list.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Heights for a custom-level axis.
    pub fn heights(&self) -> Option<&[f64]> {
        match self {
            Self::ElevationClasses => None,
            Self::Heights(h) => Some(h.as_slice()),
        }
    }
}

/// Dense `(time, lat, lon, level)` field.
///
/// `None` marks a cell without a valid value.
#[derive(Debug, Clone, PartialEq)]
pub struct Gridded3d {
    values: Array4<Option<f64>>,
    levels: LevelAxis,
}

impl Gridded3d {
    /// A fully masked field.
    pub fn masked(ntime: usize, nlat: usize, nlon: usize, levels: LevelAxis) -> Self {
        let nlev = levels.len();
        Self {
            values: Array4::from_elem((ntime, nlat, nlon, nlev), None),
            levels,
        }
    }

    /// Wrap existing cells.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] if the last axis does not match
    /// the level axis length.
    pub fn from_parts(values: Array4<Option<f64>>, levels: LevelAxis) -> Result<Self, RegridError> {
        let (nt, ny, nx, nlev) = values.dim();
        if nlev != levels.len() {
            return Err(RegridError::ShapeMismatch {
                name: "level axis".to_string(),
                expected: vec![nt, ny, nx, levels.len()],
                got: vec![nt, ny, nx, nlev],
            });
        }
        Ok(Self { values, levels })
    }

    /// All cells.
    pub fn values(&self) -> &Array4<Option<f64>> {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Array4<Option<f64>> {
        &mut self.values
    }

    /// Level axis.
    pub fn levels(&self) -> &LevelAxis {
        &self.levels
    }

    /// `(ntime, nlat, nlon, nlev)`.
    pub fn dim(&self) -> (usize, usize, usize, usize) {
        self.values.dim()
    }

    /// Number of time steps.
    pub fn ntime(&self) -> usize {
        self.values.dim().0
    }

    /// `(nlat, nlon)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        let (_, ny, nx, _) = self.values.dim();
        (ny, nx)
    }

    /// Number of levels.
    pub fn nlev(&self) -> usize {
        self.values.dim().3
    }

    /// One cell, `None` if masked.
    pub fn get(&self, t: usize, iy: usize, ix: usize, lev: usize) -> Option<f64> {
        self.values[[t, iy, ix, lev]]
    }

    /// Level column of one grid point at one time step.
    pub fn column(&self, t: usize, iy: usize, ix: usize) -> ArrayView1<'_, Option<f64>> {
        self.values.slice(s![t, iy, ix, ..])
    }

    /// Total number of valid cells.
    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Number of valid cells in each time step.
    pub fn count_valid_per_step(&self) -> Vec<usize> {
        self.values
            .axis_iter(Axis(0))
            .map(|step| step.iter().filter(|v| v.is_some()).count())
            .collect()
    }

    /// Values with masked cells replaced by `fill`.
    pub fn to_filled(&self, fill: f64) -> Array4<f64> {
        self.values.mapv(|v| v.unwrap_or(fill))
    }
}

/// Dense `(time, lat, lon)` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Gridded2d {
    values: Array3<Option<f64>>,
}

impl Gridded2d {
    /// A fully masked field.
    pub fn masked(ntime: usize, nlat: usize, nlon: usize) -> Self {
        Self {
            values: Array3::from_elem((ntime, nlat, nlon), None),
        }
    }

    /// Wrap existing cells.
    pub fn from_values(values: Array3<Option<f64>>) -> Self {
        Self { values }
    }

    /// All cells.
    pub fn values(&self) -> &Array3<Option<f64>> {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Array3<Option<f64>> {
        &mut self.values
    }

    /// `(ntime, nlat, nlon)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// One cell, `None` if masked.
    pub fn get(&self, t: usize, iy: usize, ix: usize) -> Option<f64> {
        self.values[[t, iy, ix]]
    }

    /// Total number of valid cells.
    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Values with masked cells replaced by `fill`.
    pub fn to_filled(&self, fill: f64) -> Array3<f64> {
        self.values.mapv(|v| v.unwrap_or(fill))
    }
}
