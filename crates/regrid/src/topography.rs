//! Per-class surface heights.

use ndarray::{Array2, Array3, s};

use crate::error::RegridError;
use crate::field::{Gridded3d, LevelAxis};
use crate::scatter::ScatterConfig;
use crate::series::SeriesData;
use crate::variable::VectorVariable;
use crate::{GLC_NEC, MIN_CLASS_HEIGHT, valid_value};

/// Surface height of every elevation class at every grid point.
///
/// Class 0 (tundra) is never an interpolation node; its height is kept
/// only to tell tundra-only points apart from points without land ice.
/// Heights below [`MIN_CLASS_HEIGHT`] mean the class (tundra included) is
/// absent.
#[derive(Debug, Clone, PartialEq)]
pub struct TopographyField {
    /// `(GLC_NEC + 1, nlat, nlon)`, class 0 always `None`.
    heights: Array3<Option<f64>>,
    /// Class-0 height, `(nlat, nlon)`, `None` where tundra is absent.
    tundra: Array2<Option<f64>>,
}

impl TopographyField {
    /// Build from raw per-class heights, shape `(GLC_NEC + 1, nlat, nlon)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] for a wrong class count.
    pub fn from_classes(raw: Array3<f64>) -> Result<Self, RegridError> {
        let (nclass, nlat, nlon) = raw.dim();
        if nclass != GLC_NEC + 1 {
            return Err(RegridError::ShapeMismatch {
                name: "topography classes".to_string(),
                expected: vec![GLC_NEC + 1, nlat, nlon],
                got: vec![nclass, nlat, nlon],
            });
        }

        let tundra = raw.slice(s![0, .., ..]).mapv(node_height);
        let mut heights = raw.mapv(node_height);
        heights.slice_mut(s![0, .., ..]).fill(None);
        Ok(Self { heights, tundra })
    }

    /// Take class heights from one time step of a gridded class field, such
    /// as a history-file topography variable run through the scatter.
    ///
    /// Slot `lev` becomes class `lev + 1`. No tundra heights are available
    /// from this source.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] if the field is not on
    /// elevation classes, or [`RegridError::TimeOutOfRange`].
    pub fn from_gridded(field: &Gridded3d, time: usize) -> Result<Self, RegridError> {
        let (ntime, nlat, nlon, nlev) = field.dim();
        if *field.levels() != LevelAxis::ElevationClasses {
            return Err(RegridError::ShapeMismatch {
                name: "topography levels".to_string(),
                expected: vec![ntime, nlat, nlon, GLC_NEC],
                got: vec![ntime, nlat, nlon, nlev],
            });
        }
        if time >= ntime {
            return Err(RegridError::TimeOutOfRange { index: time, ntime });
        }

        let mut heights = Array3::from_elem((GLC_NEC + 1, nlat, nlon), None);
        for lev in 0..GLC_NEC {
            let source = field.values().slice(s![time, .., .., lev]);
            heights
                .slice_mut(s![lev + 1, .., ..])
                .zip_mut_with(&source, |h, v| *h = v.and_then(node_height));
        }
        Ok(Self {
            heights,
            tundra: Array2::from_elem((nlat, nlon), None),
        })
    }

    /// Grid a height variable and take its class heights at `time`.
    ///
    /// Tundra heights come from the records coded as class 0. Structured
    /// variables carry no such records, so no point has tundra.
    ///
    /// # Errors
    ///
    /// Propagates [`VectorVariable::gridded_3d`] and [`Self::from_gridded`]
    /// errors.
    pub fn from_variable(
        variable: &VectorVariable,
        config: &ScatterConfig,
        time: usize,
    ) -> Result<Self, RegridError> {
        let gridded = variable.gridded_3d(config)?;
        let mut topo = Self::from_gridded(&gridded, time)?;

        if let (SeriesData::Vector(data), Some(index)) = (variable.data(), variable.index()) {
            let tundra_records = index
                .codes()
                .iter()
                .enumerate()
                .filter(|(_, code)| code.is_tundra());
            for (record, _) in tundra_records {
                let loc = index.locations()[record];
                topo.tundra[[loc.iy(), loc.ix()]] = node_height(data[[time, record]]);
            }
        }
        Ok(topo)
    }

    /// Height of `class` at a grid point, `None` for tundra or absent classes.
    pub fn node_height(&self, class: usize, iy: usize, ix: usize) -> Option<f64> {
        self.heights[[class, iy, ix]]
    }

    /// `(slot, height)` of every present elevation class, in class order.
    pub fn nodes(&self, iy: usize, ix: usize) -> Vec<(usize, f64)> {
        (1..=GLC_NEC)
            .filter_map(|class| self.node_height(class, iy, ix).map(|h| (class - 1, h)))
            .collect()
    }

    /// Whether tundra is present at a grid point.
    pub fn has_tundra(&self, iy: usize, ix: usize) -> bool {
        self.tundra[[iy, ix]].is_some()
    }

    /// `(nlat, nlon)`.
    pub fn grid_shape(&self) -> (usize, usize) {
        self.tundra.dim()
    }
}

fn node_height(h: f64) -> Option<f64> {
    valid_value(h).filter(|&h| h >= MIN_CLASS_HEIGHT)
}
