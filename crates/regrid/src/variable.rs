//! An unstructured model variable with its time axis and grid lookups.

use ndarray::Array2;
use tracing::debug;

use crate::error::RegridError;
use crate::field::Gridded3d;
use crate::grid::GridDescriptor;
use crate::index::GridIndex;
use crate::scatter::{ScatterConfig, replicate_structured, scatter_records};
use crate::series::{SeriesData, VariableKind};

/// Descriptive metadata of a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableMeta {
    /// Short name as it appears in the source file.
    pub name: String,
    /// Human-readable name; empty if the source has none.
    pub long_name: String,
    /// Units; `"-"` if the source has none.
    pub units: String,
}

impl VariableMeta {
    /// Metadata with the placeholder units `"-"`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            long_name: String::new(),
            units: "-".to_string(),
        }
    }

    /// Sets the long name.
    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    /// Sets the units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }
}

/// Time coordinate values and their units string.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    /// Time values, one per step.
    pub values: Vec<f64>,
    /// CF units string, e.g. `"days since 2000-01-01 00:00:00"`.
    pub units: String,
}

/// A model variable in its source (vector or structured) layout.
///
/// Owns the data and the lookups needed to place it on the grid. Column and
/// PFT variables always carry a [`GridIndex`]; structured variables never do.
#[derive(Debug, Clone)]
pub struct VectorVariable {
    meta: VariableMeta,
    time: TimeAxis,
    data: SeriesData,
    kind: VariableKind,
    grid: GridDescriptor,
    index: Option<GridIndex>,
}

impl VectorVariable {
    /// Assemble a variable and check that its parts agree.
    ///
    /// # Errors
    ///
    /// - [`RegridError::UnsupportedVariableKind`] if the data layout does not
    ///   fit `kind`.
    /// - [`RegridError::MissingGridMetadata`] if a column or PFT variable has
    ///   no index.
    /// - [`RegridError::LengthMismatch`] if the time axis or record count
    ///   disagrees with the data.
    /// - [`RegridError::ShapeMismatch`] if structured data is not on `grid`.
    pub fn new(
        meta: VariableMeta,
        time: TimeAxis,
        data: SeriesData,
        kind: VariableKind,
        grid: GridDescriptor,
        index: Option<GridIndex>,
    ) -> Result<Self, RegridError> {
        if data.ntime() != time.values.len() {
            return Err(RegridError::LengthMismatch {
                name: "time".to_string(),
                expected: data.ntime(),
                got: time.values.len(),
            });
        }

        let index = match (kind, &data) {
            (VariableKind::Structured, SeriesData::Structured(a)) => {
                let (_, ny, nx) = a.dim();
                grid.check_shape(&meta.name, (ny, nx))?;
                None
            }
            (VariableKind::Column | VariableKind::Pft, SeriesData::Vector(a)) => {
                let Some(index) = index else {
                    let prefix = kind.index_prefix().unwrap_or_default();
                    return Err(RegridError::MissingGridMetadata {
                        variable: meta.name.clone(),
                        missing: format!(
                            "{prefix}_ixy, {prefix}_jxy, {prefix}_itype_col, {prefix}_itype_lunit"
                        ),
                    });
                };
                if index.len() != a.ncols() {
                    return Err(RegridError::LengthMismatch {
                        name: format!("{} records", meta.name),
                        expected: index.len(),
                        got: a.ncols(),
                    });
                }
                Some(index)
            }
            (kind, _) => {
                return Err(RegridError::UnsupportedVariableKind {
                    kind: kind.as_str().to_string(),
                    reason: format!(
                        "'{}' data does not have rank {}",
                        meta.name,
                        kind.expected_rank()
                    ),
                });
            }
        };

        Ok(Self {
            meta,
            time,
            data,
            kind,
            grid,
            index,
        })
    }

    /// Variable metadata.
    pub fn meta(&self) -> &VariableMeta {
        &self.meta
    }

    /// Time axis.
    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    /// Raw data.
    pub fn data(&self) -> &SeriesData {
        &self.data
    }

    /// Variable kind.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Target grid.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /// Record index, present for column and PFT variables.
    pub fn index(&self) -> Option<&GridIndex> {
        self.index.as_ref()
    }

    /// Multiply every valid value by `factor`, optionally relabelling units.
    pub fn apply_factor(&mut self, factor: f64, units: Option<&str>) {
        self.data.map_valid_inplace(|v| v * factor);
        if let Some(units) = units {
            self.meta.units = units.to_string();
        }
        debug!(variable = %self.meta.name, factor, units = %self.meta.units, "applied factor");
    }

    /// Divide every valid value by the `(nlat, nlon)` field at the record's
    /// grid location.
    ///
    /// Data is untouched if the shape check fails.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] if `divisor` is not on the grid.
    pub fn divide_by_gridded(&mut self, divisor: &Array2<f64>) -> Result<(), RegridError> {
        self.grid.check_shape("divisor", divisor.dim())?;

        match (&mut self.data, &self.index) {
            (SeriesData::Vector(a), Some(index)) => {
                for (mut series, loc) in a.columns_mut().into_iter().zip(index.locations()) {
                    let d = divisor[[loc.iy(), loc.ix()]];
                    series.map_inplace(|v| {
                        if crate::valid_value(*v).is_some() {
                            *v /= d;
                        }
                    });
                }
            }
            (SeriesData::Structured(a), _) => {
                for mut step in a.outer_iter_mut() {
                    step.zip_mut_with(divisor, |v, &d| {
                        if crate::valid_value(*v).is_some() {
                            *v /= d;
                        }
                    });
                }
            }
            (SeriesData::Vector(_), None) => return Err(missing_index(&self.meta.name)),
        }
        Ok(())
    }

    /// Place the data on the `(time, lat, lon, class)` grid.
    ///
    /// # Errors
    ///
    /// Propagates [`scatter_records`] and [`replicate_structured`] errors.
    pub fn gridded_3d(&self, config: &ScatterConfig) -> Result<Gridded3d, RegridError> {
        match (&self.data, &self.index) {
            (SeriesData::Vector(a), Some(index)) => scatter_records(a, index, &self.grid, config),
            (SeriesData::Structured(a), _) => replicate_structured(a, &self.grid),
            (SeriesData::Vector(_), None) => Err(missing_index(&self.meta.name)),
        }
    }
}

fn missing_index(variable: &str) -> RegridError {
    RegridError::MissingGridMetadata {
        variable: variable.to_string(),
        missing: "record index".to_string(),
    }
}
