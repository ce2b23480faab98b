//! Raw variable payloads and the kind discriminator.

use ndarray::{Array2, Array3};

use crate::error::RegridError;

/// How a variable's records are laid out, derived from the name of its last
/// dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// One record per CLM column (`column` dimension).
    Column,
    /// One record per plant functional type (`pft` dimension).
    Pft,
    /// Already gridded over `(time, lat, lon)` (`lon` dimension).
    Structured,
}

impl VariableKind {
    /// Parse the name of a variable's last dimension.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::UnsupportedVariableKind`] for any other name.
    pub fn from_dimension(name: &str) -> Result<Self, RegridError> {
        match name {
            "column" => Ok(Self::Column),
            "pft" => Ok(Self::Pft),
            "lon" => Ok(Self::Structured),
            other => Err(RegridError::UnsupportedVariableKind {
                kind: other.to_string(),
                reason: "expected last dimension 'column', 'pft' or 'lon'".to_string(),
            }),
        }
    }

    /// Prefix of the companion index variables (`cols1d`, `pfts1d`).
    pub fn index_prefix(self) -> Option<&'static str> {
        match self {
            Self::Column => Some("cols1d"),
            Self::Pft => Some("pfts1d"),
            Self::Structured => None,
        }
    }

    /// Rank of the data once layered variables are reduced to one layer.
    pub fn expected_rank(self) -> usize {
        match self {
            Self::Column | Self::Pft => 2,
            Self::Structured => 3,
        }
    }

    /// Dimension name this kind was parsed from.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Pft => "pft",
            Self::Structured => "lon",
        }
    }
}

/// Values of a variable, either per record or already on the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    /// `(ntime, nvec)` per-record values.
    Vector(Array2<f64>),
    /// `(ntime, nlat, nlon)` gridded values.
    Structured(Array3<f64>),
}

impl SeriesData {
    /// Number of time steps.
    pub fn ntime(&self) -> usize {
        match self {
            Self::Vector(a) => a.nrows(),
            Self::Structured(a) => a.dim().0,
        }
    }

    /// Number of records, or `None` for structured data.
    pub fn nvec(&self) -> Option<usize> {
        match self {
            Self::Vector(a) => Some(a.ncols()),
            Self::Structured(_) => None,
        }
    }

    /// Apply `f` to every valid value in place; missing values are left alone.
    pub(crate) fn map_valid_inplace(&mut self, f: impl Fn(f64) -> f64) {
        let apply = |v: &mut f64| {
            if crate::valid_value(*v).is_some() {
                *v = f(*v);
            }
        };
        match self {
            Self::Vector(a) => a.iter_mut().for_each(apply),
            Self::Structured(a) => a.iter_mut().for_each(apply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn kind_from_dimension() {
        assert_eq!(VariableKind::from_dimension("column").unwrap(), VariableKind::Column);
        assert_eq!(VariableKind::from_dimension("pft").unwrap(), VariableKind::Pft);
        assert_eq!(
            VariableKind::from_dimension("lon").unwrap(),
            VariableKind::Structured
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let err = VariableKind::from_dimension("landunit").unwrap_err();
        assert!(matches!(
            err,
            RegridError::UnsupportedVariableKind { ref kind, .. } if kind == "landunit"
        ));
    }

    #[test]
    fn index_prefix_per_kind() {
        assert_eq!(VariableKind::Column.index_prefix(), Some("cols1d"));
        assert_eq!(VariableKind::Pft.index_prefix(), Some("pfts1d"));
        assert_eq!(VariableKind::Structured.index_prefix(), None);
    }

    #[test]
    fn map_valid_skips_fill_values() {
        let mut data = SeriesData::Vector(array![[1.0, 1.0e36], [2.0, f64::NAN]]);
        data.map_valid_inplace(|v| v * 10.0);
        match data {
            SeriesData::Vector(a) => {
                assert_eq!(a[[0, 0]], 10.0);
                assert_eq!(a[[0, 1]], 1.0e36);
                assert_eq!(a[[1, 0]], 20.0);
                assert!(a[[1, 1]].is_nan());
            }
            SeriesData::Structured(_) => panic!("expected vector data"),
        }
    }

    #[test]
    fn dims() {
        let v = SeriesData::Vector(Array2::zeros((3, 7)));
        assert_eq!(v.ntime(), 3);
        assert_eq!(v.nvec(), Some(7));
        let s = SeriesData::Structured(Array3::zeros((2, 4, 5)));
        assert_eq!(s.ntime(), 2);
        assert_eq!(s.nvec(), None);
    }
}
