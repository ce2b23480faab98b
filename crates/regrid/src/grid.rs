//! Rectilinear target grid.

use crate::error::RegridError;

/// Latitude and longitude axes of the rectilinear target grid.
///
/// Scattered data is addressed purely by `(lat index, lon index)` pairs;
/// the coordinate values are carried along for output and for regional
/// selection.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDescriptor {
    lats: Vec<f64>,
    lons: Vec<f64>,
}

impl GridDescriptor {
    /// Create a grid from its latitude and longitude axes.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::EmptyGrid`] if either axis is empty.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>) -> Result<Self, RegridError> {
        if lats.is_empty() {
            return Err(RegridError::EmptyGrid { axis: "lat" });
        }
        if lons.is_empty() {
            return Err(RegridError::EmptyGrid { axis: "lon" });
        }
        Ok(Self { lats, lons })
    }

    /// Latitude axis values.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitude axis values.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Number of latitudes.
    pub fn nlat(&self) -> usize {
        self.lats.len()
    }

    /// Number of longitudes.
    pub fn nlon(&self) -> usize {
        self.lons.len()
    }

    /// `(nlat, nlon)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nlat(), self.nlon())
    }

    /// Check that a 2-D array shape equals `(nlat, nlon)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] labelled with `name` otherwise.
    pub fn check_shape(&self, name: &str, got: (usize, usize)) -> Result<(), RegridError> {
        if got != self.shape() {
            return Err(RegridError::ShapeMismatch {
                name: name.to_string(),
                expected: vec![self.nlat(), self.nlon()],
                got: vec![got.0, got.1],
            });
        }
        Ok(())
    }
}
