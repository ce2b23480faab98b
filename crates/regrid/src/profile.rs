//! Regional statistics per elevation class.

use tracing::debug;

use crate::error::RegridError;
use crate::field::{Gridded3d, LevelAxis};
use crate::fraction::FractionField;
use crate::grid::GridDescriptor;
use crate::{GLC_NEC, VIRTUAL_FRACTION_THRESHOLD};

/// Upper class boundaries (m) of CLM's 10-class elevation scheme, with the
/// lower boundary of class 1 first.
const TOPOMAX: [f64; GLC_NEC + 1] = [
    0.0, 200.0, 400.0, 700.0, 1000.0, 1300.0, 1600.0, 2000.0, 2500.0, 3000.0, 10000.0,
];

/// Mid-height of each elevation class, for plotting profiles against height.
pub fn default_bin_centres() -> [f64; GLC_NEC] {
    std::array::from_fn(|i| 0.5 * (TOPOMAX[i] + TOPOMAX[i + 1]))
}

/// Inclusive latitude/longitude box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    lat: (f64, f64),
    lon: (f64, f64),
}

impl RegionBounds {
    /// Create a box from `(min, max)` latitude and longitude ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::InvalidRegion`] if a bound is not finite or a
    /// minimum exceeds its maximum.
    pub fn new(lat: (f64, f64), lon: (f64, f64)) -> Result<Self, RegridError> {
        for (axis, (lo, hi)) in [("latitude", lat), ("longitude", lon)] {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(RegridError::InvalidRegion {
                    reason: format!("{axis} bounds must be finite"),
                });
            }
            if lo > hi {
                return Err(RegridError::InvalidRegion {
                    reason: format!("{axis} minimum {lo} exceeds maximum {hi}"),
                });
            }
        }
        Ok(Self { lat, lon })
    }

    /// Whether `(lat, lon)` lies inside the box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat.0..=self.lat.1).contains(&lat) && (self.lon.0..=self.lon.1).contains(&lon)
    }
}

/// Statistics of one elevation class over a region.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProfile {
    /// Elevation class, 1-based.
    pub class: usize,
    /// Mean of the contributing cells.
    pub mean: Option<f64>,
    /// Population standard deviation of the contributing cells.
    pub std: Option<f64>,
    /// Number of contributing cells.
    pub count: usize,
}

/// Mean and spread of each class over the cells inside `bounds` at one time
/// step.
///
/// A cell contributes when its value is valid and the class covers at least
/// [`VIRTUAL_FRACTION_THRESHOLD`] of the grid cell. Virtual classes carry a
/// model value but no area. Classes without contributing cells have `None`
/// statistics.
///
/// # Errors
///
/// - [`RegridError::ShapeMismatch`] if the field is not on elevation classes
///   or the field, fraction and grid shapes differ.
/// - [`RegridError::TimeOutOfRange`] if `time` is past the last step.
pub fn regional_profile(
    field: &Gridded3d,
    fraction: &FractionField,
    grid: &GridDescriptor,
    time: usize,
    bounds: &RegionBounds,
) -> Result<Vec<ClassProfile>, RegridError> {
    let (ntime, nlat, nlon, nlev) = field.dim();
    if *field.levels() != LevelAxis::ElevationClasses {
        return Err(RegridError::ShapeMismatch {
            name: "profile input levels".to_string(),
            expected: vec![ntime, nlat, nlon, GLC_NEC],
            got: vec![ntime, nlat, nlon, nlev],
        });
    }
    grid.check_shape("profile field", (nlat, nlon))?;
    grid.check_shape("fraction", fraction.grid_shape())?;
    if time >= ntime {
        return Err(RegridError::TimeOutOfRange { index: time, ntime });
    }

    let inside: Vec<(usize, usize)> = grid
        .lats()
        .iter()
        .enumerate()
        .flat_map(|(iy, &lat)| {
            grid.lons()
                .iter()
                .enumerate()
                .filter(move |&(_, &lon)| bounds.contains(lat, lon))
                .map(move |(ix, _)| (iy, ix))
        })
        .collect();
    debug!(cells = inside.len(), "cells inside region");

    let profiles = (1..=GLC_NEC)
        .map(|class| {
            let values: Vec<f64> = inside
                .iter()
                .filter(|&&(iy, ix)| {
                    fraction
                        .get(class, iy, ix)
                        .is_some_and(|f| f >= VIRTUAL_FRACTION_THRESHOLD)
                })
                .filter_map(|&(iy, ix)| field.get(time, iy, ix, class - 1))
                .collect();
            let (mean, std) = mean_std(&values).unzip();
            ClassProfile {
                class,
                mean,
                std,
                count: values.len(),
            }
        })
        .collect();
    Ok(profiles)
}

fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn grid() -> GridDescriptor {
        GridDescriptor::new(vec![60.0, 70.0, 80.0], vec![300.0, 310.0]).unwrap()
    }

    #[test]
    fn bin_centres_match_class_midpoints() {
        assert_eq!(
            default_bin_centres(),
            [100.0, 300.0, 550.0, 850.0, 1150.0, 1450.0, 1800.0, 2250.0, 2750.0, 6500.0]
        );
    }

    #[test]
    fn bounds_validated() {
        assert!(RegionBounds::new((70.0, 60.0), (0.0, 1.0)).is_err());
        assert!(RegionBounds::new((60.0, f64::NAN), (0.0, 1.0)).is_err());
        let b = RegionBounds::new((60.0, 70.0), (300.0, 300.0)).unwrap();
        assert!(b.contains(60.0, 300.0));
        assert!(b.contains(70.0, 300.0));
        assert!(!b.contains(70.0, 310.0));
    }

    #[test]
    fn mean_and_population_std_inside_box() {
        let mut field = Gridded3d::masked(1, 3, 2, LevelAxis::ElevationClasses);
        // Class 1 values in column lon=300 at lat 60, 70, 80.
        field.values_mut()[[0, 0, 0, 0]] = Some(2.0);
        field.values_mut()[[0, 1, 0, 0]] = Some(4.0);
        field.values_mut()[[0, 2, 0, 0]] = Some(100.0);
        // Outside the box in longitude.
        field.values_mut()[[0, 0, 1, 0]] = Some(-50.0);
        // Class 2 value on a virtual class.
        field.values_mut()[[0, 0, 0, 1]] = Some(7.0);

        let mut raw = Array3::zeros((GLC_NEC + 1, 3, 2));
        raw.slice_mut(ndarray::s![1, .., ..]).fill(0.5);
        raw[[2, 0, 0]] = 1.0e-4;
        let fraction = FractionField::from_classes(raw).unwrap();

        let bounds = RegionBounds::new((60.0, 70.0), (290.0, 305.0)).unwrap();
        let profiles = regional_profile(&field, &fraction, &grid(), 0, &bounds).unwrap();

        assert_eq!(profiles.len(), GLC_NEC);
        assert_eq!(profiles[0].class, 1);
        assert_eq!(profiles[0].count, 2);
        assert_relative_eq!(profiles[0].mean.unwrap(), 3.0);
        assert_relative_eq!(profiles[0].std.unwrap(), 1.0);

        assert_eq!(profiles[1].count, 0);
        assert_eq!(profiles[1].mean, None);
        assert_eq!(profiles[1].std, None);
    }

    #[test]
    fn time_checked() {
        let field = Gridded3d::masked(1, 3, 2, LevelAxis::ElevationClasses);
        let fraction = FractionField::from_classes(Array3::zeros((GLC_NEC + 1, 3, 2))).unwrap();
        let bounds = RegionBounds::new((0.0, 90.0), (0.0, 360.0)).unwrap();
        let err = regional_profile(&field, &fraction, &grid(), 2, &bounds).unwrap_err();
        assert!(matches!(err, RegridError::TimeOutOfRange { index: 2, ntime: 1 }));
    }
}
