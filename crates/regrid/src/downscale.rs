//! Interpolation onto a per-point target elevation.

use ndarray::{Array2, s};
use rayon::prelude::*;
use tracing::info;

use crate::error::RegridError;
use crate::field::{Gridded2d, Gridded3d, LevelAxis};
use crate::interpolate::{check_topography_grid, interpolate_point};
use crate::spline::Extrapolation;
use crate::topography::TopographyField;

/// Target elevations above this are fill values.
const ELEVATION_FILL_THRESHOLD: f64 = 1.0e30;

/// Configuration for [`downscale_to_elevation`].
#[derive(Debug, Clone)]
pub struct DownscaleConfig {
    extrapolation: Extrapolation,
}

impl Default for DownscaleConfig {
    fn default() -> Self {
        Self {
            extrapolation: Extrapolation::Clamp,
        }
    }
}

impl DownscaleConfig {
    /// Default configuration: clamp outside the node range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the extrapolation mode.
    pub fn with_extrapolation(mut self, mode: Extrapolation) -> Self {
        self.extrapolation = mode;
        self
    }

    /// Extrapolation mode.
    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }
}

/// Interpolate `field` at the elevation of each grid point, e.g. to move
/// a coarse model field onto a finer surface topography regridded to the
/// same grid.
///
/// On elevation classes the nodes are the present classes in `topo`; on
/// custom levels they are the level heights, the same at every point.
/// Points without nodes or with a fill-valued target stay masked.
///
/// # Errors
///
/// - [`RegridError::ShapeMismatch`] if `elevation` or `topo` is not on the
///   field's grid.
/// - [`RegridError::PreconditionNotSet`] if the field is on elevation
///   classes and `topo` is `None`.
pub fn downscale_to_elevation(
    field: &Gridded3d,
    topo: Option<&TopographyField>,
    elevation: &Array2<f64>,
    config: &DownscaleConfig,
) -> Result<Gridded2d, RegridError> {
    let (ntime, nlat, nlon, _) = field.dim();
    if elevation.dim() != (nlat, nlon) {
        let (ey, ex) = elevation.dim();
        return Err(RegridError::ShapeMismatch {
            name: "target elevation".to_string(),
            expected: vec![nlat, nlon],
            got: vec![ey, ex],
        });
    }

    let topo = match field.levels() {
        LevelAxis::ElevationClasses => {
            let topo = topo.ok_or(RegridError::PreconditionNotSet {
                field: "topography",
                operation: "downscaling elevation classes",
            })?;
            check_topography_grid(topo, (nlat, nlon))?;
            Some(topo)
        }
        LevelAxis::Heights(_) => None,
    };
    let level_nodes: Vec<(usize, f64)> = field
        .levels()
        .heights()
        .map(|h| h.iter().copied().enumerate().collect())
        .unwrap_or_default();

    let mut points = Vec::new();
    let mut masked_targets = 0usize;
    for iy in 0..nlat {
        for ix in 0..nlon {
            let z = elevation[[iy, ix]];
            if !z.is_finite() || z > ELEVATION_FILL_THRESHOLD {
                masked_targets += 1;
                continue;
            }
            let nodes = match topo {
                Some(topo) => topo.nodes(iy, ix),
                None => level_nodes.clone(),
            };
            if !nodes.is_empty() {
                points.push((iy, ix, z, nodes));
            }
        }
    }

    let columns: Vec<(usize, usize, Array2<Option<f64>>)> = points
        .par_iter()
        .map(|(iy, ix, z, nodes)| {
            let profile =
                interpolate_point(field, *iy, *ix, nodes, &[*z], config.extrapolation());
            (*iy, *ix, profile.values)
        })
        .collect();

    let mut out = Gridded2d::masked(ntime, nlat, nlon);
    for (iy, ix, values) in columns {
        out.values_mut()
            .slice_mut(s![.., iy, ix])
            .assign(&values.column(0));
    }

    info!(
        valid = out.count_valid(),
        masked_targets,
        extrapolation = ?config.extrapolation(),
        "downscaled to target elevation"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GLC_NEC;
    use approx::assert_relative_eq;
    use ndarray::{Array3, array};

    fn class_field() -> (Gridded3d, TopographyField) {
        let mut raw = Array3::zeros((GLC_NEC + 1, 1, 2));
        raw[[1, 0, 0]] = 300.0;
        raw[[2, 0, 0]] = 1000.0;
        let topo = TopographyField::from_classes(raw).unwrap();

        let mut field = Gridded3d::masked(1, 1, 2, LevelAxis::ElevationClasses);
        field.values_mut()[[0, 0, 0, 0]] = Some(5.0);
        field.values_mut()[[0, 0, 0, 1]] = Some(2.0);
        (field, topo)
    }

    #[test]
    fn clamp_is_default() {
        let (field, topo) = class_field();
        let out = downscale_to_elevation(
            &field,
            Some(&topo),
            &array![[0.0, 500.0]],
            &DownscaleConfig::new(),
        )
        .unwrap();
        assert_eq!(out.get(0, 0, 0), Some(5.0));
        // Second point has no classes.
        assert_eq!(out.get(0, 0, 1), None);
    }

    #[test]
    fn linear_extrapolation() {
        let (field, topo) = class_field();
        let config = DownscaleConfig::new().with_extrapolation(Extrapolation::Linear);
        let out =
            downscale_to_elevation(&field, Some(&topo), &array![[0.0, 0.0]], &config).unwrap();
        assert_relative_eq!(out.get(0, 0, 0).unwrap(), 44.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn interior_target() {
        let (field, topo) = class_field();
        let out = downscale_to_elevation(
            &field,
            Some(&topo),
            &array![[650.0, 0.0]],
            &DownscaleConfig::new(),
        )
        .unwrap();
        assert_relative_eq!(out.get(0, 0, 0).unwrap(), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn fill_target_masked() {
        let (field, topo) = class_field();
        let out = downscale_to_elevation(
            &field,
            Some(&topo),
            &array![[9.96921e36, 0.0]],
            &DownscaleConfig::new(),
        )
        .unwrap();
        assert_eq!(out.get(0, 0, 0), None);
    }

    #[test]
    fn classes_need_topography() {
        let (field, _) = class_field();
        let err = downscale_to_elevation(&field, None, &array![[0.0, 0.0]], &DownscaleConfig::new())
            .unwrap_err();
        assert!(matches!(
            err,
            RegridError::PreconditionNotSet {
                field: "topography",
                ..
            }
        ));
    }

    #[test]
    fn custom_levels_use_axis_heights() {
        let mut field = Gridded3d::masked(1, 1, 1, LevelAxis::Heights(vec![0.0, 1000.0]));
        field.values_mut()[[0, 0, 0, 0]] = Some(0.0);
        field.values_mut()[[0, 0, 0, 1]] = Some(10.0);
        let out =
            downscale_to_elevation(&field, None, &array![[250.0]], &DownscaleConfig::new()).unwrap();
        assert_relative_eq!(out.get(0, 0, 0).unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn elevation_shape_checked() {
        let (field, topo) = class_field();
        let err = downscale_to_elevation(
            &field,
            Some(&topo),
            &array![[0.0], [0.0]],
            &DownscaleConfig::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RegridError::ShapeMismatch { .. }));
    }
}
