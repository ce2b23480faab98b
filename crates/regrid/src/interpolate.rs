//! Reprojection of elevation-class fields onto fixed target heights.

use ndarray::{Array2, s};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::RegridError;
use crate::field::{Gridded3d, LevelAxis};
use crate::spline::{Extrapolation, LinearStencil};
use crate::topography::TopographyField;

/// Point counts from one [`interpolate_to_levels`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterpolationReport {
    active_points: usize,
    tundra_only_points: usize,
}

impl InterpolationReport {
    /// Points with at least one present elevation class.
    pub fn active_points(&self) -> usize {
        self.active_points
    }

    /// Points with a valid tundra height but no present elevation class.
    pub fn tundra_only_points(&self) -> usize {
        self.tundra_only_points
    }
}

/// Custom-level field plus the point counts that produced it.
#[derive(Debug, Clone)]
pub struct InterpolationResult {
    field: Gridded3d,
    report: InterpolationReport,
}

impl InterpolationResult {
    /// The interpolated field.
    pub fn field(&self) -> &Gridded3d {
        &self.field
    }

    /// Point counts.
    pub fn report(&self) -> InterpolationReport {
        self.report
    }

    /// Consume the result, keeping the field.
    pub fn into_field(self) -> Gridded3d {
        self.field
    }
}

/// Interpolate a class field to the heights in `levels`.
///
/// At every grid point the present classes (per `topo`) are the nodes of a
/// piecewise-linear profile in height; targets outside the node range are
/// extrapolated linearly. A single node gives a constant profile. Points
/// without nodes stay masked. When some node values are missing at a time
/// step, that step is interpolated through the remaining nodes only.
///
/// # Errors
///
/// - [`RegridError::InvalidLevels`] if `levels` is empty or not finite.
/// - [`RegridError::ShapeMismatch`] if the field is not on elevation classes
///   or its grid differs from the topography grid.
pub fn interpolate_to_levels(
    field: &Gridded3d,
    topo: &TopographyField,
    levels: &[f64],
) -> Result<InterpolationResult, RegridError> {
    validate_levels(levels)?;
    let (ntime, nlat, nlon, nlev) = field.dim();
    if *field.levels() != LevelAxis::ElevationClasses {
        return Err(RegridError::ShapeMismatch {
            name: "interpolation input levels".to_string(),
            expected: vec![ntime, nlat, nlon, crate::GLC_NEC],
            got: vec![ntime, nlat, nlon, nlev],
        });
    }
    check_topography_grid(topo, (nlat, nlon))?;

    // --- Classify points ---
    let mut report = InterpolationReport::default();
    let mut active = Vec::new();
    for iy in 0..nlat {
        for ix in 0..nlon {
            let nodes = topo.nodes(iy, ix);
            if nodes.is_empty() {
                if topo.has_tundra(iy, ix) {
                    report.tundra_only_points += 1;
                }
            } else {
                active.push((iy, ix, nodes));
            }
        }
    }
    report.active_points = active.len();

    // --- Interpolate active points in parallel ---
    let columns: Vec<(usize, usize, PointProfile)> = active
        .par_iter()
        .map(|(iy, ix, nodes)| {
            let profile = interpolate_point(field, *iy, *ix, nodes, levels, Extrapolation::Linear);
            (*iy, *ix, profile)
        })
        .collect();

    let mut out = Gridded3d::masked(ntime, nlat, nlon, LevelAxis::Heights(levels.to_vec()));
    let mut fallback_steps = 0usize;
    for (iy, ix, profile) in columns {
        fallback_steps += profile.fallback_steps;
        out.values_mut()
            .slice_mut(s![.., iy, ix, ..])
            .assign(&profile.values);
    }

    if report.active_points == 0 {
        warn!("no grid point has a present elevation class");
    }
    debug!(fallback_steps, "steps interpolated through a reduced node set");
    info!(
        active_points = report.active_points,
        tundra_only_points = report.tundra_only_points,
        nlev = levels.len(),
        "interpolated to custom levels"
    );
    Ok(InterpolationResult { field: out, report })
}

/// Interpolated `(ntime, ntarget)` values of one grid point.
pub(crate) struct PointProfile {
    pub(crate) values: Array2<Option<f64>>,
    pub(crate) fallback_steps: usize,
}

/// Interpolate one grid point through `(level index, height)` nodes.
///
/// The stencil for the full node set is fitted once and reused for every
/// time step whose node values are all valid.
pub(crate) fn interpolate_point(
    field: &Gridded3d,
    iy: usize,
    ix: usize,
    nodes: &[(usize, f64)],
    targets: &[f64],
    mode: Extrapolation,
) -> PointProfile {
    let ntime = field.ntime();
    let mut values = Array2::from_elem((ntime, targets.len()), None);
    let mut fallback_steps = 0;

    let heights: Vec<f64> = nodes.iter().map(|&(_, h)| h).collect();
    let Some(full) = LinearStencil::fit(&heights, targets, mode) else {
        return PointProfile {
            values,
            fallback_steps,
        };
    };

    let mut node_values = Vec::with_capacity(nodes.len());
    for (t, mut row) in values.outer_iter_mut().enumerate() {
        node_values.clear();
        node_values.extend(nodes.iter().map(|&(lev, _)| field.get(t, iy, ix, lev)));

        if node_values.iter().all(Option::is_some) {
            let v: Vec<f64> = node_values.iter().flatten().copied().collect();
            row.iter_mut()
                .zip(full.evaluate(&v))
                .for_each(|(cell, y)| *cell = Some(y));
            continue;
        }

        fallback_steps += 1;
        let (h, v): (Vec<f64>, Vec<f64>) = heights
            .iter()
            .zip(&node_values)
            .filter_map(|(&h, v)| v.map(|v| (h, v)))
            .unzip();
        if let Some(partial) = LinearStencil::fit(&h, targets, mode) {
            row.iter_mut()
                .zip(partial.evaluate(&v))
                .for_each(|(cell, y)| *cell = Some(y));
        }
    }

    PointProfile {
        values,
        fallback_steps,
    }
}

fn validate_levels(levels: &[f64]) -> Result<(), RegridError> {
    if levels.is_empty() {
        return Err(RegridError::InvalidLevels {
            reason: "no target levels given".to_string(),
        });
    }
    if let Some(bad) = levels.iter().find(|l| !l.is_finite()) {
        return Err(RegridError::InvalidLevels {
            reason: format!("level {bad} is not finite"),
        });
    }
    Ok(())
}

pub(crate) fn check_topography_grid(
    topo: &TopographyField,
    grid: (usize, usize),
) -> Result<(), RegridError> {
    if topo.grid_shape() != grid {
        let (ty, tx) = topo.grid_shape();
        return Err(RegridError::ShapeMismatch {
            name: "topography grid".to_string(),
            expected: vec![grid.0, grid.1],
            got: vec![ty, tx],
        });
    }
    Ok(())
}
