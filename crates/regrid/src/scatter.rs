//! Scatter per-record values onto the `(time, lat, lon, class)` grid.

use ndarray::{Array2, Array3, Axis, s};
use tracing::{debug, info};

use crate::error::RegridError;
use crate::field::{Gridded3d, LevelAxis};
use crate::grid::GridDescriptor;
use crate::index::GridIndex;
use crate::{GLC_NEC, valid_value};

/// What to do when two records map to the same grid point and class.
///
/// CLM writes one glacier column per elevation class per grid cell, so a
/// collision points at a mismatched grid-info file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail with [`RegridError::DuplicateRecord`].
    #[default]
    Reject,
    /// Overwrite: the record appearing last wins.
    LastWins,
}

/// Configuration for [`scatter_records`].
#[derive(Debug, Clone, Default)]
pub struct ScatterConfig {
    collisions: CollisionPolicy,
}

impl ScatterConfig {
    /// Default configuration (`CollisionPolicy::Reject`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collision policy.
    pub fn with_collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    /// Collision policy.
    pub fn collisions(&self) -> CollisionPolicy {
        self.collisions
    }
}

/// Place `(ntime, nvec)` record data onto a `(ntime, nlat, nlon, GLC_NEC)`
/// field.
///
/// Records with codes `401..=410` fill slot `code - 401` at their grid
/// location; all other records are ignored. Cells no record reaches stay
/// masked, and values above [`crate::MISSING_VALUE_THRESHOLD`] are masked
/// after placement.
///
/// # Errors
///
/// Returns [`RegridError::LengthMismatch`] if `data` and `index` disagree on
/// the record count, or [`RegridError::DuplicateRecord`] on a collision
/// under [`CollisionPolicy::Reject`].
pub fn scatter_records(
    data: &Array2<f64>,
    index: &GridIndex,
    grid: &GridDescriptor,
    config: &ScatterConfig,
) -> Result<Gridded3d, RegridError> {
    let (ntime, nvec) = data.dim();
    if nvec != index.len() {
        return Err(RegridError::LengthMismatch {
            name: "records".to_string(),
            expected: index.len(),
            got: nvec,
        });
    }

    let (nlat, nlon) = grid.shape();
    let mut field = Gridded3d::masked(ntime, nlat, nlon, LevelAxis::ElevationClasses);
    let mut owner: Array3<Option<usize>> = Array3::from_elem((nlat, nlon, GLC_NEC), None);

    for slot in 0..GLC_NEC {
        let mut placed = 0usize;
        for record in index.records_in_slot(slot) {
            let loc = index.locations()[record];
            let (iy, ix) = (loc.iy(), loc.ix());

            if let Some(first) = owner[[iy, ix, slot]] {
                if config.collisions() == CollisionPolicy::Reject {
                    return Err(RegridError::DuplicateRecord {
                        first,
                        second: record,
                        iy,
                        ix,
                        class: slot + 1,
                    });
                }
                debug!(first, second = record, iy, ix, class = slot + 1, "record overwritten");
            }
            owner[[iy, ix, slot]] = Some(record);

            let series = data.column(record);
            field
                .values_mut()
                .slice_mut(s![.., iy, ix, slot])
                .zip_mut_with(&series, |cell, &v| *cell = valid_value(v));
            placed += 1;
        }
        debug!(class = slot + 1, records = placed, "scattered elevation class");
    }

    report_valid(&field, index.n_mec_records());
    Ok(field)
}

/// Lift an already gridded `(ntime, nlat, nlon)` field to the class layout by
/// copying it into every class slot.
///
/// # Errors
///
/// Returns [`RegridError::ShapeMismatch`] if the spatial shape differs from
/// the grid.
pub fn replicate_structured(
    data: &Array3<f64>,
    grid: &GridDescriptor,
) -> Result<Gridded3d, RegridError> {
    let (ntime, nlat, nlon) = data.dim();
    grid.check_shape("structured data", (nlat, nlon))?;

    let mut field = Gridded3d::masked(ntime, nlat, nlon, LevelAxis::ElevationClasses);
    let masked = data.mapv(valid_value);
    for mut slot in field.values_mut().axis_iter_mut(Axis(3)) {
        slot.assign(&masked);
    }

    report_valid(&field, nlat * nlon * GLC_NEC);
    Ok(field)
}

fn report_valid(field: &Gridded3d, n_slots: usize) {
    let per_step = field.count_valid_per_step();
    let first = per_step.first().copied().unwrap_or(0);
    info!(
        n_slots,
        valid_first_step = first,
        n_steps = per_step.len(),
        "gridded elevation-class field"
    );
    debug!(?per_step, "valid cells per time step");
}
