//! Per-record grid locations and elevation-class codes.

use crate::error::RegridError;
use crate::grid::GridDescriptor;
use crate::{ELEVATION_CLASS_BASE, GLC_NEC};

/// 0-based `(ix, iy)` grid position of one unstructured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordLocation {
    ix: usize,
    iy: usize,
}

impl RecordLocation {
    /// Create a location from 0-based longitude and latitude indices.
    pub fn new(ix: usize, iy: usize) -> Self {
        Self { ix, iy }
    }

    /// Longitude index (0-based).
    pub fn ix(&self) -> usize {
        self.ix
    }

    /// Latitude index (0-based).
    pub fn iy(&self) -> usize {
        self.iy
    }
}

/// Column type code of a record.
///
/// Glacier MEC columns are coded `400 + class` with `class` in
/// `1..=GLC_NEC`. Any other code (vegetated, lake, urban, tundra, ...) has no
/// elevation-class slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElevationClassCode(i32);

impl ElevationClassCode {
    /// Wrap a raw `itype_col` value.
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    /// Code for the given 1-based elevation class.
    pub fn for_class(class: usize) -> Self {
        Self(ELEVATION_CLASS_BASE + class as i32)
    }

    /// Raw code.
    pub fn code(self) -> i32 {
        self.0
    }

    /// 1-based elevation class, or `None` for non-MEC columns.
    pub fn class_index(self) -> Option<usize> {
        let offset = self.0 - ELEVATION_CLASS_BASE;
        (1..=GLC_NEC as i32)
            .contains(&offset)
            .then_some(offset as usize)
    }

    /// Whether the record is the glacier tundra column (class 0).
    pub fn is_tundra(self) -> bool {
        self.0 == ELEVATION_CLASS_BASE
    }

    /// 0-based slot in the class axis of a gridded field.
    pub fn slot(self) -> Option<usize> {
        self.class_index().map(|c| c - 1)
    }
}

/// Grid location, class code and landunit type of every record.
///
/// Built once from the `*1d_ixy`, `*1d_jxy`, `*1d_itype_col` and
/// `*1d_itype_lunit` companion arrays and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GridIndex {
    locations: Vec<RecordLocation>,
    codes: Vec<ElevationClassCode>,
    landunits: Vec<i32>,
}

impl GridIndex {
    /// Build the index from 1-based source indices.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::LengthMismatch`] if the four arrays differ in
    /// length, or [`RegridError::IndexOutOfRange`] if any index falls outside
    /// the grid.
    pub fn from_one_based(
        ixy: &[i32],
        jxy: &[i32],
        itype_col: &[i32],
        itype_lunit: &[i32],
        grid: &GridDescriptor,
    ) -> Result<Self, RegridError> {
        let n = ixy.len();
        for (name, len) in [
            ("jxy", jxy.len()),
            ("itype_col", itype_col.len()),
            ("itype_lunit", itype_lunit.len()),
        ] {
            if len != n {
                return Err(RegridError::LengthMismatch {
                    name: name.to_string(),
                    expected: n,
                    got: len,
                });
            }
        }

        let locations = ixy
            .iter()
            .zip(jxy)
            .enumerate()
            .map(|(record, (&i, &j))| {
                let ix = to_zero_based("ixy", record, i, grid.nlon())?;
                let iy = to_zero_based("jxy", record, j, grid.nlat())?;
                Ok(RecordLocation::new(ix, iy))
            })
            .collect::<Result<Vec<_>, RegridError>>()?;

        Ok(Self {
            locations,
            codes: itype_col.iter().copied().map(ElevationClassCode::new).collect(),
            landunits: itype_lunit.to_vec(),
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Location of every record.
    pub fn locations(&self) -> &[RecordLocation] {
        &self.locations
    }

    /// Class code of every record.
    pub fn codes(&self) -> &[ElevationClassCode] {
        &self.codes
    }

    /// Landunit type of every record (informational).
    pub fn landunits(&self) -> &[i32] {
        &self.landunits
    }

    /// Records whose class code places them in the given 0-based slot,
    /// in record order.
    pub fn records_in_slot(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter(move |(_, code)| code.slot() == Some(slot))
            .map(|(r, _)| r)
    }

    /// Number of records belonging to any elevation class.
    pub fn n_mec_records(&self) -> usize {
        self.codes.iter().filter(|c| c.slot().is_some()).count()
    }
}

fn to_zero_based(
    axis: &'static str,
    record: usize,
    value: i32,
    max: usize,
) -> Result<usize, RegridError> {
    if value < 1 || value as usize > max {
        return Err(RegridError::IndexOutOfRange {
            axis,
            record,
            value: i64::from(value),
            max,
        });
    }
    Ok(value as usize - 1)
}
