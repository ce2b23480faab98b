//! Error types for mecgrid-regrid.

/// Error type for all fallible operations in the mecgrid-regrid crate.
///
/// Every variant aborts the current top-level operation. A grid point
/// without any valid elevation class is not an error: it stays masked.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegridError {
    /// Returned when the variable kind is not recognised or the data rank
    /// does not fit the kind.
    #[error("unsupported variable kind '{kind}': {reason}")]
    UnsupportedVariableKind {
        /// Kind discriminator (name of the variable's last dimension).
        kind: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the per-record index and type variables are absent.
    #[error(
        "grid metadata for '{variable}' is missing ({missing}); supply a grid-info file that still carries the *1d_ixy, *1d_jxy and *1d_itype_* variables"
    )]
    MissingGridMetadata {
        /// Variable whose records cannot be located.
        variable: String,
        /// Names of the missing companion variables.
        missing: String,
    },

    /// Returned when an operation needs a field that has not been attached.
    #[error("{operation} requires a {field} field, none has been set")]
    PreconditionNotSet {
        /// Missing field (`"fraction"` or `"topography"`).
        field: &'static str,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Returned when an array does not match the expected shape.
    #[error("shape mismatch for {name}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// What was being checked.
        name: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Returned when a record's 1-based grid index lies outside the grid.
    #[error("{axis} index {value} of record {record} is outside 1..={max}")]
    IndexOutOfRange {
        /// Axis name (`"ixy"` or `"jxy"`).
        axis: &'static str,
        /// Record number (0-based).
        record: usize,
        /// Offending 1-based index.
        value: i64,
        /// Axis length.
        max: usize,
    },

    /// Returned when parallel per-record arrays differ in length.
    #[error("length mismatch: {name} has {got} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the offending array.
        name: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when two records target the same grid point and class.
    #[error("records {first} and {second} both map to lat {iy}, lon {ix}, class {class}")]
    DuplicateRecord {
        /// Record that was placed first.
        first: usize,
        /// Record that collided with it.
        second: usize,
        /// Latitude index (0-based).
        iy: usize,
        /// Longitude index (0-based).
        ix: usize,
        /// Elevation class (1-based).
        class: usize,
    },

    /// Returned when target elevations are empty or not finite.
    #[error("invalid target levels: {reason}")]
    InvalidLevels {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when regional bounds are not finite or inverted.
    #[error("invalid region: {reason}")]
    InvalidRegion {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a grid axis has no points.
    #[error("grid axis '{axis}' is empty")]
    EmptyGrid {
        /// Axis name.
        axis: &'static str,
    },

    /// Returned when a time index is past the end of the time axis.
    #[error("time index {index} out of range for {ntime} time steps")]
    TimeOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of time steps.
        ntime: usize,
    },

    /// Wraps an ndarray shape error.
    #[error("array shape error: {reason}")]
    Shape {
        /// Description of the underlying failure.
        reason: String,
    },
}

impl From<ndarray::ShapeError> for RegridError {
    fn from(e: ndarray::ShapeError) -> Self {
        RegridError::Shape {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_precondition_not_set() {
        let err = RegridError::PreconditionNotSet {
            field: "fraction",
            operation: "gridded 2-D collapse",
        };
        assert_eq!(
            err.to_string(),
            "gridded 2-D collapse requires a fraction field, none has been set"
        );
    }

    #[test]
    fn display_shape_mismatch() {
        let err = RegridError::ShapeMismatch {
            name: "divisor".to_string(),
            expected: vec![192, 288],
            got: vec![96, 144],
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch for divisor: expected [192, 288], got [96, 144]"
        );
    }

    #[test]
    fn display_missing_grid_metadata_names_fallback() {
        let err = RegridError::MissingGridMetadata {
            variable: "QICE".to_string(),
            missing: "cols1d_ixy".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("QICE"));
        assert!(msg.contains("grid-info file"));
    }

    #[test]
    fn display_index_out_of_range() {
        let err = RegridError::IndexOutOfRange {
            axis: "jxy",
            record: 7,
            value: 193,
            max: 192,
        };
        assert_eq!(
            err.to_string(),
            "jxy index 193 of record 7 is outside 1..=192"
        );
    }

    #[test]
    fn display_duplicate_record() {
        let err = RegridError::DuplicateRecord {
            first: 3,
            second: 9,
            iy: 1,
            ix: 2,
            class: 4,
        };
        assert_eq!(
            err.to_string(),
            "records 3 and 9 both map to lat 1, lon 2, class 4"
        );
    }

    #[test]
    fn from_shape_error() {
        let shape_err = ndarray::Array2::<f64>::from_shape_vec((2, 2), vec![1.0]).unwrap_err();
        let err: RegridError = shape_err.into();
        assert!(matches!(err, RegridError::Shape { .. }));
    }

    #[test]
    fn error_is_send_sync_and_std_error() {
        fn assert_bounds<T: Send + Sync + std::error::Error>() {}
        assert_bounds::<RegridError>();
    }
}
