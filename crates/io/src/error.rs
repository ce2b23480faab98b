//! Error types for mecgrid-io.

use std::path::PathBuf;

use mecgrid_regrid::RegridError;

/// Error type for all fallible operations in the mecgrid-io crate.
///
/// Covers missing files and variables, NetCDF library failures, layout
/// problems in the inputs, and errors raised by the regridding core while
/// assembling the in-memory variable.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the NetCDF library.
    #[error("netcdf error: {reason}")]
    Netcdf {
        /// Description of the underlying NetCDF failure.
        reason: String,
    },

    /// Returned when a required variable is not present in a file.
    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a dimension has an unexpected size.
    #[error("dimension '{name}' mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the dimension or variable.
        name: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        got: usize,
    },

    /// Returned when the per-record index variables are in neither the
    /// vector file nor the grid-info file.
    #[error(
        "grid metadata for '{variable}' not found ({missing}) in {}; pass a grid-info file that still has them",
        searched.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    MissingGridMetadata {
        /// Variable whose records cannot be located.
        variable: String,
        /// Names of the missing index variables.
        missing: String,
        /// Files that were searched.
        searched: Vec<PathBuf>,
    },

    /// Returned when an attribute exists but has an unusable type.
    #[error("attribute '{name}' of '{variable}' is not {expected}")]
    InvalidAttribute {
        /// Variable carrying the attribute.
        variable: String,
        /// Attribute name.
        name: String,
        /// Expected type.
        expected: &'static str,
    },

    /// Returned when a configuration check fails.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Wraps an error from the regridding core.
    #[error(transparent)]
    Regrid(#[from] RegridError),
}

impl From<netcdf::Error> for IoError {
    fn from(e: netcdf::Error) -> Self {
        IoError::Netcdf {
            reason: e.to_string(),
        }
    }
}

impl From<ndarray::ShapeError> for IoError {
    fn from(e: ndarray::ShapeError) -> Self {
        IoError::Regrid(RegridError::from(e))
    }
}
