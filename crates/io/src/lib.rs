//! # mecgrid-io
//!
//! NetCDF input and output for `mecgrid-regrid`: reads CLM vector history
//! variables with their record index, elevation-class fractions and
//! topography from coupler or surface-dataset files, and writes gridded
//! results with CF-style metadata.

mod coupler;
mod error;
mod fraction;
mod netcdf_read;
mod reader;
mod topography;
mod validate;
mod writer;

pub use coupler::CouplerConfig;
pub use error::IoError;
pub use fraction::{SURFDAT_FRACTION_VAR, read_fraction_coupler, read_fraction_surfdat};
pub use reader::{ReaderConfig, read_vector_variable};
pub use topography::{
    DEFAULT_TOPOGRAPHY_VAR, read_elevation_2d, read_topography_coupler, read_topography_history,
};
pub use writer::{FILL_VALUE_F32, WriterConfig, write_gridded_2d, write_gridded_3d};
