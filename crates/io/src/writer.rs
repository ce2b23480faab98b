//! NetCDF output of gridded fields.

use std::path::Path;

use chrono::Utc;
use mecgrid_regrid::{Gridded2d, Gridded3d, LevelAxis, VectorVariable};
use tracing::info;

use crate::error::IoError;
use crate::validate::ValidationCollector;

/// NetCDF default fill value for `f32` variables.
pub const FILL_VALUE_F32: f32 = 9.969_21e36;

const VERTICAL_LEVELS_CLASSES: &str =
    "no vertical interpolation was applied; MEC elevation is variable across grid cells";
const VERTICAL_LEVELS_HEIGHTS: &str = "interpolated to user-specified heights";

/// Global metadata written to every output file.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Global `title` attribute.
    title: String,
    /// Input the output was derived from, recorded in `history`.
    source: Option<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            title: "CESM/CLM glacier elevation class output regridded to lat/lon".into(),
            source: None,
        }
    }
}

impl WriterConfig {
    /// Sets the global title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the input recorded in the history attribute.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if the title is empty.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut c = ValidationCollector::new();
        c.require_name("title", &self.title);
        c.finish()
    }

    fn history(&self) -> String {
        let now = Utc::now().format("%a %b %d %Y %H:%M:%S UTC");
        match &self.source {
            Some(source) => format!("mecgrid was applied to {source} on {now}"),
            None => format!("created by mecgrid on {now}"),
        }
    }
}

/// Write a `(time, lat, lon)` field as `variable(time, latitude, longitude)`.
///
/// Grid axes, time axis, units and long name are taken from `variable`.
/// Invalid cells are written as [`FILL_VALUE_F32`].
///
/// # Errors
///
/// Returns [`IoError::DimensionMismatch`] if the field does not match the
/// variable's time axis or grid, or [`IoError::Netcdf`] if writing fails.
pub fn write_gridded_2d(
    path: &Path,
    field: &Gridded2d,
    variable: &VectorVariable,
    config: &WriterConfig,
) -> Result<(), IoError> {
    config.validate()?;
    let (ntime, nlat, nlon) = field.dim();
    check_layout(variable, ntime, (nlat, nlon))?;

    let mut file = netcdf::create(path)?;
    write_header(&mut file, variable, config)?;

    let data: Vec<f32> = field
        .to_filled(f64::from(FILL_VALUE_F32))
        .iter()
        .map(|&v| v as f32)
        .collect();
    write_data(&mut file, variable, &["time", "latitude", "longitude"], &data)?;

    info!(path = %path.display(), variable = %variable.meta().name, "wrote 2-D field");
    Ok(())
}

/// Write a `(time, lat, lon, level)` field as
/// `variable(time, lev, latitude, longitude)`.
///
/// `lev` holds the level numbers. Custom height levels are also written as
/// `elevation(lev)` in m, and the global `vertical_levels` attribute says
/// which kind of levels the file has.
///
/// # Errors
///
/// Returns [`IoError::DimensionMismatch`] if the field does not match the
/// variable's time axis or grid, or [`IoError::Netcdf`] if writing fails.
pub fn write_gridded_3d(
    path: &Path,
    field: &Gridded3d,
    variable: &VectorVariable,
    config: &WriterConfig,
) -> Result<(), IoError> {
    config.validate()?;
    let (ntime, nlat, nlon, nlev) = field.dim();
    check_layout(variable, ntime, (nlat, nlon))?;

    let mut file = netcdf::create(path)?;
    write_header(&mut file, variable, config)?;

    file.add_dimension("lev", nlev)?;
    {
        let levels: Vec<i32> = (0..nlev).map(|l| l as i32).collect();
        let mut lev = file.add_variable::<i32>("lev", &["lev"])?;
        lev.put_attribute("units", "MEC level number")?;
        lev.put_values(&levels, ..)?;
    }
    match field.levels() {
        LevelAxis::ElevationClasses => {
            file.add_attribute("vertical_levels", VERTICAL_LEVELS_CLASSES)?;
        }
        LevelAxis::Heights(heights) => {
            file.add_attribute("vertical_levels", VERTICAL_LEVELS_HEIGHTS)?;
            let heights: Vec<f32> = heights.iter().map(|&h| h as f32).collect();
            let mut elevation = file.add_variable::<f32>("elevation", &["lev"])?;
            elevation.put_attribute("units", "m")?;
            elevation.put_values(&heights, ..)?;
        }
    }

    // (time, lat, lon, lev) -> (time, lev, lat, lon); iter() follows the
    // permuted logical order.
    let data: Vec<f32> = field
        .to_filled(f64::from(FILL_VALUE_F32))
        .permuted_axes([0, 3, 1, 2])
        .iter()
        .map(|&v| v as f32)
        .collect();
    write_data(
        &mut file,
        variable,
        &["time", "lev", "latitude", "longitude"],
        &data,
    )?;

    info!(
        path = %path.display(),
        variable = %variable.meta().name,
        nlev,
        "wrote 3-D field"
    );
    Ok(())
}

fn check_layout(
    variable: &VectorVariable,
    ntime: usize,
    grid_shape: (usize, usize),
) -> Result<(), IoError> {
    let nt = variable.time().values.len();
    if nt != ntime {
        return Err(IoError::DimensionMismatch {
            name: "time".to_string(),
            expected: nt,
            got: ntime,
        });
    }
    variable.grid().check_shape("output field", grid_shape)?;
    Ok(())
}

/// Dimensions, coordinate variables and global attributes shared by both
/// layouts.
fn write_header(
    file: &mut netcdf::FileMut,
    variable: &VectorVariable,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let grid = variable.grid();
    let time = variable.time();

    file.add_attribute("title", config.title.as_str())?;
    file.add_attribute("history", config.history().as_str())?;
    file.add_attribute(
        "creation_date",
        Utc::now().format("%Y-%m-%d %H:%M:%S").to_string().as_str(),
    )?;

    file.add_dimension("time", time.values.len())?;
    file.add_dimension("latitude", grid.nlat())?;
    file.add_dimension("longitude", grid.nlon())?;

    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("long_name", "time")?;
        if !time.units.is_empty() {
            var.put_attribute("units", time.units.as_str())?;
        }
        var.put_values(&time.values, ..)?;
    }
    {
        let lats: Vec<f32> = grid.lats().iter().map(|&v| v as f32).collect();
        let mut var = file.add_variable::<f32>("latitude", &["latitude"])?;
        var.put_attribute("long_name", "latitude")?;
        var.put_attribute("units", "degrees_north")?;
        var.put_values(&lats, ..)?;
    }
    {
        let lons: Vec<f32> = grid.lons().iter().map(|&v| v as f32).collect();
        let mut var = file.add_variable::<f32>("longitude", &["longitude"])?;
        var.put_attribute("long_name", "longitude")?;
        var.put_attribute("units", "degrees_east")?;
        var.put_values(&lons, ..)?;
    }
    Ok(())
}

fn write_data(
    file: &mut netcdf::FileMut,
    variable: &VectorVariable,
    dims: &[&str],
    data: &[f32],
) -> Result<(), IoError> {
    let meta = variable.meta();
    let mut var = file.add_variable::<f32>(&meta.name, dims)?;
    var.put_attribute("_FillValue", FILL_VALUE_F32)?;
    var.put_attribute("units", meta.units.as_str())?;
    var.put_attribute("long_name", meta.long_name.as_str())?;
    var.put_values(data, ..)?;
    Ok(())
}
