//! Low-level NetCDF extraction helpers.

use std::path::Path;

use mecgrid_regrid::GridDescriptor;
use ndarray::{Array2, ArrayD, IxDyn};
use netcdf::AttributeValue;
use tracing::warn;

use crate::error::IoError;

/// Open a NetCDF file at `path`, returning [`IoError::FileNotFound`] if the
/// path does not exist on disk.
pub(crate) fn open_file(path: &Path) -> Result<netcdf::File, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(netcdf::open(path)?)
}

fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<netcdf::Variable<'f>, IoError> {
    file.variable(name).ok_or_else(|| IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read a 1-D `f64` variable, trying each alias in order.
///
/// Returns the data from the first alias that matches. If none match,
/// returns [`IoError::MissingVariable`] with the first alias as the name.
pub(crate) fn read_1d_f64(
    file: &netcdf::File,
    aliases: &[&str],
    path: &Path,
) -> Result<Vec<f64>, IoError> {
    for &alias in aliases {
        if let Some(var) = file.variable(alias) {
            return Ok(var.get_values::<f64, _>(..)?);
        }
    }

    let name = aliases.first().copied().unwrap_or("unknown");
    Err(IoError::MissingVariable {
        name: name.to_string(),
        path: path.to_path_buf(),
    })
}

/// Read an integer variable, or `None` if it is absent.
pub(crate) fn read_i32_opt(file: &netcdf::File, name: &str) -> Result<Option<Vec<i32>>, IoError> {
    match file.variable(name) {
        Some(var) => Ok(Some(var.get_values::<i32, _>(..)?)),
        None => Ok(None),
    }
}

/// Read a variable of any rank as `f64`, with its dimension names.
pub(crate) fn read_nd_f64(
    file: &netcdf::File,
    name: &str,
    path: &Path,
) -> Result<(ArrayD<f64>, Vec<String>), IoError> {
    let var = variable(file, name, path)?;
    let dims = var.dimensions();
    let shape: Vec<usize> = dims.iter().map(|d| d.len()).collect();
    let names: Vec<String> = dims.iter().map(|d| d.name()).collect();
    let values = var.get_values::<f64, _>(..)?;
    Ok((ArrayD::from_shape_vec(IxDyn(&shape), values)?, names))
}

/// Read a field that covers the grid once, reshaped to `(nlat, nlon)`.
///
/// Accepts 2-D `(lat, lon)` storage as well as the flat `(n)` layout of
/// coupler files. Leading axes (typically a single time step) are dropped by
/// taking the first slice; a warning is logged if more than one is present.
pub(crate) fn read_grid_slice(
    file: &netcdf::File,
    name: &str,
    grid: &GridDescriptor,
    path: &Path,
) -> Result<Array2<f64>, IoError> {
    let var = variable(file, name, path)?;
    let values = var.get_values::<f64, _>(..)?;
    let (nlat, nlon) = grid.shape();
    let n = nlat * nlon;

    if values.len() < n || values.len() % n != 0 {
        return Err(IoError::DimensionMismatch {
            name: name.to_string(),
            expected: n,
            got: values.len(),
        });
    }
    if values.len() > n {
        warn!(
            variable = name,
            slices = values.len() / n,
            "using the first of several grid slices"
        );
    }

    let first = values.into_iter().take(n).collect();
    Ok(Array2::from_shape_vec((nlat, nlon), first)?)
}

/// Read an optional string attribute of a variable.
///
/// # Errors
///
/// Returns [`IoError::InvalidAttribute`] if the attribute exists but is not
/// text.
pub(crate) fn read_string_attribute(
    var: &netcdf::Variable<'_>,
    variable: &str,
    name: &str,
) -> Result<Option<String>, IoError> {
    match var.attribute_value(name) {
        None => Ok(None),
        Some(value) => match value? {
            AttributeValue::Str(s) => Ok(Some(s)),
            _ => Err(IoError::InvalidAttribute {
                variable: variable.to_string(),
                name: name.to_string(),
                expected: "a string",
            }),
        },
    }
}

/// Read the `units` attribute of a variable, if present.
pub(crate) fn read_units(
    file: &netcdf::File,
    name: &str,
    path: &Path,
) -> Result<Option<String>, IoError> {
    let var = variable(file, name, path)?;
    read_string_attribute(&var, name, "units")
}

/// Read the long name and units of a variable.
pub(crate) fn read_meta(
    file: &netcdf::File,
    name: &str,
    path: &Path,
) -> Result<(Option<String>, Option<String>), IoError> {
    let var = variable(file, name, path)?;
    Ok((
        read_string_attribute(&var, name, "long_name")?,
        read_string_attribute(&var, name, "units")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn grid() -> GridDescriptor {
        GridDescriptor::new(vec![0.0, 1.0], vec![0.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn open_missing_file() {
        let err = open_file(Path::new("/nonexistent/file.nc")).unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn grid_slice_from_flat_and_timed_storage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cpl.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("time", 2).unwrap();
            file.add_dimension("n", 6).unwrap();
            let mut flat = file.add_variable::<f64>("flat", &["n"]).unwrap();
            flat.put_values(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], ..).unwrap();
            let mut timed = file.add_variable::<f64>("timed", &["time", "n"]).unwrap();
            let values: Vec<f64> = (0..12).map(f64::from).collect();
            timed.put_values(&values, ..).unwrap();
            let mut short = file.add_variable::<f64>("short", &["time"]).unwrap();
            short.put_values(&[1.0, 2.0], ..).unwrap();
        }

        let file = open_file(&path).unwrap();
        let flat = read_grid_slice(&file, "flat", &grid(), &path).unwrap();
        assert_eq!(flat.dim(), (2, 3));
        assert_eq!(flat[[1, 0]], 3.0);

        let timed = read_grid_slice(&file, "timed", &grid(), &path).unwrap();
        assert_eq!(timed[[1, 2]], 5.0);

        let err = read_grid_slice(&file, "short", &grid(), &path).unwrap_err();
        assert!(matches!(err, IoError::DimensionMismatch { expected: 6, got: 2, .. }));
    }

    #[test]
    fn string_attribute_type_checked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("attrs.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("x", 1).unwrap();
            let mut var = file.add_variable::<f64>("v", &["x"]).unwrap();
            var.put_attribute("units", "m").unwrap();
            var.put_attribute("long_name", 3.0f64).unwrap();
        }

        let file = open_file(&path).unwrap();
        assert_eq!(read_units(&file, "v", &path).unwrap().as_deref(), Some("m"));
        let err = read_meta(&file, "v", &path).unwrap_err();
        assert!(matches!(err, IoError::InvalidAttribute { .. }));
    }
}
