//! Reading CLM vector history files into [`VectorVariable`]s.

use std::path::{Path, PathBuf};

use mecgrid_regrid::{
    GridDescriptor, GridIndex, RegridError, SeriesData, TimeAxis, VariableKind, VariableMeta,
    VectorVariable,
};
use ndarray::{ArrayD, Axis, Ix2, Ix3};
use tracing::{debug, info, warn};

use crate::error::IoError;
use crate::netcdf_read;
use crate::validate::ValidationCollector;

// ---------------------------------------------------------------------------
// ReaderConfig
// ---------------------------------------------------------------------------

/// Configuration for reading vector variables from CLM history files.
///
/// The [`Default`] implementation matches CLM `h1`/`h2` vector output: the
/// grid axes are `lat`/`lon`, the time axis is `time`, and snow-pack
/// variables (`SNO_*`) plus soil temperature (`TSOI`) are layered.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Secondary file holding the grid axes and `*1d_*` index variables.
    grid_info: Option<PathBuf>,
    /// Name prefixes of layered variables, reduced to their top layer.
    layered_prefixes: Vec<String>,
    /// Exact names of layered variables, reduced to their top layer.
    layered_names: Vec<String>,
    /// Aliases to try when looking up latitude coordinates.
    lat_aliases: Vec<String>,
    /// Aliases to try when looking up longitude coordinates.
    lon_aliases: Vec<String>,
    /// NetCDF variable name for the time axis.
    time_var: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            grid_info: None,
            layered_prefixes: vec!["SNO_".into()],
            layered_names: vec!["TSOI".into()],
            lat_aliases: vec!["lat".into(), "latitude".into(), "lsmlat".into()],
            lon_aliases: vec!["lon".into(), "longitude".into(), "lsmlon".into()],
            time_var: "time".into(),
        }
    }
}

impl ReaderConfig {
    /// Read grid metadata from `path` when the vector file lacks it.
    pub fn with_grid_info(mut self, path: impl Into<PathBuf>) -> Self {
        self.grid_info = Some(path.into());
        self
    }

    /// Set the name prefixes of layered variables.
    pub fn with_layered_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.layered_prefixes = prefixes;
        self
    }

    /// Set the exact names of layered variables.
    pub fn with_layered_names(mut self, names: Vec<String>) -> Self {
        self.layered_names = names;
        self
    }

    /// Set the latitude coordinate aliases, tried in order.
    pub fn with_lat_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lat_aliases = aliases;
        self
    }

    /// Set the longitude coordinate aliases, tried in order.
    pub fn with_lon_aliases(mut self, aliases: Vec<String>) -> Self {
        self.lon_aliases = aliases;
        self
    }

    /// Set the time variable name.
    pub fn with_time_var(mut self, name: impl Into<String>) -> Self {
        self.time_var = name.into();
        self
    }

    /// Secondary grid-info file, if configured.
    pub fn grid_info(&self) -> Option<&Path> {
        self.grid_info.as_deref()
    }

    /// Whether `name` is a layered variable whose top layer is kept.
    pub fn is_layered(&self, name: &str) -> bool {
        self.layered_prefixes.iter().any(|p| name.starts_with(p.as_str()))
            || self.layered_names.iter().any(|n| n == name)
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every empty name or alias
    /// list.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut c = ValidationCollector::new();
        c.require_name("time_var", &self.time_var);
        c.require_names("lat_aliases", &self.lat_aliases);
        c.require_names("lon_aliases", &self.lon_aliases);
        if self.layered_prefixes.iter().any(|p| p.is_empty()) {
            c.push("layered_prefixes contains an empty prefix");
        }
        c.finish()
    }

    fn lat_refs(&self) -> Vec<&str> {
        self.lat_aliases.iter().map(String::as_str).collect()
    }

    fn lon_refs(&self) -> Vec<&str> {
        self.lon_aliases.iter().map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// read_vector_variable
// ---------------------------------------------------------------------------

/// Read one variable from a CLM vector history file.
///
/// The layout is taken from the variable's last dimension: `column` and
/// `pft` variables are read as `(time, record)` together with their
/// `cols1d_*` / `pfts1d_*` index variables, `lon` variables as
/// `(time, lat, lon)`. Layered variables (see [`ReaderConfig::is_layered`])
/// keep layer 0 of their second dimension. A variable without a time
/// dimension is read as a single step.
///
/// The grid axes and index variables are taken from the vector file and,
/// where absent, from the configured grid-info file.
///
/// # Errors
///
/// - [`IoError::FileNotFound`] / [`IoError::MissingVariable`] for absent
///   inputs.
/// - [`IoError::MissingGridMetadata`] if no searched file carries the index
///   variables.
/// - [`IoError::Regrid`] for an unsupported kind or rank, indices outside the
///   grid, or inconsistent lengths.
pub fn read_vector_variable(
    path: &Path,
    name: &str,
    config: &ReaderConfig,
) -> Result<VectorVariable, IoError> {
    config.validate()?;

    let file = netcdf_read::open_file(path)?;
    let secondary = config
        .grid_info
        .as_deref()
        .map(|p| netcdf_read::open_file(p).map(|f| (f, p)))
        .transpose()?;

    // -- Data and layout ------------------------------------------------------

    let (raw, dims) = netcdf_read::read_nd_f64(&file, name, path)?;
    let Some(last) = dims.last() else {
        return Err(RegridError::UnsupportedVariableKind {
            kind: "scalar".to_string(),
            reason: format!("'{name}' has no dimensions"),
        }
        .into());
    };
    let kind = VariableKind::from_dimension(last)?;
    let has_time = dims.first() == Some(&config.time_var);
    let raw = reduce_layers(name, raw, config)?;
    let data = into_series(name, raw, kind, has_time)?;
    info!(variable = name, kind = kind.as_str(), ntime = data.ntime(), "read variable");

    // -- Metadata -------------------------------------------------------------

    let (long_name, units) = netcdf_read::read_meta(&file, name, path)?;
    let mut meta = VariableMeta::new(name).with_long_name(long_name.unwrap_or_default());
    if let Some(units) = units {
        meta = meta.with_units(units);
    }
    let time = read_time(&file, path, config, has_time)?;

    // -- Grid and record index ------------------------------------------------

    let grid = read_grid(&file, path, secondary.as_ref(), config)?;
    let index = match kind.index_prefix() {
        Some(prefix) => Some(read_index(
            &file,
            path,
            secondary.as_ref(),
            name,
            prefix,
            &grid,
        )?),
        None => None,
    };

    Ok(VectorVariable::new(meta, time, data, kind, grid, index)?)
}

/// Keep layer 0 of the second dimension of layered variables.
fn reduce_layers(name: &str, raw: ArrayD<f64>, config: &ReaderConfig) -> Result<ArrayD<f64>, IoError> {
    if !config.is_layered(name) {
        return Ok(raw);
    }
    if raw.ndim() < 3 {
        return Err(RegridError::UnsupportedVariableKind {
            kind: "layered".to_string(),
            reason: format!("'{name}' has rank {}, expected a layer dimension", raw.ndim()),
        }
        .into());
    }
    debug!(variable = name, layers = raw.len_of(Axis(1)), "keeping top layer");
    Ok(raw.index_axis_move(Axis(1), 0))
}

fn into_series(
    name: &str,
    mut raw: ArrayD<f64>,
    kind: VariableKind,
    has_time: bool,
) -> Result<SeriesData, IoError> {
    if !has_time {
        raw.insert_axis_inplace(Axis(0));
    }
    let expected = kind.expected_rank();
    if raw.ndim() != expected {
        return Err(RegridError::UnsupportedVariableKind {
            kind: kind.as_str().to_string(),
            reason: format!(
                "'{name}' has rank {} after layer reduction, expected {expected}",
                raw.ndim()
            ),
        }
        .into());
    }
    Ok(match kind {
        VariableKind::Column | VariableKind::Pft => {
            SeriesData::Vector(raw.into_dimensionality::<Ix2>()?)
        }
        VariableKind::Structured => SeriesData::Structured(raw.into_dimensionality::<Ix3>()?),
    })
}

fn read_time(
    file: &netcdf::File,
    path: &Path,
    config: &ReaderConfig,
    has_time: bool,
) -> Result<TimeAxis, IoError> {
    let time_var = config.time_var.as_str();
    if file.variable(time_var).is_none() && !has_time {
        warn!(path = %path.display(), "no time variable; using a single step at 0");
        return Ok(TimeAxis {
            values: vec![0.0],
            units: String::new(),
        });
    }

    let mut values = netcdf_read::read_1d_f64(file, &[time_var], path)?;
    if !has_time {
        values.truncate(1);
    }
    let units = netcdf_read::read_units(file, time_var, path)?.unwrap_or_default();
    Ok(TimeAxis { values, units })
}

fn read_grid(
    file: &netcdf::File,
    path: &Path,
    secondary: Option<&(netcdf::File, &Path)>,
    config: &ReaderConfig,
) -> Result<GridDescriptor, IoError> {
    let axes = |f: &netcdf::File, p: &Path| -> Result<(Vec<f64>, Vec<f64>), IoError> {
        let lats = netcdf_read::read_1d_f64(f, &config.lat_refs(), p)?;
        let lons = netcdf_read::read_1d_f64(f, &config.lon_refs(), p)?;
        Ok((lats, lons))
    };

    let (lats, lons) = match (axes(file, path), secondary) {
        (Ok(axes), _) => axes,
        (Err(IoError::MissingVariable { name, .. }), Some((f, p))) => {
            debug!(missing = %name, grid_info = %p.display(), "reading grid axes from grid-info file");
            axes(f, p)?
        }
        (Err(e), _) => return Err(e),
    };
    Ok(GridDescriptor::new(lats, lons)?)
}

fn read_index(
    file: &netcdf::File,
    path: &Path,
    secondary: Option<&(netcdf::File, &Path)>,
    variable: &str,
    prefix: &str,
    grid: &GridDescriptor,
) -> Result<GridIndex, IoError> {
    let names = ["ixy", "jxy", "itype_col", "itype_lunit"].map(|s| format!("{prefix}_{s}"));

    let mut searched = vec![path.to_path_buf()];
    let mut found = read_index_arrays(file, &names)?;
    if found.is_err()
        && let Some((f, p)) = secondary
    {
        debug!(variable, grid_info = %p.display(), "reading record index from grid-info file");
        searched.push(p.to_path_buf());
        found = read_index_arrays(f, &names)?;
    }

    match found {
        Ok([ixy, jxy, itype_col, itype_lunit]) => {
            Ok(GridIndex::from_one_based(&ixy, &jxy, &itype_col, &itype_lunit, grid)?)
        }
        Err(missing) => Err(IoError::MissingGridMetadata {
            variable: variable.to_string(),
            missing: missing.join(", "),
            searched,
        }),
    }
}

/// The four index arrays, or the names of those that are absent.
fn read_index_arrays(
    file: &netcdf::File,
    names: &[String; 4],
) -> Result<Result<[Vec<i32>; 4], Vec<String>>, IoError> {
    let mut arrays = Vec::with_capacity(4);
    let mut missing = Vec::new();
    for name in names {
        match netcdf_read::read_i32_opt(file, name)? {
            Some(a) => arrays.push(a),
            None => missing.push(name.clone()),
        }
    }
    if !missing.is_empty() {
        return Ok(Err(missing));
    }
    Ok(arrays.try_into().map_err(|_| names.to_vec()))
}
