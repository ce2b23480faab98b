use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level mecgrid configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MecgridConfig {
    /// Vector history input.
    #[serde(default)]
    pub input: InputToml,

    /// Elevation-class area fractions.
    #[serde(default)]
    pub fraction: Option<FractionToml>,

    /// Elevation-class heights.
    #[serde(default)]
    pub topography: Option<TopographyToml>,

    /// Placement of records on the grid.
    #[serde(default)]
    pub scatter: ScatterToml,

    /// 2-D collapse settings.
    #[serde(default)]
    pub collapse: CollapseToml,

    /// Custom target heights.
    #[serde(default)]
    pub levels: LevelsToml,

    /// Regional profile settings.
    #[serde(default)]
    pub profile: Option<ProfileToml>,

    /// Target topography for downscaling.
    #[serde(default)]
    pub downscale: Option<DownscaleToml>,

    /// Output settings.
    #[serde(default)]
    pub output: OutputToml,
}

/// Read and parse a TOML configuration file.
pub fn load(path: &Path) -> Result<MecgridConfig> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct InputToml {
    pub vector: Option<PathBuf>,
    pub variable: Option<String>,
    pub grid_info: Option<PathBuf>,
    #[serde(default = "default_layered_prefixes")]
    pub layered_prefixes: Vec<String>,
    #[serde(default = "default_layered_names")]
    pub layered_names: Vec<String>,
    #[serde(default = "default_time_var")]
    pub time_var: String,
    /// Scalar applied to the data after reading, e.g. for unit conversion.
    pub factor: Option<f64>,
    /// Units after `factor` has been applied.
    pub units: Option<String>,
}

fn default_layered_prefixes() -> Vec<String> {
    vec!["SNO_".to_string()]
}
fn default_layered_names() -> Vec<String> {
    vec!["TSOI".to_string()]
}
fn default_time_var() -> String {
    "time".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FractionToml {
    /// `"coupler"` or `"surfdat"`.
    pub source: String,
    pub path: PathBuf,
    #[serde(default = "default_fraction_prefix")]
    pub prefix: String,
}

fn default_fraction_prefix() -> String {
    "x2lavg_Sg_ice_covered".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopographyToml {
    /// `"coupler"` or `"history"`.
    pub source: String,
    pub path: PathBuf,
    #[serde(default = "default_topography_prefix")]
    pub prefix: String,
    #[serde(default = "default_topography_var")]
    pub variable: String,
    #[serde(default)]
    pub time: usize,
}

fn default_topography_prefix() -> String {
    "x2l_Sg_topo".to_string()
}
fn default_topography_var() -> String {
    "TOPO_COL".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScatterToml {
    /// `"reject"` or `"last-wins"`.
    #[serde(default = "default_collisions")]
    pub collisions: String,
}

impl Default for ScatterToml {
    fn default() -> Self {
        Self {
            collisions: default_collisions(),
        }
    }
}

fn default_collisions() -> String {
    "reject".to_string()
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CollapseToml {
    #[serde(default)]
    pub min_valid: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LevelsToml {
    #[serde(default)]
    pub heights: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileToml {
    pub lat: [f64; 2],
    pub lon: [f64; 2],
    #[serde(default)]
    pub time: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownscaleToml {
    pub path: PathBuf,
    #[serde(default = "default_elevation_var")]
    pub variable: String,
    /// `"clamp"` or `"linear"`.
    #[serde(default = "default_extrapolation")]
    pub extrapolation: String,
}

fn default_elevation_var() -> String {
    "Elevation".to_string()
}
fn default_extrapolation() -> String {
    "clamp".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    pub path: Option<PathBuf>,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self {
            path: None,
            title: default_title(),
        }
    }
}

fn default_title() -> String {
    "CESM/CLM glacier elevation class output regridded to lat/lon".to_string()
}
