use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mecgrid: regrid CLM multiple-elevation-class vector output.
#[derive(Parser)]
#[command(
    name = "mecgrid",
    version,
    about = "Regrid CLM multiple-elevation-class vector output onto lat/lon/elevation grids"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Collapse elevation classes to an area-weighted 2-D field.
    Grid2d(Grid2dArgs),
    /// Write the per-class field, or interpolate it to custom heights.
    Grid3d(Grid3dArgs),
    /// Print regional mean and spread per elevation class.
    Profile(ProfileArgs),
    /// Interpolate the per-class field to a 2-D target topography.
    Downscale(DownscaleArgs),
}

/// Input and output overrides shared by every subcommand.
#[derive(clap::Args)]
pub struct CommonArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "mecgrid.toml")]
    pub config: PathBuf,

    /// Override the vector history file from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the variable name from config.
    #[arg(long)]
    pub variable: Option<String>,
}

/// Arguments for the `grid2d` subcommand.
#[derive(clap::Args)]
pub struct Grid2dArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override output NetCDF path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `grid3d` subcommand.
#[derive(clap::Args)]
pub struct Grid3dArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override output NetCDF path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target heights in m, comma separated; overrides `[levels]`.
    #[arg(long, value_delimiter = ',')]
    pub levels: Option<Vec<f64>>,
}

/// Arguments for the `profile` subcommand.
#[derive(clap::Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the time step from config.
    #[arg(short, long)]
    pub time: Option<usize>,
}

/// Arguments for the `downscale` subcommand.
#[derive(clap::Args)]
pub struct DownscaleArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override output NetCDF path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
