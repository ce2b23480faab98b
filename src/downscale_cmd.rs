//! Downscale command: interpolate the class field to a target topography.

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use mecgrid_io::{read_elevation_2d, write_gridded_2d};
use mecgrid_regrid::downscale_to_elevation;

use crate::cli::DownscaleArgs;
use crate::convert;
use crate::inputs;

/// Read the variable and its class heights, then evaluate each grid point at
/// the target elevation.
pub fn run(args: DownscaleArgs) -> Result<()> {
    let _cmd = info_span!("downscale").entered();
    let config = inputs::load_config(&args.common)?;
    let section = config
        .downscale
        .as_ref()
        .ok_or_else(|| anyhow!("no target topography: add a [downscale] section to the config"))?;
    let downscale_cfg = convert::build_downscale_config(section)?;
    let output = inputs::output_path(args.output.as_deref(), &config)?;
    let writer_cfg = convert::build_writer_config(&config.output)?;

    let loaded = inputs::load_variable(&config)?;
    let loaded = inputs::attach_topography(loaded, &config)?;
    let writer_cfg = writer_cfg.with_source(inputs::source_name(&loaded.input));
    let variable = loaded.state.variable();

    let elevation = read_elevation_2d(&section.path, &section.variable, variable.grid())
        .with_context(|| format!("failed to read elevation from {}", section.path.display()))?;

    let field = loaded
        .state
        .gridded_3d(&loaded.scatter)
        .context("failed to grid elevation classes")?;
    let downscaled = downscale_to_elevation(
        &field,
        loaded.state.topography(),
        &elevation,
        &downscale_cfg,
    )
    .context("failed to downscale to target elevation")?;
    info!(valid = downscaled.count_valid(), "downscaled");

    write_gridded_2d(&output, &downscaled, variable, &writer_cfg)
        .with_context(|| format!("failed to write NetCDF: {}", output.display()))?;
    info!(path = %output.display(), "done");
    Ok(())
}
