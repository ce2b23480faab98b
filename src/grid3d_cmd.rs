//! Grid3d command: per-class field, or interpolation to custom heights.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use mecgrid_io::write_gridded_3d;

use crate::cli::Grid3dArgs;
use crate::convert;
use crate::inputs;

/// Read, grid and write one variable.
///
/// Without target heights the elevation classes are written as they are;
/// with heights (from `--levels` or `[levels]`) a topography source is
/// required and the field is interpolated per grid point.
pub fn run(args: Grid3dArgs) -> Result<()> {
    let _cmd = info_span!("grid3d").entered();
    let config = inputs::load_config(&args.common)?;
    let output = inputs::output_path(args.output.as_deref(), &config)?;
    let writer_cfg = convert::build_writer_config(&config.output)?;
    let levels = args.levels.or_else(|| config.levels.heights.clone());

    let loaded = inputs::load_variable(&config)?;
    let writer_cfg = writer_cfg.with_source(inputs::source_name(&loaded.input));

    let written = match levels {
        None => {
            let field = loaded
                .state
                .gridded_3d(&loaded.scatter)
                .context("failed to grid elevation classes")?;
            write_gridded_3d(&output, &field, loaded.state.variable(), &writer_cfg)
        }
        Some(levels) => {
            let loaded = inputs::attach_topography(loaded, &config)?;
            let result = loaded
                .state
                .gridded_3d_custom_levels(&loaded.scatter, &levels)
                .context("failed to interpolate to custom levels")?;
            let report = result.report();
            info!(
                active = report.active_points(),
                tundra_only = report.tundra_only_points(),
                "interpolated to custom levels"
            );
            write_gridded_3d(&output, result.field(), loaded.state.variable(), &writer_cfg)
        }
    };
    written.with_context(|| format!("failed to write NetCDF: {}", output.display()))?;
    info!(path = %output.display(), "done");
    Ok(())
}
