//! Grid2d command: area-weighted collapse over elevation classes.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use mecgrid_io::write_gridded_2d;

use crate::cli::Grid2dArgs;
use crate::convert;
use crate::inputs;

/// Read, collapse and write one variable.
pub fn run(args: Grid2dArgs) -> Result<()> {
    let _cmd = info_span!("grid2d").entered();
    let config = inputs::load_config(&args.common)?;
    let output = inputs::output_path(args.output.as_deref(), &config)?;
    let collapse_cfg = convert::build_collapse_config(&config.collapse);
    let writer_cfg = convert::build_writer_config(&config.output)?;

    let loaded = inputs::load_variable(&config)?;
    let loaded = inputs::attach_fraction(loaded, &config)?;
    let writer_cfg = writer_cfg.with_source(inputs::source_name(&loaded.input));

    let field = loaded
        .state
        .gridded_2d(&loaded.scatter, &collapse_cfg)
        .context("failed to collapse elevation classes")?;
    info!(valid = field.count_valid(), "collapsed to 2-D");

    write_gridded_2d(&output, &field, loaded.state.variable(), &writer_cfg)
        .with_context(|| format!("failed to write NetCDF: {}", output.display()))?;
    info!(path = %output.display(), "done");
    Ok(())
}
