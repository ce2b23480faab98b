//! Profile command: regional statistics per elevation class.

use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use mecgrid_regrid::{ClassProfile, default_bin_centres, regional_profile};

use crate::cli::ProfileArgs;
use crate::convert;
use crate::inputs;

/// Print mean, standard deviation and cell count per class as a table.
pub fn run(args: ProfileArgs) -> Result<()> {
    let _cmd = info_span!("profile").entered();
    let config = inputs::load_config(&args.common)?;
    let section = config
        .profile
        .as_ref()
        .ok_or_else(|| anyhow!("no region: add a [profile] section to the config"))?;
    let bounds = convert::build_region_bounds(section)?;
    let time = args.time.unwrap_or(section.time);

    let loaded = inputs::load_variable(&config)?;
    let loaded = inputs::attach_fraction(loaded, &config)?;
    let fraction = loaded
        .state
        .fraction()
        .ok_or_else(|| anyhow!("fraction was not attached"))?;

    let field = loaded
        .state
        .gridded_3d(&loaded.scatter)
        .context("failed to grid elevation classes")?;
    let grid = loaded.state.variable().grid();
    let profiles = regional_profile(&field, fraction, grid, time, &bounds)
        .context("failed to compute regional profile")?;
    info!(time, "computed regional profile");

    let units = &loaded.state.variable().meta().units;
    write_table(&mut io::stdout().lock(), &profiles, units).context("failed to print profile")?;
    Ok(())
}

fn write_table(out: &mut impl Write, profiles: &[ClassProfile], units: &str) -> io::Result<()> {
    let centres = default_bin_centres();
    writeln!(out, "class\tcentre_m\tmean_{units}\tstd\tcount")?;
    for (p, centre) in profiles.iter().zip(centres) {
        let fmt = |v: Option<f64>| v.map_or_else(|| "nan".to_string(), |v| format!("{v:.4}"));
        writeln!(
            out,
            "{}\t{centre:.0}\t{}\t{}\t{}",
            p.class,
            fmt(p.mean),
            fmt(p.std),
            p.count
        )?;
    }
    Ok(())
}
