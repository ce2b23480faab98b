//! Input resolution shared by the subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use mecgrid_io::{
    read_fraction_coupler, read_fraction_surfdat, read_topography_coupler,
    read_topography_history, read_vector_variable,
};
use mecgrid_regrid::{ScatterConfig, VariableState};

use crate::cli::CommonArgs;
use crate::config::MecgridConfig;
use crate::convert::{self, FractionSource, TopographySource};

/// A variable read from disk together with the settings used to grid it.
pub struct Loaded {
    pub state: VariableState,
    pub scatter: ScatterConfig,
    pub input: PathBuf,
}

/// Load the config file and apply the shared CLI overrides.
pub fn load_config(args: &CommonArgs) -> Result<MecgridConfig> {
    let mut config = crate::config::load(&args.config)?;
    if let Some(ref input) = args.input {
        config.input.vector = Some(input.clone());
    }
    if let Some(ref variable) = args.variable {
        config.input.variable = Some(variable.clone());
    }
    Ok(config)
}

/// Read the configured variable and apply the optional unit conversion.
pub fn load_variable(config: &MecgridConfig) -> Result<Loaded> {
    let input = config
        .input
        .vector
        .clone()
        .ok_or_else(|| anyhow!("no input path: set [input].vector in config or use --input"))?;
    let name = config
        .input
        .variable
        .as_deref()
        .ok_or_else(|| anyhow!("no variable: set [input].variable in config or use --variable"))?;

    let reader_cfg = convert::build_reader_config(&config.input)?;
    let scatter = convert::build_scatter_config(&config.scatter)?;

    info!(path = %input.display(), variable = name, "reading vector variable");
    let mut variable = read_vector_variable(&input, name, &reader_cfg)
        .with_context(|| format!("failed to read {name} from {}", input.display()))?;

    if let Some(factor) = config.input.factor {
        info!(factor, units = ?config.input.units, "applying conversion factor");
        variable.apply_factor(factor, config.input.units.as_deref());
    }

    Ok(Loaded {
        state: VariableState::new(variable),
        scatter,
        input,
    })
}

/// Attach the configured elevation-class fractions.
pub fn attach_fraction(loaded: Loaded, config: &MecgridConfig) -> Result<Loaded> {
    let section = config
        .fraction
        .as_ref()
        .ok_or_else(|| anyhow!("no fraction source: add a [fraction] section to the config"))?;
    let grid = loaded.state.variable().grid().clone();
    let fraction = match convert::parse_fraction_source(&section.source)? {
        FractionSource::Coupler => {
            let coupler = convert::build_coupler_config(Some(section), None);
            read_fraction_coupler(&section.path, &grid, &coupler)
        }
        FractionSource::Surfdat => read_fraction_surfdat(&section.path, &grid),
    }
    .with_context(|| format!("failed to read fractions from {}", section.path.display()))?;

    Ok(Loaded {
        state: loaded.state.with_fraction(fraction)?,
        ..loaded
    })
}

/// Attach the configured elevation-class heights.
pub fn attach_topography(loaded: Loaded, config: &MecgridConfig) -> Result<Loaded> {
    let section = config.topography.as_ref().ok_or_else(|| {
        anyhow!("no topography source: add a [topography] section to the config")
    })?;
    let topography = match convert::parse_topography_source(&section.source)? {
        TopographySource::Coupler => {
            let grid = loaded.state.variable().grid().clone();
            let coupler = convert::build_coupler_config(None, Some(section));
            read_topography_coupler(&section.path, &grid, &coupler)
        }
        TopographySource::History => {
            let reader_cfg = convert::build_reader_config(&config.input)?;
            read_topography_history(
                &section.path,
                &section.variable,
                &reader_cfg,
                &loaded.scatter,
                section.time,
            )
        }
    }
    .with_context(|| format!("failed to read topography from {}", section.path.display()))?;

    Ok(Loaded {
        state: loaded.state.with_topography(topography)?,
        ..loaded
    })
}

/// Output path from the CLI, falling back to `[output].path`.
pub fn output_path(cli: Option<&Path>, config: &MecgridConfig) -> Result<PathBuf> {
    cli.map(Path::to_path_buf)
        .or_else(|| config.output.path.clone())
        .ok_or_else(|| anyhow!("no output path: set [output].path in config or use --output"))
}

/// File name of the input, for the output history.
pub fn source_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}
