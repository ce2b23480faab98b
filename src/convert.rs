//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Result, bail};

use crate::config::*;

use mecgrid_io::{CouplerConfig, ReaderConfig, WriterConfig};
use mecgrid_regrid::{
    CollapseConfig, CollisionPolicy, DownscaleConfig, Extrapolation, RegionBounds, ScatterConfig,
};

/// Where elevation-class fractions are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionSource {
    /// Coupler history file, one field per class.
    Coupler,
    /// CLM surface dataset, percentages per ice-sheet class.
    Surfdat,
}

/// Where elevation-class heights are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopographySource {
    /// Coupler history file, one field per class.
    Coupler,
    /// Column height variable of a vector history file.
    History,
}

/// Parses a collision policy name string into the corresponding enum variant.
pub fn parse_collisions(s: &str) -> Result<CollisionPolicy> {
    match s.to_lowercase().as_str() {
        "reject" => Ok(CollisionPolicy::Reject),
        "last-wins" | "last_wins" => Ok(CollisionPolicy::LastWins),
        other => bail!("unknown collision policy: {other:?}"),
    }
}

/// Parses an extrapolation mode name string into the corresponding enum variant.
pub fn parse_extrapolation(s: &str) -> Result<Extrapolation> {
    match s.to_lowercase().as_str() {
        "clamp" => Ok(Extrapolation::Clamp),
        "linear" => Ok(Extrapolation::Linear),
        other => bail!("unknown extrapolation mode: {other:?}"),
    }
}

/// Parses a fraction source name.
pub fn parse_fraction_source(s: &str) -> Result<FractionSource> {
    match s.to_lowercase().as_str() {
        "coupler" | "cpl" => Ok(FractionSource::Coupler),
        "surfdat" => Ok(FractionSource::Surfdat),
        other => bail!("unknown fraction source: {other:?}"),
    }
}

/// Parses a topography source name.
pub fn parse_topography_source(s: &str) -> Result<TopographySource> {
    match s.to_lowercase().as_str() {
        "coupler" | "cpl" => Ok(TopographySource::Coupler),
        "history" => Ok(TopographySource::History),
        other => bail!("unknown topography source: {other:?}"),
    }
}

/// Builds a [`ReaderConfig`] from the TOML input configuration.
pub fn build_reader_config(input: &InputToml) -> Result<ReaderConfig> {
    let mut cfg = ReaderConfig::default()
        .with_layered_prefixes(input.layered_prefixes.clone())
        .with_layered_names(input.layered_names.clone())
        .with_time_var(&input.time_var);
    if let Some(ref path) = input.grid_info {
        cfg = cfg.with_grid_info(path);
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a [`ScatterConfig`] from the TOML scatter configuration.
pub fn build_scatter_config(scatter: &ScatterToml) -> Result<ScatterConfig> {
    Ok(ScatterConfig::new().with_collisions(parse_collisions(&scatter.collisions)?))
}

/// Builds a [`CollapseConfig`] from the TOML collapse configuration.
pub fn build_collapse_config(collapse: &CollapseToml) -> CollapseConfig {
    CollapseConfig::new().with_min_valid(collapse.min_valid)
}

/// Builds a [`CouplerConfig`] from the fraction and topography sections;
/// sections that are absent keep the default prefixes.
pub fn build_coupler_config(
    fraction: Option<&FractionToml>,
    topography: Option<&TopographyToml>,
) -> CouplerConfig {
    let mut cfg = CouplerConfig::default();
    if let Some(f) = fraction {
        cfg = cfg.with_fraction_prefix(&f.prefix);
    }
    if let Some(t) = topography {
        cfg = cfg.with_topography_prefix(&t.prefix);
    }
    cfg
}

/// Builds a [`DownscaleConfig`] from the TOML downscale configuration.
pub fn build_downscale_config(downscale: &DownscaleToml) -> Result<DownscaleConfig> {
    Ok(DownscaleConfig::new().with_extrapolation(parse_extrapolation(&downscale.extrapolation)?))
}

/// Builds [`RegionBounds`] from the TOML profile configuration.
pub fn build_region_bounds(profile: &ProfileToml) -> Result<RegionBounds> {
    Ok(RegionBounds::new(
        (profile.lat[0], profile.lat[1]),
        (profile.lon[0], profile.lon[1]),
    )?)
}

/// Builds a [`WriterConfig`] from the TOML output configuration.
pub fn build_writer_config(output: &OutputToml) -> Result<WriterConfig> {
    let cfg = WriterConfig::default().with_title(&output.title);
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_names() {
        assert_eq!(parse_collisions("reject").unwrap(), CollisionPolicy::Reject);
        assert_eq!(parse_collisions("Last-Wins").unwrap(), CollisionPolicy::LastWins);
        assert!(parse_collisions("first-wins").is_err());
    }

    #[test]
    fn extrapolation_names() {
        assert_eq!(parse_extrapolation("clamp").unwrap(), Extrapolation::Clamp);
        assert_eq!(parse_extrapolation("LINEAR").unwrap(), Extrapolation::Linear);
        assert!(parse_extrapolation("spline").is_err());
    }

    #[test]
    fn source_names() {
        assert_eq!(parse_fraction_source("cpl").unwrap(), FractionSource::Coupler);
        assert_eq!(parse_fraction_source("surfdat").unwrap(), FractionSource::Surfdat);
        assert!(parse_fraction_source("history").is_err());
        assert_eq!(parse_topography_source("history").unwrap(), TopographySource::History);
        assert!(parse_topography_source("surfdat").is_err());
    }

    #[test]
    fn reader_config_from_defaults() {
        let config: MecgridConfig = toml::from_str("").unwrap();
        let reader = build_reader_config(&config.input).unwrap();
        assert!(reader.is_layered("SNO_GS"));
        assert!(reader.grid_info().is_none());
    }

    #[test]
    fn reader_config_rejects_empty_time_var() {
        let config: MecgridConfig = toml::from_str("[input]\ntime_var = \"\"\n").unwrap();
        assert!(build_reader_config(&config.input).is_err());
    }

    #[test]
    fn coupler_prefixes_follow_sections() {
        let config: MecgridConfig = toml::from_str(
            "[topography]\nsource = \"coupler\"\npath = \"cpl.nc\"\nprefix = \"Sg_topo\"\n",
        )
        .unwrap();
        let cfg = build_coupler_config(config.fraction.as_ref(), config.topography.as_ref());
        assert_eq!(cfg.topography_field(1), "Sg_topo01");
        assert_eq!(cfg.fraction_field(1), "x2lavg_Sg_ice_covered01");
    }

    #[test]
    fn empty_title_rejected() {
        let config: MecgridConfig = toml::from_str("[output]\ntitle = \"\"\n").unwrap();
        assert!(build_writer_config(&config.output).is_err());
    }

    #[test]
    fn inverted_region_rejected() {
        let profile = ProfileToml {
            lat: [85.0, 60.0],
            lon: [280.0, 350.0],
            time: 0,
        };
        assert!(build_region_bounds(&profile).is_err());
    }

    #[test]
    fn collapse_threshold_optional() {
        assert_eq!(build_collapse_config(&CollapseToml::default()).min_valid(), None);
        let cfg = build_collapse_config(&CollapseToml {
            min_valid: Some(1.0e-4),
        });
        assert_eq!(cfg.min_valid(), Some(1.0e-4));
    }
}
