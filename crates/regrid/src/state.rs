//! A variable together with the optional fields its operations need.

use tracing::info;

use crate::error::RegridError;
use crate::field::{Gridded2d, Gridded3d};
use crate::fraction::{CollapseConfig, FractionField, collapse_classes};
use crate::interpolate::{InterpolationResult, interpolate_to_levels};
use crate::scatter::ScatterConfig;
use crate::topography::TopographyField;
use crate::variable::VectorVariable;

/// A [`VectorVariable`] and the fraction and topography fields attached to
/// it so far.
///
/// Attaching a field moves to the variant that carries it. Operations that
/// need a field check the variant and return
/// [`RegridError::PreconditionNotSet`] if it is missing.
///
/// ```text
///              with_fraction                 with_topography
///   Bare ─────────────────────▶ WithFraction ───────────────────┐
///     │                                                        ▼
///     └──── with_topography ──▶ WithTopography ──────────────▶ WithBoth
///                                             with_fraction
/// ```
#[derive(Debug, Clone)]
pub enum VariableState {
    /// No field attached.
    Bare(VectorVariable),
    /// Fraction attached.
    WithFraction {
        /// The variable.
        variable: VectorVariable,
        /// Per-class area fraction.
        fraction: FractionField,
    },
    /// Topography attached.
    WithTopography {
        /// The variable.
        variable: VectorVariable,
        /// Per-class heights.
        topography: TopographyField,
    },
    /// Both fields attached.
    WithBoth {
        /// The variable.
        variable: VectorVariable,
        /// Per-class area fraction.
        fraction: FractionField,
        /// Per-class heights.
        topography: TopographyField,
    },
}

impl VariableState {
    /// Wrap a variable without any attached field.
    pub fn new(variable: VectorVariable) -> Self {
        Self::Bare(variable)
    }

    /// The variable.
    pub fn variable(&self) -> &VectorVariable {
        match self {
            Self::Bare(variable)
            | Self::WithFraction { variable, .. }
            | Self::WithTopography { variable, .. }
            | Self::WithBoth { variable, .. } => variable,
        }
    }

    /// The variable, mutably (for scaling or dividing its data).
    pub fn variable_mut(&mut self) -> &mut VectorVariable {
        match self {
            Self::Bare(variable)
            | Self::WithFraction { variable, .. }
            | Self::WithTopography { variable, .. }
            | Self::WithBoth { variable, .. } => variable,
        }
    }

    /// Attached fraction field.
    pub fn fraction(&self) -> Option<&FractionField> {
        match self {
            Self::WithFraction { fraction, .. } | Self::WithBoth { fraction, .. } => Some(fraction),
            Self::Bare(_) | Self::WithTopography { .. } => None,
        }
    }

    /// Attached topography field.
    pub fn topography(&self) -> Option<&TopographyField> {
        match self {
            Self::WithTopography { topography, .. } | Self::WithBoth { topography, .. } => {
                Some(topography)
            }
            Self::Bare(_) | Self::WithFraction { .. } => None,
        }
    }

    /// Name of the current variant.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Bare(_) => "bare",
            Self::WithFraction { .. } => "with-fraction",
            Self::WithTopography { .. } => "with-topography",
            Self::WithBoth { .. } => "with-both",
        }
    }

    /// Attach (or replace) the fraction field.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] if the field is not on the
    /// variable's grid.
    pub fn with_fraction(self, fraction: FractionField) -> Result<Self, RegridError> {
        self.variable()
            .grid()
            .check_shape("fraction", fraction.grid_shape())?;
        let (variable, _, topography) = self.into_parts();
        Ok(Self::from_parts(variable, Some(fraction), topography))
    }

    /// Attach (or replace) the topography field.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::ShapeMismatch`] if the field is not on the
    /// variable's grid.
    pub fn with_topography(self, topography: TopographyField) -> Result<Self, RegridError> {
        self.variable()
            .grid()
            .check_shape("topography", topography.grid_shape())?;
        let (variable, fraction, _) = self.into_parts();
        Ok(Self::from_parts(variable, fraction, Some(topography)))
    }

    /// Attach topography taken from another variable (for example a
    /// per-column surface height) at time step `time`.
    ///
    /// # Errors
    ///
    /// Propagates [`TopographyField::from_variable`] and
    /// [`Self::with_topography`] errors.
    pub fn with_topography_from(
        self,
        heights: &VectorVariable,
        config: &ScatterConfig,
        time: usize,
    ) -> Result<Self, RegridError> {
        let topography = TopographyField::from_variable(heights, config, time)?;
        self.with_topography(topography)
    }

    /// The variable on the `(time, lat, lon, class)` grid.
    ///
    /// # Errors
    ///
    /// Propagates [`VectorVariable::gridded_3d`] errors.
    pub fn gridded_3d(&self, config: &ScatterConfig) -> Result<Gridded3d, RegridError> {
        self.variable().gridded_3d(config)
    }

    /// The variable collapsed to `(time, lat, lon)` by fraction weighting.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::PreconditionNotSet`] without a fraction field;
    /// otherwise propagates scatter and collapse errors.
    pub fn gridded_2d(
        &self,
        scatter: &ScatterConfig,
        collapse: &CollapseConfig,
    ) -> Result<Gridded2d, RegridError> {
        let fraction = self.fraction().ok_or(RegridError::PreconditionNotSet {
            field: "fraction",
            operation: "gridded 2-D collapse",
        })?;
        let field = self.gridded_3d(scatter)?;
        let out = collapse_classes(&field, fraction, collapse)?;
        info!(variable = %self.variable().meta().name, "gridded 2-D field");
        Ok(out)
    }

    /// The variable interpolated to the heights in `levels`.
    ///
    /// # Errors
    ///
    /// Returns [`RegridError::PreconditionNotSet`] without a topography
    /// field; otherwise propagates scatter and interpolation errors.
    pub fn gridded_3d_custom_levels(
        &self,
        scatter: &ScatterConfig,
        levels: &[f64],
    ) -> Result<InterpolationResult, RegridError> {
        let topography = self.topography().ok_or(RegridError::PreconditionNotSet {
            field: "topography",
            operation: "custom-level interpolation",
        })?;
        let field = self.gridded_3d(scatter)?;
        interpolate_to_levels(&field, topography, levels)
    }

    fn into_parts(self) -> (VectorVariable, Option<FractionField>, Option<TopographyField>) {
        match self {
            Self::Bare(variable) => (variable, None, None),
            Self::WithFraction { variable, fraction } => (variable, Some(fraction), None),
            Self::WithTopography {
                variable,
                topography,
            } => (variable, None, Some(topography)),
            Self::WithBoth {
                variable,
                fraction,
                topography,
            } => (variable, Some(fraction), Some(topography)),
        }
    }

    fn from_parts(
        variable: VectorVariable,
        fraction: Option<FractionField>,
        topography: Option<TopographyField>,
    ) -> Self {
        match (fraction, topography) {
            (None, None) => Self::Bare(variable),
            (Some(fraction), None) => Self::WithFraction { variable, fraction },
            (None, Some(topography)) => Self::WithTopography {
                variable,
                topography,
            },
            (Some(fraction), Some(topography)) => Self::WithBoth {
                variable,
                fraction,
                topography,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GLC_NEC;
    use crate::grid::GridDescriptor;
    use crate::index::GridIndex;
    use crate::series::{SeriesData, VariableKind};
    use crate::variable::{TimeAxis, VariableMeta};
    use approx::assert_relative_eq;
    use ndarray::{Array3, array};

    fn grid() -> GridDescriptor {
        GridDescriptor::new(vec![0.0], vec![0.0]).unwrap()
    }

    fn variable() -> VectorVariable {
        let index =
            GridIndex::from_one_based(&[1, 1], &[1, 1], &[401, 402], &[4, 4], &grid()).unwrap();
        VectorVariable::new(
            VariableMeta::new("TG").with_units("K"),
            TimeAxis {
                values: vec![0.0],
                units: "days since 2000-01-01".to_string(),
            },
            SeriesData::Vector(array![[5.0, 2.0]]),
            VariableKind::Column,
            grid(),
            Some(index),
        )
        .unwrap()
    }

    fn fraction() -> FractionField {
        let mut raw = Array3::zeros((GLC_NEC + 1, 1, 1));
        raw[[1, 0, 0]] = 0.5;
        raw[[2, 0, 0]] = 0.5;
        FractionField::from_classes(raw).unwrap()
    }

    fn topography() -> TopographyField {
        let mut raw = Array3::zeros((GLC_NEC + 1, 1, 1));
        raw[[1, 0, 0]] = 300.0;
        raw[[2, 0, 0]] = 1000.0;
        TopographyField::from_classes(raw).unwrap()
    }

    #[test]
    fn bare_state_rejects_derived_operations() {
        let state = VariableState::new(variable());
        assert_eq!(state.stage(), "bare");

        let err = state
            .gridded_2d(&ScatterConfig::new(), &CollapseConfig::new())
            .unwrap_err();
        assert_eq!(
            err,
            RegridError::PreconditionNotSet {
                field: "fraction",
                operation: "gridded 2-D collapse"
            }
        );

        let err = state
            .gridded_3d_custom_levels(&ScatterConfig::new(), &[100.0])
            .unwrap_err();
        assert!(matches!(
            err,
            RegridError::PreconditionNotSet {
                field: "topography",
                ..
            }
        ));
    }

    #[test]
    fn attaching_fields_walks_the_states() {
        let state = VariableState::new(variable())
            .with_fraction(fraction())
            .unwrap();
        assert_eq!(state.stage(), "with-fraction");
        assert!(state.topography().is_none());

        let state = state.with_topography(topography()).unwrap();
        assert_eq!(state.stage(), "with-both");
        assert!(state.fraction().is_some());
        assert!(state.topography().is_some());

        let state = VariableState::new(variable())
            .with_topography(topography())
            .unwrap();
        assert_eq!(state.stage(), "with-topography");
    }

    #[test]
    fn gridded_2d_with_fraction() {
        let state = VariableState::new(variable())
            .with_fraction(fraction())
            .unwrap();
        let out = state
            .gridded_2d(&ScatterConfig::new(), &CollapseConfig::new())
            .unwrap();
        assert_relative_eq!(out.get(0, 0, 0).unwrap(), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn custom_levels_with_topography() {
        let state = VariableState::new(variable())
            .with_topography(topography())
            .unwrap();
        let result = state
            .gridded_3d_custom_levels(&ScatterConfig::new(), &[650.0])
            .unwrap();
        assert_relative_eq!(result.field().get(0, 0, 0, 0).unwrap(), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn wrong_grid_field_rejected() {
        let raw = Array3::zeros((GLC_NEC + 1, 2, 2));
        let err = VariableState::new(variable())
            .with_fraction(FractionField::from_classes(raw).unwrap())
            .unwrap_err();
        assert!(matches!(err, RegridError::ShapeMismatch { .. }));
    }

    #[test]
    fn topography_from_height_variable() {
        let heights = VectorVariable::new(
            VariableMeta::new("TOPO_COL").with_units("m"),
            TimeAxis {
                values: vec![0.0],
                units: "days since 2000-01-01".to_string(),
            },
            SeriesData::Vector(array![[300.0, 1000.0]]),
            VariableKind::Column,
            grid(),
            Some(
                GridIndex::from_one_based(&[1, 1], &[1, 1], &[401, 402], &[4, 4], &grid())
                    .unwrap(),
            ),
        )
        .unwrap();

        let state = VariableState::new(variable())
            .with_topography_from(&heights, &ScatterConfig::new(), 0)
            .unwrap();
        let result = state
            .gridded_3d_custom_levels(&ScatterConfig::new(), &[300.0, 1000.0])
            .unwrap();
        assert_eq!(result.field().get(0, 0, 0, 0), Some(5.0));
        assert_eq!(result.field().get(0, 0, 0, 1), Some(2.0));
    }

    #[test]
    fn variable_mut_reaches_data() {
        let mut state = VariableState::new(variable());
        state.variable_mut().apply_factor(2.0, None);
        let field = state.gridded_3d(&ScatterConfig::new()).unwrap();
        assert_eq!(field.get(0, 0, 0, 0), Some(10.0));
    }
}
