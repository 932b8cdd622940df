#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use toml_config::SurveyConfig;

use crate::domain::model::{CorrectionSettings, MapSettings};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

pub const MAX_GRID_RESOLUTION: usize = 4000;
/// Largest figure the renderer will allocate, in pixels.
pub const MAX_IMAGE_PIXELS: u64 = 100_000_000;

/// Effective processing parameters after merging a survey file with command-line overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveySettings {
    pub correction: CorrectionSettings,
    pub map: MapSettings,
}

impl ConfigProvider for SurveySettings {
    fn correction_settings(&self) -> CorrectionSettings {
        self.correction
    }

    fn map_settings(&self) -> MapSettings {
        self.map.clone()
    }
}

impl Validate for SurveySettings {
    fn validate(&self) -> Result<()> {
        validation::validate_range("correction.density", self.correction.density, 0.01, 25.0)?;

        let map = &self.map;
        validation::validate_range(
            "map.grid_resolution",
            map.grid_resolution,
            2,
            MAX_GRID_RESOLUTION,
        )?;
        validation::validate_positive_number("map.contour_levels", map.contour_levels, 1)?;
        validation::validate_range("map.dpi", map.dpi, 10, 1200)?;
        validation::validate_range("map.width_in", map.width_in, 1.0, 40.0)?;
        validation::validate_range("map.height_in", map.height_in, 1.0, 40.0)?;

        let (width, height) = map.image_size();
        validation::validate_range(
            "map image pixels",
            width as u64 * height as u64,
            1,
            MAX_IMAGE_PIXELS,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(SurveySettings::default().validate().is_ok());
    }

    #[test]
    fn test_non_finite_density_is_rejected() {
        for density in [f64::NAN, f64::INFINITY, 0.0, -2.67] {
            let mut settings = SurveySettings::default();
            settings.correction.density = density;
            assert!(settings.validate().is_err(), "density {density} accepted");
        }
    }

    #[test]
    fn test_map_limits() {
        let mut settings = SurveySettings::default();
        settings.map.contour_levels = 0;
        assert!(settings.validate().is_err());

        let mut settings = SurveySettings::default();
        settings.map.dpi = 5;
        assert!(settings.validate().is_err());

        let mut settings = SurveySettings::default();
        settings.map.grid_resolution = MAX_GRID_RESOLUTION + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_oversized_figure_is_rejected() {
        let mut settings = SurveySettings::default();
        settings.map.dpi = 1200;
        settings.map.width_in = 40.0;
        settings.map.height_in = 40.0;

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("map image pixels"));

        // 40x40 in at 250 dpi is exactly at the limit.
        settings.map.dpi = 250;
        assert!(settings.validate().is_ok());
    }
}
