use crate::config::SurveySettings;
use crate::domain::model::{CorrectionSettings, MapSettings};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SurveyError};
use crate::utils::logger::LOG_LEVELS;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A survey processing file: where the stations live and how to process them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    pub survey: SurveySection,
    pub io: IoConfig,
    #[serde(default)]
    pub correction: CorrectionSettings,
    #[serde(default)]
    pub map: MapSettings,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoConfig {
    /// Raw station table read by the correction stage.
    pub raw_input: String,
    /// Corrected table written by the correction stage and read by the map stage.
    pub corrected_output: String,
    /// PNG destination; without it the map is computed but not saved.
    pub map_output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl SurveyConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| SurveyError::ConfigError {
            message: format!("Cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| SurveyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SurveyError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn settings(&self) -> SurveySettings {
        SurveySettings {
            correction: self.correction,
            map: self.map.clone(),
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for SurveyConfig {
    fn correction_settings(&self) -> CorrectionSettings {
        self.correction
    }

    fn map_settings(&self) -> MapSettings {
        self.map.clone()
    }
}

impl Validate for SurveyConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("survey.name", &self.survey.name)?;
        validation::validate_file_extension("io.raw_input", &self.io.raw_input, &["csv"])?;
        validation::validate_file_extension(
            "io.corrected_output",
            &self.io.corrected_output,
            &["csv"],
        )?;
        if let Some(map_output) = &self.io.map_output {
            validation::validate_file_extension("io.map_output", map_output, &["png"])?;
        }
        if let Some(level) = self.log_level() {
            if !LOG_LEVELS.contains(&level.trim().to_ascii_lowercase().as_str()) {
                return Err(SurveyError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.to_string(),
                    reason: format!("Must be one of {}", LOG_LEVELS.join(", ")),
                });
            }
        }
        if self.io.raw_input == self.io.corrected_output {
            return Err(SurveyError::ConfigValidationError {
                field: "io.corrected_output".to_string(),
                message: "must differ from io.raw_input".to_string(),
            });
        }

        self.settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[survey]
name = "Cuenca Norte"

[io]
raw_input = "field/stations.csv"
corrected_output = "work/corrected.csv"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = SurveyConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.survey.name, "Cuenca Norte");
        assert_eq!(config.correction, CorrectionSettings::default());
        assert_eq!(config.map, MapSettings::default());
        assert!(config.io.map_output.is_none());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[survey]
name = "Cuenca Norte"
description = "Second campaign"

[io]
raw_input = "field/stations.csv"
corrected_output = "work/corrected.csv"
map_output = "work/anomaly.png"

[correction]
density = 2.4

[map]
grid_resolution = 200
dpi = 150
title = "Cuenca Norte Bouguer anomaly"

[monitoring]
enabled = true
log_level = "debug"
"#;
        let config = SurveyConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.correction_settings().density, 2.4);
        let map = config.map_settings();
        assert_eq!(map.grid_resolution, 200);
        assert_eq!(map.dpi, 150);
        assert_eq!(map.contour_levels, 50);
        assert_eq!(map.title, "Cuenca Norte Bouguer anomaly");
        assert!(config.monitoring_enabled());
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GEOVITY_TEST_FIELD_DIR", "/data/field");

        let toml_content = r#"
[survey]
name = "env"

[io]
raw_input = "${GEOVITY_TEST_FIELD_DIR}/stations.csv"
corrected_output = "${GEOVITY_TEST_UNSET_DIR}/corrected.csv"
"#;
        let config = SurveyConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.io.raw_input, "/data/field/stations.csv");
        assert_eq!(config.io.corrected_output, "${GEOVITY_TEST_UNSET_DIR}/corrected.csv");

        std::env::remove_var("GEOVITY_TEST_FIELD_DIR");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = SurveyConfig::from_toml_str(MINIMAL).unwrap();
        config.correction.density = -1.0;
        assert!(config.validate().is_err());

        let mut config = SurveyConfig::from_toml_str(MINIMAL).unwrap();
        config.io.map_output = Some("work/anomaly.jpg".to_string());
        assert!(config.validate().is_err());

        let mut config = SurveyConfig::from_toml_str(MINIMAL).unwrap();
        config.io.corrected_output = config.io.raw_input.clone();
        assert!(config.validate().is_err());

        let mut config = SurveyConfig::from_toml_str(MINIMAL).unwrap();
        config.map.grid_resolution = 1;
        assert!(config.validate().is_err());

        let mut config = SurveyConfig::from_toml_str(MINIMAL).unwrap();
        config.monitoring = Some(MonitoringConfig {
            enabled: false,
            log_level: Some("loud".to_string()),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_io_section_is_a_parse_error() {
        let err = SurveyConfig::from_toml_str("[survey]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, SurveyError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = SurveyConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.io.raw_input, "field/stations.csv");
    }
}
