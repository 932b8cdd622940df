use crate::config::{SurveyConfig, SurveySettings};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "geovity")]
#[command(about = "Bouguer gravity correction and anomaly contour maps for land gravimetry surveys")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage at each stage")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Survey TOML file supplying [correction] and [map] settings")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add normal gravity, Bouguer gravity and Bouguer anomaly columns to a station table
    Correct {
        #[arg(long, help = "Raw station CSV")]
        input: Option<PathBuf>,

        #[arg(long, help = "Where to write the corrected CSV; omit to skip saving")]
        output: Option<PathBuf>,

        #[arg(long, help = "Crustal density in g/cm³ (default 2.67)")]
        density: Option<f64>,
    },
    /// Interpolate corrected anomalies and draw the contour map
    Map {
        #[arg(long, help = "Corrected station CSV")]
        input: Option<PathBuf>,

        #[arg(long, help = "Where to write the PNG; omit to skip saving")]
        output: Option<PathBuf>,

        #[arg(long, help = "Grid nodes along each axis (default 500)")]
        grid_resolution: Option<usize>,

        #[arg(long, help = "Number of contour bands (default 50)")]
        levels: Option<usize>,

        #[arg(long, help = "Image resolution in dots per inch (default 300)")]
        dpi: Option<u32>,
    },
}

impl Command {
    pub fn input(&self) -> Option<&PathBuf> {
        match self {
            Command::Correct { input, .. } | Command::Map { input, .. } => input.as_ref(),
        }
    }

    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            Command::Correct { output, .. } | Command::Map { output, .. } => output.as_ref(),
        }
    }

    fn output_extension(&self) -> &'static str {
        match self {
            Command::Correct { .. } => "csv",
            Command::Map { .. } => "png",
        }
    }
}

impl CliConfig {
    /// Settings from `--config` (or defaults), with command-line flags on top.
    pub fn resolve(&self) -> Result<SurveySettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let survey = SurveyConfig::from_file(path)?;
                tracing::debug!("Loaded survey '{}' settings from {}", survey.survey.name, path.display());
                survey.settings()
            }
            None => SurveySettings::default(),
        };

        match &self.command {
            Command::Correct { density, .. } => {
                if let Some(density) = density {
                    settings.correction.density = *density;
                }
            }
            Command::Map {
                grid_resolution,
                levels,
                dpi,
                ..
            } => {
                if let Some(resolution) = grid_resolution {
                    settings.map.grid_resolution = *resolution;
                }
                if let Some(levels) = levels {
                    settings.map.contour_levels = *levels;
                }
                if let Some(dpi) = dpi {
                    settings.map.dpi = *dpi;
                }
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(input) = self.command.input() {
            validation::validate_file_extension("input", &input.to_string_lossy(), &["csv"])?;
        }
        if let Some(output) = self.command.output() {
            let output = output.to_string_lossy();
            validation::validate_path("output", &output)?;
            // An output without extension gets the default one; anything else must match it.
            if std::path::Path::new(output.as_ref()).extension().is_some() {
                validation::validate_file_extension(
                    "output",
                    &output,
                    &[self.command.output_extension()],
                )?;
            }
        }
        if let Some(config) = &self.config {
            validation::validate_file_extension("config", &config.to_string_lossy(), &["toml"])?;
        }
        Ok(())
    }
}
