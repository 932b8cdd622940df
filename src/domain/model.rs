use crate::utils::error::{Result, SurveyError};
use serde::{Deserialize, Serialize};

/// Header names of the station CSV format.
pub mod columns {
    pub const SITE: &str = "Site";
    pub const LATITUDE: &str = "LatitudeUTM";
    pub const LONGITUDE: &str = "LongitudeUTM";
    pub const ELEVATION: &str = "elevation";
    pub const OBSERVED_GRAVITY: &str = "ObsGravity";

    pub const NORMAL_GRAVITY: &str = "Grav_Normal";
    pub const BOUGUER_GRAVITY: &str = "Grav_Bouguer";
    pub const BOUGUER_ANOMALY: &str = "Anomalia_Bouguer";

    pub const RAW_SCHEMA: [&str; 5] = [SITE, LATITUDE, LONGITUDE, ELEVATION, OBSERVED_GRAVITY];
    pub const DERIVED: [&str; 3] = [NORMAL_GRAVITY, BOUGUER_GRAVITY, BOUGUER_ANOMALY];
}

/// An ordered table of survey stations.
///
/// Cells are kept as the text they were read with, so columns the pipelines
/// never touch (site names, extra survey metadata) survive a round-trip
/// verbatim. Numeric access goes through [`StationTable::numeric_column`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl StationTable {
    /// Rows shorter than the header read as empty cells in the missing positions.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| SurveyError::MissingColumnError {
                column: name.to_string(),
            })
    }

    /// Parses every cell of `name` as `f64`. Rows are reported 1-based, header excluded.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let index = self.require_column(name)?;

        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let cell = cells.get(index).map(|c| c.trim()).unwrap_or_default();
                cell.parse::<f64>()
                    .map_err(|_| SurveyError::InvalidValueError {
                        column: name.to_string(),
                        row: row + 1,
                        value: cell.to_string(),
                    })
            })
            .collect()
    }

    /// Overwrites `name` in place when present, otherwise appends it as the last column.
    pub fn set_numeric_column(&mut self, name: &str, values: &[f64]) {
        debug_assert_eq!(values.len(), self.rows.len());

        match self.column_index(name) {
            Some(index) => {
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    if cells.len() <= index {
                        cells.resize(index + 1, String::new());
                    }
                    cells[index] = value.to_string();
                }
            }
            None => {
                let width = self.headers.len();
                self.headers.push(name.to_string());
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells.resize(width, String::new());
                    cells.push(value.to_string());
                }
            }
        }
    }
}

/// Derived gravity values for one station, in the units of the observed reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityCorrection {
    pub normal_gravity: f64,
    pub bouguer_gravity: f64,
    pub bouguer_anomaly: f64,
}

pub const DEFAULT_CRUST_DENSITY: f64 = 2.67;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionSettings {
    /// Average crustal density in g/cm³ used by the Bouguer plate term.
    pub density: f64,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            density: DEFAULT_CRUST_DENSITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub grid_resolution: usize,
    pub contour_levels: usize,
    pub dpi: u32,
    pub width_in: f64,
    pub height_in: f64,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colorbar_label: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            grid_resolution: 500,
            contour_levels: 50,
            dpi: 300,
            width_in: 10.0,
            height_in: 8.0,
            title: "Bouguer Gravity Anomaly Map".to_string(),
            x_label: "Longitude UTM".to_string(),
            y_label: "Latitude UTM".to_string(),
            colorbar_label: "Bouguer Anomaly (mGal)".to_string(),
        }
    }
}

impl MapSettings {
    /// Pixel size of the rendered figure.
    pub fn image_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round().max(1.0) as u32,
            (self.height_in * dpi).round().max(1.0) as u32,
        )
    }

    /// Converts a typographic size in points to pixels at the configured DPI.
    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

/// Terminal state of one shell-driven pipeline run.
#[derive(Debug)]
pub enum RunOutcome<T> {
    /// The shell cancelled the input request; nothing ran.
    Cancelled,
    /// The computation finished. `saved_to` is `None` when the shell cancelled the save.
    Completed { output: T, saved_to: Option<String> },
    Failed(SurveyError),
}

impl<T> RunOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }
}
