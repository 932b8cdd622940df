use crate::core::interpolation::{interpolate_grid, GridSpec, SamplePoint};
use crate::core::render::{render_anomaly_map, AnomalyMap};
use crate::core::table_io::read_table;
use crate::domain::model::{columns, StationTable};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{Result, SurveyError};
use std::path::Path;

/// Corrected station CSV in, contour map PNG out.
pub struct AnomalyMapPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> AnomalyMapPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

/// Longitude, latitude and anomaly of every station, in table order.
///
/// Non-finite values (`nan`, `inf`) are rejected with their row and column.
pub fn station_samples(table: &StationTable) -> Result<Vec<SamplePoint>> {
    if table.is_empty() {
        return Err(SurveyError::EmptyTableError);
    }

    let xs = table.numeric_column(columns::LONGITUDE)?;
    let ys = table.numeric_column(columns::LATITUDE)?;
    let values = table.numeric_column(columns::BOUGUER_ANOMALY)?;

    let named = [
        (columns::LONGITUDE, &xs),
        (columns::LATITUDE, &ys),
        (columns::BOUGUER_ANOMALY, &values),
    ];
    for (column, data) in named {
        if let Some(i) = data.iter().position(|v| !v.is_finite()) {
            return Err(SurveyError::InvalidValueError {
                column: column.to_string(),
                row: i + 1,
                value: data[i].to_string(),
            });
        }
    }

    Ok(xs
        .into_iter()
        .zip(ys)
        .zip(values)
        .map(|((x, y), value)| SamplePoint::new(x, y, value))
        .collect())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for AnomalyMapPipeline<S, C> {
    type Output = AnomalyMap;

    fn name(&self) -> &'static str {
        "Anomaly map"
    }

    fn default_extension(&self) -> &'static str {
        "png"
    }

    async fn extract(&self, source: &Path) -> Result<StationTable> {
        let data = self.storage.read_file(&source.to_string_lossy()).await?;
        read_table(&data)
    }

    async fn transform(&self, table: StationTable) -> Result<AnomalyMap> {
        let samples = station_samples(&table)?;
        let settings = self.config.map_settings();
        let spec = GridSpec {
            resolution: settings.grid_resolution,
        };

        // Interpolation and rasterisation are CPU-bound; keep them off the runtime threads.
        tokio::task::spawn_blocking(move || {
            let grid = interpolate_grid(&samples, &spec)?;
            let summary = grid.summary();
            if summary.defined == 0 {
                tracing::warn!("No grid node could be interpolated; the map will be empty");
            } else {
                tracing::debug!(
                    "Interpolated {} of {} nodes, anomaly range {:?}..{:?}",
                    summary.defined,
                    summary.nodes,
                    summary.min,
                    summary.max
                );
            }
            render_anomaly_map(&samples, &grid, &settings)
        })
        .await
        .map_err(SurveyError::render)?
    }

    async fn load(&self, output: &AnomalyMap, destination: &Path) -> Result<String> {
        let map = output.clone();
        let path = destination.to_path_buf();
        let saved = path.display().to_string();

        tokio::task::spawn_blocking(move || map.save_png(&path))
            .await
            .map_err(|e| SurveyError::output(saved.clone(), e))??;

        Ok(saved)
    }

    fn summary(&self, output: &AnomalyMap) -> String {
        let summary = output.summary();
        match (summary.min, summary.max) {
            (Some(min), Some(max)) => format!(
                "{}x{} map of {} stations, anomaly {:.3} to {:.3}",
                output.width(),
                output.height(),
                output.station_count(),
                min,
                max
            ),
            _ => format!(
                "{}x{} map of {} stations, no interpolated surface",
                output.width(),
                output.height(),
                output.station_count()
            ),
        }
    }
}
