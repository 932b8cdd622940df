use crate::core::gravity::correct_table;
use crate::core::table_io::{read_table, write_table};
use crate::domain::model::StationTable;
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::Result;
use std::path::Path;

/// Raw station CSV in, corrected station CSV out.
pub struct CorrectionPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> CorrectionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CorrectionPipeline<S, C> {
    type Output = StationTable;

    fn name(&self) -> &'static str {
        "Bouguer correction"
    }

    fn default_extension(&self) -> &'static str {
        "csv"
    }

    async fn extract(&self, source: &Path) -> Result<StationTable> {
        let data = self.storage.read_file(&source.to_string_lossy()).await?;
        read_table(&data)
    }

    async fn transform(&self, table: StationTable) -> Result<StationTable> {
        let settings = self.config.correction_settings();
        tracing::debug!("Applying corrections with density {} g/cm³", settings.density);
        correct_table(&table, &settings)
    }

    async fn load(&self, output: &StationTable, destination: &Path) -> Result<String> {
        let encoded = write_table(output)?;
        let destination = destination.to_string_lossy();
        self.storage.write_file(&destination, &encoded).await?;
        Ok(destination.into_owned())
    }

    fn summary(&self, output: &StationTable) -> String {
        format!("corrected {} stations", output.len())
    }
}
