use crate::domain::model::{CorrectionSettings, MapSettings, StationTable};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    /// Must leave `path` untouched unless every byte of `data` was written.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn correction_settings(&self) -> CorrectionSettings;
    fn map_settings(&self) -> MapSettings;
}

/// One load → compute → persist pipeline over a station table.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Output: Send + Sync;

    fn name(&self) -> &'static str;
    /// Extension offered to the shell when asking where to save.
    fn default_extension(&self) -> &'static str;

    async fn extract(&self, source: &Path) -> Result<StationTable>;
    async fn transform(&self, table: StationTable) -> Result<Self::Output>;
    async fn load(&self, output: &Self::Output, destination: &Path) -> Result<String>;

    /// One-line description of a finished output, shown to the user.
    fn summary(&self, output: &Self::Output) -> String;
}

/// The user-facing collaborator that drives a run: dialogs and status reports.
pub trait SurveyShell {
    /// `None` means the user cancelled.
    fn request_input_path(&mut self) -> Option<PathBuf>;
    /// `None` means the user cancelled the save.
    fn request_output_path(&mut self, default_extension: &str) -> Option<PathBuf>;
    fn report_success(&mut self, message: &str);
    fn report_failure(&mut self, message: &str);
}
