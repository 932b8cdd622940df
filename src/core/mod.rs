pub mod engine;
pub mod gravity;
pub mod interpolation;
pub mod render;
pub mod table_io;

pub use crate::domain::model::{CorrectionSettings, MapSettings, RunOutcome, StationTable};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, SurveyShell};
pub use crate::utils::error::Result;
