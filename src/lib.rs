pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{CliShell, LocalStorage};
pub use app::pipelines::{AnomalyMapPipeline, CorrectionPipeline};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{SurveyConfig, SurveySettings};
pub use core::engine::SurveyEngine;
pub use domain::model::{RunOutcome, StationTable};
pub use utils::error::{Result, SurveyError};
