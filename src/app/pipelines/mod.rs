pub mod correction_pipeline;
pub mod map_pipeline;

pub use correction_pipeline::CorrectionPipeline;
pub use map_pipeline::AnomalyMapPipeline;
