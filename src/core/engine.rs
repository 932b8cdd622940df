use crate::domain::model::RunOutcome;
use crate::domain::ports::{Pipeline, SurveyShell};
use crate::utils::error::{Result, SurveyError};
use crate::utils::monitor::SystemMonitor;
use std::path::Path;

/// Drives one pipeline: load, compute, then persist where the shell says.
///
/// Every error is caught here and turned into exactly one failure report.
pub struct SurveyEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> SurveyEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Extract and transform; nothing is written.
    pub async fn process(&self, source: &Path) -> Result<P::Output> {
        let name = self.pipeline.name();
        tracing::info!("[{}] Loading {}", name, source.display());
        self.monitor.log_stats("Start");

        let table = self.pipeline.extract(source).await?;
        tracing::info!("[{}] Loaded {} stations", name, table.len());
        self.monitor.log_stats("Extract");

        let output = self.pipeline.transform(table).await?;
        tracing::info!("[{}] {}", name, self.pipeline.summary(&output));
        self.monitor.log_stats("Transform");

        Ok(output)
    }

    pub async fn persist(&self, output: &P::Output, destination: &Path) -> Result<String> {
        let saved = self.pipeline.load(output, destination).await?;
        tracing::info!("[{}] Saved to {}", self.pipeline.name(), saved);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();
        Ok(saved)
    }

    /// Runs the pipeline against `shell`.
    ///
    /// Input cancellation ends the run silently. Output cancellation keeps the
    /// computed result, skips persistence and still reports success once.
    pub async fn run<S: SurveyShell + ?Sized>(&self, shell: &mut S) -> RunOutcome<P::Output> {
        let name = self.pipeline.name();

        let Some(source) = shell.request_input_path() else {
            tracing::info!("[{}] Input selection cancelled", name);
            return RunOutcome::Cancelled;
        };

        let output = match self.process(&source).await {
            Ok(output) => output,
            Err(e) => return self.fail(shell, e),
        };

        let Some(destination) = shell.request_output_path(self.pipeline.default_extension()) else {
            tracing::info!("[{}] Save cancelled; result discarded", name);
            shell.report_success(&format!(
                "{} completed: {} (not saved)",
                name,
                self.pipeline.summary(&output)
            ));
            return RunOutcome::Completed {
                output,
                saved_to: None,
            };
        };

        match self.persist(&output, &destination).await {
            Ok(saved) => {
                shell.report_success(&format!(
                    "{} completed: {}. Saved to {}",
                    name,
                    self.pipeline.summary(&output),
                    saved
                ));
                RunOutcome::Completed {
                    output,
                    saved_to: Some(saved),
                }
            }
            Err(e) => self.fail(shell, e),
        }
    }

    fn fail<S: SurveyShell + ?Sized>(&self, shell: &mut S, error: SurveyError) -> RunOutcome<P::Output> {
        tracing::error!(
            "[{}] {:?} error ({:?}): {}",
            self.pipeline.name(),
            error.category(),
            error.severity(),
            error
        );
        shell.report_failure(&error.user_friendly_message());
        RunOutcome::Failed(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StationTable;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Counts rows; fails on demand at either end.
    struct CountingPipeline {
        fail_extract: bool,
        fail_load: bool,
        loads: Mutex<Vec<PathBuf>>,
    }

    impl CountingPipeline {
        fn new() -> Self {
            Self {
                fail_extract: false,
                fail_load: false,
                loads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        type Output = usize;

        fn name(&self) -> &'static str {
            "Counting"
        }

        fn default_extension(&self) -> &'static str {
            "txt"
        }

        async fn extract(&self, _source: &Path) -> Result<StationTable> {
            if self.fail_extract {
                return Err(SurveyError::MissingColumnError {
                    column: "elevation".to_string(),
                });
            }
            Ok(StationTable::new(
                vec!["Site".into()],
                vec![vec!["A".into()], vec!["B".into()]],
            ))
        }

        async fn transform(&self, table: StationTable) -> Result<usize> {
            Ok(table.len())
        }

        async fn load(&self, _output: &usize, destination: &Path) -> Result<String> {
            if self.fail_load {
                return Err(SurveyError::output(
                    destination.display().to_string(),
                    "read-only file system",
                ));
            }
            self.loads.lock().unwrap().push(destination.to_path_buf());
            Ok(destination.display().to_string())
        }

        fn summary(&self, output: &usize) -> String {
            format!("{} rows", output)
        }
    }

    #[derive(Default)]
    struct ScriptedShell {
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        asked_extension: Option<String>,
        successes: Vec<String>,
        failures: Vec<String>,
    }

    impl SurveyShell for ScriptedShell {
        fn request_input_path(&mut self) -> Option<PathBuf> {
            self.input.clone()
        }

        fn request_output_path(&mut self, default_extension: &str) -> Option<PathBuf> {
            self.asked_extension = Some(default_extension.to_string());
            self.output.clone()
        }

        fn report_success(&mut self, message: &str) {
            self.successes.push(message.to_string());
        }

        fn report_failure(&mut self, message: &str) {
            self.failures.push(message.to_string());
        }
    }

    #[tokio::test]
    async fn test_completed_run_reports_success_once() {
        let engine = SurveyEngine::new(CountingPipeline::new());
        let mut shell = ScriptedShell {
            input: Some("in.csv".into()),
            output: Some("out.txt".into()),
            ..Default::default()
        };

        let outcome = engine.run(&mut shell).await;

        match outcome {
            RunOutcome::Completed { output, saved_to } => {
                assert_eq!(output, 2);
                assert_eq!(saved_to.as_deref(), Some("out.txt"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(shell.asked_extension.as_deref(), Some("txt"));
        assert_eq!(shell.successes.len(), 1);
        assert!(shell.successes[0].contains("2 rows"));
        assert!(shell.failures.is_empty());
    }

    #[tokio::test]
    async fn test_input_cancel_does_nothing() {
        let engine = SurveyEngine::new(CountingPipeline::new());
        let mut shell = ScriptedShell::default();

        let outcome = engine.run(&mut shell).await;

        assert!(matches!(outcome, RunOutcome::Cancelled));
        assert!(shell.asked_extension.is_none());
        assert!(shell.successes.is_empty());
        assert!(shell.failures.is_empty());
    }

    #[tokio::test]
    async fn test_output_cancel_skips_persistence() {
        let engine = SurveyEngine::new(CountingPipeline::new());
        let mut shell = ScriptedShell {
            input: Some("in.csv".into()),
            ..Default::default()
        };

        let outcome = engine.run(&mut shell).await;

        assert!(matches!(
            outcome,
            RunOutcome::Completed {
                output: 2,
                saved_to: None
            }
        ));
        assert!(engine.pipeline().loads.lock().unwrap().is_empty());
        assert_eq!(shell.successes.len(), 1);
        assert!(shell.successes[0].contains("not saved"));
        assert!(shell.failures.is_empty());
    }

    #[tokio::test]
    async fn test_input_error_reports_failure_once() {
        let mut pipeline = CountingPipeline::new();
        pipeline.fail_extract = true;
        let engine = SurveyEngine::new(pipeline);
        let mut shell = ScriptedShell {
            input: Some("in.csv".into()),
            output: Some("out.txt".into()),
            ..Default::default()
        };

        let outcome = engine.run(&mut shell).await;

        assert!(outcome.is_failed());
        assert!(shell.asked_extension.is_none());
        assert!(shell.successes.is_empty());
        assert_eq!(shell.failures.len(), 1);
        assert!(shell.failures[0].contains("elevation"));
    }

    #[tokio::test]
    async fn test_output_error_reports_failure_once() {
        let mut pipeline = CountingPipeline::new();
        pipeline.fail_load = true;
        let engine = SurveyEngine::new(pipeline);
        let mut shell = ScriptedShell {
            input: Some("in.csv".into()),
            output: Some("/ro/out.txt".into()),
            ..Default::default()
        };

        let outcome = engine.run(&mut shell).await;

        match outcome {
            RunOutcome::Failed(e) => assert!(matches!(e, SurveyError::OutputError { .. })),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(shell.successes.is_empty());
        assert_eq!(shell.failures.len(), 1);
    }
}
