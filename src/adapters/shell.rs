use crate::domain::ports::SurveyShell;
use std::path::PathBuf;

/// Non-interactive shell: paths come from the command line, reports go to the terminal.
///
/// A missing input or output path behaves like a cancelled dialog.
#[derive(Debug, Clone, Default)]
pub struct CliShell {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    successes: usize,
    failures: usize,
}

impl CliShell {
    pub fn new(input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            input,
            output,
            successes: 0,
            failures: 0,
        }
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl SurveyShell for CliShell {
    fn request_input_path(&mut self) -> Option<PathBuf> {
        self.input.clone()
    }

    /// Appends `default_extension` when the chosen path has none.
    fn request_output_path(&mut self, default_extension: &str) -> Option<PathBuf> {
        let path = self.output.clone()?;
        if path.extension().is_none() {
            Some(path.with_extension(default_extension))
        } else {
            Some(path)
        }
    }

    fn report_success(&mut self, message: &str) {
        self.successes += 1;
        println!("✅ {}", message);
    }

    fn report_failure(&mut self, message: &str) {
        self.failures += 1;
        eprintln!("❌ {}", message);
    }
}
