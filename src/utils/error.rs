use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column '{column}'")]
    MissingColumnError { column: String },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValueError {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Station table contains no stations")]
    EmptyTableError,

    #[error("Rendering error: {message}")]
    RenderError { message: String },

    #[error("Could not write output '{path}': {message}")]
    OutputError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

/// Where in a pipeline run a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Computation,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a run that ended with this severity.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SurveyError {
    pub fn render<E: std::fmt::Display>(err: E) -> Self {
        SurveyError::RenderError {
            message: err.to_string(),
        }
    }

    pub fn output<E: std::fmt::Display>(path: impl Into<String>, err: E) -> Self {
        SurveyError::OutputError {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SurveyError::IoError(_)
            | SurveyError::CsvError(_)
            | SurveyError::MissingColumnError { .. }
            | SurveyError::InvalidValueError { .. }
            | SurveyError::EmptyTableError => ErrorCategory::Input,
            SurveyError::RenderError { .. } => ErrorCategory::Computation,
            SurveyError::OutputError { .. } => ErrorCategory::Output,
            SurveyError::ConfigError { .. }
            | SurveyError::InvalidConfigValueError { .. }
            | SurveyError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Medium,
            ErrorCategory::Computation => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SurveyError::IoError(e) => format!("Could not read the station file: {}", e),
            SurveyError::CsvError(e) => format!("The station file is not valid CSV: {}", e),
            SurveyError::MissingColumnError { column } => {
                format!("The station file has no '{}' column", column)
            }
            SurveyError::InvalidValueError { column, row, value } => format!(
                "Row {} has a non-numeric '{}' value: '{}'",
                row, column, value
            ),
            SurveyError::EmptyTableError => "The station file contains no stations".to_string(),
            SurveyError::RenderError { message } => {
                format!("The anomaly map could not be drawn: {}", message)
            }
            SurveyError::OutputError { path, message } => {
                format!("The result could not be saved to '{}': {}", path, message)
            }
            _ => format!("Configuration problem: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SurveyError::IoError(_) => "Check that the file exists and is readable",
            SurveyError::CsvError(_) => "Make sure every row has the same number of fields as the header",
            SurveyError::MissingColumnError { .. } => {
                "Use the header Site,LatitudeUTM,LongitudeUTM,elevation,ObsGravity"
            }
            SurveyError::InvalidValueError { .. } => "Fix or remove the offending row and retry",
            SurveyError::EmptyTableError => "Add at least one station row below the header",
            SurveyError::RenderError { .. } => "Retry with a smaller DPI or grid resolution",
            SurveyError::OutputError { .. } => "Choose a writable destination directory",
            _ => "Review the configuration file and command-line flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, SurveyError>;
