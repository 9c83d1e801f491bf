use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Course not found: {course_id}")]
    CourseNotFound { course_id: String },

    #[error("Lesson '{lesson_id}' is not part of any module in course '{course_id}'")]
    LessonNotFound { course_id: String, lesson_id: String },

    #[error("Invalid course '{course_id}': {message}")]
    InvalidCourse { course_id: String, message: String },

    #[error("Course '{course_id}' already has {completed} completed lesson(s)")]
    ProgressAlreadyStarted { course_id: String, completed: usize },

    #[error("No verification record for subject '{subject}'")]
    SubjectNotFound { subject: String },

    #[error("Backend returned HTTP {status} for {url}")]
    RemoteStatus { status: u16, url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Domain,
    Verification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProgressError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProgressError::ApiError(_) | ProgressError::RemoteStatus { .. } => {
                ErrorCategory::Network
            }
            ProgressError::IoError(_) | ProgressError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            ProgressError::ConfigError { .. }
            | ProgressError::ConfigValidationError { .. }
            | ProgressError::InvalidConfigValueError { .. }
            | ProgressError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ProgressError::CourseNotFound { .. }
            | ProgressError::LessonNotFound { .. }
            | ProgressError::InvalidCourse { .. }
            | ProgressError::ProgressAlreadyStarted { .. } => ErrorCategory::Domain,
            ProgressError::SubjectNotFound { .. } => ErrorCategory::Verification,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProgressError::ProgressAlreadyStarted { .. } => ErrorSeverity::Low,
            ProgressError::ApiError(_)
            | ProgressError::RemoteStatus { .. }
            | ProgressError::SubjectNotFound { .. } => ErrorSeverity::Medium,
            ProgressError::CourseNotFound { .. }
            | ProgressError::LessonNotFound { .. }
            | ProgressError::InvalidCourse { .. }
            | ProgressError::ConfigError { .. }
            | ProgressError::ConfigValidationError { .. }
            | ProgressError::InvalidConfigValueError { .. }
            | ProgressError::MissingConfigError { .. } => ErrorSeverity::High,
            ProgressError::IoError(_) | ProgressError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the backend URL, API key and network connectivity",
            ErrorCategory::Storage => "Check that the data directory exists and holds valid course JSON",
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::Verification => "Make sure the subject exists in the verification table",
            ErrorCategory::Domain => match self {
                ProgressError::ProgressAlreadyStarted { .. } => {
                    "Pass --reset to discard existing progress"
                }
                _ => "Check the course and lesson identifiers",
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ProgressError::CourseNotFound { course_id } => {
                format!("Course '{}' does not exist", course_id)
            }
            ProgressError::LessonNotFound { lesson_id, .. } => {
                format!("Lesson '{}' could not be found in this course", lesson_id)
            }
            ProgressError::ProgressAlreadyStarted { completed, .. } => format!(
                "This course is already in progress ({} lesson(s) completed)",
                completed
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
