use std::path::PathBuf;
use thiserror::Error;

/// Main error type for minroll
#[derive(Error, Debug)]
pub enum MinrollError {
    #[error("entry: {} does not exist", path.display())]
    InvalidEntry { path: PathBuf },

    #[error("{stage} failed: {message}")]
    PipelineStage { stage: String, message: String },

    #[error("Failed to write bundle to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create babel config {}", path.display())]
    Scaffold {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find `{tool}`; install it into node_modules or set toolchain.{tool} in minroll.toml")]
    ToolNotFound { tool: String },

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MinrollError>;

impl MinrollError {
    pub fn invalid_entry(path: impl Into<PathBuf>) -> Self {
        Self::InvalidEntry { path: path.into() }
    }

    pub fn stage_failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PipelineStage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Get error category for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidEntry { .. } => ErrorCategory::Input,
            Self::PipelineStage { .. } => ErrorCategory::Pipeline,
            Self::Write { .. } => ErrorCategory::Output,
            Self::Scaffold { .. } | Self::Io(_) => ErrorCategory::FileSystem,
            Self::ToolNotFound { .. } | Self::Template { .. } => ErrorCategory::Toolchain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Pipeline,
    Output,
    FileSystem,
    Toolchain,
}

impl From<handlebars::RenderError> for MinrollError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template {
            message: err.to_string(),
        }
    }
}

impl From<handlebars::TemplateError> for MinrollError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template {
            message: err.to_string(),
        }
    }
}
