use crate::Utils::task_parser::DocumentError;
use crate::numerical::solver_errors::NumError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabError {
    #[error(transparent)]
    Numerical(#[from] NumError),
    #[error("config: {0}")]
    Config(#[from] DocumentError),
    #[error("config: invalid value for `{key}`: {reason}")]
    ConfigValue { key: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("failed to render {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },
}

impl LabError {
    pub fn config_value(key: &str, reason: impl Into<String>) -> Self {
        LabError::ConfigValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn render(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        LabError::Render {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
