use crate::domain::task::DataShapeWarning;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Why a selected file was refused during staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedType { mime_type: String },
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnsupportedType { mime_type } => {
                write!(f, "{} is not a valid image (JPG, PNG, GIF, WebP)", mime_type)
            }
            RejectReason::TooLarge { limit, .. } => {
                write!(f, "exceeds the {} MB size limit", limit / (1024 * 1024))
            }
        }
    }
}

/// Every failure the client layer can surface. None of them is fatal to the
/// page: each ends in a user-visible message and a re-enterable state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("File {file_name} rejected: {reason}")]
    RejectedFile { file_name: String, reason: RejectReason },

    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    #[error("Malformed page data ({0})")]
    DataShape(DataShapeWarning),

    #[error("Cannot {operation} while the editor is {state}")]
    InvalidState { operation: &'static str, state: &'static str },
}

impl PortfolioError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PortfolioError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        PortfolioError::Transport {
            status,
            message: message.into(),
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            PortfolioError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<DataShapeWarning> for PortfolioError {
    fn from(warning: DataShapeWarning) -> Self {
        PortfolioError::DataShape(warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn color(self) -> &'static str {
        match self {
            NoticeLevel::Success => "#10b981",
            NoticeLevel::Info => "#3b82f6",
            NoticeLevel::Warning => "#f59e0b",
            NoticeLevel::Error => "#ef4444",
        }
    }
}

/// A message for the toast area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// User-friendly error messages
pub struct UserErrorFormatter;

impl UserErrorFormatter {
    pub fn format_for_ui(error: &PortfolioError) -> Notice {
        match error {
            PortfolioError::Validation { message, .. } => Notice::error(message.clone()),
            PortfolioError::RejectedFile { file_name, reason } => {
                Notice::error(format!("File {} {}", file_name, reason))
            }
            PortfolioError::Transport { message, .. } => Notice::error(message.clone()),
            PortfolioError::DataShape(_) => Notice::warning("Some task data could not be read and was skipped"),
            PortfolioError::InvalidState { .. } => Notice::warning(error.to_string()),
        }
    }
}

/// Structured logging helpers
pub struct LogHelper;

impl LogHelper {
    pub fn log_data_shape_warnings(source: &str, warnings: &[DataShapeWarning]) {
        for warning in warnings {
            warn!(
                source = %source,
                field = %warning.field,
                detail = %warning.detail,
                "Malformed page data skipped"
            );
        }
    }

    pub fn log_rejected_file(error: &PortfolioError) {
        if let PortfolioError::RejectedFile { file_name, reason } = error {
            warn!(file = %file_name, reason = %reason, "Rejected step image");
        }
    }

    pub fn log_transport_failure(operation: &str, error: &PortfolioError) {
        error!(
            operation = %operation,
            status = ?error.http_status(),
            error = %error,
            "Request to portfolio backend failed"
        );
    }
}
