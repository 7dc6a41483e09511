// src/error.rs
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Graph API error ({status}): {message}")]
    Graph { status: u16, message: String },

    #[error("Workbook not accessible at {path}: {message}")]
    Workbook { path: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used when a failure has to be reported to the
/// operator, e.g. in a CONNECTION_STATUS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Config,
    Auth,
    Transient,
    Internal,
}

impl SourceError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            SourceError::InvalidConfig(_) | SourceError::Workbook { .. } => FailureKind::Config,
            SourceError::Authentication(_) => FailureKind::Auth,
            SourceError::Graph { status, .. } if *status == 401 || *status == 403 => {
                FailureKind::Auth
            }
            SourceError::Graph { .. } | SourceError::HttpRequest(_) => FailureKind::Transient,
            _ => FailureKind::Internal,
        }
    }
}
