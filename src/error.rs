use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

/// Failures raised by the source and target adapters.
///
/// The orchestrator catches these at the single-item boundary; only a failure
/// while listing items escapes a run.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("{system} rejected the credentials: {message}")]
    Auth {
        system: &'static str,
        message: String,
    },

    #[error("{system} request failed: {message}")]
    Transport {
        system: &'static str,
        message: String,
    },

    #[error("{system} item {id} not found")]
    NotFound { system: &'static str, id: String },

    #[error("Jira: {0}")]
    Target(String),
}

impl MigrateError {
    pub fn kind(&self) -> &'static str {
        match self {
            MigrateError::Auth { .. } => "auth",
            MigrateError::Transport { .. } => "transport",
            MigrateError::NotFound { .. } => "not_found",
            MigrateError::Target(_) => "target",
        }
    }

    pub fn transport(system: &'static str, err: impl std::fmt::Display) -> Self {
        MigrateError::Transport {
            system,
            message: err.to_string(),
        }
    }
}
