use beacon_types::{FailureKind, FieldFailure, Role};
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{endpoint}: transport error: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint}: upstream returned {status}")]
    Protocol {
        endpoint: String,
        status: StatusCode,
    },
    #[error("{endpoint}: unexpected response shape: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{role} authentication rejected: {reason}")]
    Auth { role: Role, reason: String },
    #[error("skipped: {dependency} did not resolve")]
    DependencyUnresolved { dependency: &'static str },
}

impl FetchError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Protocol { .. } => FailureKind::Protocol,
            Self::Decode { .. } => FailureKind::Decode,
            Self::Auth { .. } => FailureKind::Auth,
            Self::DependencyUnresolved { .. } => FailureKind::DependencyUnresolved,
        }
    }

    /// Transport and protocol failures share one recovery action: treat the field as absent.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Protocol { .. })
    }

    #[must_use]
    pub const fn unresolved(dependency: &'static str) -> Self {
        Self::DependencyUnresolved { dependency }
    }

    /// Record this error against a snapshot field.
    #[must_use]
    pub fn into_failure(self, field: impl Into<String>) -> FieldFailure {
        FieldFailure::new(field, self.kind(), self.to_string())
    }
}
