use serde::Serialize;

/// Error taxonomy for a single snapshot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network failure or timeout reaching an upstream.
    Transport,
    /// Upstream answered with a non-success status.
    Protocol,
    /// Upstream answered with a body of the wrong shape.
    Decode,
    /// Credential exchange rejected.
    Auth,
    /// A required input field never resolved, so the query was skipped.
    DependencyUnresolved,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Decode => "decode",
            Self::Auth => "auth",
            Self::DependencyUnresolved => "dependency_unresolved",
        }
    }
}

/// A field that fell back to its default, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl FieldFailure {
    #[must_use]
    pub fn new(field: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            detail: detail.into(),
        }
    }
}
