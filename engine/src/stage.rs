//! Request stage graph.
//!
//! Single encoding point for the legal edges of one aggregation request.
//! Stages are strictly ordered by data dependency; a fresh request starts a
//! fresh cursor at [`RequestStage::Idle`].

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStage {
    Idle,
    /// Liveness probes and both credential exchanges in flight together.
    ProbingAuthenticating,
    Collecting,
    Assembling,
    Rendered,
    Failed,
}

impl RequestStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ProbingAuthenticating => "probing_authenticating",
            Self::Collecting => "collecting",
            Self::Assembling => "assembling",
            Self::Rendered => "rendered",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rendered | Self::Failed)
    }
}

impl std::fmt::Display for RequestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEdge {
    Start,
    /// At least one session token resolved.
    SessionResolved,
    /// Neither principal could authenticate.
    NoSession,
    CollectJoined,
    Render,
    RenderFailed,
}

#[must_use]
pub fn transition_edge(from: RequestStage, to: RequestStage) -> Option<StageEdge> {
    use RequestStage::{Assembling, Collecting, Failed, Idle, ProbingAuthenticating, Rendered};

    match (from, to) {
        (Idle, ProbingAuthenticating) => Some(StageEdge::Start),
        (ProbingAuthenticating, Collecting) => Some(StageEdge::SessionResolved),
        (ProbingAuthenticating, Failed) => Some(StageEdge::NoSession),
        (Collecting, Assembling) => Some(StageEdge::CollectJoined),
        (Assembling, Rendered) => Some(StageEdge::Render),
        (Assembling, Failed) => Some(StageEdge::RenderFailed),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal request stage transition {from} -> {to}")]
pub struct StageTransitionError {
    pub from: RequestStage,
    pub to: RequestStage,
}

/// Tracks where one request is in the stage graph.
#[derive(Debug)]
pub struct StageCursor {
    current: RequestStage,
}

impl Default for StageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl StageCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: RequestStage::Idle,
        }
    }

    #[must_use]
    pub const fn current(&self) -> RequestStage {
        self.current
    }

    pub fn advance(&mut self, to: RequestStage) -> Result<StageEdge, StageTransitionError> {
        let from = self.current;
        let edge = transition_edge(from, to).ok_or(StageTransitionError { from, to })?;
        tracing::debug!(%from, %to, ?edge, "Request stage transition");
        self.current = to;
        Ok(edge)
    }
}
