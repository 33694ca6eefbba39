//! Status state machines for claims and analyses.
//!
//! Both lifecycles are monotonic toward a terminal state per analysis
//! attempt; terminal states are never re-entered. Re-analysis means a new
//! `Analysis` record, not a status reset.

use serde::{Deserialize, Serialize};
use veritas_common::{Error, Result};

/// Claim lifecycle: `pending → analyzing → {analyzed, rejected, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Analyzing,
    Analyzed,
    Rejected,
    Failed,
}

impl ClaimStatus {
    /// Whether this status is terminal for the current analysis attempt.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Analyzed | Self::Rejected | Self::Failed)
    }

    /// Whether `next` is a legal transition from this status.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Analyzing)
                | (Self::Analyzing, Self::Analyzed)
                | (Self::Analyzing, Self::Rejected)
                | (Self::Analyzing, Self::Failed)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::Failed)
        )
    }

    /// Validate a transition, returning `Error::StateTransition` when illegal.
    pub fn ensure_transition(self, next: Self) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::StateTransition(format!(
                "claim cannot move from {self:?} to {next:?}"
            )))
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Analyzed => "analyzed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Analysis lifecycle: `pending → processing → {completed, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Whether this status is terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` is a legal transition from this status.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
                | (Self::Pending, Self::Failed)
        )
    }

    /// Validate a transition, returning `Error::StateTransition` when illegal.
    pub fn ensure_transition(self, next: Self) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::StateTransition(format!(
                "analysis cannot move from {self:?} to {next:?}"
            )))
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_happy_path() {
        assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Analyzing));
        assert!(ClaimStatus::Analyzing.can_transition_to(ClaimStatus::Analyzed));
        assert!(ClaimStatus::Analyzing.can_transition_to(ClaimStatus::Rejected));
        assert!(ClaimStatus::Analyzing.can_transition_to(ClaimStatus::Failed));
    }

    #[test]
    fn claim_never_reverses_to_pending() {
        for s in [
            ClaimStatus::Analyzing,
            ClaimStatus::Analyzed,
            ClaimStatus::Rejected,
            ClaimStatus::Failed,
        ] {
            assert!(!s.can_transition_to(ClaimStatus::Pending));
        }
    }

    #[test]
    fn terminal_claim_states_are_final() {
        for s in [ClaimStatus::Analyzed, ClaimStatus::Rejected, ClaimStatus::Failed] {
            assert!(s.is_terminal());
            for next in [
                ClaimStatus::Pending,
                ClaimStatus::Analyzing,
                ClaimStatus::Analyzed,
                ClaimStatus::Rejected,
                ClaimStatus::Failed,
            ] {
                assert!(!s.can_transition_to(next));
            }
        }
    }

    #[test]
    fn analysis_reaches_exactly_one_terminal() {
        assert!(AnalysisStatus::Pending.can_transition_to(AnalysisStatus::Processing));
        assert!(AnalysisStatus::Processing.can_transition_to(AnalysisStatus::Completed));
        assert!(AnalysisStatus::Processing.can_transition_to(AnalysisStatus::Failed));
        assert!(!AnalysisStatus::Completed.can_transition_to(AnalysisStatus::Failed));
        assert!(!AnalysisStatus::Failed.can_transition_to(AnalysisStatus::Completed));
    }

    #[test]
    fn ensure_transition_reports_error() {
        let err = ClaimStatus::Analyzed
            .ensure_transition(ClaimStatus::Analyzing)
            .unwrap_err();
        assert!(matches!(err, veritas_common::Error::StateTransition(_)));
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ClaimStatus::Analyzing).unwrap(),
            "\"analyzing\""
        );
        assert_eq!(
            serde_json::to_string(&AnalysisStatus::Processing).unwrap(),
            "\"processing\""
        );
    }
}
