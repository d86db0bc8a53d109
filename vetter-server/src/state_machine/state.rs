//! State types for the interview session state machine.
//!
//! This module defines the explicit state machine for the single live
//! interview session. Following the principle of "make illegal states
//! unrepresentable", we use an enum whose variants carry exactly the data
//! that is valid for each status: the answer list only exists alongside the
//! question list it indexes into, and a finished transcript always has one
//! answer per question.

use std::fmt;

use vetter_core::types::{CandidateInfo, Question};

/// Validation message shown when the candidate confirms with fields missing.
pub const MISSING_FIELDS_ERROR: &str = "Please fill in all required fields.";

/// Outcome of the finalize step that runs once a session completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeStatus {
    /// Scoring call is outstanding.
    Pending,
    /// Transcript was scored and handed to the archive.
    Scored { score: u8 },
    /// Scoring failed; eligible for retry.
    Failed { error: String },
}

impl fmt::Display for FinalizeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "scoring in progress"),
            Self::Scored { score } => write!(f, "scored {}/100", score),
            Self::Failed { error } => write!(f, "scoring failed: {}", error),
        }
    }
}

/// The explicit state machine for the live interview session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session underway. `error` carries the message from a failed
    /// extraction or generation attempt, cleared on the next upload.
    Idle { error: Option<String> },

    /// Résumé uploaded; contact-field extraction is outstanding.
    Parsing,

    /// Extraction finished but left gaps; waiting for the candidate to fill
    /// the missing fields and confirm.
    AwaitingInfo {
        candidate: CandidateInfo,
        error: Option<String>,
    },

    /// All contact fields present; waiting for the candidate to begin.
    Ready { candidate: CandidateInfo },

    /// Question generation is outstanding.
    Generating { candidate: CandidateInfo },

    /// Timed question-and-answer loop.
    ///
    /// Invariant: `answers.len() == current_index`; an answer is recorded
    /// exactly when the pointer advances.
    InProgress {
        candidate: CandidateInfo,
        questions: Vec<Question>,
        answers: Vec<String>,
        current_index: usize,
    },

    /// Terminal state for the transcript; `finalize` tracks the scoring and
    /// archive side effect.
    ///
    /// Invariant: `answers.len() == questions.len()`.
    Completed {
        candidate: CandidateInfo,
        questions: Vec<Question>,
        answers: Vec<String>,
        finalize: FinalizeStatus,
    },
}

impl SessionState {
    /// Fresh empty session.
    pub fn idle() -> Self {
        Self::Idle { error: None }
    }

    /// Status tag as exposed to the UI.
    pub fn status_name(&self) -> &'static str {
        match self {
            Self::Idle { .. } => "idle",
            Self::Parsing => "parsing",
            Self::AwaitingInfo { .. } => "awaiting_info",
            Self::Ready { .. } => "ready",
            Self::Generating { .. } => "generating",
            Self::InProgress { .. } => "in_progress",
            Self::Completed { .. } => "completed",
        }
    }

    /// Candidate contact fields, if the state carries any.
    pub fn candidate(&self) -> Option<&CandidateInfo> {
        match self {
            Self::Idle { .. } | Self::Parsing => None,
            Self::AwaitingInfo { candidate, .. }
            | Self::Ready { candidate }
            | Self::Generating { candidate }
            | Self::InProgress { candidate, .. }
            | Self::Completed { candidate, .. } => Some(candidate),
        }
    }

    /// Current diagnostic message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Idle { error } | Self::AwaitingInfo { error, .. } => error.as_deref(),
            Self::Completed {
                finalize: FinalizeStatus::Failed { error },
                ..
            } => Some(error),
            _ => None,
        }
    }

    /// Question list, once generated.
    pub fn questions(&self) -> &[Question] {
        match self {
            Self::InProgress { questions, .. } | Self::Completed { questions, .. } => questions,
            _ => &[],
        }
    }

    /// Recorded answers so far.
    pub fn answers(&self) -> &[String] {
        match self {
            Self::InProgress { answers, .. } | Self::Completed { answers, .. } => answers,
            _ => &[],
        }
    }

    /// Pointer into the question list while the interview is live.
    pub fn current_index(&self) -> Option<usize> {
        match self {
            Self::InProgress { current_index, .. } => Some(*current_index),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetter_core::types::Difficulty;

    fn sample_questions() -> Vec<Question> {
        vec![Question {
            id: 1,
            text: "Explain ownership.".to_string(),
            difficulty: Difficulty::Easy,
        }]
    }

    #[test]
    fn test_default_is_empty_idle() {
        let state = SessionState::default();
        assert_eq!(state, SessionState::Idle { error: None });
        assert_eq!(state.status_name(), "idle");
        assert!(state.candidate().is_none());
        assert!(state.questions().is_empty());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(SessionState::Parsing.status_name(), "parsing");
        assert_eq!(
            SessionState::Ready {
                candidate: CandidateInfo::default(),
            }
            .status_name(),
            "ready"
        );
    }

    #[test]
    fn test_error_surfaces_from_finalize_failure() {
        let state = SessionState::Completed {
            candidate: CandidateInfo::default(),
            questions: sample_questions(),
            answers: vec!["ans".to_string()],
            finalize: FinalizeStatus::Failed {
                error: "scoring call timed out".to_string(),
            },
        };
        assert_eq!(state.error(), Some("scoring call timed out"));
    }

    #[test]
    fn test_current_index_only_in_progress() {
        let state = SessionState::InProgress {
            candidate: CandidateInfo::default(),
            questions: sample_questions(),
            answers: vec![],
            current_index: 0,
        };
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(SessionState::Parsing.current_index(), None);
    }

    #[test]
    fn test_finalize_status_display() {
        assert_eq!(
            FinalizeStatus::Scored { score: 82 }.to_string(),
            "scored 82/100"
        );
        assert_eq!(
            FinalizeStatus::Failed {
                error: "timeout".to_string()
            }
            .to_string(),
            "scoring failed: timeout"
        );
    }
}
