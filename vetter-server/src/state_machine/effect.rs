//! Effects (side effects as data).
//!
//! Effects describe what should happen as a result of a state transition.
//! They are pure data - the interpreter executes them against the assistant
//! client, the answer-timer registry, and the candidate archive. This
//! separation enables testing the transition logic without mocking HTTP.

use vetter_core::types::{CandidateInfo, Difficulty, Question, ResumeFile};

/// All effects that can be produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    // =========================================================================
    // Assistant Effects
    // =========================================================================
    /// Extract contact fields from the uploaded résumé.
    ExtractCandidateInfo { resume: ResumeFile },

    /// Generate the interview question list.
    GenerateQuestions,

    /// Score the finished transcript.
    ScoreTranscript {
        questions: Vec<Question>,
        answers: Vec<String>,
    },

    // =========================================================================
    // Archive Effects
    // =========================================================================
    /// Append a finished candidate to the archive.
    ///
    /// The archive itself guards against a duplicate candidate id, so this
    /// effect is safe to emit more than once for the same session.
    ArchiveCandidate {
        candidate: CandidateInfo,
        questions: Vec<Question>,
        answers: Vec<String>,
        score: u8,
        summary: String,
    },

    // =========================================================================
    // Timer Effects
    // =========================================================================
    /// Start the countdown for a question. Replaces any timer already
    /// running.
    StartAnswerTimer {
        question_index: usize,
        difficulty: Difficulty,
    },

    /// Stop the countdown, if one is running.
    CancelAnswerTimer,

    // =========================================================================
    // Logging Effects
    // =========================================================================
    /// Log a message (for debugging/tracing).
    Log { level: LogLevel, message: String },
}

/// Log level for logging effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}
