//! Events that trigger state transitions.
//!
//! Events represent things that happened - candidate actions arriving over
//! the HTTP surface, answer-timer expiries, and results coming back from the
//! assistant collaborators. They are inputs to the pure transition function.

use vetter_core::types::{CandidateField, CandidateInfo, Question, ResumeFile};

/// Answer text recorded when the countdown expires before the candidate
/// submitted anything.
pub const NO_ANSWER_TEXT: &str = "No answer provided.";

/// All events that can trigger state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // =========================================================================
    // Candidate Actions
    // =========================================================================
    /// A résumé document was uploaded.
    ResumeUploaded { resume: ResumeFile },

    /// The candidate filled in a missing contact field.
    FieldEdited {
        field: CandidateField,
        value: String,
    },

    /// The candidate confirmed their contact details.
    DetailsConfirmed,

    /// The candidate backed out before starting the interview.
    InterviewCancelled,

    /// The candidate asked to begin the interview.
    InterviewStarted,

    /// An answer was submitted, by the candidate or by the expiring timer.
    ///
    /// Carries the index of the question it answers so that a late duplicate
    /// (a timer firing after a manual submit already advanced the pointer)
    /// can be recognised and discarded.
    AnswerSubmitted { question_index: usize, text: String },

    /// Retry scoring after a finalize failure.
    ScoringRetryRequested,

    /// Full reset back to an empty session.
    SessionRestarted,

    // =========================================================================
    // Collaborator Results
    // =========================================================================
    /// Contact-field extraction finished; any field may still be absent.
    ExtractionSucceeded { candidate: CandidateInfo },

    /// Contact-field extraction failed.
    ExtractionFailed { error: String },

    /// Question generation finished.
    QuestionsReady { questions: Vec<Question> },

    /// Question generation failed.
    GenerationFailed { error: String },

    /// Transcript scoring finished.
    ScoringSucceeded { score: u8, summary: String },

    /// Transcript scoring failed.
    ScoringFailed { error: String },
}

impl Event {
    /// Returns a summary of the event suitable for logging.
    ///
    /// This avoids logging résumé bytes and full answer/question text.
    pub fn log_summary(&self) -> String {
        match self {
            Event::ResumeUploaded { resume } => {
                format!(
                    "ResumeUploaded {{ file: {}, bytes: {} }}",
                    resume.file_name,
                    resume.data.len()
                )
            }
            Event::FieldEdited { field, .. } => {
                format!("FieldEdited {{ field: {} }}", field)
            }
            Event::DetailsConfirmed => "DetailsConfirmed".to_string(),
            Event::InterviewCancelled => "InterviewCancelled".to_string(),
            Event::InterviewStarted => "InterviewStarted".to_string(),
            Event::AnswerSubmitted {
                question_index,
                text,
            } => {
                format!(
                    "AnswerSubmitted {{ question: {}, chars: {} }}",
                    question_index,
                    text.len()
                )
            }
            Event::ScoringRetryRequested => "ScoringRetryRequested".to_string(),
            Event::SessionRestarted => "SessionRestarted".to_string(),
            Event::ExtractionSucceeded { candidate } => {
                format!(
                    "ExtractionSucceeded {{ name: {}, email: {}, phone: {} }}",
                    candidate.name.is_some(),
                    candidate.email.is_some(),
                    candidate.phone.is_some()
                )
            }
            Event::ExtractionFailed { error } => {
                format!("ExtractionFailed {{ error: {} }}", error)
            }
            Event::QuestionsReady { questions } => {
                format!("QuestionsReady {{ count: {} }}", questions.len())
            }
            Event::GenerationFailed { error } => {
                format!("GenerationFailed {{ error: {} }}", error)
            }
            Event::ScoringSucceeded { score, .. } => {
                format!("ScoringSucceeded {{ score: {} }}", score)
            }
            Event::ScoringFailed { error } => {
                format!("ScoringFailed {{ error: {} }}", error)
            }
        }
    }
}
