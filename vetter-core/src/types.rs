//! Domain types shared between the assistant client and the session engine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Contact fields extracted from a candidate's résumé.
///
/// Each field is independently nullable until confirmed by the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CandidateInfo {
    /// Returns true when all three contact fields are present.
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.email.is_some() && self.phone.is_some()
    }

    pub fn get(&self, field: CandidateField) -> Option<&str> {
        match field {
            CandidateField::Name => self.name.as_deref(),
            CandidateField::Email => self.email.as_deref(),
            CandidateField::Phone => self.phone.as_deref(),
        }
    }

    pub fn set(&mut self, field: CandidateField, value: String) {
        match field {
            CandidateField::Name => self.name = Some(value),
            CandidateField::Email => self.email = Some(value),
            CandidateField::Phone => self.phone = Some(value),
        }
    }
}

/// One of the three contact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateField {
    Name,
    Email,
    Phone,
}

impl CandidateField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }
}

impl fmt::Display for CandidateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
        }
    }
}

/// Difficulty tier of an interview question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// How long the candidate gets to answer a question of this tier.
    pub fn answer_window(&self) -> Duration {
        match self {
            Self::Easy => Duration::from_secs(20),
            Self::Medium => Duration::from_secs(60),
            Self::Hard => Duration::from_secs(120),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Easy" => Some(Self::Easy),
            "Medium" => Some(Self::Medium),
            "Hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "Easy"),
            Self::Medium => write!(f, "Medium"),
            Self::Hard => write!(f, "Hard"),
        }
    }
}

/// A generated interview question. Immutable once generated; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub difficulty: Difficulty,
}

/// Score and written assessment produced for a finished transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Overall score in 0..=100.
    pub score: u8,
    pub summary: String,
}

/// Raw bytes of an uploaded résumé document.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }
}

// Manual Debug: the payload can be an entire PDF, which must never end up in
// a log line.
impl fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeFile")
            .field("file_name", &self.file_name)
            .field("len", &self.data.len())
            .finish()
    }
}
