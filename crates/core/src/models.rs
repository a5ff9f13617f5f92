use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Leave,
    Payslip,
    Appraisal,
    Interview,
    MentalHealth,
    Escalate,
    General,
    Unknown,
}

impl Intent {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches(|c| c == '*' || c == '`').to_lowercase().as_str() {
            "leave" => Some(Self::Leave),
            "payslip" | "salary" => Some(Self::Payslip),
            "appraisal" | "performance" => Some(Self::Appraisal),
            "interview" => Some(Self::Interview),
            "mental_health" | "mental health" => Some(Self::MentalHealth),
            "escalate" | "escalation" => Some(Self::Escalate),
            "general" => Some(Self::General),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Payslip => "payslip",
            Self::Appraisal => "appraisal",
            Self::Interview => "interview",
            Self::MentalHealth => "mental_health",
            Self::Escalate => "escalate",
            Self::General => "general",
            Self::Unknown => "unknown",
        }
    }

    /// Intents that bypass normal handling and go to a human.
    /// `Escalate` is the canonical escalation label; `MentalHealth` is kept
    /// as a distinct classification but routes the same way.
    pub fn escalates(self) -> bool {
        matches!(self, Self::Escalate | Self::MentalHealth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub at: DateTime<Utc>,
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            speaker: Speaker::System,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSuggestion {
    pub text: String,
}

impl ActionSuggestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub doc_id: String,
    pub title: String,
    pub snippet: String,
    pub score: f32,
    pub source_path: String,
}

/// Everything a UI layer needs back from one `submit` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub intent: Intent,
    pub response: String,
    pub action: Option<ActionSuggestion>,
    pub escalated: bool,
}
