use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity, demographics and consent record for one study participant.
/// Server-owned; the client holds a disposable copy in the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub participant_id: String,
    pub alias: Option<String>,
    pub age: Option<i32>,
    pub education: Option<String>,
    pub gender: Option<String>,
    pub consent_signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// The survey is gated on a signed consent timestamp.
    pub fn has_consented(&self) -> bool {
        self.consent_signed_at.is_some()
    }
}

/// One BFI-2 inventory item. The reverse flag is informational here;
/// reverse scoring happens server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub domain: String,
    pub facet: String,
    pub reverse: bool,
}

/// The full instrument plus its presentation metadata. `scale` maps each
/// Likert value 1-5 to its descriptive label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    pub title: String,
    pub description: String,
    pub instructions: String,
    pub scale: BTreeMap<u8, String>,
    pub items: Vec<Question>,
}

/// Question id -> Likert value in 1..=5. Keys need not cover all questions
/// until submission time.
pub type AnswerMap = BTreeMap<i64, u8>;

/// Server-confirmed record of one completed survey instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedResponse {
    pub id: i64,
    pub user_id: i64,
    pub survey_type: String,
    pub responses: AnswerMap,
    pub scored: ScoredResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scored summary returned by the API. The scorer attaches more detail
/// (facets, raw responses) than the client renders; unknown fields are
/// dropped at the parse boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoredResult {
    pub summary: BTreeMap<String, f64>,
    #[serde(default)]
    pub domains: BTreeMap<String, DomainScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainScore {
    pub name: String,
    pub code: String,
    pub score: f64,
    pub interpretation: String,
}

/// The five BFI-2 trait domains, keyed by their single-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitDomain {
    Extraversion,
    Agreeableness,
    Conscientiousness,
    NegativeEmotionality,
    OpenMindedness,
}

impl TraitDomain {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "E" => Some(TraitDomain::Extraversion),
            "A" => Some(TraitDomain::Agreeableness),
            "C" => Some(TraitDomain::Conscientiousness),
            "N" => Some(TraitDomain::NegativeEmotionality),
            "O" => Some(TraitDomain::OpenMindedness),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TraitDomain::Extraversion => "E",
            TraitDomain::Agreeableness => "A",
            TraitDomain::Conscientiousness => "C",
            TraitDomain::NegativeEmotionality => "N",
            TraitDomain::OpenMindedness => "O",
        }
    }

    /// Participant-facing trait name. "N" keeps the label participants know
    /// from the questionnaire hand-out.
    pub fn display_name(&self) -> &'static str {
        match self {
            TraitDomain::Extraversion => "Extraversion",
            TraitDomain::Agreeableness => "Agreeableness",
            TraitDomain::Conscientiousness => "Conscientiousness",
            TraitDomain::NegativeEmotionality => "Neuroticism",
            TraitDomain::OpenMindedness => "Open-Mindedness",
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_participant() -> Participant {
    Participant {
        id: 7,
        participant_id: "PM-042".to_string(),
        alias: None,
        age: None,
        education: None,
        gender: None,
        consent_signed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
