use crate::domain::models::Participant;
use crate::services::api::{ApiClient, ParticipantUpdate};

pub const EDUCATION_OPTIONS: [&str; 6] = [
    "High school",
    "Some college",
    "Bachelor's degree",
    "Master's degree",
    "Doctorate",
    "Other",
];

pub const GENDER_OPTIONS: [&str; 5] = ["Woman", "Man", "Non-binary", "Prefer not to say", "Other"];

/// Hinted bounds for the age prompt. The server re-checks the range; the
/// client only suggests it.
pub const AGE_MIN: i32 = 18;
pub const AGE_MAX: i32 = 120;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsentError {
    #[error("You must confirm consent to continue.")]
    NotAcknowledged,
    #[error("Please provide a name alias.")]
    MissingAlias,
    #[error("Please select an education level from the list.")]
    InvalidEducation,
    #[error("Please select a gender option from the list.")]
    InvalidGender,
}

/// Demographics plus the binding acknowledgment checkbox.
#[derive(Debug, Clone, Default)]
pub struct ConsentForm {
    pub alias: String,
    pub age: Option<i32>,
    pub education: String,
    pub gender: String,
    pub acknowledged: bool,
}

impl ConsentForm {
    /// Prefill from whatever the participant record already carries.
    pub fn prefill(user: &Participant) -> Self {
        Self {
            alias: user.alias.clone().unwrap_or_default(),
            age: user.age,
            education: user.education.clone().unwrap_or_default(),
            gender: user.gender.clone().unwrap_or_default(),
            acknowledged: user.has_consented(),
        }
    }

    /// Client-side validation; an unchecked acknowledgment fails before
    /// anything else is looked at and nothing is sent.
    pub fn validate(&self) -> Result<ParticipantUpdate, ConsentError> {
        if !self.acknowledged {
            return Err(ConsentError::NotAcknowledged);
        }
        let alias = self.alias.trim();
        if alias.is_empty() {
            return Err(ConsentError::MissingAlias);
        }
        if !EDUCATION_OPTIONS.contains(&self.education.as_str()) {
            return Err(ConsentError::InvalidEducation);
        }
        if !GENDER_OPTIONS.contains(&self.gender.as_str()) {
            return Err(ConsentError::InvalidGender);
        }

        Ok(ParticipantUpdate {
            alias: Some(alias.to_string()),
            age: self.age,
            education: Some(self.education.clone()),
            gender: Some(self.gender.clone()),
            consented: Some(true),
        })
    }
}

/// Consent step: validates the form, sends the partial update, and retains
/// the failure message and entered values when anything goes wrong.
pub struct ConsentFlow {
    pub form: ConsentForm,
    error: Option<String>,
}

impl ConsentFlow {
    pub fn new(user: &Participant) -> Self {
        Self {
            form: ConsentForm::prefill(user),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit(&mut self, api: &ApiClient, user_id: i64) -> Option<Participant> {
        self.error = None;
        let updates = match self.form.validate() {
            Ok(updates) => updates,
            Err(err) => {
                self.error = Some(err.to_string());
                return None;
            }
        };

        match api.update_participant(user_id, &updates).await {
            Ok(user) => {
                tracing::info!("participant {} recorded consent", user.participant_id);
                Some(user)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }
}
