use crate::domain::models::Participant;
use crate::services::api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    Register,
}

impl LoginMode {
    pub fn toggle(&mut self) {
        *self = match self {
            LoginMode::SignIn => LoginMode::Register,
            LoginMode::Register => LoginMode::SignIn,
        };
    }

    pub fn heading(&self) -> &'static str {
        match self {
            LoginMode::SignIn => "Welcome back",
            LoginMode::Register => "Create your participant ID",
        }
    }

    pub fn lead(&self) -> &'static str {
        match self {
            LoginMode::SignIn => "Sign in to continue to consent and the BFI-2 survey.",
            LoginMode::Register => {
                "Set a secure passcode. You will use this ID for the full study."
            }
        }
    }

    pub fn switch_hint(&self) -> &'static str {
        match self {
            LoginMode::SignIn => "New to the study? Type 'switch' to create an account.",
            LoginMode::Register => "Already have an ID? Type 'switch' to sign in instead.",
        }
    }
}

/// Register-or-login step. Keeps the chosen mode and the last failure so the
/// screen can re-render inline; a successful submit yields the participant
/// and the caller decides the next screen from their consent state.
pub struct LoginFlow {
    pub mode: LoginMode,
    error: Option<String>,
}

impl LoginFlow {
    pub fn new() -> Self {
        Self {
            mode: LoginMode::SignIn,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Trims the participant id and dispatches by mode. Blank credentials
    /// are rejected locally without touching the network.
    pub async fn submit(
        &mut self,
        api: &ApiClient,
        participant_id: &str,
        passcode: &str,
    ) -> Option<Participant> {
        self.error = None;
        let participant_id = participant_id.trim();
        if participant_id.is_empty() || passcode.is_empty() {
            self.error = Some("Participant ID and passcode are both required.".to_string());
            return None;
        }

        let result = match self.mode {
            LoginMode::SignIn => api.login(participant_id, passcode).await,
            LoginMode::Register => api.register(participant_id, passcode).await,
        };

        match result {
            Ok(user) => {
                tracing::info!("participant {} signed in", user.participant_id);
                Some(user)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }
}
