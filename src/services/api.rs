use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::models::{AnswerMap, Participant, QuestionSet, SubmittedResponse};

/// Shown when the server rejects a request without a usable error payload.
const DEFAULT_ERROR: &str = "Request failed";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success status. Displays as the server-provided detail alone so
    /// flows can surface it inline verbatim.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    /// Transport failure, or a 2xx body that failed to parse into its type.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The server returned no body where one was required.
    #[error("empty response body")]
    EmptyBody,
}

/// Error payloads are `{"detail": "..."}`; everything else falls back to
/// [`DEFAULT_ERROR`].
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    participant_id: &'a str,
    passcode: &'a str,
}

/// Partial update for `PATCH /users/{id}`; `None` fields are left out of the
/// body entirely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParticipantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consented: Option<bool>,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    user_id: i64,
    survey_type: &'a str,
    responses: &'a AnswerMap,
}

/// Typed wrapper over the study API. One shared connection pool; every
/// operation funnels through [`ApiClient::request`].
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
        }
    }

    pub async fn register(
        &self,
        participant_id: &str,
        passcode: &str,
    ) -> Result<Participant, ApiError> {
        self.request(
            Method::POST,
            "/auth/register",
            Some(&Credentials {
                participant_id,
                passcode,
            }),
        )
        .await
    }

    pub async fn login(
        &self,
        participant_id: &str,
        passcode: &str,
    ) -> Result<Participant, ApiError> {
        self.request(
            Method::POST,
            "/auth/login",
            Some(&Credentials {
                participant_id,
                passcode,
            }),
        )
        .await
    }

    pub async fn update_participant(
        &self,
        user_id: i64,
        updates: &ParticipantUpdate,
    ) -> Result<Participant, ApiError> {
        self.request(Method::PATCH, &format!("/users/{user_id}"), Some(updates))
            .await
    }

    pub async fn questions(&self) -> Result<QuestionSet, ApiError> {
        self.request::<(), _>(Method::GET, "/bfi2/questions", None)
            .await
    }

    /// Ordered list of the participant's submitted responses, possibly empty.
    pub async fn participant_responses(
        &self,
        user_id: i64,
    ) -> Result<Vec<SubmittedResponse>, ApiError> {
        self.request::<(), _>(Method::GET, &format!("/bfi2/users/{user_id}/responses"), None)
            .await
    }

    pub async fn submit_responses(
        &self,
        user_id: i64,
        responses: &AnswerMap,
        survey_type: &str,
    ) -> Result<SubmittedResponse, ApiError> {
        self.request(
            Method::POST,
            "/bfi2/responses",
            Some(&SubmitBody {
                user_id,
                survey_type,
                responses,
            }),
        )
        .await
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base, path);
        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| DEFAULT_ERROR.to_string());
            tracing::debug!("request to {url} failed with {status}: {message}");
            return Err(ApiError::Status { status, message });
        }

        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| ApiError::EmptyBody);
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{participant_json, serve};
    use axum::http::StatusCode as Code;
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_parses_participant() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async { Json(participant_json(7, "PM-042", false)) }),
        );
        let api = ApiClient::new(serve(router).await);

        let user = api.login("PM-042", "hunter2").await.unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.participant_id, "PM-042");
        assert!(!user.has_consented());
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async {
                (
                    Code::UNAUTHORIZED,
                    Json(json!({"detail": "Invalid passcode."})),
                )
            }),
        );
        let api = ApiClient::new(serve(router).await);

        let err = api.login("PM-042", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid passcode.");
    }

    #[tokio::test]
    async fn test_unparseable_error_body_falls_back() {
        let router = Router::new().route(
            "/bfi2/questions",
            get(|| async { (Code::INTERNAL_SERVER_ERROR, "everything is on fire") }),
        );
        let api = ApiClient::new(serve(router).await);

        let err = api.questions().await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed");
    }

    #[tokio::test]
    async fn test_patch_omits_unset_fields() {
        let router = Router::new().route(
            "/users/7",
            patch(|Json(body): Json<serde_json::Value>| async move {
                let object = body.as_object().unwrap();
                assert_eq!(object.get("alias").unwrap(), "Quiet Fox");
                assert_eq!(object.get("consented").unwrap(), true);
                assert!(!object.contains_key("age"));
                assert!(!object.contains_key("gender"));
                Json(participant_json(7, "PM-042", true))
            }),
        );
        let api = ApiClient::new(serve(router).await);

        let updates = ParticipantUpdate {
            alias: Some("Quiet Fox".to_string()),
            education: Some("Doctorate".to_string()),
            consented: Some(true),
            ..Default::default()
        };
        let user = api.update_participant(7, &updates).await.unwrap();
        assert!(user.has_consented());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_a_request_failure() {
        let router = Router::new().route(
            "/bfi2/questions",
            get(|| async { Json(json!({"title": "BFI-2"})) }),
        );
        let api = ApiClient::new(serve(router).await);

        assert!(matches!(
            api.questions().await.unwrap_err(),
            ApiError::Http(_)
        ));
    }
}
