use crate::domain::models::{AnswerMap, Question, QuestionSet, SubmittedResponse};
use crate::services::api::ApiClient;

/// Items per page; the last page may be shorter.
pub const PAGE_SIZE: usize = 10;

/// Label for the baseline wave. Any existing response counts as completion
/// regardless of its label; this constant is used for submission only.
pub const SURVEY_TYPE: &str = "pre";

#[derive(Debug)]
pub enum SurveyState {
    Loading,
    Answering,
    /// Terminal for this mount: a response already exists and its summary is
    /// rendered read-only.
    Completed { response: SubmittedResponse },
    /// Terminal for this mount: a load fetch failed. Re-entering the flow is
    /// the only retry.
    Failed { message: String },
}

/// Paginated questionnaire session. One instance owns the answer map, page
/// index and loaded question set for its whole lifetime.
pub struct SurveyFlow {
    state: SurveyState,
    questions: Option<QuestionSet>,
    answers: AnswerMap,
    page: usize,
    submit_error: Option<String>,
    submitting: bool,
}

impl SurveyFlow {
    pub fn new() -> Self {
        Self {
            state: SurveyState::Loading,
            questions: None,
            answers: AnswerMap::new(),
            page: 0,
            submit_error: None,
            submitting: false,
        }
    }

    pub fn state(&self) -> &SurveyState {
        &self.state
    }

    pub fn question_set(&self) -> Option<&QuestionSet> {
        self.questions.as_ref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Initial load. The prior-response lookup is a prerequisite gate: when
    /// it returns anything, the flow completes immediately and the question
    /// set is never requested.
    pub async fn load(&mut self, api: &ApiClient, user_id: i64) {
        let prior = match api.participant_responses(user_id).await {
            Ok(prior) => prior,
            Err(err) => {
                self.state = SurveyState::Failed {
                    message: err.to_string(),
                };
                return;
            }
        };

        if let Some(response) = prior.into_iter().next() {
            tracing::info!("participant {user_id} already has a submitted response");
            self.state = SurveyState::Completed { response };
            return;
        }

        match api.questions().await {
            Ok(set) => {
                self.questions = Some(set);
                self.state = SurveyState::Answering;
            }
            Err(err) => {
                self.state = SurveyState::Failed {
                    message: err.to_string(),
                };
            }
        }
    }

    fn items(&self) -> &[Question] {
        self.questions
            .as_ref()
            .map(|set| set.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_questions(&self) -> usize {
        self.items().len()
    }

    pub fn total_pages(&self) -> usize {
        (self.total_questions() + PAGE_SIZE - 1) / PAGE_SIZE
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn current_items(&self) -> &[Question] {
        let items = self.items();
        let start = self.page * PAGE_SIZE;
        if start >= items.len() {
            return &[];
        }
        let end = (start + PAGE_SIZE).min(items.len());
        &items[start..end]
    }

    /// Record a Likert selection, overwriting any prior value for the item.
    /// Selections are never cleared within a session. Out-of-range values
    /// have no widget equivalent and are ignored.
    pub fn answer(&mut self, question_id: i64, value: u8) {
        if !(1..=5).contains(&value) {
            return;
        }
        self.answers.insert(question_id, value);
    }

    pub fn answer_for(&self, question_id: i64) -> Option<u8> {
        self.answers.get(&question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Percent of the instrument answered, rounded; 0 when there are no
    /// questions.
    pub fn progress(&self) -> u8 {
        let total = self.total_questions();
        if total == 0 {
            return 0;
        }
        ((self.answered_count() as f64 / total as f64) * 100.0).round() as u8
    }

    pub fn page_complete(&self) -> bool {
        self.current_items()
            .iter()
            .all(|item| self.answers.contains_key(&item.id))
    }

    pub fn is_last_page(&self) -> bool {
        let pages = self.total_pages();
        pages == 0 || self.page + 1 >= pages
    }

    pub fn can_go_prev(&self) -> bool {
        self.page > 0
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    pub fn can_go_next(&self) -> bool {
        !self.is_last_page() && self.page_complete()
    }

    /// Advances only when every item on the current page is answered,
    /// clamped at the last page.
    pub fn next_page(&mut self) {
        if self.can_go_next() {
            self.page += 1;
        }
    }

    pub fn can_submit(&self) -> bool {
        self.questions.is_some() && self.is_last_page() && self.page_complete() && !self.submitting
    }

    /// Send the full answer map with the fixed survey-type label. On success
    /// the caller leaves this flow and hands the response to the summary
    /// view; on failure the flow stays on the same page with every answer
    /// intact and submission re-enabled.
    pub async fn submit(&mut self, api: &ApiClient, user_id: i64) -> Option<SubmittedResponse> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        self.submit_error = None;

        let result = api.submit_responses(user_id, &self.answers, SURVEY_TYPE).await;
        self.submitting = false;

        match result {
            Ok(response) => {
                tracing::info!(
                    "participant {user_id} submitted {} answers",
                    response.responses.len()
                );
                Some(response)
            }
            Err(err) => {
                self.submit_error = Some(err.to_string());
                None
            }
        }
    }
}

impl Default for SurveyFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{question_set_json, serve, submitted_response_json};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn flow_with_questions(count: usize) -> SurveyFlow {
        let set: QuestionSet = serde_json::from_value(question_set_json(count)).unwrap();
        SurveyFlow {
            state: SurveyState::Answering,
            questions: Some(set),
            answers: AnswerMap::new(),
            page: 0,
            submit_error: None,
            submitting: false,
        }
    }

    fn answer_page(flow: &mut SurveyFlow) {
        let ids: Vec<i64> = flow.current_items().iter().map(|item| item.id).collect();
        for id in ids {
            flow.answer(id, 3);
        }
    }

    #[test]
    fn test_page_counts() {
        assert_eq!(flow_with_questions(25).total_pages(), 3);
        assert_eq!(flow_with_questions(10).total_pages(), 1);
        assert_eq!(flow_with_questions(0).total_pages(), 0);
        assert_eq!(flow_with_questions(11).total_pages(), 2);
    }

    #[test]
    fn test_empty_instrument_has_no_progress() {
        let flow = flow_with_questions(0);
        assert_eq!(flow.progress(), 0);
        assert!(flow.current_items().is_empty());
        assert!(flow.is_last_page());
    }

    #[test]
    fn test_pagination_across_three_pages() {
        let mut flow = flow_with_questions(25);
        assert_eq!(flow.current_items().len(), 10);
        assert!(!flow.can_go_prev());
        assert!(!flow.can_go_next());

        // Next stays put until the page is complete.
        flow.next_page();
        assert_eq!(flow.page(), 0);

        answer_page(&mut flow);
        assert!(flow.page_complete());
        assert!(flow.can_go_next());
        flow.next_page();
        assert_eq!(flow.page(), 1);
        assert!(flow.can_go_prev());

        answer_page(&mut flow);
        flow.next_page();
        assert_eq!(flow.page(), 2);
        assert_eq!(flow.current_items().len(), 5);
        assert!(flow.is_last_page());

        // Clamped at the last page even when complete.
        answer_page(&mut flow);
        flow.next_page();
        assert_eq!(flow.page(), 2);

        flow.prev_page();
        flow.prev_page();
        flow.prev_page();
        assert_eq!(flow.page(), 0);
    }

    #[test]
    fn test_progress_is_monotone_and_bounded() {
        let mut flow = flow_with_questions(60);
        let mut last = flow.progress();
        for id in 1..=60 {
            flow.answer(id, 5);
            let now = flow.progress();
            assert!(now >= last);
            assert!(now <= 100);
            last = now;
        }
        assert_eq!(flow.progress(), 100);

        // Overwriting never moves the needle.
        flow.answer(1, 2);
        assert_eq!(flow.progress(), 100);
        assert_eq!(flow.answer_for(1), Some(2));
    }

    #[test]
    fn test_out_of_range_values_are_ignored() {
        let mut flow = flow_with_questions(10);
        flow.answer(1, 0);
        flow.answer(1, 6);
        assert_eq!(flow.answer_for(1), None);
        flow.answer(1, 5);
        assert_eq!(flow.answer_for(1), Some(5));
    }

    #[test]
    fn test_submit_gate_on_single_page() {
        let mut flow = flow_with_questions(10);
        for id in 1..=9 {
            flow.answer(id, 4);
        }
        assert!(!flow.can_submit());
        flow.answer(10, 4);
        assert!(flow.can_submit());
    }

    #[tokio::test]
    async fn test_existing_response_short_circuits_question_fetch() {
        let question_hits = Arc::new(AtomicUsize::new(0));
        let counter = question_hits.clone();
        let router = Router::new()
            .route(
                "/bfi2/users/7/responses",
                get(|| async { Json(json!([submitted_response_json(7, json!({"1": 3}))])) }),
            )
            .route(
                "/bfi2/questions",
                get(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Json(question_set_json(10))
                    }
                }),
            );
        let api = ApiClient::new(serve(router).await);

        let mut flow = SurveyFlow::new();
        flow.load(&api, 7).await;
        let SurveyState::Completed { response } = flow.state() else {
            panic!("expected completed state");
        };
        assert_eq!(response.scored.summary["E"], 3.25);
        assert_eq!(question_hits.load(Ordering::SeqCst), 0);

        // Reloading the flow yields the same summary without a submission.
        let mut again = SurveyFlow::new();
        again.load(&api, 7).await;
        assert!(matches!(again.state(), SurveyState::Completed { .. }));
        assert_eq!(question_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_prior_response_loads_questions() {
        let router = Router::new()
            .route("/bfi2/users/7/responses", get(|| async { Json(json!([])) }))
            .route(
                "/bfi2/questions",
                get(|| async { Json(question_set_json(25)) }),
            );
        let api = ApiClient::new(serve(router).await);

        let mut flow = SurveyFlow::new();
        flow.load(&api, 7).await;
        assert!(matches!(flow.state(), SurveyState::Answering));
        assert_eq!(flow.total_pages(), 3);
    }

    #[tokio::test]
    async fn test_load_failure_is_terminal_with_message() {
        let router = Router::new().route(
            "/bfi2/users/7/responses",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "responses unavailable"})),
                )
            }),
        );
        let api = ApiClient::new(serve(router).await);

        let mut flow = SurveyFlow::new();
        flow.load(&api, 7).await;
        let SurveyState::Failed { message } = flow.state() else {
            panic!("expected failed state");
        };
        assert_eq!(message, "responses unavailable");
    }

    #[tokio::test]
    async fn test_submit_sends_complete_answer_map() {
        let router = Router::new().route(
            "/bfi2/responses",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["user_id"], 7);
                assert_eq!(body["survey_type"], "pre");
                assert_eq!(body["responses"].as_object().unwrap().len(), 10);
                let responses = body["responses"].clone();
                Json(submitted_response_json(7, responses))
            }),
        );
        let api = ApiClient::new(serve(router).await);

        let mut flow = flow_with_questions(10);
        answer_page(&mut flow);
        let response = flow.submit(&api, 7).await.unwrap();
        assert_eq!(response.user_id, 7);
        assert_eq!(response.responses.len(), 10);
        assert!(flow.submit_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_submission_retains_answers_and_reenables() {
        let router = Router::new().route(
            "/bfi2/responses",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "scoring failed"})),
                )
            }),
        );
        let api = ApiClient::new(serve(router).await);

        let mut flow = flow_with_questions(10);
        answer_page(&mut flow);
        assert!(flow.submit(&api, 7).await.is_none());
        assert_eq!(flow.submit_error(), Some("scoring failed"));
        assert!(matches!(flow.state(), SurveyState::Answering));
        assert_eq!(flow.answered_count(), 10);
        assert!(flow.can_submit());
    }

    #[tokio::test]
    async fn test_submit_is_refused_before_completion() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/bfi2/responses",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(submitted_response_json(7, json!({})))
                }
            }),
        );
        let api = ApiClient::new(serve(router).await);

        let mut flow = flow_with_questions(10);
        flow.answer(1, 3);
        assert!(flow.submit(&api, 7).await.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
