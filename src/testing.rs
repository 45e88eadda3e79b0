//! In-process stub of the study API for tests. Each test assembles the
//! routes it needs and gets a base URL on an ephemeral port.

use axum::Router;
use serde_json::{json, Value};

pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve stub");
    });
    format!("http://{addr}")
}

pub fn participant_json(id: i64, participant_id: &str, consented: bool) -> Value {
    json!({
        "id": id,
        "participant_id": participant_id,
        "alias": null,
        "age": null,
        "education": null,
        "gender": null,
        "consent_signed_at": if consented { json!("2026-08-01T09:30:00Z") } else { Value::Null },
        "created_at": "2026-08-01T09:00:00Z",
        "updated_at": "2026-08-01T09:30:00Z",
    })
}

/// A question set of `count` items with the standard five-point scale.
pub fn question_set_json(count: usize) -> Value {
    let items: Vec<Value> = (1..=count as i64)
        .map(|id| {
            json!({
                "id": id,
                "text": format!("I am someone who is statement {id}."),
                "domain": "E",
                "facet": "Sociability",
                "reverse": id % 2 == 0,
            })
        })
        .collect();
    json!({
        "title": "Big Five Inventory-2",
        "description": "Baseline personality inventory.",
        "instructions": "Please respond to each statement based on how well it describes you.",
        "scale": {
            "1": "Disagree strongly",
            "2": "Disagree a little",
            "3": "Neutral; no opinion",
            "4": "Agree a little",
            "5": "Agree strongly",
        },
        "items": items,
    })
}

pub fn submitted_response_json(user_id: i64, responses: Value) -> Value {
    json!({
        "id": 31,
        "user_id": user_id,
        "survey_type": "pre",
        "responses": responses,
        "scored": {
            "summary": {"E": 3.25, "A": 4.0, "C": 2.75, "N": 1.5, "O": 4.5},
            "domains": {
                "Extraversion": {
                    "name": "Extraversion",
                    "code": "E",
                    "score": 3.25,
                    "interpretation": "average",
                },
            },
        },
        "created_at": "2026-08-02T10:00:00Z",
        "updated_at": "2026-08-02T10:00:00Z",
    })
}
