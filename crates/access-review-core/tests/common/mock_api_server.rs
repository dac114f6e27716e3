//! Mock Kubernetes API server answering `SelfSubjectAccessReview` requests
//!
//! Decisions are driven by the request's verb:
//! - `delete` is denied
//! - `reject` answers 403 with a plain-text body
//! - `garbage` answers 200 with a body that is not a review
//! - anything else is allowed

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Every review body and authorization header the server received
#[derive(Clone, Default)]
pub struct ApiServerState {
    pub reviews: Arc<Mutex<Vec<Value>>>,
    pub authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

async fn self_subject_access_review(
    State(state): State<ApiServerState>,
    headers: HeaderMap,
    Json(review): Json<Value>,
) -> Response {
    let authorization =
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
    state.authorizations.lock().unwrap().push(authorization);
    state.reviews.lock().unwrap().push(review.clone());

    let verb = review["spec"]["resourceAttributes"]["verb"].as_str().unwrap_or_default();
    match verb {
        "reject" => (StatusCode::FORBIDDEN, "selfsubjectaccessreviews is forbidden").into_response(),
        "garbage" => (StatusCode::OK, "<html>not a review</html>").into_response(),
        verb => {
            let allowed = verb != "delete";
            let mut answer = review;
            answer["status"] = json!({ "allowed": allowed, "reason": "mock" });
            Json(answer).into_response()
        },
    }
}

/// Start the mock API server on a random port
///
/// Returns the base URL, server handle, and recorded state
pub async fn start_mock_api_server() -> (String, JoinHandle<()>, ApiServerState) {
    let state = ApiServerState::default();

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let app = Router::new()
        .route(
            "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews",
            post(self_subject_access_review),
        )
        .with_state(state.clone());

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, handle, state)
}
