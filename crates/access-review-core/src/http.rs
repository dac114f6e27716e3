//! `SelfSubjectAccessReview` client for the Kubernetes authorization API

use std::time::Duration;

use access_review_config::CheckerConfig;
use access_review_types::{Decision, PermissionRequest};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    checker::AccessChecker,
    error::{CheckError, Result},
};

const ACCESS_REVIEW_PATH: &str = "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews";
const API_VERSION: &str = "authorization.k8s.io/v1";

/// Asks the API server whether the current identity may perform a request
pub struct HttpAccessChecker {
    http_client: HttpClient,
    base_url: String,
    bearer_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessReviewBody<'a> {
    api_version: &'static str,
    kind: &'static str,
    spec: ReviewSpec<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewSpec<'a> {
    resource_attributes: &'a PermissionRequest,
}

#[derive(Debug, Deserialize)]
struct AccessReviewResponse {
    status: ReviewStatus,
}

#[derive(Debug, Deserialize)]
struct ReviewStatus {
    allowed: bool,
    #[serde(default)]
    reason: Option<String>,
}

impl HttpAccessChecker {
    /// Create a checker against the API server at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| CheckError::Transport(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http_client, base_url, bearer_token })
    }

    pub fn from_config(config: &CheckerConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.bearer_token.clone(), config.timeout())
    }

    fn review_url(&self) -> String {
        format!("{}{}", self.base_url, ACCESS_REVIEW_PATH)
    }
}

#[async_trait]
impl AccessChecker for HttpAccessChecker {
    async fn check_access(&self, request: &PermissionRequest) -> Result<Decision> {
        let body = AccessReviewBody {
            api_version: API_VERSION,
            kind: "SelfSubjectAccessReview",
            spec: ReviewSpec { resource_attributes: request },
        };

        let mut call = self.http_client.post(self.review_url()).json(&body);
        if let Some(ref token) = self.bearer_token {
            call = call.bearer_auth(token);
        }

        let response = call.send().await.map_err(|e| CheckError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read access review error body");
                    "<unreadable response body>".to_string()
                },
            };
            return Err(CheckError::Rejected { status: status.as_u16(), message });
        }

        let review = response
            .json::<AccessReviewResponse>()
            .await
            .map_err(|e| CheckError::InvalidResponse(e.to_string()))?;

        if let Some(reason) = review.status.reason.as_deref().filter(|r| !r.is_empty()) {
            tracing::trace!(allowed = review.status.allowed, reason, "Access review answered");
        }
        Ok(Decision::from(review.status.allowed))
    }
}
