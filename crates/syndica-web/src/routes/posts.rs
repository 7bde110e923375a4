use axum::extract::State;
use serde::{Deserialize, Serialize};
use snafu::OptionExt as _;
use syndica_blogger::PostedDraft;
use syndica_core::BatchSummary;
use tracing::error;

use crate::error::{MissingFieldSnafu, RequestResult};
use crate::routes::AppJson;
use crate::{LOG_TARGET, SharedState};

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Serialize)]
pub struct CreatePostResponse {
    pub success: bool,
    pub data: PostedDraft,
    pub message: &'static str,
}

/// Create one draft post directly from the request body.
pub async fn create(
    State(state): State<SharedState>,
    AppJson(body): AppJson<CreatePostRequest>,
) -> RequestResult<AppJson<CreatePostResponse>> {
    let title = body
        .title
        .filter(|title| !title.trim().is_empty())
        .context(MissingFieldSnafu { field: "title" })?;
    let content = body
        .content
        .filter(|content| !content.trim().is_empty())
        .context(MissingFieldSnafu { field: "content" })?;

    let draft = state
        .gateway
        .publish_raw(&title, &content, &body.labels)
        .await?;

    Ok(AppJson(CreatePostResponse {
        success: true,
        data: draft,
        message: "Post created successfully",
    }))
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum RunBatchResponse {
    Done {
        success: bool,
        #[serde(flatten)]
        summary: BatchSummary,
    },
    SystemError {
        success: bool,
        error: &'static str,
        details: String,
    },
}

/// Trigger one publication batch; meant to be hit by an external scheduler.
///
/// Never fails past this boundary: storage-level trouble comes back as a
/// `success: false` JSON body rather than an error status.
pub async fn run_batch(State(state): State<SharedState>) -> AppJson<RunBatchResponse> {
    match state.pipeline.run_batch().await {
        Ok(summary) => AppJson(RunBatchResponse::Done {
            success: true,
            summary,
        }),
        Err(err) => {
            error!(target: LOG_TARGET, error = %err, "Batch run failed");
            AppJson(RunBatchResponse::SystemError {
                success: false,
                error: "System error",
                details: err.to_string(),
            })
        }
    }
}
