use serde::Serialize;

/// Result of one submission attempt, as reported in the batch summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PublishErrorBody>,
}

impl PublishOutcome {
    pub fn posted(blog_url: Option<String>, post_id: Option<String>) -> Self {
        Self {
            success: true,
            blog_url,
            post_id,
            error: None,
        }
    }

    pub fn failed(error: PublishErrorBody) -> Self {
        Self {
            success: false,
            blog_url: None,
            post_id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// What one publication batch did.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub saved: usize,
    pub message: String,
    pub articles: Vec<PublishOutcome>,
}

impl BatchSummary {
    /// A batch that did not touch any article state.
    pub fn noop(message: impl Into<String>) -> Self {
        Self {
            saved: 0,
            message: message.into(),
            articles: vec![],
        }
    }
}
