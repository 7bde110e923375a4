use std::sync::Arc;

use async_trait::async_trait;
use snafu::{OptionExt as _, ResultExt as _, Snafu};
use syndica_blogger::{BloggerClient, BloggerError, PostedDraft};
use syndica_core::{Article, PublishErrorBody, PublishOutcome};
use syndica_db::{Database, DbError};
use tracing::info;

use crate::format::format_article;

const LOG_TARGET: &str = "syndica::gateway";

/// Provider key the refresh token is stored under.
pub const TOKEN_PROVIDER: &str = "blogger";

#[derive(Debug, Snafu)]
pub enum PublishError {
    #[snafu(display("Not authenticated with the blog service"))]
    NotAuthenticated,
    #[snafu(display("Blog API error: {source}"))]
    UpstreamApi { source: BloggerError },
    #[snafu(display("Blog API response missing the expected fields"))]
    InvalidResponse { body: String },
    #[snafu(display("Token store error: {source}"))]
    TokenStore { source: DbError },
}

impl PublishError {
    /// Stable wire code reported in batch summaries.
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::NotAuthenticated => "NOT_AUTHENTICATED",
            PublishError::UpstreamApi { .. } => "BLOGGER_API_ERROR",
            PublishError::InvalidResponse { .. } => "INVALID_RESPONSE",
            PublishError::TokenStore { .. } => "STORAGE_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            PublishError::UpstreamApi {
                source:
                    BloggerError::ApiRejected { status, body }
                    | BloggerError::TokenRejected { status, body },
            } => Some(serde_json::json!({ "status": status, "body": body })),
            PublishError::InvalidResponse { body } => {
                Some(serde_json::json!({ "body": body }))
            }
            _ => None,
        }
    }

    pub fn to_outcome(&self) -> PublishOutcome {
        PublishOutcome::failed(PublishErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        })
    }
}

/// Submits one article to the external blog.
///
/// Trait seam so the batch can run against fakes in tests.
#[async_trait]
pub trait PostGateway: Send + Sync {
    async fn submit(&self, article: &Article) -> Result<PostedDraft, PublishError>;
}

/// Article title with the configured brand tagline appended.
pub fn build_title(article: &Article, suffix: &str) -> String {
    format!("{}{suffix}", article.title)
}

/// Post labels: the article's tags, with its category appended last unless
/// already present (exact string match).
pub fn build_labels(article: &Article) -> Vec<String> {
    let mut labels = article.tags.clone();
    if let Some(category) = &article.category {
        if !labels.contains(category) {
            labels.push(category.clone());
        }
    }
    labels
}

/// Production [`PostGateway`] backed by the Blogger API.
pub struct BloggerGateway {
    client: Arc<BloggerClient>,
    db: Arc<Database>,
    title_suffix: String,
    refresh_token_override: Option<String>,
}

impl BloggerGateway {
    pub fn new(
        client: Arc<BloggerClient>,
        db: Arc<Database>,
        title_suffix: String,
        refresh_token_override: Option<String>,
    ) -> Self {
        Self {
            client,
            db,
            title_suffix,
            refresh_token_override,
        }
    }

    async fn resolve_refresh_token(&self) -> Result<String, PublishError> {
        if let Some(token) = &self.refresh_token_override {
            return Ok(token.clone());
        }

        self.db
            .get_refresh_token(TOKEN_PROVIDER)
            .await
            .context(TokenStoreSnafu)?
            .context(NotAuthenticatedSnafu)
    }

    async fn access_token(&self) -> Result<String, PublishError> {
        let refresh_token = self.resolve_refresh_token().await?;

        match self.client.refresh_access_token(&refresh_token).await {
            Ok(access_token) => Ok(access_token),
            // A rejected refresh is a revoked/expired grant, not an API fault
            Err(BloggerError::TokenRejected { .. }) => Err(PublishError::NotAuthenticated),
            Err(source) => Err(PublishError::UpstreamApi { source }),
        }
    }

    /// Whether a usable (refreshable) token is currently available.
    pub async fn auth_status(&self) -> Result<bool, PublishError> {
        match self.access_token().await {
            Ok(_) => Ok(true),
            Err(PublishError::NotAuthenticated) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Create a draft post from caller-supplied fields, bypassing the
    /// formatter. The direct post-creation endpoint uses this.
    pub async fn publish_raw(
        &self,
        title: &str,
        content: &str,
        labels: &[String],
    ) -> Result<PostedDraft, PublishError> {
        let access_token = self.access_token().await?;

        match self
            .client
            .create_draft_post(&access_token, title, content, labels)
            .await
        {
            Ok(draft) => Ok(draft),
            Err(BloggerError::InvalidResponse { body, .. }) => {
                Err(PublishError::InvalidResponse { body })
            }
            Err(source) => Err(PublishError::UpstreamApi { source }),
        }
    }
}

#[async_trait]
impl PostGateway for BloggerGateway {
    async fn submit(&self, article: &Article) -> Result<PostedDraft, PublishError> {
        let title = build_title(article, &self.title_suffix);
        let content = format_article(article);
        let labels = build_labels(article);

        info!(target: LOG_TARGET, title = %article.title, "Submitting article to Blogger");
        self.publish_raw(&title, &content, &labels).await
    }
}

#[cfg(test)]
mod tests {
    use syndica_core::{ArticleStatus, Timestamp};

    use super::*;

    fn article_with_labels(tags: &[&str], category: Option<&str>) -> Article {
        Article {
            title: "Title".to_string(),
            content: String::new(),
            tags: tags.iter().map(ToString::to_string).collect(),
            category: category.map(ToString::to_string),
            excerpt: None,
            original_url: None,
            source: None,
            featured_image: None,
            status: ArticleStatus::Pending,
            created_at: Timestamp::ZERO,
            published_at: None,
        }
    }

    #[test]
    fn category_appended_last_unless_present() {
        let article = article_with_labels(&["a", "b"], Some("c"));
        assert_eq!(build_labels(&article), vec!["a", "b", "c"]);

        let article = article_with_labels(&["a", "c", "b"], Some("c"));
        assert_eq!(build_labels(&article), vec!["a", "c", "b"]);

        let article = article_with_labels(&[], Some("c"));
        assert_eq!(build_labels(&article), vec!["c"]);

        let article = article_with_labels(&["a"], None);
        assert_eq!(build_labels(&article), vec!["a"]);
    }

    #[test]
    fn title_gets_the_brand_suffix() {
        let article = article_with_labels(&[], None);
        assert_eq!(
            build_title(&article, " | Syndica Daily"),
            "Title | Syndica Daily"
        );
    }
}
