use reqwest::Response;
use serde::Deserialize;
use snafu::{OptionExt as _, ResultExt as _, Snafu};
use tracing::{debug, info};
use url::Url;

const LOG_TARGET: &str = "syndica::blogger";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const BLOGGER_API_BASE: &str = "https://www.googleapis.com/blogger/v3";
const BLOGGER_SCOPE: &str = "https://www.googleapis.com/auth/blogger";

#[derive(Debug, Snafu)]
pub enum BloggerError {
    #[snafu(display("HTTP request failed: {source}"))]
    Http { source: reqwest::Error },
    #[snafu(display("Token endpoint rejected the request ({status}): {body}"))]
    TokenRejected { status: u16, body: String },
    #[snafu(display("Blogger API rejected the request ({status}): {body}"))]
    ApiRejected { status: u16, body: String },
    #[snafu(display("Unexpected {endpoint} response shape: {body}"))]
    InvalidResponse {
        endpoint: &'static str,
        body: String,
    },
    #[snafu(display("No refresh token in token response; offline access was not granted"))]
    NoRefreshToken,
}

pub type BloggerResult<T> = std::result::Result<T, BloggerError>;

/// OAuth2 client credentials and the target blog, environment-sourced.
#[derive(Debug, Clone)]
pub struct BloggerConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub blog_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl Tokens {
    /// The refresh token, which is only present when the consent flow ran
    /// with offline access.
    pub fn require_refresh_token(&self) -> BloggerResult<&str> {
        self.refresh_token.as_deref().context(NoRefreshTokenSnafu)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PostedDraft {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BlogInfo {
    pub id: String,
    pub name: Option<String>,
    pub url: Option<String>,
}

/// Client for the Blogger v3 API and its OAuth2 token endpoints.
///
/// Stateless: tokens are passed in per call, persistence lives elsewhere.
pub struct BloggerClient {
    http: reqwest::Client,
    config: BloggerConfig,
}

impl BloggerClient {
    pub fn new(config: BloggerConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("syndica/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self { http, config }
    }

    pub fn blog_id(&self) -> &str {
        &self.config.blog_id
    }

    /// URL to send the user to for the one-time consent flow.
    pub fn authorization_url(&self) -> String {
        let mut url = Url::parse(GOOGLE_AUTH_URL).expect("Valid url");
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", BLOGGER_SCOPE)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        url.to_string()
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> BloggerResult<Tokens> {
        debug!(target: LOG_TARGET, "Exchanging authorization code");
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("redirect_uri", &self.config.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context(HttpSnafu)?;

        Self::parse_token_response(response).await
    }

    /// Trade a stored refresh token for a fresh access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> BloggerResult<String> {
        debug!(target: LOG_TARGET, "Refreshing access token");
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context(HttpSnafu)?;

        Ok(Self::parse_token_response(response).await?.access_token)
    }

    async fn parse_token_response(response: Response) -> BloggerResult<Tokens> {
        let status = response.status();
        let body = response.text().await.context(HttpSnafu)?;

        if !status.is_success() {
            return TokenRejectedSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        serde_json::from_str(&body)
            .ok()
            .context(InvalidResponseSnafu {
                endpoint: "token",
                body,
            })
    }

    /// Create a post on the configured blog in DRAFT state.
    pub async fn create_draft_post(
        &self,
        access_token: &str,
        title: &str,
        content: &str,
        labels: &[String],
    ) -> BloggerResult<PostedDraft> {
        let endpoint = format!("{BLOGGER_API_BASE}/blogs/{}/posts", self.config.blog_id);

        let response = self
            .http
            .post(&endpoint)
            .query(&[("isDraft", "true")])
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "kind": "blogger#post",
                "title": title,
                "content": content,
                "labels": labels,
            }))
            .send()
            .await
            .context(HttpSnafu)?;

        let status = response.status();
        let body = response.text().await.context(HttpSnafu)?;

        if !status.is_success() {
            return ApiRejectedSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let value: serde_json::Value =
            serde_json::from_str(&body)
                .ok()
                .context(InvalidResponseSnafu {
                    endpoint: "posts.insert",
                    body: body.clone(),
                })?;

        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .context(InvalidResponseSnafu {
                endpoint: "posts.insert",
                body: body.clone(),
            })?
            .to_string();
        let url = value
            .get("url")
            .and_then(|v| v.as_str())
            .map(ToString::to_string);

        info!(target: LOG_TARGET, post_id = %id, "Created draft post");
        Ok(PostedDraft { id, url })
    }

    /// Fetch basic information about the configured blog.
    pub async fn blog_info(&self, access_token: &str) -> BloggerResult<BlogInfo> {
        let endpoint = format!("{BLOGGER_API_BASE}/blogs/{}", self.config.blog_id);

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .context(HttpSnafu)?;

        let status = response.status();
        let body = response.text().await.context(HttpSnafu)?;

        if !status.is_success() {
            return ApiRejectedSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let value: serde_json::Value =
            serde_json::from_str(&body)
                .ok()
                .context(InvalidResponseSnafu {
                    endpoint: "blogs.get",
                    body: body.clone(),
                })?;

        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .context(InvalidResponseSnafu {
                endpoint: "blogs.get",
                body: body.clone(),
            })?
            .to_string();

        Ok(BlogInfo {
            id,
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            url: value
                .get("url")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> BloggerClient {
        BloggerClient::new(BloggerConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            blog_id: "12345".to_string(),
        })
    }

    #[test]
    fn authorization_url_carries_offline_consent() {
        let url = test_client().authorization_url();

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fblogger"));
    }

    #[test]
    fn tokens_require_refresh_token() {
        let tokens: Tokens =
            serde_json::from_str(r#"{"access_token": "at", "expires_in": 3599}"#)
                .expect("Valid tokens");
        assert!(matches!(
            tokens.require_refresh_token(),
            Err(BloggerError::NoRefreshToken)
        ));

        let tokens: Tokens =
            serde_json::from_str(r#"{"access_token": "at", "refresh_token": "rt"}"#)
                .expect("Valid tokens");
        assert_eq!(
            tokens.require_refresh_token().expect("Has refresh token"),
            "rt"
        );
    }
}
