use axum::extract::{Query, State};
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use snafu::OptionExt as _;
use syndica_core::Timestamp;
use syndica_publisher::TOKEN_PROVIDER;
use tracing::info;

use crate::error::{MissingFieldSnafu, RequestResult};
use crate::routes::AppJson;
use crate::{LOG_TARGET, SharedState};

#[derive(Serialize)]
pub struct AuthUrlResponse {
    pub success: bool,
    pub url: String,
}

/// Hand out the consent URL for the one-time authorization flow.
pub async fn start(State(state): State<SharedState>) -> AppJson<AuthUrlResponse> {
    AppJson(AuthUrlResponse {
        success: true,
        url: state.blogger.authorization_url(),
    })
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// OAuth redirect target: exchange the code, persist the refresh token.
pub async fn callback(
    State(state): State<SharedState>,
    Query(query): Query<CallbackQuery>,
) -> RequestResult<Redirect> {
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .context(MissingFieldSnafu { field: "code" })?;

    let tokens = state.blogger.exchange_code(&code).await?;
    let refresh_token = tokens.require_refresh_token()?;

    state
        .db
        .save_refresh_token(TOKEN_PROVIDER, refresh_token, Timestamp::now())
        .await?;

    info!(target: LOG_TARGET, "Authorized with Blogger, refresh token stored");
    Ok(Redirect::to("/"))
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub success: bool,
    pub authenticated: bool,
}

pub async fn status(State(state): State<SharedState>) -> RequestResult<AppJson<AuthStatusResponse>> {
    let authenticated = state.gateway.auth_status().await?;

    Ok(AppJson(AuthStatusResponse {
        success: true,
        authenticated,
    }))
}
