use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use snafu::Snafu;
use syndica_blogger::BloggerError;
use syndica_db::DbError;
use syndica_publisher::PublishError;
use tracing::{debug, warn};

use crate::LOG_TARGET;
use crate::routes::AppJson;

/// Error by the user
#[derive(Debug, Snafu)]
pub enum UserRequestError {
    #[snafu(visibility(pub(crate)))]
    #[snafu(display("{field} is required"))]
    MissingField { field: &'static str },
}

// How we want user errors responses to be serialized
#[derive(Serialize)]
pub struct UserErrorResponse {
    pub message: String,
}

#[derive(Debug, Snafu)]
pub enum RequestError {
    #[snafu(transparent)]
    User { source: UserRequestError },
    #[snafu(transparent)]
    Publish { source: PublishError },
    #[snafu(transparent)]
    Db { source: DbError },
    #[snafu(transparent)]
    Blogger { source: BloggerError },
    #[snafu(display("Invalid request body: {reason}"))]
    BadBody { reason: String },
}

pub type RequestResult<T> = std::result::Result<T, RequestError>;

impl From<JsonRejection> for RequestError {
    fn from(rejection: JsonRejection) -> Self {
        RequestError::BadBody {
            reason: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        debug!(
            target: LOG_TARGET,
            err = %self,
            "Request Error"
        );

        let (status_code, message) = match &self {
            RequestError::User { source } => (StatusCode::BAD_REQUEST, source.to_string()),
            RequestError::BadBody { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            RequestError::Publish {
                source: PublishError::NotAuthenticated,
            } => (
                StatusCode::UNAUTHORIZED,
                "Not authenticated. Please authorize first.".to_string(),
            ),
            err => {
                warn!(
                    target: LOG_TARGET,
                    err = %err,
                    "Unexpected Request Error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Service Error".to_owned(),
                )
            }
        };

        (status_code, AppJson(UserErrorResponse { message })).into_response()
    }
}
