mod auth;
mod posts;

use axum::Router;
use axum::body::Body;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;

use crate::SharedState;
use crate::error::{RequestError, UserErrorResponse};

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(RequestError))]
pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

pub async fn not_found(_state: State<SharedState>, _req: Request<Body>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        AppJson(UserErrorResponse {
            message: "Not Found".to_string(),
        }),
    )
}

pub fn route_handler(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/auth/start", get(auth::start))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/status", get(auth::status))
        .route("/posts", post(posts::create))
        .route("/posts/run-batch", get(posts::run_batch))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Serialize)]
struct ServiceBanner {
    success: bool,
    service: &'static str,
    version: &'static str,
}

async fn root() -> impl IntoResponse {
    AppJson(ServiceBanner {
        success: true,
        service: "syndica",
        version: env!("CARGO_PKG_VERSION"),
    })
}
