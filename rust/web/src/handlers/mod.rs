pub mod game;
pub mod health;
pub mod history;
pub mod settings;

pub use game::{get_hand, get_result, reset, start_hand, submit_action, ActionRequest, ResetRequest};
pub use health::health;
pub use history::list_hands;
pub use settings::{get_settings, update_settings, UpdateSettingsRequest};

use crate::errors::ErrorResponse;
use serde::de::DeserializeOwned;
use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

pub(crate) fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

/// Decodes a JSON request body. An empty body decodes as `{}` so that
/// requests whose fields are all optional may omit it.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        &b"{}"[..]
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|err| {
        tracing::info!(error = %err, "malformed request body");
        ErrorResponse::new("invalid_request", format!("malformed request body: {err}"))
            .into_response(StatusCode::BAD_REQUEST)
    })
}
