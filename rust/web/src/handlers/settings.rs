use super::{parse_body, success_response};
use crate::settings::{SettingsError, SettingsStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;

/// Partial update; absent fields keep their value.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UpdateSettingsRequest {
    pub starting_stack: Option<u32>,
    pub small_blind: Option<u32>,
    pub big_blind: Option<u32>,
    pub default_players: Option<usize>,
    pub default_strategy: Option<String>,
    pub session_timeout_minutes: Option<u64>,
}

/// `GET /api/settings`
pub async fn get_settings(store: Arc<SettingsStore>) -> Response {
    match store.get() {
        Ok(settings) => success_response(StatusCode::OK, settings),
        Err(err) => settings_error(err),
    }
}

/// `PUT /api/settings`. Running hands keep the table they were dealt with.
pub async fn update_settings(store: Arc<SettingsStore>, body: Bytes) -> Response {
    let request: UpdateSettingsRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let updated = store.modify(|current| {
        if let Some(stack) = request.starting_stack {
            current.starting_stack = stack;
        }
        if let Some(sb) = request.small_blind {
            current.small_blind = sb;
        }
        if let Some(bb) = request.big_blind {
            current.big_blind = bb;
        }
        if let Some(players) = request.default_players {
            current.default_players = players;
        }
        if let Some(strategy) = request.default_strategy {
            current.default_strategy = strategy.trim().to_ascii_lowercase();
        }
        if let Some(timeout) = request.session_timeout_minutes {
            current.session_timeout_minutes = timeout;
        }
    });

    match updated {
        Ok(settings) => success_response(StatusCode::OK, settings),
        Err(err) => settings_error(err),
    }
}

fn settings_error(err: SettingsError) -> Response {
    use crate::errors::IntoErrorResponse;
    err.into_http_response()
}
