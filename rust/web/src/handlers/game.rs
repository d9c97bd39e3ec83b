use super::{parse_body, success_response};
use crate::errors::IntoErrorResponse;
use crate::session::{SessionError, SessionId, SessionManager, StartHandRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActionRequest {
    /// `fold`, `check`, `call`, `bet`, `raise` or `all-in`
    pub action: String,
    /// Chips for bet and raise. Integers, or strings holding one.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

impl ActionRequest {
    fn amount(&self) -> Result<Option<i64>, SessionError> {
        use serde_json::Value;

        let invalid = |value: &Value| {
            SessionError::InvalidAmount(format!(
                "amount must be a whole number of chips, got {value}"
            ))
        };
        match &self.amount {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| invalid(value)),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(value @ Value::String(s)) => {
                s.trim().parse::<i64>().map(Some).map_err(|_| invalid(value))
            }
            Some(other) => Err(invalid(other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResetRequest {
    pub starting_stack: u32,
}

/// `POST /api/hands/start`
///
/// Deals a hand and plays the automated seats ahead of the human. Answers
/// `201` with `{game_id, log, finished, state}`, or `409` when the table
/// already has a running hand.
pub async fn start_hand(sessions: Arc<SessionManager>, body: Bytes) -> Response {
    let request: StartHandRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match sessions.start_hand(request) {
        Ok(started) => success_response(StatusCode::CREATED, started),
        Err(err) => session_error(err),
    }
}

/// `GET /api/hands/{id}`: the live hand, or its history once finished.
pub async fn get_hand(sessions: Arc<SessionManager>, id: SessionId) -> Response {
    match sessions.state(&id) {
        Ok(outcome) => success_response(StatusCode::OK, outcome),
        Err(err) => session_error(err),
    }
}

/// `POST /api/hands/{id}/action` with `{action, amount?}`.
///
/// Rejected actions answer `400` and leave the hand untouched.
pub async fn submit_action(sessions: Arc<SessionManager>, id: SessionId, body: Bytes) -> Response {
    let request: ActionRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let outcome = request
        .amount()
        .and_then(|amount| sessions.apply_action(&id, &request.action, amount));
    match outcome {
        Ok(outcome) => success_response(StatusCode::OK, outcome),
        Err(err) => session_error(err),
    }
}

/// `GET /api/hands/{id}/result`
pub async fn get_result(sessions: Arc<SessionManager>, id: SessionId) -> Response {
    match sessions.get_history(&id) {
        Ok(hand) => success_response(StatusCode::OK, hand),
        Err(err) => session_error(err),
    }
}

/// `POST /api/reset` with `{starting_stack}`
pub async fn reset(sessions: Arc<SessionManager>, body: Bytes) -> Response {
    let request: ResetRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match sessions.reset(request.starting_stack) {
        Ok(reset) => success_response(StatusCode::OK, reset),
        Err(err) => session_error(err),
    }
}

fn session_error(err: SessionError) -> Response {
    err.into_http_response()
}
