use super::success_response;
use crate::errors::IntoErrorResponse;
use crate::session::SessionManager;
use holdem_engine::logger::HandHistory;
use serde::Serialize;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;

#[derive(Debug, Serialize)]
pub struct HandListResponse {
    pub count: usize,
    pub hands: Vec<HandHistory>,
}

/// `GET /api/hands`: every finished hand, oldest first.
pub async fn list_hands(sessions: Arc<SessionManager>) -> Response {
    match sessions.list_histories() {
        Ok(hands) => success_response(
            StatusCode::OK,
            HandListResponse {
                count: hands.len(),
                hands,
            },
        ),
        Err(err) => err.into_http_response(),
    }
}
