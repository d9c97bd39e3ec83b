use std::time::Instant;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::{Reply, Response};
use warp::Filter;

#[derive(Debug, Clone)]
struct RequestStart {
    path: String,
    method: String,
    started: Instant,
}

/// Wraps `filter` so every request it answers is logged on arrival and on
/// completion, with status and duration.
pub fn with_request_logging<F, T>(
    filter: F,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone
where
    F: Filter<Extract = (T,), Error = Rejection> + Clone + Send + Sync + 'static,
    T: Reply,
{
    warp::path::full()
        .and(warp::method())
        .map(|path: warp::path::FullPath, method: warp::http::Method| {
            tracing::debug!(path = %path.as_str(), method = %method, "incoming request");
            RequestStart {
                path: path.as_str().to_string(),
                method: method.to_string(),
                started: Instant::now(),
            }
        })
        .and(filter)
        .map(|start: RequestStart, reply: T| {
            let response = reply.into_response();
            log_response(
                response.status(),
                &start.path,
                &start.method,
                start.started.elapsed().as_millis(),
            );
            response
        })
}

pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u128) {
    if status.is_server_error() {
        tracing::error!(
            status = status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            status = status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "client error"
        );
    } else {
        tracing::info!(
            status = status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[tokio::test]
    async fn logs_arrival_and_completion() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());
        let _guard = tracing::subscriber::set_default(registry);

        let route = warp::path!("ping")
            .and(warp::get())
            .map(|| warp::reply::json(&"pong"));
        let logged = with_request_logging(route);

        let response = warp::test::request()
            .method("GET")
            .path("/ping")
            .reply(&logged)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let entries = subscriber.entries();
        assert!(entries
            .iter()
            .any(|e| e.level == Level::DEBUG && e.message == "incoming request"));
        let done = entries
            .iter()
            .find(|e| e.message == "request completed")
            .expect("completion logged");
        assert_eq!(done.field("path"), Some("/ping"));
        assert_eq!(done.field("status"), Some("200"));
    }

    #[test]
    fn levels_follow_status_class() {
        let subscriber = TestLogSubscriber::new();
        let registry = Registry::default().with(subscriber.clone().into_layer::<Registry>());

        tracing::subscriber::with_default(registry, || {
            log_response(StatusCode::OK, "/api/hands", "GET", 3);
            log_response(StatusCode::NOT_FOUND, "/api/hands/x", "GET", 1);
            log_response(StatusCode::INTERNAL_SERVER_ERROR, "/api/hands/x/action", "POST", 9);
        });

        let levels: Vec<Level> = subscriber.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![Level::INFO, Level::WARN, Level::ERROR]);
    }
}
