use holdem_web::{AppContext, WebServer};
use serde_json::{json, Value};
use warp::http::StatusCode;

struct TestApp {
    context: AppContext,
}

impl TestApp {
    fn new() -> Self {
        Self {
            context: AppContext::new_for_tests(),
        }
    }

    async fn send(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let routes = WebServer::routes(&self.context);
        let mut request = warp::test::request().method(method).path(path);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.reply(&routes).await;
        let status = response.status();
        let body = if response.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(response.body()).expect("json body")
        };
        (status, body)
    }

    async fn start_passive(&self, seed: u64) -> Value {
        let (status, body) = self
            .send(
                "POST",
                "/api/hands/start",
                Some(json!({ "seed": seed, "strategy": "passive" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn act(&self, id: &str, action: Value) -> (StatusCode, Value) {
        self.send("POST", &format!("/api/hands/{id}/action"), Some(action))
            .await
    }
}

#[tokio::test]
async fn start_hand_returns_state_for_human_turn() {
    let app = TestApp::new();
    let body = app.start_passive(7).await;

    assert_eq!(body["finished"], false);
    let state = &body["state"];
    assert_eq!(state["actor"], 1);
    assert_eq!(state["to_call"], 40);
    assert_eq!(state["pot"], 60 + 3 * 40);
    assert_eq!(state["seats"].as_array().map(Vec::len), Some(6));

    let actions: Vec<&str> = state["legal_actions"]
        .as_array()
        .expect("legal actions")
        .iter()
        .filter_map(|a| a["action"].as_str())
        .collect();
    assert!(actions.contains(&"fold"));
    assert!(actions.contains(&"call"));
    assert!(!actions.contains(&"check"));

    let log: Vec<&str> = body["log"]
        .as_array()
        .expect("log")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(log.contains(&"Player 2 posts small blind - 20 chips"));
    assert!(log.contains(&"Player 3 posts big blind - 40 chips"));
}

#[tokio::test]
async fn passive_hand_plays_to_showdown_and_is_recorded() {
    let app = TestApp::new();
    let started = app.start_passive(11).await;
    let id = started["game_id"].as_str().expect("game id").to_string();

    let (status, body) = app.act(&id, json!({ "action": "call" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["street"], "flop");
    assert_eq!(body["to_call"], 0);

    let mut last = body;
    for _ in 0..3 {
        let (status, body) = app.act(&id, json!({ "action": "check" })).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        last = body;
    }
    assert_eq!(last["finished"], true);
    assert_eq!(last["persisted"], true);
    assert_eq!(last["hand"]["id"], id.as_str());
    assert!(last["hand"]["actions"]
        .as_str()
        .expect("actions")
        .contains("shows"));

    let (status, result) = app.send("GET", &format!("/api/hands/{id}/result"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result, last["hand"]);

    let (status, state) = app.send("GET", &format!("/api/hands/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["finished"], true);

    let (status, listing) = app.send("GET", "/api/hands", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
}

#[tokio::test]
async fn rejected_actions_leave_the_hand_untouched() {
    let app = TestApp::new();
    let started = app.start_passive(3).await;
    let id = started["game_id"].as_str().expect("game id").to_string();

    let (status, body) = app.act(&id, json!({ "action": "check" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "illegal_action");

    let (status, body) = app
        .act(&id, json!({ "action": "raise", "amount": "plenty" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");

    let (status, body) = app.act(&id, json!({ "action": "shove" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "illegal_action");

    let (status, state) = app.send("GET", &format!("/api/hands/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["log"], started["state"]["log"]);
    assert_eq!(state["to_call"], 40);
}

#[tokio::test]
async fn unknown_hand_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.send("GET", "/api/hands/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = app.act("nope", json!({ "action": "fold" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("GET", "/api/hands/nope/result", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_hand_on_busy_table_conflicts() {
    let app = TestApp::new();
    app.start_passive(1).await;

    let (status, body) = app
        .send("POST", "/api/hands/start", Some(json!({ "seed": 2 })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_in_progress");

    let (status, _) = app
        .send(
            "POST",
            "/api/hands/start",
            Some(json!({ "seed": 2, "table": "side" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = TestApp::new();
    let routes = WebServer::routes(&app.context);

    let response = warp::test::request()
        .method("POST")
        .path("/api/hands/start")
        .body("{not json")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(response.body()).expect("json");
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = app
        .send("POST", "/api/hands/start", Some(json!({ "num_players": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_config");
}

#[tokio::test]
async fn reset_clears_tables_and_changes_stack() {
    let app = TestApp::new();
    app.start_passive(5).await;

    let (status, body) = app
        .send("POST", "/api/reset", Some(json!({ "starting_stack": 2000 })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["cleared"], 1);
    assert_eq!(body["starting_stack"], 2000);

    let started = app.start_passive(5).await;
    let stacks: u64 = started["state"]["seats"]
        .as_array()
        .expect("seats")
        .iter()
        .map(|s| s["stack"].as_u64().unwrap_or(0) + s["committed"].as_u64().unwrap_or(0))
        .sum();
    assert_eq!(stacks, 2000 * 6);

    let (status, settings) = app.send("GET", "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["starting_stack"], 2000);
}

#[tokio::test]
async fn settings_round_trip_over_http() {
    let app = TestApp::new();

    let (status, body) = app
        .send("PUT", "/api/settings", Some(json!({ "default_players": 3 })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["default_players"], 3);

    let started = app.start_passive(9).await;
    assert_eq!(started["state"]["seats"].as_array().map(Vec::len), Some(3));

    let (status, body) = app
        .send("PUT", "/api/settings", Some(json!({ "big_blind": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_settings");
}

#[tokio::test]
async fn server_serves_health_over_tcp() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let handle = WebServer::from_context(AppContext::new_for_tests())
        .start()
        .await
        .expect("start server");

    let mut stream = tokio::net::TcpStream::connect(handle.address())
        .await
        .expect("connect");
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write request");
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.expect("read response");

    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.contains("\"status\":\"ok\""));

    handle.shutdown().await.expect("shutdown");
}
