//! End-to-end API tests against the in-memory store.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use tablestakes_api::{create_test_router, AppState};

fn server() -> TestServer {
    TestServer::new(create_test_router(Arc::new(AppState::in_memory()))).unwrap()
}

fn auth_header(user_id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(user_id).unwrap(),
    )
}

async fn register_user(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/v1/users")
        .json(&json!({"username": username, "password": "hunter2hunter2"}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn create_room(server: &TestServer, host_id: &str) -> Value {
    let (name, value) = auth_header(host_id);
    let response = server
        .post("/api/v1/rooms")
        .add_header(name, value)
        .json(&json!({
            "name": "friday game",
            "exchangeRate": "100.00",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn health_is_ok() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let server = server();
    register_user(&server, "alice").await;

    let response = server
        .post("/api/v1/users")
        .json(&json!({"username": "alice", "password": "hunter2hunter2"}))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let server = server();
    let response = server
        .post("/api/v1/users")
        .json(&json!({"username": "bob", "password": "short"}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_is_404() {
    let server = server();
    let response = server
        .get(&format!("/api/v1/users/{}", Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn room_creation_requires_auth() {
    let server = server();
    let response = server
        .post("/api/v1/rooms")
        .json(&json!({"name": "x", "exchangeRate": "100.00"}))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn room_creation_seats_host() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let room = create_room(&server, &host_id).await;

    assert_eq!(room["status"], "opened");
    let players = room["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["role"], "host");
    assert_eq!(players[0]["name"], "host");
}

#[tokio::test]
async fn exchange_flow_and_balance() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let room = create_room(&server, &host_id).await;
    let room_id = room["id"].as_str().unwrap();
    let player_id = room["players"][0]["id"].as_str().unwrap();

    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/exchanges")
        .add_header(name, value)
        .json(&json!({
            "roomId": room_id,
            "playerId": player_id,
            "amount": "30.00",
            "direction": "buyin",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let exchange = response.json::<Value>();
    assert_eq!(exchange["chipAmount"], "3000.00");
    assert_eq!(exchange["cashAmount"], "30.00");

    let response = server
        .get(&format!("/api/v1/players/{player_id}/balance"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["balance"], "3000.00");
}

#[tokio::test]
async fn overdrawn_cash_out_is_rejected() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let room = create_room(&server, &host_id).await;
    let room_id = room["id"].as_str().unwrap();
    let player_id = room["players"][0]["id"].as_str().unwrap();

    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/exchanges")
        .add_header(name, value)
        .json(&json!({
            "roomId": room_id,
            "playerId": player_id,
            "amount": "500.00",
            "direction": "cashout",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exchange_against_unknown_room_is_404() {
    let server = server();
    let host_id = register_user(&server, "host").await;

    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/exchanges")
        .add_header(name, value)
        .json(&json!({
            "roomId": Uuid::new_v4(),
            "playerId": Uuid::new_v4(),
            "amount": "10.00",
            "direction": "buyin",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn close_room_end_to_end() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let room = create_room(&server, &host_id).await;
    let room_id = room["id"].as_str().unwrap();
    let host_player = room["players"][0]["id"].as_str().unwrap();

    // Seat a guest.
    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/players")
        .add_header(name, value)
        .json(&json!({"roomId": room_id, "name": "guest"}))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let guest_player = response.json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Balanced declared results close the room.
    let (name, value) = auth_header(&host_id);
    let response = server
        .put(&format!("/api/v1/rooms/close/{room_id}"))
        .add_header(name, value)
        .json(&json!([
            {"playerId": host_player, "income": "50.00"},
            {"playerId": guest_player, "income": "-50.00"},
        ]))
        .await;
    response.assert_status_ok();
    let closed = response.json::<Value>();
    assert_eq!(closed["status"], "closed");

    // Closing again is a 400.
    let (name, value) = auth_header(&host_id);
    let response = server
        .put(&format!("/api/v1/rooms/close/{room_id}"))
        .add_header(name, value)
        .json(&json!([{"playerId": host_player, "income": "0.00"}]))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // And no further exchanges are accepted.
    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/exchanges")
        .add_header(name, value)
        .json(&json!({
            "roomId": room_id,
            "playerId": host_player,
            "amount": "10.00",
            "direction": "buyin",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unbalanced_close_is_rejected() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let room = create_room(&server, &host_id).await;
    let room_id = room["id"].as_str().unwrap();
    let host_player = room["players"][0]["id"].as_str().unwrap();

    let (name, value) = auth_header(&host_id);
    let response = server
        .put(&format!("/api/v1/rooms/close/{room_id}"))
        .add_header(name, value)
        .json(&json!([{"playerId": host_player, "income": "100.00"}]))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn outsider_cannot_close() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let outsider_id = register_user(&server, "outsider").await;
    let room = create_room(&server, &host_id).await;
    let room_id = room["id"].as_str().unwrap();
    let host_player = room["players"][0]["id"].as_str().unwrap();

    let (name, value) = auth_header(&outsider_id);
    let response = server
        .put(&format!("/api/v1/rooms/close/{room_id}"))
        .add_header(name, value)
        .json(&json!([{"playerId": host_player, "income": "0.00"}]))
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invisible_room_needs_token() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let outsider_id = register_user(&server, "outsider").await;

    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/rooms")
        .add_header(name, value)
        .json(&json!({
            "name": "private game",
            "exchangeRate": "100.00",
            "isVisible": false,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let room_id = response.json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Outsider is refused without the token.
    let (name, value) = auth_header(&outsider_id);
    let response = server
        .get(&format!("/api/v1/rooms/{room_id}"))
        .add_header(name, value)
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    // The host can mint a token that opens the room.
    let (name, value) = auth_header(&host_id);
    let response = server
        .post(&format!("/api/v1/rooms/{room_id}/access-token"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let token = response.json::<Value>()["accessToken"]
        .as_str()
        .unwrap()
        .to_string();

    let (name, value) = auth_header(&outsider_id);
    let response = server
        .get(&format!("/api/v1/rooms/{room_id}?accessToken={token}"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn room_key_validation_endpoint() {
    let server = server();
    let host_id = register_user(&server, "host").await;

    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/rooms")
        .add_header(name, value)
        .json(&json!({
            "name": "keyed game",
            "exchangeRate": "100.00",
            "roomKey": "1234",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let room_id = response.json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .post(&format!("/api/v1/rooms/{room_id}/validate-key"))
        .json(&json!({"roomKey": "1234"}))
        .await;
    assert_eq!(response.json::<Value>()["valid"], true);

    let response = server
        .post(&format!("/api/v1/rooms/{room_id}/validate-key"))
        .json(&json!({"roomKey": "0000"}))
        .await;
    assert_eq!(response.json::<Value>()["valid"], false);
}

#[tokio::test]
async fn seat_assignment_and_promotion() {
    let server = server();
    let host_id = register_user(&server, "host").await;
    let guest_id = register_user(&server, "guest").await;
    let room = create_room(&server, &host_id).await;
    let room_id = room["id"].as_str().unwrap();

    // Host seats a walk-in guest with no linked user.
    let (name, value) = auth_header(&host_id);
    let response = server
        .post("/api/v1/players")
        .add_header(name, value)
        .json(&json!({"roomId": room_id, "name": "walk-in"}))
        .await;
    let seat_id = response.json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // The guest claims the seat.
    let (name, value) = auth_header(&guest_id);
    let response = server
        .put(&format!("/api/v1/players/{seat_id}/assign"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["userId"].as_str().unwrap(),
        guest_id
    );

    // Host promotes the claimed seat to admin.
    let (name, value) = auth_header(&host_id);
    let response = server
        .put(&format!("/api/v1/players/{seat_id}/admin"))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "admin");

    // Non-hosts may not promote.
    let (name, value) = auth_header(&guest_id);
    let response = server
        .put(&format!("/api/v1/players/{seat_id}/admin"))
        .add_header(name, value)
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}
