#![allow(clippy::unwrap_used)]
// Integration tests for `ItchClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use itch_api::{Error, ItchApi, ItchClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ItchClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ItchClient::with_client(
        reqwest::Client::new(),
        base_url,
        SecretString::from("secret-key".to_string()),
    );
    (server, client)
}

// ── Profile ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_me_sends_key_and_returns_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .and(header("authorization", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 42, "username": "leafo" }
        })))
        .mount(&server)
        .await;

    let body = client.me().await.unwrap();
    assert_eq!(body["user"]["id"], 42);
    assert_eq!(body["user"]["username"], "leafo");
}

#[tokio::test]
async fn test_my_collections() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/profile/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collections": [{ "id": 7, "title": "Favorites", "games_count": 3 }]
        })))
        .mount(&server)
        .await;

    let body = client.my_collections().await.unwrap();
    assert_eq!(body["collections"][0]["id"], 7);
}

// ── Games & collections ─────────────────────────────────────────────

#[tokio::test]
async fn test_game_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/games/101"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "game": { "id": 101, "title": "Overland" } })),
        )
        .mount(&server)
        .await;

    let body = client.game(101).await.unwrap();
    assert_eq!(body["game"]["title"], "Overland");
}

#[tokio::test]
async fn test_collection_games_passes_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/collections/7/collection-games"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "per_page": 50,
            "collection_games": []
        })))
        .mount(&server)
        .await;

    let body = client.collection_games(7, 2).await.unwrap();
    assert_eq!(body["page"], 2);
}

// ── Failure categories ──────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_key_envelope_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "errors": ["invalid key"] })),
        )
        .mount(&server)
        .await;

    let result = client.me().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unauthorized_status_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.me().await;
    assert!(result.unwrap_err().is_auth());
}

#[tokio::test]
async fn test_forbidden_status_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/profile/collections"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.my_collections().await;
    assert!(result.unwrap_err().is_auth());
}

#[tokio::test]
async fn test_errors_envelope_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/collections/9"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "errors": ["collection not found"] })),
        )
        .mount(&server)
        .await;

    let err = client.collection(9).await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Api { status, errors } => {
            assert_eq!(status, 404);
            assert_eq!(errors, vec!["collection not found".to_string()]);
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/games/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.game(1).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = ItchClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:1").unwrap(),
        SecretString::from("k".to_string()),
    );

    let err = client.me().await.unwrap_err();
    assert!(err.is_transport(), "expected transport error, got: {err:?}");
}
