use secrecy::SecretString;
use serde_json::json;
use stream_notifier::config::TwitchConfig;
use stream_notifier::errors::TwitchError;
use stream_notifier::twitch::TwitchClient;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> TwitchConfig {
    TwitchConfig {
        client_id: Some("test-client-id".to_string()),
        api_base_url: format!("{}/helix/", server.uri()),
        retry_count: 2,
        retry_interval_sec: 0,
        ..Default::default()
    }
}

fn client_for(server: &MockServer) -> TwitchClient {
    TwitchClient::new(
        config_for(server),
        Some(SecretString::new("test-token".to_string())),
    )
    .unwrap()
}

fn stream_body() -> serde_json::Value {
    json!({
        "data": [{
            "id": "40952121085",
            "user_id": "101051819",
            "user_login": "afro",
            "user_name": "Afro",
            "game_id": "32982",
            "game_name": "Grand Theft Auto V",
            "type": "live",
            "title": "Jacob: Digital Den Laptops & Tablets",
            "viewer_count": 1490,
            "started_at": "2021-03-10T03:18:11Z",
            "language": "en",
            "thumbnail_url": "https://static-cdn.jtvnw.net/previews-ttv/live_user_afro-{width}x{height}.jpg",
            "is_mature": false
        }],
        "pagination": {}
    })
}

#[test]
fn test_missing_credentials() {
    let no_client_id = TwitchClient::new(
        TwitchConfig::default(),
        Some(SecretString::new("token".to_string())),
    );
    assert!(matches!(no_client_id, Err(TwitchError::MissingCredentials)));

    let no_token = TwitchClient::new(
        TwitchConfig {
            client_id: Some("id".to_string()),
            ..Default::default()
        },
        None,
    );
    assert!(matches!(no_token, Err(TwitchError::MissingCredentials)));
}

#[tokio::test]
async fn test_get_user_sends_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .and(query_param("login", "afro"))
        .and(header("Client-ID", "test-client-id"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "101051819",
                "login": "afro",
                "display_name": "Afro",
                "type": "",
                "broadcaster_type": "affiliate",
                "description": "",
                "profile_image_url": "https://example.com/afro.png",
                "offline_image_url": "",
                "view_count": 0,
                "created_at": "2015-09-24T03:18:11Z"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let user = client.get_user("afro").await.unwrap().unwrap();
    assert_eq!(user.id, "101051819");
    assert_eq!(user.display_name, "Afro");
    assert_eq!(user.broadcaster_type, "affiliate");
}

#[tokio::test]
async fn test_get_user_unknown_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.get_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_stream_live() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .and(query_param("user_login", "afro"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stream = client.get_stream("afro").await.unwrap().unwrap();
    assert_eq!(stream.id, "40952121085");
    assert_eq!(stream.user_name, "Afro");
    assert_eq!(stream.kind, "live");
    assert_eq!(stream.viewer_count, 1490);
    assert_eq!(stream.channel_url(), "https://www.twitch.tv/afro");
}

#[tokio::test]
async fn test_get_stream_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [], "pagination": {} })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.get_stream("afro").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "status": 401,
            "message": "Invalid OAuth token"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get_stream("afro").await;
    assert!(matches!(result, Err(TwitchError::AuthenticationError)));
}

#[tokio::test]
async fn test_missing_endpoint_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.get_stream("afro").await {
        Err(TwitchError::NotFound { endpoint }) => assert_eq!(endpoint, "streams"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stream_body()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stream = client.get_stream("afro").await.unwrap();
    assert!(stream.is_some());
}

#[tokio::test]
async fn test_rate_limit_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.get_stream("afro").await;
    assert!(matches!(result, Err(TwitchError::RateLimitExceeded)));
}
