use secrecy::SecretString;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stream_notifier::config::{TwitchConfig, YouTubeConfig};
use stream_notifier::errors::{AppError, ListenerError};
use stream_notifier::events::{EventBus, NotifierEvent};
use stream_notifier::listener::Watcher;
use stream_notifier::models::{ListenerTarget, Platform};
use stream_notifier::state::StateManager;
use stream_notifier::storage::NotifyStorage;
use stream_notifier::twitch::{TwitchClient, TwitchSource};
use stream_notifier::youtube::{YouTubeClient, YouTubeSource};
use tokio::sync::broadcast::Receiver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANNEL_ID: &str = "UCXuqSBlHAE6Xw-yeJA0Tunw";
const TICK: Duration = Duration::from_millis(50);

fn state() -> StateManager {
    StateManager::from_shared(Arc::new(Mutex::new(NotifyStorage::in_memory().unwrap())))
}

async fn next_event(rx: &mut Receiver<NotifierEvent>) -> NotifierEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("bus closed")
}

fn feed(video_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
 <id>yt:channel:XuqSBlHAE6Xw-yeJA0Tunw</id>
 <title>Linus Tech Tips</title>
 <updated>2024-01-02T15:00:00+00:00</updated>
 <entry>
  <id>yt:video:{video_id}</id>
  <title>Upload {video_id}</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v={video_id}"/>
  <updated>2024-01-02T15:00:00+00:00</updated>
 </entry>
</feed>"#
    )
}

#[tokio::test]
async fn test_youtube_watcher_seeds_then_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds/videos.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed("existing0001")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/videos.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed("brandnew0002")))
        .mount(&server)
        .await;

    let client = YouTubeClient::new(YouTubeConfig {
        feed_base_url: format!("{}/feeds/videos.xml", server.uri()),
        retry_count: 0,
        retry_interval_sec: 0,
        ..Default::default()
    })
    .unwrap();

    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let state = state();
    let mut watcher = Watcher::new(YouTubeSource::new(client), state.clone(), bus, TICK).unwrap();

    assert_eq!(
        next_event(&mut rx).await,
        NotifierEvent::Ready {
            platform: Platform::YouTube
        }
    );

    watcher.create_listener(CHANNEL_ID).await.unwrap();
    assert!(matches!(
        next_event(&mut rx).await,
        NotifierEvent::Created {
            platform: Platform::YouTube,
            ..
        }
    ));

    // 既存の動画は通知されず、次の新しい動画のみ通知される
    match next_event(&mut rx).await {
        NotifierEvent::NewVideo(video) => {
            assert_eq!(video.id, "yt:video:brandnew0002");
            assert_eq!(video.channel_id, CHANNEL_ID);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let stored = state
        .get(&format!("video_{}", CHANNEL_ID))
        .unwrap()
        .unwrap();
    assert_eq!(stored.latest.as_deref(), Some("yt:video:brandnew0002"));

    watcher.stop_listener(None).await.unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        NotifierEvent::Deleted {
            platform: Platform::YouTube,
            target: ListenerTarget::YouTubeChannel {
                channel_id: CHANNEL_ID.to_string()
            }
        }
    );
    assert!(watcher.stop_listener(None).await.is_err());
}

#[tokio::test]
async fn test_twitch_watcher_notifies_stream_already_live() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "101051819",
                "login": "afro",
                "display_name": "Afro",
                "created_at": "2015-09-24T03:18:11Z"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "40952121085",
                "user_id": "101051819",
                "user_login": "afro",
                "user_name": "Afro",
                "type": "live",
                "title": "Live now",
                "started_at": "2021-03-10T03:18:11Z"
            }]
        })))
        .mount(&server)
        .await;

    let client = TwitchClient::new(
        TwitchConfig {
            client_id: Some("test-client-id".to_string()),
            api_base_url: format!("{}/helix", server.uri()),
            retry_count: 0,
            retry_interval_sec: 0,
            ..Default::default()
        },
        Some(SecretString::new("test-token".to_string())),
    )
    .unwrap();

    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let state = state();
    let mut watcher = Watcher::new(TwitchSource::new(client), state.clone(), bus, TICK).unwrap();
    next_event(&mut rx).await;

    watcher.create_listener("afro").await.unwrap();
    match next_event(&mut rx).await {
        NotifierEvent::Created {
            target: ListenerTarget::TwitchUser(user),
            ..
        } => assert_eq!(user.display_name, "Afro"),
        other => panic!("unexpected event: {:?}", other),
    }

    match next_event(&mut rx).await {
        NotifierEvent::WentLive(stream) => assert_eq!(stream.id, "40952121085"),
        other => panic!("unexpected event: {:?}", other),
    }

    // 同じ配信は二度通知しない
    tokio::time::sleep(TICK * 4).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(
        state.get("live_afro").unwrap().unwrap().latest.as_deref(),
        Some("40952121085")
    );

    watcher.stop_all().await;
}

#[tokio::test]
async fn test_twitch_unknown_user_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let client = TwitchClient::new(
        TwitchConfig {
            client_id: Some("test-client-id".to_string()),
            api_base_url: format!("{}/helix", server.uri()),
            ..Default::default()
        },
        Some(SecretString::new("test-token".to_string())),
    )
    .unwrap();

    let mut watcher =
        Watcher::new(TwitchSource::new(client), state(), EventBus::new(), TICK).unwrap();
    assert!(watcher.create_listener("nobody").await.is_err());
    assert!(watcher.active_targets().is_empty());
}

#[tokio::test]
async fn test_twitch_login_is_case_insensitive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/helix/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "101051819",
                "login": "afro",
                "display_name": "Afro",
                "created_at": "2015-09-24T03:18:11Z"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/helix/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let client = TwitchClient::new(
        TwitchConfig {
            client_id: Some("test-client-id".to_string()),
            api_base_url: format!("{}/helix", server.uri()),
            retry_count: 0,
            retry_interval_sec: 0,
            ..Default::default()
        },
        Some(SecretString::new("test-token".to_string())),
    )
    .unwrap();

    let mut watcher =
        Watcher::new(TwitchSource::new(client), state(), EventBus::new(), TICK).unwrap();
    watcher.create_listener("Afro").await.unwrap();
    assert!(watcher.is_listening("AFRO"));
    assert_eq!(watcher.active_targets(), vec!["afro"]);

    let result = watcher.create_listener("afro").await;
    assert!(matches!(
        result,
        Err(AppError::Listener(ListenerError::AlreadyListening { .. }))
    ));
    assert_eq!(watcher.active_targets().len(), 1);

    watcher.stop_listener(Some("AFRO")).await.unwrap();
    assert!(watcher.active_targets().is_empty());
}
