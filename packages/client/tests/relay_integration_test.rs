//! Integration tests running an in-process relay against real agent-side clients.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use httpmock::{Method::GET, MockServer};
use madoguchi_client::{
    config::AgentConfig,
    domain::{ChannelState, MessageHandoff, customer_event},
    relay::HttpRelayClient,
    session::AgentSession,
    subscription::{SubscriptionConfig, SubscriptionManager},
};
use madoguchi_server::{
    config::RelayConfig,
    domain::{
        ConversationId, StreamingActivator, StreamingError, SuggestionError, SuggestionGenerator,
    },
    infrastructure::{
        dto::http::ConnectionDto, message_pusher::WebSocketMessagePusher,
        repository::InMemoryConnectionRegistry,
    },
    ui::{Components, Server},
};
use madoguchi_shared::time::SystemClock;
use serde_json::json;
use tokio::{sync::watch, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, protocol::Message},
};

const WAIT: Duration = Duration::from_secs(5);

/// Generator answering every message with a fixed text, or failing.
struct FixedGenerator(Option<&'static str>);

#[async_trait]
impl SuggestionGenerator for FixedGenerator {
    async fn generate(&self, _customer_message: &str) -> Result<String, SuggestionError> {
        self.0
            .map(str::to_string)
            .ok_or_else(|| SuggestionError::Status(500))
    }
}

struct AcceptingActivator;

#[async_trait]
impl StreamingActivator for AcceptingActivator {
    async fn start_streaming(&self, _conversation_id: &ConversationId) -> Result<(), StreamingError> {
        Ok(())
    }
}

/// Helper struct to manage the relay's lifecycle
struct TestRelay {
    port: u16,
    handle: JoinHandle<()>,
}

impl TestRelay {
    /// Start a relay on an ephemeral port
    async fn start(generator: FixedGenerator) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().expect("listener address").port();

        let config = RelayConfig {
            worker_idle_timeout: Duration::from_millis(200),
            ..RelayConfig::default()
        };
        let server = Server::new(
            &config,
            Components {
                registry: Arc::new(InMemoryConnectionRegistry::new()),
                message_pusher: Arc::new(WebSocketMessagePusher::new()),
                generator: Arc::new(generator),
                streaming_activator: Arc::new(AcceptingActivator),
                clock: Arc::new(SystemClock),
            },
        );
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener, std::future::pending()).await;
        });

        TestRelay { port, handle }
    }

    fn http_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    fn manager(&self) -> SubscriptionManager {
        SubscriptionManager::new(SubscriptionConfig {
            url: self.ws_url(),
            subscribe_backoff: Duration::from_millis(20),
            reconnect_delay: Duration::from_millis(50),
        })
    }

    fn relay_client(&self) -> HttpRelayClient {
        HttpRelayClient::new(self.http_url(), Duration::from_secs(2))
            .expect("Failed to build relay client")
    }

    /// Wait until the registry holds `count` subscriptions to `conversation_id`
    async fn wait_for_subscribers(&self, conversation_id: &str, count: usize) {
        let url = format!("{}/debug/connections", self.http_url());
        let client = reqwest::Client::new();
        let poll = async {
            loop {
                if let Ok(res) = client.get(&url).send().await {
                    if let Ok(connections) = res.json::<Vec<ConnectionDto>>().await {
                        let subscribed = connections
                            .iter()
                            .filter(|c| c.conversation_id.as_deref() == Some(conversation_id))
                            .count();
                        if subscribed == count {
                            return;
                        }
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(WAIT, poll)
            .await
            .expect("subscribers did not show up in the registry");
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read the next text frame from a raw channel socket
async fn next_text(socket: &mut WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>) -> String {
    let read = async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(_)) => continue,
                other => panic!("channel ended: {:?}", other),
            }
        }
    };
    tokio::time::timeout(WAIT, read)
        .await
        .expect("no frame arrived")
}

async fn wait_for_suggestion(rx: &mut watch::Receiver<Option<String>>) -> String {
    let value = tokio::time::timeout(WAIT, rx.wait_for(|s| s.is_some()))
        .await
        .expect("no suggestion arrived")
        .expect("suggestion channel closed");
    value.clone().unwrap_or_default()
}

#[tokio::test]
async fn test_subscribe_then_receive_suggestion() {
    // テスト項目: 会話を購読したエージェントに生成された提案が届く
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(Some("Try restarting the app"))).await;
    let manager = relay.manager();
    let mut state = manager.state();
    manager.start().await;
    tokio::time::timeout(WAIT, state.wait_for(|s| *s == ChannelState::Open))
        .await
        .expect("channel did not open")
        .expect("state channel closed");
    manager.subscribe("c1").await.expect("subscribe failed");
    relay.wait_for_subscribers("c1", 1).await;
    let mut suggestions = manager.suggestions();

    // when (操作):
    relay
        .relay_client()
        .hand_off(&customer_event("c1", "Hi"))
        .await
        .expect("hand-off failed");

    // then (期待する結果):
    assert_eq!(
        wait_for_suggestion(&mut suggestions).await,
        "Try restarting the app"
    );
    manager.shutdown().await;
    assert_eq!(manager.current_state(), ChannelState::Closed);
}

#[tokio::test]
async fn test_subscribe_before_channel_opens_is_retried() {
    // テスト項目: チャンネルが開く前の subscribe も破棄されず、開いた後に届く
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(Some("answer"))).await;
    let manager = Arc::new(relay.manager());
    let subscriber = manager.clone();
    let pending = tokio::spawn(async move { subscriber.subscribe("c2").await });

    // when (操作):
    tokio::time::sleep(Duration::from_millis(60)).await;
    manager.start().await;

    // then (期待する結果):
    let result = tokio::time::timeout(WAIT, pending)
        .await
        .expect("subscribe did not complete")
        .expect("subscribe task panicked");
    assert!(result.is_ok());
    relay.wait_for_subscribers("c2", 1).await;
    manager.shutdown().await;
}

#[tokio::test]
async fn test_fanout_reaches_only_subscribers_of_the_conversation() {
    // テスト項目: 同じ会話の全購読者に届き、別の会話の購読者には届かない
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(Some("Check the cable"))).await;
    let first = relay.manager();
    let second = relay.manager();
    let other = relay.manager();
    for manager in [&first, &second, &other] {
        manager.start().await;
    }
    first.subscribe("c1").await.expect("subscribe failed");
    second.subscribe("c1").await.expect("subscribe failed");
    other.subscribe("c9").await.expect("subscribe failed");
    relay.wait_for_subscribers("c1", 2).await;
    relay.wait_for_subscribers("c9", 1).await;
    let mut first_rx = first.suggestions();
    let mut second_rx = second.suggestions();

    // when (操作):
    relay
        .relay_client()
        .hand_off(&customer_event("c1", "It does not turn on"))
        .await
        .expect("hand-off failed");

    // then (期待する結果):
    assert_eq!(wait_for_suggestion(&mut first_rx).await, "Check the cable");
    assert_eq!(wait_for_suggestion(&mut second_rx).await, "Check the cable");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(other.latest_suggestion(), None);

    for manager in [&first, &second, &other] {
        manager.shutdown().await;
    }
}

#[tokio::test]
async fn test_failing_generator_delivers_sentinel() {
    // テスト項目: 生成関数が失敗すると "No suggestion available" が届く
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(None)).await;
    let manager = relay.manager();
    manager.start().await;
    manager.subscribe("c1").await.expect("subscribe failed");
    relay.wait_for_subscribers("c1", 1).await;
    let mut suggestions = manager.suggestions();

    // when (操作):
    relay
        .relay_client()
        .hand_off(&customer_event("c1", "Hi"))
        .await
        .expect("hand-off failed");

    // then (期待する結果):
    assert_eq!(
        wait_for_suggestion(&mut suggestions).await,
        "No suggestion available"
    );
    manager.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_deregisters_connection() {
    // テスト項目: エージェントが終了するとレジストリから接続が消える
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(Some("answer"))).await;
    let manager = relay.manager();
    manager.start().await;
    manager.subscribe("c1").await.expect("subscribe failed");
    relay.wait_for_subscribers("c1", 1).await;

    // when (操作):
    manager.shutdown().await;

    // then (期待する結果):
    relay.wait_for_subscribers("c1", 0).await;
}

#[tokio::test]
async fn test_agent_session_polls_transcript_into_suggestion() {
    // テスト項目: ポーリングで検出した顧客メッセージが提案としてエージェントに戻ってくる
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(Some("Try restarting the app"))).await;
    let transcript = MockServer::start_async().await;
    let mut empty_transcript = transcript
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/c1/transcript");
            then.status(200).json_body(json!({"messages": []}));
        })
        .await;
    let config = AgentConfig {
        relay_url: relay.http_url(),
        channel_url: relay.ws_url(),
        transcript_url: transcript.base_url(),
        poll_interval: Duration::from_millis(50),
        subscribe_backoff: Duration::from_millis(20),
        ..AgentConfig::default()
    };
    let session = AgentSession::connect(&config).expect("Failed to build session");
    session.open().await;
    let mut suggestions = session.suggestions();

    // when (操作):
    let streaming_enabled = session
        .start_conversation("c1")
        .await
        .expect("Failed to start conversation");
    relay.wait_for_subscribers("c1", 1).await;
    // 購読が済んでから顧客メッセージを出す
    empty_transcript.delete_async().await;
    let transcript_mock = transcript
        .mock_async(|when, then| {
            when.method(GET).path("/conversations/c1/transcript");
            then.status(200).json_body(json!({
                "messages": [
                    {"participantRole": "AGENT", "type": "MESSAGE", "content": "How can I help?"},
                    {"participantRole": "CUSTOMER", "type": "MESSAGE", "content": "My app crashes"}
                ]
            }));
        })
        .await;

    // then (期待する結果):
    assert!(streaming_enabled);
    assert_eq!(
        wait_for_suggestion(&mut suggestions).await,
        "Try restarting the app"
    );
    assert!(transcript_mock.hits_async().await >= 1);

    session.shutdown().await;
    assert!(!session.is_polling().await);
}

#[tokio::test]
async fn test_duplicate_connection_id_is_rejected_with_conflict() {
    // テスト項目: 開いている接続と同じ ID での接続は 409 で拒否され、既存の接続は提案を受け取り続ける
    // given (前提条件):
    let relay = TestRelay::start(FixedGenerator(Some("answer"))).await;
    let url = format!("{}?connection_id=dup", relay.ws_url());
    let (mut first, _) = connect_async(url.as_str())
        .await
        .expect("first connect failed");
    first
        .send(Message::Text(r#"{"action":"connect"}"#.into()))
        .await
        .expect("send failed");
    assert_eq!(
        next_text(&mut first).await,
        r#"{"status":200,"action":"connect"}"#
    );

    // when (操作):
    let second = connect_async(url.as_str()).await;

    // then (期待する結果):
    match second {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 409),
        other => panic!("expected 409, got {:?}", other.map(|_| ())),
    }
    first
        .send(Message::Text(
            r#"{"action":"subscribe","conversationId":"c1"}"#.into(),
        ))
        .await
        .expect("send failed");
    assert_eq!(
        next_text(&mut first).await,
        r#"{"status":200,"action":"subscribe"}"#
    );
    relay
        .relay_client()
        .hand_off(&customer_event("c1", "Hi"))
        .await
        .expect("hand-off failed");
    assert_eq!(next_text(&mut first).await, r#"{"suggestion":"answer"}"#);
}
