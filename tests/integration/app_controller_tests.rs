/*!
 * Integration tests for update dispatch through the controller
 */

use std::sync::Arc;
use std::time::Duration;

use promobot::app_config::Config;
use promobot::app_controller::{Controller, route_message};
use promobot::errors::{AppError, TransportError};
use promobot::session::replies;
use promobot::session::{ChatId, InMemorySessionStore, SessionManager};
use promobot::telegram::TelegramClient;
use promobot::telegram::models::{Chat, Message, Update};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, RecordingTransport, StubRenderer};

fn text_update(update_id: i64, chat: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            chat: Chat { id: chat },
            text: Some(text.to_string()),
        }),
    }
}

fn controller_with(transport: Arc<RecordingTransport>) -> Controller {
    common::init_logging();
    let renderer = StubRenderer::returning(Ok("https://cdn.example/ad.mp4".to_string()));
    let manager = SessionManager::new(Arc::new(InMemorySessionStore::new()), renderer, transport);
    // The Bot API client is only used by `run`, which these tests never call
    let telegram = Arc::new(TelegramClient::new("http://127.0.0.1:9", "0:test"));
    Controller::from_parts(Config::default(), telegram, Arc::new(manager))
}

fn controller_against(server: &MockServer) -> Controller {
    common::init_logging();
    let transport = Arc::new(RecordingTransport::new());
    let renderer = StubRenderer::returning(Ok("https://cdn.example/ad.mp4".to_string()));
    let manager = SessionManager::new(Arc::new(InMemorySessionStore::new()), renderer, transport);
    let telegram = Arc::new(TelegramClient::new(&server.uri(), "0:test"));
    Controller::from_parts(Config::default(), telegram, Arc::new(manager))
}

async fn wait_for_replies(transport: &RecordingTransport, chat: ChatId, count: usize) -> Vec<String> {
    for _ in 0..200 {
        let texts = transport.texts_for(chat);
        if texts.len() >= count {
            return texts;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Timed out waiting for {} replies in chat {}", count, chat);
}

#[tokio::test]
async fn test_handleUpdate_shouldAnswerInArrivalOrder() {
    let transport = Arc::new(RecordingTransport::new());
    let controller = controller_with(transport.clone());

    controller.handle_update(text_update(1, 10, "/start"));
    controller.handle_update(text_update(2, 10, "A|B|C"));
    controller.handle_update(text_update(3, 10, "https://cdn.example/logo.png"));
    controller.handle_update(text_update(4, 10, "/go"));

    let texts = wait_for_replies(&transport, ChatId(10), 5).await;
    assert_eq!(
        texts,
        vec![
            replies::INTRO.to_string(),
            replies::PARAMETERS_ACCEPTED.to_string(),
            replies::ASSET_ADDED.to_string(),
            replies::JOB_STARTING.to_string(),
            replies::job_done("https://cdn.example/ad.mp4"),
        ]
    );
    assert!(!controller.manager().store().contains(ChatId(10)));
}

#[tokio::test]
async fn test_handleUpdate_shouldServeChatsIndependently() {
    let transport = Arc::new(RecordingTransport::new());
    let controller = controller_with(transport.clone());

    controller.handle_update(text_update(1, 10, "/start"));
    controller.handle_update(text_update(2, 20, "hello"));
    controller.handle_update(text_update(3, 10, "A|B|C"));

    let first = wait_for_replies(&transport, ChatId(10), 2).await;
    let second = wait_for_replies(&transport, ChatId(20), 1).await;

    assert_eq!(first, vec![replies::INTRO.to_string(), replies::PARAMETERS_ACCEPTED.to_string()]);
    assert_eq!(second, vec![replies::START_FIRST.to_string()]);
    assert!(controller.active_chats() <= 2);
}

/// Commands take precedence over the text rules
#[test]
fn test_routeMessage_withCommandSuffix_shouldRunCommand() {
    let transport = Arc::new(RecordingTransport::new());
    let controller = controller_with(transport.clone());
    let manager = controller.manager();

    tokio_test::block_on(async {
        route_message(manager, ChatId(50), "/start@promo_bot").await.unwrap();
        route_message(manager, ChatId(50), "/reset extra words").await.unwrap();
    });

    assert_eq!(
        transport.texts_for(ChatId(50)),
        vec![replies::INTRO.to_string(), replies::SESSION_CLEARED.to_string()]
    );
    assert!(!manager.store().contains(ChatId(50)));
}

#[tokio::test]
async fn test_handleUpdate_withoutText_shouldBeIgnored() {
    let transport = Arc::new(RecordingTransport::new());
    let controller = controller_with(transport.clone());

    controller.handle_update(Update {
        update_id: 1,
        message: None,
    });
    controller.handle_update(Update {
        update_id: 2,
        message: Some(Message {
            message_id: 2,
            chat: Chat { id: 30 },
            text: None,
        }),
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(transport.sent().is_empty());
    assert_eq!(controller.active_chats(), 0);
}

#[tokio::test]
async fn test_runUntil_withRejectedToken_shouldFailFast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot0:test/deleteWebhook"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;
    let controller = controller_against(&server);

    let result = controller.run_until(std::future::pending()).await;

    assert!(matches!(
        result,
        Err(AppError::Transport(TransportError::ApiError { code: 401, .. }))
    ));
}

#[tokio::test]
async fn test_runUntil_withShutdownDuringBackoff_shouldStopPromptly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot0:test/deleteWebhook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot0:test/getUpdates"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;
    let controller = controller_against(&server);

    // The first failed poll backs off for a full second
    let stopped = tokio::time::timeout(
        Duration::from_millis(500),
        controller.run_until(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await;

    assert!(matches!(stopped, Ok(Ok(()))));
}
