use std::sync::Arc;
use std::time::Duration;

use aria_core::{ChatId, Sender, UserId};
use aria_engine::engine::{EngineError, SessionController};
use aria_engine::session::{FinalizeOutcome, SessionStatus};
use aria_engine::traits::{CompanionApi, Welcome};
use aria_providers::companion::{
    build_finalize_request, build_turn_request, build_welcome_request,
};
use aria_providers::error::ApiError;
use aria_providers::parse::{parse_turn_reply, parse_welcome};
use aria_providers::runtime::{ensure_success, execute};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct HttpApi {
    base_url: String,
}

#[async_trait::async_trait]
impl CompanionApi for HttpApi {
    async fn welcome(&self, user: &UserId) -> Result<Welcome, ApiError> {
        let req = build_welcome_request(&self.base_url, user);
        let resp = ensure_success(execute(&req).await?)?;
        let w = parse_welcome(&resp.body)?;
        Ok(Welcome {
            message: w.message,
            chat_id: ChatId::new(w.chat_id),
        })
    }

    async fn exchange(
        &self,
        user: &UserId,
        chat: &ChatId,
        prompt: &str,
        turn_id: u32,
    ) -> Result<String, ApiError> {
        let req = build_turn_request(&self.base_url, user, chat, prompt, turn_id);
        let resp = ensure_success(execute(&req).await?)?;
        parse_turn_reply(&resp.body)
    }

    async fn finalize(&self, user: &UserId, chat: &ChatId) -> Result<(), ApiError> {
        let req = build_finalize_request(&self.base_url, user, chat);
        ensure_success(execute(&req).await?)?;
        Ok(())
    }
}

fn controller(server: &MockServer) -> Arc<SessionController> {
    Arc::new(SessionController::new(
        UserId::new("u1"),
        Arc::new(HttpApi {
            base_url: server.uri(),
        }),
    ))
}

async fn mount_welcome(server: &MockServer, chat_id: &str, once: bool) {
    let mock = Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/welcome/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(r#"{{"message":"Hi","chat_id":"{chat_id}"}}"#),
            "application/json",
        ));

    let mock = if once { mock.up_to_n_times(1) } else { mock };
    mock.mount(server).await;
}

#[tokio::test]
async fn a_full_turn_appends_two_messages_and_advances_the_turn_id() {
    let server = MockServer::start().await;
    mount_welcome(&server, "c1", false).await;

    Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/u1/c1"))
        .and(body_json(
            serde_json::json!({"prompt": "I feel anxious", "turn_id": 0}),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#""That's understandable""#, "application/json"),
        )
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.initialize().await.unwrap();

    let session = ctl.snapshot().await;
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.chat_id, Some(ChatId::new("c1")));
    assert_eq!(session.welcome.as_deref(), Some("Hi"));
    assert!(session.messages.is_empty());
    assert!(session.invariants_hold());

    let reply = ctl.submit_text("I feel anxious").await.unwrap();
    assert_eq!(reply, "That's understandable");

    let session = ctl.snapshot().await;
    assert_eq!(session.turn_id, 1);
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].sender, Sender::User);
    assert_eq!(session.messages[0].text, "I feel anxious");
    assert_eq!(session.messages[1].sender, Sender::Agent);
    assert_eq!(session.messages[1].text, "That's understandable");
}

#[tokio::test]
async fn finalize_resets_locally_and_lands_in_a_fresh_chat() {
    let server = MockServer::start().await;
    mount_welcome(&server, "c1", true).await;
    mount_welcome(&server, "c2", false).await;

    Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/u1/c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#""Okay""#, "application/json"),
        )
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/ai/mental_health/finalize/u1/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"message":"Chat finalized successfully"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.initialize().await.unwrap();
    ctl.submit_text("hello").await.unwrap();

    let outcome = ctl.finalize().await.unwrap();
    assert_eq!(outcome, FinalizeOutcome::Reset { remote_error: None });

    let session = ctl.snapshot().await;
    assert!(session.messages.is_empty());
    assert_eq!(session.turn_id, 0);
    assert_eq!(session.chat_id, Some(ChatId::new("c2")));
    assert_eq!(session.status, SessionStatus::Active);
}

#[tokio::test]
async fn finalize_resets_even_when_the_remote_call_fails() {
    let server = MockServer::start().await;
    mount_welcome(&server, "c1", true).await;
    mount_welcome(&server, "c2", false).await;

    Mock::given(method("PATCH"))
        .and(path("/api/ai/mental_health/finalize/u1/c1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.initialize().await.unwrap();

    let outcome = ctl.finalize().await.unwrap();
    match outcome {
        FinalizeOutcome::Reset { remote_error } => assert!(remote_error.is_some()),
        other => panic!("expected reset, got {other:?}"),
    }

    // Still a clean, usable session bound to a fresh chat.
    let session = ctl.snapshot().await;
    assert!(session.messages.is_empty());
    assert_eq!(session.turn_id, 0);
    assert_eq!(session.chat_id, Some(ChatId::new("c2")));
}

#[tokio::test]
async fn finalize_without_a_chat_is_a_no_op() {
    let server = MockServer::start().await;
    let ctl = controller(&server);

    assert_eq!(ctl.finalize().await.unwrap(), FinalizeOutcome::NoChat);
    assert_eq!(ctl.snapshot().await.status, SessionStatus::Idle);
}

#[tokio::test]
async fn a_failed_exchange_leaves_history_and_turn_id_untouched() {
    let server = MockServer::start().await;
    mount_welcome(&server, "c1", false).await;

    Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/u1/c1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/u1/c1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#""Better now""#, "application/json"),
        )
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.initialize().await.unwrap();

    let err = ctl.submit_text("hello").await.unwrap_err();
    assert!(matches!(err, EngineError::Api(ApiError::Status { .. })));

    let session = ctl.snapshot().await;
    assert!(session.messages.is_empty());
    assert_eq!(session.turn_id, 0);

    // The in-flight guard was released on the failure path; the retry with
    // the same turn id goes through.
    let reply = ctl.submit_text("hello").await.unwrap();
    assert_eq!(reply, "Better now");
    assert_eq!(ctl.snapshot().await.turn_id, 1);
}

#[tokio::test]
async fn a_second_submit_is_rejected_while_one_is_in_flight() {
    let server = MockServer::start().await;
    mount_welcome(&server, "c1", false).await;

    Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/u1/c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#""Slow reply""#, "application/json")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let ctl = controller(&server);
    ctl.initialize().await.unwrap();

    let first = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.submit_text("first").await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = ctl.submit_text("second").await;
    assert!(matches!(second, Err(EngineError::ExchangeInFlight)));

    // Nothing moved while the first exchange was still pending.
    let session = ctl.snapshot().await;
    assert!(session.messages.is_empty());
    assert_eq!(session.turn_id, 0);

    let reply = first.await.unwrap().unwrap();
    assert_eq!(reply, "Slow reply");

    let session = ctl.snapshot().await;
    assert_eq!(session.turn_id, 1);
    assert_eq!(session.messages.len(), 2);
}

#[tokio::test]
async fn a_failed_welcome_leaves_the_session_unbound() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ai/mental_health/welcome/u1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ctl = controller(&server);
    let err = ctl.initialize().await.unwrap_err();
    assert!(matches!(err, EngineError::Api(ApiError::Status { .. })));

    let session = ctl.snapshot().await;
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(session.chat_id.is_none());
    assert!(session.invariants_hold());

    // Without a chat the send path refuses outright.
    let err = ctl.submit_text("hello").await.unwrap_err();
    assert!(matches!(err, EngineError::NotActive));
}

#[tokio::test]
async fn blank_prompts_never_reach_the_network() {
    let server = MockServer::start().await;
    mount_welcome(&server, "c1", false).await;

    let ctl = controller(&server);
    ctl.initialize().await.unwrap();

    let err = ctl.submit_text("   \n ").await.unwrap_err();
    assert!(matches!(err, EngineError::EmptyPrompt));
    assert!(ctl.snapshot().await.messages.is_empty());
}

#[tokio::test]
async fn an_empty_user_id_cannot_initialize() {
    let server = MockServer::start().await;

    let ctl = Arc::new(SessionController::new(
        UserId::new("  "),
        Arc::new(HttpApi {
            base_url: server.uri(),
        }),
    ));

    assert!(matches!(
        ctl.initialize().await.unwrap_err(),
        EngineError::MissingUser
    ));
}
