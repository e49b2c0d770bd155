//! Messaging Integration Tests
//!
//! Most tests wire the in-memory store and transport. The tests at the end
//! also need:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL
//!
//! Run with: cargo test -p integration-tests --test messaging_tests

use std::time::Duration;

use creator_core::{DomainEvent, MessageStatus};
use creator_messaging::Visibility;
use creator_realtime::RealtimeChannel;
use integration_tests::{
    check_test_env, next_matching, text_of_len, wait_until, TestPlatform, EVENT_TIMEOUT, PNG_BYTES,
};

fn status_of(event: &DomainEvent) -> Option<MessageStatus> {
    match event {
        DomainEvent::MessageStatusChanged(e) => Some(e.status),
        _ => None,
    }
}

// ============================================================================
// Delivery Status Tests
// ============================================================================

#[tokio::test]
async fn test_sender_sees_delivered_then_read() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    let mut statuses = platform
        .subscribe(&RealtimeChannel::messages(conversation.id))
        .await
        .unwrap();
    let sent = ana_app.send_message("hello Bo", None).await.unwrap().unwrap();
    assert_eq!(sent.status, MessageStatus::Sent);

    let delivered = next_matching(&mut statuses, |e| status_of(e).is_some()).await.unwrap();
    assert_eq!(status_of(&delivered), Some(MessageStatus::Delivered));
    let read = next_matching(&mut statuses, |e| status_of(e).is_some()).await.unwrap();
    assert_eq!(status_of(&read), Some(MessageStatus::Read));

    wait_until(EVENT_TIMEOUT, "sender view to show read", || async {
        ana_app
            .messages()
            .await
            .iter()
            .any(|m| m.id == sent.id && m.status == MessageStatus::Read)
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_backgrounded_recipient_only_delivers() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_visibility(Visibility::Background).await;

    let sent = ana_app.send_message("are you there?", None).await.unwrap().unwrap();
    wait_until(EVENT_TIMEOUT, "delivery receipt", || async {
        ana_app
            .messages()
            .await
            .iter()
            .any(|m| m.id == sent.id && m.status == MessageStatus::Delivered)
    })
    .await
    .unwrap();

    bo_app.set_visibility(Visibility::Foreground).await;
    let stored = platform.ctx.message_repo().find_by_id(sent.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MessageStatus::Read);
}

// ============================================================================
// Typing Tests
// ============================================================================

#[tokio::test]
async fn test_three_typers_seen_by_fourth() {
    let platform = TestPlatform::start_with(&[("TYPING_IDLE_MS", "300")]).await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let cy = platform.register("Cy").await.unwrap();
    let di = platform.register("Di").await.unwrap();
    let group = platform.group(&ana, "crew", &[&bo, &cy, &di]).await.unwrap();

    let mut apps = Vec::new();
    for user in [&ana, &bo, &cy, &di] {
        let app = platform.sign_in(user).await.unwrap();
        app.set_current_conversation(Some(group.id)).await.unwrap();
        apps.push(app);
    }
    let viewer = &apps[3];

    for app in &apps[..3] {
        app.start_typing().await;
    }
    wait_until(EVENT_TIMEOUT, "typing indicator", || async {
        viewer.typing_indicator().await.as_deref() == Some("Ana and 2 others are typing")
    })
    .await
    .unwrap();

    // Nobody types again, so every indicator clears after the idle window
    wait_until(EVENT_TIMEOUT, "typing to clear", || async {
        viewer.typing_indicator().await.is_none()
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_sending_stops_typing() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    ana_app.start_typing().await;
    wait_until(EVENT_TIMEOUT, "Ana typing", || async {
        bo_app.typing_indicator().await.as_deref() == Some("Ana is typing")
    })
    .await
    .unwrap();

    ana_app.send_message("done", None).await.unwrap();
    wait_until(Duration::from_millis(500), "typing to stop", || async {
        bo_app.typing_indicator().await.is_none()
    })
    .await
    .unwrap();
}

// ============================================================================
// Conversation List Tests
// ============================================================================

#[tokio::test]
async fn test_list_follows_activity_and_pins_are_personal() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let cy = platform.register("Cy").await.unwrap();
    let with_bo = platform.direct(&ana, &bo).await.unwrap();
    let with_cy = platform.direct(&ana, &cy).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    let list = ana_app.list_conversations().await;
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].conversation.id, with_cy.id);

    bo_app.set_current_conversation(Some(with_bo.id)).await.unwrap();
    bo_app.send_message("bump", None).await.unwrap();

    wait_until(EVENT_TIMEOUT, "list to reorder", || async {
        ana_app
            .conversations()
            .first()
            .is_some_and(|s| s.conversation.id == with_bo.id)
    })
    .await
    .unwrap();
    let items = ana_app.conversation_items();
    assert_eq!(items[0].title, "Bo");
    assert_eq!(items[0].last_message.as_ref().unwrap().preview, "bump");

    assert!(ana_app.toggle_pin_conversation(with_bo.id).await);
    assert!(ana_app.list_conversations().await[0].pinned);
    assert!(!bo_app.list_conversations().await[0].pinned);
}

#[tokio::test]
async fn test_presence_follows_sessions() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    ana_app.list_conversations().await;
    assert!(!ana_app.conversation_items()[0].is_online);

    let bo_app = platform.sign_in(&bo).await.unwrap();
    wait_until(EVENT_TIMEOUT, "Bo online", || async {
        ana_app.conversation_items()[0].is_online
    })
    .await
    .unwrap();

    bo_app.session().sign_out();
    wait_until(EVENT_TIMEOUT, "Bo offline", || async {
        !ana_app.conversation_items()[0].is_online
    })
    .await
    .unwrap();
    let stored = platform.ctx.user_repo().find_by_id(bo.id).await.unwrap().unwrap();
    assert!(!stored.is_online);
    assert!(stored.last_seen.is_some());
}

// ============================================================================
// Message Tests
// ============================================================================

#[tokio::test]
async fn test_attachment_upload_and_send() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    let uploaded = ana_app
        .upload_attachment("cat photo.png", PNG_BYTES)
        .await
        .unwrap()
        .unwrap();
    assert!(uploaded.url.starts_with("http://files.test/attachments/"));
    let on_disk = std::fs::read(platform.upload_dir.join(&uploaded.path)).unwrap();
    assert_eq!(on_disk, PNG_BYTES);

    let sent = ana_app
        .send_message("", Some(uploaded.url.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sent.attachment.as_deref(), Some(uploaded.url.as_str()));
}

#[tokio::test]
async fn test_message_length_limit() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    assert!(ana_app.send_message(text_of_len(4000), None).await.unwrap().is_some());
    let err = ana_app.send_message(text_of_len(4001), None).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(ana_app.messages().await.len(), 1);
}

#[tokio::test]
async fn test_reactions_and_delete_fan_out() {
    let platform = TestPlatform::start().await.unwrap();
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    let sent = ana_app.send_message("vote", None).await.unwrap().unwrap();
    wait_until(EVENT_TIMEOUT, "Bo to receive", || async {
        bo_app.messages().await.iter().any(|m| m.id == sent.id)
    })
    .await
    .unwrap();

    assert_eq!(bo_app.toggle_reaction(sent.id, "👍").await.unwrap(), Some(true));
    wait_until(EVENT_TIMEOUT, "Ana to see reaction", || async {
        ana_app
            .reactions(sent.id)
            .await
            .iter()
            .any(|c| c.emoji == "👍" && c.count == 1 && !c.me)
    })
    .await
    .unwrap();

    ana_app.delete_message(sent.id).await.unwrap();
    wait_until(EVENT_TIMEOUT, "Bo to drop deleted", || async {
        bo_app.messages().await.is_empty()
    })
    .await
    .unwrap();
}

// ============================================================================
// PostgreSQL + Redis Tests
// ============================================================================

#[tokio::test]
async fn test_backed_status_round_trip() {
    if !check_test_env() {
        return;
    }

    let platform = TestPlatform::start_from_env().await.expect("Failed to start platform");
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    let sent = ana_app.send_message("over redis", None).await.unwrap().unwrap();
    wait_until(EVENT_TIMEOUT, "read receipt over redis", || async {
        ana_app
            .messages()
            .await
            .iter()
            .any(|m| m.id == sent.id && m.status == MessageStatus::Read)
    })
    .await
    .unwrap();

    let stored = platform.ctx.message_repo().find_by_id(sent.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MessageStatus::Read);
}

#[tokio::test]
async fn test_backed_typing_over_redis() {
    if !check_test_env() {
        return;
    }

    let platform = TestPlatform::start_from_env().await.expect("Failed to start platform");
    let ana = platform.register("Ana").await.unwrap();
    let bo = platform.register("Bo").await.unwrap();
    let conversation = platform.direct(&ana, &bo).await.unwrap();

    let ana_app = platform.sign_in(&ana).await.unwrap();
    let bo_app = platform.sign_in(&bo).await.unwrap();
    ana_app.set_current_conversation(Some(conversation.id)).await.unwrap();
    bo_app.set_current_conversation(Some(conversation.id)).await.unwrap();

    ana_app.start_typing().await;
    wait_until(EVENT_TIMEOUT, "typing over redis", || async {
        bo_app.typing_indicator().await.as_deref() == Some("Ana is typing")
    })
    .await
    .unwrap();
}
