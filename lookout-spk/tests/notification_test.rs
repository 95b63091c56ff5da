//! Tests for auto-expiring notifications and utterance event streams

use lookout_spk::engines::{CustomSpeechEngine, SpeechEngine, SpeechEvent, SpeechHandle};
use lookout_spk::{NotificationCenter, SpeechConfig};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_notification_expires_after_ttl() {
    let center = NotificationCenter::default();
    let shown = center.push("🎯 PERSON detected (85%)");

    assert_eq!(center.len(), 1);
    assert_eq!(center.active()[0], shown);

    tokio::time::sleep(Duration::from_millis(2999)).await;
    assert_eq!(center.len(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(center.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_notifications_keep_insertion_order_and_expire_independently() {
    let center = NotificationCenter::new(Duration::from_millis(3000));
    center.push("first");
    tokio::time::sleep(Duration::from_millis(1000)).await;
    center.push("second");

    let messages: Vec<_> = center.active().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["first", "second"]);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let messages: Vec<_> = center.active().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["second"]);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_notification_ids_are_unique() {
    let center = NotificationCenter::default();
    let a = center.push("same");
    let b = center.push("same");
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_notification_serializes() {
    let center = NotificationCenter::default();
    let shown = center.push("🎯 CHAIR detected (74%)");
    let json = serde_json::to_value(&shown).unwrap();
    assert_eq!(json["message"], "🎯 CHAIR detected (74%)");
    assert!(json["id"].is_string());
}

#[tokio::test]
async fn test_handle_outcome_reports_terminal_event() {
    let engine = CustomSpeechEngine::always_succeeds("test");
    let handle = engine.speak(&SpeechConfig::default().announcement("hi")).await.unwrap();
    assert_eq!(handle.outcome().await, SpeechEvent::Completed);

    let engine = CustomSpeechEngine::always_fails("test", "audio-busy");
    let handle = engine.speak(&SpeechConfig::default().announcement("hi")).await.unwrap();
    assert_eq!(handle.outcome().await, SpeechEvent::Failed("audio-busy".to_string()));
}

#[tokio::test]
async fn test_handle_dropped_stream_counts_as_failure() {
    let (sender, handle) = SpeechHandle::channel();
    sender.started();
    drop(sender);
    assert!(matches!(handle.outcome().await, SpeechEvent::Failed(_)));
}

#[tokio::test]
async fn test_custom_engine_rejects_empty_text() {
    let engine = CustomSpeechEngine::always_succeeds("test");
    let result = engine.speak(&SpeechConfig::default().announcement("")).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("empty"));
}

#[tokio::test]
async fn test_handle_delivers_events_in_order() {
    let (sender, mut handle) = SpeechHandle::channel();
    assert!(sender.started());
    assert!(sender.completed());
    drop(sender);

    assert_eq!(handle.next_event().await, Some(SpeechEvent::Started));
    assert_eq!(handle.next_event().await, Some(SpeechEvent::Completed));
    assert_eq!(handle.next_event().await, None);
}
