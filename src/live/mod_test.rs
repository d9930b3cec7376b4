use std::sync::Mutex;

use serde_json::json;

use super::*;

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Handler) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let make = {
        let seen = Arc::clone(&seen);
        move |label: &str| -> Handler {
            let seen = Arc::clone(&seen);
            let label = label.to_owned();
            Arc::new(move |payload: &Value| {
                seen.lock().unwrap().push(format!("{label}:{payload}"));
            })
        }
    };
    (seen, make)
}

#[test]
fn registry_handlers_are_additive_and_ordered() {
    let registry = TopicRegistry::new();
    let (seen, make) = recorder();

    let (_, first) = registry.add("event_updates", make("a"));
    let (_, second) = registry.add("event_updates", make("b"));
    assert!(first);
    assert!(!second);

    assert_eq!(registry.dispatch("event_updates", &json!(1)), 2);
    assert_eq!(*seen.lock().unwrap(), vec!["a:1".to_owned(), "b:1".to_owned()]);
}

#[test]
fn registry_remove_reports_last_handler() {
    let registry = TopicRegistry::new();
    let (_, make) = recorder();
    let (a, _) = registry.add("central_SRA", make("a"));
    let (b, _) = registry.add("central_SRA", make("b"));

    assert!(!registry.remove("central_SRA", a));
    assert!(!registry.remove("central_SRA", a));
    assert!(registry.remove("central_SRA", b));
    assert!(registry.topics().is_empty());
    assert_eq!(registry.dispatch("central_SRA", &json!({})), 0);
}

#[test]
fn registry_topics_are_sorted() {
    let registry = TopicRegistry::new();
    let (_, make) = recorder();
    registry.add("task_completion_map_update", make("a"));
    registry.add("central_SRA", make("b"));
    assert_eq!(registry.topics(), vec!["central_SRA".to_owned(), "task_completion_map_update".to_owned()]);
}

#[test]
fn handler_may_unsubscribe_during_dispatch() {
    let registry = TopicRegistry::new();
    let slot: Arc<Mutex<Option<u64>>> = Arc::default();
    let handler: Handler = {
        let registry = registry.clone();
        let slot = Arc::clone(&slot);
        Arc::new(move |_: &Value| {
            if let Some(id) = slot.lock().unwrap().take() {
                registry.remove("event_updates", id);
            }
        })
    };
    let (id, _) = registry.add("event_updates", handler);
    *slot.lock().unwrap() = Some(id);

    assert_eq!(registry.dispatch("event_updates", &json!({})), 1);
    assert_eq!(registry.handler_count("event_updates"), 0);
}

#[test]
fn dropping_subscription_runs_cancel_once() {
    let count = Arc::new(Mutex::new(0));
    let subscription = {
        let count = Arc::clone(&count);
        Subscription::new("event_updates", move || *count.lock().unwrap() += 1)
    };
    assert_eq!(subscription.topic(), "event_updates");
    subscription.cancel();
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn fake_channel_subscription_guard_unregisters() {
    let channel = test_helpers::FakeChannel::new(ChannelState::Connected);
    let (seen, make) = recorder();

    let guard = channel.subscribe("event_updates", make("a"));
    assert_eq!(channel.publish("event_updates", &json!("x")), 1);
    drop(guard);
    assert_eq!(channel.publish("event_updates", &json!("y")), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn channel_state_down_states() {
    assert!(ChannelState::Disconnected.is_down());
    assert!(ChannelState::Disconnecting.is_down());
    assert!(!ChannelState::Connecting.is_down());
    assert!(!ChannelState::Connected.is_down());
    assert_eq!(ChannelState::Connected.to_string(), "connected");
}
