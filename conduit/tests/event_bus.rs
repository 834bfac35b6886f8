//! Integration tests for the event bus.

mod common;

use common::container;
use conduit::{
    BusError, BusFactory, ConduitConfig, Event, EventBus, RuntimeContext, WILDCARD,
};
use serde_json::json;

#[tokio::test]
async fn test_stop_propagation_skips_later_listeners() {
    let (container, log) = container();
    let bus = EventBus::new(container);
    bus.register("user.created", "Stopper");
    bus.register("user.created", "Second");

    let event = bus.dispatch(Event::new("user.created")).await.unwrap();

    assert!(event.is_propagation_stopped());
    assert_eq!(log.entries(), ["Stopper:user.created"]);
}

#[tokio::test]
async fn test_listeners_run_in_registration_order_then_wildcard() {
    let (container, log) = container();
    let bus = EventBus::new(container);
    bus.register(WILDCARD, "Spy");
    bus.register("user.created", "First");
    bus.register("user.created", "Second");
    bus.register("user.deleted", "Failing");

    bus.dispatch(Event::new("user.created")).await.unwrap();
    bus.dispatch(Event::new("user.renamed")).await.unwrap();

    assert_eq!(
        log.entries(),
        [
            "First:user.created",
            "Second:user.created",
            "Spy:user.created",
            "Spy:user.renamed"
        ]
    );
}

#[tokio::test]
async fn test_listener_changes_are_returned() {
    let (container, _log) = container();
    let bus = EventBus::new(container);
    bus.register("user.created", "StampListener");

    let event = bus
        .dispatch(
            Event::new("user.created")
                .with_source("signup")
                .with("user", 7),
        )
        .await
        .unwrap();

    assert_eq!(event.source(), Some("signup"));
    assert_eq!(event.get("user"), Some(&json!(7)));
    assert_eq!(event.get("stamped"), Some(&json!(true)));
}

#[tokio::test]
async fn test_failing_listener_aborts_dispatch() {
    let (container, log) = container();
    let bus = EventBus::new(container);
    bus.register("user.created", "First");
    bus.register("user.created", "Failing");
    bus.register("user.created", "Second");

    let err = bus.dispatch(Event::new("user.created")).await.unwrap_err();

    assert!(matches!(
        err,
        BusError::Listener { ref listener, .. } if listener == "Failing"
    ));
    assert_eq!(log.entries(), ["First:user.created", "Failing:user.created"]);
}

#[tokio::test]
async fn test_unnamed_events_use_type_name() {
    let (container, log) = container();
    let bus = EventBus::new(container);
    bus.register(Event::TYPE_NAME, "Spy");

    bus.dispatch(Event::new("")).await.unwrap();
    let dispatched = bus.execute(&Event::new("")).await.unwrap();

    assert!(dispatched.is_some());
    assert_eq!(log.entries(), ["Spy:Event", "Spy:Event"]);
}

#[tokio::test]
async fn test_async_dispatch_runs_in_background() {
    let (container, log) = container();
    let config = ConduitConfig {
        context: RuntimeContext::CommandLine,
        async_events: true,
        ..ConduitConfig::default()
    };
    let buses = BusFactory::new(container, config);
    let events = buses.event_bus();
    assert!(events.async_mode());
    events.register("user.created", "StampListener");
    events.register("user.created", "Spy");

    let returned = events.dispatch(Event::new("user.created")).await.unwrap();
    // Returned before any listener touched it.
    assert_eq!(returned.get("stamped"), None);

    buses.shutdown().await;
    assert_eq!(log.entries(), ["Spy:user.created"]);
}

#[tokio::test]
async fn test_async_events_ignored_for_requests() {
    let (container, log) = container();
    let config = ConduitConfig {
        context: RuntimeContext::Request,
        async_events: true,
        ..ConduitConfig::default()
    };
    let bus = EventBus::with_config(container, config);
    assert!(!bus.async_mode());
    bus.register("user.created", "Spy");

    bus.dispatch(Event::new("user.created")).await.unwrap();
    assert_eq!(log.count(), 1);
}
