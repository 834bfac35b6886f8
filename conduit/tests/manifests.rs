//! Integration tests for JSON manifests.

mod common;

use common::{Mailer, container};
use conduit::{
    BusFactory, ConduitConfig, Event, EventBus, ManifestError, ManifestReader, MemoryCache,
};
use serde_json::{Value, json};
use std::{fs, path::Path, sync::Arc};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, document: Value) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_vec_pretty(&document).unwrap()).unwrap();
}

fn module_layout() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "events.json",
        json!({"listeners": [{"glob": "modules/*/events.json"}]}),
    );
    write(
        dir.path(),
        "modules/billing/events.json",
        json!({"listeners": [{"event": "invoice.paid", "handler": "First"}]}),
    );
    write(
        dir.path(),
        "modules/shipping/events.json",
        json!({"listeners": [{"event": "parcel.sent", "handler": "Second", "priority": 10}]}),
    );
    dir
}

#[tokio::test]
async fn test_glob_loads_every_module() {
    let dir = module_layout();
    let (container, log) = container();
    let bus = EventBus::new(container);

    let loaded = bus
        .load_handlers_from_json_file(dir.path().join("events.json"))
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(bus.get_listeners("invoice.paid"), ["First"]);
    assert_eq!(bus.registrations("parcel.sent")[0].priority, Some(10));

    bus.dispatch(Event::new("parcel.sent")).await.unwrap();
    assert_eq!(log.entries(), ["Second:parcel.sent"]);
}

#[test]
fn test_inactive_modules_are_skipped() {
    let dir = module_layout();
    let (container, _log) = container();
    let config = ConduitConfig {
        active_modules: Some(vec!["billing".to_owned()]),
        ..ConduitConfig::default()
    };
    let bus = EventBus::with_config(container, config);

    let loaded = bus
        .load_handlers_from_json_file(dir.path().join("events.json"))
        .unwrap();

    assert_eq!(loaded, 1);
    assert!(bus.get_listeners("parcel.sent").is_empty());
}

#[test]
fn test_self_matching_glob_terminates() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "events.json",
        json!({"listeners": [
            {"glob": "*.json"},
            {"event": "a", "handler": "First"}
        ]}),
    );
    write(
        dir.path(),
        "more.json",
        json!({"listeners": [{"event": "b", "handler": "Second"}]}),
    );
    let (container, _log) = container();
    let bus = EventBus::new(container);

    let loaded = bus
        .load_handlers_from_json_file(dir.path().join("events.json"))
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(bus.get_listeners("a"), ["First"]);
    assert_eq!(bus.get_listeners("b"), ["Second"]);
}

#[tokio::test]
async fn test_handler_manifest_with_aliases() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "handlers.json",
        json!({"handlers": [
            {"id": "CreateOrder", "handler": "OrderHandler", "cli_alias": "order:create"},
            {"glob": "modules/**/handlers.json"}
        ]}),
    );
    write(
        dir.path(),
        "modules/reports/queries/handlers.json",
        json!({"handlers": [{"id": "CountOrders", "handler": "CountOrdersHandler"}]}),
    );
    let (container, _log) = container();
    let buses = BusFactory::new(container, ConduitConfig::default());
    let commands = buses.command_bus();

    let loaded = commands
        .load_handlers_from_json_file(dir.path().join("handlers.json"))
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(commands.get_handler("order:create").unwrap(), "OrderHandler");
    assert_eq!(commands.get_dto_class_from_alias("order:create"), "CreateOrder");
    assert_eq!(commands.get_handler("CountOrders").unwrap(), "CountOrdersHandler");
}

#[test]
fn test_service_manifest() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "services.json",
        json!({"services": [
            {"name": "smtp", "class": "Mailer", "arguments": ["ENV.SMTP_HOST", 2525]},
            {"name": "mailer", "alias": "smtp"}
        ]}),
    );
    let (container, _log) = container();

    let loaded = container
        .load_services_from_json_file(dir.path().join("services.json"))
        .unwrap();

    assert_eq!(loaded, 2);
    let mailer = container.resolve::<Mailer>("mailer").unwrap();
    assert_eq!(mailer.host, "mail.example.com");
    assert_eq!(mailer.port, 2525);
}

#[test]
fn test_malformed_manifests() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "flat.json", json!({"listeners": {"event": "a"}}));
    write(dir.path(), "empty.json", json!({"services": []}));
    fs::write(dir.path().join("broken.json"), "{not json").unwrap();
    let (container, _log) = container();
    let bus = EventBus::new(container);

    assert!(matches!(
        bus.load_handlers_from_json_file(dir.path().join("flat.json")),
        Err(ManifestError::Shape { .. })
    ));
    assert!(matches!(
        bus.load_handlers_from_json_file(dir.path().join("broken.json")),
        Err(ManifestError::Parse { .. })
    ));
    assert!(matches!(
        bus.load_handlers_from_json_file(dir.path().join("missing.json")),
        Err(ManifestError::Io { .. })
    ));
    // No `listeners` section at all.
    assert_eq!(
        bus.load_handlers_from_json_file(dir.path().join("empty.json")).unwrap(),
        0
    );
}

#[test]
fn test_cached_manifest_survives_file_changes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "events.json",
        json!({"listeners": [{"event": "a", "handler": "First"}]}),
    );
    let reader = ManifestReader::new().with_cache(Arc::new(MemoryCache::<Value>::new()), None);
    let path = dir.path().join("events.json");

    let first = reader.read(&path).unwrap();
    fs::write(&path, "{}").unwrap();
    assert_eq!(reader.read(&path).unwrap(), first);
    assert_eq!(ManifestReader::new().read(&path).unwrap(), json!({}));
}
