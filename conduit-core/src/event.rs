//! Domain events carried through the event bus.

use crate::message::Message;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::any::Any;

/// An event passed from listener to listener during one dispatch.
///
/// Listeners receive `&mut Event`, so they can enrich [`Event::data`] for the
/// listeners after them, or call [`Event::stop_propagation`] to end the
/// dispatch. Stopping never affects listeners that already ran.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    source: Option<String>,
    occurred_at: DateTime<Utc>,
    data: Map<String, Value>,
    propagation_stopped: bool,
}

impl Event {
    /// Type name reported for events that carry no explicit name.
    pub const TYPE_NAME: &'static str = "Event";

    /// Create a named event, timestamped now.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            occurred_at: Utc::now(),
            data: Map::new(),
            propagation_stopped: false,
        }
    }

    /// Create an event from a message: its name and payload become the
    /// event name and data bag.
    pub fn from_message(message: &dyn Message) -> Self {
        Self::new(message.message_name()).with_data(message.to_map())
    }

    /// Set the component that fired the event.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add one entry to the data bag.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Replace the data bag.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// The declared name. May be empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name listeners are looked up by: the declared name, or
    /// [`Event::TYPE_NAME`] when none was given.
    pub fn identifier(&self) -> &str {
        if self.name.is_empty() {
            Self::TYPE_NAME
        } else {
            &self.name
        }
    }

    /// The component that fired the event, if known.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// When the event was created.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Read access to the data bag.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Write access to the data bag.
    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    /// Shortcut for a single data entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Insert or replace a data entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Skip every listener after the current one.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether a listener stopped the dispatch.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl Message for Event {
    fn message_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name.clone()));
        map.insert(
            "source".into(),
            self.source.clone().map_or(Value::Null, Value::from),
        );
        map.insert(
            "occurred_at".into(),
            Value::from(self.occurred_at.to_rfc3339()),
        );
        map.insert("data".into(), Value::Object(self.data.clone()));
        map
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
