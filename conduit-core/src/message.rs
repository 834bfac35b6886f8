//! Message trait for DTOs exchanged with handlers.

use crate::error::BoxError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{any::Any, fmt};

/// A data carrier passed to a handler.
///
/// The bus looks handlers up by [`Message::message_name`], so two DTO types
/// must never report the same name.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Serialize, Deserialize, Message)]
/// struct CreateOrder { sku: String, quantity: u32 }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must implement `Message`",
    note = "Derive it with `#[derive(Message)]` on a `serde::Serialize` type."
)]
pub trait Message: Any + Send + Sync + fmt::Debug {
    /// The runtime type name used as the handler identifier.
    fn message_name(&self) -> &'static str;

    /// Map representation of the message.
    fn to_map(&self) -> Map<String, Value>;

    /// Validates the payload. Messages are valid by default.
    fn validate(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Returns a single field from the map representation.
    fn get(&self, name: &str) -> Option<Value> {
        self.to_map().remove(name)
    }

    /// Upcast used for downcasting replies and payloads.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Message {
    /// Returns the message as `T` if that is its concrete type.
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the concrete type is `T`.
    pub fn is<T: Message>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl fmt::Display for dyn Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.message_name(), Value::Object(self.to_map()))
    }
}

/// Construction of a message from its map representation.
pub trait FromMap: Sized {
    /// Builds `Self` from a map, failing on missing or mistyped fields.
    fn from_map(map: Map<String, Value>) -> Result<Self, BoxError>;
}

impl<T: DeserializeOwned> FromMap for T {
    fn from_map(map: Map<String, Value>) -> Result<Self, BoxError> {
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

/// Map conversion helper for `serde::Serialize` messages.
///
/// Non-object encodings (unit structs, newtypes over scalars) yield an empty map.
pub fn map_of<T: serde::Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// The reply type for handlers with nothing to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack;

impl Message for Ack {
    fn message_name(&self) -> &'static str {
        "Ack"
    }

    fn to_map(&self) -> Map<String, Value> {
        Map::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
