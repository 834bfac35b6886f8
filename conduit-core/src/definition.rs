//! Service definitions registered with the container.

use crate::{argument::Argument, error::ContainerError, instance::Instance};
use serde_json::{Map, Value};

/// How a service id is turned into an object.
#[derive(Debug, Clone)]
pub enum ServiceDefinition {
    /// Build `class` with positional `arguments`.
    Class {
        /// Registered type name.
        class: String,
        /// Positional constructor arguments.
        arguments: Vec<Argument>,
    },
    /// Call the static factory `class::method` with `arguments`.
    Factory {
        /// Registered type name.
        class: String,
        /// Factory method name.
        method: String,
        /// Positional factory arguments.
        arguments: Vec<Argument>,
    },
    /// Resolve another service id instead.
    Alias(String),
    /// A pre-built object.
    Instance(Instance),
    /// The container itself. Seeded for the reserved ids only.
    SelfReference,
}

impl ServiceDefinition {
    /// A class definition without arguments.
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            class: class.into(),
            arguments: Vec::new(),
        }
    }

    /// A class definition with positional arguments.
    pub fn class_with(class: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self::Class {
            class: class.into(),
            arguments,
        }
    }

    /// A static factory definition.
    pub fn factory(
        class: impl Into<String>,
        method: impl Into<String>,
        arguments: Vec<Argument>,
    ) -> Self {
        Self::Factory {
            class: class.into(),
            method: method.into(),
            arguments,
        }
    }

    /// An alias for another service id.
    pub fn alias(target: impl Into<String>) -> Self {
        Self::Alias(target.into())
    }

    /// A pre-built object.
    pub fn instance(instance: Instance) -> Self {
        Self::Instance(instance)
    }

    /// Parse the declarative JSON form.
    ///
    /// Accepted shapes:
    ///
    /// - `"other-id"` (alias)
    /// - `{"alias": "other-id"}`
    /// - `{"class": "Type", "arguments": [...]}`
    /// - `{"class": {"name": "Type", "arguments": [...]}}`
    /// - `{"factory": {"class": "Type", "method": "create", "arguments": [...]}}`
    pub fn from_json(id: &str, value: &Value) -> Result<Self, ContainerError> {
        let invalid = |reason: &str| ContainerError::InvalidServiceDefinition {
            id: id.to_owned(),
            reason: reason.to_owned(),
        };

        let object = match value {
            Value::String(target) => return Ok(Self::alias(target.clone())),
            Value::Object(object) => object,
            _ => return Err(invalid("expected an object definition or a string alias")),
        };

        if let Some(target) = object.get("alias") {
            return target
                .as_str()
                .map(Self::alias)
                .ok_or_else(|| invalid("`alias` must be a string"));
        }

        if let Some(factory) = object.get("factory") {
            let factory = factory
                .as_object()
                .ok_or_else(|| invalid("`factory` must be an object"))?;
            let class = string_field(factory, "class").ok_or_else(|| invalid("factory without `class`"))?;
            let method =
                string_field(factory, "method").ok_or_else(|| invalid("factory without `method`"))?;
            let arguments = arguments_field(factory).ok_or_else(|| invalid("`arguments` must be a list"))?;
            return Ok(Self::factory(class, method, arguments));
        }

        match object.get("class") {
            Some(Value::String(class)) => {
                let arguments =
                    arguments_field(object).ok_or_else(|| invalid("`arguments` must be a list"))?;
                Ok(Self::class_with(class.clone(), arguments))
            }
            Some(Value::Object(class)) => {
                let name = string_field(class, "name").ok_or_else(|| invalid("class without `name`"))?;
                let arguments =
                    arguments_field(class).ok_or_else(|| invalid("`arguments` must be a list"))?;
                Ok(Self::class_with(name, arguments))
            }
            Some(_) => Err(invalid("`class` must be a string or an object")),
            None => Err(invalid("expected one of `class`, `factory` or `alias`")),
        }
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

// Missing `arguments` means no arguments; anything but a list is rejected.
fn arguments_field(object: &Map<String, Value>) -> Option<Vec<Argument>> {
    match object.get("arguments") {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(raw)) => Some(Argument::parse_all(raw.iter().cloned())),
        Some(_) => None,
    }
}
