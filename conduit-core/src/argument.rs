//! Constructor arguments: declared parameters, manifest references and
//! resolved values.
//!
//! Manifest strings are parsed into [`Argument`] once, when the manifest is
//! loaded:
//!
//! - `"ENV.NAME"` → [`Argument::Env`] (`NAME`)
//! - `"@id"` → [`Argument::Service`] (`id`)
//! - anything else → [`Argument::Literal`]

use crate::{error::BoxError, instance::Instance};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{any::Any, sync::Arc};

/// Prefix marking an environment variable reference.
pub const ENV_PREFIX: &str = "ENV.";

/// Sigil marking a service reference.
pub const SERVICE_SIGIL: char = '@';

/// An argument as written in a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Argument {
    /// Passed through unchanged.
    Literal(Value),
    /// Looked up in the environment at build time.
    Env(String),
    /// Resolved through the container at build time.
    Service(String),
}

impl Argument {
    /// Parse a raw manifest value.
    pub fn parse(raw: Value) -> Self {
        if let Value::String(s) = &raw {
            if let Some(name) = s.strip_prefix(ENV_PREFIX) {
                return Argument::Env(name.to_owned());
            }
            if let Some(id) = s.strip_prefix(SERVICE_SIGIL) {
                return Argument::Service(id.to_owned());
            }
        }
        Argument::Literal(raw)
    }

    /// Parse a list of raw manifest values, keeping order.
    pub fn parse_all(raw: impl IntoIterator<Item = Value>) -> Vec<Self> {
        raw.into_iter().map(Self::parse).collect()
    }

    /// A literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Argument::Literal(value.into())
    }

    /// An environment variable reference.
    pub fn env(name: impl Into<String>) -> Self {
        Argument::Env(name.into())
    }

    /// A service reference.
    pub fn service(id: impl Into<String>) -> Self {
        Argument::Service(id.into())
    }
}

impl From<Value> for Argument {
    fn from(raw: Value) -> Self {
        Self::parse(raw)
    }
}

/// A declared constructor or factory parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: &'static str,
    type_name: Option<&'static str>,
    default: Option<Value>,
}

impl Parameter {
    /// An untyped parameter.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            type_name: None,
            default: None,
        }
    }

    /// A parameter declared with a registered type (class or interface) name.
    pub const fn typed(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name: Some(type_name),
            default: None,
        }
    }

    /// Give the parameter a default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared type name, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }

    /// The default value, if any.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the parameter can be left out.
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// A parameter after resolution.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A plain value (literal, environment variable or default).
    Value(Value),
    /// An injected service.
    Service(Instance),
}

/// Resolved arguments handed to a constructor, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    entries: Vec<(&'static str, Resolved)>,
}

impl Arguments {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolved parameter.
    pub fn push(&mut self, name: &'static str, resolved: Resolved) {
        self.entries.push((name, resolved));
    }

    /// Builder-style [`Arguments::push`].
    pub fn with(mut self, name: &'static str, resolved: Resolved) -> Self {
        self.push(name, resolved);
        self
    }

    /// Get the number of resolved parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no parameter was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw access by parameter name.
    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, r)| r)
    }

    /// The injected service behind `name`.
    pub fn instance(&self, name: &str) -> Result<Instance, BoxError> {
        match self.get(name) {
            Some(Resolved::Service(instance)) => Ok(instance.clone()),
            Some(Resolved::Value(_)) => Err(format!("argument `{name}` is not a service").into()),
            None => Err(format!("argument `{name}` was not resolved").into()),
        }
    }

    /// The injected service behind `name`, as `T`.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, BoxError> {
        let instance = self.instance(name)?;
        instance.downcast::<T>().ok_or_else(|| {
            format!(
                "argument `{name}` is a `{}`, not a `{}`",
                instance.type_name(),
                std::any::type_name::<T>()
            )
            .into()
        })
    }

    /// The plain value behind `name`, deserialized as `T`.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> Result<T, BoxError> {
        match self.get(name) {
            Some(Resolved::Value(value)) => Ok(serde_json::from_value(value.clone())?),
            Some(Resolved::Service(_)) => Err(format!("argument `{name}` is a service").into()),
            None => Err(format!("argument `{name}` was not resolved").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sigils_are_parsed_once() {
        assert_eq!(
            Argument::parse(json!("ENV.DATABASE_URL")),
            Argument::Env("DATABASE_URL".into())
        );
        assert_eq!(
            Argument::parse(json!("@mailer")),
            Argument::Service("mailer".into())
        );
        assert_eq!(Argument::parse(json!("plain")), Argument::literal("plain"));
        assert_eq!(Argument::parse(json!(42)), Argument::literal(42));
        assert_eq!(
            Argument::parse_all(vec![json!("@a"), json!(true)]),
            vec![Argument::service("a"), Argument::literal(true)]
        );
    }

    #[test]
    fn test_arguments_typed_access() {
        let args = Arguments::new()
            .with("retries", Resolved::Value(json!(3)))
            .with("clock", Resolved::Service(Instance::new(7_u64)));

        assert_eq!(args.value::<u32>("retries").unwrap(), 3);
        assert_eq!(*args.service::<u64>("clock").unwrap(), 7);
        assert!(args.service::<String>("clock").is_err());
        assert!(args.value::<u32>("clock").is_err());
        assert!(args.instance("retries").is_err());
        assert!(args.value::<u32>("missing").is_err());
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_parameter_defaults() {
        let p = Parameter::new("port").with_default(8080);
        assert!(p.is_optional());
        assert_eq!(p.default(), Some(&json!(8080)));
        assert!(!Parameter::typed("logger", "Logger").is_optional());
    }
}
