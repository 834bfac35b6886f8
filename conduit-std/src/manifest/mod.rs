//! Declarative JSON manifests for handlers, listeners and services.
//!
//! ```json
//! {"handlers":  [{"id": "CreateOrder", "handler": "CreateOrderHandler", "cli_alias": "order:create"}]}
//! {"listeners": [{"event": "order.created", "handler": "SendReceipt"}]}
//! {"services":  [{"name": "mailer", "class": "SmtpMailer", "arguments": ["ENV.SMTP_HOST"]}]}
//! ```
//!
//! Every list accepts `{"glob": "modules/*/handlers.json"}` entries as well.

pub mod glob;
mod reader;

pub use reader::{ActiveModules, AllModules, ManifestReader, ModuleFilter};
