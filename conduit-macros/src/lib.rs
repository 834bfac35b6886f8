//! Procedural macros for Conduit.
//!
//! - `#[derive(Message)]` - implements `conduit::Message` for a
//!   `serde::Serialize` type

use proc_macro::TokenStream;

mod message;

/// Derive macro for implementing the `Message` trait.
///
/// The message name defaults to the type name. The type must implement
/// `serde::Serialize`; its serialized fields become the message map.
///
/// # Attributes
///
/// - `#[message(name = "orders.create")]` - use another message name
/// - `#[message(validate = path::to::check)]` - call
///   `fn check(&Self) -> Result<(), BoxError>` from `Message::validate`
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Serialize, Deserialize, Message)]
/// #[message(validate = CreateOrder::check)]
/// struct CreateOrder {
///     sku: String,
///     quantity: u32,
/// }
/// ```
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    message::derive_message_impl(input)
}
