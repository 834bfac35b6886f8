//! `#[derive(Message)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Path, parse_macro_input};

/// Options read from `#[message(...)]`.
#[derive(Default)]
struct MessageArgs {
    name: Option<LitStr>,
    validate: Option<Path>,
}

impl MessageArgs {
    fn from_input(input: &DeriveInput) -> syn::Result<Self> {
        let mut args = MessageArgs::default();
        for attr in input.attrs.iter().filter(|a| a.path().is_ident("message")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    args.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("validate") {
                    args.validate = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unknown attribute, expected `name` or `validate`"))
                }
            })?;
        }
        Ok(args)
    }
}

/// Implementation of the `#[derive(Message)]` macro.
pub fn derive_message_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let args = match MessageArgs::from_input(&input) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let message_name = args
        .name
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let validate = args.validate.map(|path| {
        quote! {
            fn validate(&self) -> ::core::result::Result<(), ::conduit::BoxError> {
                #path(self)
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::conduit::Message for #ident #ty_generics #where_clause {
            fn message_name(&self) -> &'static str {
                #message_name
            }

            fn to_map(
                &self,
            ) -> ::conduit::__private::serde_json::Map<
                ::std::string::String,
                ::conduit::__private::serde_json::Value,
            > {
                ::conduit::map_of(self)
            }

            #validate

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }
    };

    TokenStream::from(expanded)
}
