//! Derive macros for the Freekick admin state architecture
//!
//! This crate provides procedural macros to reduce boilerplate when writing
//! slice action enums.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates helpers for action enums (intents/outcomes)
//!
//! # Example
//!
//! ```ignore
//! use freekick_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum BannerAction {
//!     #[intent]
//!     Fetch { page: u32 },
//!
//!     #[outcome]
//!     Fetched { count: u64 },
//!
//!     ClearError,
//! }
//!
//! // Generated methods:
//! assert!(BannerAction::Fetch { page: 1 }.is_intent());
//! assert!(BannerAction::Fetched { count: 3 }.is_outcome());
//! assert_eq!(BannerAction::ClearError.name(), "ClearError");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_intent()` - Returns true if this variant starts an async operation
/// - `is_outcome()` - Returns true if this variant settles an async operation
/// - `name()` - Returns the variant name, used as a stable label in logs
///
/// Variants carrying neither attribute are plain synchronous actions
/// (`ClearError`, `SetPage`, ...): both predicates return false for them.
///
/// # Attributes
///
/// - `#[intent]` - Mark a variant as an intent (pending transition + effect)
/// - `#[outcome]` - Mark a variant as an outcome (fulfilled or rejected transition)
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant has both `#[intent]` and `#[outcome]` attributes
#[proc_macro_derive(Action, attributes(intent, outcome))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut intent_arms = Vec::new();
    let mut outcome_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_intent = has_attribute(&variant.attrs, "intent");
        let is_outcome = has_attribute(&variant.attrs, "outcome");

        if is_intent && is_outcome {
            return syn::Error::new_spanned(
                variant,
                "Variant cannot be both #[intent] and #[outcome]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let label = variant.ident.to_string();

        if is_intent {
            intent_arms.push(quote! { #pattern => true, });
        }
        if is_outcome {
            outcome_arms.push(quote! { #pattern => true, });
        }
        name_arms.push(quote! { #pattern => #label, });
    }

    // An enum with no variants still needs exhaustive matches
    let name_body = if name_arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#name_arms)* } }
    };

    let expanded = quote! {
        impl #name {
            /// Returns true if this action starts an async operation
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_intent(&self) -> bool {
                match self {
                    #(#intent_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action settles an async operation
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_outcome(&self) -> bool {
                match self {
                    #(#outcome_arms)*
                    _ => false,
                }
            }

            /// Returns the variant name
            #[must_use]
            pub const fn name(&self) -> &'static str {
                #name_body
            }
        }
    };

    TokenStream::from(expanded)
}

/// Match pattern that ignores the variant's fields
fn variant_pattern(ident: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
