#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the hostbind workspace.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! hostbind-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```
//!
//! The examples below are `ignore`d to avoid compiling in this crate; the
//! `tests/ui` cases exercise the real expansion.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal` variant is present.
/// * **Variant Names**: Generates `kind(&self) -> &'static str`, used as a structured
///   logging field (`error.kind = %err.kind()`).
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]`, and must also carry `context`.
/// 4. Tuple or unit variants are rejected to keep error wiring explicit.
///
/// # Example
///
/// ```rust,ignore
/// use hostbind_derive::hostbind_error;
/// use std::borrow::Cow;
///
/// #[hostbind_error]
/// pub enum StoreError {
///     #[error("Serialization failure{}: {source}", format_context(.context))]
///     Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal store error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(raw: serde_json::Value) -> Result<Domain, StoreError> {
///     serde_json::from_value(raw).context("Decoding stored domain")
/// }
/// ```
#[proc_macro_attribute]
pub fn hostbind_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand_derive(input).into()
}
