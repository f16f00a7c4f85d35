//! Procedural macros for Hermes request types.
//!
//! `#[derive(Bindable)]` generates the schema description and the field
//! assignment glue the binder needs, from `#[bind(...)]` field attributes.
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes::prelude::*;
//!
//! #[derive(Default, Serialize, Bindable)]
//! struct UpdatePost {
//!     #[bind(path = "id")]
//!     id: i64,
//!     #[bind(json = "title", validate = "required,min=3")]
//!     title: String,
//!     #[bind(query = "tags")]
//!     tags: Vec<String>,
//!     #[bind(dep = "auth.UserID")]
//!     user_id: String,
//! }
//! ```
//!
//! # Attributes
//!
//! | Key | Meaning |
//! |---|---|
//! | `path = "name"` | path variable |
//! | `query = "name"` | query parameter |
//! | `header = "Name"` | request header |
//! | `json = "key"` | key of the JSON body |
//! | `dep = "name"` / `dep = "name.Field"` | dependency result, optionally a nested field |
//! | `validate = "rules"` | validation rules, passed to the validator verbatim |
//!
//! A field may declare at most one source. Fields without a source keep
//! their `Default` value; their `validate` rules still apply.

mod bindable;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `hermes_core::Bindable` for a struct with named fields.
///
/// Sourced field types must implement `serde::de::DeserializeOwned` and
/// fields with `validate` rules `serde::Serialize`; the struct itself must
/// implement `Default` and `serde::Serialize`. Rules are checked against the
/// Rust field names, so serde renames on the struct do not affect them.
#[proc_macro_derive(Bindable, attributes(bind))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    bindable::expand_bindable(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
