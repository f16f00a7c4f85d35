//! # Hermes Extract
//!
//! Field extractors for the Hermes handler binding engine.
//!
//! | Extractor | Source | Absent value |
//! |-----------|--------|--------------|
//! | [`PathExtractor`] | path variable | error |
//! | [`QueryExtractor`] | query parameter | zero value |
//! | [`HeaderExtractor`] | header | zero value |
//! | [`JsonExtractor`] | JSON body key | zero value |
//! | [`DependencyExtractor`] | dependency result | resolved by the binder |
//!
//! Extractors read from an [`ExtractionContext`] and produce a
//! [`Value`](hermes_core::Value); string sources are converted with
//! [`coerce`].

#![doc(html_root_url = "https://docs.rs/hermes-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod coerce;
mod context;
mod extractor;
mod header;
mod json;
mod params;
mod path;
mod query;

pub use coerce::coerce;
pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use extractor::{DependencyExtractor, Extract, FieldExtractor};
pub use header::HeaderExtractor;
pub use json::JsonExtractor;
pub use params::Params;
pub use path::PathExtractor;
pub use query::QueryExtractor;
