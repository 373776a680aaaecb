//! Field-type inference over sampled BSON documents.
//!
//! Feeds documents one at a time into a [`SchemaAccumulator`] and produces
//! the [`InferredSchema`] tree that `sampler-core` transforms into reports.
//!
//! # Semantics
//!
//! - A field's `probability` is the share of parent documents containing it.
//! - A type candidate's `probability` is the share of parent documents in
//!   which the field held that type, so candidates of one field sum to at
//!   most 1. Missing values do not get a candidate of their own.
//! - Array element candidates are counted over every element of every
//!   sampled array of the field; document elements share one nested tree.
//! - Fields are ordered by name (case-insensitive), candidates by count
//!   (descending, first seen wins ties).
//!
//! # Example
//!
//! ```rust
//! use bson::doc;
//! use mongodb_inference::infer_schema;
//!
//! let docs = vec![doc! { "age": 31 }, doc! { "age": "unknown" }];
//! let schema = infer_schema(&docs);
//! assert_eq!(schema.count, 2);
//! assert_eq!(schema.fields[0].types.len(), 2);
//! ```

mod accumulator;

pub use accumulator::{type_name, SchemaAccumulator};

use bson::Document;
use sampler_core::InferredSchema;

/// Infer a schema from an in-memory batch of documents.
pub fn infer_schema<'a, I>(documents: I) -> InferredSchema
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut accumulator = SchemaAccumulator::new();
    for document in documents {
        accumulator.add_document(document);
    }
    accumulator.finish()
}
