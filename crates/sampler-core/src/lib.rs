//! Core logic for mongo-schema-sampler.
//!
//! This crate is free of I/O. It decides which namespaces to sample and
//! reshapes inferred field/type trees into the two report formats:
//!
//! - [`namespace`] - Namespace model, include/exclude patterns and the resolver
//! - [`tree`] - The inferred field/type tree handed over by the inference step
//! - [`flat`] - Flat `{path, probability, fieldType}` report
//! - [`generator`] - Nested descriptor config for mgodatagen
//! - [`bounds`] - Ranges used by generator descriptors
//!
//! # Example
//!
//! ```rust
//! use sampler_core::flat::flatten;
//! use sampler_core::tree::{FieldTypeNode, TypeCandidate, TypeName};
//!
//! let fields = vec![FieldTypeNode {
//!     name: "age".to_string(),
//!     path: vec!["age".to_string()],
//!     count: 9,
//!     probability: 0.9,
//!     types: vec![TypeCandidate::scalar(TypeName::Number, 0.9)],
//! }];
//!
//! let records = flatten(&fields);
//! assert_eq!(records[0].path, "age");
//! assert_eq!(records[0].probability, "90%");
//! ```

pub mod bounds;
pub mod flat;
pub mod generator;
pub mod namespace;
pub mod tree;

// Re-exports for convenience
pub use bounds::{BoundsError, DateRange, GenerationBounds, IntRange, LengthRange};
pub use flat::{flatten, AnalysisRecord, FieldWalk, NamespaceAnalysis};
pub use generator::{
    build_content, DescriptorStyle, GeneratorCollection, GeneratorContent, LossyField,
    TypeDescriptor,
};
pub use namespace::{
    resolve, sampleable, CollectionType, IncludePolicy, Namespace, NamespaceFilter,
    NamespacePattern, ResolveError,
};
pub use tree::{ArrayLengths, FieldTypeNode, InferredSchema, TypeCandidate, TypeName};
