//! Inferred field/type tree.
//!
//! Produced by the inference step and consumed read-only by the flat and
//! generator-config transforms. Field names and type names use the same
//! spelling as the mongodb-schema library so trees exported by either tool
//! deserialize into these types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of an observed BSON value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    String,
    /// 32-bit integers and doubles
    Number,
    /// 64-bit integers
    Long,
    Decimal128,
    Date,
    Boolean,
    ObjectId,
    Binary,
    Document,
    Array,
    Null,
    Timestamp,
    RegExp,
    Code,
    Symbol,
    MinKey,
    MaxKey,
    Undefined,
    #[serde(rename = "DBPointer")]
    DbPointer,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::String => "String",
            TypeName::Number => "Number",
            TypeName::Long => "Long",
            TypeName::Decimal128 => "Decimal128",
            TypeName::Date => "Date",
            TypeName::Boolean => "Boolean",
            TypeName::ObjectId => "ObjectId",
            TypeName::Binary => "Binary",
            TypeName::Document => "Document",
            TypeName::Array => "Array",
            TypeName::Null => "Null",
            TypeName::Timestamp => "Timestamp",
            TypeName::RegExp => "RegExp",
            TypeName::Code => "Code",
            TypeName::Symbol => "Symbol",
            TypeName::MinKey => "MinKey",
            TypeName::MaxKey => "MaxKey",
            TypeName::Undefined => "Undefined",
            TypeName::DbPointer => "DBPointer",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field and the distribution of types observed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeNode {
    pub name: String,

    /// Segments from the document root down to this field
    pub path: Vec<String>,

    /// Number of sampled parent documents containing the field
    #[serde(default)]
    pub count: u64,

    /// `count` relative to the number of parent documents
    #[serde(default)]
    pub probability: f64,

    /// Candidates ordered from most to least frequent
    pub types: Vec<TypeCandidate>,
}

impl FieldTypeNode {
    /// Joined path, e.g. `address.city`.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// Most frequent candidate, if any type was observed.
    pub fn dominant_type(&self) -> Option<&TypeCandidate> {
        self.types.first()
    }
}

/// One observed type of a field (or of array elements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCandidate {
    pub name: TypeName,

    #[serde(default)]
    pub path: Vec<String>,

    #[serde(default)]
    pub count: u64,

    pub probability: f64,

    /// Nested fields when `name` is `Document`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldTypeNode>,

    /// Element types when `name` is `Array`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeCandidate>,

    /// Array length summary when `name` is `Array`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lengths: Option<ArrayLengths>,
}

impl TypeCandidate {
    /// Scalar candidate without nested structure.
    pub fn scalar(name: TypeName, probability: f64) -> Self {
        Self {
            name,
            path: Vec::new(),
            count: 0,
            probability,
            fields: Vec::new(),
            types: Vec::new(),
            lengths: None,
        }
    }

    pub fn document(probability: f64, fields: Vec<FieldTypeNode>) -> Self {
        Self {
            fields,
            ..Self::scalar(TypeName::Document, probability)
        }
    }

    pub fn array(probability: f64, element_types: Vec<TypeCandidate>) -> Self {
        Self {
            types: element_types,
            ..Self::scalar(TypeName::Array, probability)
        }
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }
}

/// Length statistics over every sampled array of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayLengths {
    pub min: u64,
    pub max: u64,
    pub average: f64,
    /// Elements seen across all arrays
    pub total_count: u64,
}

/// Inferred tree for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferredSchema {
    /// Number of sampled documents
    pub count: u64,
    pub fields: Vec<FieldTypeNode>,
}
