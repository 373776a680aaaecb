//! Incremental type counting for BSON documents.

use bson::{Bson, Document};
use sampler_core::{ArrayLengths, FieldTypeNode, InferredSchema, TypeCandidate, TypeName};
use std::collections::HashMap;

/// Map a BSON value to the type name used in reports.
///
/// 32-bit integers and doubles both report as `Number`, matching how the
/// Node.js driver surfaces them.
pub fn type_name(value: &Bson) -> TypeName {
    match value {
        Bson::Double(_) | Bson::Int32(_) => TypeName::Number,
        Bson::Int64(_) => TypeName::Long,
        Bson::Decimal128(_) => TypeName::Decimal128,
        Bson::String(_) => TypeName::String,
        Bson::Boolean(_) => TypeName::Boolean,
        Bson::DateTime(_) => TypeName::Date,
        Bson::ObjectId(_) => TypeName::ObjectId,
        Bson::Binary(_) => TypeName::Binary,
        Bson::Document(_) => TypeName::Document,
        Bson::Array(_) => TypeName::Array,
        Bson::Null => TypeName::Null,
        Bson::Timestamp(_) => TypeName::Timestamp,
        Bson::RegularExpression(_) => TypeName::RegExp,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => TypeName::Code,
        Bson::Symbol(_) => TypeName::Symbol,
        Bson::MinKey => TypeName::MinKey,
        Bson::MaxKey => TypeName::MaxKey,
        Bson::Undefined => TypeName::Undefined,
        Bson::DbPointer(_) => TypeName::DbPointer,
        #[allow(unreachable_patterns)]
        _ => TypeName::Undefined,
    }
}

/// Collects type statistics across sampled documents.
#[derive(Debug, Default)]
pub struct SchemaAccumulator {
    count: u64,
    fields: FieldSet,
}

impl SchemaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, document: &Document) {
        self.count += 1;
        self.fields.add_document(&[], document);
    }

    /// Number of documents added so far.
    pub fn document_count(&self) -> u64 {
        self.count
    }

    pub fn finish(self) -> InferredSchema {
        let fields = self.fields.finish(self.count);
        tracing::debug!(
            "Inferred {} top-level fields from {} documents",
            fields.len(),
            self.count
        );
        InferredSchema {
            count: self.count,
            fields,
        }
    }
}

#[derive(Debug, Default)]
struct FieldSet {
    fields: Vec<FieldStats>,
    index: HashMap<String, usize>,
}

#[derive(Debug)]
struct FieldStats {
    name: String,
    path: Vec<String>,
    count: u64,
    types: TypeSet,
}

impl FieldSet {
    fn add_document(&mut self, parent_path: &[String], document: &Document) {
        for (key, value) in document {
            let field = self.entry(parent_path, key);
            field.count += 1;
            field.types.add_value(&field.path, value);
        }
    }

    fn entry(&mut self, parent_path: &[String], key: &str) -> &mut FieldStats {
        let existing = self.index.get(key).copied();
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let mut path = parent_path.to_vec();
                path.push(key.to_string());
                self.fields.push(FieldStats {
                    name: key.to_string(),
                    path,
                    count: 0,
                    types: TypeSet::default(),
                });
                let idx = self.fields.len() - 1;
                self.index.insert(key.to_string(), idx);
                idx
            }
        };
        &mut self.fields[idx]
    }

    fn finish(self, parent_count: u64) -> Vec<FieldTypeNode> {
        let mut fields: Vec<FieldTypeNode> = self
            .fields
            .into_iter()
            .map(|field| FieldTypeNode {
                types: field.types.finish(parent_count, &field.path),
                probability: ratio(field.count, parent_count),
                count: field.count,
                name: field.name,
                path: field.path,
            })
            .collect();
        fields.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        fields
    }
}

#[derive(Debug, Default)]
struct TypeSet {
    // first-seen order
    types: Vec<TypeStats>,
}

#[derive(Debug)]
struct TypeStats {
    name: TypeName,
    count: u64,
    // Document values
    fields: FieldSet,
    // Array values
    elements: Option<Box<ArrayStats>>,
}

#[derive(Debug, Default)]
struct ArrayStats {
    element_count: u64,
    element_types: TypeSet,
    min_length: u64,
    max_length: u64,
    arrays: u64,
}

impl TypeSet {
    fn add_value(&mut self, path: &[String], value: &Bson) {
        let name = type_name(value);
        let existing = self.types.iter().position(|t| t.name == name);
        let stats = match existing {
            Some(idx) => &mut self.types[idx],
            None => {
                self.types.push(TypeStats {
                    name,
                    count: 0,
                    fields: FieldSet::default(),
                    elements: None,
                });
                let idx = self.types.len() - 1;
                &mut self.types[idx]
            }
        };
        stats.count += 1;

        match value {
            Bson::Document(document) => stats.fields.add_document(path, document),
            Bson::Array(values) => {
                let array = stats.elements.get_or_insert_with(Default::default);
                let length = values.len() as u64;
                if array.arrays == 0 {
                    array.min_length = length;
                    array.max_length = length;
                } else {
                    array.min_length = array.min_length.min(length);
                    array.max_length = array.max_length.max(length);
                }
                array.arrays += 1;
                for element in values {
                    array.element_count += 1;
                    array.element_types.add_value(path, element);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self, denominator: u64, path: &[String]) -> Vec<TypeCandidate> {
        // stable, so ties keep first-seen order
        self.types.sort_by(|a, b| b.count.cmp(&a.count));
        self.types
            .into_iter()
            .map(|stats| {
                let mut candidate =
                    TypeCandidate::scalar(stats.name, ratio(stats.count, denominator))
                        .with_path(path.to_vec())
                        .with_count(stats.count);
                if stats.name == TypeName::Document {
                    candidate.fields = stats.fields.finish(stats.count);
                }
                if let Some(array) = stats.elements {
                    let array = *array;
                    candidate.types = array.element_types.finish(array.element_count, path);
                    candidate.lengths = Some(ArrayLengths {
                        min: array.min_length,
                        max: array.max_length,
                        average: ratio(array.element_count, array.arrays),
                        total_count: array.element_count,
                    });
                }
                candidate
            })
            .collect()
    }
}

fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
