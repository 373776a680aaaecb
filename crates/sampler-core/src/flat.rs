//! Flat report: one record per (field path, candidate type).

use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;
use crate::tree::{FieldTypeNode, TypeName};

/// A single `{path, probability, fieldType}` line of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub path: String,
    /// Percentage string such as `"90%"`
    pub probability: String,
    pub field_type: String,
}

/// Flat report entry for one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceAnalysis {
    pub database_name: String,
    pub collection_name: String,
    pub analysis: Vec<AnalysisRecord>,
}

impl NamespaceAnalysis {
    pub fn new(namespace: &Namespace, fields: &[FieldTypeNode]) -> Self {
        Self {
            database_name: namespace.database.clone(),
            collection_name: namespace.collection.clone(),
            analysis: flatten(fields),
        }
    }
}

/// Pre-order walk over a field tree.
///
/// Every node is yielded before the fields nested under its `Document`
/// candidates. Array element documents are not descended into.
pub struct FieldWalk<'a> {
    stack: Vec<std::slice::Iter<'a, FieldTypeNode>>,
}

impl<'a> FieldWalk<'a> {
    pub fn new(fields: &'a [FieldTypeNode]) -> Self {
        Self {
            stack: vec![fields.iter()],
        }
    }
}

impl<'a> Iterator for FieldWalk<'a> {
    type Item = &'a FieldTypeNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(node) => {
                    // reversed so the first document candidate is walked first
                    for candidate in node.types.iter().rev() {
                        if candidate.name == TypeName::Document {
                            self.stack.push(candidate.fields.iter());
                        }
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Flatten a field tree into report records.
pub fn flatten(fields: &[FieldTypeNode]) -> Vec<AnalysisRecord> {
    FieldWalk::new(fields)
        .flat_map(|node| {
            let path = node.dotted_path();
            node.types.iter().map(move |candidate| AnalysisRecord {
                path: path.clone(),
                probability: format_probability(candidate.probability),
                field_type: candidate.name.to_string(),
            })
        })
        .collect()
}

/// `0.9` becomes `"90%"`; fractional percentages keep their digits.
pub fn format_probability(probability: f64) -> String {
    format!("{}%", probability * 100.0)
}
