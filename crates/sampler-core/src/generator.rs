//! Generator config: per-field synthetic data descriptors for mgodatagen.
//!
//! Each field is described by its first (most frequent) type candidate
//! only. Secondary candidates are dropped and reported through
//! [`GeneratorContent::warnings`]; type names without a generator mapping
//! drop the whole field.

use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

use crate::bounds::{DateRange, GenerationBounds};
use crate::namespace::Namespace;
use crate::tree::{FieldTypeNode, TypeCandidate, TypeName};

/// Field name to descriptor, in the order of the field tree.
pub type Content = IndexMap<String, TypeDescriptor>;

/// Generation rule for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TypeDescriptor {
    #[serde(rename_all = "camelCase")]
    Object { object_content: Content },

    #[serde(rename_all = "camelCase")]
    Array {
        array_content: Box<TypeDescriptor>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },

    #[serde(rename_all = "camelCase")]
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },

    Int {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },

    #[serde(rename_all = "camelCase")]
    Date { start_date: String, end_date: String },

    Boolean,

    ObjectId,

    Uuid { format: UuidFormat },

    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidFormat {
    Binary,
}

impl TypeDescriptor {
    /// `{type: "string"}` without bounds.
    pub fn bare_string() -> Self {
        TypeDescriptor::String {
            min_length: None,
            max_length: None,
        }
    }
}

/// Whether descriptors carry generation bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorStyle {
    Bounded(GenerationBounds),
    /// Bare descriptors; only dates keep a range
    Bare { dates: DateRange },
}

impl Default for DescriptorStyle {
    fn default() -> Self {
        DescriptorStyle::Bounded(GenerationBounds::default())
    }
}

impl DescriptorStyle {
    fn string(&self) -> TypeDescriptor {
        match self {
            DescriptorStyle::Bounded(bounds) => TypeDescriptor::String {
                min_length: Some(bounds.string.min),
                max_length: Some(bounds.string.max),
            },
            DescriptorStyle::Bare { .. } => TypeDescriptor::bare_string(),
        }
    }

    fn int(&self) -> TypeDescriptor {
        match self {
            DescriptorStyle::Bounded(bounds) => TypeDescriptor::Int {
                min: Some(bounds.int.min),
                max: Some(bounds.int.max),
            },
            DescriptorStyle::Bare { .. } => TypeDescriptor::Int {
                min: None,
                max: None,
            },
        }
    }

    fn date(&self) -> TypeDescriptor {
        let dates = match self {
            DescriptorStyle::Bounded(bounds) => &bounds.dates,
            DescriptorStyle::Bare { dates } => dates,
        };
        TypeDescriptor::Date {
            start_date: dates.start.clone(),
            end_date: dates.end.clone(),
        }
    }

    fn array_length(&self) -> (Option<u32>, Option<u32>) {
        match self {
            DescriptorStyle::Bounded(bounds) => (Some(bounds.array.min), Some(bounds.array.max)),
            DescriptorStyle::Bare { .. } => (None, None),
        }
    }

    /// Descriptor for a non-container type, `None` when it has no mapping.
    fn scalar(&self, name: TypeName) -> Option<TypeDescriptor> {
        let descriptor = match name {
            TypeName::String => self.string(),
            TypeName::Number => self.int(),
            TypeName::Date => self.date(),
            TypeName::Boolean => TypeDescriptor::Boolean,
            TypeName::ObjectId => TypeDescriptor::ObjectId,
            TypeName::Binary => TypeDescriptor::Uuid {
                format: UuidFormat::Binary,
            },
            TypeName::Long => TypeDescriptor::Long,
            _ => return None,
        };
        Some(descriptor)
    }
}

/// A polymorphic field reduced to its dominant type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LossyField {
    pub path: String,
    pub kept: TypeName,
    pub ignored: Vec<TypeName>,
}

/// Result of building one namespace's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorContent {
    pub content: Content,
    pub warnings: Vec<LossyField>,
}

/// Build the descriptor mapping for a field tree.
pub fn build_content(fields: &[FieldTypeNode], style: &DescriptorStyle) -> GeneratorContent {
    let mut builder = Builder {
        style,
        warnings: Vec::new(),
    };
    let content = builder.object(fields);
    GeneratorContent {
        content,
        warnings: builder.warnings,
    }
}

struct Builder<'a> {
    style: &'a DescriptorStyle,
    warnings: Vec<LossyField>,
}

impl Builder<'_> {
    fn object(&mut self, fields: &[FieldTypeNode]) -> Content {
        let mut content = Content::new();
        for field in fields {
            match self.field(field) {
                Some(descriptor) => {
                    content.insert(field.name.clone(), descriptor);
                }
                None => {
                    tracing::debug!(
                        "No generator mapping for field '{}', skipping",
                        field.dotted_path()
                    );
                }
            }
        }
        content
    }

    fn field(&mut self, field: &FieldTypeNode) -> Option<TypeDescriptor> {
        let (dominant, rest) = field.types.split_first()?;
        if !rest.is_empty() {
            self.warnings.push(LossyField {
                path: field.dotted_path(),
                kept: dominant.name,
                ignored: rest.iter().map(|t| t.name).collect(),
            });
        }

        match dominant.name {
            TypeName::Document => Some(TypeDescriptor::Object {
                object_content: self.object(&dominant.fields),
            }),
            TypeName::Array => self.array(dominant),
            name => self.style.scalar(name),
        }
    }

    fn array(&mut self, array: &TypeCandidate) -> Option<TypeDescriptor> {
        match array.types.first() {
            // nothing sampled inside the arrays
            None => {
                let (min_length, max_length) = self.style.array_length();
                Some(TypeDescriptor::Array {
                    array_content: Box::new(TypeDescriptor::bare_string()),
                    min_length,
                    max_length,
                })
            }
            Some(element) if element.name == TypeName::Document => Some(TypeDescriptor::Array {
                array_content: Box::new(TypeDescriptor::Object {
                    object_content: self.object(&element.fields),
                }),
                min_length: None,
                max_length: None,
            }),
            Some(element) => {
                let content = self.style.scalar(element.name)?;
                Some(TypeDescriptor::Array {
                    array_content: Box::new(content),
                    min_length: None,
                    max_length: None,
                })
            }
        }
    }
}

/// Generator config entry for one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorCollection {
    pub database: String,
    pub collection: String,
    /// Documents to generate; left at 0 for the operator to fill in
    pub count: u64,
    pub content: Content,
}

impl GeneratorCollection {
    pub fn new(namespace: &Namespace, content: Content) -> Self {
        Self {
            database: namespace.database.clone(),
            collection: namespace.collection.clone(),
            count: 0,
            content,
        }
    }
}
