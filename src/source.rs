//! Abstraction over the database being sampled.

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use sampler_core::{CollectionType, Namespace};

/// Sampled documents, decoded lazily.
pub type DocumentStream = BoxStream<'static, anyhow::Result<Document>>;

/// A collection as reported by `listCollections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub collection_type: CollectionType,
}

impl CollectionInfo {
    pub fn new(name: impl Into<String>, collection_type: CollectionType) -> Self {
        Self {
            name: name.into(),
            collection_type,
        }
    }
}

/// Something that can enumerate and sample namespaces.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Database names, in server order.
    async fn list_databases(&self) -> anyhow::Result<Vec<String>>;

    /// Collections of one database, in server order.
    async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<CollectionInfo>>;

    /// Up to `size` randomly chosen documents of `namespace`.
    async fn sample(&self, namespace: &Namespace, size: u32) -> anyhow::Result<DocumentStream>;
}
