use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    bson::{doc, Document},
    options::ClientOptions,
    results::{CollectionSpecification, CollectionType as MongoCollectionType},
    Client as MongoClient,
};
use sampler_core::{CollectionType, Namespace};
use std::time::Duration;

use crate::source::{CollectionInfo, DocumentStream, SampleSource};

/// [`SampleSource`] backed by a live MongoDB deployment.
pub struct MongoSource {
    client: MongoClient,
}

impl MongoSource {
    pub async fn connect(uri: &str) -> anyhow::Result<Self> {
        tracing::debug!("Parsing MongoDB connection options");
        let mut mongo_options = match ClientOptions::parse(uri).await {
            Ok(options) => {
                tracing::debug!("MongoDB options parsed successfully");
                options
            }
            Err(e) => {
                tracing::error!("Failed to parse MongoDB connection options: {}", e);
                return Err(e.into());
            }
        };
        // Add connection timeout to prevent hanging
        mongo_options.connect_timeout = Some(Duration::from_secs(10));
        mongo_options.server_selection_timeout = Some(Duration::from_secs(10));
        mongo_options.app_name = Some("mongo-schema-sampler".to_string());

        let client = MongoClient::with_options(mongo_options)?;
        tracing::debug!("MongoDB client created successfully");
        Ok(Self { client })
    }

    /// Close every pooled connection.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::debug!("MongoDB client shut down");
    }
}

fn collection_type(spec_type: &MongoCollectionType) -> CollectionType {
    match spec_type {
        MongoCollectionType::Collection => CollectionType::Collection,
        MongoCollectionType::View => CollectionType::View,
        MongoCollectionType::Timeseries => CollectionType::Timeseries,
        #[allow(unreachable_patterns)]
        other => CollectionType::Other(format!("{other:?}").to_lowercase()),
    }
}

#[async_trait]
impl SampleSource for MongoSource {
    async fn list_databases(&self) -> anyhow::Result<Vec<String>> {
        tracing::debug!("Listing database names");
        Ok(self.client.list_database_names().await?)
    }

    async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<CollectionInfo>> {
        tracing::debug!("Listing collections of database: {}", database);
        let specs: Vec<CollectionSpecification> = self
            .client
            .database(database)
            .list_collections()
            .await?
            .try_collect()
            .await?;

        Ok(specs
            .into_iter()
            .map(|spec| CollectionInfo::new(spec.name, collection_type(&spec.collection_type)))
            .collect())
    }

    async fn sample(&self, namespace: &Namespace, size: u32) -> anyhow::Result<DocumentStream> {
        tracing::debug!("Sampling {} documents from {}", size, namespace);
        let collection = self
            .client
            .database(&namespace.database)
            .collection::<Document>(&namespace.collection);
        let cursor = collection
            .aggregate(vec![doc! { "$sample": { "size": i64::from(size) } }])
            .await?;
        Ok(cursor.map_err(anyhow::Error::from).boxed())
    }
}
