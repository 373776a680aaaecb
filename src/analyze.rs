//! Sampling pipeline: discover, resolve, sample, infer, transform.

use anyhow::Context;
use futures::{stream, StreamExt, TryStreamExt};
use mongodb_inference::SchemaAccumulator;
use sampler_core::{
    build_content, resolve, sampleable, GeneratorCollection, GeneratorContent, InferredSchema,
    Namespace, NamespaceAnalysis,
};
use serde::Serialize;

use crate::config::{OutputMode, SamplerConfig};
use crate::discovery::discover_inventory;
use crate::source::SampleSource;

/// One entry of the output array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NamespaceReport {
    Analysis(NamespaceAnalysis),
    Generator(GeneratorCollection),
}

#[derive(Debug)]
pub struct NamespaceFailure {
    pub namespace: Namespace,
    pub error: anyhow::Error,
}

/// Reports for the namespaces that were sampled, in resolution order, plus
/// the namespaces that could not be.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub reports: Vec<NamespaceReport>,
    pub failures: Vec<NamespaceFailure>,
}

impl RunOutcome {
    /// Fail if any namespace failed.
    pub fn into_result(self) -> anyhow::Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        let failed: Vec<String> = self
            .failures
            .iter()
            .map(|f| f.namespace.to_string())
            .collect();
        anyhow::bail!(
            "{} of {} namespaces could not be sampled: {}",
            failed.len(),
            failed.len() + self.reports.len(),
            failed.join(", ")
        )
    }
}

/// Run everything up to, but not including, writing the output file.
///
/// Discovery and resolution errors abort the run. Errors while sampling a
/// namespace are collected in [`RunOutcome::failures`] and do not stop the
/// other namespaces.
pub async fn run_analysis<S>(source: &S, config: &SamplerConfig) -> anyhow::Result<RunOutcome>
where
    S: SampleSource + ?Sized,
{
    let inventory = discover_inventory(source, config.max_collection_count).await?;
    let selected = resolve(&inventory, &config.filter, config.include_policy)?;
    let namespaces = sampleable(selected);
    tracing::info!("Sampling {} namespaces", namespaces.len());

    // Completed namespaces free their slot right away; worklist order is
    // restored afterwards.
    let mut results: Vec<(usize, Namespace, anyhow::Result<InferredSchema>)> =
        stream::iter(namespaces.into_iter().enumerate())
            .map(|(index, namespace)| async move {
                let result = sample_schema(source, &namespace, config.sample_size).await;
                (index, namespace, result)
            })
            .buffer_unordered(config.concurrency)
            .collect()
            .await;
    results.sort_by_key(|(index, _, _)| *index);

    let mut outcome = RunOutcome::default();
    for (_, namespace, result) in results {
        match result {
            Ok(schema) => outcome
                .reports
                .push(transform(&namespace, &schema, &config.mode)),
            Err(error) => {
                tracing::error!("Failed to sample {}: {:#}", namespace, error);
                outcome.failures.push(NamespaceFailure { namespace, error });
            }
        }
    }
    Ok(outcome)
}

/// Sample one namespace and infer its field tree.
pub async fn sample_schema<S>(
    source: &S,
    namespace: &Namespace,
    sample_size: u32,
) -> anyhow::Result<InferredSchema>
where
    S: SampleSource + ?Sized,
{
    tracing::info!("Analyzing {}", namespace);
    let mut documents = source
        .sample(namespace, sample_size)
        .await
        .with_context(|| format!("Failed to start sampling {namespace}"))?;

    let mut accumulator = SchemaAccumulator::new();
    while let Some(document) = documents
        .try_next()
        .await
        .with_context(|| format!("Failed to read sampled documents of {namespace}"))?
    {
        accumulator.add_document(&document);
    }

    tracing::debug!(
        "Sampled {} documents from {}",
        accumulator.document_count(),
        namespace
    );
    Ok(accumulator.finish())
}

/// Shape an inferred schema into the configured report entry.
pub fn transform(
    namespace: &Namespace,
    schema: &InferredSchema,
    mode: &OutputMode,
) -> NamespaceReport {
    match mode {
        OutputMode::Analysis => {
            NamespaceReport::Analysis(NamespaceAnalysis::new(namespace, &schema.fields))
        }
        OutputMode::Generator(style) => {
            let GeneratorContent { content, warnings } = build_content(&schema.fields, style);
            for lossy in &warnings {
                let ignored: Vec<&str> = lossy.ignored.iter().map(|t| t.as_str()).collect();
                tracing::warn!(
                    "{}: field '{}' has several types; generating {} and ignoring {}",
                    namespace,
                    lossy.path,
                    lossy.kept,
                    ignored.join(", ")
                );
            }
            NamespaceReport::Generator(GeneratorCollection::new(namespace, content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CollectionInfo, DocumentStream};
    use async_trait::async_trait;
    use bson::{doc, Document};
    use sampler_core::{
        CollectionType, DescriptorStyle, IncludePolicy, NamespaceFilter, TypeDescriptor,
    };
    use std::path::PathBuf;

    struct MemorySource {
        databases: Vec<(String, Vec<(CollectionInfo, Vec<Document>)>)>,
        broken: Option<String>,
    }

    impl MemorySource {
        fn shop() -> Self {
            Self {
                databases: vec![(
                    "shop".to_string(),
                    vec![
                        (
                            CollectionInfo::new("orders", CollectionType::Collection),
                            vec![
                                doc! { "total": 10, "note": "gift" },
                                doc! { "total": 12 },
                            ],
                        ),
                        (
                            CollectionInfo::new("customers", CollectionType::Collection),
                            vec![
                                doc! { "name": "Ada", "age": "unknown" },
                                doc! { "name": "Bob", "age": 31 },
                            ],
                        ),
                        (
                            CollectionInfo::new("big_orders", CollectionType::View),
                            vec![],
                        ),
                    ],
                )],
                broken: None,
            }
        }
    }

    #[async_trait]
    impl SampleSource for MemorySource {
        async fn list_databases(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.databases.iter().map(|(db, _)| db.clone()).collect())
        }

        async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<CollectionInfo>> {
            Ok(self
                .databases
                .iter()
                .filter(|(db, _)| db == database)
                .flat_map(|(_, colls)| colls.iter().map(|(info, _)| info.clone()))
                .collect())
        }

        async fn sample(&self, namespace: &Namespace, size: u32) -> anyhow::Result<DocumentStream> {
            if self.broken.as_deref() == Some(namespace.collection.as_str()) {
                anyhow::bail!("connection reset");
            }
            let docs: Vec<Document> = self
                .databases
                .iter()
                .filter(|(db, _)| *db == namespace.database)
                .flat_map(|(_, colls)| colls.iter())
                .filter(|(info, _)| info.name == namespace.collection)
                .flat_map(|(_, docs)| docs.iter().take(size as usize).cloned())
                .collect();
            Ok(stream::iter(docs.into_iter().map(Ok)).boxed())
        }
    }

    fn config(mode: OutputMode) -> SamplerConfig {
        SamplerConfig {
            connection_string: "mongodb://localhost:27017".to_string(),
            sample_size: 100,
            filter: NamespaceFilter::All,
            include_policy: IncludePolicy::LastWildcardWins,
            max_collection_count: 20,
            concurrency: 2,
            output: PathBuf::from("report.json"),
            mode,
        }
    }

    #[tokio::test]
    async fn test_analysis_skips_views_and_keeps_order() {
        let outcome = run_analysis(&MemorySource::shop(), &config(OutputMode::Analysis))
            .await
            .unwrap();
        assert!(outcome.failures.is_empty());

        let names: Vec<String> = outcome
            .reports
            .iter()
            .map(|r| match r {
                NamespaceReport::Analysis(a) => a.collection_name.clone(),
                NamespaceReport::Generator(g) => g.collection.clone(),
            })
            .collect();
        assert_eq!(names, vec!["orders", "customers"]);

        let NamespaceReport::Analysis(orders) = &outcome.reports[0] else {
            panic!("expected analysis report");
        };
        let note = orders.analysis.iter().find(|r| r.path == "note").unwrap();
        assert_eq!(note.probability, "50%");
        assert_eq!(note.field_type, "String");
    }

    #[tokio::test]
    async fn test_generator_mode_keeps_dominant_type() {
        let mode = OutputMode::Generator(DescriptorStyle::default());
        let mut cfg = config(mode);
        cfg.filter = NamespaceFilter::from_lists(&["shop.customers"], &[] as &[&str]).unwrap();

        let outcome = run_analysis(&MemorySource::shop(), &cfg).await.unwrap();
        assert_eq!(outcome.reports.len(), 1);
        let NamespaceReport::Generator(customers) = &outcome.reports[0] else {
            panic!("expected generator entry");
        };
        assert_eq!(customers.count, 0);
        assert!(matches!(
            customers.content.get("age"),
            Some(TypeDescriptor::String { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_namespace_is_isolated() {
        let mut source = MemorySource::shop();
        source.broken = Some("orders".to_string());

        let outcome = run_analysis(&source, &config(OutputMode::Analysis))
            .await
            .unwrap();
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].namespace.collection, "orders");

        let err = outcome.into_result().unwrap_err();
        assert!(err.to_string().contains("shop.orders"));
    }

    #[tokio::test]
    async fn test_missing_include_pattern_aborts() {
        let mut cfg = config(OutputMode::Analysis);
        cfg.filter = NamespaceFilter::from_lists(&["shop.returns"], &[] as &[&str]).unwrap();
        assert!(run_analysis(&MemorySource::shop(), &cfg).await.is_err());
    }

    #[tokio::test]
    async fn test_sample_size_limits_documents() {
        let source = MemorySource::shop();
        let ns = Namespace::new("shop", "orders", CollectionType::Collection);
        let schema = sample_schema(&source, &ns, 1).await.unwrap();
        assert_eq!(schema.count, 1);
    }
}
