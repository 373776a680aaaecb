//! Full pipeline against an in-memory source, up to the written file.

use async_trait::async_trait;
use bson::{doc, Document};
use futures::{stream, StreamExt};
use mongo_schema_sampler::{
    run_analysis, write_report, CollectionInfo, DocumentStream, NamespaceReport, OutputMode,
    SampleSource, SamplerConfig,
};
use sampler_core::{CollectionType, DescriptorStyle, IncludePolicy, Namespace, NamespaceFilter};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Fixture {
    collections: Vec<(&'static str, &'static str, CollectionType, Vec<Document>)>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            collections: vec![
                (
                    "admin",
                    "system.users",
                    CollectionType::Collection,
                    vec![doc! { "user": "root" }],
                ),
                (
                    "shop",
                    "orders",
                    CollectionType::Collection,
                    vec![
                        doc! {
                            "total": 12.5,
                            "customer": { "name": "Ada", "vip": true },
                            "items": [ { "sku": "a-1", "qty": 2 }, { "sku": "b-7", "qty": 1 } ],
                        },
                        doc! {
                            "total": 3.0,
                            "customer": { "name": "Bob", "vip": false },
                            "items": [],
                        },
                    ],
                ),
                ("shop", "system.views", CollectionType::Collection, vec![]),
                ("shop", "recent_orders", CollectionType::View, vec![]),
                (
                    "blog",
                    "posts",
                    CollectionType::Collection,
                    vec![doc! { "title": "Hello", "tags": ["intro", "meta"] }],
                ),
            ],
        }
    }
}

#[async_trait]
impl SampleSource for Fixture {
    async fn list_databases(&self) -> anyhow::Result<Vec<String>> {
        let mut databases: Vec<String> = Vec::new();
        for (db, _, _, _) in &self.collections {
            if !databases.iter().any(|d| d == db) {
                databases.push(db.to_string());
            }
        }
        Ok(databases)
    }

    async fn list_collections(&self, database: &str) -> anyhow::Result<Vec<CollectionInfo>> {
        Ok(self
            .collections
            .iter()
            .filter(|(db, _, _, _)| *db == database)
            .map(|(_, name, kind, _)| CollectionInfo::new(*name, kind.clone()))
            .collect())
    }

    async fn sample(&self, namespace: &Namespace, size: u32) -> anyhow::Result<DocumentStream> {
        let docs: Vec<Document> = self
            .collections
            .iter()
            .filter(|(db, coll, _, _)| *db == namespace.database && *coll == namespace.collection)
            .flat_map(|(_, _, _, docs)| docs.iter().take(size as usize).cloned())
            .collect();
        Ok(stream::iter(docs.into_iter().map(Ok)).boxed())
    }
}

fn config(filter: NamespaceFilter, mode: OutputMode, output: PathBuf) -> SamplerConfig {
    SamplerConfig {
        connection_string: "mongodb://localhost:27017".to_string(),
        sample_size: 1000,
        filter,
        include_policy: IncludePolicy::LastWildcardWins,
        max_collection_count: 20,
        concurrency: 4,
        output,
        mode,
    }
}

async fn run_to_json(config: &SamplerConfig) -> Value {
    let outcome = run_analysis(&Fixture::new(), config).await.unwrap();
    assert!(outcome.failures.is_empty());
    write_report(&config.output, &outcome.reports).unwrap();
    serde_json::from_str(&std::fs::read_to_string(&config.output).unwrap()).unwrap()
}

#[tokio::test]
async fn test_analysis_report_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = config(
        NamespaceFilter::All,
        OutputMode::Analysis,
        dir.path().join("report.json"),
    );

    let report = run_to_json(&cfg).await;
    let entries = report.as_array().unwrap();

    let names: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| {
            (
                e["databaseName"].as_str().unwrap(),
                e["collectionName"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(names, vec![("shop", "orders"), ("blog", "posts")]);

    let orders: Vec<&str> = entries[0]["analysis"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        orders,
        vec!["customer", "customer.name", "customer.vip", "items", "total"]
    );
    assert_eq!(
        entries[1]["analysis"][1],
        json!({ "path": "title", "probability": "100%", "fieldType": "String" })
    );
}

#[tokio::test]
async fn test_generator_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = config(
        NamespaceFilter::from_lists(&["shop.orders"], &[] as &[&str]).unwrap(),
        OutputMode::Generator(DescriptorStyle::default()),
        dir.path().join("datagen.json"),
    );

    let report = run_to_json(&cfg).await;
    assert_eq!(report.as_array().unwrap().len(), 1);

    let entry = &report[0];
    assert_eq!(entry["database"], "shop");
    assert_eq!(entry["collection"], "orders");
    assert_eq!(entry["count"], 0);

    let content = &entry["content"];
    assert_eq!(content["customer"]["type"], "object");
    assert_eq!(
        content["customer"]["objectContent"]["vip"],
        json!({ "type": "boolean" })
    );
    assert_eq!(content["items"]["type"], "array");
    assert_eq!(content["items"]["arrayContent"]["type"], "object");
    assert_eq!(
        content["items"]["arrayContent"]["objectContent"]["sku"],
        json!({ "type": "string", "minLength": 0, "maxLength": 10 })
    );
}

#[tokio::test]
async fn test_excluded_database_is_not_sampled() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = config(
        NamespaceFilter::from_lists(&[] as &[&str], &["shop.*"]).unwrap(),
        OutputMode::Analysis,
        dir.path().join("report.json"),
    );

    let report = run_to_json(&cfg).await;
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["databaseName"], "blog");
}

#[tokio::test]
async fn test_collection_limit_skips_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cfg = config(
        NamespaceFilter::All,
        OutputMode::Analysis,
        dir.path().join("report.json"),
    );
    cfg.max_collection_count = 2;

    let report = run_to_json(&cfg).await;
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["collectionName"], "posts");
}

/// Source whose `slow` collection takes a while to answer.
struct DelayedSource {
    started: Instant,
    starts: Mutex<Vec<(String, Duration)>>,
}

#[async_trait]
impl SampleSource for DelayedSource {
    async fn list_databases(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["lab".to_string()])
    }

    async fn list_collections(&self, _database: &str) -> anyhow::Result<Vec<CollectionInfo>> {
        Ok(["slow", "a", "b", "c"]
            .into_iter()
            .map(|name| CollectionInfo::new(name, CollectionType::Collection))
            .collect())
    }

    async fn sample(&self, namespace: &Namespace, _size: u32) -> anyhow::Result<DocumentStream> {
        self.starts
            .lock()
            .unwrap()
            .push((namespace.collection.clone(), self.started.elapsed()));
        if namespace.collection == "slow" {
            tokio::time::sleep(Duration::from_millis(400)).await;
        }
        let docs = vec![doc! { "name": namespace.collection.clone() }];
        Ok(stream::iter(docs.into_iter().map(Ok)).boxed())
    }
}

#[tokio::test]
async fn test_slow_namespace_does_not_hold_back_others() {
    let source = DelayedSource {
        started: Instant::now(),
        starts: Mutex::new(Vec::new()),
    };
    let mut cfg = config(
        NamespaceFilter::All,
        OutputMode::Analysis,
        PathBuf::from("unused.json"),
    );
    cfg.concurrency = 2;

    let outcome = run_analysis(&source, &cfg).await.unwrap();

    let starts = source.starts.lock().unwrap().clone();
    assert_eq!(starts.len(), 4);
    for (name, at) in &starts {
        if name != "slow" {
            assert!(
                *at < Duration::from_millis(200),
                "{name} started after {at:?}, waiting on the slow namespace"
            );
        }
    }

    let names: Vec<&str> = outcome
        .reports
        .iter()
        .map(|r| match r {
            NamespaceReport::Analysis(a) => a.collection_name.as_str(),
            NamespaceReport::Generator(g) => g.collection.as_str(),
        })
        .collect();
    assert_eq!(names, vec!["slow", "a", "b", "c"]);
}
