//! Namespace inventory discovery.

use anyhow::Context;
use sampler_core::Namespace;

use crate::source::SampleSource;

/// Internal databases that are never sampled.
pub const ADMIN_DATABASES: [&str; 3] = ["admin", "local", "config"];

/// List every sampleable namespace, in database then collection order.
///
/// Databases holding more than `max_collection_count` collections are left
/// out entirely; the operator is expected to target them with include or
/// exclude patterns.
pub async fn discover_inventory<S>(
    source: &S,
    max_collection_count: usize,
) -> anyhow::Result<Vec<Namespace>>
where
    S: SampleSource + ?Sized,
{
    let databases = source
        .list_databases()
        .await
        .context("Failed to list databases")?;
    tracing::debug!("Databases: {:?}", databases);

    let mut inventory = Vec::new();
    for database in databases {
        if ADMIN_DATABASES.contains(&database.as_str()) {
            tracing::info!("Skipping {} database", database);
            continue;
        }

        let collections = source
            .list_collections(&database)
            .await
            .with_context(|| format!("Failed to list collections of database '{database}'"))?;

        if collections.len() > max_collection_count {
            tracing::warn!(
                "{} has {} collections, more than the limit of {}. Skipping it; \
                 use --include-namespace or --exclude-namespace to narrow it down",
                database,
                collections.len(),
                max_collection_count
            );
            continue;
        }

        inventory.extend(
            collections
                .into_iter()
                .map(|c| Namespace::new(database.as_str(), c.name, c.collection_type)),
        );
    }

    tracing::info!("Discovered {} namespaces", inventory.len());
    Ok(inventory)
}
