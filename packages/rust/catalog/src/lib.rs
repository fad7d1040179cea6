//! Service catalog: the full name → abbreviation table that constrains
//! classifier output to a known vocabulary.
//!
//! [`CatalogStore`] is the key-value seam (paged scan + upsert);
//! [`LibsqlCatalogStore`] backs it with a local libSQL database.
//! [`ServiceCatalog::list`] walks every page and flattens the result into a
//! [`CatalogSnapshot`] that the pipeline reads without further I/O.

pub mod canonical;
mod migrations;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use awsdigest_shared::{DigestError, Result, ServiceCatalogEntry};
use libsql::{Connection, Database, params};
use tracing::{debug, instrument};

pub use canonical::canonical_abbreviation;

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// One page of a full-table scan.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub entries: Vec<ServiceCatalogEntry>,
    /// Key to resume after; `None` once the scan is exhausted.
    pub last_key: Option<String>,
}

/// Key-value store holding the catalog rows.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Read up to `limit` rows with keys strictly greater than `after`, in key order.
    async fn scan(&self, after: Option<&str>, limit: u32) -> Result<CatalogPage>;

    /// Insert or overwrite the row for `entry.full_name`.
    async fn upsert(&self, entry: &ServiceCatalogEntry) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Snapshot + catalog
// ---------------------------------------------------------------------------

/// Read-only view of the catalog used during a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    /// Every full name and every abbreviation, deduplicated and sorted.
    pub names: BTreeSet<String>,
    /// Full name → abbreviation.
    pub abbreviations: BTreeMap<String, String>,
}

impl CatalogSnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = ServiceCatalogEntry>) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            snapshot.names.insert(entry.full_name.clone());
            snapshot.names.insert(entry.abbreviation.clone());
            snapshot
                .abbreviations
                .insert(entry.full_name, entry.abbreviation);
        }
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Case-insensitive lookup returning the catalog's own casing.
    pub fn find_ignore_case(&self, name: &str) -> Option<&str> {
        let wanted = name.to_lowercase();
        self.names
            .iter()
            .find(|n| n.to_lowercase() == wanted)
            .map(String::as_str)
    }
}

/// Catalog reader over any [`CatalogStore`].
pub struct ServiceCatalog {
    store: Arc<dyn CatalogStore>,
    page_size: u32,
}

impl ServiceCatalog {
    pub fn new(store: Arc<dyn CatalogStore>, page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Scan the whole store and build a snapshot. Never truncates.
    #[instrument(skip(self), fields(page_size = self.page_size))]
    pub async fn list(&self) -> Result<CatalogSnapshot> {
        let mut entries = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.store.scan(after.as_deref(), self.page_size).await?;
            pages += 1;
            entries.extend(page.entries);
            match page.last_key {
                Some(key) => after = Some(key),
                None => break,
            }
        }

        let snapshot = CatalogSnapshot::from_entries(entries);
        debug!(
            pages,
            services = snapshot.abbreviations.len(),
            names = snapshot.names.len(),
            "service catalog loaded"
        );
        Ok(snapshot)
    }

    /// Canonicalize and store a batch of raw service names. Returns rows written.
    #[instrument(skip_all, fields(count = raw_names.len()))]
    pub async fn import(&self, raw_names: &[String]) -> Result<usize> {
        let mut written = 0;
        for name in raw_names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let entry = ServiceCatalogEntry {
                full_name: name.to_string(),
                abbreviation: canonical_abbreviation(name),
            };
            self.store.upsert(&entry).await?;
            written += 1;
        }
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// libSQL store
// ---------------------------------------------------------------------------

/// Catalog store backed by a local libSQL database file.
pub struct LibsqlCatalogStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl LibsqlCatalogStore {
    /// Open or create a database at `path` and apply migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DigestError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DigestError::Storage(e.to_string()))?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    DigestError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }
}

#[async_trait]
impl CatalogStore for LibsqlCatalogStore {
    async fn scan(&self, after: Option<&str>, limit: u32) -> Result<CatalogPage> {
        let mut rows = match after {
            Some(key) => {
                self.conn
                    .query(
                        "SELECT service_name, abbreviation FROM services
                         WHERE service_name > ?1 ORDER BY service_name LIMIT ?2",
                        params![key, i64::from(limit)],
                    )
                    .await
            }
            None => {
                self.conn
                    .query(
                        "SELECT service_name, abbreviation FROM services
                         ORDER BY service_name LIMIT ?1",
                        params![i64::from(limit)],
                    )
                    .await
            }
        }
        .map_err(|e| DigestError::Storage(e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DigestError::Storage(e.to_string()))?
        {
            entries.push(ServiceCatalogEntry {
                full_name: row
                    .get::<String>(0)
                    .map_err(|e| DigestError::Storage(e.to_string()))?,
                abbreviation: row
                    .get::<String>(1)
                    .map_err(|e| DigestError::Storage(e.to_string()))?,
            });
        }

        let last_key = if entries.len() as u32 == limit {
            entries.last().map(|e| e.full_name.clone())
        } else {
            None
        };

        Ok(CatalogPage { entries, last_key })
    }

    async fn upsert(&self, entry: &ServiceCatalogEntry) -> Result<()> {
        if entry.abbreviation.trim().is_empty() {
            return Err(DigestError::validation(format!(
                "abbreviation for {} must not be empty",
                entry.full_name
            )));
        }
        self.conn
            .execute(
                "INSERT INTO services (service_name, abbreviation, updated_at)
                 VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(service_name) DO UPDATE SET
                   abbreviation = excluded.abbreviation,
                   updated_at = excluded.updated_at",
                params![entry.full_name.as_str(), entry.abbreviation.as_str()],
            )
            .await
            .map_err(|e| DigestError::Storage(e.to_string()))?;
        Ok(())
    }
}
