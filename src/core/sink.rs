use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CrossportError, Result};
use super::report::{Record, ScanReport};

/// Counts from one persist call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub tables_written: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl PersistOutcome {
    fn absorb(&mut self, table: TableOutcome) {
        self.tables_written += 1;
        self.inserted += table.inserted;
        self.updated += table.updated;
        self.unchanged += table.unchanged;
    }
}

#[derive(Debug, Default)]
struct TableOutcome {
    inserted: usize,
    updated: usize,
    unchanged: usize,
}

/// Persistence collaborator for assembled reports
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    /// Human-readable sink name used in errors
    fn name(&self) -> &str;

    /// Upsert every table of the report. Failures are returned, never retried.
    async fn persist(&self, report: &ScanReport) -> Result<PersistOutcome>;
}

/// Writes each table as a JSON array in `<dir>/<table>.json`
pub struct JsonDirectorySink {
    dir: PathBuf,
}

impl JsonDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table))
    }

    fn failure(&self, reason: impl std::fmt::Display) -> CrossportError {
        CrossportError::Persistence {
            sink: self.name().to_string(),
            reason: reason.to_string(),
        }
    }

    async fn upsert<T: Record>(&self, rows: &[T]) -> Result<TableOutcome> {
        let path = self.table_path(T::TABLE);

        let mut existing: Vec<T> = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| self.failure(format!("{} is corrupt: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(self.failure(format!("reading {}: {}", path.display(), e))),
        };

        let mut positions: HashMap<String, usize> = existing
            .iter()
            .enumerate()
            .map(|(i, row)| (row.upsert_key(), i))
            .collect();

        // First row wins when a batch repeats a key
        let mut seen: HashSet<String> = HashSet::new();
        let mut outcome = TableOutcome::default();
        for row in rows {
            let key = row.upsert_key();
            if !seen.insert(key.clone()) {
                outcome.unchanged += 1;
                continue;
            }
            match positions.get(&key) {
                Some(&i) if existing[i] == *row => outcome.unchanged += 1,
                Some(&i) => {
                    existing[i] = row.clone();
                    outcome.updated += 1;
                }
                None => {
                    positions.insert(key, existing.len());
                    existing.push(row.clone());
                    outcome.inserted += 1;
                }
            }
        }

        self.write_json(&path, &existing).await?;
        debug!(
            "{}: {} inserted, {} updated, {} unchanged",
            T::TABLE,
            outcome.inserted,
            outcome.updated,
            outcome.unchanged
        );
        Ok(outcome)
    }

    async fn write_json<T: serde::Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(|e| self.failure(e))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| self.failure(format!("writing {}: {}", path.display(), e)))
    }
}

#[async_trait::async_trait]
impl ReportSink for JsonDirectorySink {
    fn name(&self) -> &str {
        "json-directory"
    }

    async fn persist(&self, report: &ScanReport) -> Result<PersistOutcome> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.failure(format!("creating {}: {}", self.dir.display(), e)))?;

        let mut outcome = PersistOutcome::default();
        outcome.absorb(self.upsert(&report.screens).await?);
        outcome.absorb(self.upsert(&report.navigation_paths).await?);
        outcome.absorb(self.upsert(&report.dependencies).await?);
        outcome.absorb(self.upsert(&report.api_calls).await?);
        outcome.absorb(self.upsert(&report.platform_issues).await?);
        outcome.absorb(self.upsert(&report.ui_patterns).await?);
        outcome.absorb(self.upsert(&report.device_styling).await?);
        outcome.absorb(self.upsert(&report.api_behavior).await?);
        outcome.absorb(self.upsert(&report.assets).await?);
        outcome.absorb(self.upsert(&report.testing_coverage).await?);
        outcome.absorb(self.upsert(&report.permissions_mapping).await?);
        outcome.absorb(self.upsert(&report.build_recommendations).await?);
        outcome.absorb(self.upsert(&report.gestures_mapping).await?);
        outcome.absorb(self.upsert(&report.native_modules).await?);
        outcome.absorb(self.upsert(&report.performance_issues).await?);
        outcome.absorb(self.upsert(&report.hardware_dependencies).await?);
        outcome.absorb(self.upsert(std::slice::from_ref(&report.progress)).await?);

        self.write_json(&self.dir.join("summary.json"), &report.summary).await?;

        info!(
            "💾 Persisted {} tables to {} ({} inserted, {} updated)",
            outcome.tables_written,
            self.dir.display(),
            outcome.inserted,
            outcome.updated
        );
        Ok(outcome)
    }
}
