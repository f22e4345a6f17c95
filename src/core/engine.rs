// src/core/engine.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::CrossportError;
use super::{
    assemble, Aggregator, FileOutcome, PatternLibrary, PersistOutcome, ReportSink, ScanReport,
    ScanResult, Scanner, SourceFile, WalkEntry,
};

/// What to scan and how, on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub root: PathBuf,

    /// Extra directory names to skip
    pub exclude_dirs: Vec<String>,

    /// Extra gitignore-style exclusions
    pub exclude_globs: Vec<String>,

    /// Overrides `project.respect_gitignore`
    pub respect_gitignore: Option<bool>,

    /// Overrides `scanning.jobs`
    pub jobs: Option<usize>,
}

impl ScanRequest {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Main orchestration engine for crossport
pub struct Engine {
    config: Config,
    library: Arc<PatternLibrary>,
}

impl Engine {
    /// Create a new engine from a config file (or the default configuration)
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!("Loaded configuration: {:?}", config);
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let library = PatternLibrary::with_user_rules(&config.rules)?;
        info!(
            "📚 Loaded {} rules ({} user-defined)",
            library.len(),
            config.rules.len()
        );

        Ok(Self {
            config,
            library: Arc::new(library),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Walk, classify and aggregate a project
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanResult> {
        let config = self.effective_config(&request)?;
        let jobs = config.scanning.jobs;
        let scanner = Arc::new(Scanner::new(config, self.library.clone()));
        let root = request.root;

        info!("🔍 Scanning {} with {} worker(s)", root.display(), jobs);

        let result = if jobs <= 1 {
            let scanner = scanner.clone();
            tokio::task::spawn_blocking(move || scanner.scan(&root)).await??
        } else {
            Self::scan_parallel(scanner, root, jobs).await?
        };

        let summary = &result.summary;
        info!("📊 Scan complete:");
        info!("  - {} files scanned, {} skipped", summary.files_scanned, summary.files_skipped);
        info!("  - {} findings ({} duplicates collapsed)", summary.total_findings, summary.duplicates_collapsed);
        info!("  - {} screens, {} navigation edges", summary.screens, summary.navigation_edges);
        Ok(result)
    }

    /// Split the walked files into disjoint sets, one blocking task each.
    /// The aggregator restores a deterministic order afterwards.
    async fn scan_parallel(scanner: Arc<Scanner>, root: PathBuf, jobs: usize) -> Result<ScanResult> {
        let prepare = scanner.clone();
        let (walk_root, classifier, entries) = tokio::task::spawn_blocking(move || {
            let walker = prepare.walker(&root)?;
            let classifier = prepare.classifier(prepare.index_navigators(&walker)?)?;
            let entries: Vec<WalkEntry> = walker.walk().collect();
            Ok::<_, CrossportError>((walker.root().to_path_buf(), classifier, entries))
        })
        .await??;

        let mut aggregator = Aggregator::new(walk_root);
        let mut files: Vec<SourceFile> = Vec::new();
        for entry in entries {
            match entry {
                WalkEntry::File(file) => files.push(file),
                WalkEntry::Skipped(skipped) => aggregator.push(FileOutcome::Skipped(skipped)),
            }
        }

        let classifier = Arc::new(classifier);
        let chunk_size = files.len().div_ceil(jobs).max(1);
        let mut handles = Vec::new();
        for chunk in files.chunks(chunk_size) {
            let chunk = chunk.to_vec();
            let classifier = classifier.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                chunk
                    .iter()
                    .map(|file| classifier.scan_file(file))
                    .collect::<Vec<_>>()
            }));
        }
        debug!("Dispatched {} files across {} tasks", files.len(), handles.len());

        for handle in handles {
            for outcome in handle.await? {
                aggregator.push(outcome);
            }
        }

        Ok(aggregator.finish())
    }

    /// Map a scan result onto per-table records
    pub fn assemble(&self, result: &ScanResult) -> ScanReport {
        assemble(result)
    }

    pub async fn persist(&self, report: &ScanReport, sink: &dyn ReportSink) -> Result<PersistOutcome> {
        info!("💾 Persisting {} rows via {}", report.row_count(), sink.name());
        Ok(sink.persist(report).await?)
    }

    /// Write a default config file into `dir`
    pub fn init(dir: &Path, force: bool) -> Result<PathBuf> {
        let path = dir.join("crossport.toml");
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }

        std::fs::create_dir_all(dir)?;
        Config::default().save(&path)?;
        info!("✅ Wrote default configuration to {}", path.display());
        Ok(path)
    }

    fn effective_config(&self, request: &ScanRequest) -> Result<Config> {
        let mut config = self.config.clone();

        for dir in &request.exclude_dirs {
            if !config.project.exclude_dirs.contains(dir) {
                config.project.exclude_dirs.push(dir.clone());
            }
        }
        config.project.exclude_globs.extend(request.exclude_globs.iter().cloned());
        if let Some(respect) = request.respect_gitignore {
            config.project.respect_gitignore = respect;
        }
        if let Some(jobs) = request.jobs {
            if jobs == 0 {
                return Err(CrossportError::Config("--jobs must be at least 1".to_string()).into());
            }
            config.scanning.jobs = jobs;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, JsonDirectorySink};
    use assert_fs::prelude::*;

    fn project() -> assert_fs::TempDir {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/screens/HomeScreen.js")
            .write_str(
                "import React from 'react';\nimport { Modal } from 'react-native';\n\n\
                 export default function HomeScreen({ navigation }) {\n\
                 \x20 navigation.navigate('Details');\n\
                 \x20 return <Modal visible={true} />;\n}\n",
            )
            .unwrap();
        temp.child("src/screens/DetailsScreen.js")
            .write_str(
                "import React from 'react';\n\n\
                 export default class DetailsScreen extends React.Component {}\n\
                 const styles = { header: { height: 44 } };\n",
            )
            .unwrap();
        temp.child("src/api.js")
            .write_str("export const load = () => fetch('https://api.example.com/feed');\n")
            .unwrap();
        temp.child("ios/App/Info.plist")
            .write_str("<key>NSLocationWhenInUseUsageDescription</key>\n")
            .unwrap();
        temp.child("ios/Podfile").write_str("pod 'Firebase/Messaging'\n").unwrap();
        temp.child("assets/icon@2x.png").write_binary(&[0x89, 0x50]).unwrap();
        temp.child("node_modules/lib/index.js")
            .write_str("import x from 'should-not-appear';\n")
            .unwrap();
        temp
    }

    fn engine() -> Engine {
        Engine::from_config(Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_scan_covers_the_project() {
        let temp = project();
        let result = engine().scan(ScanRequest::new(temp.path())).await.unwrap();

        assert_eq!(result.findings(Category::Screen).len(), 2);
        assert_eq!(result.findings(Category::NavigationPath).len(), 1);
        assert_eq!(result.findings(Category::UiPattern).len(), 1);
        assert_eq!(result.findings(Category::Permission).len(), 1);
        assert_eq!(result.findings(Category::Asset).len(), 1);
        assert_eq!(result.findings(Category::NativeModule).len(), 1);
        assert_eq!(result.findings(Category::ApiCall).len(), 1);
        assert!(result
            .iter()
            .all(|f| !f.location.path.starts_with("node_modules")));

        let build: Vec<_> = result
            .findings(Category::BuildRecommendation)
            .iter()
            .map(|f| f.snippet.as_str())
            .collect();
        assert!(build.contains(&"Build Configuration"));
        assert_eq!(result.summary.progress.components_ported, 2);
    }

    #[tokio::test]
    async fn test_parallel_scan_matches_sequential() {
        let temp = project();
        let engine = engine();

        let sequential = engine.scan(ScanRequest::new(temp.path())).await.unwrap();
        let mut request = ScanRequest::new(temp.path());
        request.jobs = Some(3);
        let parallel = engine.scan(request).await.unwrap();

        assert_eq!(sequential.groups, parallel.groups);
        assert_eq!(sequential.summary, parallel.summary);
        assert_eq!(sequential.skipped, parallel.skipped);
    }

    #[tokio::test]
    async fn test_request_exclusions_apply() {
        let temp = project();
        let mut request = ScanRequest::new(temp.path());
        request.exclude_dirs = vec!["ios".to_string()];
        request.exclude_globs = vec!["*.png".to_string()];

        let result = engine().scan(request).await.unwrap();
        assert!(result.findings(Category::Permission).is_empty());
        assert!(result.findings(Category::Asset).is_empty());
    }

    #[tokio::test]
    async fn test_zero_jobs_is_rejected() {
        let temp = project();
        let mut request = ScanRequest::new(temp.path());
        request.jobs = Some(0);

        let err = engine().scan(request).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrossportError>(),
            Some(CrossportError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_root_surfaces_not_found() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = engine()
            .scan(ScanRequest::new(temp.path().join("missing")))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CrossportError>(),
            Some(CrossportError::RootNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_assemble_persist() {
        let temp = project();
        let out = assert_fs::TempDir::new().unwrap();
        let engine = engine();

        let result = engine.scan(ScanRequest::new(temp.path())).await.unwrap();
        let report = engine.assemble(&result);
        let sink = JsonDirectorySink::new(out.path());
        let outcome = engine.persist(&report, &sink).await.unwrap();

        assert_eq!(outcome.inserted, report.row_count() + 1);
        out.child("screens.json")
            .assert(predicates::str::contains("HomeScreen"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = Engine::init(temp.path(), false).unwrap();
        assert!(path.exists());
        assert!(Engine::init(temp.path(), false).is_err());
        assert!(Engine::init(temp.path(), true).is_ok());
        assert!(Config::load(&path).is_ok());
    }
}
