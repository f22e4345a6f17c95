use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use super::aggregator::{Aggregator, ScanResult};
use super::classifier::Classifier;
use super::finding::{FileKind, FileOutcome};
use super::navigation::{NavigatorIndex, NavigatorIndexer};
use super::rules::PatternLibrary;
use super::walker::{FileWalker, WalkEntry};

/// Synchronous walk → classify → aggregate pipeline
pub struct Scanner {
    config: Config,
    library: Arc<PatternLibrary>,
}

impl Scanner {
    pub fn new(config: Config, library: Arc<PatternLibrary>) -> Self {
        Self { config, library }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn walker(&self, root: &Path) -> Result<FileWalker> {
        FileWalker::new(root, &self.config.project, &self.config.scanning)
    }

    /// Pre-pass over script files collecting navigator route registrations
    pub fn index_navigators(&self, walker: &FileWalker) -> Result<NavigatorIndex> {
        let mut index = NavigatorIndex::default();
        if !self.config.heuristics.index_navigators {
            return Ok(index);
        }

        let indexer = NavigatorIndexer::new(&self.config.heuristics)?;
        for file in walker.files().filter(|f| f.kind == FileKind::Script) {
            let too_large = std::fs::metadata(&file.path)
                .map(|m| m.len() > self.config.scanning.max_file_size)
                .unwrap_or(true);
            if too_large {
                continue;
            }
            // Unreadable files are reported by the main pass
            match std::fs::read_to_string(&file.path) {
                Ok(content) => indexer.index_file(&content, &mut index),
                Err(e) => debug!("Navigator index skipped {}: {}", file.relative.display(), e),
            }
        }

        debug!("Indexed {} navigator routes", index.len());
        Ok(index)
    }

    pub fn classifier(&self, navigators: NavigatorIndex) -> Result<Classifier> {
        Classifier::new(self.library.clone(), &self.config, Arc::new(navigators))
    }

    /// Lazy per-file outcomes in walk order
    pub fn outcomes<'a>(
        &'a self,
        walker: &'a FileWalker,
        classifier: &'a Classifier,
    ) -> impl Iterator<Item = FileOutcome> + 'a {
        walker.walk().map(move |entry| match entry {
            WalkEntry::File(file) => classifier.scan_file(&file),
            WalkEntry::Skipped(skipped) => FileOutcome::Skipped(skipped),
        })
    }

    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        let walker = self.walker(root)?;
        let classifier = self.classifier(self.index_navigators(&walker)?)?;

        info!("Scanning {}", walker.root().display());
        let mut aggregator = Aggregator::new(walker.root());
        for outcome in self.outcomes(&walker, &classifier) {
            aggregator.push(outcome);
        }
        Ok(aggregator.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::Category;
    use crate::error::CrossportError;
    use assert_fs::prelude::*;

    fn scanner() -> Scanner {
        Scanner::new(Config::default(), Arc::new(PatternLibrary::builtin().unwrap()))
    }

    #[test]
    fn test_two_files_importing_the_same_module() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/a.js").write_str("import axios from 'axios';\n").unwrap();
        temp.child("src/b.js").write_str("import axios from 'axios';\n").unwrap();

        let result = scanner().scan(temp.path()).unwrap();
        let deps = result.findings(Category::Dependency);
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|f| f.snippet == "axios"));
        assert_eq!(result.summary.duplicates_collapsed, 0);
    }

    #[test]
    fn test_unreadable_file_is_counted_as_skipped() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/good.js").write_str("const x = 1;\n").unwrap();
        temp.child("src/bad.js").write_binary(&[0xc3, 0x28, 0xa0, 0xa1]).unwrap();

        let result = scanner().scan(temp.path()).unwrap();
        assert_eq!(result.summary.files_skipped, 1);
        assert_eq!(result.summary.files_scanned, 1);
        assert_eq!(result.skipped[0].path, Path::new("src/bad.js"));

        // Build recommendations are project-level and sit at "."
        assert!(result.iter().all(|f| {
            f.location.path == Path::new("src/good.js")
                || (f.category == Category::BuildRecommendation && f.location.path == Path::new("."))
        }));
        assert!(!result.findings(Category::BuildRecommendation).is_empty());
    }

    #[test]
    fn test_registered_route_reaches_screen_finding() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/App.js")
            .write_str("<Stack.Screen name=\"Feed\" component={FeedView} />\n")
            .unwrap();
        temp.child("src/feed/FeedView.js")
            .write_str("export default function FeedView({ navigation }) {\n  navigation.push('Post');\n}\n")
            .unwrap();

        let result = scanner().scan(temp.path()).unwrap();
        let screens = result.findings(Category::Screen);
        assert_eq!(screens.len(), 1);
        assert_eq!(screens[0].snippet, "FeedView");
        assert_eq!(screens[0].attr("route"), Some("Feed"));
        assert_eq!(result.findings(Category::NavigationPath).len(), 1);
        assert_eq!(result.summary.screens, 1);
    }

    #[test]
    fn test_repeated_scans_are_identical() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("src/screens/Home.js")
            .write_str("import React from 'react';\nif (Platform.OS === 'ios') { width: 320 }\n")
            .unwrap();
        temp.child("ios/Info.plist")
            .write_str("<key>NSCameraUsageDescription</key>\n")
            .unwrap();

        let first = scanner().scan(temp.path()).unwrap();
        let second = scanner().scan(temp.path()).unwrap();
        assert_eq!(first.groups, second.groups);
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        let missing = temp.path().join("nowhere");
        assert!(matches!(
            scanner().scan(&missing),
            Err(CrossportError::RootNotFound(_))
        ));
    }
}
