use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Finding categories, in the order groups are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    UiPattern,
    ApiBehavior,
    Permission,
    PlatformIssue,
    Asset,
    NativeModule,
    GestureMapping,
    PerformanceIssue,
    HardwareDependency,
    TestingCoverage,
    BuildRecommendation,
    Screen,
    Dependency,
    NavigationPath,
    ApiCall,
    DeviceStyling,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::UiPattern,
        Category::ApiBehavior,
        Category::Permission,
        Category::PlatformIssue,
        Category::Asset,
        Category::NativeModule,
        Category::GestureMapping,
        Category::PerformanceIssue,
        Category::HardwareDependency,
        Category::TestingCoverage,
        Category::BuildRecommendation,
        Category::Screen,
        Category::Dependency,
        Category::NavigationPath,
        Category::ApiCall,
        Category::DeviceStyling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::UiPattern => "ui_pattern",
            Category::ApiBehavior => "api_behavior",
            Category::Permission => "permission",
            Category::PlatformIssue => "platform_issue",
            Category::Asset => "asset",
            Category::NativeModule => "native_module",
            Category::GestureMapping => "gesture_mapping",
            Category::PerformanceIssue => "performance_issue",
            Category::HardwareDependency => "hardware_dependency",
            Category::TestingCoverage => "testing_coverage",
            Category::BuildRecommendation => "build_recommendation",
            Category::Screen => "screen",
            Category::Dependency => "dependency",
            Category::NavigationPath => "navigation_path",
            Category::ApiCall => "api_call",
            Category::DeviceStyling => "device_styling",
        }
    }

    pub fn parse(value: &str) -> Option<Category> {
        let normalized = value.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.as_str() == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of files the walker recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Script,
    PropertyList,
    NativeSource,
    Image,
    Manifest,
}

impl FileKind {
    /// Whether rules for this kind look at file contents at all
    pub fn is_textual(&self) -> bool {
        !matches!(self, FileKind::Image)
    }
}

/// A file yielded by the walker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute (or root-joined) path used for reading
    pub path: PathBuf,

    /// Path relative to the project root, used in findings
    pub relative: PathBuf,

    pub kind: FileKind,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.relative
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// File name without its final extension
    pub fn stem(&self) -> String {
        self.relative
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Relative path with '/' separators, for path heuristics
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.relative)
    }
}

pub fn normalize_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Where a finding was observed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: Option<usize>,
}

/// Attribute keys shared between rules, detectors and the report assembler
pub mod attrs {
    pub const SCREEN_TYPE: &str = "screen_type";
    pub const ROUTE: &str = "route";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const SOURCE_SCREEN: &str = "source_screen";
    pub const ACTION: &str = "action";
    pub const DEPENDENCY_TYPE: &str = "dependency_type";
    pub const METHOD: &str = "method";
    pub const CLIENT: &str = "client";
    pub const PATTERN_TYPE: &str = "pattern_type";
    pub const SUGGESTED_ANDROID: &str = "suggested_android";
    pub const API_NAME: &str = "api_name";
    pub const IOS_USAGE: &str = "ios_usage";
    pub const IOS_VARIANT: &str = "ios_variant";
    pub const ASSET_TYPE: &str = "asset_type";
    pub const ANDROID_PERMISSION: &str = "android_permission";
    pub const ANDROID_EQUIVALENT: &str = "android_equivalent";
    pub const HARDWARE_TYPE: &str = "hardware_type";
    pub const PLATFORM_SPECIFIC: &str = "platform_specific";
    pub const IOS_SPECIFIC: &str = "ios_specific_functionality";
    pub const COVERAGE: &str = "test_coverage_percentage";
    pub const OCCURRENCES: &str = "occurrences";
}

/// One detected fact about the scanned project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,

    /// Rule or detector that produced the finding
    pub rule: String,

    pub location: SourceLocation,

    /// Matched text or extracted identifier
    pub snippet: String,

    pub remediation: Option<String>,

    pub docs_link: Option<String>,

    /// Category-specific extras
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Identity of a finding within one scan
pub type FindingKey = (Category, PathBuf, Option<usize>, String);

impl Finding {
    pub fn new(
        category: Category,
        rule: impl Into<String>,
        path: impl Into<PathBuf>,
        line: Option<usize>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            category,
            rule: rule.into(),
            location: SourceLocation { path: path.into(), line },
            snippet: snippet.into(),
            remediation: None,
            docs_link: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_docs(mut self, docs_link: impl Into<String>) -> Self {
        self.docs_link = Some(docs_link.into());
        self
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }

    pub fn key(&self) -> FindingKey {
        (
            self.category,
            self.location.path.clone(),
            self.location.line,
            self.snippet.clone(),
        )
    }
}

/// Per-file observations the project survey needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFacts {
    /// Name of the first PascalCase component the file defines
    pub component: Option<String>,

    pub is_test: bool,

    /// Contains a `Platform.OS === 'ios'` branch
    pub has_ios_logic: bool,
}

/// Why a file produced no findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning one file
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Scanned {
        file: SourceFile,
        findings: Vec<Finding>,
        facts: FileFacts,
    },
    Skipped(SkippedFile),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_follows_declaration() {
        let mut shuffled = vec![Category::NavigationPath, Category::UiPattern, Category::Screen];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Category::UiPattern, Category::Screen, Category::NavigationPath]
        );
    }

    #[test]
    fn test_category_parse_accepts_kebab_and_snake() {
        assert_eq!(Category::parse("ui-pattern"), Some(Category::UiPattern));
        assert_eq!(Category::parse("NAVIGATION_PATH"), Some(Category::NavigationPath));
        assert_eq!(Category::parse("bogus"), None);
    }

    #[test]
    fn test_key_ignores_remediation() {
        let a = Finding::new(Category::UiPattern, "modal", "App.js", Some(3), "<Modal")
            .with_remediation("one");
        let b = Finding::new(Category::UiPattern, "other", "App.js", Some(3), "<Modal")
            .with_remediation("two");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_source_file_names() {
        let file = SourceFile {
            path: PathBuf::from("/tmp/app/src/screens/HomeScreen.tsx"),
            relative: PathBuf::from("src/screens/HomeScreen.tsx"),
            kind: FileKind::Script,
        };
        assert_eq!(file.stem(), "HomeScreen");
        assert_eq!(file.file_name(), "HomeScreen.tsx");
        assert_eq!(file.normalized_path(), "src/screens/HomeScreen.tsx");
    }
}
