// Scan pipeline: walker -> classifier -> aggregator -> report -> sink
mod engine;
mod finding;
mod lines;
mod walker;
pub mod rules;

// Detectors layered on top of the rule table
mod screens;
mod navigation;
mod classifier;
mod survey;

mod aggregator;
mod scanner;
mod report;
mod sink;

pub use finding::{
    attrs, normalize_path, Category, FileFacts, FileKind, FileOutcome, Finding, FindingKey,
    SkippedFile, SourceFile, SourceLocation,
};
pub use walker::{FileWalker, WalkEntry};
pub use rules::{MatchScope, PatternLibrary, Rule, SnippetSource};
pub use screens::{ComponentDef, ComponentKind, DetectedScreen, ScreenDetector, ScreenType};
pub use navigation::{NavigationCall, NavigationExtractor, NavigatorIndex, NavigatorIndexer};
pub use classifier::Classifier;
pub use survey::ProjectSurvey;
pub use aggregator::{Aggregator, PortingProgress, ScanResult, ScanSummary};
pub use scanner::Scanner;
pub use report::{
    assemble, fingerprint, ApiBehaviorRecord, ApiCallRecord, AssetRecord,
    BuildRecommendationRecord, CodeIssueRecord, DependencyRecord, DeviceStylingRecord,
    FindingOrigin, GestureRecord, HardwareDependencyRecord, NativeModuleRecord,
    NavigationPathRecord, PerformanceIssueRecord, PermissionRecord, PlatformIssueRecord,
    ProgressRecord, Record, ScanReport, ScreenRecord, TestingCoverageRecord, UiPatternRecord,
};
pub use sink::{JsonDirectorySink, PersistOutcome, ReportSink};

// Export the main engine
pub use engine::{Engine, ScanRequest};
