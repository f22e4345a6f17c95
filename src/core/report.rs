//! Report assembly: a pure mapping from a scan result to per-table records
//!
//! Each record flattens a [`FindingOrigin`] so that nothing a finding carried
//! is lost on the way to the sink, then adds the columns its table is known by.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::aggregator::{ScanResult, ScanSummary};
use super::finding::{attrs, normalize_path, Category, Finding};

/// A row in a named table, identified by the table's uniqueness constraint
pub trait Record: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync {
    const TABLE: &'static str;

    fn upsert_key(&self) -> String;
}

/// Stable SHA-256 of a finding's uniqueness key
pub fn fingerprint(finding: &Finding) -> String {
    let mut hasher = Sha256::new();
    hasher.update(finding.category.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(normalize_path(&finding.location.path).as_bytes());
    hasher.update([0]);
    if let Some(line) = finding.location.line {
        hasher.update(line.to_string().as_bytes());
    }
    hasher.update([0]);
    hasher.update(finding.snippet.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingOrigin {
    pub id: String,
    pub category: Category,
    pub rule: String,
    pub file_path: String,
    pub line_number: Option<usize>,
    pub snippet: String,
    pub remediation: Option<String>,
    pub docs_link: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl From<&Finding> for FindingOrigin {
    fn from(finding: &Finding) -> Self {
        Self {
            id: fingerprint(finding),
            category: finding.category,
            rule: finding.rule.clone(),
            file_path: normalize_path(&finding.location.path),
            line_number: finding.location.line,
            snippet: finding.snippet.clone(),
            remediation: finding.remediation.clone(),
            docs_link: finding.docs_link.clone(),
            attributes: finding.attributes.clone(),
        }
    }
}

fn attr(finding: &Finding, key: &str) -> String {
    finding.attr(key).unwrap_or_default().to_string()
}

fn remediation(finding: &Finding) -> String {
    finding.remediation.clone().unwrap_or_default()
}

fn file_stem(finding: &Finding) -> String {
    finding
        .location
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub name: String,
    pub screen_type: String,
    pub dependencies: String,
    pub route: Option<String>,
}

impl From<&Finding> for ScreenRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            name: f.snippet.clone(),
            screen_type: attr(f, attrs::SCREEN_TYPE),
            dependencies: attr(f, attrs::DEPENDENCIES),
            route: f.attr(attrs::ROUTE).map(str::to_string),
        }
    }
}

impl Record for ScreenRecord {
    const TABLE: &'static str = "screens";

    fn upsert_key(&self) -> String {
        format!("{}\u{1f}{}", self.name, self.origin.file_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationPathRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub source_screen: String,
    pub target_screen: String,
    pub action: String,
}

impl From<&Finding> for NavigationPathRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            source_screen: attr(f, attrs::SOURCE_SCREEN),
            target_screen: f.snippet.clone(),
            action: attr(f, attrs::ACTION),
        }
    }
}

impl Record for NavigationPathRecord {
    const TABLE: &'static str = "navigation_paths";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub dependency_type: String,
}

impl From<&Finding> for DependencyRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            source: normalize_path(&f.location.path),
            target: f.snippet.clone(),
            dependency_type: attr(f, attrs::DEPENDENCY_TYPE),
        }
    }
}

impl Record for DependencyRecord {
    const TABLE: &'static str = "dependencies";

    fn upsert_key(&self) -> String {
        format!("{}\u{1f}{}\u{1f}{}", self.source, self.target, self.dependency_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCallRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub endpoint: String,
    pub method: String,
    pub client: String,
}

impl From<&Finding> for ApiCallRecord {
    fn from(f: &Finding) -> Self {
        let method = f.attr(attrs::METHOD).filter(|m| !m.is_empty()).unwrap_or("GET");
        Self {
            origin: f.into(),
            endpoint: f.snippet.clone(),
            method: method.to_string(),
            client: attr(f, attrs::CLIENT),
        }
    }
}

impl Record for ApiCallRecord {
    const TABLE: &'static str = "api_calls";

    fn upsert_key(&self) -> String {
        format!("{}\u{1f}{}", self.endpoint, self.method)
    }
}

/// Shared shape of `platform_issues` and `device_styling` rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeIssueRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub issue_type: String,
    pub details: String,
    pub android_equivalent: Option<String>,
}

impl From<&Finding> for CodeIssueRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            issue_type: f.rule.clone(),
            details: f.snippet.clone(),
            android_equivalent: f.attr(attrs::ANDROID_EQUIVALENT).map(str::to_string),
        }
    }
}

impl CodeIssueRecord {
    fn issue_key(&self) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.origin.file_path,
            self.origin.line_number.map(|l| l.to_string()).unwrap_or_default(),
            self.issue_type,
            self.details
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformIssueRecord(pub CodeIssueRecord);

impl Record for PlatformIssueRecord {
    const TABLE: &'static str = "platform_issues";

    fn upsert_key(&self) -> String {
        self.0.issue_key()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStylingRecord(pub CodeIssueRecord);

impl Record for DeviceStylingRecord {
    const TABLE: &'static str = "device_styling";

    fn upsert_key(&self) -> String {
        self.0.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiPatternRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub screen_name: String,
    pub pattern_type: String,
    pub suggested_android: String,
    pub details: String,
}

impl From<&Finding> for UiPatternRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            screen_name: file_stem(f),
            pattern_type: attr(f, attrs::PATTERN_TYPE),
            suggested_android: attr(f, attrs::SUGGESTED_ANDROID),
            details: f.snippet.clone(),
        }
    }
}

impl Record for UiPatternRecord {
    const TABLE: &'static str = "ui_patterns";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiBehaviorRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub api_name: String,
    pub ios_usage: String,
    pub android_considerations: String,
}

impl From<&Finding> for ApiBehaviorRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            api_name: attr(f, attrs::API_NAME),
            ios_usage: attr(f, attrs::IOS_USAGE),
            android_considerations: remediation(f),
        }
    }
}

impl Record for ApiBehaviorRecord {
    const TABLE: &'static str = "api_behavior";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub asset_path: String,
    pub asset_type: String,
    pub ios_variant: String,
    pub android_recommendation: String,
}

impl From<&Finding> for AssetRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            asset_path: normalize_path(&f.location.path),
            asset_type: attr(f, attrs::ASSET_TYPE),
            ios_variant: attr(f, attrs::IOS_VARIANT),
            android_recommendation: remediation(f),
        }
    }
}

impl Record for AssetRecord {
    const TABLE: &'static str = "assets";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingCoverageRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub component_name: String,
    pub test_coverage_percentage: f64,
    pub ios_specific_functionality: String,
    pub android_testing_suggestions: String,
}

impl From<&Finding> for TestingCoverageRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            component_name: f.snippet.clone(),
            test_coverage_percentage: f
                .attr(attrs::COVERAGE)
                .and_then(|c| c.parse().ok())
                .unwrap_or(0.0),
            ios_specific_functionality: attr(f, attrs::IOS_SPECIFIC),
            android_testing_suggestions: remediation(f),
        }
    }
}

impl Record for TestingCoverageRecord {
    const TABLE: &'static str = "testing_coverage";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub ios_permission: String,
    pub android_permission: String,
    pub notes: String,
}

impl From<&Finding> for PermissionRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            ios_permission: f.snippet.clone(),
            android_permission: attr(f, attrs::ANDROID_PERMISSION),
            notes: remediation(f),
        }
    }
}

impl Record for PermissionRecord {
    const TABLE: &'static str = "permissions_mapping";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecommendationRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub aspect: String,
    pub recommendation: String,
}

impl From<&Finding> for BuildRecommendationRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            aspect: f.snippet.clone(),
            recommendation: remediation(f),
        }
    }
}

impl Record for BuildRecommendationRecord {
    const TABLE: &'static str = "build_recommendations";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub ios_gesture: String,
    pub android_equivalent: String,
    pub notes: String,
}

impl From<&Finding> for GestureRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            ios_gesture: f.snippet.clone(),
            android_equivalent: attr(f, attrs::ANDROID_EQUIVALENT),
            notes: remediation(f),
        }
    }
}

impl Record for GestureRecord {
    const TABLE: &'static str = "gestures_mapping";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeModuleRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub ios_module: String,
    pub android_equivalent: String,
    pub bridging_guidance: String,
}

impl From<&Finding> for NativeModuleRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            ios_module: f.snippet.clone(),
            android_equivalent: attr(f, attrs::ANDROID_EQUIVALENT),
            bridging_guidance: remediation(f),
        }
    }
}

impl Record for NativeModuleRecord {
    const TABLE: &'static str = "native_modules";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceIssueRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub issue_type: String,
    pub details: String,
    pub recommendation: String,
    pub occurrences: Option<usize>,
}

impl From<&Finding> for PerformanceIssueRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            issue_type: f.rule.clone(),
            details: f.snippet.clone(),
            recommendation: remediation(f),
            occurrences: f.attr(attrs::OCCURRENCES).and_then(|o| o.parse().ok()),
        }
    }
}

impl Record for PerformanceIssueRecord {
    const TABLE: &'static str = "performance_issues";

    fn upsert_key(&self) -> String {
        self.origin.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareDependencyRecord {
    #[serde(flatten)]
    pub origin: FindingOrigin,
    pub issue_type: String,
    pub details: String,
    pub recommendation: String,
    pub platform_specific: String,
}

impl From<&Finding> for HardwareDependencyRecord {
    fn from(f: &Finding) -> Self {
        Self {
            origin: f.into(),
            issue_type: attr(f, attrs::HARDWARE_TYPE),
            details: f.snippet.clone(),
            recommendation: remediation(f),
            platform_specific: attr(f, attrs::PLATFORM_SPECIFIC),
        }
    }
}

impl Record for HardwareDependencyRecord {
    const TABLE: &'static str = "hardware_dependencies";

    fn upsert_key(&self) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.origin.file_path,
            self.origin.line_number.map(|l| l.to_string()).unwrap_or_default(),
            self.issue_type,
            self.details
        )
    }
}

/// The single `progress_dashboard` row for a project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub project_root: String,
    pub components_ported: usize,
    pub ios_libs_replaced: usize,
    pub apis_adjusted: usize,
    pub ui_elements_converted: usize,
    pub last_updated: DateTime<Utc>,
}

impl Record for ProgressRecord {
    const TABLE: &'static str = "progress_dashboard";

    fn upsert_key(&self) -> String {
        self.project_root.clone()
    }
}

/// Everything the sink persists for one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub summary: ScanSummary,
    pub progress: ProgressRecord,
    pub screens: Vec<ScreenRecord>,
    pub navigation_paths: Vec<NavigationPathRecord>,
    pub dependencies: Vec<DependencyRecord>,
    pub api_calls: Vec<ApiCallRecord>,
    pub platform_issues: Vec<PlatformIssueRecord>,
    pub ui_patterns: Vec<UiPatternRecord>,
    pub device_styling: Vec<DeviceStylingRecord>,
    pub api_behavior: Vec<ApiBehaviorRecord>,
    pub assets: Vec<AssetRecord>,
    pub testing_coverage: Vec<TestingCoverageRecord>,
    pub permissions_mapping: Vec<PermissionRecord>,
    pub build_recommendations: Vec<BuildRecommendationRecord>,
    pub gestures_mapping: Vec<GestureRecord>,
    pub native_modules: Vec<NativeModuleRecord>,
    pub performance_issues: Vec<PerformanceIssueRecord>,
    pub hardware_dependencies: Vec<HardwareDependencyRecord>,
}

impl ScanReport {
    /// Total number of finding rows across all tables
    pub fn row_count(&self) -> usize {
        self.screens.len()
            + self.navigation_paths.len()
            + self.dependencies.len()
            + self.api_calls.len()
            + self.platform_issues.len()
            + self.ui_patterns.len()
            + self.device_styling.len()
            + self.api_behavior.len()
            + self.assets.len()
            + self.testing_coverage.len()
            + self.permissions_mapping.len()
            + self.build_recommendations.len()
            + self.gestures_mapping.len()
            + self.native_modules.len()
            + self.performance_issues.len()
            + self.hardware_dependencies.len()
    }
}

fn rows<'a, T>(result: &'a ScanResult, category: Category) -> Vec<T>
where
    T: From<&'a Finding>,
{
    result.findings(category).iter().map(T::from).collect()
}

pub fn assemble(result: &ScanResult) -> ScanReport {
    let progress = &result.summary.progress;

    ScanReport {
        generated_at: result.started_at,
        root: result.root.clone(),
        summary: result.summary.clone(),
        progress: ProgressRecord {
            project_root: result.root.display().to_string(),
            components_ported: progress.components_ported,
            ios_libs_replaced: progress.ios_libs_replaced,
            apis_adjusted: progress.apis_adjusted,
            ui_elements_converted: progress.ui_elements_converted,
            last_updated: result.started_at,
        },
        screens: rows(result, Category::Screen),
        navigation_paths: rows(result, Category::NavigationPath),
        dependencies: rows(result, Category::Dependency),
        api_calls: rows(result, Category::ApiCall),
        platform_issues: result
            .findings(Category::PlatformIssue)
            .iter()
            .map(|f| PlatformIssueRecord(f.into()))
            .collect(),
        ui_patterns: rows(result, Category::UiPattern),
        device_styling: result
            .findings(Category::DeviceStyling)
            .iter()
            .map(|f| DeviceStylingRecord(f.into()))
            .collect(),
        api_behavior: rows(result, Category::ApiBehavior),
        assets: rows(result, Category::Asset),
        testing_coverage: rows(result, Category::TestingCoverage),
        permissions_mapping: rows(result, Category::Permission),
        build_recommendations: rows(result, Category::BuildRecommendation),
        gestures_mapping: rows(result, Category::GestureMapping),
        native_modules: rows(result, Category::NativeModule),
        performance_issues: rows(result, Category::PerformanceIssue),
        hardware_dependencies: rows(result, Category::HardwareDependency),
    }
}
