use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::finding::{Category, FileOutcome, Finding, SkippedFile};
use super::survey::ProjectSurvey;

/// Porting dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortingProgress {
    pub components_ported: usize,
    pub ios_libs_replaced: usize,
    pub apis_adjusted: usize,
    pub ui_elements_converted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub total_findings: usize,
    pub duplicates_collapsed: usize,
    pub counts: BTreeMap<Category, usize>,
    pub screens: usize,
    pub apis_flagged: usize,
    pub navigation_edges: usize,
    pub progress: PortingProgress,
}

/// Everything one scan produced, grouped by category
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub root: PathBuf,
    /// Wall-clock start of the scan. Not covered by the guarantee that an
    /// unchanged tree yields identical results; compare `groups` and `summary`.
    pub started_at: DateTime<Utc>,
    pub groups: BTreeMap<Category, Vec<Finding>>,
    pub summary: ScanSummary,
    pub skipped: Vec<SkippedFile>,
}

impl ScanResult {
    pub fn findings(&self, category: Category) -> &[Finding] {
        self.groups.get(&category).map(|f| f.as_slice()).unwrap_or(&[])
    }

    /// All findings in report order
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.groups.values().flatten()
    }
}

/// Sole merge point of per-file outcomes. Arrival order does not matter.
pub struct Aggregator {
    root: PathBuf,
    started_at: DateTime<Utc>,
    findings: Vec<(usize, Finding)>,
    skipped: Vec<SkippedFile>,
    files_scanned: usize,
    survey: ProjectSurvey,
}

impl Aggregator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            started_at: Utc::now(),
            findings: Vec::new(),
            skipped: Vec::new(),
            files_scanned: 0,
            survey: ProjectSurvey::new(),
        }
    }

    pub fn push(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Scanned { file, findings, facts } => {
                self.files_scanned += 1;
                self.survey.observe(&file, &facts);
                self.findings.extend(findings.into_iter().enumerate());
            }
            FileOutcome::Skipped(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn finish(self) -> ScanResult {
        let Aggregator {
            root,
            started_at,
            mut findings,
            mut skipped,
            files_scanned,
            survey,
        } = self;

        findings.extend(survey.finish().into_iter().enumerate());

        // Normalised order: category, path, line, then position within the file
        findings.sort_by(|(a_seq, a), (b_seq, b)| {
            (a.category, &a.location.path, a.location.line, a_seq)
                .cmp(&(b.category, &b.location.path, b.location.line, b_seq))
        });

        let mut seen = HashSet::new();
        let mut duplicates = 0;
        let mut groups: BTreeMap<Category, Vec<Finding>> = BTreeMap::new();
        for (_, finding) in findings {
            if !seen.insert(finding.key()) {
                duplicates += 1;
                continue;
            }
            groups.entry(finding.category).or_default().push(finding);
        }
        debug!("Collapsed {} duplicate findings", duplicates);

        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let summary = summarize(&groups, files_scanned, skipped.len(), duplicates);
        ScanResult {
            root,
            started_at,
            groups,
            summary,
            skipped,
        }
    }
}

fn summarize(
    groups: &BTreeMap<Category, Vec<Finding>>,
    files_scanned: usize,
    files_skipped: usize,
    duplicates_collapsed: usize,
) -> ScanSummary {
    let count = |category: Category| groups.get(&category).map(|f| f.len()).unwrap_or(0);

    let counts: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|c| (*c, count(*c))).collect();

    let screens: BTreeSet<_> = groups
        .get(&Category::Screen)
        .into_iter()
        .flatten()
        .map(|f| (f.snippet.as_str(), &f.location.path))
        .collect();

    ScanSummary {
        files_scanned,
        files_skipped,
        total_findings: counts.values().sum(),
        duplicates_collapsed,
        screens: screens.len(),
        apis_flagged: count(Category::ApiCall) + count(Category::ApiBehavior),
        navigation_edges: count(Category::NavigationPath),
        progress: PortingProgress {
            components_ported: screens.len(),
            ios_libs_replaced: count(Category::NativeModule),
            apis_adjusted: count(Category::ApiBehavior),
            ui_elements_converted: count(Category::Asset),
        },
        counts,
    }
}
