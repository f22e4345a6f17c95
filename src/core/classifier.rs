use std::sync::Arc;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use super::finding::{
    attrs, Category, FileFacts, FileKind, FileOutcome, Finding, SkippedFile, SourceFile,
};
use super::lines::LineIndex;
use super::navigation::{NavigationExtractor, NavigatorIndex};
use super::rules::{render, MatchScope, PatternLibrary, Rule, SnippetSource, TemplateContext};
use super::screens::{DetectedScreen, ScreenDetector};

/// Applies the pattern library and the screen/navigation detectors to one file
pub struct Classifier {
    library: Arc<PatternLibrary>,
    screens: ScreenDetector,
    navigation: NavigationExtractor,
    navigators: Arc<NavigatorIndex>,
    ios_check: Regex,
    max_file_size: u64,
    test_markers: Vec<String>,
}

impl Classifier {
    pub fn new(
        library: Arc<PatternLibrary>,
        config: &Config,
        navigators: Arc<NavigatorIndex>,
    ) -> Result<Self> {
        Ok(Self {
            library,
            screens: ScreenDetector::new(&config.heuristics)?,
            navigation: NavigationExtractor::new(&config.heuristics)?,
            navigators,
            ios_check: Regex::new(r#"Platform\.OS\s*===?\s*['"]ios['"]"#)?,
            max_file_size: config.scanning.max_file_size,
            test_markers: config.heuristics.test_file_markers.clone(),
        })
    }

    /// Read and classify a file. Never fails: problems become a skipped outcome.
    pub fn scan_file(&self, file: &SourceFile) -> FileOutcome {
        let content = match self.read(file) {
            Ok(content) => content,
            Err(reason) => {
                warn!("Skipping {}: {}", file.relative.display(), reason);
                return FileOutcome::Skipped(SkippedFile {
                    path: file.relative.clone(),
                    reason,
                });
            }
        };

        let (findings, facts) = match content {
            Some(content) => self.classify(file, &content),
            None => (self.match_names(file), FileFacts::default()),
        };
        debug!("{}: {} findings", file.relative.display(), findings.len());

        FileOutcome::Scanned {
            file: file.clone(),
            findings,
            facts,
        }
    }

    /// Findings and survey facts for a file whose text is already loaded
    pub fn classify(&self, file: &SourceFile, content: &str) -> (Vec<Finding>, FileFacts) {
        let index = LineIndex::new(content);
        let mut findings = Vec::new();

        for rule in self.library.for_file(file) {
            self.apply(rule, file, content, &index, &mut findings);
        }

        if file.kind != FileKind::Script {
            return (findings, FileFacts::default());
        }

        let components = self.screens.components(content);
        let is_test = self.is_test(file);
        let facts = FileFacts {
            component: components.first().map(|c| c.name.clone()),
            is_test,
            has_ios_logic: self.ios_check.is_match(content),
        };
        if is_test {
            return (findings, facts);
        }

        let screen = self
            .screens
            .detect(file, content, &components, &self.navigators);
        let calls = self.navigation.extract(content);

        match screen {
            Some(screen) => {
                for call in calls {
                    findings.push(
                        Finding::new(
                            Category::NavigationPath,
                            format!("navigation.{}", call.action),
                            file.relative.clone(),
                            Some(call.line),
                            call.target,
                        )
                        .with_attr(attrs::SOURCE_SCREEN, screen.name.clone())
                        .with_attr(attrs::ACTION, call.action),
                    );
                }
                let screen_finding = screen_finding(file, &screen, &findings);
                findings.push(screen_finding);
            }
            None if !calls.is_empty() => {
                debug!(
                    "Dropping {} navigation calls in {}: no enclosing screen",
                    calls.len(),
                    file.relative.display()
                );
            }
            None => {}
        }

        (findings, facts)
    }

    fn read(&self, file: &SourceFile) -> std::result::Result<Option<String>, String> {
        let wants_text = file.kind == FileKind::Script || self.library.needs_content(file);
        if !wants_text {
            return Ok(None);
        }

        let metadata = std::fs::metadata(&file.path).map_err(|e| format!("unreadable: {}", e))?;
        if metadata.len() > self.max_file_size {
            return Err(format!(
                "file too large ({} bytes, limit {})",
                metadata.len(),
                self.max_file_size
            ));
        }

        let bytes = std::fs::read(&file.path).map_err(|e| format!("unreadable: {}", e))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| "not valid UTF-8".to_string())
    }

    /// File-name rules only, for files whose contents are never inspected
    fn match_names(&self, file: &SourceFile) -> Vec<Finding> {
        let mut findings = Vec::new();
        let index = LineIndex::new("");
        for rule in self
            .library
            .for_file(file)
            .filter(|r| r.scope == MatchScope::FileName)
        {
            self.apply(rule, file, "", &index, &mut findings);
        }
        findings
    }

    fn is_test(&self, file: &SourceFile) -> bool {
        let name = file.file_name();
        self.test_markers.iter().any(|m| name.contains(m.as_str()))
            || file.normalized_path().contains("__tests__/")
    }

    fn apply(
        &self,
        rule: &Rule,
        file: &SourceFile,
        content: &str,
        index: &LineIndex,
        out: &mut Vec<Finding>,
    ) {
        match rule.scope {
            MatchScope::Line => {
                for (number, line) in content.lines().enumerate() {
                    for caps in rule.pattern.captures_iter(line) {
                        out.extend(build(rule, file, &caps, Some(number + 1), line));
                    }
                }
            }
            MatchScope::FileFirst => {
                if let Some(caps) = non_empty(&rule.pattern, content).next() {
                    let line = index.line_of(start_of(&caps));
                    out.extend(build(rule, file, &caps, Some(line), index.line_text(content, line)));
                }
            }
            MatchScope::FileAll => {
                for caps in non_empty(&rule.pattern, content) {
                    let line = index.line_of(start_of(&caps));
                    out.extend(build(rule, file, &caps, Some(line), index.line_text(content, line)));
                }
            }
            MatchScope::Density(threshold) => {
                let mut matches = non_empty(&rule.pattern, content);
                let Some(first) = matches.next() else { return };
                let count = 1 + matches.count();
                if count <= threshold {
                    return;
                }
                if let Some(mut finding) = build(rule, file, &first, None, "") {
                    finding.snippet = format!("{} x{}", finding.snippet, count);
                    finding.attributes.insert(attrs::OCCURRENCES.to_string(), count.to_string());
                    out.push(finding);
                }
            }
            MatchScope::FileName => {
                let name = file.file_name();
                if let Some(caps) = rule.pattern.captures(&name) {
                    out.extend(build(rule, file, &caps, None, &name));
                }
            }
        }
    }
}

fn non_empty<'r, 'h>(pattern: &'r Regex, content: &'h str) -> impl Iterator<Item = Captures<'h>> + 'r
where
    'h: 'r,
{
    pattern
        .captures_iter(content)
        .filter(|caps| caps.get(0).is_some_and(|m| !m.as_str().is_empty()))
}

fn start_of(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.start())
}

fn build(
    rule: &Rule,
    file: &SourceFile,
    caps: &Captures<'_>,
    line: Option<usize>,
    line_text: &str,
) -> Option<Finding> {
    let matched = caps.get(0).map_or("", |m| m.as_str());
    if matched.is_empty() {
        return None;
    }

    let snippet = match rule.snippet {
        SnippetSource::Match => matched,
        SnippetSource::Line => line_text.trim(),
        SnippetSource::Capture(group) => caps.get(group).map(|m| m.as_str()).unwrap_or(matched),
    };
    if snippet.trim().is_empty() {
        return None;
    }

    let ctx = TemplateContext {
        captures: Some(caps),
        matched,
        file,
    };
    let mut finding = Finding::new(
        rule.category,
        rule.id.clone(),
        file.relative.clone(),
        line,
        snippet,
    );
    if let Some(template) = &rule.remediation {
        finding = finding.with_remediation(render(template, &ctx));
    }
    if let Some(docs) = &rule.docs_link {
        finding = finding.with_docs(docs.clone());
    }
    for (key, template) in &rule.attributes {
        let value = render(template, &ctx);
        if !value.is_empty() {
            finding = finding.with_attr(key, value);
        }
    }

    Some(finding)
}

fn screen_finding(file: &SourceFile, screen: &DetectedScreen, findings: &[Finding]) -> Finding {
    let mut imports: Vec<&str> = Vec::new();
    for finding in findings.iter().filter(|f| f.category == Category::Dependency) {
        if !imports.contains(&finding.snippet.as_str()) {
            imports.push(&finding.snippet);
        }
    }

    let mut finding = Finding::new(
        Category::Screen,
        "screen",
        file.relative.clone(),
        screen.line,
        screen.name.clone(),
    )
    .with_attr(attrs::SCREEN_TYPE, screen.screen_type.as_str())
    .with_attr(attrs::DEPENDENCIES, imports.join(", "));
    if let Some(route) = &screen.route {
        finding = finding.with_attr(attrs::ROUTE, route.clone());
    }
    finding
}
