//! Pattern library: detection rules as data
//!
//! Every rule maps a regex (or escaped substring) to a finding category, a
//! match scope and a remediation template. The classifier evaluates rules in
//! library order and never special-cases individual rules.

mod builtin;
mod template;

pub use template::{render, TemplateContext};

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::RuleSpec;
use crate::error::{CrossportError, Result};
use super::finding::{Category, FileKind, SourceFile};

/// What text a rule's predicate is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchScope {
    /// Every match on every line
    #[default]
    Line,
    /// First match in the whole file
    FileFirst,
    /// Every match in the whole file
    FileAll,
    /// One finding when the file holds more than N matches
    Density(usize),
    /// The file name rather than its contents
    FileName,
}

impl MatchScope {
    pub fn reads_content(&self) -> bool {
        !matches!(self, MatchScope::FileName)
    }
}

/// Which text becomes a finding's snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnippetSource {
    #[default]
    Match,
    /// The trimmed line holding the match
    Line,
    Capture(usize),
}

/// A compiled detection rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub scope: MatchScope,
    pub pattern: Regex,
    pub snippet: SnippetSource,
    pub file_kinds: Vec<FileKind>,
    pub path_filter: Option<Regex>,
    pub remediation: Option<String>,
    pub docs_link: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl Rule {
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let invalid = |reason: String| CrossportError::InvalidRule {
            id: spec.id.clone(),
            reason,
        };

        if spec.id.trim().is_empty() {
            return Err(invalid("rule id must not be empty".to_string()));
        }

        let source = if spec.literal {
            regex::escape(&spec.pattern)
        } else {
            spec.pattern.clone()
        };
        let pattern = Regex::new(&source).map_err(|e| invalid(e.to_string()))?;

        if let SnippetSource::Capture(index) = spec.snippet {
            if index >= pattern.captures_len() {
                return Err(invalid(format!("snippet refers to missing group {}", index)));
            }
        }
        let templates = spec
            .remediation
            .iter()
            .chain(spec.attributes.values());
        for text in templates {
            if let Some(index) = template::missing_groups(text, pattern.captures_len()).first() {
                return Err(invalid(format!("template refers to missing group {}", index)));
            }
        }

        if let MatchScope::Density(0) = spec.scope {
            return Err(invalid("density threshold must be positive".to_string()));
        }

        let path_filter = spec
            .path_filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;

        let file_kinds = if spec.file_kinds.is_empty() {
            vec![FileKind::Script]
        } else {
            spec.file_kinds.clone()
        };

        Ok(Self {
            id: spec.id.clone(),
            category: spec.category,
            scope: spec.scope,
            pattern,
            snippet: spec.snippet,
            file_kinds,
            path_filter,
            remediation: spec.remediation.clone(),
            docs_link: spec.docs_link.clone(),
            attributes: spec
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    pub fn applies_to(&self, file: &SourceFile) -> bool {
        if !self.file_kinds.contains(&file.kind) {
            return false;
        }
        match &self.path_filter {
            Some(filter) => filter.is_match(&file.normalized_path()),
            None => true,
        }
    }
}

impl RuleSpec {
    pub fn new(id: &str, category: Category, scope: MatchScope, pattern: &str) -> Self {
        Self {
            id: id.to_string(),
            category,
            pattern: pattern.to_string(),
            literal: false,
            scope,
            snippet: SnippetSource::Match,
            file_kinds: vec![],
            path_filter: None,
            remediation: None,
            docs_link: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn literal(mut self) -> Self {
        self.literal = true;
        self
    }

    pub fn snippet(mut self, snippet: SnippetSource) -> Self {
        self.snippet = snippet;
        self
    }

    pub fn kinds(mut self, kinds: &[FileKind]) -> Self {
        self.file_kinds = kinds.to_vec();
        self
    }

    pub fn path_filter(mut self, filter: &str) -> Self {
        self.path_filter = Some(filter.to_string());
        self
    }

    pub fn remediation(mut self, remediation: &str) -> Self {
        self.remediation = Some(remediation.to_string());
        self
    }

    pub fn docs(mut self, docs_link: &str) -> Self {
        self.docs_link = Some(docs_link.to_string());
        self
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

/// Ordered, immutable collection of rules
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    rules: Vec<Rule>,
}

impl PatternLibrary {
    /// The built-in iOS → Android rule table
    pub fn builtin() -> Result<Self> {
        Self::from_specs(&builtin::specs())
    }

    /// Built-in rules followed by user rules
    pub fn with_user_rules(user: &[RuleSpec]) -> Result<Self> {
        let mut specs = builtin::specs();
        specs.extend(user.iter().cloned());
        Self::from_specs(&specs)
    }

    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs.iter().map(Rule::compile).collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules grouped by category, each group in library order
    pub fn by_category(&self) -> BTreeMap<Category, Vec<&Rule>> {
        let mut groups: BTreeMap<Category, Vec<&Rule>> = BTreeMap::new();
        for rule in &self.rules {
            groups.entry(rule.category).or_default().push(rule);
        }
        groups
    }

    pub fn for_file<'a>(&'a self, file: &'a SourceFile) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| rule.applies_to(file))
    }

    /// Whether any applicable rule needs the file's text
    pub fn needs_content(&self, file: &SourceFile) -> bool {
        file.kind.is_textual() && self.for_file(file).any(|rule| rule.scope.reads_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn script(relative: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(relative),
            relative: PathBuf::from(relative),
            kind: FileKind::Script,
        }
    }

    #[test]
    fn test_builtin_library_compiles() {
        let library = PatternLibrary::builtin().unwrap();
        assert!(!library.is_empty());

        let groups = library.by_category();
        for category in [
            Category::UiPattern,
            Category::ApiBehavior,
            Category::Permission,
            Category::PlatformIssue,
            Category::Asset,
            Category::NativeModule,
            Category::GestureMapping,
            Category::PerformanceIssue,
            Category::HardwareDependency,
            Category::Dependency,
            Category::ApiCall,
            Category::DeviceStyling,
        ] {
            assert!(groups.contains_key(&category), "no rules for {}", category);
        }
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let library = PatternLibrary::builtin().unwrap();
        let mut ids: Vec<_> = library.rules().iter().map(|r| r.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_literal_rules_are_escaped() {
        let spec = RuleSpec::new("dots", Category::UiPattern, MatchScope::Line, "a.b(").literal();
        let rule = Rule::compile(&spec).unwrap();
        assert!(rule.pattern.is_match("x a.b( y"));
        assert!(!rule.pattern.is_match("axb("));
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let bad_regex = RuleSpec::new("bad", Category::UiPattern, MatchScope::Line, "(");
        assert!(matches!(
            Rule::compile(&bad_regex),
            Err(CrossportError::InvalidRule { id, .. }) if id == "bad"
        ));

        let bad_capture = RuleSpec::new("cap", Category::UiPattern, MatchScope::Line, "x")
            .snippet(SnippetSource::Capture(2));
        assert!(Rule::compile(&bad_capture).is_err());

        let bad_template = RuleSpec::new("tpl", Category::UiPattern, MatchScope::Line, "(x)")
            .remediation("use {2}");
        assert!(Rule::compile(&bad_template).is_err());

        let zero_density = RuleSpec::new("dense", Category::PerformanceIssue, MatchScope::Density(0), "x");
        assert!(Rule::compile(&zero_density).is_err());
    }

    #[test]
    fn test_applies_to_checks_kind_and_path() {
        let spec = RuleSpec::new("pods", Category::NativeModule, MatchScope::Line, "pod")
            .kinds(&[FileKind::Manifest])
            .path_filter(r"(^|/)Podfile$");
        let rule = Rule::compile(&spec).unwrap();

        let podfile = SourceFile {
            path: PathBuf::from("ios/Podfile"),
            relative: PathBuf::from("ios/Podfile"),
            kind: FileKind::Manifest,
        };
        let package_json = SourceFile {
            path: PathBuf::from("package.json"),
            relative: PathBuf::from("package.json"),
            kind: FileKind::Manifest,
        };
        assert!(rule.applies_to(&podfile));
        assert!(!rule.applies_to(&package_json));
        assert!(!rule.applies_to(&script("ios/Podfile.js")));
    }

    #[test]
    fn test_user_rules_follow_builtin() {
        let user = RuleSpec::new("custom", Category::UiPattern, MatchScope::Line, "ActionSheetIOS");
        let library = PatternLibrary::with_user_rules(&[user]).unwrap();
        assert_eq!(library.rules().last().unwrap().id, "custom");
        assert_eq!(library.len(), PatternLibrary::builtin().unwrap().len() + 1);
    }
}
