use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::{Category, FileKind, MatchScope, SnippetSource};
use crate::error::{CrossportError, Result};

/// Config file names probed when no explicit path is given
pub const CONFIG_CANDIDATES: [&str; 3] = ["crossport.toml", "Crossport.toml", ".crossport.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project traversal settings
    pub project: ProjectConfig,

    /// Which files are scanned and how
    pub scanning: ScanningConfig,

    /// Screen and navigation heuristics
    pub heuristics: HeuristicsConfig,

    /// Report output settings
    pub output: OutputConfig,

    /// User-defined detection rules, appended after the built-in table
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory names skipped wherever they appear
    pub exclude_dirs: Vec<String>,

    /// Extra exclusions in gitignore syntax
    pub exclude_globs: Vec<String>,

    /// Honour the project's own .gitignore
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// JavaScript / TypeScript sources
    pub script_extensions: Vec<String>,

    /// iOS property lists
    pub property_list_extensions: Vec<String>,

    /// Objective-C sources
    pub native_extensions: Vec<String>,

    /// Image assets
    pub image_extensions: Vec<String>,

    /// Build manifests matched by exact file name
    pub manifest_files: Vec<String>,

    /// Maximum file size to read (in bytes)
    pub max_file_size: u64,

    /// Number of blocking workers; 1 keeps the scan sequential
    pub jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Path fragments (lowercase, '/'-separated) that mark a screen directory
    pub screen_dirs: Vec<String>,

    /// Component name suffixes that mark a screen
    pub screen_suffixes: Vec<String>,

    /// Screen name fragments that make a screen modal
    pub modal_name_markers: Vec<String>,

    /// File content fragments that make a screen modal
    pub modal_content_markers: Vec<String>,

    /// Navigator objects whose `.Screen` children register routes
    pub navigator_names: Vec<String>,

    /// Navigation calls that produce an edge
    pub navigation_actions: Vec<String>,

    /// Pre-scan script files for navigator route registrations
    pub index_navigators: bool,

    /// File name fragments identifying test files
    pub test_file_markers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the JSON sink writes tables into
    pub dir: Option<PathBuf>,
}

/// A detection rule declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub category: Category,
    pub pattern: String,

    /// Treat `pattern` as a plain substring
    #[serde(default)]
    pub literal: bool,

    #[serde(default)]
    pub scope: MatchScope,

    #[serde(default)]
    pub snippet: SnippetSource,

    /// Empty means script files only
    #[serde(default)]
    pub file_kinds: Vec<FileKind>,

    #[serde(default)]
    pub path_filter: Option<String>,

    #[serde(default)]
    pub remediation: Option<String>,

    #[serde(default)]
    pub docs_link: Option<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: strings(&[
                "node_modules",
                ".git",
                "Pods",
                "build",
                ".expo",
                "DerivedData",
                "vendor",
            ]),
            exclude_globs: vec![],
            respect_gitignore: true,
        }
    }
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            script_extensions: strings(&["js", "jsx", "ts", "tsx"]),
            property_list_extensions: strings(&["plist"]),
            native_extensions: strings(&["m", "mm"]),
            image_extensions: strings(&["png", "jpg", "jpeg"]),
            manifest_files: strings(&["Podfile", "package.json", "build.gradle"]),
            max_file_size: 1024 * 1024, // 1MB
            jobs: 1,
        }
    }
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            screen_dirs: strings(&["src/screens/", "/screens/"]),
            screen_suffixes: strings(&["Screen"]),
            modal_name_markers: strings(&["Modal"]),
            modal_content_markers: strings(&["presentation: 'modal'", "presentation: \"modal\""]),
            navigator_names: strings(&["Stack", "Drawer", "Tab", "MaterialTopTab", "NativeStack"]),
            navigation_actions: strings(&["navigate", "push", "replace", "reset"]),
            index_navigators: true,
            test_file_markers: strings(&[".test.", ".spec."]),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CrossportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CrossportError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Err(CrossportError::Config(format!(
                        "config file {} does not exist",
                        p.as_ref().display()
                    )))
                }
            }
            None => {
                for candidate in &CONFIG_CANDIDATES {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scanning.jobs == 0 {
            return Err(CrossportError::Config("scanning.jobs must be at least 1".to_string()));
        }
        if self.heuristics.navigation_actions.is_empty() {
            return Err(CrossportError::Config(
                "heuristics.navigation_actions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_round_trips_through_toml() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.child("crossport.toml");

        let config = Config::default();
        config.save(path.path()).unwrap();

        let loaded = Config::load(path.path()).unwrap();
        assert_eq!(loaded.project.exclude_dirs, config.project.exclude_dirs);
        assert_eq!(loaded.scanning.jobs, 1);
        assert_eq!(loaded.heuristics.screen_suffixes, vec!["Screen".to_string()]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.child("crossport.toml");
        path.write_str("[scanning]\njobs = 4\n").unwrap();

        let loaded = Config::load(path.path()).unwrap();
        assert_eq!(loaded.scanning.jobs, 4);
        assert_eq!(loaded.scanning.script_extensions.len(), 4);
        assert!(loaded.project.respect_gitignore);
        assert!(loaded.rules.is_empty());
    }

    #[test]
    fn test_user_rules_parse() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.child("crossport.toml");
        path.write_str(
            r#"
[[rules]]
id = "action-sheet"
category = "ui_pattern"
pattern = "ActionSheetIOS"
literal = true
remediation = "Use a bottom sheet on Android"

[[rules]]
id = "timers"
category = "performance_issue"
pattern = "setInterval"
scope = { density = 3 }
"#,
        )
        .unwrap();

        let loaded = Config::load(path.path()).unwrap();
        assert_eq!(loaded.rules.len(), 2);
        assert_eq!(loaded.rules[0].category, Category::UiPattern);
        assert_eq!(loaded.rules[0].scope, MatchScope::Line);
        assert_eq!(loaded.rules[1].scope, MatchScope::Density(3));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.child("crossport.toml");
        path.write_str("[scanning]\njobs = 0\n").unwrap();

        assert!(matches!(Config::load(path.path()), Err(CrossportError::Config(_))));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load_or_default(Some(&missing)).is_err());
    }
}
