use std::path::PathBuf;

use super::finding::{attrs, Category, FileFacts, Finding, SourceFile};

const TESTING_DOCS: &str = "https://reactnative.dev/docs/testing-overview";
const TESTING_SUGGESTIONS: &str = "Add Jest/React Native Testing Library tests focusing on Android behavior. \
If using iOS-specific logic, ensure Android code paths are tested. \
Consider Detox or Appium for integration tests.";

/// (issue, recommendation, docs)
const ALWAYS_RECOMMENDED: &[(&str, &str, &str)] = &[
    (
        "SDK Setup",
        "Install Android Studio and set up the Android SDK. Ensure environment variables are configured.",
        "https://reactnative.dev/docs/environment-setup",
    ),
    (
        "Emulator Testing",
        "Use Android emulators with various screen sizes and densities to test layout and performance.",
        "https://developer.android.com/studio/run/emulator",
    ),
    (
        "Performance",
        "Enable Hermes on Android for better performance.",
        "https://reactnative.dev/docs/hermes",
    ),
];

struct Component {
    path: PathBuf,
    stem: String,
    has_ios_logic: bool,
}

/// Project-wide observations that no single file can decide
#[derive(Default)]
pub struct ProjectSurvey {
    components: Vec<Component>,
    test_files: Vec<String>,
    saw_ios_project: bool,
    has_android_build: bool,
}

impl ProjectSurvey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, file: &SourceFile, facts: &FileFacts) {
        let path = file.normalized_path();
        if path.split('/').any(|part| part.eq_ignore_ascii_case("ios")) || file.file_name() == "Podfile" {
            self.saw_ios_project = true;
        }
        if path == "android/build.gradle" || path.ends_with("/android/build.gradle") {
            self.has_android_build = true;
        }

        if facts.is_test {
            self.test_files.push(file.file_name());
        } else if facts.component.is_some() {
            self.components.push(Component {
                path: file.relative.clone(),
                stem: file.stem(),
                has_ios_logic: facts.has_ios_logic,
            });
        }
    }

    /// Testing-coverage gaps followed by build recommendations
    pub fn finish(self) -> Vec<Finding> {
        let mut findings = Vec::new();

        for component in &self.components {
            let tested = self
                .test_files
                .iter()
                .any(|name| name.contains(component.stem.as_str()));
            if tested {
                continue;
            }
            let ios = if component.has_ios_logic { "Yes" } else { "No" };
            findings.push(
                Finding::new(
                    Category::TestingCoverage,
                    "testing.missing_tests",
                    component.path.clone(),
                    None,
                    component.stem.clone(),
                )
                .with_remediation(TESTING_SUGGESTIONS)
                .with_docs(TESTING_DOCS)
                .with_attr(attrs::COVERAGE, "0.0")
                .with_attr(attrs::IOS_SPECIFIC, ios),
            );
        }

        if self.saw_ios_project && !self.has_android_build {
            findings.push(build_recommendation(
                "Build Configuration",
                "Create a Gradle build for Android (android/build.gradle) and port the iOS build settings.",
                "https://developer.android.com/studio/build",
            ));
        }
        for (issue, recommendation, docs) in ALWAYS_RECOMMENDED {
            findings.push(build_recommendation(issue, recommendation, docs));
        }

        findings
    }
}

fn build_recommendation(issue: &str, recommendation: &str, docs: &str) -> Finding {
    Finding::new(Category::BuildRecommendation, "build.recommendation", ".", None, issue)
        .with_remediation(recommendation)
        .with_docs(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::FileKind;

    fn file(relative: &str, kind: FileKind) -> SourceFile {
        SourceFile {
            path: PathBuf::from(relative),
            relative: PathBuf::from(relative),
            kind,
        }
    }

    fn component(name: &str, ios: bool) -> FileFacts {
        FileFacts {
            component: Some(name.to_string()),
            is_test: false,
            has_ios_logic: ios,
        }
    }

    fn test_file() -> FileFacts {
        FileFacts {
            is_test: true,
            ..FileFacts::default()
        }
    }

    #[test]
    fn test_untested_components_are_reported() {
        let mut survey = ProjectSurvey::new();
        survey.observe(&file("src/Cart.js", FileKind::Script), &component("Cart", true));
        survey.observe(&file("src/Home.js", FileKind::Script), &component("Home", false));
        survey.observe(&file("src/utils.js", FileKind::Script), &FileFacts::default());
        survey.observe(&file("src/__tests__/Home.test.js", FileKind::Script), &test_file());

        let findings = survey.finish();
        let gaps: Vec<_> = findings
            .iter()
            .filter(|f| f.category == Category::TestingCoverage)
            .collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].snippet, "Cart");
        assert_eq!(gaps[0].attr(attrs::IOS_SPECIFIC), Some("Yes"));
        assert_eq!(gaps[0].attr(attrs::COVERAGE), Some("0.0"));
    }

    #[test]
    fn test_build_configuration_needs_ios_without_gradle() {
        let mut survey = ProjectSurvey::new();
        survey.observe(&file("ios/Podfile", FileKind::Manifest), &FileFacts::default());
        let issues: Vec<_> = survey.finish().into_iter().map(|f| f.snippet).collect();
        assert_eq!(
            issues,
            vec!["Build Configuration", "SDK Setup", "Emulator Testing", "Performance"]
        );

        let mut survey = ProjectSurvey::new();
        survey.observe(&file("ios/Podfile", FileKind::Manifest), &FileFacts::default());
        survey.observe(&file("android/build.gradle", FileKind::Manifest), &FileFacts::default());
        let issues: Vec<_> = survey.finish().into_iter().map(|f| f.snippet).collect();
        assert_eq!(issues, vec!["SDK Setup", "Emulator Testing", "Performance"]);
    }
}
