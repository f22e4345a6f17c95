use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::HeuristicsConfig;
use crate::error::Result;
use super::finding::SourceFile;
use super::lines::LineIndex;
use super::navigation::NavigatorIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenType {
    Functional,
    Class,
    Modal,
    Unknown,
}

impl ScreenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenType::Functional => "functional",
            ScreenType::Class => "class",
            ScreenType::Modal => "modal",
            ScreenType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Class,
    Function,
}

/// A PascalCase component definition found in a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDef {
    pub name: String,
    pub line: usize,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedScreen {
    pub name: String,
    pub screen_type: ScreenType,
    pub line: Option<usize>,
    pub route: Option<String>,
}

pub struct ScreenDetector {
    class_def: Regex,
    function_def: Regex,
    arrow_def: Regex,
    hook_call: Regex,
    screen_dirs: Vec<String>,
    screen_suffixes: Vec<String>,
    modal_name_markers: Vec<String>,
    modal_content_markers: Vec<String>,
}

impl ScreenDetector {
    pub fn new(heuristics: &HeuristicsConfig) -> Result<Self> {
        Ok(Self {
            class_def: Regex::new(
                r"(?m)^[ \t]*(?:export\s+(?:default\s+)?)?class\s+([A-Z]\w*)\s+extends\s+(?:React\.)?(?:Pure)?Component\b",
            )?,
            function_def: Regex::new(
                r"(?m)^[ \t]*(?:export\s+(?:default\s+)?)?(?:async\s+)?function\s+([A-Z]\w*)\s*(?:<[^>]*>)?\s*\(",
            )?,
            arrow_def: Regex::new(
                r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+([A-Z]\w*)\s*(?::\s*[\w.<>\[\], ]+)?=\s*(?:React\.memo\(\s*)?(?:async\s*)?(?:\([^)]*\)|\w+)\s*(?::\s*[\w.<>\[\]]+\s*)?=>",
            )?,
            hook_call: Regex::new(r"\buse[A-Z]\w*\(")?,
            screen_dirs: heuristics
                .screen_dirs
                .iter()
                .map(|dir| {
                    let dir = dir.to_lowercase().replace('\\', "/");
                    if dir.starts_with('/') { dir } else { format!("/{}", dir) }
                })
                .collect(),
            screen_suffixes: heuristics.screen_suffixes.clone(),
            modal_name_markers: heuristics.modal_name_markers.clone(),
            modal_content_markers: heuristics.modal_content_markers.clone(),
        })
    }

    /// Component definitions in source order
    pub fn components(&self, content: &str) -> Vec<ComponentDef> {
        let index = LineIndex::new(content);
        let mut found: Vec<(usize, ComponentDef)> = Vec::new();

        let sources = [
            (&self.class_def, ComponentKind::Class),
            (&self.function_def, ComponentKind::Function),
            (&self.arrow_def, ComponentKind::Function),
        ];
        for (pattern, kind) in sources {
            for caps in pattern.captures_iter(content) {
                let Some(name) = caps.get(1) else { continue };
                found.push((
                    name.start(),
                    ComponentDef {
                        name: name.as_str().to_string(),
                        line: index.line_of(name.start()),
                        kind,
                    },
                ));
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, def)| def).collect()
    }

    /// At most one screen per file
    pub fn detect(
        &self,
        file: &SourceFile,
        content: &str,
        components: &[ComponentDef],
        navigators: &NavigatorIndex,
    ) -> Option<DetectedScreen> {
        let registered = components
            .iter()
            .find(|c| navigators.route_for(&c.name).is_some());
        let suffixed = || {
            components
                .iter()
                .find(|c| self.screen_suffixes.iter().any(|s| c.name.ends_with(s.as_str())))
        };

        let (name, chosen) = match registered.or_else(suffixed) {
            Some(component) => (component.name.clone(), Some(component)),
            None if self.in_screen_dir(file) => match components.first() {
                Some(component) => (component.name.clone(), Some(component)),
                None => (fallback_name(&file.relative)?, None),
            },
            None => return None,
        };

        let screen_type = self.screen_type(&name, content, chosen);
        Some(DetectedScreen {
            route: navigators.route_for(&name).map(|r| r.to_string()),
            line: chosen.map(|c| c.line),
            name,
            screen_type,
        })
    }

    fn screen_type(&self, name: &str, content: &str, chosen: Option<&ComponentDef>) -> ScreenType {
        let modal = self.modal_name_markers.iter().any(|m| name.contains(m.as_str()))
            || self.modal_content_markers.iter().any(|m| content.contains(m.as_str()));
        if modal {
            return ScreenType::Modal;
        }

        match chosen.map(|c| c.kind) {
            Some(ComponentKind::Class) => ScreenType::Class,
            Some(ComponentKind::Function) => ScreenType::Functional,
            None if self.class_def.is_match(content) => ScreenType::Class,
            None if self.hook_call.is_match(content) => ScreenType::Functional,
            None => ScreenType::Unknown,
        }
    }

    fn in_screen_dir(&self, file: &SourceFile) -> bool {
        let path = format!("/{}", file.normalized_path().to_lowercase());
        self.screen_dirs.iter().any(|dir| path.contains(dir.as_str()))
    }
}

/// `Home.js` → `Home`, `Home/index.js` → `Home`
fn fallback_name(relative: &Path) -> Option<String> {
    let stem = relative.file_stem()?.to_string_lossy().to_string();
    if stem != "index" {
        return Some(stem);
    }
    relative
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::FileKind;
    use std::path::PathBuf;

    fn detector() -> ScreenDetector {
        ScreenDetector::new(&HeuristicsConfig::default()).unwrap()
    }

    fn script(relative: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(relative),
            relative: PathBuf::from(relative),
            kind: FileKind::Script,
        }
    }

    fn detect(relative: &str, content: &str) -> Option<DetectedScreen> {
        let detector = detector();
        let components = detector.components(content);
        detector.detect(&script(relative), content, &components, &NavigatorIndex::default())
    }

    #[test]
    fn test_components_in_source_order() {
        let content = r#"
import React from 'react';

export default class ProfileScreen extends React.Component {
  render() { return null; }
}

function Avatar(props) { return null; }

export const Badge: React.FC<Props> = ({ label }) => null;
const helper = () => 1;
"#;
        let components = detector().components(content);
        let names: Vec<_> = components.iter().map(|c| (c.name.as_str(), c.line, c.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("ProfileScreen", 4, ComponentKind::Class),
                ("Avatar", 8, ComponentKind::Function),
                ("Badge", 10, ComponentKind::Function),
            ]
        );
    }

    #[test]
    fn test_suffix_marks_functional_screen() {
        let content = "const HomeScreen = () => {\n  const [a] = useState(0);\n  return null;\n};\n";
        let screen = detect("src/Home.js", content).unwrap();
        assert_eq!(screen.name, "HomeScreen");
        assert_eq!(screen.screen_type, ScreenType::Functional);
        assert_eq!(screen.line, Some(1));
        assert_eq!(screen.route, None);
    }

    #[test]
    fn test_class_and_modal_types() {
        let class = detect(
            "src/Settings.js",
            "class SettingsScreen extends PureComponent {}\n",
        )
        .unwrap();
        assert_eq!(class.screen_type, ScreenType::Class);

        let modal = detect(
            "src/Picker.js",
            "class PickerModalScreen extends Component {}\n",
        )
        .unwrap();
        assert_eq!(modal.screen_type, ScreenType::Modal);

        let by_content = detect(
            "src/Share.js",
            "function ShareScreen() {}\nconst options = { presentation: 'modal' };\n",
        )
        .unwrap();
        assert_eq!(by_content.screen_type, ScreenType::Modal);
    }

    #[test]
    fn test_screen_directory_fallbacks() {
        let named = detect("src/screens/Cart.js", "export default function Cart() {}\n").unwrap();
        assert_eq!(named.name, "Cart");

        let indexed = detect("app/screens/Checkout/index.js", "export default connect(mapState)(View);\n")
            .unwrap();
        assert_eq!(indexed.name, "Checkout");
        assert_eq!(indexed.screen_type, ScreenType::Unknown);
        assert_eq!(indexed.line, None);
    }

    #[test]
    fn test_plain_components_are_not_screens() {
        assert!(detect("src/components/Button.js", "export function Button() {}\n").is_none());
    }

    #[test]
    fn test_registered_component_wins() {
        let detector = detector();
        let indexer = crate::core::navigation::NavigatorIndexer::new(&HeuristicsConfig::default()).unwrap();
        let navigators = indexer.build([r#"<Stack.Screen name="Feed" component={FeedView} />"#]);

        let content = "function Header() {}\nexport default function FeedView() {}\n";
        let components = detector.components(content);
        let screen = detector
            .detect(&script("src/feed/FeedView.js"), content, &components, &navigators)
            .unwrap();
        assert_eq!(screen.name, "FeedView");
        assert_eq!(screen.route.as_deref(), Some("Feed"));
        assert_eq!(screen.line, Some(2));
    }
}
