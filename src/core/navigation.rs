use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::HeuristicsConfig;
use crate::error::Result;
use super::lines::LineIndex;

/// Component name → route name, gathered from navigator declarations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatorIndex {
    routes: BTreeMap<String, String>,
}

impl NavigatorIndex {
    pub fn route_for(&self, component: &str) -> Option<&str> {
        self.routes.get(component).map(|r| r.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn register(&mut self, route: &str, component: &str) {
        // Nested navigators are containers, not screens
        if looks_like_navigator(component) {
            return;
        }
        self.routes
            .entry(component.to_string())
            .or_insert_with(|| route.to_string());
    }
}

fn looks_like_navigator(name: &str) -> bool {
    ["Navigator", "Stack", "Drawer", "Tab", "Tabs"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Finds route registrations in JSX and object-style navigator configs
pub struct NavigatorIndexer {
    name_first: Regex,
    component_first: Regex,
    object_start: Regex,
    object_entry: Regex,
}

impl NavigatorIndexer {
    pub fn new(heuristics: &HeuristicsConfig) -> Result<Self> {
        let navigators = alternation(&heuristics.navigator_names);
        Ok(Self {
            name_first: Regex::new(&format!(
                r#"<(?:{})\.Screen\b[^>]*?\bname=["']([^"']+)["'][^>]*?\bcomponent=\{{\s*([A-Za-z_]\w*)\s*\}}"#,
                navigators
            ))?,
            component_first: Regex::new(&format!(
                r#"<(?:{})\.Screen\b[^>]*?\bcomponent=\{{\s*([A-Za-z_]\w*)\s*\}}[^>]*?\bname=["']([^"']+)["']"#,
                navigators
            ))?,
            object_start: Regex::new(r"create\w*Navigator\(\s*\{")?,
            object_entry: Regex::new(r"(\w+)\s*:\s*(?:\{\s*screen\s*:\s*)?([A-Z]\w*)")?,
        })
    }

    pub fn index_file(&self, content: &str, index: &mut NavigatorIndex) {
        for caps in self.name_first.captures_iter(content) {
            index.register(&caps[1], &caps[2]);
        }
        for caps in self.component_first.captures_iter(content) {
            index.register(&caps[2], &caps[1]);
        }

        for start in self.object_start.find_iter(content) {
            let Some(body) = balanced_body(&content[start.end()..]) else {
                continue;
            };
            for caps in self.object_entry.captures_iter(body) {
                if &caps[1] != "screen" {
                    index.register(&caps[1], &caps[2]);
                }
            }
        }
    }

    pub fn build<'a, I>(&self, contents: I) -> NavigatorIndex
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = NavigatorIndex::default();
        for content in contents {
            self.index_file(content, &mut index);
        }
        index
    }
}

/// Text up to the brace closing an already-opened object literal
fn balanced_body(after_open: &str) -> Option<&str> {
    let mut depth = 1usize;
    for (i, c) in after_open.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&after_open[..i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn alternation(words: &[String]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

/// A navigation call with a literal target route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NavigationCall {
    pub line: usize,
    pub action: String,
    pub target: String,
}

/// Extracts `navigation.navigate('Target')` style calls
pub struct NavigationExtractor {
    patterns: Vec<Regex>,
}

impl NavigationExtractor {
    pub fn new(heuristics: &HeuristicsConfig) -> Result<Self> {
        let actions = alternation(&heuristics.navigation_actions);
        let patterns = vec![
            // navigation.navigate('Route'), props.navigation.push("Route")
            format!(r#"\bnavigation\??\.({})\(\s*['"]([^'"]+)['"]"#, actions),
            // navigation.navigate({ name: 'Route' })
            format!(r#"\bnavigation\??\.({})\(\s*\{{\s*name\s*:\s*['"]([^'"]+)['"]"#, actions),
            // const {{ navigate }} = navigation; navigate('Route')
            format!(r#"(?:^|[^.\w$])({})\(\s*['"]([^'"]+)['"]"#, actions),
        ];

        Ok(Self {
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        })
    }

    /// Calls ordered by line, one per (line, action, target)
    pub fn extract(&self, content: &str) -> Vec<NavigationCall> {
        let index = LineIndex::new(content);
        let mut calls = BTreeSet::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(content) {
                let (Some(action), Some(target)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                if target.as_str().trim().is_empty() {
                    continue;
                }
                calls.insert(NavigationCall {
                    line: index.line_of(action.start()),
                    action: action.as_str().to_string(),
                    target: target.as_str().to_string(),
                });
            }
        }

        calls.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> NavigatorIndexer {
        NavigatorIndexer::new(&HeuristicsConfig::default()).unwrap()
    }

    fn extractor() -> NavigationExtractor {
        NavigationExtractor::new(&HeuristicsConfig::default()).unwrap()
    }

    #[test]
    fn test_jsx_routes_are_indexed() {
        let content = r#"
<Stack.Navigator>
  <Stack.Screen name="Home" component={HomeScreen} />
  <Stack.Screen component={ProfileView} name='Profile' />
  <Tab.Screen name="Settings" component={SettingsTabs} />
</Stack.Navigator>
"#;
        let index = indexer().build([content]);
        assert_eq!(index.route_for("HomeScreen"), Some("Home"));
        assert_eq!(index.route_for("ProfileView"), Some("Profile"));
        assert_eq!(index.route_for("SettingsTabs"), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_object_routes_are_indexed() {
        let content = r#"
const AppNavigator = createStackNavigator({
  Home: HomeScreen,
  Details: { screen: DetailsPage },
  Nested: AccountStack,
});
"#;
        let index = indexer().build([content]);
        assert_eq!(index.route_for("HomeScreen"), Some("Home"));
        assert_eq!(index.route_for("DetailsPage"), Some("Details"));
        assert_eq!(index.route_for("AccountStack"), None);
    }

    #[test]
    fn test_first_registration_wins() {
        let a = r#"<Stack.Screen name="Home" component={HomeScreen} />"#;
        let b = r#"<Drawer.Screen name="Start" component={HomeScreen} />"#;
        let index = indexer().build([a, b]);
        assert_eq!(index.route_for("HomeScreen"), Some("Home"));
    }

    #[test]
    fn test_navigation_calls_are_extracted() {
        let content = r#"
const go = () => navigation.navigate('Details');
props.navigation.push("Profile");
this.props.navigation.replace('Login');
navigation.navigate({ name: 'Settings' });
const { navigate } = navigation;
navigate('Cart');
items.push('not a route');
navigation.goBack();
"#;
        let calls = extractor().extract(content);
        let summary: Vec<_> = calls
            .iter()
            .map(|c| (c.line, c.action.as_str(), c.target.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (2, "navigate", "Details"),
                (3, "push", "Profile"),
                (4, "replace", "Login"),
                (5, "navigate", "Settings"),
                (7, "navigate", "Cart"),
            ]
        );
    }
}
