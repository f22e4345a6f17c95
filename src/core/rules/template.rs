use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::core::finding::SourceFile;

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{(match|file|stem|\d+)(?::(upper|lower))?\}")
            .expect("Invalid placeholder regex")
    })
}

/// Values a remediation or attribute template can refer to
pub struct TemplateContext<'a> {
    pub captures: Option<&'a Captures<'a>>,
    pub matched: &'a str,
    pub file: &'a SourceFile,
}

/// Render `{match}`, `{N}`, `{file}` and `{stem}` placeholders, optionally
/// suffixed with `:upper` or `:lower`. Unknown placeholders are kept as-is.
pub fn render(template: &str, ctx: &TemplateContext<'_>) -> String {
    if !template.contains('{') {
        return template.to_string();
    }

    placeholder()
        .replace_all(template, |caps: &Captures<'_>| {
            let value = match &caps[1] {
                "match" => ctx.matched.to_string(),
                "file" => ctx.file.normalized_path(),
                "stem" => ctx.file.stem(),
                index => index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| ctx.captures.and_then(|c| c.get(i)))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            };

            match caps.get(2).map(|m| m.as_str()) {
                Some("upper") => value.to_uppercase(),
                Some("lower") => value.to_lowercase(),
                _ => value,
            }
        })
        .into_owned()
}

/// Placeholders referring to capture groups the pattern does not have
pub fn missing_groups(template: &str, group_count: usize) -> Vec<usize> {
    placeholder()
        .captures_iter(template)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .filter(|index| *index >= group_count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::FileKind;
    use std::path::PathBuf;

    fn file() -> SourceFile {
        SourceFile {
            path: PathBuf::from("/app/src/api/client.js"),
            relative: PathBuf::from("src/api/client.js"),
            kind: FileKind::Script,
        }
    }

    #[test]
    fn test_render_captures_and_modifiers() {
        let re = Regex::new(r"axios\.(get|post)\('([^']+)'").unwrap();
        let text = "axios.post('/users')";
        let caps = re.captures(text).unwrap();
        let file = file();
        let ctx = TemplateContext {
            captures: Some(&caps),
            matched: caps.get(0).unwrap().as_str(),
            file: &file,
        };

        assert_eq!(render("{1:upper} {2}", &ctx), "POST /users");
        assert_eq!(render("in {file} ({stem})", &ctx), "in src/api/client.js (client)");
        assert_eq!(render("{match}", &ctx), "axios.post('/users'");
    }

    #[test]
    fn test_render_leaves_other_braces_alone() {
        let file = file();
        let ctx = TemplateContext { captures: None, matched: "x", file: &file };
        assert_eq!(
            render("Use Platform.select({ ios, android }) {unknown}", &ctx),
            "Use Platform.select({ ios, android }) {unknown}"
        );
        assert_eq!(render("missing {3}", &ctx), "missing ");
    }

    #[test]
    fn test_missing_groups() {
        assert_eq!(missing_groups("{0} {1} {4}", 2), vec![4]);
        assert!(missing_groups("{match}", 1).is_empty());
    }
}
