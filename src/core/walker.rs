use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{ProjectConfig, ScanningConfig};
use crate::error::{CrossportError, Result};
use super::finding::{FileKind, SkippedFile, SourceFile};

/// An item produced while walking the project tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    File(SourceFile),
    Skipped(SkippedFile),
}

/// Enumerates recognised files under a project root in lexicographic order
pub struct FileWalker {
    root: PathBuf,
    excluded_dirs: BTreeSet<String>,
    ignore: Gitignore,
    by_extension: HashMap<String, FileKind>,
    by_name: HashMap<String, FileKind>,
}

impl FileWalker {
    pub fn new<P: AsRef<Path>>(
        root: P,
        project: &ProjectConfig,
        scanning: &ScanningConfig,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(CrossportError::RootNotFound(root));
        }
        std::fs::read_dir(&root).map_err(|source| CrossportError::RootUnreadable {
            path: root.clone(),
            source,
        })?;

        let mut builder = GitignoreBuilder::new(&root);
        if project.respect_gitignore {
            let gitignore = root.join(".gitignore");
            if gitignore.is_file() {
                if let Some(err) = builder.add(&gitignore) {
                    warn!("Ignoring unreadable .gitignore entries: {}", err);
                }
            }
        }
        for pattern in &project.exclude_globs {
            builder.add_line(None, pattern).map_err(|e| {
                CrossportError::Config(format!("invalid exclude glob '{}': {}", pattern, e))
            })?;
        }
        let ignore = builder
            .build()
            .map_err(|e| CrossportError::Config(format!("invalid exclusions: {}", e)))?;

        let mut by_extension = HashMap::new();
        let kinds = [
            (&scanning.script_extensions, FileKind::Script),
            (&scanning.property_list_extensions, FileKind::PropertyList),
            (&scanning.native_extensions, FileKind::NativeSource),
            (&scanning.image_extensions, FileKind::Image),
        ];
        for (extensions, kind) in kinds {
            for ext in extensions {
                by_extension.insert(ext.trim_start_matches('.').to_lowercase(), kind);
            }
        }

        let by_name = scanning
            .manifest_files
            .iter()
            .map(|name| (name.clone(), FileKind::Manifest))
            .collect();

        Ok(Self {
            root,
            excluded_dirs: project.exclude_dirs.iter().cloned().collect(),
            ignore,
            by_extension,
            by_name,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree; unreadable entries come back as `Skipped`
    pub fn walk(&self) -> impl Iterator<Item = WalkEntry> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || !self.is_excluded(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    self.source_file(entry.path()).map(WalkEntry::File)
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| self.relative(p))
                        .unwrap_or_default();
                    warn!("Skipping {}: {}", path.display(), err);
                    Some(WalkEntry::Skipped(SkippedFile {
                        path,
                        reason: err.to_string(),
                    }))
                }
            })
    }

    /// Recognised files only, dropping skipped entries
    pub fn files(&self) -> impl Iterator<Item = SourceFile> + '_ {
        self.walk().filter_map(|entry| match entry {
            WalkEntry::File(file) => Some(file),
            WalkEntry::Skipped(_) => None,
        })
    }

    /// Determine the kind of a file, if it is scanned at all
    pub fn kind_of(&self, path: &Path) -> Option<FileKind> {
        let name = path.file_name().and_then(|n| n.to_str())?;
        if let Some(kind) = self.by_name.get(name) {
            return Some(*kind);
        }

        let extension = path.extension().and_then(|ext| ext.to_str())?;
        self.by_extension.get(&extension.to_lowercase()).copied()
    }

    fn source_file(&self, path: &Path) -> Option<SourceFile> {
        let kind = self.kind_of(path)?;
        if self.ignore.matched(path, false).is_ignore() {
            debug!("Excluded by ignore rules: {}", path.display());
            return None;
        }

        Some(SourceFile {
            path: path.to_path_buf(),
            relative: self.relative(path),
            kind,
        })
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let is_dir = entry.file_type().is_dir();
        if is_dir {
            if let Some(name) = entry.file_name().to_str() {
                if self.excluded_dirs.contains(name) {
                    debug!("Excluded directory: {}", entry.path().display());
                    return true;
                }
            }
        }
        is_dir && self.ignore.matched(entry.path(), true).is_ignore()
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn walker(root: &Path) -> FileWalker {
        FileWalker::new(root, &ProjectConfig::default(), &ScanningConfig::default()).unwrap()
    }

    fn relative_paths(walker: &FileWalker) -> Vec<String> {
        walker
            .files()
            .map(|f| super::super::finding::normalize_path(&f.relative))
            .collect()
    }

    #[test]
    fn test_walk_is_lexicographic_and_filtered() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("src/b.js").write_str("b").unwrap();
        dir.child("src/a.tsx").write_str("a").unwrap();
        dir.child("README.md").write_str("docs").unwrap();
        dir.child("ios/App/Info.plist").write_str("<plist/>").unwrap();
        dir.child("ios/Podfile").write_str("pod 'X'").unwrap();
        dir.child("assets/logo@2x.png").write_binary(&[0x89, 0x50]).unwrap();

        let walker = walker(dir.path());
        assert_eq!(
            relative_paths(&walker),
            vec![
                "assets/logo@2x.png",
                "ios/App/Info.plist",
                "ios/Podfile",
                "src/a.tsx",
                "src/b.js",
            ]
        );
    }

    #[test]
    fn test_kinds_are_assigned() {
        let dir = assert_fs::TempDir::new().unwrap();
        let walker = walker(dir.path());
        assert_eq!(walker.kind_of(Path::new("a/App.TSX")), Some(FileKind::Script));
        assert_eq!(walker.kind_of(Path::new("Info.plist")), Some(FileKind::PropertyList));
        assert_eq!(walker.kind_of(Path::new("ios/Bridge.mm")), Some(FileKind::NativeSource));
        assert_eq!(walker.kind_of(Path::new("img/a.jpeg")), Some(FileKind::Image));
        assert_eq!(walker.kind_of(Path::new("ios/Podfile")), Some(FileKind::Manifest));
        assert_eq!(walker.kind_of(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_excluded_dirs_are_pruned() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("node_modules/lib/index.js").write_str("x").unwrap();
        dir.child("ios/Pods/Thing.m").write_str("x").unwrap();
        dir.child("src/App.js").write_str("x").unwrap();

        assert_eq!(relative_paths(&walker(dir.path())), vec!["src/App.js"]);
    }

    #[test]
    fn test_gitignore_and_globs_are_honoured() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child(".gitignore").write_str("generated/\n").unwrap();
        dir.child("generated/Api.js").write_str("x").unwrap();
        dir.child("src/App.js").write_str("x").unwrap();
        dir.child("src/App.stories.js").write_str("x").unwrap();

        let project = ProjectConfig {
            exclude_globs: vec!["*.stories.js".to_string()],
            ..ProjectConfig::default()
        };
        let walker = FileWalker::new(dir.path(), &project, &ScanningConfig::default()).unwrap();
        assert_eq!(relative_paths(&walker), vec!["src/App.js"]);

        let no_gitignore = ProjectConfig {
            respect_gitignore: false,
            ..ProjectConfig::default()
        };
        let walker = FileWalker::new(dir.path(), &no_gitignore, &ScanningConfig::default()).unwrap();
        assert_eq!(
            relative_paths(&walker),
            vec!["generated/Api.js", "src/App.js", "src/App.stories.js"]
        );
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = assert_fs::TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let result = FileWalker::new(&missing, &ProjectConfig::default(), &ScanningConfig::default());
        assert!(matches!(result, Err(CrossportError::RootNotFound(p)) if p == missing));
    }

    #[test]
    fn test_file_root_is_unreadable() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("App.js");
        file.write_str("x").unwrap();
        let result = FileWalker::new(file.path(), &ProjectConfig::default(), &ScanningConfig::default());
        assert!(matches!(result, Err(CrossportError::RootUnreadable { .. })));
    }
}
