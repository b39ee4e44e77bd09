//! Migration and management-command discovery on disk.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};
use wick::AdapterError;

use super::CommandIndex;

/// A `.py` file attributed to the app directory that contains it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectFile {
    pub app: String,
    pub name: String,
}

#[derive(Debug)]
pub struct ProjectTree {
    root: PathBuf,
}

impl ProjectTree {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect `<app>/<subdir...>/<name>.py` files accepted by `keep`.
    fn scan(&self, subdir: &[&str], keep: impl Fn(&str) -> bool) -> Result<Vec<ProjectFile>, AdapterError> {
        if !self.root.is_dir() {
            return Err(AdapterError::unavailable(format!(
                "project root {} is not a directory",
                self.root.display()
            )));
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

        for entry in walker {
            let entry = entry.map_err(|e| AdapterError::failed(format!("walking project: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("py") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !keep(stem) {
                continue;
            }

            let Some(parent) = path.parent() else { continue };
            if let Some(app) = app_for(parent, subdir) {
                found.push(ProjectFile {
                    app,
                    name: stem.to_string(),
                });
            }
        }

        found.sort();
        Ok(found)
    }
}

/// Hidden directories and bytecode caches.
fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || name == "__pycache__")
}

/// Return the app name if `dir` ends with `<app>/<subdir...>`.
fn app_for(dir: &Path, subdir: &[&str]) -> Option<String> {
    let mut current = dir;
    for expected in subdir.iter().rev() {
        if current.file_name()?.to_str()? != *expected {
            return None;
        }
        current = current.parent()?;
    }
    current.file_name()?.to_str().map(str::to_string)
}

impl CommandIndex for ProjectTree {
    fn migration_files(&self) -> Result<Vec<ProjectFile>, AdapterError> {
        self.scan(&["migrations"], |stem| stem != "__init__")
    }

    fn command_files(&self) -> Result<Vec<ProjectFile>, AdapterError> {
        let mut files = self.scan(&["management", "commands"], |stem| !stem.starts_with('_'))?;
        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.app.cmp(&b.app)));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discovers_migrations_and_commands() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "blog/migrations/__init__.py");
        touch(root, "blog/migrations/0002_tags.py");
        touch(root, "blog/migrations/0001_initial.py");
        touch(root, "blog/migrations/__pycache__/0001_initial.py");
        touch(root, "shop/migrations/0001_initial.py");
        touch(root, "blog/management/commands/_private.py");
        touch(root, "blog/management/commands/publish.py");
        touch(root, "shop/management/commands/restock.py");
        touch(root, ".venv/lib/pkg/migrations/0001_initial.py");
        touch(root, "blog/views.py");

        let tree = ProjectTree::new(root);
        let migrations = tree.migration_files().unwrap();
        let names: Vec<_> = migrations
            .iter()
            .map(|f| format!("{}.{}", f.app, f.name))
            .collect();
        assert_eq!(
            names,
            vec!["blog.0001_initial", "blog.0002_tags", "shop.0001_initial"]
        );

        let commands = tree.command_files().unwrap();
        let names: Vec<_> = commands.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["publish", "restock"]);
        assert_eq!(commands[0].app, "blog");
    }

    #[test]
    fn test_missing_root_is_unavailable() {
        let tree = ProjectTree::new(Path::new("/nonexistent/project"));
        let err = tree.migration_files().unwrap_err();
        assert!(matches!(err, AdapterError::Unavailable(_)));
    }
}
