use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::FilterConfig;
use crate::error::Error;

/// Decides which files and directories a scan may visit.
/// Pure predicate state; holds no handles and touches no filesystem.
pub struct PathFilter {
    excluded_dirs: Vec<String>,
    excluded_files: Vec<String>,
    extensions: Vec<String>,
}

impl PathFilter {
    /// Build a filter from the config's eligibility rules.
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            excluded_dirs: config.excluded_dirs.clone(),
            excluded_files: config.excluded_files.clone(),
            extensions: config.extensions.clone(),
        }
    }

    /// Whether a directory with this name is pruned before descent.
    fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| return d == name)
    }

    /// Whether a file with this name should be reviewed.
    ///
    /// Eligibility is a suffix match on the file name rather than a
    /// `Path::extension` comparison, so extensionless dotfiles such as
    /// `.env` can be allow-listed.
    fn is_eligible_file(&self, name: &str) -> bool {
        if self.excluded_files.iter().any(|f| return f == name) {
            return false;
        }
        self.extensions.iter().any(|ext| return name.ends_with(ext.as_str()))
    }
}

/// Enumerate every eligible file under `root`, sorted ascending by path.
///
/// Excluded directories are pruned before descent — their contents are
/// never visited, so a `node_modules` tree costs nothing and cannot
/// contribute eligible-looking files. No side effects; the result is a
/// pure function of filesystem state at call time.
///
/// # Errors
///
/// Returns `Error::RootNotFound` if `root` is not a directory, or
/// `Error::Walk` if an entry cannot be visited during enumeration.
pub fn collect_files(root: &Path, filter: &PathFilter) -> Result<Vec<PathBuf>, Error> {
    if !root.is_dir() {
        return Err(Error::RootNotFound { path: root.to_path_buf() });
    }

    let mut files: Vec<PathBuf> = Vec::new();

    let walk = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        return !filter.is_excluded_dir(&name);
    });

    for entry in walk {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if filter.is_eligible_file(&name) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn stock_filter() -> PathFilter {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        PathFilter::new(&config.filter)
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "content").unwrap();
    }

    #[test]
    fn collects_only_allow_listed_suffixes_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("zeta.js"));
        touch(&dir.path().join("alpha.ts"));
        touch(&dir.path().join("notes.md"));
        touch(&dir.path().join("binary.png"));

        let files = collect_files(dir.path(), &stock_filter()).unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| return p.file_name())
            .map(|n| return n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha.ts", "zeta.js"]);
    }

    #[test]
    fn excluded_directories_are_pruned_not_descended() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/app.js"));
        touch(&dir.path().join("node_modules/lib/index.js"));
        touch(&dir.path().join("dist/bundle.js"));

        let files = collect_files(dir.path(), &stock_filter()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.iter().all(|p| {
            return p.components().all(|c| {
                return c.as_os_str() != "node_modules" && c.as_os_str() != "dist";
            });
        }));
    }

    #[test]
    fn excluded_file_names_are_skipped_even_with_eligible_suffix() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("package.json"));
        touch(&dir.path().join("package-lock.json"));

        let files = collect_files(dir.path(), &stock_filter()).unwrap();
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| return p.file_name())
            .map(|n| return n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["package.json"]);
    }

    #[test]
    fn dotfile_suffixes_match_on_the_whole_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join(".env"));

        let files = collect_files(dir.path(), &stock_filter()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_root_is_reported_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("backend");
        assert!(matches!(
            collect_files(&missing, &stock_filter()),
            Err(Error::RootNotFound { .. })
        ));
    }
}
