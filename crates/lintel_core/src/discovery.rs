//! Expands the paths given on the command line into the files to check.

use std::path::{self, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{LintelError, RunOptions};

/// Name used on the command line for standard input.
pub const STDIN: &str = "-";

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, LintelError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            LintelError::config(format!("Invalid glob pattern '{}': {}", pattern, e))
        })?;
        builder.add(glob);
    }

    let globset = builder
        .build()
        .map_err(|e| LintelError::config(format!("Failed to build globset: {}", e)))?;

    Ok(Some(globset))
}

/// Makes patterns that name a path absolute, relative to the working
/// directory. Bare patterns such as `*.pyc` are kept as they are.
pub fn normalize_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|pattern| {
            if !pattern.contains('/') {
                return pattern.clone();
            }
            let trimmed = pattern.trim_end_matches('/');
            path::absolute(trimmed)
                .map(|absolute| absolute.to_string_lossy().into_owned())
                .unwrap_or_else(|_| trimmed.to_string())
        })
        .collect()
}

/// A compiled set of filename patterns.
///
/// A path matches when its basename or its absolute path does. `*` also
/// matches `/`.
#[derive(Debug, Clone, Default)]
pub struct FilenameMatcher {
    globs: Option<GlobSet>,
}

impl FilenameMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, LintelError> {
        Ok(Self {
            globs: build_globset(patterns)?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(globs) = &self.globs else {
            return false;
        };

        if path.file_name().is_some_and(|name| globs.is_match(name)) {
            return true;
        }
        match path::absolute(path) {
            Ok(absolute) => globs.is_match(absolute),
            Err(_) => globs.is_match(path),
        }
    }
}

/// Decides which paths are skipped and which discovered files are checked.
#[derive(Debug, Clone)]
pub struct PathFilter {
    exclude: FilenameMatcher,
    filename_patterns: Option<GlobSet>,
    stdin_display_name: String,
}

impl PathFilter {
    pub fn new(options: &RunOptions) -> Result<Self, LintelError> {
        Ok(Self {
            exclude: FilenameMatcher::new(&normalize_patterns(&options.all_excludes()))?,
            filename_patterns: build_globset(&options.filename_patterns)?,
            stdin_display_name: options.stdin_display_name.clone(),
        })
    }

    /// Returns true when `path` is excluded. Standard input is only
    /// excluded through a customised display name.
    pub fn is_excluded(&self, path: &str) -> bool {
        let candidate = if path == STDIN {
            if self.stdin_display_name == "stdin" {
                return false;
            }
            self.stdin_display_name.as_str()
        } else {
            path
        };

        let excluded = self.exclude.matches(Path::new(candidate));
        if excluded {
            debug!("{} has been excluded", candidate);
        }
        excluded
    }

    fn matches_patterns(&self, path: &Path) -> bool {
        self.filename_patterns
            .as_ref()
            .is_none_or(|globs| globs.is_match(path))
    }
}

/// Expands `options.filenames` (the current directory when empty) into
/// the ordered list of files to check.
///
/// Directories are walked in file-name order, pruning excluded
/// directories. Discovered files must match the filename patterns; a path
/// given explicitly is checked regardless. Excluded paths never come back.
pub fn expand_paths(options: &RunOptions) -> Result<Vec<String>, LintelError> {
    let filter = PathFilter::new(options)?;
    let defaults = [".".to_string()];
    let paths = if options.filenames.is_empty() {
        &defaults[..]
    } else {
        &options.filenames[..]
    };

    let mut files = Vec::new();
    for path in paths {
        if filter.is_excluded(path) {
            continue;
        }
        if path == STDIN || !Path::new(path).is_dir() {
            files.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !filter.is_excluded(&entry.path().to_string_lossy())
            });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() || !filter.matches_patterns(entry.path()) {
                continue;
            }
            files.push(entry.path().to_string_lossy().into_owned());
        }
    }

    info!("Discovered {} files to check", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x = 1\n").unwrap();
    }

    fn relative(root: &Path, files: Vec<String>) -> Vec<String> {
        files
            .into_iter()
            .map(|file| {
                Path::new(&file)
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_walk_is_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b.py");
        touch(dir.path(), "a.py");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "pkg/c.py");
        touch(dir.path(), ".git/hooks/d.py");
        touch(dir.path(), "__pycache__/e.py");

        let root = dir.path().to_string_lossy().to_string();
        let options = RunOptions::new().filenames(vec![root]);
        let files = relative(dir.path(), expand_paths(&options).unwrap());

        assert_eq!(files, vec!["a.py", "b.py", "pkg/c.py"]);
    }

    #[test]
    fn test_explicit_file_ignores_filename_patterns() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "script");
        let script = dir.path().join("script").to_string_lossy().to_string();

        let options = RunOptions::new().filenames(vec![script.clone()]);
        assert_eq!(expand_paths(&options).unwrap(), vec![script]);
    }

    #[test]
    fn test_exclude_by_absolute_path() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "keep/a.py");
        touch(dir.path(), "skip/b.py");

        let skip = dir.path().join("skip").to_string_lossy().to_string();
        let options = RunOptions::new()
            .filenames(vec![dir.path().to_string_lossy().to_string()])
            .extend_exclude(vec![skip]);
        let files = relative(dir.path(), expand_paths(&options).unwrap());

        assert_eq!(files, vec!["keep/a.py"]);
    }

    #[test]
    fn test_excluded_explicit_path_is_dropped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "gen.py");
        let generated = dir.path().join("gen.py").to_string_lossy().to_string();

        let options = RunOptions::new()
            .filenames(vec![generated])
            .extend_exclude(vec!["gen.py".to_string()]);
        assert!(expand_paths(&options).unwrap().is_empty());
    }

    #[test]
    fn test_stdin_is_kept_unless_display_name_excluded() {
        let options = RunOptions::new()
            .filenames(vec![STDIN.to_string()])
            .exclude(vec!["*".to_string()]);
        assert_eq!(expand_paths(&options).unwrap(), vec![STDIN]);

        let renamed = options.stdin_display_name("generated.py");
        assert!(expand_paths(&renamed).unwrap().is_empty());
    }

    #[test]
    fn test_missing_path_is_passed_through() {
        let options = RunOptions::new().filenames(vec!["/nonexistent/lintel.py".to_string()]);
        assert_eq!(
            expand_paths(&options).unwrap(),
            vec!["/nonexistent/lintel.py"]
        );
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let options = RunOptions::new().exclude(vec!["[invalid".to_string()]);
        assert!(matches!(
            expand_paths(&options),
            Err(LintelError::Config(_))
        ));
    }

    #[test]
    fn test_matcher_on_dot_paths() {
        let matcher = FilenameMatcher::new(&[".*".to_string()]).unwrap();
        assert!(matcher.matches(Path::new("./.hidden")));
        assert!(!matcher.matches(Path::new("/srv/project")));
    }
}
