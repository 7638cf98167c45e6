//! Directory traversal with the dot-file policy applied.
//!
//! Every regular file below the extension root is visited once, in a stable
//! order (entries sorted by file name within each directory). Hidden files
//! and anything below a hidden directory are dropped unless the hidden
//! segment is one of the permitted names.

use crate::error::{PackError, Result};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Hidden file names that are still shipped with an extension.
pub const PERMITTED_DOT_FILES: &[&str] = &[".htaccess", ".htpasswd"];

/// Options for directory walking
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Follow symbolic links to directories
    pub follow_links: bool,

    /// Dot-prefixed segment names that are not filtered out
    pub permitted_dot_files: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            follow_links: false,
            permitted_dot_files: PERMITTED_DOT_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl WalkOptions {
    /// True when `segment` is hidden and not on the permitted list.
    pub fn is_excluded_segment(&self, segment: &str) -> bool {
        segment.starts_with('.') && !self.permitted_dot_files.iter().any(|p| p == segment)
    }

    /// Dot-file policy over the segments of a path relative to the root.
    ///
    /// Each segment is checked on its own, so `.secret/config.php` is
    /// rejected even though `config.php` is not hidden.
    pub fn is_path_permitted<'a, I>(&self, segments: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .all(|s| !self.is_excluded_segment(s))
    }
}

/// Information about a file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// Path relative to the root, `/`-separated, no leading separator
    pub relative_path: String,

    /// Reached through a symlink to a regular file
    pub(crate) is_symlink: bool,
}

impl FileInfo {
    /// Create FileInfo from a DirEntry.
    /// Returns None for anything that is not a regular file or a symlink
    /// resolving to one (directories, sockets, FIFOs, devices, broken links).
    fn from_entry(entry: &DirEntry, root: &Path) -> Option<Self> {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }

        let path = entry.path().to_path_buf();
        let is_symlink = file_type.is_symlink();

        if is_symlink {
            match std::fs::metadata(&path) {
                Ok(resolved) if resolved.is_file() => {}
                Ok(_) => {
                    debug!("Skipping symlink to non-file: {}", path.display());
                    return None;
                }
                Err(e) => {
                    warn!("Skipping broken symlink {}: {}", path.display(), e);
                    return None;
                }
            }
        } else if !file_type.is_file() {
            debug!("Skipping special file: {}", path.display());
            return None;
        }

        let relative_path = relative_segments(&path, root).join("/");

        Some(Self {
            path,
            relative_path,
            is_symlink,
        })
    }
}

/// Path segments of `path` below `root`.
pub fn relative_segments(path: &Path, root: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Filter a list of `/`-separated relative paths through the dot-file policy.
///
/// Used where the file list does not come from a real directory walk.
pub fn filter_permitted<'a>(options: &WalkOptions, paths: &[&'a str]) -> Vec<&'a str> {
    paths
        .iter()
        .copied()
        .filter(|p| options.is_path_permitted(p.split('/')))
        .collect()
}

fn walk_error(err: walkdir::Error, root: &Path) -> PackError {
    let message = err.to_string();
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = err.into_io_error().unwrap_or_else(|| io::Error::other(message));
    PackError::filesystem(path, source)
}

/// Walk a directory tree with a callback for each permitted file
///
/// # Arguments
/// * `root` - Extension root to walk
/// * `options` - Walking options
/// * `callback` - Called for each permitted file, in walk order
///
/// # Returns
/// * `Ok(())` - If the walk completed and every callback succeeded
/// * `Err(PackError)` - The first walk or callback failure
pub fn walk_directory_with_callback<F>(root: &Path, options: &WalkOptions, mut callback: F) -> Result<()>
where
    F: FnMut(FileInfo) -> Result<()>,
{
    // Hidden directories are pruned, so nothing below them is read.
    let walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            let excluded = entry.depth() > 0 && options.is_excluded_segment(&name);
            if excluded {
                debug!("Excluding hidden path: {}", entry.path().display());
            }
            !excluded
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(e, root))?;

        if entry.depth() == 0 {
            continue;
        }

        if let Some(file_info) = FileInfo::from_entry(&entry, root) {
            callback(file_info)?;
        }
    }

    Ok(())
}

/// Walk a directory tree and collect all permitted files
///
/// # Example
/// ```no_run
/// use ext_packer::fs::walker::{walk_directory, WalkOptions};
/// use std::path::Path;
///
/// let files = walk_directory(Path::new("/path/to/extension"), &WalkOptions::default()).unwrap();
/// println!("Found {} files", files.len());
/// ```
pub fn walk_directory(root: &Path, options: &WalkOptions) -> Result<Vec<FileInfo>> {
    let mut files = Vec::new();
    walk_directory_with_callback(root, options, |file| {
        files.push(file);
        Ok(())
    })?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[FileInfo]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn test_segment_policy_without_filesystem() {
        let options = WalkOptions::default();
        let listing = [
            "a.txt",
            ".htaccess",
            ".htpasswd",
            ".secret/config.php",
            ".git/HEAD",
            "Resources/Public/.htaccess",
            "Resources/.cache/.htaccess",
            "Classes/Controller.php",
            ".DS_Store",
        ];

        assert_eq!(
            filter_permitted(&options, &listing),
            vec![
                "a.txt",
                ".htaccess",
                ".htpasswd",
                "Resources/Public/.htaccess",
                "Classes/Controller.php",
            ]
        );
    }

    #[test]
    fn test_permitted_name_as_directory_is_allowed() {
        let options = WalkOptions::default();
        assert!(options.is_path_permitted([".htaccess", "file.txt"]));
        assert!(!options.is_path_permitted(["dir", ".hidden", "file.txt"]));
    }

    #[test]
    fn test_walk_empty_directory() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let files = walk_directory(temp_dir.path(), &WalkOptions::default()).unwrap();
        assert!(files.is_empty());
        Ok(())
    }

    #[test]
    fn test_walk_applies_dot_file_policy() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), b"a")?;
        fs::write(root.join(".htaccess"), b"deny")?;
        fs::write(root.join(".htpasswd"), b"user:pass")?;
        fs::create_dir(root.join(".secret"))?;
        fs::write(root.join(".secret/config.php"), b"<?php")?;
        fs::create_dir_all(root.join("Classes/Domain"))?;
        fs::write(root.join("Classes/Domain/Model.php"), b"<?php")?;

        let files = walk_directory(root, &WalkOptions::default()).unwrap();
        let mut found = names(&files);
        found.sort();
        assert_eq!(
            found,
            vec![".htaccess", ".htpasswd", "Classes/Domain/Model.php", "a.txt"]
        );
        Ok(())
    }

    #[test]
    fn test_walk_order_is_stable() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        for name in ["b.txt", "a.txt", "c.txt"] {
            fs::write(root.join(name), name)?;
        }

        let first = walk_directory(root, &WalkOptions::default()).unwrap();
        let second = walk_directory(root, &WalkOptions::default()).unwrap();
        assert_eq!(names(&first), vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(names(&first), names(&second));
        Ok(())
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::create_dir_all(root.join("Resources/Private/Templates"))?;
        fs::write(root.join("Resources/Private/Templates/List.html"), b"<f:render />")?;

        let files = walk_directory(root, &WalkOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["Resources/Private/Templates/List.html"]);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_broken_symlink_is_skipped() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::write(root.join("real.txt"), b"real")?;
        std::os::unix::fs::symlink(root.join("missing.txt"), root.join("dangling.txt"))?;
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt"))?;

        let files = walk_directory(root, &WalkOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["link.txt", "real.txt"]);
        assert!(files[0].is_symlink);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_socket_is_skipped() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::write(root.join("real.txt"), b"real")?;
        let _listener = std::os::unix::net::UnixListener::bind(root.join("dev.sock"))?;

        let files = walk_directory(root, &WalkOptions::default()).unwrap();
        assert_eq!(names(&files), vec!["real.txt"]);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_hidden_directory_is_not_descended() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), b"a")?;
        fs::create_dir(root.join(".cache"))?;
        // Following this link would report a filesystem loop.
        std::os::unix::fs::symlink(root.join(".cache"), root.join(".cache/loop"))?;

        let options = WalkOptions {
            follow_links: true,
            ..WalkOptions::default()
        };
        let files = walk_directory(root, &options).unwrap();
        assert_eq!(names(&files), vec!["a.txt"]);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_link_loop_outside_hidden_directory_fails() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::create_dir(root.join("cache"))?;
        std::os::unix::fs::symlink(root.join("cache"), root.join("cache/loop"))?;

        let options = WalkOptions {
            follow_links: true,
            ..WalkOptions::default()
        };
        let err = walk_directory(root, &options).unwrap_err();
        assert!(matches!(err, PackError::Filesystem { .. }));
        Ok(())
    }

    #[test]
    fn test_unreadable_root_is_filesystem_error() {
        let err = walk_directory(Path::new("/nonexistent/extension/root"), &WalkOptions::default())
            .unwrap_err();
        assert!(matches!(err, PackError::Filesystem { .. }));
    }
}
