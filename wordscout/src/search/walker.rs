use ignore::{Walk, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{Result, ScanError};

/// Lazily yields every regular file below a root directory.
///
/// No ignore files, hidden-file rules or type filters apply. Entries are
/// visited sorted by file name within each directory, so the order is stable
/// for an unchanged tree. Links to files are always yielded; links to
/// directories are only traversed when `follow_links` is set. Link cycles,
/// broken links and unreadable entries are skipped and counted in
/// [`FileWalker::skipped`].
pub struct FileWalker {
    inner: Walk,
    skipped: usize,
}

impl FileWalker {
    /// Validates `root` and prepares the walk. Fails before any file is
    /// produced if `root` is missing or not a directory.
    pub fn new(root: &Path, follow_links: bool) -> Result<Self> {
        let metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::not_a_directory(root));
        }

        debug!("Walking directory: {}", root.display());
        let inner = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        Ok(Self { inner, skipped: 0 })
    }

    /// Entries skipped so far because they could not be read
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for FileWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        return Some(entry.into_path());
                    }
                    // Unfollowed links still count when they point at a file
                    if entry.path_is_symlink() {
                        match std::fs::metadata(entry.path()) {
                            Ok(target) if target.is_file() => return Some(entry.into_path()),
                            Ok(_) => {}
                            Err(err) => {
                                warn!("Skipping broken link {}: {}", entry.path().display(), err);
                                self.skipped += 1;
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!("Skipping directory entry: {}", err);
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Collects all file paths under `root`, returning them with the number of
/// skipped entries
pub fn enumerate(root: &Path, follow_links: bool) -> Result<(Vec<PathBuf>, usize)> {
    let mut walker = FileWalker::new(root, follow_links)?;
    let files: Vec<PathBuf> = walker.by_ref().collect();
    Ok((files, walker.skipped()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_recursive_enumeration() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("nested/b.txt"), "b").unwrap();
        fs::write(dir.path().join("nested/deeper/c.txt"), "c").unwrap();

        let (files, skipped) = enumerate(dir.path(), false).unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(skipped, 0);
        assert!(files.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_no_filters_applied() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), "x").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(dir.path().join("debug.log"), "x").unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/out.txt"), "x").unwrap();

        let (files, _) = enumerate(dir.path(), false).unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_stable_order() {
        let dir = tempdir().unwrap();
        for name in ["zeta.txt", "alpha.txt", "mid.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let (first, _) = enumerate(dir.path(), false).unwrap();
        let (second, _) = enumerate(dir.path(), false).unwrap();
        assert_eq!(first, second);
        assert!(first[0].ends_with("alpha.txt"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let (files, skipped) = enumerate(dir.path(), false).unwrap();
        assert!(files.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_missing_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            FileWalker::new(&missing, false),
            Err(ScanError::Io { .. })
        ));
    }

    #[test]
    fn test_root_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        assert!(matches!(
            FileWalker::new(&file, false),
            Err(ScanError::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let (files, skipped) = enumerate(dir.path(), true).unwrap();
        assert_eq!(files.len(), 1);
        assert!(skipped >= 1);

        let (files, skipped) = enumerate(dir.path(), false).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(skipped, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_link_to_outside_file() {
        let base = tempdir().unwrap();
        let root = base.path().join("root");
        let other = base.path().join("other");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&other).unwrap();
        fs::write(root.join("a.txt"), "cat").unwrap();
        fs::write(other.join("real.txt"), "cat cat").unwrap();
        std::os::unix::fs::symlink(other.join("real.txt"), root.join("link.txt")).unwrap();

        for follow_links in [false, true] {
            let (files, skipped) = enumerate(&root, follow_links).unwrap();
            assert_eq!(files, vec![root.join("a.txt"), root.join("link.txt")]);
            assert_eq!(skipped, 0);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_link_is_counted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("dangling"))
            .unwrap();

        let (files, skipped) = enumerate(dir.path(), false).unwrap();
        assert_eq!(files, vec![dir.path().join("a.txt")]);
        assert_eq!(skipped, 1);
    }
}
