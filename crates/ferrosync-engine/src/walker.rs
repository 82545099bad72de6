//! Source tree traversal shared by the estimate and copy passes

use ferrosync_types::CopyOutcome;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Depth-first walk below `root`, root itself excluded
///
/// Links are reported as links and never followed, so a link to a directory is not
/// descended into and cycles cannot occur. Siblings are visited in file name order.
pub fn source_walker(root: &Path) -> walkdir::IntoIter {
    WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
}

/// `path` relative to `root`; the join key between the two trees
pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Classify a traversal error
///
/// Errors without an underlying I/O error (link loops) can only occur when following
/// links, which the walker never does.
pub fn walk_error_outcome(error: &walkdir::Error) -> CopyOutcome {
    match error.io_error() {
        Some(io_error) => CopyOutcome::from_io_error(io_error),
        None => CopyOutcome::from_io_error(&io::Error::new(
            io::ErrorKind::Other,
            error.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_walk_order_and_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("b/z.txt"), b"z").unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("c.txt"), b"c").unwrap();

        let visited: Vec<PathBuf> = source_walker(root)
            .map(|entry| relative_path(root, entry.unwrap().path()))
            .collect();

        assert_eq!(
            visited,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b"),
                PathBuf::from("b").join("z.txt"),
                PathBuf::from("c.txt"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_links_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("dir")).unwrap();
        fs::write(root.join("dir/file.txt"), b"data").unwrap();
        std::os::unix::fs::symlink(root.join("dir"), root.join("link")).unwrap();
        std::os::unix::fs::symlink(root, root.join("dir/parent")).unwrap();

        let entries: Vec<_> = source_walker(root).map(Result::unwrap).collect();
        assert_eq!(entries.len(), 4);

        let link = entries
            .iter()
            .find(|entry| entry.file_name() == "link")
            .unwrap();
        assert!(link.file_type().is_symlink());
        assert!(link.path_is_symlink());
    }

    #[test]
    fn test_relative_path_outside_root() {
        assert_eq!(
            relative_path(Path::new("/src"), Path::new("/src/a/b.txt")),
            PathBuf::from("a/b.txt")
        );
        assert_eq!(
            relative_path(Path::new("/src"), Path::new("/other/b.txt")),
            PathBuf::from("/other/b.txt")
        );
    }
}
