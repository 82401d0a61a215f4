//! Input Discovery
//!
//! Explicit file arguments are taken as given, even when unsupported, so
//! every named input still produces a result. Directories are walked with
//! `ignore` and keep only supported extensions.

use ignore::WalkBuilder;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::extraction::DocumentFormat;
use crate::types::Result;

/// Per-directory ignore file, in addition to `.gitignore`
pub const IGNORE_FILE: &str = ".docfilerignore";

/// Expand arguments into document paths, preserving order.
///
/// Explicit paths pass through one for one, repeats included. Files found by
/// walking a directory are skipped once already collected.
pub fn collect_inputs(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for arg in args {
        if arg.is_dir() {
            for path in walk_directory(arg) {
                if seen.insert(path.clone()) {
                    inputs.push(path);
                }
            }
        } else {
            seen.insert(arg.clone());
            inputs.push(arg.clone());
        }
    }

    debug!("Collected {} inputs from {} arguments", inputs.len(), args.len());
    Ok(inputs)
}

/// Supported documents under `root`, sorted by path
pub fn walk_directory(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .add_custom_ignore_filename(IGNORE_FILE)
        .follow_links(false)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| DocumentFormat::is_supported(path))
        .collect();

    files.sort();
    files
}

/// Newline-separated paths; blank lines and `#` comments are skipped
pub fn read_batch<R: BufRead>(reader: R) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(trimmed));
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "content").unwrap();
        path
    }

    #[test]
    fn test_walk_keeps_supported_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "b.pdf");
        touch(root, "a.txt");
        touch(root, "photo.jpg");
        touch(root, "nested/c.md");
        touch(root, ".hidden/d.pdf");

        let files = walk_directory(root);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.pdf", "nested/c.md"]);
    }

    #[test]
    fn test_custom_ignore_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "keep.pdf");
        touch(root, "drafts/skip.pdf");
        fs::write(root.join(IGNORE_FILE), "drafts/\n").unwrap();

        let files = walk_directory(root);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.pdf"));
    }

    #[test]
    fn test_explicit_files_kept_even_if_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let photo = touch(root, "photo.jpg");
        let doc = touch(root, "dir/doc.pdf");

        let inputs =
            collect_inputs(&[photo.clone(), root.join("dir"), doc.clone(), photo.clone()])
                .unwrap();
        assert_eq!(inputs, vec![photo.clone(), doc.clone(), doc, photo]);
    }

    #[test]
    fn test_repeated_batch_lines_each_yield_an_input() {
        let paths = read_batch("a.txt\na.txt\n".as_bytes()).unwrap();
        let inputs = collect_inputs(&paths).unwrap();
        assert_eq!(inputs, vec![PathBuf::from("a.txt"), PathBuf::from("a.txt")]);
    }

    #[test]
    fn test_walked_files_skip_already_collected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let doc = touch(root, "dir/doc.pdf");

        let inputs =
            collect_inputs(&[root.join("dir"), root.join("dir"), doc.clone()]).unwrap();
        assert_eq!(inputs, vec![doc.clone(), doc]);
    }

    #[test]
    fn test_read_batch() {
        let input = "a.pdf\n\n# comment\n  b.txt  \n";
        let paths = read_batch(input.as_bytes()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.txt")]);
    }
}
