//! Image validation and class-folder scanning.
//!
//! Validation is destructive: a file that fails to decode is deleted on
//! the spot. Re-running over an already-pruned tree removes nothing.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::ClassImageSet;
use crate::utils::error::{Error, Result};

/// Outcome of scanning a class root: the surviving paths per class and
/// the files deleted along the way.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Surviving image paths grouped by class name, in sorted class order.
    pub classes: ClassImageSet,
    /// Files removed because they failed validation.
    pub removed: Vec<PathBuf>,
}

impl ScanReport {
    /// Total number of surviving images across all classes.
    pub fn total_valid(&self) -> usize {
        self.classes.values().map(|v| v.len()).sum()
    }

    /// Number of class directories found.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }
}

/// Check that a file decodes as a well-formed image.
///
/// Returns `Ok(true)` with no side effect when the file decodes. On any
/// open or decode failure (missing file, corrupt data, unrecognized
/// format) the file is deleted from disk and `Ok(false)` is returned.
/// A deletion that fails because the file is already gone is ignored;
/// any other deletion failure is propagated.
///
/// Not safe to retry after a failure: the file no longer exists.
pub fn validate_image(path: &Path) -> Result<bool> {
    match image::open(path) {
        Ok(_) => Ok(true),
        Err(err) => {
            warn!("invalid or corrupt image {}: {}", path.display(), err);
            match fs::remove_file(path) {
                Ok(()) => info!("removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(e)),
            }
            Ok(false)
        }
    }
}

/// Scan a root directory of class subfolders, validating every file.
///
/// Each immediate subdirectory of `root` is a class; its immediate
/// regular files are validated via [`validate_image`], which deletes the
/// ones that fail. Every file is checked, with no extension filter, so
/// stray non-image files are removed too. Classes whose files all fail
/// keep an empty entry in the result: the caller decides whether an
/// empty class is fatal.
///
/// An empty result (no subdirectories at all) is returned as-is; the
/// caller must treat it as a terminal condition rather than proceed.
pub fn scan_classes(root: &Path) -> Result<ScanReport> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!(
            "class root directory {}",
            root.display()
        )));
    }

    let mut classes = ClassImageSet::new();
    let mut removed = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let class_name = entry
            .file_name()
            .to_str()
            .ok_or_else(|| {
                Error::InvalidArgument(format!("class directory name is not valid UTF-8: {:?}", entry.file_name()))
            })?
            .to_string();

        if class_name.starts_with('.') {
            debug!("skipping hidden directory {}", class_name);
            continue;
        }

        // Immediate files only; sorted so validation order (and any
        // later seeded shuffle over the survivors) is reproducible.
        let mut files: Vec<PathBuf> = WalkDir::new(entry.path())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut valid = Vec::new();
        let removed_before = removed.len();
        for file in files {
            if validate_image(&file)? {
                valid.push(file);
            } else {
                removed.push(file);
            }
        }

        info!(
            "class '{}': {} valid image(s), {} removed",
            class_name,
            valid.len(),
            removed.len() - removed_before
        );
        classes.insert(class_name, valid);
    }

    Ok(ScanReport { classes, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_image(path: &Path) {
        let img = image::ImageBuffer::from_fn(10, 10, |_, _| image::Rgb([255u8, 0u8, 0u8]));
        img.save(path).unwrap();
    }

    fn create_corrupt_file(path: &Path) {
        fs::write(path, b"this is not an image").unwrap();
    }

    #[test]
    fn test_valid_image_survives() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ok.png");
        create_test_image(&path);

        assert!(validate_image(&path).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_image_is_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.jpg");
        create_corrupt_file(&path);

        assert!(!validate_image(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.png");

        assert!(!validate_image(&path).unwrap());
    }

    #[test]
    fn test_scan_groups_by_class() {
        let temp_dir = TempDir::new().unwrap();
        for class in ["cats", "dogs"] {
            let dir = temp_dir.path().join(class);
            fs::create_dir(&dir).unwrap();
            create_test_image(&dir.join("a.png"));
            create_test_image(&dir.join("b.png"));
        }
        create_corrupt_file(&temp_dir.path().join("cats").join("junk.jpg"));

        let report = scan_classes(temp_dir.path()).unwrap();
        assert_eq!(report.num_classes(), 2);
        assert_eq!(report.classes["cats"].len(), 2);
        assert_eq!(report.classes["dogs"].len(), 2);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.total_valid(), 4);

        // Sorted class order
        let names: Vec<_> = report.classes.keys().cloned().collect();
        assert_eq!(names, vec!["cats".to_string(), "dogs".to_string()]);
    }

    #[test]
    fn test_scan_keeps_empty_class_entry() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("empty");
        fs::create_dir(&dir).unwrap();
        create_corrupt_file(&dir.join("junk.jpg"));

        let report = scan_classes(temp_dir.path()).unwrap();
        assert_eq!(report.num_classes(), 1);
        assert!(report.classes["empty"].is_empty());
    }

    #[test]
    fn test_scan_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("cls");
        fs::create_dir(&dir).unwrap();
        create_test_image(&dir.join("a.png"));
        create_corrupt_file(&dir.join("bad.jpg"));

        let first = scan_classes(temp_dir.path()).unwrap();
        assert_eq!(first.removed.len(), 1);

        let second = scan_classes(temp_dir.path()).unwrap();
        assert!(second.removed.is_empty());
        assert_eq!(second.classes["cls"], first.classes["cls"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = scan_classes(&temp_dir.path().join("nope"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_scan_root_without_classes_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let report = scan_classes(temp_dir.path()).unwrap();
        assert!(report.classes.is_empty());
    }
}
