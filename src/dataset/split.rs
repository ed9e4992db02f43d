//! Train/validate splitting of a single folder by copy.
//!
//! The source folder is never mutated: files are copied into
//! `<train_base>/<leaf>` and `<validate_base>/<leaf>`, where `leaf` is
//! the source folder's own name.

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::utils::error::{Error, Result};

/// Options for a split run.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Base directory receiving the train share.
    pub train_base: PathBuf,
    /// Base directory receiving the validate share.
    pub validate_base: PathBuf,
    /// Fraction of files routed to the validate destination.
    /// Values outside `[0, 1]` are clamped, with a warning.
    pub ratio: f64,
    /// `Some(seed)` for a reproducible shuffle, `None` for entropy.
    pub seed: Option<u64>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            train_base: PathBuf::from("train"),
            validate_base: PathBuf::from("validate"),
            ratio: 0.2,
            seed: None,
        }
    }
}

/// Outcome of a split: the two destinations and their file counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    pub train_dir: PathBuf,
    pub validate_dir: PathBuf,
    pub train_count: usize,
    pub validate_count: usize,
}

impl SplitReport {
    pub fn total(&self) -> usize {
        self.train_count + self.validate_count
    }
}

/// Randomly partition the immediate files of `source` into train and
/// validate copies.
///
/// `validate_count = floor(total * ratio)`; the remainder goes to train.
/// Destination folders are created if absent. Subfolders of `source`
/// are ignored, and the source itself is left untouched.
pub fn split_folder(source: &Path, options: &SplitOptions) -> Result<SplitReport> {
    if !source.is_dir() {
        return Err(Error::NotFound(format!(
            "source directory {}",
            source.display()
        )));
    }

    let leaf = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "cannot derive a folder name from {}",
                source.display()
            ))
        })?;

    let train_dir = options.train_base.join(leaf);
    let validate_dir = options.validate_base.join(leaf);
    fs::create_dir_all(&train_dir)?;
    fs::create_dir_all(&validate_dir)?;

    // Immediate files only; sorted so a seeded shuffle is reproducible
    // regardless of directory traversal order.
    let mut files: Vec<PathBuf> = WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let ratio = if (0.0..=1.0).contains(&options.ratio) {
        options.ratio
    } else {
        let clamped = options.ratio.clamp(0.0, 1.0);
        warn!(
            "split ratio {} outside [0, 1], clamped to {}",
            options.ratio, clamped
        );
        clamped
    };

    let mut rng = match options.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    files.shuffle(&mut rng);

    let n_validate = (files.len() as f64 * ratio).floor() as usize;
    let (validate_files, train_files) = files.split_at(n_validate);

    for file in validate_files {
        copy_into(file, &validate_dir)?;
    }
    for file in train_files {
        copy_into(file, &train_dir)?;
    }

    info!(
        "split {}: {} file(s) to {}, {} file(s) to {}",
        source.display(),
        train_files.len(),
        train_dir.display(),
        validate_files.len(),
        validate_dir.display()
    );

    Ok(SplitReport {
        train_dir,
        validate_dir,
        train_count: train_files.len(),
        validate_count: validate_files.len(),
    })
}

fn copy_into(file: &Path, dest_dir: &Path) -> Result<()> {
    let name = file.file_name().ok_or_else(|| {
        Error::InvalidArgument(format!("file without a name: {}", file.display()))
    })?;
    fs::copy(file, dest_dir.join(name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn build_source(root: &Path, name: &str, count: usize) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir(&dir).unwrap();
        for i in 0..count {
            fs::write(dir.join(format!("file_{:02}.jpg", i)), b"data").unwrap();
        }
        dir
    }

    fn options(root: &Path, ratio: f64) -> SplitOptions {
        SplitOptions {
            train_base: root.join("train"),
            validate_base: root.join("validate"),
            ratio,
            seed: Some(42),
        }
    }

    fn file_names(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_ten_files_ratio_point_two() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "cats", 10);

        let report = split_folder(&source, &options(temp_dir.path(), 0.2)).unwrap();

        assert_eq!(report.validate_count, 2);
        assert_eq!(report.train_count, 8);
        assert_eq!(report.total(), 10);
        assert!(report.train_dir.ends_with("train/cats"));
        assert!(report.validate_dir.ends_with("validate/cats"));
    }

    #[test]
    fn test_destinations_are_disjoint_and_complete() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "cats", 10);

        let report = split_folder(&source, &options(temp_dir.path(), 0.2)).unwrap();

        let train = file_names(&report.train_dir);
        let validate = file_names(&report.validate_dir);
        assert!(train.is_disjoint(&validate));

        let mut union = train;
        union.extend(validate);
        assert_eq!(union, file_names(&source));
    }

    #[test]
    fn test_source_is_not_mutated() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "cats", 10);
        let before = file_names(&source);

        split_folder(&source, &options(temp_dir.path(), 0.2)).unwrap();

        assert_eq!(file_names(&source), before);
    }

    #[test]
    fn test_validate_count_is_floored() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "cats", 7);

        let report = split_folder(&source, &options(temp_dir.path(), 0.5)).unwrap();

        assert_eq!(report.validate_count, 3);
        assert_eq!(report.train_count, 4);
    }

    #[test]
    fn test_out_of_range_ratios_are_clamped() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "high", 6);
        let report = split_folder(&source, &options(temp_dir.path(), 1.5)).unwrap();
        assert_eq!(report.validate_count, 6);
        assert_eq!(report.train_count, 0);

        let source = build_source(temp_dir.path(), "low", 6);
        let report = split_folder(&source, &options(temp_dir.path(), -0.2)).unwrap();
        assert_eq!(report.validate_count, 0);
        assert_eq!(report.train_count, 6);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let result = split_folder(
            &temp_dir.path().join("nope"),
            &options(temp_dir.path(), 0.2),
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_subfolders_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "cats", 4);
        fs::create_dir(source.join("nested")).unwrap();
        fs::write(source.join("nested").join("deep.jpg"), b"data").unwrap();

        let report = split_folder(&source, &options(temp_dir.path(), 0.25)).unwrap();
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn test_rerun_overwrites_idempotently() {
        let temp_dir = TempDir::new().unwrap();
        let source = build_source(temp_dir.path(), "cats", 10);
        let opts = options(temp_dir.path(), 0.2);

        let first = split_folder(&source, &opts).unwrap();
        let second = split_folder(&source, &opts).unwrap();

        assert_eq!(first.validate_count, second.validate_count);
        assert_eq!(file_names(&first.validate_dir).len(), 2);
    }
}
