//! # imgprep
//!
//! Prepares image datasets for classifier training.
//!
//! The pipeline is a linear sequence of explicit stages over a tree of
//! class folders:
//!
//! 1. **Scan/validate**: walk the class subfolders, delete files that
//!    fail to decode, and group the survivors by class.
//! 2. **Balance**: truncate every class to the smallest class size
//!    with a seeded shuffle, deleting the surplus files.
//! 3. **Assemble**: resize and normalize the survivors into one
//!    `(N, H, W, 3)` array in `[0, 1]` plus labels, batched by a
//!    reshuffling iterator.
//!
//! Independently, **split** partitions the files of one folder into
//! train/validate copies at a configurable ratio.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use imgprep::{assemble_dataset, balance_classes, scan_classes};
//!
//! let report = scan_classes("data/train".as_ref())?;
//! let mut classes = report.classes;
//! balance_classes(&mut classes, imgprep::DEFAULT_SEED)?;
//! let dataset = assemble_dataset(&classes, (224, 224))?;
//! for (images, labels) in dataset.batches(32, Some(42)) {
//!     // feed a training step
//! }
//! ```

pub mod dataset;
pub mod utils;

pub use dataset::assemble::{assemble_dataset, load_image_array, ArrayDataset, BatchIterator};
pub use dataset::balance::{balance_classes, BalanceStats, ClassStat};
pub use dataset::split::{split_folder, SplitOptions, SplitReport};
pub use dataset::validate::{scan_classes, validate_image, ScanReport};
pub use dataset::ClassImageSet;
pub use utils::error::{Error, Result};

/// Default target edge length for normalized images.
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Default batch size for the assembled iterator.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default seed for the balancing shuffle.
pub const DEFAULT_SEED: u64 = 42;
