//! Image normalization and dataset assembly.
//!
//! Decodes the balanced class set into one `(N, H, W, 3)` float array
//! scaled to `[0, 1]` plus an integer label array, and exposes a
//! fixed-batch-size iterator over the pair. Decode failures here are
//! fatal: anything reaching this stage is assumed to have passed
//! validation already.

use std::path::Path;

use image::imageops::FilterType;
use ndarray::{s, Array1, Array3, Array4, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use super::ClassImageSet;
use crate::utils::error::{Error, Result};
use crate::utils::logging::ProgressLogger;

/// Decode an image and return it as an `(H, W, 3)` pixel array.
///
/// The image is stretched to exactly `(width, height)` without
/// preserving aspect ratio and forced to 3-channel RGB.
pub fn load_image_array(path: &Path, size: (u32, u32)) -> Result<Array3<u8>> {
    let (width, height) = size;
    let img = image::open(path)
        .map_err(|e| Error::Image(path.to_path_buf(), e.to_string()))?;
    let rgb = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    Array3::from_shape_vec((height as usize, width as usize, 3), rgb.into_raw())
        .map_err(|e| Error::Image(path.to_path_buf(), e.to_string()))
}

/// The assembled dataset: images in `(N, H, W, 3)` layout scaled to
/// `[0, 1]`, and one label per sample.
#[derive(Debug, Clone)]
pub struct ArrayDataset {
    pub images: Array4<f32>,
    pub labels: Array1<usize>,
    /// Sorted class names; a sample's label is its class's position here.
    pub class_names: Vec<String>,
}

impl ArrayDataset {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Iterate the dataset in batches of at most `batch_size` samples.
    ///
    /// The sample order is reshuffled at the start of every full pass.
    /// Pass `Some(seed)` for a reproducible order, `None` to seed from
    /// entropy.
    pub fn batches(&self, batch_size: usize, seed: Option<u64>) -> BatchIterator<'_> {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        BatchIterator {
            dataset: self,
            batch_size: batch_size.max(1),
            order: (0..self.len()).collect(),
            cursor: 0,
            rng,
        }
    }
}

/// Normalize every image in the class set into an [`ArrayDataset`].
///
/// Classes are visited in sorted order and a sample's label is the
/// position of its class in that order. Pixel values are divided by 255
/// to map the `0..=255` range onto `[0, 1]`.
pub fn assemble_dataset(classes: &ClassImageSet, size: (u32, u32)) -> Result<ArrayDataset> {
    let total: usize = classes.values().map(|v| v.len()).sum();
    if total == 0 {
        return Err(Error::Dataset(
            "no samples to assemble; validate and balance a non-empty dataset first".to_string(),
        ));
    }

    let (width, height) = size;
    let mut images = Array4::<f32>::zeros((total, height as usize, width as usize, 3));
    let mut labels = Array1::<usize>::zeros(total);
    let class_names: Vec<String> = classes.keys().cloned().collect();

    let mut progress = ProgressLogger::new("assembling images", total);
    let mut index = 0;
    for (label, paths) in classes.values().enumerate() {
        for path in paths {
            let pixels = load_image_array(path, size)?;
            let scaled = pixels.mapv(|v| f32::from(v) / 255.0);
            images.slice_mut(s![index, .., .., ..]).assign(&scaled);
            labels[index] = label;
            index += 1;
            progress.increment();
        }
    }
    progress.finish();

    info!(
        "assembled {} sample(s) across {} class(es)",
        total,
        class_names.len()
    );

    Ok(ArrayDataset {
        images,
        labels,
        class_names,
    })
}

/// Finite, restartable batch iterator over an [`ArrayDataset`].
///
/// Yields `(batch_images, batch_labels)` pairs until the dataset is
/// exhausted, then returns `None` once and rewinds; the next pass
/// reshuffles the sample order. The final batch of a pass may hold
/// fewer than `batch_size` samples.
pub struct BatchIterator<'a> {
    dataset: &'a ArrayDataset,
    batch_size: usize,
    order: Vec<usize>,
    cursor: usize,
    rng: ChaCha8Rng,
}

impl Iterator for BatchIterator<'_> {
    type Item = (Array4<f32>, Array1<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.order.is_empty() {
            return None;
        }
        if self.cursor == 0 {
            self.order.shuffle(&mut self.rng);
        }
        if self.cursor >= self.order.len() {
            self.cursor = 0;
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = &self.order[self.cursor..end];
        let images = self.dataset.images.select(Axis(0), batch);
        let labels = self.dataset.labels.select(Axis(0), batch);
        self.cursor = end;

        Some((images, labels))
    }
}
