//! Class balancing by undersampling.
//!
//! Every class is truncated to the size of the smallest class; the
//! surplus files are deleted from disk. Destructive and irreversible,
//! no dry-run mode.

use std::collections::BTreeMap;
use std::fs;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ClassImageSet;
use crate::utils::error::Result;

/// Per-class counts before and after balancing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassStat {
    pub original: usize,
    pub retained: usize,
}

/// Statistics about a balancing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceStats {
    /// Size every class was truncated to (the smallest original size).
    pub min_samples: usize,
    /// Total number of surplus files deleted.
    pub removed: usize,
    pub per_class: BTreeMap<String, ClassStat>,
}

/// Truncate every class to the smallest class size, deleting the excess.
///
/// Each class's path list is shuffled with a ChaCha8 RNG seeded from
/// `seed`, the first `min_samples` entries survive, and every other file
/// is deleted from disk. One RNG is threaded across classes in sorted
/// order, so the same seed over the same tree selects the same
/// survivors on every run.
///
/// If any class has zero images, `min_samples` is 0 and every file in
/// every class is deleted; the caller must detect this and abort rather
/// than proceed with an empty dataset.
pub fn balance_classes(classes: &mut ClassImageSet, seed: u64) -> Result<BalanceStats> {
    let min_samples = classes.values().map(|v| v.len()).min().unwrap_or(0);
    info!("balancing {} class(es) to {} sample(s)", classes.len(), min_samples);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut per_class = BTreeMap::new();
    let mut removed = 0;

    for (name, images) in classes.iter_mut() {
        let original = images.len();
        images.shuffle(&mut rng);

        for surplus in images.drain(min_samples..) {
            fs::remove_file(&surplus)?;
            info!("removed surplus image {}", surplus.display());
            removed += 1;
        }

        info!("class '{}': kept {}/{} image(s)", name, images.len(), original);
        per_class.insert(
            name.clone(),
            ClassStat {
                original,
                retained: images.len(),
            },
        );
    }

    Ok(BalanceStats {
        min_samples,
        removed,
        per_class,
    })
}
