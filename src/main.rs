//! Command-line interface for dataset preparation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use walkdir::WalkDir;

use imgprep::utils::logging::{init_logging, LogConfig};
use imgprep::{
    assemble_dataset, balance_classes, scan_classes, split_folder, SplitOptions,
    DEFAULT_BATCH_SIZE, DEFAULT_IMAGE_SIZE, DEFAULT_SEED,
};

/// Prepare image datasets for classifier training.
#[derive(Parser, Debug)]
#[command(name = "imgprep")]
#[command(version)]
#[command(about = "Validate, balance, and split image classification datasets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate, balance, and assemble a directory of class folders
    Prepare {
        /// Root directory containing one subdirectory per class
        root: PathBuf,

        /// Target square image size in pixels
        #[arg(short, long, default_value_t = DEFAULT_IMAGE_SIZE)]
        size: u32,

        /// Batch size for the assembled iterator
        #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Random seed for the balancing shuffle
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Split one folder of files into train/validate copies
    Split {
        /// Source folder with the files to split
        source: PathBuf,

        /// Base directory for the train share
        #[arg(long, alias = "train_base", default_value = "train")]
        train_base: PathBuf,

        /// Base directory for the validate share
        #[arg(long, alias = "validate_base", default_value = "validate")]
        validate_base: PathBuf,

        /// Fraction of files routed to the validate destination
        #[arg(short, long, default_value_t = 0.2)]
        ratio: f64,

        /// Seed the shuffle for a reproducible split
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show per-class file counts without modifying anything
    Stats {
        /// Root directory containing one subdirectory per class
        root: PathBuf,

        /// Write the statistics as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    match cli.command {
        Commands::Prepare {
            root,
            size,
            batch_size,
            seed,
        } => cmd_prepare(&root, size, batch_size, seed),

        Commands::Split {
            source,
            train_base,
            validate_base,
            ratio,
            seed,
        } => cmd_split(&source, train_base, validate_base, ratio, seed),

        Commands::Stats { root, output } => cmd_stats(&root, output.as_deref()),
    }
}

fn cmd_prepare(root: &Path, size: u32, batch_size: usize, seed: u64) -> Result<()> {
    println!("{}", "Preparing dataset".cyan().bold());
    println!("  Root: {}", root.display());

    let scan = scan_classes(root).context("failed to scan class directories")?;
    println!("  Removed {} invalid file(s)", scan.removed.len());

    let mut classes = scan.classes;
    if classes.is_empty() {
        anyhow::bail!("no class directories found in {}", root.display());
    }

    let stats = balance_classes(&mut classes, seed).context("failed to balance classes")?;
    for (name, stat) in &stats.per_class {
        let marker = if stat.retained == stat.original {
            "✓".green()
        } else {
            "↓".yellow()
        };
        println!("  {} {}: {}/{} image(s)", marker, name, stat.retained, stat.original);
    }
    println!(
        "  Balanced to {} image(s) per class, {} surplus file(s) removed",
        stats.min_samples, stats.removed
    );

    if stats.min_samples == 0 {
        anyhow::bail!("a class has zero valid images; nothing to assemble");
    }

    let dataset = assemble_dataset(&classes, (size, size)).context("failed to assemble dataset")?;
    let batches = (dataset.len() + batch_size - 1) / batch_size;

    println!("{}", "Dataset ready".green().bold());
    println!("  Classes: {:?}", dataset.class_names);
    println!(
        "  Samples: {} ({}x{}x3, scaled to [0, 1])",
        dataset.len(),
        size,
        size
    );
    println!("  Batches per pass: {} (batch size {})", batches, batch_size);

    let mut iterator = dataset.batches(batch_size, Some(seed));
    if let Some((images, labels)) = iterator.next() {
        println!(
            "  First batch: {:?} images, {} label(s)",
            images.dim(),
            labels.len()
        );
    }

    Ok(())
}

fn cmd_split(
    source: &Path,
    train_base: PathBuf,
    validate_base: PathBuf,
    ratio: f64,
    seed: Option<u64>,
) -> Result<()> {
    let options = SplitOptions {
        train_base,
        validate_base,
        ratio,
        seed,
    };

    let report = split_folder(source, &options)
        .with_context(|| format!("failed to split {}", source.display()))?;

    println!(
        "Split complete: {} file(s) in '{}' and {} file(s) in '{}'.",
        report.train_count,
        report.train_dir.display(),
        report.validate_count,
        report.validate_dir.display()
    );

    Ok(())
}

fn cmd_stats(root: &Path, output: Option<&Path>) -> Result<()> {
    if !root.is_dir() {
        anyhow::bail!("dataset directory not found: {}", root.display());
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let count = WalkDir::new(entry.path())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        counts.insert(name, count);
    }

    let total: usize = counts.values().sum();

    println!("{}", "Dataset statistics".cyan().bold());
    println!("  {:<40} {:>8}", "Class", "Files");
    for (name, count) in &counts {
        println!("  {:<40} {:>8}", name, count);
    }
    println!(
        "  Total: {} file(s) in {} class(es)",
        total,
        counts.len()
    );

    if let Some(path) = output {
        let report = serde_json::json!({
            "total_files": total,
            "num_classes": counts.len(),
            "classes": counts,
        });
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  Statistics saved to {}", path.display());
    }

    Ok(())
}
