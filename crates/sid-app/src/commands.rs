use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use sid_core::cancel::CancelToken;
use sid_core::config::{FailurePolicy, MatchConfig, StrategyKind};
use sid_core::store::TemplateStore;
use sid_dtw::{Aligner, AlignmentStrategy};
use sid_match::{Classifier, EvaluationOptions, evaluate};
use sid_store::{
    enroll, export_store, load_batch_store, load_single_store, read_sequence, write_json_report,
    write_text_report,
};

/// Stratégie effective (config + overrides CLI).
///
/// # Errors
/// Returns an error if banded/beam is selected without a positive width.
pub fn resolve_strategy(config: &MatchConfig) -> Result<AlignmentStrategy> {
    AlignmentStrategy::from_params(config.strategy, config.width)
        .context("Utilisez --width ou [matching].width")
}

fn require_dir(flag: Option<PathBuf>, fallback: Option<&PathBuf>, what: &str) -> Result<PathBuf> {
    flag.or_else(|| fallback.cloned())
        .with_context(|| format!("Aucun dossier {what} : option CLI ou section [paths]"))
}

fn load_store(dir: &Path, single: bool) -> Result<TemplateStore> {
    let store = if single {
        load_single_store(dir)
    } else {
        load_batch_store(dir)
    };
    store.with_context(|| format!("Impossible de charger le store {}", dir.display()))
}

fn read_probe(path: &Path) -> Result<sid_core::frame::FeatureSequence> {
    read_sequence(path).with_context(|| format!("Séquence illisible : {}", path.display()))
}

/// `identify` : probe contre une base de templates.
///
/// # Errors
/// Load, strategy or cancellation errors.
pub fn identify(
    config: &MatchConfig,
    probe: &Path,
    database: Option<PathBuf>,
    train: Option<PathBuf>,
    cancel: CancelToken,
) -> Result<()> {
    let strategy = resolve_strategy(config)?;
    let store = match train {
        Some(dir) => load_store(&dir, false)?,
        None => {
            let dir = require_dir(database, config.database_dir.as_ref(), "database")?;
            load_store(&dir, true)?
        }
    };
    let probe = read_probe(probe)?;

    let start = Instant::now();
    let result = Classifier::new(strategy)
        .parallel(config.parallel_templates)
        .with_cancel(cancel)
        .identify(&probe, &store)
        .context("Identification interrompue")?;
    let elapsed = start.elapsed();

    println!("Identified: {}", result.label_or_none());
    println!("Distance: {}", result.distance);
    println!(
        "Time: {:.3} s ({} alignments, {strategy}, {:.3} s aligning)",
        elapsed.as_secs_f64(),
        result.timings.alignments(),
        result.timings.get(strategy.kind()).as_secs_f64()
    );
    Ok(())
}

/// Paramètres propres à `evaluate`.
#[derive(Debug, Default)]
pub struct EvaluateArgs {
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub json_report: Option<PathBuf>,
    pub failure_policy: Option<FailurePolicy>,
    pub sequential: bool,
}

/// `evaluate` : lot de test contre lot d'entraînement.
///
/// # Errors
/// Load, strategy, cancellation or report write errors.
pub fn evaluate_sets(config: &MatchConfig, args: EvaluateArgs, cancel: CancelToken) -> Result<()> {
    let strategy = resolve_strategy(config)?;
    let train_dir = require_dir(args.train, config.train_dir.as_ref(), "train")?;
    let test_dir = require_dir(args.test, config.test_dir.as_ref(), "test")?;
    let train = load_store(&train_dir, false)?;
    let test = load_store(&test_dir, false)?;

    let mut options = EvaluationOptions::from_config(config).with_cancel(cancel);
    if let Some(policy) = args.failure_policy {
        options.failure_policy = policy;
    }
    if args.sequential {
        options.parallel = false;
    }

    let report = evaluate(&test, &train, strategy, &options).context("Évaluation échouée")?;

    let report_path = args.report.or_else(|| config.report_path.clone());
    match &report_path {
        Some(path) => write_text_report(path, &report)?,
        None => report.lines().for_each(|line| println!("{line}")),
    }
    if let Some(path) = args.json_report.or_else(|| config.json_report_path.clone()) {
        write_json_report(&path, &report)?;
    }
    for failure in &report.failures {
        eprintln!(
            "skipped #{} ({}): {}",
            failure.index, failure.expected, failure.error
        );
    }
    println!("{}", report.summary());
    Ok(())
}

/// `enroll` : ajoute `<label>.txt` à la base.
///
/// # Errors
/// Invalid label, unreadable features or write failure.
pub fn enroll_speaker(
    config: &MatchConfig,
    label: &str,
    features: &Path,
    database: Option<PathBuf>,
) -> Result<()> {
    let dir = require_dir(database, config.database_dir.as_ref(), "database")?;
    let sequence = read_probe(features)?;
    let path = enroll(&dir, label, &sequence)
        .with_context(|| format!("Enrôlement de '{label}' impossible"))?;
    println!("Enrolled {} frames -> {}", sequence.len(), path.display());
    Ok(())
}

/// `align` : coût de la paire sous chaque stratégie.
///
/// # Errors
/// Unreadable sequence files.
pub fn align_pair(config: &MatchConfig, first: &Path, second: &Path, width: Option<i64>) -> Result<()> {
    let a = read_probe(first)?;
    let b = read_probe(second)?;
    let width = width.or(config.width);
    let mut aligner = Aligner::with_capacity(b.len());

    println!("{} × {} frames", a.len(), b.len());
    for kind in StrategyKind::ALL {
        if kind.needs_width() && width.is_none() {
            println!("{kind}: skipped (no --width)");
            continue;
        }
        match AlignmentStrategy::from_params(kind, width) {
            Ok(strategy) => {
                let start = Instant::now();
                let cost = aligner.align(&a, &b, strategy);
                println!(
                    "{strategy}: {cost} ({} cells, {:.3} ms)",
                    aligner.cells_visited(),
                    start.elapsed().as_secs_f64() * 1e3
                );
            }
            Err(e) => println!("{kind}: skipped ({e})"),
        }
    }
    Ok(())
}

/// `inspect` : une ligne par locuteur.
///
/// # Errors
/// Store load errors.
pub fn inspect_store(dir: &Path, single: bool) -> Result<()> {
    let store = load_store(dir, single)?;
    println!(
        "{} speakers, {} samples in {}",
        store.len(),
        store.sample_count(),
        dir.display()
    );
    for speaker in store.speakers() {
        let lengths: Vec<usize> = speaker.sequences().iter().map(|s| s.len()).collect();
        let (min, max) = (
            lengths.iter().min().copied().unwrap_or(0),
            lengths.iter().max().copied().unwrap_or(0),
        );
        let total: usize = lengths.iter().sum();
        let c0: Vec<f64> = speaker
            .sequences()
            .iter()
            .filter_map(|s| s.mean().map(|m| m[0]))
            .collect();
        let c0_mean = if c0.is_empty() {
            f64::NAN
        } else {
            c0.iter().sum::<f64>() / c0.len() as f64
        };
        println!(
            "{:<20} samples={:<4} frames={total:<7} len[min={min}, max={max}] c0_mean={c0_mean:.4}",
            speaker.label(),
            lengths.len(),
        );
    }
    Ok(())
}

/// `export` : réécrit un store au format `<label>/sample<N>.txt`.
///
/// # Errors
/// Load or write errors.
pub fn export(from: &Path, to: &Path, single: bool) -> Result<()> {
    let store = load_store(from, single)?;
    let written = export_store(to, &store)
        .with_context(|| format!("Export vers {} impossible", to.display()))?;
    println!("Exported {written} samples to {}", to.display());
    Ok(())
}
