use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sid_core::config::{FailurePolicy, MatchConfig, StrategyKind};

/// speakerid: speaker identification by dynamic time warping.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Threads du pool rayon (0 = nombre de cœurs).
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Identify the speaker of one sequence file.
    Identify {
        /// Probe sequence file.
        probe: PathBuf,
        /// Single-template database (`<label>.txt` files).
        #[arg(long, conflicts_with = "train")]
        database: Option<PathBuf>,
        /// Batch layout (`<label>/*.txt`) to match against instead.
        #[arg(long)]
        train: Option<PathBuf>,
        #[command(flatten)]
        matching: MatchingArgs,
    },
    /// Classify every test sample against a training set and score accuracy.
    Evaluate {
        /// Training set, batch layout.
        #[arg(long)]
        train: Option<PathBuf>,
        /// Test set, batch layout.
        #[arg(long)]
        test: Option<PathBuf>,
        /// Text report, one line per sample.
        #[arg(long)]
        report: Option<PathBuf>,
        /// JSON report.
        #[arg(long)]
        json_report: Option<PathBuf>,
        /// abort | skip
        #[arg(long)]
        failure_policy: Option<FailurePolicy>,
        /// Classify test samples one after the other.
        #[arg(long, default_value_t = false)]
        sequential: bool,
        #[command(flatten)]
        matching: MatchingArgs,
    },
    /// Enrol a sequence file under a speaker label.
    Enroll {
        /// Speaker label (file name of the template).
        label: String,
        /// Sequence file to enrol.
        features: PathBuf,
        /// Single-template database directory.
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Print the alignment cost of two sequence files under every strategy.
    Align {
        /// First sequence (rows of the cost matrix).
        first: PathBuf,
        /// Second sequence (columns).
        second: PathBuf,
        /// Pruning width for banded and beam.
        #[arg(long)]
        width: Option<i64>,
    },
    /// List the speakers of a store with sample and frame counts.
    Inspect {
        /// Store directory.
        dir: PathBuf,
        /// Read `dir` as a single-template database.
        #[arg(long, default_value_t = false)]
        single: bool,
    },
    /// Rewrite a store in the batch layout (`<label>/sample<N>.txt`).
    Export {
        /// Source store directory.
        from: PathBuf,
        /// Destination root, replaced if it exists.
        to: PathBuf,
        /// Read `from` as a single-template database.
        #[arg(long, default_value_t = false)]
        single: bool,
    },
}

/// Overrides de la section `[matching]`.
#[derive(Args, Debug, Default)]
pub struct MatchingArgs {
    /// exact | banded | beam
    #[arg(long)]
    pub strategy: Option<StrategyKind>,
    /// Pruning width, required for banded and beam.
    #[arg(long)]
    pub width: Option<i64>,
    /// Also reduce over templates in parallel.
    #[arg(long, default_value_t = false)]
    pub parallel_templates: bool,
}

impl MatchingArgs {
    /// Apply the flags that were given over `config`.
    pub fn apply(&self, config: &mut MatchConfig) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(width) = self.width {
            config.width = Some(width);
        }
        if self.parallel_templates {
            config.parallel_templates = true;
        }
    }
}
