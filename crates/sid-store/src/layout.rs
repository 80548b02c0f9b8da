use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use sid_core::error::{SidError, SidResult};
use sid_core::frame::FeatureSequence;
use sid_core::store::TemplateStore;

use crate::sequence_file::{read_sequence, write_sequence};

/// Extension des fichiers de séquence.
const SEQUENCE_EXT: &str = "txt";

fn unreadable(path: &Path) -> impl FnOnce(std::io::Error) -> SidError + '_ {
    move |source| SidError::MissingOrUnreadableSource {
        path: path.to_path_buf(),
        source,
    }
}

fn unwritable(path: &Path) -> impl FnOnce(std::io::Error) -> SidError + '_ {
    move |source| SidError::WriteFailed {
        path: path.to_path_buf(),
        source,
    }
}

/// Entrées de `dir` triées par nom, filtrées par `keep`.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> SidResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(unreadable(dir))? {
        let path = entry.map_err(unreadable(dir))?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn is_sequence_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == SEQUENCE_EXT)
}

fn file_label(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}

/// Load a batch layout: one subdirectory per speaker, each holding `*.txt`
/// samples. Speakers and samples are visited in sorted name order.
///
/// # Errors
/// `MissingOrUnreadableSource` if `root` or a file cannot be read, or any
/// parse error of a sample file.
///
/// # Example
/// ```
/// use sid_core::frame::FeatureSequence;
/// use sid_core::store::TemplateStore;
/// use sid_store::layout::{export_store, load_batch_store};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = TemplateStore::new();
/// store.push_sample("alice", FeatureSequence::from_first_coefficients(&[1.0, 2.0]).unwrap());
/// export_store(dir.path(), &store).unwrap();
///
/// let loaded = load_batch_store(dir.path()).unwrap();
/// assert_eq!(loaded.sample_count(), 1);
/// assert!(dir.path().join("alice/sample1.txt").is_file());
/// ```
pub fn load_batch_store(root: &Path) -> SidResult<TemplateStore> {
    let mut store = TemplateStore::new();
    for speaker_dir in sorted_entries(root, Path::is_dir)? {
        let Some(label) = speaker_dir
            .file_name()
            .and_then(|s| s.to_str())
            .map(ToString::to_string)
        else {
            log::warn!("Skipping non UTF-8 directory {}", speaker_dir.display());
            continue;
        };
        let mut sequences = Vec::new();
        for file in sorted_entries(&speaker_dir, is_sequence_file)? {
            sequences.push(read_sequence(&file)?);
        }
        if sequences.is_empty() {
            log::warn!("Speaker '{label}' has no sample in {}", speaker_dir.display());
        }
        store.insert(label, sequences)?;
    }
    log::info!(
        "Loaded {} speakers / {} samples from {}",
        store.len(),
        store.sample_count(),
        root.display()
    );
    Ok(store)
}

/// Load a single-template database: one `<label>.txt` per speaker.
///
/// # Errors
/// `MissingOrUnreadableSource` if `dir` or a file cannot be read, or any
/// parse error of a template file.
pub fn load_single_store(dir: &Path) -> SidResult<TemplateStore> {
    let mut store = TemplateStore::new();
    for file in sorted_entries(dir, is_sequence_file)? {
        let Some(label) = file_label(&file) else {
            log::warn!("Skipping non UTF-8 file {}", file.display());
            continue;
        };
        store.insert(label, vec![read_sequence(&file)?])?;
    }
    log::info!("Loaded {} templates from {}", store.len(), dir.display());
    Ok(store)
}

/// Trim `label` and check it can be used as a file or directory name.
///
/// # Errors
/// `InvalidLabel` when empty, `.`/`..`, or containing a path separator.
///
/// # Example
/// ```
/// use sid_store::layout::validate_label;
/// assert_eq!(validate_label("  alice ").unwrap(), "alice");
/// assert!(validate_label("../etc").is_err());
/// assert!(validate_label("   ").is_err());
/// ```
pub fn validate_label(label: &str) -> SidResult<&str> {
    let trimmed = label.trim();
    let bad = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed.contains('\0');
    if bad {
        return Err(SidError::InvalidLabel(label.to_string()));
    }
    Ok(trimmed)
}

/// Enrol `sequence` as `<dir>/<label>.txt`, replacing a previous enrolment
/// of the same label. Returns the written path.
///
/// # Errors
/// `InvalidLabel`, `EmptySequence`, or `WriteFailed`.
pub fn enroll(dir: &Path, label: &str, sequence: &FeatureSequence) -> SidResult<PathBuf> {
    let label = validate_label(label)?;
    if sequence.is_empty() {
        return Err(SidError::empty_sequence(format!("enrolment of '{label}'")));
    }
    fs::create_dir_all(dir).map_err(unwritable(dir))?;
    let path = dir.join(format!("{label}.{SEQUENCE_EXT}"));
    if path.exists() {
        log::info!("Replacing existing template {}", path.display());
    }
    write_sequence(&path, sequence)?;
    log::info!("Enrolled '{label}' ({} frames) -> {}", sequence.len(), path.display());
    Ok(path)
}

/// Write `store` in the batch layout as `<root>/<label>/sample<N>.txt`
/// (N from 1). An existing `root` is removed first. Returns the number of
/// files written.
///
/// # Errors
/// `InvalidLabel` for a label unusable as a directory name, `DuplicateLabel`
/// when two labels trim to the same directory, `WriteFailed` on I/O failure.
/// Labels are checked before `root` is touched.
pub fn export_store(root: &Path, store: &TemplateStore) -> SidResult<usize> {
    let mut dir_names = HashSet::new();
    for label in store.labels() {
        let name = validate_label(label)?;
        if !dir_names.insert(name) {
            return Err(SidError::DuplicateLabel(name.to_string()));
        }
    }
    if root.exists() {
        fs::remove_dir_all(root).map_err(unwritable(root))?;
    }
    fs::create_dir_all(root).map_err(unwritable(root))?;

    let mut written = 0;
    for speaker in store.speakers() {
        let speaker_dir = root.join(speaker.label().trim());
        fs::create_dir_all(&speaker_dir).map_err(unwritable(&speaker_dir))?;
        for (n, sequence) in speaker.sequences().iter().enumerate() {
            write_sequence(&speaker_dir.join(format!("sample{}.txt", n + 1)), sequence)?;
            written += 1;
        }
    }
    log::info!("Exported {written} samples to {}", root.display());
    Ok(written)
}
