use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use sid_core::error::{SidError, SidResult};
use sid_match::report::EvaluationReport;

fn create_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write one `Expected: …, Identified: …, Distance: …` line per outcome.
///
/// # Errors
/// `WriteFailed` on I/O failure.
pub fn write_text_report(path: &Path, report: &EvaluationReport) -> SidResult<()> {
    let write = || -> std::io::Result<()> {
        create_parent(path)?;
        let mut out = BufWriter::new(File::create(path)?);
        for line in report.lines() {
            writeln!(out, "{line}")?;
        }
        out.flush()
    };
    write().map_err(|source| SidError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

/// Write the whole report (outcomes, failures, timings) as pretty JSON.
///
/// # Errors
/// `WriteFailed` on I/O or serialization failure.
pub fn write_json_report(path: &Path, report: &EvaluationReport) -> SidResult<()> {
    let write = || -> std::io::Result<()> {
        create_parent(path)?;
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, report)?;
        out.flush()
    };
    write().map_err(|source| SidError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("JSON report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use sid_match::report::SampleOutcome;
    use sid_match::timing::StrategyTimings;

    fn report() -> EvaluationReport {
        EvaluationReport::from_outcomes(
            "beam(w=8)".into(),
            vec![
                SampleOutcome {
                    index: 0,
                    expected: "alice".into(),
                    identified: Some("alice".into()),
                    distance: 3.25,
                },
                SampleOutcome {
                    index: 1,
                    expected: "bob".into(),
                    identified: None,
                    distance: f64::INFINITY,
                },
            ],
            vec![],
            StrategyTimings::default(),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn text_report_has_one_line_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/result.txt");
        write_text_report(&path, &report()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Expected: alice, Identified: alice, Distance: 3.25",
                "Expected: bob, Identified: none, Distance: inf",
            ]
        );
    }

    #[test]
    fn json_report_carries_summary_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        write_json_report(&path, &report()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["strategy"], "beam(w=8)");
        assert_eq!(value["total_samples"], 2);
        assert_eq!(value["correct_matches"], 1);
        assert_eq!(value["accuracy"], 50.0);
        assert!(value["outcomes"][1]["identified"].is_null());
        assert_eq!(value["outcomes"][1]["distance"], "inf");
    }
}
