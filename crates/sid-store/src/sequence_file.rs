use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use sid_core::error::{RecordOrigin, SidError, SidResult};
use sid_core::frame::{FeatureFrame, FeatureSequence};

/// Parse the text form of a sequence: one frame per line, coefficients
/// separated by whitespace. Blank lines are ignored.
///
/// `path` is only used to locate errors.
///
/// # Errors
/// `MalformedRecord` for a non-numeric token or a wrong coefficient count,
/// `InvalidFeatureValue` for NaN/inf, `EmptySequence` when no frame is found.
///
/// # Example
/// ```
/// use std::path::Path;
/// use sid_store::sequence_file::parse_sequence;
/// let text = "0 0 0 0 0 0 0 0 0 0 0 0 0\n\n1.5 0 0 0 0 0 0 0 0 0 0 0 -2\n";
/// let seq = parse_sequence(text, Path::new("mem.txt")).unwrap();
/// assert_eq!(seq.len(), 2);
/// assert_eq!(seq.frames()[1].coeffs()[12], -2.0);
/// ```
pub fn parse_sequence(content: &str, path: &Path) -> SidResult<FeatureSequence> {
    let mut frames = Vec::new();
    let mut values = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let origin = || RecordOrigin {
            path: path.to_path_buf(),
            line: idx + 1,
        };

        values.clear();
        for token in line.split_whitespace() {
            let value = token
                .parse::<f64>()
                .map_err(|_| SidError::MalformedRecord {
                    origin: origin(),
                    reason: format!("'{token}' is not a number"),
                })?;
            values.push(value);
        }
        let frame = FeatureFrame::from_slice(&values).map_err(|e| e.with_origin(origin()))?;
        frames.push(frame);
    }

    if frames.is_empty() {
        return Err(SidError::empty_sequence(path.display().to_string()));
    }
    Ok(FeatureSequence::new(frames))
}

/// Read and parse a sequence file.
///
/// # Errors
/// `MissingOrUnreadableSource` if the file cannot be read, otherwise see
/// [`parse_sequence`].
pub fn read_sequence(path: &Path) -> SidResult<FeatureSequence> {
    let content =
        fs::read_to_string(path).map_err(|source| SidError::MissingOrUnreadableSource {
            path: path.to_path_buf(),
            source,
        })?;
    parse_sequence(&content, path)
}

/// Text form of `sequence`. `f64` Display is the shortest string that
/// parses back to the same value.
#[must_use]
pub fn format_sequence(sequence: &FeatureSequence) -> String {
    let mut out = String::new();
    for frame in sequence.frames() {
        let mut first = true;
        for c in frame.coeffs() {
            if !first {
                out.push(' ');
            }
            first = false;
            let _ = write!(out, "{c}");
        }
        out.push('\n');
    }
    out
}

/// Write `sequence` to `path`, replacing any existing file.
///
/// # Errors
/// `WriteFailed` on I/O failure.
pub fn write_sequence(path: &Path, sequence: &FeatureSequence) -> SidResult<()> {
    fs::write(path, format_sequence(sequence)).map_err(|source| SidError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sid_core::frame::FRAME_DIM;

    fn line(first: &str) -> String {
        let mut tokens = vec![first.to_string()];
        tokens.extend(std::iter::repeat_n("0".to_string(), FRAME_DIM - 1));
        tokens.join(" ")
    }

    #[test]
    fn non_numeric_token_is_a_malformed_record() {
        let text = format!("{}\n{}\n", line("1"), line("abc"));
        let err = parse_sequence(&text, Path::new("bob/sample1.txt")).unwrap_err();
        match err {
            SidError::MalformedRecord { origin, reason } => {
                assert_eq!(origin.line, 2);
                assert!(reason.contains("abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wrong_coefficient_count_is_a_malformed_record() {
        let err = parse_sequence("1 2 3\n", Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, SidError::MalformedRecord { .. }));
    }

    #[test]
    fn nan_token_is_an_invalid_value() {
        let err = parse_sequence(&line("NaN"), Path::new("x.txt")).unwrap_err();
        match err {
            SidError::InvalidFeatureValue {
                coefficient,
                origin,
                ..
            } => {
                assert_eq!(coefficient, 0);
                assert_eq!(origin.map(|o| o.line), Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_only_content_is_empty() {
        let err = parse_sequence("\n   \n", Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, SidError::EmptySequence { .. }));
    }

    #[test]
    fn written_file_reads_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.txt");
        let seq = FeatureSequence::from_rows(&[
            [0.1; FRAME_DIM],
            [1.0 / 3.0; FRAME_DIM],
            [-123_456.789e-7; FRAME_DIM],
        ])
        .unwrap();
        write_sequence(&path, &seq).unwrap();
        assert_eq!(read_sequence(&path).unwrap(), seq);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sequence(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, SidError::MissingOrUnreadableSource { .. }));
    }
}
