use crate::error::BatchError;
use crate::job::{JobDescriptor, JobError};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{info, warn};

pub const FIELD_DELIMITER: char = '|';
const REQUIRED_FIELDS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based.
    pub line_number: usize,
    pub error: JobError,
}

#[derive(Debug, Clone, Default)]
pub struct JobLoad {
    pub jobs: Vec<JobDescriptor>,
    pub rejected: Vec<RejectedLine>,
}

fn parse_line(line: &str) -> Result<JobDescriptor, JobError> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() < REQUIRED_FIELDS {
        return Err(JobError::MissingFields {
            found: fields.len(),
        });
    }
    JobDescriptor::new(fields[0], fields[1], fields[2], fields[3].trim_end())
}

/// Reads one job per line, keeping input order. Invalid lines are collected
/// in `rejected` and never stop the read.
pub fn load_from_reader<R: BufRead>(reader: R) -> std::io::Result<JobLoad> {
    let mut load = JobLoad::default();
    for (idx, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let line = String::from_utf8_lossy(&raw);
        match parse_line(&line) {
            Ok(job) => load.jobs.push(job),
            Err(error) => load.rejected.push(RejectedLine {
                line_number: idx + 1,
                error,
            }),
        }
    }
    Ok(load)
}

pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<JobDescriptor>, BatchError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        BatchError::String(format!(
            "Could not open input file '{}': {e}",
            path.display()
        ))
    })?;
    let load = load_from_reader(BufReader::new(file)).map_err(|e| {
        BatchError::String(format!(
            "Could not read input file '{}': {e}",
            path.display()
        ))
    })?;
    for rejected in &load.rejected {
        warn!("Line {}: {}", rejected.line_number, rejected.error);
    }
    info!(
        accepted = load.jobs.len(),
        rejected = load.rejected.len(),
        "loaded jobs from {}",
        path.display()
    );
    Ok(load.jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::{NamedTempFile, TempDir};

    fn fixture_dir() -> (TempDir, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let seq = dir.path().join("seq.fasta");
        std::fs::write(&seq, ">P1\nMKTAYIAKQR\n").expect("write fasta");
        let seq = seq.to_string_lossy().to_string();
        (dir, seq)
    }

    #[test]
    fn loads_single_valid_line() {
        let (_dir, seq) = fixture_dir();
        let input = format!("-seq|{seq}|45|A\n");
        let load = load_from_reader(Cursor::new(input)).expect("load");
        assert!(load.rejected.is_empty());
        assert_eq!(load.jobs.len(), 1);
        let job = &load.jobs[0];
        assert_eq!(job.mode().flag(), "-seq");
        assert_eq!(job.sequence_path(), seq);
        assert_eq!(job.position(), "45");
        assert_eq!(job.new_residue(), "A");
    }

    #[test]
    fn skips_invalid_lines_and_keeps_order() {
        let (dir, seq) = fixture_dir();
        let missing = dir.path().join("nope.fasta");
        let missing = missing.to_string_lossy();
        let input = format!(
            "-seq|{seq}|45|A\n\
             -bogus|{seq}|1|C\n\
             -seqp|{seq}|12|W  \r\n\
             \n\
             -seq|{missing}|3|G\n\
             -seq|{seq}\n\
             -seq|{seq}|x1|G\n\
             -seq|{seq}|7|G7\n\
             -seqb|{seq}|99|y\n"
        );
        let load = load_from_reader(Cursor::new(input)).expect("load");

        let kept = load
            .jobs
            .iter()
            .map(|job| (job.mode().flag(), job.position(), job.new_residue()))
            .collect::<Vec<_>>();
        assert_eq!(
            kept,
            vec![("-seq", "45", "A"), ("-seqp", "12", "W"), ("-seqb", "99", "y")]
        );

        let lines = load
            .rejected
            .iter()
            .map(|r| r.line_number)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 4, 5, 6, 7, 8]);
        assert!(matches!(load.rejected[0].error, JobError::InvalidMode { .. }));
        assert_eq!(load.rejected[1].error, JobError::MissingFields { found: 1 });
        assert!(matches!(
            load.rejected[2].error,
            JobError::MissingSequenceFile { .. }
        ));
        assert_eq!(load.rejected[3].error, JobError::MissingFields { found: 2 });
        assert!(matches!(
            load.rejected[4].error,
            JobError::NonIntegerPosition { .. }
        ));
        assert!(matches!(
            load.rejected[5].error,
            JobError::NonAlphabeticResidue { .. }
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let (_dir, seq) = fixture_dir();
        let input = format!("-seq|{seq}|45|A|comment\n");
        let load = load_from_reader(Cursor::new(input)).expect("load");
        assert_eq!(load.jobs.len(), 1);
        assert_eq!(load.jobs[0].new_residue(), "A");
    }

    #[test]
    fn load_from_file_returns_only_valid_jobs() {
        let (_dir, seq) = fixture_dir();
        let mut input = NamedTempFile::new().expect("input file");
        writeln!(input, "-seq|{seq}|45|A").expect("write");
        writeln!(input, "garbage").expect("write");
        writeln!(input, "-seqp|{seq}|46|C").expect("write");
        input.flush().expect("flush");

        let jobs = load_from_file(input.path()).expect("load");
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].position(), "46");
    }

    #[test]
    fn unreadable_input_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_from_file(dir.path().join("absent.txt")).unwrap_err();
        assert!(err.to_string().contains("Could not open input file"));
    }
}
