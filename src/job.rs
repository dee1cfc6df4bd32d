use serde::Serialize;
use std::{fmt, path::Path, str::FromStr};

/// PhD-SNP invocation mode. Each selects a distinct command-line form of the
/// predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    /// `-seq`: sequence-based prediction.
    Sequence,
    /// `-seqp`: profile-based prediction.
    Profile,
    /// `-seqb`
    Blast,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Sequence, Mode::Profile, Mode::Blast];

    pub fn flag(self) -> &'static str {
        match self {
            Mode::Sequence => "-seq",
            Mode::Profile => "-seqp",
            Mode::Blast => "-seqb",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

impl FromStr for Mode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.flag() == s)
            .ok_or_else(|| JobError::InvalidMode {
                mode: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    MissingFields { found: usize },
    InvalidMode { mode: String },
    MissingSequenceFile { path: String },
    NonIntegerPosition { position: String },
    NonAlphabeticResidue { residue: String },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields { found } => write!(
                f,
                "not enough parameters were provided (expected 4, found {found})"
            ),
            Self::InvalidMode { mode } => write!(
                f,
                "invalid mode '{}' (expected one of {})",
                mode,
                Mode::ALL.map(Mode::flag).join(", ")
            ),
            Self::MissingSequenceFile { path } => {
                write!(f, "sequence file '{path}' does not exist")
            }
            Self::NonIntegerPosition { position } => {
                write!(f, "position '{position}' must be an integer")
            }
            Self::NonAlphabeticResidue { residue } => {
                write!(f, "new residue '{residue}' must be a letter character")
            }
        }
    }
}

impl std::error::Error for JobError {}

/// One mutation-analysis request. Only constructed through [`JobDescriptor::new`],
/// which validates, so every descriptor the scheduler sees is fully valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDescriptor {
    mode: Mode,
    sequence_path: String,
    position: String,
    new_residue: String,
}

impl JobDescriptor {
    pub fn new(
        mode: &str,
        sequence_path: &str,
        position: &str,
        new_residue: &str,
    ) -> Result<Self, JobError> {
        let mode = validate(mode, sequence_path, position, new_residue)?;
        Ok(Self {
            mode,
            sequence_path: sequence_path.to_string(),
            position: position.to_string(),
            new_residue: new_residue.to_string(),
        })
    }

    /// Re-runs the field checks, e.g. to catch a sequence file removed after loading.
    pub fn validate(&self) -> Result<(), JobError> {
        validate(
            self.mode.flag(),
            &self.sequence_path,
            &self.position,
            &self.new_residue,
        )
        .map(|_| ())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sequence_path(&self) -> &str {
        &self.sequence_path
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn new_residue(&self) -> &str {
        &self.new_residue
    }

    /// Mode flag followed by the three positional predictor arguments.
    pub fn tool_args(&self) -> [&str; 4] {
        [
            self.mode.flag(),
            &self.sequence_path,
            &self.position,
            &self.new_residue,
        ]
    }
}

impl fmt::Display for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.mode, self.sequence_path, self.position, self.new_residue
        )
    }
}

/// Optional sign followed by ASCII digits, surrounding whitespace allowed.
/// Any width is accepted; the value is only passed through to the predictor.
fn is_integer(value: &str) -> bool {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Checks the four fields of a request in order, reporting the first failure.
pub fn validate(
    mode: &str,
    sequence_path: &str,
    position: &str,
    new_residue: &str,
) -> Result<Mode, JobError> {
    let mode = mode.parse::<Mode>()?;
    if !Path::new(sequence_path).exists() {
        return Err(JobError::MissingSequenceFile {
            path: sequence_path.to_string(),
        });
    }
    if !is_integer(position) {
        return Err(JobError::NonIntegerPosition {
            position: position.to_string(),
        });
    }
    if new_residue.is_empty() || !new_residue.chars().all(char::is_alphabetic) {
        return Err(JobError::NonAlphabeticResidue {
            residue: new_residue.to_string(),
        });
    }
    Ok(mode)
}
