use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum BatchError {
    String(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Serde(serde_json::Error),
}

impl Error for BatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::String(_) => None,
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Serde(e) => Some(e),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::String(message) => write!(f, "{message}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Csv(e) => write!(f, "Could not write output table: {e}"),
            Self::Serde(e) => write!(f, "Could not serialize JSON output: {e}"),
        }
    }
}

impl From<String> for BatchError {
    fn from(err: String) -> Self {
        BatchError::String(err)
    }
}

impl From<std::io::Error> for BatchError {
    fn from(err: std::io::Error) -> Self {
        BatchError::Io(err)
    }
}

impl From<csv::Error> for BatchError {
    fn from(err: csv::Error) -> Self {
        BatchError::Csv(err)
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(err: serde_json::Error) -> Self {
        BatchError::Serde(err)
    }
}
