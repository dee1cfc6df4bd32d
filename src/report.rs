use serde::Serialize;
use std::{fmt, io::Write, ops::Range};
use tracing::{debug, warn};

/// Prefixes of the line that opens the prediction table.
pub const TABLE_HEADERS: [&str; 2] = ["      Profile", "      Sequence"];

// Character offsets of the fixed-width PhD-SNP table.
const POSITION_COLUMNS: Range<usize> = 7..14;
const WILD_TYPE_COLUMN: usize = 18;
const NEW_TYPE_COLUMN: usize = 23;
const PREDICTION_COLUMNS: Range<usize> = 31..39;
const RELIABILITY_COLUMNS: Range<usize> = 41..43;

/// A row must reach at least the first reliability character to be complete.
const MIN_ROW_CHARS: usize = RELIABILITY_COLUMNS.start + 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub name: String,
    pub prediction: String,
    pub reliability_index: String,
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}  \t{}",
            self.name, self.prediction, self.reliability_index
        )
    }
}

fn is_table_header(line: &str) -> bool {
    TABLE_HEADERS.iter().any(|prefix| line.starts_with(prefix))
}

/// Out-of-range columns yield an empty string instead of failing.
fn column(chars: &[char], range: Range<usize>) -> String {
    let end = range.end.min(chars.len());
    let start = range.start.min(end);
    chars[start..end].iter().collect::<String>().trim().to_string()
}

fn decode_row(line_number: usize, line: &str) -> ResultRecord {
    let chars = line.chars().collect::<Vec<_>>();
    if chars.len() < MIN_ROW_CHARS {
        warn!(
            line = line_number,
            "MalformedReportLine: row has {} characters, expected at least {}: '{}'",
            chars.len(),
            MIN_ROW_CHARS,
            line
        );
    }
    let position = column(&chars, POSITION_COLUMNS);
    let wild_type = column(&chars, WILD_TYPE_COLUMN..WILD_TYPE_COLUMN + 1);
    let new_type = column(&chars, NEW_TYPE_COLUMN..NEW_TYPE_COLUMN + 1);
    ResultRecord {
        name: format!("{wild_type}{position}{new_type}"),
        prediction: column(&chars, PREDICTION_COLUMNS),
        reliability_index: column(&chars, RELIABILITY_COLUMNS),
    }
}

/// Decodes the prediction table out of a PhD-SNP stdout capture.
///
/// Everything before the first header line is skipped; the first empty line
/// after it ends the table. Output without a header yields no records.
pub fn parse_table(stdout: &str) -> Vec<ResultRecord> {
    let mut records = Vec::new();
    let mut in_table = false;
    for (idx, line) in stdout.split('\n').enumerate() {
        if !in_table {
            in_table = is_table_header(line);
        } else if line.is_empty() {
            break;
        } else {
            records.push(decode_row(idx + 1, line));
        }
    }
    if !in_table {
        debug!("no prediction table header found in predictor output");
    }
    records
}

/// Forwards `stderr` verbatim to `diagnostics`, then parses `stdout`.
pub fn parse_report(
    stdout: &str,
    stderr: &str,
    diagnostics: &mut dyn Write,
) -> Vec<ResultRecord> {
    if !stderr.is_empty() {
        if let Err(e) = diagnostics
            .write_all(stderr.as_bytes())
            .and_then(|_| diagnostics.flush())
        {
            warn!("could not forward predictor stderr: {e}");
        }
    }
    parse_table(stdout)
}
