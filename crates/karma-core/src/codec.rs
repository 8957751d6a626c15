//! Plain-text karma data file.
//!
//! One record per line:
//!
//! ```text
//! alice:alice_away: 12:3
//! ```
//!
//! Aliases are written in stored order, each followed by a colon, then a
//! space and `up:down`. Records that were never voted on are not written.
//!
//! Loading is permissive: it stops quietly at the first line it cannot
//! understand and keeps everything read before it.

use std::io::{self, BufRead, Write};

use crate::record::ScoreRecord;

/// Why loading stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("line {line}: unreadable: {reason}")]
    Unreadable { line: usize, reason: String },
    #[error("line {line}: no aliases before the counts")]
    NoAliases { line: usize },
    #[error("line {line}: missing up:down counts")]
    MissingCounts { line: usize },
    #[error("line {line}: malformed counts {field:?}")]
    BadCounts { line: usize, field: String },
    #[error("line {line}: unexpected trailing field {field:?}")]
    TrailingField { line: usize, field: String },
}

impl DecodeError {
    /// One-based line number where loading stopped.
    pub fn line(&self) -> usize {
        match self {
            DecodeError::Unreadable { line, .. }
            | DecodeError::NoAliases { line }
            | DecodeError::MissingCounts { line }
            | DecodeError::BadCounts { line, .. }
            | DecodeError::TrailingField { line, .. } => *line,
        }
    }
}

/// Write every record with activity, in the order given.
///
/// Returns the number of records written.
pub fn encode<'a, W: Write>(
    records: impl IntoIterator<Item = &'a ScoreRecord>,
    out: &mut W,
) -> io::Result<usize> {
    let mut written = 0;
    for record in records {
        if record.is_idle() {
            continue;
        }
        for alias in record.aliases() {
            write!(out, "{alias}:")?;
        }
        writeln!(out, " {}:{}", record.upvotes, record.downvotes)?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// Parse a single non-blank data line.
pub fn parse_line(text: &str, line: usize) -> Result<ScoreRecord, DecodeError> {
    let mut fields = text.split_whitespace();
    let cluster = fields.next().ok_or(DecodeError::NoAliases { line })?;
    let counts = fields.next().ok_or(DecodeError::MissingCounts { line })?;
    if let Some(extra) = fields.next() {
        return Err(DecodeError::TrailingField {
            line,
            field: extra.to_string(),
        });
    }

    let bad_counts = || DecodeError::BadCounts {
        line,
        field: counts.to_string(),
    };
    let (up, down) = counts.split_once(':').ok_or_else(bad_counts)?;
    let up: u32 = up.parse().map_err(|_| bad_counts())?;
    let down: u32 = down.parse().map_err(|_| bad_counts())?;

    let aliases: Vec<String> = cluster
        .split(':')
        .filter(|alias| !alias.is_empty())
        .map(str::to_string)
        .collect();

    ScoreRecord::restore(aliases, up, down).ok_or(DecodeError::NoAliases { line })
}

/// Line iterator over a data file. Yields records until the input ends or a
/// line fails to parse; the failure is yielded once and iteration stops.
pub struct RecordLines<R> {
    lines: io::Lines<R>,
    line: usize,
    done: bool,
}

impl<R: BufRead> RecordLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordLines<R> {
    type Item = Result<ScoreRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.line += 1;
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => {
                    self.done = true;
                    return Some(Err(DecodeError::Unreadable {
                        line: self.line,
                        reason: e.to_string(),
                    }));
                }
            };
            if text.trim().is_empty() {
                continue;
            }
            let parsed = parse_line(&text, self.line);
            if parsed.is_err() {
                self.done = true;
            }
            return Some(parsed);
        }
    }
}

/// Outcome of reading a data file.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<ScoreRecord>,
    /// Set when loading stopped before the end of input.
    pub stopped: Option<DecodeError>,
}

/// Read records until end of input or the first malformed line.
pub fn decode<R: BufRead>(reader: R) -> LoadReport {
    let mut report = LoadReport::default();
    for item in RecordLines::new(reader) {
        match item {
            Ok(record) => report.records.push(record),
            Err(e) => report.stopped = Some(e),
        }
    }
    report
}
