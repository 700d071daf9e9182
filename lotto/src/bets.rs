//! Agency bet files.
//!
//! One bet per line: `first_name,last_name,document,birthdate,number`.
//! Blank lines are skipped; malformed lines are logged and skipped so the
//! session only ever sees complete bets.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use lotto_proto::{Bet, FIELD_DELIM};

/// Streams validated [`Bet`]s for one agency out of a CSV source.
#[derive(Debug)]
pub struct BetReader<R> {
    /// Remaining input lines.
    lines: Lines<R>,
    /// Agency stamped on every bet.
    agency: String,
    /// 1-based number of the last line read.
    line_no: usize,
}

impl BetReader<BufReader<File>> {
    /// Opens an agency bet file.
    pub fn open(path: impl AsRef<Path>, agency: impl Into<String>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), agency))
    }
}

impl<R: BufRead> BetReader<R> {
    /// Wraps any buffered reader.
    pub fn new(reader: R, agency: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            agency: agency.into(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for BetReader<R> {
    type Item = io::Result<Bet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&line, &self.agency) {
                Ok(bet) => return Some(Ok(bet)),
                Err(reason) => {
                    tracing::warn!(
                        action = "parse_bet",
                        result = "fail",
                        line = self.line_no,
                        reason
                    );
                }
            }
        }
    }
}

/// Parses one CSV line into a bet for `agency`.
fn parse_line(line: &str, agency: &str) -> Result<Bet, &'static str> {
    let fields: Vec<&str> = line.trim_end_matches('\r').split(',').map(str::trim).collect();
    let [first, last, document, birthdate, number] = fields[..] else {
        return Err("wrong field count");
    };
    if fields.iter().any(|f| f.is_empty()) {
        return Err("empty field");
    }
    if fields.iter().any(|f| f.contains(FIELD_DELIM) || f.contains(';')) {
        return Err("field contains a protocol delimiter");
    }
    Ok(Bet::new(agency, first, last, document, birthdate, number))
}
