//! CID list parsing for uploaded CSV files.
//!
//! Only the first column of each record is used. Quoted fields follow
//! RFC 4180 (`""` escapes a quote, quoted fields may span lines). Every
//! record must have as many fields as the first one. Blank lines are not
//! records; records whose first field is empty after trimming are skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("file is not valid UTF-8")]
    InvalidUtf8,

    #[error("line {line}: bare \" in non-quoted field")]
    BareQuote { line: usize },

    #[error("line {line}: extraneous or missing \" in quoted field")]
    UnterminatedQuote { line: usize },

    #[error("record on line {line}: wrong number of fields (expected {expected}, found {found})")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Accumulates one record at a time and enforces the field count.
#[derive(Default)]
struct Records {
    cids: Vec<String>,
    expected_fields: Option<usize>,
    first: String,
    field_index: usize,
    started: bool,
    start_line: usize,
}

impl Records {
    fn finish(&mut self) -> Result<(), CsvError> {
        if !self.started {
            return Ok(());
        }

        let found = self.field_index + 1;
        match self.expected_fields {
            None => self.expected_fields = Some(found),
            Some(expected) if expected != found => {
                return Err(CsvError::FieldCount {
                    line: self.start_line,
                    expected,
                    found,
                })
            }
            Some(_) => {}
        }

        let cid = self.first.trim();
        if !cid.is_empty() {
            self.cids.push(cid.to_string());
        }
        self.first.clear();
        self.field_index = 0;
        self.started = false;
        Ok(())
    }

    fn begin(&mut self, line: usize) {
        if !self.started {
            self.started = true;
            self.start_line = line;
        }
    }

    fn push_char(&mut self, c: char) {
        if self.field_index == 0 {
            self.first.push(c);
        }
    }
}

/// Extract the CID (first field) from every record of a CSV payload.
pub fn parse_cid_list(bytes: &[u8]) -> Result<Vec<String>, CsvError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CsvError::InvalidUtf8)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = Records::default();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut line = 1usize;
    let mut quote_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    records.push_char('"');
                }
                '"' => {
                    in_quotes = false;
                    match chars.peek() {
                        None | Some(',') | Some('\n') | Some('\r') => {}
                        Some(_) => return Err(CsvError::UnterminatedQuote { line: quote_line }),
                    }
                }
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    records.push_char(c);
                }
            }
            continue;
        }

        match c {
            ',' => {
                records.begin(line);
                records.field_index += 1;
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                records.finish()?;
                field_was_quoted = false;
                line += 1;
            }
            '"' => {
                let at_field_start = if records.field_index == 0 {
                    records.first.trim().is_empty() && !field_was_quoted
                } else {
                    !field_was_quoted
                };
                if !at_field_start {
                    return Err(CsvError::BareQuote { line });
                }
                records.begin(line);
                if records.field_index == 0 {
                    records.first.clear();
                }
                in_quotes = true;
                field_was_quoted = true;
                quote_line = line;
            }
            _ => {
                records.begin(line);
                records.push_char(c);
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: quote_line });
    }
    records.finish()?;

    Ok(records.cids)
}
