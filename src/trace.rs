use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: unknown operation {found:?}")]
    UnknownOperation { line: usize, found: char },
    #[error("line {line}: expected \"<op> <hexaddress>,<size>\", got {text:?}")]
    Malformed { line: usize, text: String },
    #[error("line {line}: bad hex address {text:?}")]
    BadAddress { line: usize, text: String },
    #[error("line {line}: bad access size {text:?}")]
    BadSize { line: usize, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Instruction,
    Load,
    Store,
    Modify,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operation::Instruction => 'I',
            Operation::Load => 'L',
            Operation::Store => 'S',
            Operation::Modify => 'M',
        };
        write!(f, "{}", symbol)
    }
}

/// One parsed reference from a Valgrind-style memory trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub operation: Operation,
    pub address: u64,
    /// Number of bytes touched. Carried through for verbose echoing; the
    /// cache model itself never looks at it.
    pub size: u64,
}

/// Streaming reader over trace lines of the form `"<op> <hexaddress>,<size>"`.
pub struct Trace<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl Trace<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Trace::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Trace<R> {
    pub fn new(reader: R) -> Self {
        Trace {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for Trace<R> {
    type Item = Result<TraceEntry, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(TraceError::Io(err))),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_line(&line, self.line_number));
        }
    }
}

fn parse_line(line: &str, number: usize) -> Result<TraceEntry, TraceError> {
    // instruction lines start in column zero, data lines are indented;
    // either way the operation is the first non-blank character
    let text = line.trim();
    let mut chars = text.chars();
    let symbol = chars.next().ok_or_else(|| TraceError::Malformed {
        line: number,
        text: line.to_string(),
    })?;
    let operation = match symbol {
        'I' => Operation::Instruction,
        'L' => Operation::Load,
        'S' => Operation::Store,
        'M' => Operation::Modify,
        other => {
            return Err(TraceError::UnknownOperation {
                line: number,
                found: other,
            })
        }
    };

    let rest = chars.as_str().trim_start();
    let (address_text, size_text) =
        rest.split_once(',').ok_or_else(|| TraceError::Malformed {
            line: number,
            text: line.to_string(),
        })?;

    let address =
        u64::from_str_radix(address_text.trim(), 16).map_err(|_| TraceError::BadAddress {
            line: number,
            text: address_text.to_string(),
        })?;
    let size = size_text
        .trim()
        .parse::<u64>()
        .map_err(|_| TraceError::BadSize {
            line: number,
            text: size_text.to_string(),
        })?;

    Ok(TraceEntry {
        operation,
        address,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_data_reference() {
        let entry = parse_line(" L 10,1", 1).unwrap();
        assert_eq!(
            entry,
            TraceEntry {
                operation: Operation::Load,
                address: 0x10,
                size: 1,
            }
        );
    }

    #[test]
    fn parses_unindented_instruction_reference() {
        let entry = parse_line("I 0400d7d4,8", 1).unwrap();
        assert_eq!(entry.operation, Operation::Instruction);
        assert_eq!(entry.address, 0x0400_d7d4);
        assert_eq!(entry.size, 8);
    }

    #[test]
    fn parses_store_and_modify() {
        assert_eq!(parse_line(" S 18,1", 1).unwrap().operation, Operation::Store);
        assert_eq!(parse_line(" M 20,1", 1).unwrap().operation, Operation::Modify);
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(matches!(
            parse_line(" X 10,1", 3),
            Err(TraceError::UnknownOperation { line: 3, found: 'X' })
        ));
    }

    #[test]
    fn rejects_missing_size() {
        assert!(matches!(
            parse_line(" L 10", 1),
            Err(TraceError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_bad_address_and_size() {
        assert!(matches!(
            parse_line(" L zz,1", 1),
            Err(TraceError::BadAddress { .. })
        ));
        assert!(matches!(
            parse_line(" L 10,one", 1),
            Err(TraceError::BadSize { .. })
        ));
    }

    #[test]
    fn iterates_lines_and_skips_blanks() {
        let input = " L 10,1\n\n M 20,4\n";
        let entries: Vec<TraceEntry> = Trace::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].address, 0x10);
        assert_eq!(entries[1].operation, Operation::Modify);
    }

    #[test]
    fn reports_the_failing_line_number() {
        let input = " L 10,1\n junk\n";
        let results: Vec<_> = Trace::new(Cursor::new(input)).collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(TraceError::UnknownOperation { line: 2, .. })
        ));
    }
}
