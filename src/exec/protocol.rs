// src/exec/protocol.rs

//! The solver's standard output contract: `<solved:0|1> <value:int> <elapsed_ns:int>`.

use thiserror::Error;

/// What a solver reports on a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverReport {
    pub solved: bool,
    pub value: i64,
    pub elapsed_ns: u64,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("expected 3 tokens on stdout, got {0}")]
    TokenCount(usize),

    #[error("'{token}' is not a valid {field}")]
    BadToken { field: &'static str, token: String },
}

/// Parse a solver's stdout. Surrounding whitespace and newlines are fine;
/// anything else is a protocol violation.
pub fn parse_report(stdout: &str) -> Result<SolverReport, ProtocolError> {
    let tokens: Vec<&str> = stdout.split_whitespace().collect();
    let [solved, value, elapsed] = tokens[..] else {
        return Err(ProtocolError::TokenCount(tokens.len()));
    };

    let solved = match solved {
        "0" => false,
        "1" => true,
        other => {
            return Err(ProtocolError::BadToken {
                field: "solved flag (0 or 1)",
                token: other.to_string(),
            })
        }
    };
    let value = value.parse::<i64>().map_err(|_| ProtocolError::BadToken {
        field: "result value",
        token: value.to_string(),
    })?;
    let elapsed_ns = elapsed.parse::<u64>().map_err(|_| ProtocolError::BadToken {
        field: "elapsed time in nanoseconds",
        token: elapsed.to_string(),
    })?;

    Ok(SolverReport {
        solved,
        value,
        elapsed_ns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_output() {
        assert_eq!(
            parse_report("1 4 1000\n").unwrap(),
            SolverReport {
                solved: true,
                value: 4,
                elapsed_ns: 1000
            }
        );
        assert!(!parse_report("  0 0 17 ").unwrap().solved);
    }

    #[test]
    fn wrong_token_count() {
        assert_eq!(parse_report(""), Err(ProtocolError::TokenCount(0)));
        assert_eq!(parse_report("garbage"), Err(ProtocolError::TokenCount(1)));
        assert_eq!(parse_report("1 2 3 4"), Err(ProtocolError::TokenCount(4)));
    }

    #[test]
    fn non_integer_tokens() {
        assert_eq!(
            parse_report("not an int"),
            Err(ProtocolError::BadToken {
                field: "solved flag (0 or 1)",
                token: "not".to_string(),
            })
        );
        assert!(matches!(
            parse_report("1 four 1000"),
            Err(ProtocolError::BadToken { field: "result value", .. })
        ));
        assert!(matches!(
            parse_report("1 4 -5"),
            Err(ProtocolError::BadToken { .. })
        ));
        assert!(matches!(
            parse_report("2 4 5"),
            Err(ProtocolError::BadToken { .. })
        ));
    }
}
