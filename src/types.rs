// src/types.rs

//! Small shared vocabulary types: solving methods, job outcomes and the
//! structural instance filter.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Solving strategy passed to the executable as `-m <method>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Ilp,
    Sat,
    Dp,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Ilp, Method::Sat, Method::Dp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Ilp => "ilp",
            Method::Sat => "sat",
            Method::Dp => "dp",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ilp" => Ok(Method::Ilp),
            "sat" => Ok(Method::Sat),
            "dp" => Ok(Method::Dp),
            other => Err(format!(
                "invalid method: {other} (expected \"ilp\", \"sat\" or \"dp\")"
            )),
        }
    }
}

/// Terminal classification of a work unit.
///
/// `Unset` is the only non-terminal state. A row is considered done because
/// its outcome says so, never because some other cell happens to be filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    Unset,
    Success,
    Failure,
    Timeout,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Unset => "unset",
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Timeout => "timeout",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Unset)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    /// An empty cell reads as `Unset` so hand-edited ledgers can clear a row
    /// by blanking its outcome.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "unset" => Ok(Outcome::Unset),
            "success" => Ok(Outcome::Success),
            "failure" => Ok(Outcome::Failure),
            "timeout" => Ok(Outcome::Timeout),
            other => Err(format!(
                "invalid outcome: {other} (expected unset, success, failure or timeout)"
            )),
        }
    }
}

/// Which instances make it into a freshly built ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StructuralFilter {
    /// Keep every instance.
    All,
    /// Keep only biconnected graphs (default).
    #[default]
    Biconnected,
    /// Keep only graphs that are *not* biconnected.
    NotBiconnected,
}

impl FromStr for StructuralFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StructuralFilter::All),
            "biconnected" => Ok(StructuralFilter::Biconnected),
            "not-biconnected" | "non-biconnected" => Ok(StructuralFilter::NotBiconnected),
            other => Err(format!(
                "invalid filter: {other} (expected \"all\", \"biconnected\" or \"not-biconnected\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("ILP".parse::<Method>().unwrap(), Method::Ilp);
        assert_eq!(" sat ".parse::<Method>().unwrap(), Method::Sat);
        assert!("okp".parse::<Method>().is_err());
    }

    #[test]
    fn blank_outcome_is_unset() {
        assert_eq!("".parse::<Outcome>().unwrap(), Outcome::Unset);
        assert_eq!("timeout".parse::<Outcome>().unwrap(), Outcome::Timeout);
        assert!(!Outcome::Unset.is_terminal());
        assert!(Outcome::Failure.is_terminal());
    }

    #[test]
    fn filter_accepts_both_spellings() {
        assert_eq!(
            "non-biconnected".parse::<StructuralFilter>().unwrap(),
            StructuralFilter::NotBiconnected
        );
        assert_eq!(StructuralFilter::default(), StructuralFilter::Biconnected);
    }
}
