// src/ledger/integrity.rs

use std::collections::BTreeMap;
use std::fmt;

use crate::ledger::WorkUnit;
use crate::types::Outcome;

/// Rows that solved the same instance but disagree on the result value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub instance_key: String,
    /// Result value -> the `method@executable` rows that reported it.
    pub values: BTreeMap<i64, Vec<String>>,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance '{}':", self.instance_key)?;
        for (i, (value, rows)) in self.values.iter().enumerate() {
            let sep = if i == 0 { " " } else { " vs " };
            write!(f, "{sep}{value} ({})", rows.join(", "))?;
        }
        Ok(())
    }
}

/// Compare every successful, solved row that shares an instance key.
///
/// Unsolved successes and timeouts carry no meaningful value and are left
/// out.
pub fn find_violations<'a>(units: impl IntoIterator<Item = &'a WorkUnit>) -> Vec<IntegrityViolation> {
    let mut by_key: BTreeMap<&str, BTreeMap<i64, Vec<String>>> = BTreeMap::new();

    for unit in units {
        if unit.outcome != Outcome::Success || unit.solved != Some(true) {
            continue;
        }
        let Some(value) = unit.result_value else {
            continue;
        };
        by_key
            .entry(unit.instance_key.as_str())
            .or_default()
            .entry(value)
            .or_default()
            .push(format!("{}@{}", unit.method, unit.executable));
    }

    by_key
        .into_iter()
        .filter(|(_, values)| values.len() > 1)
        .map(|(key, values)| IntegrityViolation {
            instance_key: key.to_string(),
            values,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;

    fn solved(key: &str, method: Method, value: i64) -> WorkUnit {
        WorkUnit {
            instance: format!("graph {key} {{}}"),
            instance_key: key.to_string(),
            executable: "bin/a".to_string(),
            method,
            outcome: Outcome::Success,
            solved: Some(true),
            result_value: Some(value),
            elapsed: Some(1),
            wall_elapsed: Some(1),
        }
    }

    #[test]
    fn agreeing_rows_are_fine() {
        let rows = [solved("k", Method::Ilp, 3), solved("k", Method::Sat, 3)];
        assert!(find_violations(&rows).is_empty());
    }

    #[test]
    fn disagreement_is_reported_once_per_key() {
        let rows = [
            solved("k", Method::Ilp, 3),
            solved("k", Method::Sat, 4),
            solved("k", Method::Dp, 3),
            solved("other", Method::Dp, 9),
        ];
        let violations = find_violations(&rows);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].instance_key, "k");
        assert_eq!(violations[0].values[&3], vec!["ilp@bin/a", "dp@bin/a"]);
        assert_eq!(
            violations[0].to_string(),
            "instance 'k': 3 (ilp@bin/a, dp@bin/a) vs 4 (sat@bin/a)"
        );
    }

    #[test]
    fn unsolved_and_timeouts_are_ignored() {
        let mut unsolved = solved("k", Method::Sat, 0);
        unsolved.solved = Some(false);
        let mut timeout = solved("k", Method::Dp, 0);
        timeout.outcome = Outcome::Timeout;
        let rows = [solved("k", Method::Ilp, 3), unsolved, timeout];
        assert!(find_violations(&rows).is_empty());
    }
}
