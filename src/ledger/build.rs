// src/ledger/build.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::errors::{ExprunError, Result};
use crate::instance::Instance;
use crate::ledger::WorkUnit;
use crate::types::Method;

/// Cross product `instances × executables × methods` of the instances that
/// pass `filter`, in source order.
///
/// Two different payloads with the same key abort the build: that means the
/// key is not canonical for our inputs, and merging them would silently
/// drop an instance. A payload repeated verbatim is the same instance listed
/// twice and is skipped.
pub fn build_units<F>(
    instances: Vec<Instance>,
    methods: &[Method],
    executables: &[String],
    filter: F,
) -> Result<Vec<WorkUnit>>
where
    F: Fn(&Instance) -> bool,
{
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut kept = Vec::new();

    for instance in instances {
        match seen.get(&instance.key) {
            Some(first) if *first == instance.payload => {
                warn!(key = %instance.key, "instance listed twice; skipping the repeat");
                continue;
            }
            Some(first) => {
                return Err(ExprunError::DuplicateInstance {
                    key: instance.key,
                    first: first.clone(),
                    second: instance.payload,
                });
            }
            None => {
                seen.insert(instance.key.clone(), instance.payload.clone());
            }
        }

        if filter(&instance) {
            kept.push(instance);
        } else {
            debug!(key = %instance.key, "instance rejected by filter");
        }
    }

    let mut units = Vec::with_capacity(kept.len() * executables.len() * methods.len());
    for instance in &kept {
        for executable in executables {
            for &method in methods {
                units.push(WorkUnit::pending(instance, executable, method));
            }
        }
    }

    check_unique(&units)?;
    Ok(units)
}

/// Every `(instance_key, method, executable)` triple must appear once.
pub fn check_unique(units: &[WorkUnit]) -> Result<()> {
    let mut seen = HashSet::with_capacity(units.len());
    for unit in units {
        let triple = (
            unit.instance_key.as_str(),
            unit.method,
            unit.executable.as_str(),
        );
        if !seen.insert(triple) {
            return Err(ExprunError::LedgerFormat(format!(
                "duplicate row for instance '{}', method {}, executable '{}'",
                unit.instance_key, unit.method, unit.executable
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cross_product_order_is_instance_executable_method() {
        let units = build_units(
            vec![Instance::new("g1", "k1"), Instance::new("g2", "k2")],
            &[Method::Ilp, Method::Dp],
            &exes(&["bin/a", "bin/b"]),
            |_| true,
        )
        .unwrap();

        let triples: Vec<_> = units
            .iter()
            .map(|u| (u.instance_key.as_str(), u.executable.as_str(), u.method))
            .collect();
        assert_eq!(triples.len(), 8);
        assert_eq!(triples[0], ("k1", "bin/a", Method::Ilp));
        assert_eq!(triples[1], ("k1", "bin/a", Method::Dp));
        assert_eq!(triples[2], ("k1", "bin/b", Method::Ilp));
        assert_eq!(triples[7], ("k2", "bin/b", Method::Dp));
    }

    #[test]
    fn colliding_keys_with_different_payloads_fail() {
        let err = build_units(
            vec![
                Instance::new("graph G { a -- b; }", "A_"),
                Instance::new("graph H { x -- y; }", "A_"),
            ],
            &[Method::Sat],
            &exes(&["bin/a"]),
            |_| true,
        )
        .unwrap_err();

        match err {
            ExprunError::DuplicateInstance { key, first, second } => {
                assert_eq!(key, "A_");
                assert!(first.contains("graph G"));
                assert!(second.contains("graph H"));
            }
            other => panic!("expected DuplicateInstance, got {other:?}"),
        }
    }

    #[test]
    fn verbatim_repeats_are_skipped() {
        let units = build_units(
            vec![Instance::new("g", "k"), Instance::new("g", "k")],
            &[Method::Sat],
            &exes(&["bin/a"]),
            |_| true,
        )
        .unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn duplicate_detection_ignores_the_filter() {
        let result = build_units(
            vec![Instance::new("g1", "k"), Instance::new("g2", "k")],
            &[Method::Sat],
            &exes(&["bin/a"]),
            |_| false,
        );
        assert!(matches!(result, Err(ExprunError::DuplicateInstance { .. })));
    }

    #[test]
    fn repeated_methods_break_uniqueness() {
        let result = build_units(
            vec![Instance::new("g", "k")],
            &[Method::Sat, Method::Sat],
            &exes(&["bin/a"]),
            |_| true,
        );
        assert!(matches!(result, Err(ExprunError::LedgerFormat(_))));
    }
}
