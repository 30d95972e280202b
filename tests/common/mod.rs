#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use exprun_test_utils::init_tracing;

/// Three small graphs; `slow` marks the one the test solver stalls on.
pub const THREE_GRAPHS: &str = r#"
graph tri { a -- b; b -- c; c -- a; }
graph slow { a -- b; a -- c; a -- d; b -- c; b -- d; c -- d; }
graph square { a -- b -- c -- d -- a; }
"#;

/// Two different payloads that describe the same graph.
pub const DUPLICATE_GRAPHS: &str = r#"
graph first { x -- y; }
graph second { p -- q; }
"#;

/// Write a `/bin/sh` solver script into `dir` and return an executable
/// string that runs it.
///
/// The script sees `$1 = instance`, `$2 = -m`, `$3 = method`. Running it
/// through `sh` avoids needing the exec bit on a freshly written file.
pub fn solver_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write solver script");
    format!("sh {}", path.display())
}

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}
