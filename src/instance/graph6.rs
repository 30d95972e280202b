// src/instance/graph6.rs

//! graph6 encoding (without the `>>graph6<<` header).

use crate::errors::{ExprunError, Result};
use crate::instance::SimpleGraph;

const MAX_SHORT_N: usize = 62;
const MAX_N: usize = 258_047;

/// Encode `graph` in graph6 using its vertex order.
///
/// The key depends on vertex order, so two encodings of the same graph with
/// differently ordered vertices get different keys.
pub fn encode(graph: &SimpleGraph) -> Result<String> {
    let n = graph.node_count();
    let mut out = String::new();

    if n <= MAX_SHORT_N {
        out.push(printable(n as u32));
    } else if n <= MAX_N {
        out.push('~');
        for shift in [12, 6, 0] {
            out.push(printable(((n >> shift) & 0x3f) as u32));
        }
    } else {
        return Err(ExprunError::InstanceSource(format!(
            "graph with {n} vertices is too large for graph6 (max {MAX_N})"
        )));
    }

    // Upper triangle, column by column: (0,1), (0,2), (1,2), (0,3), ...
    let mut chunk = 0u32;
    let mut filled = 0;
    for j in 1..n {
        for i in 0..j {
            chunk = (chunk << 1) | u32::from(graph.has_edge(i, j));
            filled += 1;
            if filled == 6 {
                out.push(printable(chunk));
                chunk = 0;
                filled = 0;
            }
        }
    }
    if filled > 0 {
        out.push(printable(chunk << (6 - filled)));
    }

    Ok(out)
}

fn printable(value: u32) -> char {
    char::from_u32(value + 63).unwrap_or('?')
}
