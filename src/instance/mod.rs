// src/instance/mod.rs

//! Instance source: turns a text file of DOT graphs into [`Instance`]s.
//!
//! - [`source`] finds the individual `graph <name> { ... }` blocks.
//! - [`dot`] parses one block into a [`SimpleGraph`].
//! - [`graph6`] encodes a graph as a graph6 string, the default key.
//! - [`filter`] implements the structural instance filter.

pub mod dot;
pub mod filter;
pub mod graph6;
pub mod source;

use std::path::Path;

use tracing::{debug, info};

use crate::errors::{ExprunError, Result};
use crate::fs::FileSystem;

pub use dot::{parse_dot, SimpleGraph};
pub use source::extract_graph_blocks;

/// One problem instance: its raw payload and canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Text handed to the executable verbatim.
    pub payload: String,
    /// Content-derived identifier used to detect duplicates.
    pub key: String,
    /// Parsed structure, if this instance came from a DOT source.
    pub graph: Option<SimpleGraph>,
}

impl Instance {
    pub fn new(payload: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            key: key.into(),
            graph: None,
        }
    }

    pub fn with_graph(mut self, graph: SimpleGraph) -> Self {
        self.graph = Some(graph);
        self
    }
}

/// Derives the canonical key of a parsed graph.
pub trait InstanceKeyer: Send + Sync {
    fn key(&self, graph: &SimpleGraph) -> Result<String>;
}

/// Keys graphs by their graph6 encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Graph6Keyer;

impl InstanceKeyer for Graph6Keyer {
    fn key(&self, graph: &SimpleGraph) -> Result<String> {
        graph6::encode(graph)
    }
}

/// Parse every graph in `text`, in source order.
pub fn parse_instances(text: &str, keyer: &dyn InstanceKeyer) -> Result<Vec<Instance>> {
    let mut instances = Vec::new();
    for (idx, block) in extract_graph_blocks(text).into_iter().enumerate() {
        let graph = parse_dot(block).map_err(|e| {
            ExprunError::InstanceSource(format!("graph #{} could not be parsed: {e}", idx + 1))
        })?;
        let key = keyer.key(&graph)?;
        debug!(index = idx, key = %key, nodes = graph.node_count(), "parsed instance");
        instances.push(Instance::new(block, key).with_graph(graph));
    }
    Ok(instances)
}

/// Read and parse the instance source at `path`.
pub fn load_instances(
    fs: &dyn FileSystem,
    path: &Path,
    keyer: &dyn InstanceKeyer,
) -> Result<Vec<Instance>> {
    let text = fs.read_to_string(path)?;
    let instances = parse_instances(&text, keyer)?;
    if instances.is_empty() {
        return Err(ExprunError::InstanceSource(format!(
            "no `graph <name> {{ ... }}` blocks found in {:?}",
            path
        )));
    }
    info!(count = instances.len(), path = ?path, "loaded instances");
    Ok(instances)
}
