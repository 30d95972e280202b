// src/instance/dot.rs

//! Parser for the undirected DOT subset produced by our graph generators.
//!
//! Supported: node statements (`a;`, `a [label="x"];`), edge statements and
//! chains (`a -- b -- c;`), graph attributes (`rankdir=LR`), default
//! attribute statements (`node [shape=circle]`), quoted identifiers and
//! `//`, `#` and `/* */` comments. Subgraphs and directed edges are rejected.

use std::collections::{BTreeSet, HashMap};

use anyhow::{anyhow, bail, Result};

/// Simple undirected graph: no self loops, no parallel edges.
///
/// Vertices are numbered in order of first appearance; edges are stored as
/// `(low, high)` index pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleGraph {
    names: Vec<String>,
    edges: BTreeSet<(usize, usize)>,
}

impl SimpleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_names(&self) -> &[String] {
        &self.names
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges.contains(&key)
    }

    /// Add an edge between vertex indices; self loops are ignored.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a != b {
            self.edges.insert(if a < b { (a, b) } else { (b, a) });
        }
    }

    /// Graph on `n` anonymous vertices `0..n` with the given edges.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = Self {
            names: (0..n).map(|i| i.to_string()).collect(),
            edges: BTreeSet::new(),
        };
        for &(a, b) in edges {
            g.add_edge(a, b);
        }
        g
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Id(String),
    EdgeOp,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Equals,
    Separator,
}

fn tokenize(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                tokens.push(Token::EdgeOp);
                i += 2;
            }
            '-' if chars.get(i + 1) == Some(&'>') => {
                bail!("directed edge '->' in an undirected graph");
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Equals);
                i += 1;
            }
            ';' | ',' => {
                tokens.push(Token::Separator);
                i += 1;
            }
            '"' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => bail!("unterminated string literal"),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') if chars.get(i + 1) == Some(&'"') => {
                            value.push('"');
                            i += 2;
                        }
                        Some(&ch) => {
                            value.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Id(value));
            }
            c if is_id_char(c) || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit() || *n == '.')) => {
                let start = i;
                i += 1;
                while i < chars.len() && is_id_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Id(chars[start..i].iter().collect()));
            }
            other => bail!("unexpected character '{other}'"),
        }
    }

    Ok(tokens)
}

fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Node statements, in order.
    declared: Vec<String>,
    /// Edge endpoints, in order; chains are already split.
    edges: Vec<(String, String)>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    /// Number vertices the way our keys expect: declared nodes first, then
    /// edge endpoints that were never declared, each by first appearance.
    fn into_graph(self) -> SimpleGraph {
        let mut graph = SimpleGraph::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut vertex = |graph: &mut SimpleGraph, name: String| -> usize {
            *index.entry(name).or_insert_with_key(|name| {
                graph.names.push(name.clone());
                graph.names.len() - 1
            })
        };

        for name in self.declared {
            vertex(&mut graph, name);
        }
        for (a, b) in self.edges {
            let a = vertex(&mut graph, a);
            let b = vertex(&mut graph, b);
            graph.add_edge(a, b);
        }
        graph
    }

    fn expect_id(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Id(id)) => Ok(id),
            other => Err(anyhow!("expected identifier, found {other:?}")),
        }
    }

    fn skip_attr_lists(&mut self) -> Result<()> {
        while self.peek() == Some(&Token::LBracket) {
            self.pos += 1;
            loop {
                match self.next() {
                    Some(Token::RBracket) => break,
                    Some(Token::LBracket) | Some(Token::LBrace) | Some(Token::RBrace) | None => {
                        bail!("malformed attribute list")
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// `graph <name>? { stmt* }`
    fn parse_graph(mut self) -> Result<SimpleGraph> {
        let mut header = self.expect_id()?;
        if header.eq_ignore_ascii_case("strict") {
            header = self.expect_id()?;
        }
        if !header.eq_ignore_ascii_case("graph") {
            bail!("expected 'graph', found '{header}'");
        }
        if matches!(self.peek(), Some(Token::Id(_))) {
            self.pos += 1;
        }
        if self.next() != Some(Token::LBrace) {
            bail!("expected '{{' after graph header");
        }

        loop {
            match self.next() {
                None => bail!("missing closing '}}'"),
                Some(Token::RBrace) => break,
                Some(Token::Separator) => {}
                Some(Token::Id(id)) => self.parse_statement(id)?,
                Some(Token::LBrace) => bail!("subgraphs are not supported"),
                Some(other) => bail!("unexpected token {other:?}"),
            }
        }

        if let Some(tok) = self.peek() {
            bail!("trailing input after graph body: {tok:?}");
        }
        Ok(self.into_graph())
    }

    fn parse_statement(&mut self, first: String) -> Result<()> {
        let lowered = first.to_ascii_lowercase();
        if matches!(lowered.as_str(), "graph" | "node" | "edge")
            && self.peek() == Some(&Token::LBracket)
        {
            return self.skip_attr_lists();
        }
        if lowered == "subgraph" {
            bail!("subgraphs are not supported");
        }
        if self.peek() == Some(&Token::Equals) {
            self.pos += 1;
            self.expect_id()?;
            return Ok(());
        }

        if self.peek() != Some(&Token::EdgeOp) {
            self.declared.push(first);
            return self.skip_attr_lists();
        }

        let mut prev = first;
        while self.peek() == Some(&Token::EdgeOp) {
            self.pos += 1;
            let next = self.expect_id()?;
            self.edges.push((prev, next.clone()));
            prev = next;
        }
        self.skip_attr_lists()
    }
}

/// Parse a single `graph <name> { ... }` block.
pub fn parse_dot(src: &str) -> Result<SimpleGraph> {
    let parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        declared: Vec::new(),
        edges: Vec::new(),
    };
    parser.parse_graph()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_chains_and_attributes() {
        let g = parse_dot(
            r#"graph G {
                node [shape=circle];
                a [label="first; node"];
                a -- b -- c [color=red];
                c -- a
            }"#,
        )
        .unwrap();

        assert_eq!(g.node_names(), ["a", "b", "c"]);
        assert_eq!(g.edge_count(), 3);
        assert!(g.has_edge(2, 0));
    }

    #[test]
    fn self_loops_and_parallel_edges_collapse() {
        let g = parse_dot("graph G { 0 -- 1; 1 -- 0; 1 -- 1; }").unwrap();
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn isolated_nodes_are_kept() {
        let g = parse_dot("graph G { x; y; x -- z }").unwrap();
        assert_eq!(g.node_names(), ["x", "y", "z"]);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn declared_nodes_are_numbered_before_edge_endpoints() {
        let g = parse_dot("graph G { a -- b; c; b -- c; a [label=x]; d -- a }").unwrap();
        assert_eq!(g.node_names(), ["c", "a", "b", "d"]);
        assert!(g.has_edge(1, 2));
        assert!(g.has_edge(0, 2));
        assert!(g.has_edge(3, 1));
    }

    #[test]
    fn comments_are_ignored() {
        let g = parse_dot("graph G { /* c -- d */ a -- b; // e -- f\n # g -- h\n }").unwrap();
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn directed_edges_are_rejected() {
        assert!(parse_dot("graph G { a -> b; }").is_err());
    }

    #[test]
    fn subgraphs_are_rejected() {
        assert!(parse_dot("graph G { subgraph s { a -- b } }").is_err());
    }
}
