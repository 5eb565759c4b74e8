//! Parse trees and their out-of-band analysis info.

use crate::node::{Node, NodeData, NodeIndex};
use crate::node_arena::NodeArena;
use crate::state::{ParseDiagnostic, ParserState};
use pyz_common::position::{LineMap, TextSpan};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Analysis results attached to nodes, keyed by node identity.
///
/// The table is stamped with the generation its entries were computed in.
/// Entries never live in the nodes themselves, so discarding them leaves the
/// tree's shape untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisSideTable<A> {
    entries: FxHashMap<NodeIndex, A>,
    stamp: u64,
}

impl<A> Default for AnalysisSideTable<A> {
    fn default() -> Self {
        AnalysisSideTable {
            entries: FxHashMap::default(),
            stamp: 0,
        }
    }
}

impl<A> AnalysisSideTable<A> {
    #[inline]
    pub fn get(&self, node: NodeIndex) -> Option<&A> {
        self.entries.get(&node)
    }

    #[inline]
    pub fn get_mut(&mut self, node: NodeIndex) -> Option<&mut A> {
        self.entries.get_mut(&node)
    }

    pub fn insert(&mut self, node: NodeIndex, info: A) -> Option<A> {
        self.entries.insert(node, info)
    }

    pub fn remove(&mut self, node: NodeIndex) -> Option<A> {
        self.entries.remove(&node)
    }

    pub fn entry_or_default(&mut self, node: NodeIndex) -> &mut A
    where
        A: Default,
    {
        self.entries.entry(node).or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generation the current entries belong to.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn set_stamp(&mut self, generation: u64) {
        self.stamp = generation;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stamp = 0;
    }
}

/// One file's syntax tree.
///
/// `A` is the per-node analysis info stored in the side table; the parser
/// itself never fills it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTree<A = ()> {
    arena: Arc<NodeArena>,
    root: NodeIndex,
    line_map: LineMap,
    pub analysis: AnalysisSideTable<A>,
}

impl<A> ParseTree<A> {
    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Shared handle to the nodes, for readers that outlive a borrow of the tree.
    pub fn shared_arena(&self) -> Arc<NodeArena> {
        Arc::clone(&self.arena)
    }

    #[inline]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.arena.get(index)
    }

    #[inline]
    pub fn data(&self, index: NodeIndex) -> Option<&NodeData> {
        self.arena.data(index)
    }

    #[inline]
    pub fn span(&self, index: NodeIndex) -> TextSpan {
        self.arena.span(index)
    }

    /// Top-level statements of the module.
    pub fn statements(&self) -> &[NodeIndex] {
        match self.arena.data(self.root) {
            Some(NodeData::Module { body }) => body,
            _ => &[],
        }
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn node_at_offset(&self, offset: u32) -> NodeIndex {
        self.arena.node_at_offset(self.root, offset)
    }

    /// Whether analysis info is attached to any node.
    pub fn is_clean(&self) -> bool {
        self.analysis.is_empty()
    }

    /// Same nodes, no analysis info.
    pub fn same_shape<B>(&self, other: &ParseTree<B>) -> bool {
        self.root == other.root && self.arena == other.arena
    }
}

#[derive(Clone, Debug)]
pub struct ParseResult<A = ()> {
    pub tree: ParseTree<A>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parse file content into a best-effort tree plus syntax diagnostics.
///
/// Deterministic and free of shared state: parsing the same content twice
/// yields equal trees and identical diagnostics.
#[tracing::instrument(level = "debug", skip_all, fields(len = content.len()))]
pub fn parse<A>(content: &str) -> ParseResult<A> {
    let mut parser = ParserState::new(content);
    let root = parser.parse_source_file();
    let mut diagnostics = std::mem::take(&mut parser.parse_diagnostics);
    diagnostics.sort_by_key(|d| (d.start, d.code));
    let tree = ParseTree {
        arena: Arc::new(parser.arena),
        root,
        line_map: LineMap::build(content),
        analysis: AnalysisSideTable::default(),
    };
    debug!(
        nodes = tree.node_count(),
        diagnostics = diagnostics.len(),
        "parsed"
    );
    ParseResult { tree, diagnostics }
}

/// Discard all attached analysis info, keeping the nodes.
pub fn clean<A>(tree: &mut ParseTree<A>) {
    if tree.analysis.is_empty() && tree.analysis.stamp() == 0 {
        return;
    }
    trace!(entries = tree.analysis.len(), "cleaning parse tree");
    tree.analysis.clear();
}
