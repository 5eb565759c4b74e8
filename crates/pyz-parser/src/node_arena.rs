//! Flat node storage for a parse tree.

use crate::node::{Node, NodeData, NodeIndex};
use pyz_common::interner::{Atom, Interner};
use pyz_common::position::TextSpan;

/// All nodes of one parse tree plus the interner for its identifiers.
///
/// Nodes are only ever appended; a child is always added before its parent,
/// so parents have larger indices than their children.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeArena {
    nodes: Vec<Node>,
    interner: Interner,
}

impl NodeArena {
    /// Maximum pre-allocation to avoid capacity overflow in huge files.
    const MAX_NODE_PREALLOC: usize = 5_000_000;

    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Create an arena sized for a source of roughly `source_len` bytes.
    pub fn with_capacity(source_len: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity((source_len / 3).min(Self::MAX_NODE_PREALLOC)),
            interner: Interner::with_prelude(),
        }
    }

    /// Append a node and point its children back at it.
    pub fn add(&mut self, data: NodeData, span: TextSpan) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        for child in data.children() {
            if let Some(node) = self.nodes.get_mut(child.index()) {
                node.parent = index;
            }
        }
        self.nodes.push(Node {
            data,
            span,
            parent: NodeIndex::NONE,
        });
        index
    }

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.index())
    }

    #[inline]
    pub fn data(&self, index: NodeIndex) -> Option<&NodeData> {
        self.get(index).map(|n| &n.data)
    }

    /// Span of a node; empty for `NONE` or out-of-range indices.
    #[inline]
    pub fn span(&self, index: NodeIndex) -> TextSpan {
        self.get(index).map(|n| n.span).unwrap_or_default()
    }

    #[inline]
    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map(|n| n.parent).unwrap_or(NodeIndex::NONE)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn resolve(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    /// Text of a `Name` node.
    pub fn name_text(&self, index: NodeIndex) -> Option<&str> {
        match self.data(index)? {
            NodeData::Name { id } => Some(self.interner.resolve(*id)),
            _ => None,
        }
    }

    pub fn name_atom(&self, index: NodeIndex) -> Option<Atom> {
        match self.data(index)? {
            NodeData::Name { id } => Some(*id),
            _ => None,
        }
    }

    /// Dotted text of a list of `Name` nodes (`a.b.c`).
    pub fn dotted_text(&self, parts: &[NodeIndex]) -> String {
        let mut out = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(self.name_text(*part).unwrap_or(""));
        }
        out
    }

    /// Iterate the parent chain, starting at `index` itself.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = index;
        std::iter::from_fn(move || {
            if current.is_none() || current.index() >= self.nodes.len() {
                return None;
            }
            let here = current;
            current = self.parent(current);
            Some(here)
        })
    }

    /// Preorder walk below (and including) `root`.
    pub fn walk(&self, root: NodeIndex, mut visit: impl FnMut(NodeIndex, &Node)) {
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let Some(node) = self.get(index) else {
                continue;
            };
            visit(index, node);
            let children = node.data.children();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Innermost node whose span touches `offset`.
    pub fn node_at_offset(&self, root: NodeIndex, offset: u32) -> NodeIndex {
        let mut current = root;
        if !self.span(root).touches(offset) {
            return NodeIndex::NONE;
        }
        'descend: loop {
            let Some(node) = self.get(current) else {
                return current;
            };
            for child in node.data.children() {
                let span = self.span(child);
                if span.touches(offset) && !span.is_empty() {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }
}
