//! Positioned syntax tree for Rust source files
//!
//! The extractor does not work on `syn` types directly. It walks a small
//! arena of typed nodes that keeps what the account analysis needs and `syn`
//! drops: attribute and comment nodes as *siblings* of the item they precede,
//! exact byte spans into the original text, and 1-based line numbers.

mod builder;

use crate::errors::AnalyzerResult;

/// Index of a node inside a [`SyntaxTree`]
pub type NodeId = usize;

/// Kinds of nodes produced by the tree builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SourceFile,
    Module,
    StructItem,
    OtherItem,
    AttributeItem,
    Comment,
    FieldDeclarationList,
    FieldDeclaration,
    TypeIdentifier,
    FieldIdentifier,
    Type,
}

impl NodeKind {
    /// Attributes and comments may sit between an item and its derive/account annotations
    pub fn is_attribute_or_comment(self) -> bool {
        matches!(self, NodeKind::AttributeItem | NodeKind::Comment)
    }
}

/// Byte and line range of a node (lines are 1-based, end byte exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
}

/// A single node of the tree
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    fields: Vec<(&'static str, NodeId)>,
}

/// Syntax tree over one source file
#[derive(Debug)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<Node>,
    line_starts: Vec<usize>,
}

impl SyntaxTree {
    /// Parse source text into a tree
    ///
    /// Items with syntax errors are skipped and kept as opaque `OtherItem`
    /// nodes. Fails only when the text cannot be tokenized.
    pub fn parse(source: &str) -> AnalyzerResult<Self> {
        builder::build(source)
    }

    /// The `SourceFile` node
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    /// Raw source text covered by a node
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.nodes[id].span;
        self.source.get(span.start_byte..span.end_byte).unwrap_or("")
    }

    /// Children in source order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Look up a child by its role (`name`, `body`, `type`)
    pub fn child_by_field_name(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.nodes[id]
            .fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, child)| *child)
    }

    /// First direct child of the given kind
    pub fn find_child_by_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.kind(*child) == kind)
    }

    /// All nodes of a kind, in source (pre-order) order
    pub fn find_all(&self, kind: NodeKind) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if self.kind(id) == kind {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// Siblings before `id`, nearest first
    pub fn preceding_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let siblings: &[NodeId] = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &[],
        };
        let position = siblings.iter().position(|sibling| *sibling == id).unwrap_or(0);
        siblings[..position].iter().rev().copied()
    }

    /// Preceding siblings, nearest first, while `predicate` holds for their kind
    pub fn scan_preceding_siblings<P>(&self, id: NodeId, predicate: P) -> Vec<NodeId>
    where
        P: Fn(NodeKind) -> bool,
    {
        self.preceding_siblings(id)
            .take_while(|sibling| predicate(self.kind(*sibling)))
            .collect()
    }

    /// Text of a 1-based source line, without the line terminator
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.source.len());
        self.source
            .get(start..end)
            .map(|text| text.trim_end_matches(['\n', '\r']))
    }
}
