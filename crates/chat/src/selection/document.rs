//! Rendered message tree
//!
//! A minimal stand-in for the element tree a message is rendered into:
//! element nodes (markup) and text nodes, addressed by [`NodeId`]. Range
//! boundaries follow DOM conventions so native selections map directly.

use std::fmt;

/// Handle to a node of a [`RenderedDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A position inside the tree
///
/// Inside a text node `offset` counts chars; inside an element it is a
/// child index (`0..=children.len()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selected range between two boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl NativeRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A caret: both boundaries at the same place
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena of element and text nodes with a single root element
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    nodes: Vec<Node>,
}

impl RenderedDocument {
    /// Create a document holding only a root element
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element {
                    tag: "body".to_string(),
                },
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        self.push(parent, NodeKind::Element { tag: tag.into() })
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, NodeKind::Text(text.into()))
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node.0).map_or(&[], |n| n.children.as_slice())
    }

    /// Tag name of an element node
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Whether `node` is `ancestor` or lies beneath it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Deepest node containing both `a` and `b`
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let mut current = a;
        loop {
            if self.contains(current, b) {
                return current;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return self.root(),
            }
        }
    }

    /// Concatenated text of every text node under `node`, markup dropped
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Length in chars of the text before `boundary`, within `container`
    ///
    /// This is the length of a range spanning from the start of
    /// `container` to `boundary`. `None` if the boundary is outside.
    pub fn offset_of(&self, container: NodeId, boundary: Boundary) -> Option<usize> {
        if !self.contains(container, boundary.node) {
            return None;
        }
        let mut acc = 0;
        self.measure_until(container, boundary, &mut acc).then_some(acc)
    }

    /// Accumulate text length in document order; true once `boundary` is reached
    fn measure_until(&self, node: NodeId, boundary: Boundary, acc: &mut usize) -> bool {
        let entry = &self.nodes[node.0];
        match &entry.kind {
            NodeKind::Text(text) => {
                let len = text.chars().count();
                if node == boundary.node {
                    *acc += boundary.offset.min(len);
                    return true;
                }
                *acc += len;
                false
            }
            NodeKind::Element { .. } => {
                for (index, child) in entry.children.iter().enumerate() {
                    if node == boundary.node && index == boundary.offset {
                        return true;
                    }
                    if self.measure_until(*child, boundary, acc) {
                        return true;
                    }
                }
                node == boundary.node
            }
        }
    }

    /// Boundary inside a text node for the char offset `offset` of
    /// `container`'s text; the inverse of [`offset_of`](Self::offset_of)
    pub fn boundary_at(&self, container: NodeId, offset: usize) -> Option<Boundary> {
        let mut acc = 0;
        let mut last_text = None;
        for node in self.descendants(container) {
            if let NodeKind::Text(text) = &self.nodes[node.0].kind {
                let len = text.chars().count();
                if offset <= acc + len {
                    return Some(Boundary::new(node, offset - acc));
                }
                acc += len;
                last_text = Some(node);
            }
        }
        match last_text {
            None if offset == 0 => Some(Boundary::new(container, 0)),
            _ => None,
        }
    }

    /// Pre-order walk of `node`'s subtree, `node` included
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }
}

impl Default for RenderedDocument {
    fn default() -> Self {
        Self::new()
    }
}
