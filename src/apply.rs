//! Writing a successful result back into a surface.
//!
//! Editable surfaces get the selected range replaced in place, with the caret
//! left right after the inserted text. Read-only text gets a dismissible
//! result card next to the selection's nearest block-level ancestor.
//!
//! Both paths check that the surface still holds the text the action was
//! dispatched for. A mismatch is an `Application` error: the caller shows a
//! failure notice and the surface is left untouched.

use crate::error::{GrammaryError, Result};
use crate::selection::char_slice;

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Replace characters `start..end` of `value` with `replacement`.
fn splice(value: &str, start: usize, end: usize, replacement: &str) -> String {
    let head = char_slice(value, 0, start);
    let tail = char_slice(value, end, usize::MAX);
    let mut out = String::with_capacity(head.len() + replacement.len() + tail.len());
    out.push_str(head);
    out.push_str(replacement);
    out.push_str(tail);
    out
}

/// A single or multi-line text control: its value plus selection offsets in
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextField {
    pub value: String,
    pub selection_start: usize,
    pub selection_end: usize,
    pub focused: bool,
}

impl TextField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn select(&mut self, start: usize, end: usize) {
        self.selection_start = start.min(end);
        self.selection_end = start.max(end);
        self.focused = true;
    }

    pub fn selected_text(&self) -> &str {
        char_slice(&self.value, self.selection_start, self.selection_end)
    }

    /// Replace `start..end` (which must still read `expected`) with
    /// `replacement`, then focus the field with the caret at
    /// `start + replacement.len()` in characters. Returns the caret.
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        expected: &str,
        replacement: &str,
    ) -> Result<usize> {
        if end > char_len(&self.value) || char_slice(&self.value, start, end) != expected {
            return Err(GrammaryError::Application(format!(
                "field no longer holds the selected text at {}..{}",
                start, end
            )));
        }
        self.value = splice(&self.value, start, end, replacement);
        let caret = start + char_len(replacement);
        self.selection_start = caret;
        self.selection_end = caret;
        self.focused = true;
        Ok(caret)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
}

/// Original text, transformed text and a label, with a close control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCard {
    pub label: String,
    pub original: String,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String, display: Display },
    Text(String),
    Card(ResultCard),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A small document tree: enough structure to find where a result card goes
/// and to edit text nodes of rich surfaces.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a block-level `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Element {
                    tag: "body".into(),
                    display: Display::Block,
                },
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, display: Display) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                tag: tag.into(),
                display,
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.into()))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Unlink `id` (and its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|c| *c != id);
            self.nodes[id.0].parent = None;
        }
    }

    fn insert_child(&mut self, parent: NodeId, index: usize, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    fn is_inline(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            Some(NodeKind::Element {
                display: Display::Inline,
                ..
            })
        )
    }

    /// Insert `card` for a selection whose range starts in `anchor`.
    ///
    /// Text nodes resolve to their element; inline elements are walked up to
    /// the nearest block ancestor and the card goes right after it. If the
    /// walk reaches the root, the card is wrapped in a block container placed
    /// at the top of the root. Returns the card's node.
    pub fn insert_result_card(&mut self, anchor: NodeId, card: ResultCard) -> Result<NodeId> {
        if !self.is_attached(anchor) {
            return Err(GrammaryError::Application(
                "selection range is detached from the document".into(),
            ));
        }

        let mut target = anchor;
        while !matches!(self.kind(target), Some(NodeKind::Element { .. })) {
            match self.parent(target) {
                Some(parent) => target = parent,
                None => break,
            }
        }
        while self.is_inline(target) {
            match self.parent(target) {
                Some(parent) => target = parent,
                None => break,
            }
        }

        if target == self.root {
            let wrapper = self.insert_child(
                self.root,
                0,
                NodeKind::Element {
                    tag: "div".into(),
                    display: Display::Block,
                },
            );
            return Ok(self.push(wrapper, NodeKind::Card(card)));
        }

        let parent = self.parent(target).ok_or_else(|| {
            GrammaryError::Application("block ancestor has no parent".into())
        })?;
        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == target)
            .map(|i| i + 1)
            .unwrap_or(usize::MAX);
        Ok(self.insert_child(parent, index, NodeKind::Card(card)))
    }

    /// Replace characters `start..end` of a text node that must still read
    /// `expected`. Returns the caret offset inside the node.
    pub fn replace_text(
        &mut self,
        node: NodeId,
        start: usize,
        end: usize,
        expected: &str,
        replacement: &str,
    ) -> Result<usize> {
        if !self.is_attached(node) {
            return Err(GrammaryError::Application(
                "selection range is detached from the document".into(),
            ));
        }
        let Some(NodeKind::Text(text)) = self.nodes.get_mut(node.0).map(|n| &mut n.kind) else {
            return Err(GrammaryError::Application(
                "selection does not start in a text node".into(),
            ));
        };
        if end > char_len(text) || char_slice(text, start, end) != expected {
            return Err(GrammaryError::Application(
                "text node no longer holds the selected text".into(),
            ));
        }
        *text = splice(text, start, end, replacement);
        Ok(start + char_len(replacement))
    }

    /// All result cards, in tree order.
    pub fn cards(&self) -> Vec<(NodeId, &ResultCard)> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(NodeKind::Card(card)) = self.kind(id) {
                out.push((id, card));
            }
            stack.extend(self.children(id).iter().rev());
        }
        out
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;
