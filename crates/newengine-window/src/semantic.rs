//! Accessibility tree and the frame-to-frame differ.
//!
//! Two generations live side by side in arenas. Nodes link to each other by
//! [`NodeIndex`], which is only meaningful inside the arena generation that
//! produced it.

use std::collections::HashMap;

use crate::geom::Rect;

/// Stable identity of a semantic node across frames. `ROOT` is the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemanticId(pub u64);

impl SemanticId {
    pub const ROOT: SemanticId = SemanticId(0);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SemanticClass {
    #[default]
    Unknown,
    Window,
    Button,
    CheckBox,
    RadioButton,
    Switch,
    Editor,
    Label,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticDesc {
    pub class: SemanticClass,
    pub label: String,
    pub description: String,
    pub selected: Option<bool>,
    pub disabled: bool,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    #[inline]
    fn get(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticNode {
    pub id: SemanticId,
    pub parent: Option<NodeIndex>,
    pub desc: SemanticDesc,
    pub children: Vec<NodeIndex>,
}

/// One generation of the tree. Nodes are stored in pre-order; the first
/// node is the root.
#[derive(Debug, Clone, Default)]
pub struct SemanticTree {
    generation: u64,
    nodes: Vec<SemanticNode>,
}

impl SemanticTree {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn nodes(&self) -> &[SemanticNode] {
        &self.nodes
    }

    #[inline]
    pub fn root(&self) -> Option<&SemanticNode> {
        self.nodes.first()
    }

    #[inline]
    pub fn node(&self, ix: NodeIndex) -> Option<&SemanticNode> {
        self.nodes.get(ix.get())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node. `parent` must already be in this tree.
    pub fn push(&mut self, id: SemanticId, parent: Option<NodeIndex>, desc: SemanticDesc) -> NodeIndex {
        let ix = NodeIndex(self.nodes.len() as u32);
        if let Some(p) = parent {
            if let Some(pn) = self.nodes.get_mut(p.get()) {
                pn.children.push(ix);
            }
        }
        self.nodes.push(SemanticNode {
            id,
            parent,
            desc,
            children: Vec::new(),
        });
        ix
    }

    fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.nodes.clear();
    }
}

/// Double-buffered semantic state of a window.
#[derive(Debug, Default)]
pub struct Semantics {
    uptodate: bool,
    generation: u64,
    root: SemanticId,
    prev: SemanticTree,
    tree: SemanticTree,
    ids: HashMap<SemanticId, NodeIndex>,
}

impl Semantics {
    /// Mark stale after a new frame was committed.
    pub fn invalidate(&mut self) {
        self.ids.clear();
        self.uptodate = false;
    }

    #[inline]
    pub fn is_uptodate(&self) -> bool {
        self.uptodate
    }

    /// Rebuild the current generation unless already current. `fill`
    /// appends the fresh nodes into the recycled buffer.
    pub fn update(&mut self, fill: impl FnOnce(&mut SemanticTree)) {
        if self.uptodate {
            return;
        }
        self.uptodate = true;
        std::mem::swap(&mut self.prev, &mut self.tree);
        self.generation += 1;
        self.tree.reset(self.generation);
        fill(&mut self.tree);

        self.root = self.tree.root().map(|n| n.id).unwrap_or(SemanticId::ROOT);
        self.ids.clear();
        for (i, n) in self.tree.nodes.iter().enumerate() {
            self.ids.insert(n.id, NodeIndex(i as u32));
        }
    }

    #[inline]
    pub fn root(&self) -> SemanticId {
        self.root
    }

    #[inline]
    pub fn tree(&self) -> &SemanticTree {
        &self.tree
    }

    /// `SemanticId::ROOT` resolves to the root node.
    pub fn lookup(&self, id: SemanticId) -> Option<&SemanticNode> {
        let id = if id == SemanticId::ROOT { self.root } else { id };
        let ix = *self.ids.get(&id)?;
        self.tree.node(ix)
    }

    /// IDs of nodes that changed between the previous and current generation.
    /// Deleted nodes are not listed; their parent is.
    pub fn diffs(&self) -> Vec<SemanticId> {
        let mut out = Vec::new();
        if let Some(root) = self.prev.root() {
            self.collect_diffs(&mut out, root);
        }
        out
    }

    fn collect_diffs(&self, out: &mut Vec<SemanticId>, n: &SemanticNode) {
        let Some(new) = self.ids.get(&n.id).and_then(|&ix| self.tree.node(ix)) else {
            return;
        };
        let mut diff = new.desc != n.desc || n.children.len() != new.children.len();
        for (i, &ch) in n.children.iter().enumerate() {
            let Some(old_ch) = self.prev.node(ch) else {
                continue;
            };
            if !diff {
                let new_ch = new.children.get(i).and_then(|&c| self.tree.node(c));
                diff = new_ch.map_or(true, |c| c.id != old_ch.id);
            }
            // Visit every child, whatever the parent's verdict.
            self.collect_diffs(out, old_ch);
        }
        if diff {
            out.push(n.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(label: &str) -> SemanticDesc {
        SemanticDesc {
            label: label.to_string(),
            ..SemanticDesc::default()
        }
    }

    /// `nodes`: (id, parent position in list, label), pre-order.
    fn fill<'a>(nodes: &'a [(u64, Option<usize>, &'a str)]) -> impl FnOnce(&mut SemanticTree) + 'a {
        move |t: &mut SemanticTree| {
            let mut ixs = Vec::new();
            for &(id, parent, label) in nodes {
                let p = parent.map(|p| ixs[p]);
                ixs.push(t.push(SemanticId(id), p, desc(label)));
            }
        }
    }

    fn diffs_between(a: &[(u64, Option<usize>, &str)], b: &[(u64, Option<usize>, &str)]) -> Vec<SemanticId> {
        let mut s = Semantics::default();
        s.update(fill(a));
        s.invalidate();
        s.update(fill(b));
        s.diffs()
    }

    #[test]
    fn unchanged_tree_has_no_diffs() {
        let t = [(1, None, "root"), (2, Some(0), "a"), (3, Some(0), "b")];
        assert!(diffs_between(&t, &t).is_empty());
    }

    #[test]
    fn removed_leaf_is_reported_through_parent() {
        let a = [(1, None, "root"), (2, Some(0), "a"), (3, Some(1), "leaf")];
        let b = [(1, None, "root"), (2, Some(0), "a")];
        assert_eq!(diffs_between(&a, &b), vec![SemanticId(2)]);
    }

    #[test]
    fn removed_subtree_is_not_walked() {
        let a = [
            (1, None, "root"),
            (2, Some(0), "gone"),
            (3, Some(1), "gone child"),
            (4, Some(0), "kept"),
        ];
        let b = [(1, None, "root"), (4, Some(0), "kept")];
        // Root changed child count; nodes 2 and 3 are silent.
        assert_eq!(diffs_between(&a, &b), vec![SemanticId(1)]);
    }

    #[test]
    fn reordered_children_mark_parent() {
        let a = [(1, None, "root"), (2, Some(0), "a"), (3, Some(0), "b")];
        let b = [(1, None, "root"), (3, Some(0), "b"), (2, Some(0), "a")];
        assert_eq!(diffs_between(&a, &b), vec![SemanticId(1)]);
    }

    #[test]
    fn children_visited_even_when_parent_differs() {
        // Parent and child both changed: both reported, child first.
        let a = [(1, None, "root"), (2, Some(0), "a")];
        let b = [(1, None, "root*"), (2, Some(0), "a*")];
        assert_eq!(diffs_between(&a, &b), vec![SemanticId(2), SemanticId(1)]);
    }

    #[test]
    fn update_is_noop_while_current() {
        let mut s = Semantics::default();
        s.update(fill(&[(7, None, "root")]));
        s.update(|_| panic!("must not rebuild"));
        assert_eq!(s.root(), SemanticId(7));
        assert_eq!(s.lookup(SemanticId::ROOT).map(|n| n.id), Some(SemanticId(7)));
        assert_eq!(s.tree().generation(), 1);
    }
}
