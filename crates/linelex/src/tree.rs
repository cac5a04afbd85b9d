//! The document tree: an arena of nodes addressed by [`NodeId`].
//!
//! Parent links and the ability to mutate a node's entity in place (needed
//! while a section's marker fields are filled in across several scanner
//! events) are exactly what an arena buys over a tree of owned boxes: the
//! scanner can hold a `NodeId` pointing at an in-progress section and keep
//! writing into it without any interior mutability wrapper.

use serde::Serialize;

use crate::entity::Entity;
use linelex_common::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub entity: Option<Entity>,
    pub children: Vec<NodeId>,
}

impl Node {
    fn empty(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            entity: None,
            children: Vec::new(),
        }
    }
}

/// Owns every node ever allocated during a lex pass. Nodes are append-only;
/// the lexer never removes a node, only detaches statements from a
/// section's `children` when it adopts them as `first_statement`/
/// `final_statement`.
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    pub fn new() -> Self {
        let root = Node::empty(None);
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::empty(parent));
        id
    }

    /// Unconditionally append a fresh empty child under `current` and return it.
    pub fn create_leaf(&mut self, current: NodeId) -> NodeId {
        let leaf = self.alloc(Some(current));
        self.nodes[current.index()].children.push(leaf);
        leaf
    }

    /// Move to a new sibling slot, reshaping the tree if `current` is the
    /// (empty) root: the old root is demoted to a leaf under a freshly
    /// allocated root, alongside a new empty leaf that becomes `current`.
    ///
    /// No-op (returns `current` unchanged) if `current` holds no entity yet.
    pub fn create_sibling(&mut self, current: NodeId) -> NodeId {
        if self.nodes[current.index()].entity.is_none() {
            return current;
        }
        if current == self.root {
            let old_root = current;
            let new_root_id = NodeId(self.nodes.len() as u32);
            self.nodes.push(Node::empty(None));

            self.nodes[old_root.index()].parent = Some(new_root_id);
            let new_leaf = self.alloc(Some(new_root_id));
            self.nodes[new_root_id.index()].children = vec![old_root, new_leaf];

            self.root = new_root_id;
            new_leaf
        } else {
            let parent = self.nodes[current.index()]
                .parent
                .expect("non-root node always has a parent");
            let sibling = self.alloc(Some(parent));
            self.nodes[parent.index()].children.push(sibling);
            sibling
        }
    }

    /// Store `entity` in `current` if it is empty, else create a sibling and
    /// store it there. Returns the node the entity ended up in.
    pub fn set_entity_and_sibling(&mut self, current: NodeId, entity: Entity) -> NodeId {
        let target = if self.nodes[current.index()].entity.is_none() {
            current
        } else {
            self.create_sibling(current)
        };
        self.nodes[target.index()].entity = Some(entity);
        target
    }

    /// Index of `child` within its parent's `children`, if it has a parent.
    pub fn index_in_parent(&self, child: NodeId) -> Option<usize> {
        let parent = self.nodes[child.index()].parent?;
        self.nodes[parent.index()]
            .children
            .iter()
            .position(|&c| c == child)
    }

    /// The sibling immediately before `node` under the same parent, without
    /// detaching it. The caller decides whether to [`Tree::detach`] it --
    /// section closure only adopts that sibling when it is actually a
    /// `Statement`, mirroring the original's conditional removal.
    pub fn sibling_before(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.index()].parent?;
        let idx = self.index_in_parent(node)?;
        if idx == 0 {
            return None;
        }
        Some(self.nodes[parent.index()].children[idx - 1])
    }

    /// Look up the previous sibling and detach it in one step, for callers
    /// that have already decided they want it regardless of what it holds.
    pub fn take_previous_sibling(&mut self, node: NodeId) -> Option<NodeId> {
        let sibling = self.sibling_before(node)?;
        self.detach(sibling);
        Some(sibling)
    }

    /// The first child of `node`, without detaching it.
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].children.first().copied()
    }

    /// The last child of `node`, without detaching it.
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].children.last().copied()
    }

    /// Remove `child` from its parent's children list, if it has a parent
    /// and is still listed there. No-op otherwise.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.index()].parent {
            if let Some(idx) = self.nodes[parent.index()]
                .children
                .iter()
                .position(|&c| c == child)
            {
                self.nodes[parent.index()].children.remove(idx);
            }
        }
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node.index()].children.len()
    }

    /// Render a node's subtree, byte-exact to the slice of input it covers.
    pub fn verbatim_text(&self, id: NodeId) -> String {
        let node = &self.nodes[id.index()];
        let mut out = String::new();
        let section = node.entity.as_ref().and_then(Entity::as_section);

        if let Some(section) = section {
            out.push_str(&section.opening_prefix);
            if let Some(first) = &section.first_statement {
                out.push_str(&first.verbatim_text());
            }
            out.push_str(&section.opening_suffix);
        } else if let Some(entity) = &node.entity {
            if let Entity::Statement(stmt) = entity {
                out.push_str(&stmt.verbatim_text());
            }
        }

        for &leaf in &node.children {
            out.push_str(&self.verbatim_text(leaf));
        }

        if let Some(section) = section {
            out.push_str(&section.closing_prefix);
            if let Some(final_stmt) = &section.final_statement {
                out.push_str(&final_stmt.verbatim_text());
            }
            out.push_str(&section.closing_suffix);
        }

        out
    }

    /// Byte-offset span of every node's verbatim text, indexed by
    /// [`NodeId`]. Computed on demand from the same structural recursion as
    /// [`Tree::verbatim_text`] rather than tracked incrementally during
    /// scanning, so it stays correct even across the reshaping
    /// [`Tree::create_sibling`] does when the root is promoted.
    pub fn spans(&self) -> Vec<Span> {
        let mut out = vec![Span::new(0, 0); self.nodes.len()];
        self.fill_spans(self.root, 0, &mut out);
        out
    }

    /// Span of a single node. Convenience wrapper over [`Tree::spans`] for
    /// callers that only need one node's offsets; recomputes the whole
    /// table, so prefer `spans()` directly when looking up more than one.
    pub fn span(&self, id: NodeId) -> Span {
        self.spans()[id.index()]
    }

    fn fill_spans(&self, id: NodeId, start: u32, out: &mut [Span]) -> u32 {
        let node = &self.nodes[id.index()];
        let mut pos = start;
        let section = node.entity.as_ref().and_then(Entity::as_section);

        if let Some(section) = section {
            pos += section.opening_prefix.len() as u32;
            if let Some(first) = &section.first_statement {
                pos += first.verbatim_text().len() as u32;
            }
            pos += section.opening_suffix.len() as u32;
        } else if let Some(Entity::Statement(stmt)) = &node.entity {
            pos += stmt.verbatim_text().len() as u32;
        }

        for &child in &node.children {
            pos = self.fill_spans(child, pos, out);
        }

        if let Some(section) = section {
            pos += section.closing_prefix.len() as u32;
            if let Some(final_stmt) = &section.final_statement {
                pos += final_stmt.verbatim_text().len() as u32;
            }
            pos += section.closing_suffix.len() as u32;
        }

        out[id.index()] = Span::new(start, pos);
        pos
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Statement;

    #[test]
    fn new_tree_has_empty_root() {
        let tree = Tree::new();
        assert!(tree.node(tree.root()).entity.is_none());
        assert!(tree.node(tree.root()).children.is_empty());
    }

    #[test]
    fn set_entity_on_empty_current_stays_put() {
        let mut tree = Tree::new();
        let root = tree.root();
        let stmt = Entity::Statement(Statement {
            ending: "\n".into(),
            ..Default::default()
        });
        let target = tree.set_entity_and_sibling(root, stmt);
        assert_eq!(target, root);
    }

    #[test]
    fn sibling_of_root_promotes_to_new_root() {
        let mut tree = Tree::new();
        let root = tree.root();
        let stmt = Entity::Statement(Statement {
            ending: "\n".into(),
            ..Default::default()
        });
        tree.set_entity_and_sibling(root, stmt);

        let new_current = tree.create_sibling(root);
        assert_ne!(tree.root(), root, "root should have been promoted");
        assert_eq!(tree.node(tree.root()).children.len(), 2);
        assert_eq!(tree.node(tree.root()).children[0], root);
        assert_eq!(tree.node(tree.root()).children[1], new_current);
    }

    #[test]
    fn create_leaf_descends_under_current() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree.create_leaf(root);
        assert_eq!(tree.node(root).children, vec![leaf]);
        assert_eq!(tree.node(leaf).parent, Some(root));
    }

    #[test]
    fn take_previous_sibling_detaches_it() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.create_leaf(root);
        let b = tree.create_leaf(root);
        let detached = tree.take_previous_sibling(b);
        assert_eq!(detached, Some(a));
        assert_eq!(tree.node(root).children, vec![b]);
    }

    #[test]
    fn spans_cover_sibling_statements_without_gaps_or_overlap() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.set_entity_and_sibling(
            root,
            Entity::Statement(Statement { ending: "\n".into(), ..Default::default() }),
        );
        let b = tree.create_sibling(a);
        tree.node_mut(b).entity = Some(Entity::Statement(Statement {
            ending: "\n".into(),
            indent: "  ".into(),
            ..Default::default()
        }));

        let spans = tree.spans();
        let span_a = spans[a.index()];
        let span_b = spans[b.index()];
        assert_eq!(span_a.start, 0);
        assert_eq!(span_a.end, 1, "a bare ending statement renders as just its ending");
        assert_eq!(span_b.start, span_a.end, "b starts exactly where a ends");
        assert_eq!(span_b.end - span_b.start, 3, "two-space indent plus the ending byte");
    }
}
