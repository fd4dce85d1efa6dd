//! Arena-allocated search tree.

/// A node of a search [`Tree`].
///
/// Children are owned by the arena and referred to by index; the parent
/// link is a plain index as well.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<P> {
    /// Index of the parent, `None` for the root.
    pub parent: Option<usize>,

    /// Indices of the children, empty until the node is expanded.
    pub children: Vec<usize>,

    /// Action leading from the parent to this node, `None` for the root.
    pub action: Option<usize>,

    /// Player who made that action, `None` for the root.
    pub player: Option<P>,

    /// Number of iterations that passed through this node.
    pub visits: u64,

    /// Number of those iterations won by `player`.
    pub score: f64,
}

impl<P> Node<P> {
    fn new(parent: Option<usize>, action: Option<usize>, player: Option<P>) -> Self {
        Self {
            parent,
            children: vec![],
            action,
            player,
            visits: 0,
            score: 0.0,
        }
    }

    /// Returns `true` if the node has been expanded.
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Search tree grown from a single root position.
#[derive(Clone, Debug)]
pub struct Tree<P> {
    nodes: Vec<Node<P>>,
}

impl<P: Copy + Eq> Tree<P> {
    /// A tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None, None)],
        }
    }

    /// Index of the root.
    pub fn root(&self) -> usize {
        0
    }

    /// The node at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not returned by this tree.
    pub fn node(&self, id: usize) -> &Node<P> {
        &self.nodes[id]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root is never removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, the root first.
    pub fn iter(&self) -> std::slice::Iter<'_, Node<P>> {
        self.nodes.iter()
    }

    /// Appends a child reached from `parent` by `player` playing `action`.
    pub fn add_child(&mut self, parent: usize, action: usize, player: P) -> usize {
        let id = self.nodes.len();
        self.nodes
            .push(Node::new(Some(parent), Some(action), Some(player)));
        self.nodes[parent].children.push(id);
        id
    }

    /// Counts one visit on every node from `id` up to the root, and one win
    /// on each of them whose player is `winner`.
    pub fn backpropagate(&mut self, id: usize, winner: Option<P>) {
        let mut cur = Some(id);
        while let Some(i) = cur {
            let node = &mut self.nodes[i];
            node.visits += 1;
            if winner.is_some() && node.player == winner {
                node.score += 1.0;
            }
            cur = node.parent;
        }
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: usize) -> usize {
        let mut depth = 0;
        let mut cur = self.nodes[id].parent;
        while let Some(i) = cur {
            depth += 1;
            cur = self.nodes[i].parent;
        }
        depth
    }

    /// Child of the root with the highest raw score, the first one on ties.
    pub fn best_root_child(&self) -> Option<&Node<P>> {
        let mut best: Option<&Node<P>> = None;
        for &c in self.nodes[self.root()].children.iter() {
            let node = &self.nodes[c];
            if best.map_or(true, |b| node.score > b.score) {
                best = Some(node);
            }
        }
        best
    }
}

impl<P: Copy + Eq> Default for Tree<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_backpropagate() {
        let mut tree = Tree::<u8>::new();
        let a = tree.add_child(0, 0, 1);
        let b = tree.add_child(0, 1, 1);
        let aa = tree.add_child(a, 2, 2);

        tree.backpropagate(aa, Some(1));
        tree.backpropagate(b, Some(2));
        tree.backpropagate(a, None);

        assert_eq!(tree.node(0).visits, 3);
        assert_eq!(tree.node(0).score, 0.0);
        assert_eq!((tree.node(a).visits, tree.node(a).score), (2, 1.0));
        assert_eq!((tree.node(aa).visits, tree.node(aa).score), (1, 0.0));
        assert_eq!((tree.node(b).visits, tree.node(b).score), (1, 0.0));
        assert_eq!(tree.depth(aa), 2);
    }

    #[test]
    fn test_best_root_child_first_max() {
        let mut tree = Tree::<u8>::new();
        let a = tree.add_child(0, 4, 1);
        let b = tree.add_child(0, 7, 1);
        tree.backpropagate(a, Some(1));
        tree.backpropagate(b, Some(1));
        assert_eq!(tree.best_root_child().unwrap().action, Some(4));

        tree.backpropagate(b, Some(1));
        assert_eq!(tree.best_root_child().unwrap().action, Some(7));
    }
}
