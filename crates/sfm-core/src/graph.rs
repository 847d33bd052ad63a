//! Connected components over arbitrary hashable node ids.

use std::collections::HashMap;
use std::hash::Hash;

use disjoint_sets::UnionFind;

/// Union-find keyed by node id.
///
/// Nodes are interned to dense indices and added lazily by
/// [`ConnectedComponents::add_edge`] or [`ConnectedComponents::add_node`].
#[derive(Debug, Clone)]
pub struct ConnectedComponents<T> {
    index: HashMap<T, usize>,
    nodes: Vec<T>,
    sets: UnionFind<usize>,
}

impl<T> Default for ConnectedComponents<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            nodes: Vec::new(),
            sets: UnionFind::new(0),
        }
    }
}

impl<T: Copy + Eq + Hash> ConnectedComponents<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_node(&mut self, node: T) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.sets.alloc();
        self.index.insert(node, i);
        self.nodes.push(node);
        i
    }

    pub fn add_edge(&mut self, a: T, b: T) {
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        self.sets.union(ia, ib);
    }

    /// Representative node of the component containing `node`, or `None` if
    /// the node was never added.
    pub fn root(&self, node: &T) -> Option<T> {
        let i = *self.index.get(node)?;
        Some(self.nodes[self.sets.find(i)])
    }

    pub fn same_component(&self, a: &T, b: &T) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.sets.equiv(ia, ib),
            _ => false,
        }
    }

    /// All components, keyed by their representative node.
    pub fn components(&self) -> HashMap<T, Vec<T>> {
        let mut out: HashMap<T, Vec<T>> = HashMap::new();
        for (i, root) in self.sets.to_vec().into_iter().enumerate() {
            out.entry(self.nodes[root]).or_default().push(self.nodes[i]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_merge_into_one_component() {
        let mut cc = ConnectedComponents::new();
        cc.add_edge(1u32, 2);
        cc.add_edge(3, 4);
        assert!(!cc.same_component(&1, &4));
        cc.add_edge(2, 3);
        assert!(cc.same_component(&1, &4));
        assert_eq!(cc.components().len(), 1);
    }

    #[test]
    fn isolated_nodes_are_singletons() {
        let mut cc = ConnectedComponents::new();
        cc.add_node(7u32);
        cc.add_edge(1, 2);
        let comps = cc.components();
        assert_eq!(comps.len(), 2);
        assert_eq!(cc.root(&7), Some(7));
        assert_eq!(cc.root(&99), None);
    }

    #[test]
    fn repeated_nodes_keep_their_index() {
        let mut cc = ConnectedComponents::new();
        let a = cc.add_node(40u32);
        cc.add_edge(40, 41);
        assert_eq!(cc.add_node(40), a);
        assert_eq!(cc.num_nodes(), 2);
        assert_eq!(cc.root(&40), cc.root(&41));
    }

    #[test]
    fn components_list_every_member_once() {
        let mut cc = ConnectedComponents::new();
        for (a, b) in [(0u32, 1), (1, 2), (5, 6), (9, 9)] {
            cc.add_edge(a, b);
        }
        let mut sizes: Vec<usize> = cc.components().values().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 2, 3]);
    }
}
