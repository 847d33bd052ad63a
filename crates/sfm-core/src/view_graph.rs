//! View-graph connectivity filtering.
//!
//! Global position estimation needs a single connected set of views: the
//! relative constraints only fix positions up to one similarity transform
//! per component. These functions keep the largest connected component and
//! drop everything else.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::{ConnectedComponents, TwoViewInfo, ViewId, ViewIdPair};

struct ComponentStats {
    root: ViewId,
    num_edges: usize,
    num_views: usize,
    min_view: ViewId,
}

/// Root of the component to keep: the one with most edges, then most views,
/// then the smallest view id.
fn largest_component_root(
    components: &ConnectedComponents<ViewId>,
    pairs: impl Iterator<Item = ViewIdPair>,
) -> Option<ViewId> {
    let mut edges_per_root: HashMap<ViewId, usize> = HashMap::new();
    for pair in pairs {
        if let Some(root) = components.root(&pair.first()) {
            *edges_per_root.entry(root).or_default() += 1;
        }
    }

    components
        .components()
        .into_iter()
        .filter_map(|(root, views)| {
            let min_view = views.iter().copied().min()?;
            Some(ComponentStats {
                root,
                num_edges: edges_per_root.get(&root).copied().unwrap_or(0),
                num_views: views.len(),
                min_view,
            })
        })
        .max_by(|a, b| {
            a.num_edges
                .cmp(&b.num_edges)
                .then(a.num_views.cmp(&b.num_views))
                .then(b.min_view.cmp(&a.min_view))
        })
        .map(|s| s.root)
}

/// Views belonging to the largest connected component of the graph.
pub fn largest_connected_component_views<V>(view_pairs: &HashMap<ViewIdPair, V>) -> HashSet<ViewId> {
    let mut components = ConnectedComponents::new();
    for pair in view_pairs.keys() {
        components.add_edge(pair.first(), pair.second());
    }
    let Some(root) = largest_component_root(&components, view_pairs.keys().copied()) else {
        return HashSet::new();
    };
    components
        .components()
        .remove(&root)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// Remove, in place, every view pair outside the largest connected
/// component. Returns the number of removed pairs.
///
/// An empty map is valid input and stays empty. Running the filter on its
/// own output removes nothing.
pub fn remove_disconnected_view_pairs(view_pairs: &mut HashMap<ViewIdPair, TwoViewInfo>) -> usize {
    let keep = largest_connected_component_views(view_pairs);
    let before = view_pairs.len();
    view_pairs.retain(|pair, _| keep.contains(&pair.first()));
    let removed = before - view_pairs.len();
    debug!(
        "view graph filter: kept {} pairs over {} views, removed {} pairs",
        view_pairs.len(),
        keep.len(),
        removed
    );
    removed
}

/// Copying variant of [`remove_disconnected_view_pairs`].
pub fn largest_connected_component_pairs(
    view_pairs: &HashMap<ViewIdPair, TwoViewInfo>,
) -> HashMap<ViewIdPair, TwoViewInfo> {
    let keep = largest_connected_component_views(view_pairs);
    view_pairs
        .iter()
        .filter(|(pair, _)| keep.contains(&pair.first()))
        .map(|(pair, info)| (*pair, info.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(ViewId, ViewId)]) -> HashMap<ViewIdPair, TwoViewInfo> {
        edges
            .iter()
            .map(|&(a, b)| (ViewIdPair::new(a, b).unwrap(), TwoViewInfo::default()))
            .collect()
    }

    #[test]
    fn smaller_component_is_removed() {
        let mut pairs = graph(&[(0, 1), (1, 2), (0, 2), (5, 6)]);
        let removed = remove_disconnected_view_pairs(&mut pairs);
        assert_eq!(removed, 1);
        assert_eq!(pairs.len(), 3);
        assert!(!pairs.contains_key(&ViewIdPair::new(5, 6).unwrap()));
    }

    #[test]
    fn edge_count_beats_view_count() {
        // Both components span four views; the first has one more edge.
        let mut pairs = graph(&[(0, 1), (1, 2), (0, 2), (2, 3), (10, 11), (11, 12), (12, 13)]);
        remove_disconnected_view_pairs(&mut pairs);
        assert_eq!(pairs.len(), 4);
        assert!(pairs.keys().all(|p| p.first() < 10));
    }

    #[test]
    fn ties_break_on_lowest_view_id() {
        let mut pairs = graph(&[(20, 21), (3, 4)]);
        remove_disconnected_view_pairs(&mut pairs);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains_key(&ViewIdPair::new(3, 4).unwrap()));
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let mut pairs = HashMap::new();
        assert_eq!(remove_disconnected_view_pairs(&mut pairs), 0);
        assert!(pairs.is_empty());
    }

    #[test]
    fn copying_variant_leaves_input_untouched() {
        let pairs = graph(&[(0, 1), (2, 3), (3, 4)]);
        let kept = largest_connected_component_pairs(&pairs);
        assert_eq!(pairs.len(), 3);
        assert_eq!(kept.len(), 2);
    }
}
