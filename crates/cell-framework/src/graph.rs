//! # Subscription Graph
//!
//! Directed edges `source -> destination`: whatever `source` emits is delivered to every
//! destination. The graph lives in the [`Environment`](crate::Environment), never in the
//! cells, and is only touched under the environment's registry lock.

use std::collections::{HashMap, HashSet};

use crate::id::CellId;

#[derive(Debug, Default)]
pub(crate) struct SubscriptionGraph {
    /// source -> destinations
    subscribers: HashMap<CellId, HashSet<CellId>>,
    /// destination -> sources
    subscriptions: HashMap<CellId, HashSet<CellId>>,
}

impl SubscriptionGraph {
    /// Adds the edge. Returns `false` if it already existed.
    pub(crate) fn subscribe(&mut self, source: &CellId, destination: &CellId) -> bool {
        let added = self
            .subscribers
            .entry(source.clone())
            .or_default()
            .insert(destination.clone());
        self.subscriptions
            .entry(destination.clone())
            .or_default()
            .insert(source.clone());
        added
    }

    /// Removes the edge. Returns `false` if there was none.
    pub(crate) fn unsubscribe(&mut self, source: &str, destination: &str) -> bool {
        let removed = remove_edge(&mut self.subscribers, source, destination);
        remove_edge(&mut self.subscriptions, destination, source);
        removed
    }

    pub(crate) fn subscribers_of(&self, source: &str) -> impl Iterator<Item = &CellId> {
        self.subscribers.get(source).into_iter().flatten()
    }

    /// Drops every edge where `id` is source or destination.
    pub(crate) fn remove_cell(&mut self, id: &str) {
        if let Some(destinations) = self.subscribers.remove(id) {
            for destination in destinations {
                remove_edge(&mut self.subscriptions, destination.as_str(), id);
            }
        }
        if let Some(sources) = self.subscriptions.remove(id) {
            for source in sources {
                remove_edge(&mut self.subscribers, source.as_str(), id);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn edge_count(&self) -> usize {
        self.subscribers.values().map(HashSet::len).sum()
    }
}

fn remove_edge(map: &mut HashMap<CellId, HashSet<CellId>>, from: &str, to: &str) -> bool {
    let Some(set) = map.get_mut(from) else {
        return false;
    };
    let removed = set.remove(to);
    if set.is_empty() {
        map.remove(from);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CellId {
        CellId::from(s)
    }

    #[test]
    fn subscribe_is_idempotent() {
        let mut graph = SubscriptionGraph::default();
        assert!(graph.subscribe(&id("room"), &id("alice")));
        assert!(!graph.subscribe(&id("room"), &id("alice")));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn remove_cell_drops_both_directions() {
        let mut graph = SubscriptionGraph::default();
        graph.subscribe(&id("pa"), &id("room"));
        graph.subscribe(&id("room"), &id("alice"));
        graph.subscribe(&id("room"), &id("bob"));
        graph.subscribe(&id("censor"), &id("room"));

        graph.remove_cell("room");

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.subscribers_of("pa").count(), 0);
        assert_eq!(graph.subscribers_of("censor").count(), 0);
    }

    #[test]
    fn unsubscribe_only_touches_one_edge() {
        let mut graph = SubscriptionGraph::default();
        graph.subscribe(&id("room"), &id("alice"));
        graph.subscribe(&id("room"), &id("bob"));

        assert!(graph.unsubscribe("room", "alice"));
        assert!(!graph.unsubscribe("room", "alice"));

        let remaining: Vec<_> = graph.subscribers_of("room").collect();
        assert_eq!(remaining, vec![&id("bob")]);
    }
}
