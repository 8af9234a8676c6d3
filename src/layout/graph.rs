//! Table reference graph for layout.
//!
//! Provides:
//! - Graph construction from foreign keys, resolved across schemas
//! - Topological generations (rank layering) for acyclic graphs
//! - In-degree grouping as the fallback layering when cycles exist

use crate::schema::{Table, TableIndex};
use std::collections::BTreeMap;

/// Directed graph of tables keyed by qualified name.
///
/// An edge points from the table declaring a foreign key to the table it
/// references. Edges are deduplicated. Self-references are kept apart from
/// the adjacency lists: they count towards in-degree but never block
/// topological layering.
#[derive(Debug)]
pub struct TableGraph {
    index: TableIndex,
    /// Node id for every input table, in input order
    table_nodes: Vec<usize>,
    /// For each node, nodes it references (excluding itself)
    outgoing: Vec<Vec<usize>>,
    /// For each node, nodes referencing it (excluding itself)
    incoming: Vec<Vec<usize>>,
    self_loops: Vec<bool>,
}

impl TableGraph {
    /// Build the graph for a list of tables.
    ///
    /// Every table becomes a node. Foreign keys that cannot be resolved to a
    /// known table add no edge.
    pub fn from_tables(tables: &[Table]) -> Self {
        let mut index = TableIndex::default();
        let table_nodes: Vec<usize> = tables.iter().map(|t| index.insert(t)).collect();

        let mut edges = Vec::new();
        for (table, &source) in tables.iter().zip(&table_nodes) {
            for fk in &table.foreign_keys {
                match index.resolve_from(table, &fk.referenced_table) {
                    Some(target) => edges.push((source, target)),
                    None => tracing::debug!(
                        table = %table.qualified_name(),
                        referenced = %fk.referenced_table,
                        "unresolved foreign key, no edge added"
                    ),
                }
            }
        }

        let n = index.len();
        let mut graph = Self {
            index,
            table_nodes,
            outgoing: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
            self_loops: vec![false; n],
        };
        for (from, to) in edges {
            graph.add_edge(from, to);
        }

        graph
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if from == to {
            self.self_loops[from] = true;
            return;
        }
        if !self.outgoing[from].contains(&to) {
            self.outgoing[from].push(to);
            self.incoming[to].push(from);
        }
    }

    /// Number of nodes (distinct qualified names)
    pub fn node_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Number of distinct edges, self-loops included
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum::<usize>()
            + self.self_loops.iter().filter(|&&s| s).count()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Node id of the i-th input table
    pub fn node_of_table(&self, table_pos: usize) -> Option<usize> {
        self.table_nodes.get(table_pos).copied()
    }

    /// Node id for a qualified name
    pub fn node_id(&self, qualified: &str) -> Option<usize> {
        self.index.get(qualified)
    }

    /// Qualified name of a node
    pub fn node_name(&self, id: usize) -> Option<&str> {
        self.index.name(id)
    }

    /// Qualified names, indexed by node id
    pub fn node_names(&self) -> &[String] {
        self.index.names()
    }

    /// Whether an edge `from -> to` exists
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        if from == to {
            return self.self_loops.get(from).copied().unwrap_or(false);
        }
        self.outgoing
            .get(from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    /// Check if a table references itself
    pub fn has_self_reference(&self, id: usize) -> bool {
        self.self_loops.get(id).copied().unwrap_or(false)
    }

    /// Incoming edge count in the full graph, self-loop included
    pub fn in_degree(&self, id: usize) -> usize {
        self.incoming[id].len() + usize::from(self.self_loops[id])
    }

    /// Topological generations using Kahn's algorithm, one peel per generation.
    ///
    /// A node lands one generation after the latest of the nodes pointing at
    /// it. Returns `None` when the graph (ignoring self-loops) has a cycle.
    pub fn topological_generations(&self) -> Option<Vec<Vec<usize>>> {
        let n = self.node_count();
        let mut remaining: Vec<usize> = self.incoming.iter().map(Vec::len).collect();

        let mut current: Vec<usize> = (0..n).filter(|&id| remaining[id] == 0).collect();
        let mut generations = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            placed += current.len();
            let mut next = Vec::new();
            for &node in &current {
                for &target in &self.outgoing[node] {
                    remaining[target] -= 1;
                    if remaining[target] == 0 {
                        next.push(target);
                    }
                }
            }
            generations.push(current);
            current = next;
        }

        (placed == n).then_some(generations)
    }

    /// Group nodes by in-degree, ascending. One generation per distinct value.
    pub fn in_degree_generations(&self) -> Vec<Vec<usize>> {
        let mut levels: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for id in 0..self.node_count() {
            levels.entry(self.in_degree(id)).or_default().push(id);
        }
        levels.into_values().collect()
    }

    /// Generations for layout: topological when acyclic, in-degree grouping otherwise.
    ///
    /// The fallback does not break cycles; a node may be ranked before a node
    /// it depends on when that dependency is itself cyclic.
    pub fn generations(&self) -> Vec<Vec<usize>> {
        match self.topological_generations() {
            Some(generations) => generations,
            None => {
                tracing::debug!(
                    nodes = self.node_count(),
                    "reference cycle detected, grouping tables by in-degree"
                );
                self.in_degree_generations()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ForeignKey;

    fn fk(target: &str) -> ForeignKey {
        ForeignKey::new(vec!["ref_id".to_string()], target, vec!["id".to_string()])
    }

    fn names(graph: &TableGraph, generations: &[Vec<usize>]) -> Vec<Vec<String>> {
        generations
            .iter()
            .map(|g| {
                let mut names: Vec<String> = g
                    .iter()
                    .map(|&id| graph.node_name(id).unwrap().to_string())
                    .collect();
                names.sort();
                names
            })
            .collect()
    }

    #[test]
    fn test_graph_construction() {
        let tables = vec![
            Table::new("companies"),
            Table::new("users").with_foreign_key(fk("companies")),
            Table::new("orders").with_foreign_key(fk("users")),
        ];
        let graph = TableGraph::from_tables(&tables);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(1, 0));
        assert!(graph.has_edge(2, 1));
        assert!(!graph.has_edge(0, 1));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let tables = vec![
            Table::new("users"),
            Table::new("orders")
                .with_foreign_key(fk("users"))
                .with_foreign_key(fk("users")),
        ];
        let graph = TableGraph::from_tables(&tables);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.in_degree(0), 1);
    }

    #[test]
    fn test_topological_generations_chain() {
        let tables = vec![
            Table::new("companies"),
            Table::new("users").with_foreign_key(fk("companies")),
            Table::new("orders").with_foreign_key(fk("users")),
        ];
        let graph = TableGraph::from_tables(&tables);
        let generations = graph.topological_generations().unwrap();

        assert_eq!(
            names(&graph, &generations),
            vec![vec!["orders"], vec!["users"], vec!["companies"]]
        );
    }

    #[test]
    fn test_generation_follows_longest_path() {
        // a -> b -> c and a -> c: c must sit after b, not next to it
        let tables = vec![
            Table::new("a").with_foreign_key(fk("b")).with_foreign_key(fk("c")),
            Table::new("b").with_foreign_key(fk("c")),
            Table::new("c"),
            Table::new("d"),
        ];
        let graph = TableGraph::from_tables(&tables);
        let generations = graph.topological_generations().unwrap();

        assert_eq!(
            names(&graph, &generations),
            vec![vec!["a", "d"], vec!["b"], vec!["c"]]
        );
    }

    #[test]
    fn test_cycle_detection_and_fallback() {
        let tables = vec![
            Table::new("a").with_foreign_key(fk("b")),
            Table::new("b").with_foreign_key(fk("c")),
            Table::new("c").with_foreign_key(fk("a")),
            Table::new("d").with_foreign_key(fk("a")),
        ];
        let graph = TableGraph::from_tables(&tables);

        assert!(graph.topological_generations().is_none());
        // in-degrees: a=2, b=1, c=1, d=0
        assert_eq!(
            names(&graph, &graph.generations()),
            vec![vec!["d"], vec!["b", "c"], vec!["a"]]
        );
    }

    #[test]
    fn test_self_reference_does_not_block_layering() {
        let tables = vec![
            Table::new("categories").with_foreign_key(fk("categories")),
            Table::new("products").with_foreign_key(fk("categories")),
        ];
        let graph = TableGraph::from_tables(&tables);

        assert!(graph.has_self_reference(0));
        assert_eq!(graph.in_degree(0), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            names(&graph, &graph.topological_generations().unwrap()),
            vec![vec!["products"], vec!["categories"]]
        );
    }

    #[test]
    fn test_unresolved_foreign_key_keeps_node() {
        let tables = vec![Table::new("orders").with_foreign_key(fk("missing"))];
        let graph = TableGraph::from_tables(&tables);

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.generations(), vec![vec![0]]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = TableGraph::from_tables(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.topological_generations(), Some(Vec::new()));
    }
}
