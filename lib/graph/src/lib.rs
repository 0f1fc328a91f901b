//! Per-environment dependency graph over configurations: cycle detection,
//! weakly-connected components (independently deployable groups), and
//! Kahn layering (same-layer nodes are safe to deploy concurrently).

use std::collections::HashMap;

use identity::Coordinate;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("configuration dependency graph contains a cycle reachable from {0}")]
  CycleDetected(Coordinate),
  #[error("configuration {0} declares a dependency on unknown configuration {1}")]
  UnknownDependency(Coordinate, Coordinate),
}

pub type Result<T> = ::core::result::Result<T, GraphError>;

/// A configuration node and the coordinates of the configurations it
/// depends on (must be deployed first).
pub struct DependencyGraph {
  graph: DiGraph<Coordinate, ()>,
  index: HashMap<Coordinate, NodeIndex>,
}

impl DependencyGraph {
  /// Builds the graph from `(coordinate, dependencies)` pairs. Every
  /// dependency must itself appear as a node.
  pub fn build(
    nodes: impl IntoIterator<Item = (Coordinate, Vec<Coordinate>)>,
  ) -> Result<Self> {
    let nodes: Vec<(Coordinate, Vec<Coordinate>)> =
      nodes.into_iter().collect();

    let mut graph = DiGraph::new();
    let mut index = HashMap::new();
    for (coordinate, _) in &nodes {
      let idx = graph.add_node(coordinate.clone());
      index.insert(coordinate.clone(), idx);
    }

    for (coordinate, deps) in &nodes {
      let dependent_idx = index[coordinate];
      for dep in deps {
        let Some(&dep_idx) = index.get(dep) else {
          return Err(GraphError::UnknownDependency(
            coordinate.clone(),
            dep.clone(),
          ));
        };
        // dep must run before coordinate: edge dep -> coordinate.
        graph.add_edge(dep_idx, dependent_idx, ());
      }
    }

    let built = Self { graph, index };
    built.check_acyclic()?;
    Ok(built)
  }

  fn check_acyclic(&self) -> Result<()> {
    if let Err(cycle) = petgraph::algo::toposort(&self.graph, None) {
      let coordinate = self.graph[cycle.node_id()].clone();
      return Err(GraphError::CycleDetected(coordinate));
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Groups of configurations with no dependency relationship between
  /// any pair in different groups. Each group is independently
  /// deployable in any order relative to the others.
  pub fn weakly_connected_components(&self) -> Vec<Vec<Coordinate>> {
    let mut uf = UnionFind::new(self.graph.node_count());
    for edge in self.graph.edge_references() {
      uf.union(edge.source().index(), edge.target().index());
    }

    let mut groups: HashMap<usize, Vec<Coordinate>> = HashMap::new();
    for idx in self.graph.node_indices() {
      let root = uf.find(idx.index());
      groups.entry(root).or_default().push(self.graph[idx].clone());
    }
    groups.into_values().collect()
  }

  /// Kahn layering: layer 0 has no dependencies, layer N's nodes depend
  /// only on nodes in layers `0..N`. Nodes within one layer have no
  /// dependency relationship and may deploy concurrently.
  pub fn topological_layers(&self) -> Result<Vec<Vec<Coordinate>>> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, petgraph::Incoming).count()))
      .collect();

    let mut layers = Vec::new();
    let mut remaining = self.graph.node_count();
    let mut frontier: Vec<NodeIndex> = in_degree
      .iter()
      .filter(|(_, deg)| **deg == 0)
      .map(|(idx, _)| *idx)
      .collect();

    while !frontier.is_empty() {
      let mut layer = Vec::with_capacity(frontier.len());
      let mut next_frontier = Vec::new();
      for idx in &frontier {
        layer.push(self.graph[*idx].clone());
        remaining -= 1;
        for neighbor in self.graph.neighbors_directed(*idx, petgraph::Outgoing) {
          let degree = in_degree.get_mut(&neighbor).unwrap();
          *degree -= 1;
          if *degree == 0 {
            next_frontier.push(neighbor);
          }
        }
      }
      layers.push(layer);
      frontier = next_frontier;
    }

    if remaining != 0 {
      // `build` already rejects cycles, so this only triggers if the
      // graph was mutated after construction.
      return Err(GraphError::CycleDetected(self.graph[NodeIndex::new(0)].clone()));
    }

    Ok(layers)
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  fn c(id: &str) -> Coordinate {
    Coordinate::new("proj", "kind", id)
  }

  #[test]
  fn builds_empty_graph() {
    let graph = DependencyGraph::build(vec![]).unwrap();
    assert!(graph.is_empty());
  }

  #[test]
  fn rejects_unknown_dependency() {
    let err =
      DependencyGraph::build(vec![(c("a"), vec![c("ghost")])]).unwrap_err();
    assert!(matches!(err, GraphError::UnknownDependency(_, _)));
  }

  #[test]
  fn detects_cycle() {
    let err = DependencyGraph::build(vec![
      (c("a"), vec![c("b")]),
      (c("b"), vec![c("a")]),
    ])
    .unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected(_)));
  }

  #[test]
  fn layers_respect_dependency_order() {
    let graph = DependencyGraph::build(vec![
      (c("a"), vec![]),
      (c("b"), vec![c("a")]),
      (c("c"), vec![c("a")]),
      (c("d"), vec![c("b"), c("c")]),
    ])
    .unwrap();
    let layers = graph.topological_layers().unwrap();
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0], vec![c("a")]);
    assert_eq!(layers[2], vec![c("d")]);
    let mut layer1 = layers[1].clone();
    layer1.sort_by(|x, y| x.config_id.cmp(&y.config_id));
    assert_eq!(layer1, vec![c("b"), c("c")]);
  }

  #[test]
  fn weakly_connected_components_separate_disjoint_chains() {
    let graph = DependencyGraph::build(vec![
      (c("a"), vec![]),
      (c("b"), vec![c("a")]),
      (c("x"), vec![]),
      (c("y"), vec![c("x")]),
    ])
    .unwrap();
    let mut components = graph.weakly_connected_components();
    assert_eq!(components.len(), 2);
    for component in &mut components {
      component.sort_by(|x, y| x.config_id.cmp(&y.config_id));
    }
    components.sort_by(|x, y| x[0].config_id.cmp(&y[0].config_id));
    assert_eq!(components[0], vec![c("a"), c("b")]);
    assert_eq!(components[1], vec![c("x"), c("y")]);
  }

  proptest::proptest! {
    #[test]
    fn chain_layers_are_always_singletons(n in 1usize..12) {
      let nodes: Vec<(Coordinate, Vec<Coordinate>)> = (0..n)
        .map(|i| {
          let id = i.to_string();
          let deps = if i == 0 { vec![] } else { vec![c(&(i - 1).to_string())] };
          (c(&id), deps)
        })
        .collect();
      let graph = DependencyGraph::build(nodes).unwrap();
      let layers = graph.topological_layers().unwrap();
      proptest::prop_assert_eq!(layers.len(), n);
      proptest::prop_assert!(layers.iter().all(|l| l.len() == 1));
    }
  }
}
