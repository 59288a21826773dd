//! Directed dependency graph over entity paths.

use indexmap::{IndexMap, IndexSet};

use super::path::EntityPath;

/// Where a node's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Declared by the schema or persisted on the widget.
    Property,
    /// Computed from the widget's own props by a kind-supplied expression.
    Derived,
    /// Exists only as meta state (type default or runtime write).
    Meta,
    /// Value owned by a data source or the store.
    Source,
}

/// Dependency graph. Node insertion order is the tie-break order used when
/// scheduling, so building the same tree twice yields the same graph.
#[derive(Debug, Clone, Default)]
pub struct EvaluationGraph {
    nodes: IndexMap<EntityPath, NodeKind>,
    /// path -> paths it reads.
    dependencies: IndexMap<EntityPath, IndexSet<EntityPath>>,
    /// path -> paths that read it.
    dependents: IndexMap<EntityPath, IndexSet<EntityPath>>,
}

impl EvaluationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; re-adding an existing path keeps its original position.
    pub fn add_node(&mut self, path: EntityPath, kind: NodeKind) {
        self.nodes.entry(path).or_insert(kind);
    }

    /// Record that `from` reads `to`. Both must already be nodes.
    pub fn add_edge(&mut self, from: &EntityPath, to: &EntityPath) -> bool {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return false;
        }
        self.dependencies
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.dependents
            .entry(to.clone())
            .or_default()
            .insert(from.clone())
    }

    pub fn contains(&self, path: &EntityPath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn kind(&self, path: &EntityPath) -> Option<NodeKind> {
        self.nodes.get(path).copied()
    }

    /// Position of a node in insertion order.
    pub fn index_of(&self, path: &EntityPath) -> Option<usize> {
        self.nodes.get_index_of(path)
    }

    pub fn path_at(&self, index: usize) -> Option<&EntityPath> {
        self.nodes.get_index(index).map(|(path, _)| path)
    }

    /// Every node in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &EntityPath> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(IndexSet::len).sum()
    }

    /// Nodes belonging to one entity, in insertion order.
    pub fn entity_paths(&self, entity: &str) -> Vec<EntityPath> {
        self.nodes
            .keys()
            .filter(|path| path.entity == entity)
            .cloned()
            .collect()
    }

    /// Paths that read `path` directly.
    pub fn dependents_of(&self, path: &EntityPath) -> Vec<EntityPath> {
        self.dependents
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Paths `path` reads directly.
    pub fn dependencies_of(&self, path: &EntityPath) -> Vec<EntityPath> {
        self.dependencies
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `changed` plus everything that transitively reads it.
    ///
    /// Paths that are not nodes are ignored.
    pub fn affected_by<'a>(&self, changed: impl IntoIterator<Item = &'a EntityPath>) -> IndexSet<EntityPath> {
        let mut affected = IndexSet::new();
        let mut stack: Vec<EntityPath> = changed
            .into_iter()
            .filter(|path| self.contains(path))
            .cloned()
            .collect();
        while let Some(path) = stack.pop() {
            if !affected.insert(path.clone()) {
                continue;
            }
            if let Some(readers) = self.dependents.get(&path) {
                stack.extend(readers.iter().filter(|r| !affected.contains(*r)).cloned());
            }
        }
        affected
    }

    /// Any cycle in the whole graph.
    pub fn has_cycle(&self) -> Option<Vec<EntityPath>> {
        let all: IndexSet<EntityPath> = self.nodes.keys().cloned().collect();
        self.cycles_within(&all).into_iter().next()
    }

    /// Strongly connected components that form cycles, considering only
    /// nodes in `subset` and edges between them.
    ///
    /// Members of each cycle are listed in insertion order; cycles are ordered
    /// by their first member.
    pub fn cycles_within(&self, subset: &IndexSet<EntityPath>) -> Vec<Vec<EntityPath>> {
        let mut tarjan = Tarjan::new(self, subset);
        for path in self.nodes.keys().filter(|p| subset.contains(*p)) {
            if !tarjan.index.contains_key(path) {
                tarjan.visit(path);
            }
        }

        let mut cycles: Vec<Vec<EntityPath>> = tarjan
            .components
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component.first().is_some_and(|only| {
                        self.dependencies
                            .get(only)
                            .is_some_and(|deps| deps.contains(only))
                    })
            })
            .map(|mut component| {
                component.sort_by_key(|p| self.index_of(p));
                component
            })
            .collect();
        cycles.sort_by_key(|component| component.first().and_then(|p| self.index_of(p)));
        cycles
    }
}

struct Tarjan<'g> {
    graph: &'g EvaluationGraph,
    subset: &'g IndexSet<EntityPath>,
    next_index: usize,
    index: IndexMap<EntityPath, usize>,
    lowlink: IndexMap<EntityPath, usize>,
    stack: Vec<EntityPath>,
    on_stack: IndexSet<EntityPath>,
    components: Vec<Vec<EntityPath>>,
}

/// A node whose dependencies are still being walked.
struct Frame<'g> {
    path: &'g EntityPath,
    deps: Vec<&'g EntityPath>,
    next: usize,
}

impl<'g> Tarjan<'g> {
    fn new(graph: &'g EvaluationGraph, subset: &'g IndexSet<EntityPath>) -> Self {
        Self {
            graph,
            subset,
            next_index: 0,
            index: IndexMap::new(),
            lowlink: IndexMap::new(),
            stack: Vec::new(),
            on_stack: IndexSet::new(),
            components: Vec::new(),
        }
    }

    fn open(&mut self, path: &'g EntityPath) -> Frame<'g> {
        self.index.insert(path.clone(), self.next_index);
        self.lowlink.insert(path.clone(), self.next_index);
        self.next_index += 1;
        self.stack.push(path.clone());
        self.on_stack.insert(path.clone());

        let subset = self.subset;
        let deps = self
            .graph
            .dependencies
            .get(path)
            .map(|deps| deps.iter().filter(|d| subset.contains(*d)).collect())
            .unwrap_or_default();
        Frame { path, deps, next: 0 }
    }

    /// Depth-first walk from `root` with an explicit frame stack, so long
    /// dependency chains cannot exhaust the thread stack.
    fn visit(&mut self, root: &'g EntityPath) {
        let mut frames = vec![self.open(root)];
        while let Some(frame) = frames.last_mut() {
            if let Some(dep) = frame.deps.get(frame.next).copied() {
                frame.next += 1;
                let path = frame.path;
                if !self.index.contains_key(dep) {
                    let child = self.open(dep);
                    frames.push(child);
                } else if self.on_stack.contains(dep) {
                    let low = self.index[dep].min(self.lowlink[path]);
                    self.lowlink.insert(path.clone(), low);
                }
                continue;
            }

            let Some(done) = frames.pop() else {
                break;
            };
            let path = done.path;
            if self.lowlink[path] == self.index[path] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack.swap_remove(&member);
                    let closed = &member == path;
                    component.push(member);
                    if closed {
                        break;
                    }
                }
                self.components.push(component);
            }
            if let Some(parent) = frames.last() {
                let low = self.lowlink[path].min(self.lowlink[parent.path]);
                self.lowlink.insert(parent.path.clone(), low);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> EntityPath {
        s.parse().unwrap()
    }

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> EvaluationGraph {
        let mut g = EvaluationGraph::new();
        for n in nodes {
            g.add_node(p(n), NodeKind::Property);
        }
        for (from, to) in edges {
            g.add_edge(&p(from), &p(to));
        }
        g
    }

    #[test]
    fn dependents_and_dependencies_are_mirrored() {
        let g = graph(&["A.x", "B.y"], &[("B.y", "A.x")]);
        assert_eq!(g.dependents_of(&p("A.x")), vec![p("B.y")]);
        assert_eq!(g.dependencies_of(&p("B.y")), vec![p("A.x")]);
        assert!(g.has_cycle().is_none());
    }

    #[test]
    fn finds_two_node_cycle() {
        let g = graph(&["A.x", "B.y", "C.z"], &[("A.x", "B.y"), ("B.y", "A.x"), ("C.z", "A.x")]);
        assert_eq!(g.has_cycle(), Some(vec![p("A.x"), p("B.y")]));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let g = graph(&["A.x"], &[("A.x", "A.x")]);
        assert_eq!(g.has_cycle(), Some(vec![p("A.x")]));
    }

    #[test]
    fn cycles_within_ignores_nodes_outside_subset() {
        let g = graph(&["A.x", "B.y"], &[("A.x", "B.y"), ("B.y", "A.x")]);
        let subset: IndexSet<EntityPath> = [p("A.x")].into_iter().collect();
        assert!(g.cycles_within(&subset).is_empty());
    }

    #[test]
    fn affected_closure_follows_dependents() {
        let g = graph(
            &["A.x", "B.y", "C.z", "D.w"],
            &[("B.y", "A.x"), ("C.z", "B.y")],
        );
        let affected = g.affected_by([&p("A.x")]);
        assert_eq!(affected.len(), 3);
        assert!(!affected.contains(&p("D.w")));
    }

    #[test]
    fn long_chains_are_searched_without_recursion() {
        let names: Vec<String> = (0..50_000).map(|i| format!("W{}.x", i)).collect();
        let mut g = EvaluationGraph::new();
        for name in &names {
            g.add_node(p(name), NodeKind::Property);
        }
        for pair in names.windows(2) {
            g.add_edge(&p(&pair[0]), &p(&pair[1]));
        }
        assert!(g.has_cycle().is_none());

        g.add_edge(&p(&names[names.len() - 1]), &p(&names[0]));
        assert_eq!(g.has_cycle().map(|cycle| cycle.len()), Some(names.len()));
    }
}
