//! Builds the evaluation graph from a widget tree by static reference scanning.

use indexmap::IndexSet;
use tracing::debug;

use super::evaluation::{EvaluationGraph, NodeKind};
use super::path::EntityPath;
use super::{QUERY_PROPERTIES, STORE_ENTITY};
use crate::expr::{parse_expression, template, EntityMap, Reference, ReferenceRoot};
use crate::tree::{PropertyValue, WidgetTree};
use crate::widgets::{WidgetError, WidgetFactory};

/// A binding source attached to a node, scanned for references.
struct Binding<'a> {
    owner: EntityPath,
    source: &'a str,
}

/// Build the graph for `tree`.
///
/// Nodes are added widget by widget in pre-order (schema properties, then
/// other persisted properties, meta defaults, derived properties, runtime
/// meta keys), then
/// data-source properties. Bindings are parsed but never executed; `this`
/// resolves to the owning widget and a bare entity reference depends on all
/// of that entity's properties. References to unknown entities add no edge.
pub fn build_graph(
    tree: &WidgetTree,
    factory: &WidgetFactory,
    sources: &EntityMap,
    meta: &EntityMap,
) -> Result<EvaluationGraph, WidgetError> {
    let mut graph = EvaluationGraph::new();
    let mut bindings: Vec<Binding<'_>> = Vec::new();

    for node in tree.preorder() {
        let kind = factory.kind_for(node)?;
        let triggers = kind.trigger_properties();
        let path = |name: &str| EntityPath::new(node.id.as_str(), name);

        for config in kind.properties().iter().filter(|c| !c.trigger) {
            graph.add_node(path(config.name), NodeKind::Property);
        }
        for (name, value) in &node.properties {
            if triggers.contains(&name.as_str()) {
                continue;
            }
            graph.add_node(path(name), NodeKind::Property);
            if let PropertyValue::Binding(source) = value {
                bindings.push(Binding {
                    owner: path(name),
                    source,
                });
            }
        }
        for name in kind.meta_defaults().keys() {
            graph.add_node(path(name), NodeKind::Meta);
        }
        for derived in kind.derived_properties() {
            graph.add_node(path(derived.name), NodeKind::Derived);
            bindings.push(Binding {
                owner: path(derived.name),
                source: derived.expression,
            });
        }
        if let Some(overlay) = meta.get(&node.id) {
            for name in overlay.keys() {
                graph.add_node(path(name), NodeKind::Meta);
            }
        }
    }

    for (id, props) in sources {
        if id != STORE_ENTITY {
            for name in QUERY_PROPERTIES {
                graph.add_node(EntityPath::new(id.as_str(), name), NodeKind::Source);
            }
        }
        for name in props.keys() {
            graph.add_node(EntityPath::new(id.as_str(), name.as_str()), NodeKind::Source);
        }
    }

    let scanned: Vec<(EntityPath, Vec<Reference>)> = bindings
        .iter()
        .map(|binding| (binding.owner.clone(), scan_references(binding.source)))
        .collect();

    // Store keys exist as soon as something reads them.
    if sources.contains_key(STORE_ENTITY) {
        for reference in scanned.iter().flat_map(|(_, refs)| refs) {
            if let (ReferenceRoot::Named(root), Some(key)) = (&reference.root, reference.segments.first()) {
                if root == STORE_ENTITY {
                    graph.add_node(EntityPath::new(STORE_ENTITY, key.as_str()), NodeKind::Source);
                }
            }
        }
    }

    for (owner, references) in &scanned {
        let mut targets: IndexSet<EntityPath> = IndexSet::new();
        for reference in references {
            let entity = match &reference.root {
                ReferenceRoot::This => owner.entity.clone(),
                ReferenceRoot::Named(name) => name.clone(),
            };
            match reference.segments.first() {
                Some(property) => {
                    let target = EntityPath::new(entity, property.as_str());
                    if graph.contains(&target) {
                        targets.insert(target);
                    }
                }
                None => targets.extend(graph.entity_paths(&entity).into_iter().filter(|p| p != owner)),
            }
        }
        for target in &targets {
            graph.add_edge(owner, target);
        }
    }

    debug!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        widgets = tree.len(),
        "Built evaluation graph"
    );
    Ok(graph)
}

/// Every reference chain in a binding's fragments. Unparseable fragments
/// contribute nothing; evaluation reports them.
pub fn scan_references(source: &str) -> Vec<Reference> {
    template::fragments(source)
        .into_iter()
        .filter_map(|body| parse_expression(body).ok())
        .flat_map(|expr| expr.references())
        .collect()
}
