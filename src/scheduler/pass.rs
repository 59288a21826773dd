//! One evaluation pass: affected set, cycle exclusion, ordering, commit.

use indexmap::{IndexMap, IndexSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{EvalError, EvalErrorKind};
use super::snapshot::{EvaluatedDataTree, EvaluatedWidget};
use crate::expr::{DataContext, EntityMap, Scope, Value};
use crate::graph::{EntityPath, EvaluationGraph, NodeKind, STORE_ENTITY};
use crate::tree::{PropertyValue, WidgetTree};
use crate::widgets::WidgetFactory;

/// What changed since the previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Changed {
    /// Re-evaluate every node.
    All,
    Paths(IndexSet<EntityPath>),
}

impl Changed {
    pub fn paths(paths: impl IntoIterator<Item = EntityPath>) -> Self {
        Changed::Paths(paths.into_iter().collect())
    }

    pub fn path(path: EntityPath) -> Self {
        Self::paths([path])
    }

    /// Union of two change sets.
    pub fn merge(self, other: Changed) -> Changed {
        match (self, other) {
            (Changed::All, _) | (_, Changed::All) => Changed::All,
            (Changed::Paths(mut a), Changed::Paths(b)) => {
                a.extend(b);
                Changed::Paths(a)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Changed::Paths(paths) if paths.is_empty())
    }
}

/// Read-only inputs of a pass.
pub struct PassInputs<'a> {
    pub tree: &'a WidgetTree,
    pub factory: &'a WidgetFactory,
    pub meta: &'a EntityMap,
    pub sources: &'a EntityMap,
}

/// Diagnostics for one pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub pass_id: Uuid,
    /// Paths in the order they were evaluated.
    pub order: Vec<EntityPath>,
    pub cycles: Vec<Vec<EntityPath>>,
    /// Errors raised by paths evaluated in this pass.
    pub errors: Vec<EvalError>,
    /// Widgets that received a new `Arc` in the committed snapshot.
    pub changed_widgets: Vec<String>,
}

pub struct PassOutcome {
    pub tree: EvaluatedDataTree,
    pub report: PassReport,
}

/// Values visible while a pass runs: the previous snapshot overlaid with
/// everything evaluated so far in this pass.
struct WorkingContext<'a> {
    inputs: &'a PassInputs<'a>,
    values: EntityMap,
}

impl WorkingContext<'_> {
    fn set(&mut self, path: &EntityPath, value: Value) {
        self.values
            .entry(path.entity.clone())
            .or_default()
            .insert(path.property.clone(), value);
    }
}

impl DataContext for WorkingContext<'_> {
    fn has_entity(&self, name: &str) -> bool {
        self.inputs.tree.contains(name) || self.inputs.sources.contains_key(name)
    }

    fn property(&self, entity: &str, property: &str) -> Option<Value> {
        match self.values.get(entity).and_then(|props| props.get(property)) {
            Some(value) => Some(value.clone()),
            None if entity == STORE_ENTITY => Some(Value::Null),
            None => None,
        }
    }

    fn entity(&self, entity: &str) -> Option<Value> {
        if !self.has_entity(entity) {
            return None;
        }
        Some(Value::Map(self.values.get(entity).cloned().unwrap_or_default()))
    }
}

/// Run one pass and commit a new snapshot.
///
/// Only `changed` and its transitive dependents are evaluated, plus any node
/// the previous snapshot has no value for. Cycle members get a `Cycle`
/// error and are skipped; everything else is evaluated in dependency order
/// with ties broken by graph insertion order.
pub fn reevaluate(
    changed: &Changed,
    graph: &EvaluationGraph,
    inputs: &PassInputs<'_>,
    previous: &EvaluatedDataTree,
) -> PassOutcome {
    let pass_id = Uuid::new_v4();

    let seeds: Vec<&EntityPath> = match changed {
        Changed::All => graph.paths().collect(),
        Changed::Paths(paths) => paths
            .iter()
            .chain(graph.paths().filter(|path| previous.value(path).is_none()))
            .collect(),
    };
    let affected = graph.affected_by(seeds);

    let cycles = graph.cycles_within(&affected);
    let cyclic: IndexSet<EntityPath> = cycles.iter().flatten().cloned().collect();
    if !cycles.is_empty() {
        warn!(%pass_id, cycles = cycles.len(), "Binding cycles detected");
    }

    let mut ctx = WorkingContext {
        inputs,
        values: seed_values(inputs, previous),
    };
    let mut errors: IndexMap<EntityPath, EvalError> = IndexMap::new();

    for cycle in &cycles {
        for member in cycle {
            let err = EvalError::cycle(member.clone(), cycle);
            ctx.set(member, Value::Error(err.message.clone()));
            errors.insert(member.clone(), err);
        }
    }

    let order = topological_order(graph, &affected, &cyclic);
    for path in &order {
        let (value, error) = evaluate_path(path, graph, &ctx);
        ctx.set(path, value);
        if let Some(err) = error {
            errors.insert(path.clone(), err);
        }
    }

    let (tree, changed_widgets) = commit(graph, inputs, previous, &affected, ctx.values, &errors);

    info!(
        %pass_id,
        affected = affected.len(),
        evaluated = order.len(),
        errors = errors.len(),
        changed_widgets = changed_widgets.len(),
        version = tree.version,
        "Evaluation pass committed"
    );

    PassOutcome {
        tree,
        report: PassReport {
            pass_id,
            order,
            cycles,
            errors: errors.into_values().collect(),
            changed_widgets,
        },
    }
}

fn seed_values(inputs: &PassInputs<'_>, previous: &EvaluatedDataTree) -> EntityMap {
    let mut values = EntityMap::new();
    for widget in previous.widgets() {
        if inputs.tree.contains(&widget.id) {
            values.insert(widget.id.clone(), widget.props.clone());
        }
    }
    for (id, props) in inputs.sources {
        values.insert(id.clone(), props.clone());
    }
    values
}

/// Kahn's algorithm over the acyclic part of the affected set.
fn topological_order(
    graph: &EvaluationGraph,
    affected: &IndexSet<EntityPath>,
    cyclic: &IndexSet<EntityPath>,
) -> Vec<EntityPath> {
    let members = |path: &EntityPath| affected.contains(path) && !cyclic.contains(path);

    let mut in_degree: IndexMap<&EntityPath, usize> = IndexMap::new();
    let mut ready = BinaryHeap::new();
    for path in affected.iter().filter(|path| members(path)) {
        let degree = graph
            .dependencies_of(path)
            .iter()
            .filter(|dep| members(dep))
            .count();
        in_degree.insert(path, degree);
        if degree == 0 {
            if let Some(index) = graph.index_of(path) {
                ready.push(Reverse(index));
            }
        }
    }

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(index)) = ready.pop() {
        let Some(path) = graph.path_at(index) else {
            continue;
        };
        order.push(path.clone());
        for reader in graph.dependents_of(path) {
            if let Some(degree) = in_degree.get_mut(&reader) {
                *degree -= 1;
                if *degree == 0 {
                    if let Some(reader_index) = graph.index_of(&reader) {
                        ready.push(Reverse(reader_index));
                    }
                }
            }
        }
    }
    order
}

fn evaluate_path(path: &EntityPath, graph: &EvaluationGraph, ctx: &WorkingContext<'_>) -> (Value, Option<EvalError>) {
    let inputs = ctx.inputs;
    if graph.kind(path) == Some(NodeKind::Source) {
        let value = inputs
            .sources
            .get(&path.entity)
            .and_then(|props| props.get(&path.property))
            .cloned()
            .unwrap_or_default();
        return (value, None);
    }

    if let Some(value) = inputs.meta.get(&path.entity).and_then(|m| m.get(&path.property)) {
        return (value.clone(), None);
    }

    let Some(node) = inputs.tree.get(&path.entity) else {
        let err = EvalError::new(path.clone(), EvalErrorKind::Reference, "widget no longer exists");
        return (Value::Error(err.message.clone()), Some(err));
    };
    let Ok(kind) = inputs.factory.kind_for(node) else {
        return (Value::Null, None);
    };
    let scope = Scope::new(ctx).with_this(&node.id);

    if let Some(derived) = kind
        .derived_properties()
        .into_iter()
        .find(|d| d.name == path.property)
    {
        return match scope.evaluate_template(derived.expression) {
            Ok(value) => (value, None),
            Err(err) => expression_failure(path, &err),
        };
    }

    let config = kind
        .properties()
        .into_iter()
        .find(|config| config.name == path.property);

    let persisted = match node.properties.get(&path.property) {
        Some(PropertyValue::Literal(value)) => value.clone(),
        Some(PropertyValue::Binding(source)) => match scope.evaluate_template(source) {
            Ok(value) => value,
            Err(err) => return expression_failure(path, &err),
        },
        None => {
            let fallback = config
                .map(|c| c.default)
                .or_else(|| kind.meta_defaults().get(&path.property).cloned())
                .unwrap_or_default();
            return (fallback, None);
        }
    };

    match config {
        Some(config) => match &config.validation {
            Some(rule) => match rule.apply(persisted) {
                Ok(value) => (value, None),
                Err(message) => {
                    debug!(path = %path, %message, "Validation failed, using default");
                    let err = EvalError::new(path.clone(), EvalErrorKind::Validation, message);
                    (config.default, Some(err))
                }
            },
            None => (persisted, None),
        },
        None => (persisted, None),
    }
}

fn expression_failure(path: &EntityPath, err: &crate::expr::ExprError) -> (Value, Option<EvalError>) {
    let err = EvalError::from_expr(path.clone(), err);
    debug!(path = %path, error = %err.message, "Binding failed");
    (Value::Error(err.message.clone()), Some(err))
}

/// Build the next snapshot, reusing every widget whose props and errors are
/// unchanged.
fn commit(
    graph: &EvaluationGraph,
    inputs: &PassInputs<'_>,
    previous: &EvaluatedDataTree,
    affected: &IndexSet<EntityPath>,
    mut values: EntityMap,
    errors: &IndexMap<EntityPath, EvalError>,
) -> (EvaluatedDataTree, Vec<String>) {
    let mut grouped: EntityMap = EntityMap::new();
    for path in graph.paths() {
        let value = values
            .get_mut(&path.entity)
            .and_then(|props| props.shift_remove(&path.property))
            .unwrap_or_default();
        grouped
            .entry(path.entity.clone())
            .or_default()
            .insert(path.property.clone(), value);
    }

    let mut widgets = IndexMap::with_capacity(inputs.tree.len());
    let mut changed_widgets = Vec::new();
    for node in inputs.tree.preorder() {
        let props = grouped.shift_remove(&node.id).unwrap_or_default();
        let old = previous.get(&node.id);

        let mut widget_errors: IndexMap<String, EvalError> = old
            .map(|w| {
                w.errors
                    .iter()
                    .filter(|(name, _)| {
                        let path = EntityPath::new(node.id.as_str(), name.as_str());
                        props.contains_key(*name) && !affected.contains(&path)
                    })
                    .map(|(name, err)| (name.clone(), err.clone()))
                    .collect()
            })
            .unwrap_or_default();
        for name in props.keys() {
            let path = EntityPath::new(node.id.as_str(), name.as_str());
            if let Some(err) = errors.get(&path) {
                widget_errors.insert(name.clone(), err.clone());
            }
        }
        // Keep error order aligned with property order.
        widget_errors.sort_by(|a, _, b, _| props.get_index_of(a).cmp(&props.get_index_of(b)));

        let candidate = EvaluatedWidget {
            id: node.id.clone(),
            widget_type: node.widget_type,
            props,
            errors: widget_errors,
        };
        let widget = match old {
            Some(old) if **old == candidate => Arc::clone(old),
            _ => {
                changed_widgets.push(node.id.clone());
                Arc::new(candidate)
            }
        };
        widgets.insert(node.id.clone(), widget);
    }

    let sources: EntityMap = grouped
        .into_iter()
        .filter(|(id, _)| inputs.sources.contains_key(id))
        .collect();

    let tree = EvaluatedDataTree {
        widgets,
        sources,
        version: previous.version + 1,
    };
    (tree, changed_widgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::tree::{TreeEdit, WidgetNode, WidgetType};

    fn p(s: &str) -> EntityPath {
        s.parse().unwrap()
    }

    fn sample_tree() -> WidgetTree {
        let mut tree = WidgetTree::new(WidgetNode::new("Canvas", WidgetType::Canvas));
        for node in [
            WidgetNode::new("Text1", WidgetType::Text)
                .with_parent("Canvas")
                .with_property("text", "{{ Text2.text + '!' }}"),
            WidgetNode::new("Text2", WidgetType::Text)
                .with_parent("Canvas")
                .with_property("text", "{{ Input1.text }}"),
            WidgetNode::new("Input1", WidgetType::Input)
                .with_parent("Canvas")
                .with_property("defaultText", "hi"),
        ] {
            tree.apply(TreeEdit::AddWidget { node, index: None }).unwrap();
        }
        tree
    }

    fn run(tree: &WidgetTree, meta: &EntityMap, changed: &Changed, previous: &EvaluatedDataTree) -> PassOutcome {
        let factory = WidgetFactory::builtin();
        let sources = EntityMap::new();
        let graph = build_graph(tree, &factory, &sources, meta).unwrap();
        let inputs = PassInputs {
            tree,
            factory: &factory,
            meta,
            sources: &sources,
        };
        reevaluate(changed, &graph, &inputs, previous)
    }

    #[test]
    fn evaluates_in_dependency_order() {
        let tree = sample_tree();
        let outcome = run(&tree, &EntityMap::new(), &Changed::All, &EvaluatedDataTree::default());
        let text1 = outcome.tree.get("Text1").unwrap();
        assert_eq!(text1.prop("text"), Some(&Value::from("hi!")));

        let pos = |s: &str| outcome.report.order.iter().position(|x| *x == p(s)).unwrap();
        assert!(pos("Input1.text") < pos("Text2.text"));
        assert!(pos("Text2.text") < pos("Text1.text"));
    }

    #[test]
    fn meta_overrides_evaluated_value() {
        let tree = sample_tree();
        let first = run(&tree, &EntityMap::new(), &Changed::All, &EvaluatedDataTree::default());

        let mut meta = EntityMap::new();
        meta.entry("Input1".to_string())
            .or_default()
            .insert("text".to_string(), Value::from("typed"));
        let second = run(&tree, &meta, &Changed::path(p("Input1.text")), &first.tree);

        assert_eq!(second.tree.get("Text1").unwrap().prop("text"), Some(&Value::from("typed!")));
        assert!(!second.report.order.contains(&p("Input1.defaultText")));
    }

    #[test]
    fn validation_failure_uses_default() {
        let mut tree = sample_tree();
        tree.apply(TreeEdit::SetProperty {
            id: "Text1".into(),
            name: "fontSize".into(),
            value: PropertyValue::Literal(Value::Number(200.0)),
        })
        .unwrap();
        let outcome = run(&tree, &EntityMap::new(), &Changed::All, &EvaluatedDataTree::default());
        let text1 = outcome.tree.get("Text1").unwrap();
        assert_eq!(text1.prop("fontSize"), Some(&Value::Number(14.0)));
        assert_eq!(text1.error("fontSize").unwrap().kind, EvalErrorKind::Validation);
    }

    #[test]
    fn merge_absorbs_into_all() {
        let merged = Changed::path(p("A.x")).merge(Changed::All);
        assert_eq!(merged, Changed::All);
        let merged = Changed::path(p("A.x")).merge(Changed::path(p("B.y")));
        assert_eq!(merged, Changed::paths([p("A.x"), p("B.y")]));
    }
}
