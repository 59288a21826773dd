//! The persisted widget tree and its atomic edit operations.

use indexmap::IndexMap;

use super::error::TreeError;
use super::node::{PropertyValue, WidgetNode};

/// An edit to the persisted tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEdit {
    /// Insert a childless widget under `node.parent_id` at `index` (end if `None`).
    AddWidget { node: WidgetNode, index: Option<usize> },
    /// Remove a widget and its whole subtree.
    RemoveWidget { id: String },
    /// Move a widget (with its subtree) under another parent.
    Reparent {
        id: String,
        new_parent: String,
        index: Option<usize>,
    },
    /// Move a widget to another position among its siblings.
    Reorder { id: String, index: usize },
    SetProperty {
        id: String,
        name: String,
        value: PropertyValue,
    },
    RemoveProperty { id: String, name: String },
}

/// What an applied edit changed, used to drive re-evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditOutcome {
    pub added: Vec<String>,
    pub removed: Vec<WidgetNode>,
    /// `(widget id, property name)` of a property edit.
    pub property: Option<(String, String)>,
}

impl EditOutcome {
    /// Whether the set of widgets changed (as opposed to a single property).
    pub fn is_structural(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// The page's widget tree.
///
/// Invariants: exactly one root, every other node has exactly one parent,
/// `children` membership is mutual with `parent_id`, no cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetTree {
    nodes: IndexMap<String, WidgetNode>,
    root: String,
}

impl WidgetTree {
    /// Create a tree holding only `root`.
    pub fn new(mut root: WidgetNode) -> Self {
        root.parent_id = None;
        root.children.clear();
        let id = root.id.clone();
        let mut nodes = IndexMap::new();
        nodes.insert(id.clone(), root);
        Self { nodes, root: id }
    }

    /// Assemble a tree from already validated parts.
    pub(crate) fn from_parts(nodes: IndexMap<String, WidgetNode>, root: String) -> Self {
        Self { nodes, root }
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&WidgetNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in pre-order (parent before children, children in render order).
    pub fn preorder(&self) -> Vec<&WidgetNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root.as_str()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            out.push(node);
            stack.extend(node.children.iter().rev().map(String::as_str));
        }
        out
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = self
            .nodes
            .get(id)
            .map(|n| n.children.iter().rev().map(String::as_str).collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            out.push(current.to_string());
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    /// Whether `ancestor` is `id` itself or lies on the path from `id` to the root.
    pub fn is_ancestor_or_self(&self, ancestor: &str, id: &str) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(cur).and_then(|n| n.parent_id.as_deref());
        }
        false
    }

    /// Apply an edit atomically: all checks run before anything is mutated.
    pub fn apply(&mut self, edit: TreeEdit) -> Result<EditOutcome, TreeError> {
        match edit {
            TreeEdit::AddWidget { node, index } => self.add(node, index),
            TreeEdit::RemoveWidget { id } => self.remove(&id),
            TreeEdit::Reparent {
                id,
                new_parent,
                index,
            } => self.reparent(&id, &new_parent, index),
            TreeEdit::Reorder { id, index } => self.reorder(&id, index),
            TreeEdit::SetProperty { id, name, value } => {
                let node = self.nodes.get_mut(&id).ok_or_else(|| TreeError::not_found(&id))?;
                node.properties.insert(name.clone(), value);
                Ok(EditOutcome {
                    property: Some((id, name)),
                    ..EditOutcome::default()
                })
            }
            TreeEdit::RemoveProperty { id, name } => {
                let node = self.nodes.get_mut(&id).ok_or_else(|| TreeError::not_found(&id))?;
                node.properties.shift_remove(&name);
                Ok(EditOutcome {
                    property: Some((id, name)),
                    ..EditOutcome::default()
                })
            }
        }
    }

    fn add(&mut self, node: WidgetNode, index: Option<usize>) -> Result<EditOutcome, TreeError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::DuplicateId { id: node.id });
        }
        if !node.children.is_empty() {
            return Err(TreeError::violation(format!(
                "widget '{}' must be added without children",
                node.id
            )));
        }
        let parent_id = node
            .parent_id
            .clone()
            .ok_or_else(|| TreeError::violation(format!("widget '{}' has no parent", node.id)))?;
        let parent = self
            .nodes
            .get(&parent_id)
            .ok_or_else(|| TreeError::not_found(&parent_id))?;
        let index = check_index(index, parent.children.len(), &parent_id)?;

        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.insert(index, id.clone());
        }
        Ok(EditOutcome {
            added: vec![id],
            ..EditOutcome::default()
        })
    }

    fn remove(&mut self, id: &str) -> Result<EditOutcome, TreeError> {
        if id == self.root {
            return Err(TreeError::violation("the root widget cannot be removed"));
        }
        let parent_id = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::not_found(id))?
            .parent_id
            .clone();

        let mut doomed = vec![id.to_string()];
        doomed.extend(self.descendants(id));

        if let Some(parent) = parent_id.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| child != id);
        }
        let removed = doomed
            .iter()
            .filter_map(|doomed_id| self.nodes.shift_remove(doomed_id))
            .collect();
        Ok(EditOutcome {
            removed,
            ..EditOutcome::default()
        })
    }

    fn reparent(&mut self, id: &str, new_parent: &str, index: Option<usize>) -> Result<EditOutcome, TreeError> {
        if id == self.root {
            return Err(TreeError::violation("the root widget cannot be reparented"));
        }
        let old_parent = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::not_found(id))?
            .parent_id
            .clone();
        let target = self
            .nodes
            .get(new_parent)
            .ok_or_else(|| TreeError::not_found(new_parent))?;
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(TreeError::violation(format!(
                "cannot move '{}' under its own descendant '{}'",
                id, new_parent
            )));
        }
        let same_parent = old_parent.as_deref() == Some(new_parent);
        let sibling_count = target.children.len() - usize::from(same_parent);
        let index = check_index(index, sibling_count, new_parent)?;

        if let Some(parent) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|child| child != id);
        }
        if let Some(parent) = self.nodes.get_mut(new_parent) {
            parent.children.insert(index, id.to_string());
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = Some(new_parent.to_string());
        }
        Ok(EditOutcome::default())
    }

    fn reorder(&mut self, id: &str, index: usize) -> Result<EditOutcome, TreeError> {
        let parent_id = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::not_found(id))?
            .parent_id
            .clone()
            .ok_or_else(|| TreeError::violation("the root widget has no siblings"))?;
        let parent = self
            .nodes
            .get_mut(&parent_id)
            .ok_or_else(|| TreeError::not_found(&parent_id))?;
        if index >= parent.children.len() {
            return Err(TreeError::violation(format!(
                "index {} out of range for '{}' with {} children",
                index,
                parent_id,
                parent.children.len()
            )));
        }
        parent.children.retain(|child| child != id);
        parent.children.insert(index, id.to_string());
        Ok(EditOutcome::default())
    }

    /// Check every invariant; used after loading documents and in tests.
    pub fn validate(&self) -> Result<(), TreeError> {
        let root = self
            .nodes
            .get(&self.root)
            .ok_or_else(|| TreeError::not_found(&self.root))?;
        if root.parent_id.is_some() {
            return Err(TreeError::violation("root widget must not have a parent"));
        }
        for node in self.nodes.values() {
            if node.id == self.root {
                continue;
            }
            let parent_id = node
                .parent_id
                .as_deref()
                .ok_or_else(|| TreeError::violation(format!("widget '{}' has no parent", node.id)))?;
            let parent = self.nodes.get(parent_id).ok_or_else(|| {
                TreeError::violation(format!("widget '{}' references missing parent '{}'", node.id, parent_id))
            })?;
            if parent.children.iter().filter(|c| *c == &node.id).count() != 1 {
                return Err(TreeError::violation(format!(
                    "parent '{}' does not list '{}' exactly once",
                    parent_id, node.id
                )));
            }
        }
        for node in self.nodes.values() {
            for child in &node.children {
                let child_node = self.nodes.get(child).ok_or_else(|| {
                    TreeError::violation(format!("widget '{}' lists missing child '{}'", node.id, child))
                })?;
                if child_node.parent_id.as_deref() != Some(node.id.as_str()) {
                    return Err(TreeError::violation(format!(
                        "child '{}' does not point back to '{}'",
                        child, node.id
                    )));
                }
            }
        }
        // Mutual links plus a single root still allow detached cycles.
        if self.preorder().len() != self.nodes.len() {
            return Err(TreeError::violation("tree contains a cycle or unreachable widgets"));
        }
        Ok(())
    }
}

fn check_index(index: Option<usize>, len: usize, parent: &str) -> Result<usize, TreeError> {
    match index {
        None => Ok(len),
        Some(i) if i <= len => Ok(i),
        Some(i) => Err(TreeError::violation(format!(
            "index {} out of range for '{}' with {} children",
            i, parent, len
        ))),
    }
}
