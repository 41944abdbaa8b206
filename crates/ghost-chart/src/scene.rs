//! Retained element tree
//!
//! The scene stands in for the SVG subtree the chart draws into. Element ids
//! are handed out sequentially and reset on [`Scene::clear`], so two runs that
//! build the same elements in the same order produce identical snapshots.

use crate::error::SceneError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Handle to one element in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element type, mirroring the SVG primitives the chart uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// `<g>`
    Group,
    /// `<circle>`
    Circle,
    /// `<line>`
    Line,
    /// `<path>`
    Path,
    /// `<rect>`
    Rect,
    /// `<text>`
    Text,
}

impl ElementKind {
    /// SVG tag name
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Group => "g",
            ElementKind::Circle => "circle",
            ElementKind::Line => "line",
            ElementKind::Path => "path",
            ElementKind::Rect => "rect",
            ElementKind::Text => "text",
        }
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Numeric attribute, tweenable
    Number(f64),
    /// Any other attribute
    Text(String),
}

impl AttrValue {
    /// Numeric value, if this is a number
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(n) => {
                // Two decimals is plenty for pixels and opacities
                let rounded = (n * 100.0).round() / 100.0;
                write!(f, "{rounded}")
            }
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// One node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Stable id within one run
    pub id: ElementId,
    /// SVG primitive
    pub kind: ElementKind,
    /// `None` only for the root
    pub parent: Option<ElementId>,
    /// CSS classes, used for selection
    pub classes: BTreeSet<String>,
    /// Attributes by name
    pub attrs: BTreeMap<String, AttrValue>,
    /// Text content of `<text>` nodes
    pub text: Option<String>,
    /// Child ids in insertion order
    pub children: Vec<ElementId>,
}

/// The element tree a chart run draws into
#[derive(Debug, Clone)]
pub struct Scene {
    elements: BTreeMap<ElementId, Element>,
    next_id: u32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Root element id; always present
    pub const ROOT: ElementId = ElementId(0);

    /// Scene containing only the root group
    #[must_use]
    pub fn new() -> Self {
        let mut scene = Self {
            elements: BTreeMap::new(),
            next_id: 1,
        };
        scene.elements.insert(Self::ROOT, Self::root_element());
        scene
    }

    fn root_element() -> Element {
        Element {
            id: Self::ROOT,
            kind: ElementKind::Group,
            parent: None,
            classes: BTreeSet::from(["ghost-chart".to_string()]),
            attrs: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Remove everything but a fresh root and restart id allocation
    pub fn clear(&mut self) {
        self.elements.clear();
        self.elements.insert(Self::ROOT, Self::root_element());
        self.next_id = 1;
    }

    /// Append a new child of `kind` under `parent`
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownElement`] if `parent` does not exist.
    pub fn append(&mut self, parent: ElementId, kind: ElementKind) -> Result<ElementId, SceneError> {
        let id = ElementId(self.next_id);
        self.element_mut(parent)?.children.push(id);
        self.next_id += 1;
        self.elements.insert(
            id,
            Element {
                id,
                kind,
                parent: Some(parent),
                classes: BTreeSet::new(),
                attrs: BTreeMap::new(),
                text: None,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Append a child with one class already applied
    pub fn append_with_class(
        &mut self,
        parent: ElementId,
        kind: ElementKind,
        class: &str,
    ) -> Result<ElementId, SceneError> {
        let id = self.append(parent, kind)?;
        self.add_class(id, class)?;
        Ok(id)
    }

    /// Remove an element and its subtree
    pub fn remove(&mut self, id: ElementId) -> Result<(), SceneError> {
        if id == Self::ROOT {
            return Err(SceneError::RootRemoval);
        }
        let element = self.elements.remove(&id).ok_or(SceneError::UnknownElement(id))?;
        if let Some(parent) = element.parent.and_then(|p| self.elements.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        let mut stack = element.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.elements.remove(&child) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Element by id
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element, SceneError> {
        self.elements.get_mut(&id).ok_or(SceneError::UnknownElement(id))
    }

    /// Set one attribute
    pub fn set_attr(
        &mut self,
        id: ElementId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        self.element_mut(id)?
            .attrs
            .insert(name.to_string(), value.into());
        Ok(())
    }

    /// Set several attributes at once
    pub fn set_attrs<const N: usize>(
        &mut self,
        id: ElementId,
        attrs: [(&str, AttrValue); N],
    ) -> Result<(), SceneError> {
        let element = self.element_mut(id)?;
        for (name, value) in attrs {
            element.attrs.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Remove one attribute, if present
    pub fn remove_attr(&mut self, id: ElementId, name: &str) -> Result<(), SceneError> {
        self.element_mut(id)?.attrs.remove(name);
        Ok(())
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, id: ElementId, name: &str) -> Option<&AttrValue> {
        self.elements.get(&id)?.attrs.get(name)
    }

    /// Numeric attribute value
    #[must_use]
    pub fn number(&self, id: ElementId, name: &str) -> Option<f64> {
        self.attr(id, name).and_then(AttrValue::as_number)
    }

    /// Add a class
    pub fn add_class(&mut self, id: ElementId, class: &str) -> Result<(), SceneError> {
        self.element_mut(id)?.classes.insert(class.to_string());
        Ok(())
    }

    /// Remove a class
    pub fn remove_class(&mut self, id: ElementId, class: &str) -> Result<(), SceneError> {
        self.element_mut(id)?.classes.remove(class);
        Ok(())
    }

    /// Whether the element carries `class`
    #[must_use]
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements
            .get(&id)
            .is_some_and(|e| e.classes.contains(class))
    }

    /// Set text content
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) -> Result<(), SceneError> {
        self.element_mut(id)?.text = Some(text.into());
        Ok(())
    }

    /// Children of `id` in insertion order
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(&id)
            .map_or(&[][..], |e| e.children.as_slice())
    }

    /// All elements carrying `class`, in id order
    #[must_use]
    pub fn select_by_class(&self, class: &str) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|e| e.classes.contains(class))
            .map(|e| e.id)
            .collect()
    }

    /// Number of elements including the root
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether only the root is present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// Order-stable copy for comparison and hashing
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            elements: self
                .elements
                .values()
                .map(|e| ElementSnapshot {
                    id: e.id,
                    kind: e.kind,
                    parent: e.parent,
                    classes: e.classes.iter().cloned().collect(),
                    attrs: e.attrs.clone(),
                    text: e.text.clone(),
                })
                .collect(),
        }
    }
}

/// Serializable copy of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Element id
    pub id: ElementId,
    /// SVG primitive
    pub kind: ElementKind,
    /// Parent id
    pub parent: Option<ElementId>,
    /// Sorted CSS classes
    pub classes: Vec<String>,
    /// Attributes by name
    pub attrs: BTreeMap<String, AttrValue>,
    /// Text content
    pub text: Option<String>,
}

/// Serializable copy of a whole scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Every element in id order
    pub elements: Vec<ElementSnapshot>,
}

impl SceneSnapshot {
    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the snapshot holds no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Elements carrying `class`
    pub fn with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a ElementSnapshot> {
        self.elements
            .iter()
            .filter(move |e| e.classes.iter().any(|c| c == class))
    }

    /// SHA-256 over the JSON form, hex encoded
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(bytes))
    }
}
