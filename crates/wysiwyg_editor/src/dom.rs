// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The content tree edited by the composer.
//!
//! Nodes live in an arena owned by the [Dom] and are referred to by
//! [NodeHandle]s. A handle stays valid (and keeps identifying the same node)
//! until that node is removed, so callers can compare child lists before and
//! after an operation to check that nothing was moved or replaced.

pub mod parser;
mod to_html;

use crate::dom::parser::parse_fragment;

/// Elements that never have children and are serialized without a closing
/// tag.
pub(crate) const VOID_ELEMENTS: [&str; 6] =
    ["br", "hr", "img", "input", "meta", "wbr"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    /// Lower-case local name, e.g. `"br"`.
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _v)| n == name)
            .map(|(_n, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(n, _v)| n == name) {
            Some((_n, v)) => *v = value.to_owned(),
            None => self.attrs.push((name.to_owned(), value.to_owned())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _v)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Add `class` to the class attribute. Returns false if it was already
    /// present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let classes = match self.get_attr("class") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{} {}", existing.trim(), class)
            }
            _ => class.to_owned(),
        };
        self.set_attr("class", &classes);
        true
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        let Some(existing) = self.get_attr("class") else {
            return false;
        };
        let remaining: Vec<&str> =
            existing.split_whitespace().filter(|c| *c != class).collect();
        if remaining.len() == existing.split_whitespace().count() {
            return false;
        }
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr("class", &joined);
        }
        true
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

#[derive(Clone, Debug)]
struct Slot {
    data: NodeData,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

#[derive(Clone, Debug)]
pub struct Dom {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    root: NodeHandle,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// A document whose root is an empty `body` element.
    pub fn new() -> Self {
        Self::with_root("body")
    }

    pub fn with_root(name: &str) -> Self {
        let mut dom = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeHandle(0),
        };
        dom.root = dom.add(NodeData::Element(ElementData::new(name)));
        dom
    }

    /// Build a document whose root holds the parsed `html`.
    pub fn from_html(html: &str) -> Self {
        parse_fragment(html)
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Number of live nodes, including the root.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.slot(handle).is_some()
    }

    fn add(&mut self, data: NodeData) -> NodeHandle {
        let slot = Slot {
            data,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                NodeHandle(index)
            }
            None => {
                self.slots.push(Some(slot));
                NodeHandle(self.slots.len() - 1)
            }
        }
    }

    fn slot(&self, handle: NodeHandle) -> Option<&Slot> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, handle: NodeHandle) -> Option<&mut Slot> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn create_element(&mut self, name: &str) -> NodeHandle {
        self.add(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_element_with_attrs(
        &mut self,
        name: &str,
        attrs: Vec<(String, String)>,
    ) -> NodeHandle {
        let mut element = ElementData::new(name);
        element.attrs = attrs;
        self.add(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeHandle {
        self.add(NodeData::Text(text.to_owned()))
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&NodeData> {
        self.slot(handle).map(|slot| &slot.data)
    }

    pub fn element(&self, handle: NodeHandle) -> Option<&ElementData> {
        match self.get(handle)? {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(
        &mut self,
        handle: NodeHandle,
    ) -> Option<&mut ElementData> {
        match &mut self.slot_mut(handle)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, handle: NodeHandle) -> Option<&str> {
        match self.get(handle)? {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn text_mut(&mut self, handle: NodeHandle) -> Option<&mut String> {
        match &mut self.slot_mut(handle)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, handle: NodeHandle) -> bool {
        matches!(self.get(handle), Some(NodeData::Text(_)))
    }

    pub fn is_element_named(&self, handle: NodeHandle, name: &str) -> bool {
        self.element(handle).is_some_and(|e| e.name == name)
    }

    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.slot(handle)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.slot(handle)?.parent
    }

    pub fn index_in_parent(&self, handle: NodeHandle) -> Option<usize> {
        let parent = self.parent(handle)?;
        self.children(parent).iter().position(|c| *c == handle)
    }

    pub fn previous_sibling(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let parent = self.parent(handle)?;
        let index = self.index_in_parent(handle)?;
        index
            .checked_sub(1)
            .map(|previous| self.children(parent)[previous])
    }

    /// True if `handle` is `ancestor` or lives somewhere below it.
    pub fn is_inside(&self, handle: NodeHandle, ancestor: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Closest ancestor (excluding `handle`) that is an element called
    /// `name`.
    pub fn ancestor_named(
        &self,
        handle: NodeHandle,
        name: &str,
    ) -> Option<NodeHandle> {
        let mut current = self.parent(handle);
        while let Some(node) = current {
            if self.is_element_named(node, name) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it
    /// from wherever it was before. Out of range indices append.
    pub fn insert_child(
        &mut self,
        parent: NodeHandle,
        index: usize,
        child: NodeHandle,
    ) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(slot) = self.slot_mut(parent) {
            let index = index.min(slot.children.len());
            slot.children.insert(index, child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    /// Take `handle` out of its parent's child list, keeping the node (and
    /// its subtree) alive. Returns the index it was removed from.
    pub fn detach(&mut self, handle: NodeHandle) -> Option<usize> {
        let parent = self.parent(handle)?;
        let index = self.index_in_parent(handle)?;
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.remove(index);
        }
        if let Some(slot) = self.slot_mut(handle) {
            slot.parent = None;
        }
        Some(index)
    }

    /// Detach `handle` and free it together with its whole subtree. The root
    /// cannot be removed.
    pub fn remove(&mut self, handle: NodeHandle) {
        if handle == self.root || !self.contains(handle) {
            return;
        }
        self.detach(handle);
        let mut pending = vec![handle];
        while let Some(node) = pending.pop() {
            if let Some(slot) = self.slots[node.0].take() {
                pending.extend(slot.children);
                self.free.push(node.0);
            }
        }
    }

    pub fn remove_children(&mut self, handle: NodeHandle) {
        for child in self.children(handle).to_vec() {
            self.remove(child);
        }
    }

    /// Replace `handle` with its children, in place.
    pub fn replace_with_children(&mut self, handle: NodeHandle) {
        let (Some(parent), Some(index)) =
            (self.parent(handle), self.index_in_parent(handle))
        else {
            return;
        };
        let children = self.children(handle).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + 1 + offset, child);
        }
        self.remove(handle);
    }

    pub fn rename(&mut self, handle: NodeHandle, name: &str) {
        if let Some(element) = self.element_mut(handle) {
            element.name = name.to_ascii_lowercase();
        }
    }

    /// A detached copy of the subtree below (and including) `handle`.
    pub fn deep_clone(&mut self, handle: NodeHandle) -> Option<NodeHandle> {
        let data = self.get(handle)?.clone();
        let copy = self.add(data);
        for child in self.children(handle).to_vec() {
            if let Some(child_copy) = self.deep_clone(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    /// Copy the subtree at `handle` in `other` into this document, returning
    /// the detached copy.
    pub fn import(&mut self, other: &Dom, handle: NodeHandle) -> Option<NodeHandle> {
        let copy = self.add(other.get(handle)?.clone());
        for child in other.children(handle) {
            if let Some(child_copy) = self.import(other, *child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    /// Replace the children of `handle` with the nodes parsed from `html`.
    pub fn set_inner_html(&mut self, handle: NodeHandle, html: &str) {
        let fragment = parse_fragment(html);
        self.remove_children(handle);
        for child in fragment.children(fragment.root()) {
            if let Some(copy) = self.import(&fragment, *child) {
                self.append_child(handle, copy);
            }
        }
    }

    /// All nodes below `handle` in document order (pre-order), excluding
    /// `handle` itself.
    pub fn descendants(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut ret = Vec::new();
        let mut pending: Vec<NodeHandle> =
            self.children(handle).iter().rev().copied().collect();
        while let Some(node) = pending.pop() {
            ret.push(node);
            pending.extend(self.children(node).iter().rev().copied());
        }
        ret
    }

    /// Concatenated text of every text node below `handle`.
    pub fn text_content(&self, handle: NodeHandle) -> String {
        if let Some(text) = self.text(handle) {
            return text.to_owned();
        }
        self.descendants(handle)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> (Dom, NodeHandle, NodeHandle, NodeHandle) {
        let mut dom = Dom::new();
        let root = dom.root();
        let text = dom.create_text("foo");
        let br = dom.create_element("br");
        let b = dom.create_element("b");
        let inner = dom.create_text("bar");
        dom.append_child(root, text);
        dom.append_child(root, br);
        dom.append_child(root, b);
        dom.append_child(b, inner);
        (dom, text, br, b)
    }

    #[test]
    fn new_dom_has_only_an_empty_body() {
        let dom = Dom::new();
        assert_eq!(dom.len(), 1);
        assert!(dom.is_empty());
        assert!(dom.is_element_named(dom.root(), "body"));
    }

    #[test]
    fn appending_records_parent_and_order() {
        let (dom, text, br, b) = sample();
        assert_eq!(dom.children(dom.root()), &[text, br, b]);
        assert_eq!(dom.parent(br), Some(dom.root()));
        assert_eq!(dom.previous_sibling(br), Some(text));
        assert_eq!(dom.previous_sibling(text), None);
        assert_eq!(dom.text_content(dom.root()), "foobar");
    }

    #[test]
    fn removing_a_subtree_frees_its_slots() {
        let (mut dom, _, _, b) = sample();
        assert_eq!(dom.len(), 5);
        dom.remove(b);
        assert_eq!(dom.len(), 3);
        assert!(!dom.contains(b));
        let reused = dom.create_element("i");
        assert_eq!(dom.len(), 4);
        assert!(dom.contains(reused));
    }

    #[test]
    fn root_cannot_be_removed() {
        let (mut dom, ..) = sample();
        let root = dom.root();
        dom.remove(root);
        assert!(dom.contains(root));
    }

    #[test]
    fn inserting_an_attached_node_moves_it() {
        let (mut dom, text, br, b) = sample();
        let root = dom.root();
        dom.insert_child(root, 0, b);
        assert_eq!(dom.children(root), &[b, text, br]);
    }

    #[test]
    fn replace_with_children_unwraps_in_place() {
        let (mut dom, text, br, b) = sample();
        let inner = dom.children(b)[0];
        dom.replace_with_children(b);
        assert_eq!(dom.children(dom.root()), &[text, br, inner]);
        assert!(!dom.contains(b));
    }

    #[test]
    fn deep_clone_copies_without_attaching() {
        let (mut dom, _, _, b) = sample();
        let copy = dom.deep_clone(b).unwrap();
        assert_ne!(copy, b);
        assert_eq!(dom.parent(copy), None);
        assert_eq!(dom.text_content(copy), "bar");
        assert_eq!(dom.children(dom.root()).len(), 3);
    }

    #[test]
    fn classes_are_added_once_and_removed() {
        let mut element = ElementData::new("DIV");
        assert_eq!(element.name, "div");
        assert!(element.add_class("a"));
        assert!(!element.add_class("a"));
        assert!(element.add_class("b"));
        assert_eq!(element.get_attr("class"), Some("a b"));
        assert!(element.remove_class("a"));
        assert_eq!(element.get_attr("class"), Some("b"));
        assert!(element.remove_class("b"));
        assert_eq!(element.get_attr("class"), None);
    }

    #[test]
    fn set_inner_html_replaces_children() {
        let (mut dom, ..) = sample();
        let root = dom.root();
        dom.set_inner_html(root, "<p>x</p>y");
        assert_eq!(dom.inner_html(root), "<p>x</p>y");
        assert_eq!(dom.len(), 4);
    }

    #[test]
    fn ancestor_lookup_stops_at_the_named_element() {
        let mut dom = Dom::from_html("<a href=\"x\"><b>t</b></a>");
        let root = dom.root();
        let a = dom.children(root)[0];
        let b = dom.children(a)[0];
        let t = dom.children(b)[0];
        assert_eq!(dom.ancestor_named(t, "a"), Some(a));
        assert_eq!(dom.ancestor_named(t, "i"), None);
        assert!(dom.is_inside(t, a));
        let loose = dom.create_text("z");
        assert!(!dom.is_inside(loose, root));
    }
}
