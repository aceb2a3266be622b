// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use html5ever::interface::NextParserState;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_fragment, Attribute, QualName};

use super::parsed_node::{html_name, ParsedElement, ParsedHandle, ParsedNode};
use crate::dom::{Dom, NodeHandle};

/// The result of running html5ever over a fragment: the converted tree plus
/// whatever parse errors html5ever reported while repairing the markup.
pub(crate) struct ParsedFragment {
    pub(crate) dom: Dom,
    pub(crate) parse_errors: Vec<String>,
}

struct SinkState {
    nodes: Vec<ParsedNode>,
    parents: Vec<Option<ParsedHandle>>,
    document: ParsedHandle,
    parse_errors: Vec<String>,
    /// Returned by `elem_name` for handles that are not elements.
    no_name: QualName,
}

impl SinkState {
    fn new() -> Self {
        Self {
            nodes: vec![ParsedNode::Document(Vec::new())],
            parents: vec![None],
            document: ParsedHandle(0),
            parse_errors: Vec::new(),
            no_name: html_name(""),
        }
    }

    fn add(&mut self, node: ParsedNode) -> ParsedHandle {
        self.nodes.push(node);
        self.parents.push(None);
        ParsedHandle(self.nodes.len() - 1)
    }

    fn detach(&mut self, child: &ParsedHandle) {
        if let Some(parent) = self.parents[child.0].take() {
            if let Some(children) = self.nodes[parent.0].children_mut() {
                children.retain(|c| c != child);
            }
        }
    }

    fn insert(&mut self, parent: &ParsedHandle, index: usize, child: ParsedHandle) {
        self.detach(&child);
        if let Some(children) = self.nodes[parent.0].children_mut() {
            let index = index.min(children.len());
            children.insert(index, child.clone());
            self.parents[child.0] = Some(parent.clone());
        }
    }

    /// Insert `child` at `index` in `parent`, merging text into an adjacent
    /// preceding text node the way the HTML tree builder expects.
    fn insert_node_or_text(
        &mut self,
        parent: &ParsedHandle,
        index: usize,
        child: NodeOrText<ParsedHandle>,
    ) {
        match child {
            NodeOrText::AppendNode(node) => self.insert(parent, index, node),
            NodeOrText::AppendText(tendril) => {
                let previous = index
                    .checked_sub(1)
                    .and_then(|i| self.nodes[parent.0].children().get(i))
                    .cloned();
                if let Some(previous) = previous {
                    if let ParsedNode::Text(text) = &mut self.nodes[previous.0]
                    {
                        text.push_str(tendril.as_ref());
                        return;
                    }
                }
                let text = self.add(ParsedNode::Text(tendril.as_ref().to_owned()));
                self.insert(parent, index, text);
            }
        }
    }

    fn into_fragment(self) -> ParsedFragment {
        let mut dom = Dom::new();
        let root = dom.root();
        self.convert(&self.document, &mut dom, root);
        ParsedFragment {
            dom,
            parse_errors: self.parse_errors,
        }
    }

    /// Copy the parsed node into `dom` below `parent`. The `html` element
    /// html5ever wraps fragments in is skipped, its children are copied
    /// directly.
    fn convert(&self, handle: &ParsedHandle, dom: &mut Dom, parent: NodeHandle) {
        match &self.nodes[handle.0] {
            ParsedNode::Document(children) => {
                for child in children {
                    self.convert(child, dom, parent);
                }
            }
            ParsedNode::Element(element) => {
                let name = element.name.local.as_ref();
                if name == "html" {
                    for child in &element.children {
                        self.convert(child, dom, parent);
                    }
                    return;
                }
                let node =
                    dom.create_element_with_attrs(name, element.attrs.clone());
                dom.append_child(parent, node);
                for child in &element.children {
                    self.convert(child, dom, node);
                }
            }
            ParsedNode::Text(text) => {
                if !text.is_empty() {
                    let node = dom.create_text(text);
                    dom.append_child(parent, node);
                }
            }
            ParsedNode::Ignored => {}
        }
    }
}

pub(crate) struct DomBuilder {
    state: RefCell<SinkState>,
}

impl DomBuilder {
    pub(crate) fn parse(html: &str) -> ParsedFragment {
        parse_fragment(
            DomBuilder::default(),
            Default::default(),
            html_name("body"),
            vec![],
        )
        .from_utf8()
        .one(html.as_bytes())
    }
}

impl Default for DomBuilder {
    fn default() -> Self {
        Self {
            state: RefCell::new(SinkState::new()),
        }
    }
}

impl TreeSink for DomBuilder {
    type Handle = ParsedHandle;
    type Output = ParsedFragment;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        self.state.into_inner().into_fragment()
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.state.borrow_mut().parse_errors.push(String::from(msg));
    }

    fn get_document(&self) -> Self::Handle {
        self.state.borrow().document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.state.borrow(), |state| match &state.nodes[target.0] {
            ParsedNode::Element(element) => &element.name,
            _ => &state.no_name,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .iter()
            .map(|attr| {
                (
                    attr.name.local.as_ref().to_owned(),
                    attr.value.as_ref().to_owned(),
                )
            })
            .collect();
        self.state
            .borrow_mut()
            .add(ParsedNode::Element(ParsedElement {
                name,
                attrs,
                children: Vec::new(),
            }))
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.state.borrow_mut().add(ParsedNode::Ignored)
    }

    fn create_pi(
        &self,
        _target: StrTendril,
        _data: StrTendril,
    ) -> Self::Handle {
        self.state.borrow_mut().add(ParsedNode::Ignored)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut state = self.state.borrow_mut();
        let index = state.nodes[parent.0].children().len();
        state.insert_node_or_text(parent, index, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.state.borrow().parents[element.0].is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Doctypes have no place in a fragment
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {
        // Scripts are never run
    }

    fn pop(&self, _node: &Self::Handle) {
        // Nothing to do here
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {
        // Nothing to do here
    }

    fn append_before_sibling(
        &self,
        sibling: &Self::Handle,
        new_node: NodeOrText<Self::Handle>,
    ) {
        let mut state = self.state.borrow_mut();
        let Some(parent) = state.parents[sibling.0].clone() else {
            return;
        };
        let Some(index) = state.nodes[parent.0]
            .children()
            .iter()
            .position(|c| c == sibling)
        else {
            return;
        };
        state.insert_node_or_text(&parent, index, new_node);
    }

    fn add_attrs_if_missing(
        &self,
        target: &Self::Handle,
        attrs: Vec<Attribute>,
    ) {
        let mut state = self.state.borrow_mut();
        if let ParsedNode::Element(element) = &mut state.nodes[target.0] {
            for attr in attrs {
                let attr_name = attr.name.local.as_ref();
                if !element.attrs.iter().any(|(name, _)| name == attr_name) {
                    element
                        .attrs
                        .push((attr_name.to_owned(), attr.value.as_ref().to_owned()));
                }
            }
        }
    }

    fn associate_with_form(
        &self,
        _target: &Self::Handle,
        _form: &Self::Handle,
        _nodes: (&Self::Handle, Option<&Self::Handle>),
    ) {
        // Forms are not tracked
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.state.borrow_mut().detach(target);
    }

    fn reparent_children(
        &self,
        node: &Self::Handle,
        new_parent: &Self::Handle,
    ) {
        let mut state = self.state.borrow_mut();
        let children = state.nodes[node.0].children().to_vec();
        for child in children {
            let index = state.nodes[new_parent.0].children().len();
            state.insert(new_parent, index, child);
        }
    }

    fn is_mathml_annotation_xml_integration_point(
        &self,
        _handle: &Self::Handle,
    ) -> bool {
        false
    }

    fn set_current_line(&self, _line_number: u64) {
        // Nothing to do here
    }

    fn complete_script(&self, _node: &Self::Handle) -> NextParserState {
        NextParserState::Continue
    }

    fn allow_declarative_shadow_roots(
        &self,
        _intended_parent: &Self::Handle,
    ) -> bool {
        false
    }

    fn attach_declarative_shadow(
        &self,
        _location: &Self::Handle,
        _template: &Self::Handle,
        _attrs: Vec<Attribute>,
    ) -> Result<(), String> {
        Err(String::from("Declarative shadow roots are not supported"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn html(input: &str) -> String {
        let fragment = DomBuilder::parse(input);
        fragment.dom.inner_html(fragment.dom.root())
    }

    #[test]
    fn parsing_an_empty_string_creates_an_empty_dom() {
        let fragment = DomBuilder::parse("");
        assert!(fragment.dom.is_empty());
        assert_eq!(fragment.dom.len(), 1);
    }

    #[test]
    fn parsing_a_text_snippet_creates_one_node() {
        let fragment = DomBuilder::parse("foo");
        let dom = fragment.dom;
        assert_eq!(dom.children(dom.root()).len(), 1);
        assert_eq!(dom.text(dom.children(dom.root())[0]), Some("foo"));
    }

    #[test]
    fn parsing_nested_structures_produces_them() {
        assert_eq!(html("A<i>B<b>C</b>D</i>E"), "A<i>B<b>C</b>D</i>E");
    }

    #[test]
    fn parsing_tags_with_attributes_preserves_them() {
        assert_eq!(
            html("<span class='foo'>txt</span>"),
            "<span class=\"foo\">txt</span>"
        );
    }

    #[test]
    fn parsing_text_node_with_escaped_html_entities() {
        let fragment = DomBuilder::parse("aaa&lt;strong&gt;bbb");
        let dom = fragment.dom;
        assert_eq!(dom.text_content(dom.root()), "aaa<strong>bbb");
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(html("a<!-- hidden -->b"), "ab");
    }

    #[test]
    fn unclosed_tags_are_repaired() {
        assert_eq!(html("<b>bold"), "<b>bold</b>");
        assert_eq!(html("<p>one<p>two"), "<p>one</p><p>two</p>");
    }

    #[test]
    fn misnested_formatting_is_repaired_with_errors_reported() {
        let fragment = DomBuilder::parse("<b><i>x</b>y</i>");
        assert_eq!(
            fragment.dom.inner_html(fragment.dom.root()),
            "<b><i>x</i></b><i>y</i>"
        );
        assert!(!fragment.parse_errors.is_empty());
    }
}
