// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use html5ever::{LocalName, Namespace, QualName};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParsedHandle(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParsedElement {
    pub(crate) name: QualName,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<ParsedHandle>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ParsedNode {
    Document(Vec<ParsedHandle>),
    Element(ParsedElement),
    Text(String),
    /// Comments, doctypes and processing instructions. Kept so html5ever
    /// can hold a handle to them, dropped when converting to a `Dom`.
    Ignored,
}

impl ParsedNode {
    pub(crate) fn children(&self) -> &[ParsedHandle] {
        match self {
            ParsedNode::Document(children) => children,
            ParsedNode::Element(element) => &element.children,
            ParsedNode::Text(_) | ParsedNode::Ignored => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<ParsedHandle>> {
        match self {
            ParsedNode::Document(children) => Some(children),
            ParsedNode::Element(element) => Some(&mut element.children),
            ParsedNode::Text(_) | ParsedNode::Ignored => None,
        }
    }
}

pub(crate) fn html_name(local: &str) -> QualName {
    QualName::new(
        None,
        Namespace::from("http://www.w3.org/1999/xhtml"),
        LocalName::from(local),
    )
}

#[test]
fn only_containers_expose_children() {
    let mut element = ParsedNode::Element(ParsedElement {
        name: html_name("div"),
        attrs: Vec::new(),
        children: vec![ParsedHandle(3)],
    });
    assert_eq!(element.children(), &[ParsedHandle(3)]);
    assert!(element.children_mut().is_some());
    let mut text = ParsedNode::Text("t".into());
    assert!(text.children().is_empty());
    assert!(text.children_mut().is_none());
}
