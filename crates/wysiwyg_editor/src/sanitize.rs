// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Sanitizing HTML that enters the editor.
//!
//! The editor only knows the [Parser] trait: something that takes HTML (or a
//! live element) plus a [ParserRules] set and returns sanitized HTML.
//! [RuleParser] is the built-in implementation.

mod auto_link;

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde::Deserialize;

use crate::dom::parser::parse_fragment;
use crate::dom::{Dom, NodeData, NodeHandle};
use crate::{Config, ParseError};

pub use auto_link::auto_link;

/// Elements dropped together with everything inside them, whatever the
/// rules say.
const ALWAYS_REMOVED: [&str; 7] =
    ["head", "meta", "object", "script", "style", "template", "title"];

/// What to sanitize.
pub enum ParseSource<'a> {
    /// An HTML string. `context` is the document the result is meant for.
    Html { html: &'a str, context: &'a Dom },
    /// A live element, sanitized in place.
    Element { dom: &'a mut Dom, node: NodeHandle },
}

pub trait Parser {
    /// Sanitize `source` according to `rules`, returning the resulting
    /// HTML. For [ParseSource::Element] this is the element's new inner
    /// HTML.
    fn parse(
        &self,
        source: ParseSource<'_>,
        rules: &ParserRules,
        clean_up: bool,
    ) -> Result<String, ParseError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TagRule {
    /// Replace the tag name, e.g. `b` → `strong`.
    #[serde(default)]
    pub rename_tag: Option<String>,
    /// Drop the element and its content.
    #[serde(default)]
    pub remove: bool,
    /// Attributes (besides `class`) kept on this element.
    #[serde(default)]
    pub keep_attributes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ParserRules {
    /// Elements that survive sanitizing. Anything else is replaced by its
    /// children.
    #[serde(default)]
    pub tags: BTreeMap<String, TagRule>,
    /// Class names that survive sanitizing.
    #[serde(default)]
    pub classes: BTreeSet<String>,
}

impl Default for ParserRules {
    fn default() -> Self {
        Self {
            tags: ["br", "span", "div", "p"]
                .into_iter()
                .map(|tag| (String::from(tag), TagRule::default()))
                .collect(),
            classes: BTreeSet::new(),
        }
    }
}

/// The built-in sanitizer.
///
/// Elements listed in the rules are kept (renamed when asked), unknown
/// elements are replaced by their children, and attributes are dropped
/// unless the rule for the element keeps them. Running it over its own
/// output changes nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleParser;

impl Parser for RuleParser {
    fn parse(
        &self,
        source: ParseSource<'_>,
        rules: &ParserRules,
        clean_up: bool,
    ) -> Result<String, ParseError> {
        match source {
            ParseSource::Html { html, .. } => {
                let mut fragment = parse_fragment(html);
                let root = fragment.root();
                sanitize_children(&mut fragment, root, rules, clean_up);
                Ok(fragment.inner_html(root))
            }
            ParseSource::Element { dom, node } => {
                sanitize_children(dom, node, rules, clean_up);
                Ok(dom.inner_html(node))
            }
        }
    }
}

fn sanitize_children(
    dom: &mut Dom,
    parent: NodeHandle,
    rules: &ParserRules,
    clean_up: bool,
) {
    let mut index = 0;
    while let Some(child) = dom.children(parent).get(index).copied() {
        let name = match dom.get(child) {
            Some(NodeData::Element(element)) => element.name.clone(),
            _ => {
                index += 1;
                continue;
            }
        };

        if ALWAYS_REMOVED.contains(&name.as_str()) {
            dom.remove(child);
            continue;
        }
        let Some((target, rule)) = resolve_rule(rules, &name) else {
            // Its children move up into `index` and are visited next.
            dom.replace_with_children(child);
            continue;
        };
        if rule.remove || ALWAYS_REMOVED.contains(&target) {
            dom.remove(child);
            continue;
        }

        if target != name {
            dom.rename(child, target);
        }
        if let Some(element) = dom.element_mut(child) {
            let classes: Vec<String> = element
                .get_attr("class")
                .map(|classes| {
                    classes
                        .split_whitespace()
                        .filter(|c| rules.classes.contains(*c))
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default();
            element.attrs.retain(|(attr, _)| {
                rule.keep_attributes.iter().any(|kept| kept == attr)
            });
            if !classes.is_empty() {
                element.set_attr("class", &classes.join(" "));
            }
        }

        let senseless_span = clean_up
            && dom
                .element(child)
                .is_some_and(|e| e.name == "span" && e.attrs.is_empty());
        if senseless_span {
            dom.replace_with_children(child);
            continue;
        }

        sanitize_children(dom, child, rules, clean_up);
        index += 1;
    }
}

/// The name an element called `name` ends up with and the rule it is
/// sanitized under, following renames through the rules. A tag that some
/// rule renames into is allowed even when it has no rule of its own, so
/// sanitized output passes through unchanged.
fn resolve_rule<'r>(
    rules: &'r ParserRules,
    name: &'r str,
) -> Option<(&'r str, &'r TagRule)> {
    let mut rule = rules.tags.get(name).or_else(|| {
        rules
            .tags
            .values()
            .find(|r| r.rename_tag.as_deref() == Some(name))
    })?;
    let mut target = name;
    // Bounded, so rules renaming in a cycle still terminate.
    for _ in 0..rules.tags.len() {
        let Some(next) = rule.rename_tag.as_deref() else {
            break;
        };
        if next == target {
            break;
        }
        target = next;
        match rules.tags.get(next) {
            Some(next_rule) => rule = next_rule,
            None => break,
        }
    }
    Some((target, rule))
}

/// Remove inline styles from pasted links; browsers paste them with the
/// source page's colours.
pub fn clean_pasted_html(dom: &mut Dom, root: NodeHandle) {
    for node in dom.descendants(root) {
        if let Some(element) = dom.element_mut(node) {
            if element.name == "a" {
                element.remove_attr("style");
            }
        }
    }
}

/// The parser, rules and clean-up flag of an editor, bundled so the views
/// can sanitize without holding the whole [Config].
#[derive(Clone)]
pub struct ParseContext {
    parser: Option<Rc<dyn Parser>>,
    rules: Rc<ParserRules>,
    clean_up: bool,
}

impl ParseContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            parser: config.parser.clone(),
            rules: Rc::new(config.parser_rules.clone()),
            clean_up: config.clean_up,
        }
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    /// Sanitized `html`, or `html` itself when no parser is configured.
    pub fn parse_html(
        &self,
        html: &str,
        context: &Dom,
    ) -> Result<String, ParseError> {
        match &self.parser {
            Some(parser) => parser.parse(
                ParseSource::Html { html, context },
                &self.rules,
                self.clean_up,
            ),
            None => Ok(html.to_owned()),
        }
    }

    /// Sanitize the children of `node` in place, returning its inner HTML.
    pub fn parse_element(
        &self,
        dom: &mut Dom,
        node: NodeHandle,
    ) -> Result<String, ParseError> {
        match &self.parser {
            Some(parser) => parser.parse(
                ParseSource::Element { dom, node },
                &self.rules,
                self.clean_up,
            ),
            None => Ok(dom.inner_html(node)),
        }
    }
}
