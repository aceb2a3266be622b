// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::VecDeque;

use crate::dom::parser::parse_fragment;
use crate::dom::{Dom, NodeHandle};
use crate::sanitize::{auto_link, ParseContext};
use crate::surface::{Caret, Selection, Surface, SurfaceHandle};
use crate::views::{View, ViewKind};
use crate::{Config, ParseError};

const PLACEHOLDER_CLASS: &str = "placeholder";

/// Snapshots kept for undo, and for redo. Older ones are forgotten.
pub const MAX_HISTORY_ENTRIES: usize = 25;

/// Elements that do not count as content on their own.
const STRUCTURAL_ELEMENTS: [&str; 3] = ["br", "div", "p"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    InsertText(String),
    InsertLineBreak,
    InsertHtml(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The command ran.
    pub executed: bool,
    /// The command finished a word.
    pub new_word: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposerOptions {
    pub use_line_breaks: bool,
    pub auto_link: bool,
    pub placeholder_text: Option<String>,
}

impl ComposerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            use_line_breaks: config.use_line_breaks,
            auto_link: config.auto_link,
            placeholder_text: config.placeholder_text.clone(),
        }
    }
}

/// The rich view: a contenteditable document inside the sandbox.
///
/// Until the sandbox is loaded, values set on the view are kept aside and
/// become the initial content.
pub struct ComposerView {
    surface: SurfaceHandle,
    parse_context: ParseContext,
    options: ComposerOptions,
    pending: Option<String>,
    placeholder_shown: bool,
    undo_stack: VecDeque<String>,
    redo_stack: VecDeque<String>,
}

impl ComposerView {
    pub fn new(
        surface: SurfaceHandle,
        parse_context: ParseContext,
        options: ComposerOptions,
    ) -> Self {
        Self {
            surface,
            parse_context,
            options,
            pending: None,
            placeholder_shown: false,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
        }
    }

    pub fn surface(&self) -> &SurfaceHandle {
        &self.surface
    }

    pub fn is_loaded(&self) -> bool {
        self.surface.borrow().is_loaded()
    }

    /// Load the sandbox with `initial_html`, unless a value was set while
    /// it was loading.
    pub fn attach(&mut self, initial_html: &str) {
        let html = self.pending.take();
        self.surface
            .borrow_mut()
            .attach(html.as_deref().unwrap_or(initial_html));
        self.show_placeholder();
    }

    pub fn detach(&mut self) {
        self.placeholder_shown = false;
        self.surface.borrow_mut().detach();
    }

    /// Show the placeholder text if the composer is empty and unfocused.
    pub fn show_placeholder(&mut self) {
        let Some(text) = self.options.placeholder_text.clone() else {
            return;
        };
        if self.placeholder_shown
            || !self.is_loaded()
            || self.surface.borrow().is_focused()
            || !self.content_is_empty()
        {
            return;
        }
        self.placeholder_shown = true;
        apply(&mut self.surface.borrow_mut(), |dom, root, _| {
            dom.remove_children(root);
            let placeholder = dom.create_text(&text);
            dom.append_child(root, placeholder);
            if let Some(body) = dom.element_mut(root) {
                body.add_class(PLACEHOLDER_CLASS);
            }
        });
    }

    pub fn hide_placeholder(&mut self) {
        if !self.placeholder_shown {
            return;
        }
        self.placeholder_shown = false;
        apply(&mut self.surface.borrow_mut(), |dom, root, selection| {
            dom.remove_children(root);
            if let Some(body) = dom.element_mut(root) {
                body.remove_class(PLACEHOLDER_CLASS);
            }
            selection.collapse_to_end(dom, root);
        });
    }

    /// Run `command` at the caret. Nothing happens while the sandbox is
    /// unloaded or disabled.
    pub fn exec(&mut self, command: &Command) -> CommandOutcome {
        {
            let surface = self.surface.borrow();
            if !surface.is_loaded() || !surface.is_editable() {
                return CommandOutcome::default();
            }
        }
        self.hide_placeholder();
        self.remember_for_undo();

        let new_word = match command {
            Command::InsertText(text) => {
                text.ends_with(char::is_whitespace)
            }
            Command::InsertLineBreak => true,
            Command::InsertHtml(_) => false,
        };
        let use_line_breaks = self.options.use_line_breaks;
        let link = new_word && self.options.auto_link;

        let mut surface = self.surface.borrow_mut();
        apply(&mut surface, |dom, root, selection| {
            match command {
                Command::InsertText(text) => insert_text(dom, selection, text),
                Command::InsertLineBreak if use_line_breaks => {
                    let br = dom.create_element("br");
                    insert_nodes(dom, selection, &[br]);
                }
                Command::InsertLineBreak => {
                    let paragraph = dom.create_element("p");
                    dom.append_child(root, paragraph);
                    selection.caret = Some(Caret {
                        node: paragraph,
                        offset: 0,
                    });
                }
                Command::InsertHtml(html) => insert_html(dom, selection, html),
            }
            if link && auto_link(dom, root) > 0 {
                selection.collapse_to_end(dom, root);
            }
        });

        CommandOutcome {
            executed: true,
            new_word,
        }
    }

    /// Link urls typed so far. Returns how many links were made.
    pub fn auto_link_content(&mut self) -> usize {
        if !self.options.auto_link || self.placeholder_shown {
            return 0;
        }
        let mut surface = self.surface.borrow_mut();
        let mut links = 0;
        apply(&mut surface, |dom, root, selection| {
            links = auto_link(dom, root);
            if links > 0 {
                selection.collapse_to_end(dom, root);
            }
        });
        links
    }

    /// Go back to the content before the last command. Returns false if
    /// there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.step_history(true)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(false)
    }

    fn step_history(&mut self, backwards: bool) -> bool {
        let stack = if backwards {
            &self.undo_stack
        } else {
            &self.redo_stack
        };
        if stack.is_empty() || !self.is_loaded() {
            return false;
        }
        self.hide_placeholder();
        let current = self.surface.borrow().content_html().unwrap_or_default();
        let (from, to) = if backwards {
            (&mut self.undo_stack, &mut self.redo_stack)
        } else {
            (&mut self.redo_stack, &mut self.undo_stack)
        };
        let Some(target) = from.pop_back() else {
            return false;
        };
        push_bounded(to, current);
        replace_content(&mut self.surface.borrow_mut(), &target);
        true
    }

    fn remember_for_undo(&mut self) {
        if let Some(current) = self.surface.borrow().content_html() {
            push_bounded(&mut self.undo_stack, current);
            self.redo_stack.clear();
        }
    }

    pub fn history_len(&self) -> (usize, usize) {
        (self.undo_stack.len(), self.redo_stack.len())
    }

    /// True if the content has no text and nothing but structural elements.
    fn content_is_empty(&self) -> bool {
        let surface = self.surface.borrow();
        let Some(dom) = surface.document() else {
            return self.pending.as_deref().unwrap_or("").trim().is_empty();
        };
        let root = dom.root();
        dom.text_content(root).trim().is_empty()
            && dom.descendants(root).into_iter().all(|node| {
                dom.element(node).map_or(true, |e| {
                    STRUCTURAL_ELEMENTS.contains(&e.name.as_str())
                })
            })
    }
}

impl View for ComposerView {
    fn kind(&self) -> ViewKind {
        ViewKind::Composer
    }

    fn clear(&mut self) {
        self.hide_placeholder();
        let html = if self.options.use_line_breaks {
            ""
        } else {
            "<br>"
        };
        let mut surface = self.surface.borrow_mut();
        if surface.is_loaded() {
            replace_content(&mut surface, html);
        } else {
            self.pending = Some(html.to_owned());
        }
    }

    fn get_value(&self, parse: bool) -> Result<String, ParseError> {
        let surface = self.surface.borrow();
        let Some(dom) = surface.document() else {
            return Ok(self.pending.clone().unwrap_or_default());
        };
        if self.placeholder_shown {
            return Ok(String::new());
        }
        let html = dom.inner_html(dom.root());
        if parse {
            self.parse_context.parse_html(&html, dom)
        } else {
            Ok(html)
        }
    }

    fn set_value(&mut self, html: &str, parse: bool) -> Result<(), ParseError> {
        let html = if parse {
            let surface = self.surface.borrow();
            let detached = Dom::new();
            let context = surface.document().unwrap_or(&detached);
            self.parse_context.parse_html(html, context)?
        } else {
            html.to_owned()
        };
        self.hide_placeholder();
        let mut surface = self.surface.borrow_mut();
        if surface.is_loaded() {
            replace_content(&mut surface, &html);
        } else {
            self.pending = Some(html);
        }
        Ok(())
    }

    fn focus(&mut self, to_end: bool) {
        self.hide_placeholder();
        let mut surface = self.surface.borrow_mut();
        surface.set_focused(true);
        if to_end {
            apply(&mut surface, |dom, root, selection| {
                selection.collapse_to_end(dom, root)
            });
        }
    }

    fn enable(&mut self) {
        self.surface.borrow_mut().set_editable(true);
    }

    fn disable(&mut self) {
        self.surface.borrow_mut().set_editable(false);
    }

    fn is_empty(&self) -> bool {
        self.placeholder_shown || self.content_is_empty()
    }

    fn has_placeholder_set(&self) -> bool {
        self.placeholder_shown
    }

    fn set_focused(&mut self, focused: bool) {
        if focused {
            self.hide_placeholder();
            self.surface.borrow_mut().set_focused(true);
        } else {
            self.surface.borrow_mut().set_focused(false);
            self.show_placeholder();
        }
    }

    fn insert_pasted(&mut self, html: &str) {
        if !self.is_loaded() {
            return;
        }
        self.hide_placeholder();
        self.remember_for_undo();
        apply(&mut self.surface.borrow_mut(), |dom, _, selection| {
            insert_html(dom, selection, html)
        });
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.surface.borrow_mut().set_hidden(hidden);
    }
}

fn push_bounded(stack: &mut VecDeque<String>, snapshot: String) {
    stack.push_back(snapshot);
    while stack.len() > MAX_HISTORY_ENTRIES {
        stack.pop_front();
    }
}

/// Run `f` with the content and the selection of a loaded surface.
fn apply(
    surface: &mut Surface,
    f: impl FnOnce(&mut Dom, NodeHandle, &mut Selection),
) {
    let mut selection = std::mem::take(&mut surface.selection);
    if let Some(dom) = surface.document_mut() {
        let root = dom.root();
        if !selection.is_within(dom, root) {
            selection.collapse_to_end(dom, root);
        }
        f(dom, root, &mut selection);
    }
    surface.selection = selection;
}

fn replace_content(surface: &mut Surface, html: &str) {
    apply(surface, |dom, root, selection| {
        dom.set_inner_html(root, html);
        selection.collapse_to_end(dom, root);
    });
}

fn insert_text(dom: &mut Dom, selection: &mut Selection, text: &str) {
    let Some(caret) = selection.caret else {
        return;
    };
    if let Some(content) = dom.text_mut(caret.node) {
        let at = byte_index(content, caret.offset);
        content.insert_str(at, text);
        selection.caret = Some(Caret {
            node: caret.node,
            offset: caret.offset + text.chars().count(),
        });
        return;
    }

    // Typing right after a text node extends it.
    if let Some(previous) = caret
        .offset
        .checked_sub(1)
        .and_then(|i| dom.children(caret.node).get(i).copied())
    {
        if let Some(content) = dom.text_mut(previous) {
            content.push_str(text);
            let offset = content.chars().count();
            selection.caret = Some(Caret {
                node: previous,
                offset,
            });
            return;
        }
    }

    let node = dom.create_text(text);
    dom.insert_child(caret.node, caret.offset, node);
    selection.caret = Some(Caret {
        node,
        offset: text.chars().count(),
    });
}

fn insert_html(dom: &mut Dom, selection: &mut Selection, html: &str) {
    let fragment = parse_fragment(html);
    let nodes: Vec<NodeHandle> = fragment
        .children(fragment.root())
        .iter()
        .filter_map(|child| dom.import(&fragment, *child))
        .collect();
    insert_nodes(dom, selection, &nodes);
}

/// Insert `nodes` at the caret, splitting a text node if the caret is
/// inside one, and put the caret after them.
fn insert_nodes(dom: &mut Dom, selection: &mut Selection, nodes: &[NodeHandle]) {
    let Some(caret) = selection.caret else {
        return;
    };
    let (parent, mut index) = match dom.text(caret.node).map(str::to_owned) {
        Some(content) => {
            let (Some(parent), Some(position)) =
                (dom.parent(caret.node), dom.index_in_parent(caret.node))
            else {
                return;
            };
            let at = byte_index(&content, caret.offset);
            if at < content.len() {
                let tail = dom.create_text(&content[at..]);
                dom.insert_child(parent, position + 1, tail);
                if let Some(head) = dom.text_mut(caret.node) {
                    head.truncate(at);
                }
            }
            (parent, position + 1)
        }
        None => (caret.node, caret.offset),
    };
    for node in nodes {
        dom.insert_child(parent, index, *node);
        index += 1;
    }
    selection.caret = Some(Caret {
        node: parent,
        offset: index,
    });
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}
