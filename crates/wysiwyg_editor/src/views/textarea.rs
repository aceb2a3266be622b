// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::dom::Dom;
use crate::platform::TextareaHandle;
use crate::sanitize::ParseContext;
use crate::views::{View, ViewKind};
use crate::ParseError;

/// The original textarea, showing the content as source.
pub struct TextareaView {
    element: TextareaHandle,
    parse_context: ParseContext,
}

impl TextareaView {
    pub fn new(element: TextareaHandle, parse_context: ParseContext) -> Self {
        Self {
            element,
            parse_context,
        }
    }

    pub fn element(&self) -> &TextareaHandle {
        &self.element
    }

    fn parse(&self, html: &str) -> Result<String, ParseError> {
        self.parse_context.parse_html(html, &Dom::new())
    }
}

impl View for TextareaView {
    fn kind(&self) -> ViewKind {
        ViewKind::Textarea
    }

    fn clear(&mut self) {
        self.element.borrow_mut().value.clear();
    }

    fn get_value(&self, parse: bool) -> Result<String, ParseError> {
        let value = self.element.borrow().value.clone();
        if parse {
            self.parse(&value)
        } else {
            Ok(value)
        }
    }

    fn set_value(&mut self, html: &str, parse: bool) -> Result<(), ParseError> {
        let value = if parse {
            self.parse(html)?
        } else {
            html.to_owned()
        };
        self.element.borrow_mut().value = value;
        Ok(())
    }

    fn focus(&mut self, _to_end: bool) {
        self.element.borrow_mut().focused = true;
    }

    fn enable(&mut self) {
        self.element.borrow_mut().disabled = false;
    }

    fn disable(&mut self) {
        self.element.borrow_mut().disabled = true;
    }

    fn is_empty(&self) -> bool {
        self.element.borrow().value.trim().is_empty()
            || self.has_placeholder_set()
    }

    fn has_placeholder_set(&self) -> bool {
        let element = self.element.borrow();
        match &element.placeholder {
            Some(placeholder) => {
                element.value.is_empty() || element.value == *placeholder
            }
            None => false,
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.element.borrow_mut().focused = focused;
    }

    fn insert_pasted(&mut self, html: &str) {
        self.element.borrow_mut().value.push_str(html);
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.element.borrow_mut().hidden = hidden;
    }
}
