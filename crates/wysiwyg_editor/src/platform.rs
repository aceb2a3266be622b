// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The page an editor lives on: the browser capabilities, the body's class
//! list and the textareas that can be turned into editors.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The two questions the editor asks about its platform.
pub trait Browser {
    /// Whether a rich composer can run at all.
    fn supported(&self) -> bool;
    fn is_touch_device(&self) -> bool;
}

/// A [Browser] whose answers are set by the host (or a test). Changing them
/// after an editor was created does not affect that editor.
#[derive(Debug, Default)]
pub struct SimulatedBrowser {
    supported: Cell<bool>,
    touch_device: Cell<bool>,
}

impl SimulatedBrowser {
    pub fn new(supported: bool, touch_device: bool) -> Self {
        Self {
            supported: Cell::new(supported),
            touch_device: Cell::new(touch_device),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.set(supported);
    }

    pub fn set_touch_device(&self, touch_device: bool) {
        self.touch_device.set(touch_device);
    }
}

impl Browser for SimulatedBrowser {
    fn supported(&self) -> bool {
        self.supported.get()
    }

    fn is_touch_device(&self) -> bool {
        self.touch_device.get()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextareaElement {
    pub id: String,
    pub value: String,
    pub placeholder: Option<String>,
    pub disabled: bool,
    pub hidden: bool,
    pub focused: bool,
}

impl TextareaElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_owned();
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_owned());
        self
    }
}

pub type TextareaHandle = Rc<RefCell<TextareaElement>>;

/// How a caller points an editor at its textarea.
#[derive(Clone, Debug)]
pub enum TextareaSource {
    Id(String),
    Element(TextareaHandle),
}

impl From<&str> for TextareaSource {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for TextareaSource {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<TextareaHandle> for TextareaSource {
    fn from(element: TextareaHandle) -> Self {
        Self::Element(element)
    }
}

pub struct Page {
    browser: Rc<dyn Browser>,
    body_classes: RefCell<Vec<String>>,
    textareas: RefCell<Vec<TextareaHandle>>,
}

impl Page {
    pub fn new(browser: Rc<dyn Browser>) -> Self {
        Self {
            browser,
            body_classes: RefCell::new(Vec::new()),
            textareas: RefCell::new(Vec::new()),
        }
    }

    pub fn browser(&self) -> Rc<dyn Browser> {
        self.browser.clone()
    }

    /// Add `class` to the body unless it is already there. Returns whether
    /// it was added.
    pub fn add_body_class(&self, class: &str) -> bool {
        let mut classes = self.body_classes.borrow_mut();
        if classes.iter().any(|c| c == class) {
            return false;
        }
        classes.push(class.to_owned());
        true
    }

    pub fn body_has_class(&self, class: &str) -> bool {
        self.body_classes.borrow().iter().any(|c| c == class)
    }

    pub fn body_classes(&self) -> Vec<String> {
        self.body_classes.borrow().clone()
    }

    pub fn register_textarea(&self, element: TextareaElement) -> TextareaHandle {
        let handle = Rc::new(RefCell::new(element));
        self.textareas.borrow_mut().push(handle.clone());
        handle
    }

    pub fn element_by_id(&self, id: &str) -> Option<TextareaHandle> {
        self.textareas
            .borrow()
            .iter()
            .find(|t| t.borrow().id == id)
            .cloned()
    }
}
