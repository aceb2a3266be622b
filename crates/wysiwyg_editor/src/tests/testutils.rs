// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

#![cfg(test)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::auto_resize::SETUP_DELAY;
use crate::events::EventName;
use crate::platform::{Page, SimulatedBrowser, TextareaElement};
use crate::{ConfigOverrides, Editor};

pub fn page(supported: bool, touch_device: bool) -> Page {
    Page::new(Rc::new(SimulatedBrowser::new(supported, touch_device)))
}

/// An editor over textarea `t` holding `value`, with its sandbox loaded but
/// nothing else run yet.
pub fn loaded_editor(value: &str, overrides: ConfigOverrides) -> (Page, Editor) {
    let page = page(true, false);
    page.register_textarea(TextareaElement::new("t").with_value(value));
    let mut editor = Editor::new(&page, "t", overrides).unwrap();
    editor.advance(Duration::ZERO);
    (page, editor)
}

/// Like [loaded_editor], with every startup task run.
pub fn ready_editor(value: &str, overrides: ConfigOverrides) -> (Page, Editor) {
    let (page, mut editor) = loaded_editor(value, overrides);
    editor.advance(SETUP_DELAY);
    (page, editor)
}

pub fn composer_html(editor: &Editor) -> String {
    editor
        .surface()
        .and_then(|surface| surface.borrow().content_html())
        .unwrap_or_default()
}

pub fn iframe_height(editor: &Editor) -> Option<u32> {
    let surface = editor.surface()?;
    let surface = surface.borrow();
    surface
        .iframe_style
        .get("height")?
        .strip_suffix("px")?
        .parse()
        .ok()
}

/// Collect the wire names of `names` as they fire on `editor`.
pub fn record(
    editor: &mut Editor,
    names: &[EventName],
) -> Rc<RefCell<Vec<String>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    for name in names {
        let events = Rc::clone(&events);
        editor.on(*name, move |_, event| {
            events.borrow_mut().push(event.name.to_string());
        });
    }
    events
}

pub fn recorded(events: &Rc<RefCell<Vec<String>>>) -> Vec<String> {
    events.borrow().clone()
}
