// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Growing and shrinking the composer with its content.
//!
//! Setup waits [SETUP_DELAY] after the controller is created, since the
//! sandbox may not be reachable yet. From then on every event in
//! [RESIZE_EVENTS] and every raw event in [RESIZE_DOM_EVENTS] measures the
//! content root and writes the result as the iframe's height. Each trigger
//! measures once; nothing is debounced.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::events::{EventName, ListenerId};
use crate::measure::HeightMeasurer;
use crate::surface::{
    DomEventKind, RawListenerId, Surface, SurfaceHandle, WeakSurface,
};
use crate::Editor;

pub const SETUP_DELAY: Duration = Duration::from_millis(200);

pub const RESIZE_EVENTS: [EventName; 8] = [
    EventName::AfterCommandComposer,
    EventName::ChangeView,
    EventName::NewWordComposer,
    EventName::UndoComposer,
    EventName::Paste,
    EventName::Focus,
    EventName::Blur,
    EventName::Load,
];

/// Raw events listened to as well, for typing that produces no editor
/// event.
pub const RESIZE_DOM_EVENTS: [DomEventKind; 5] = [
    DomEventKind::KeyUp,
    DomEventKind::KeyDown,
    DomEventKind::KeyPress,
    DomEventKind::Blur,
    DomEventKind::Focus,
];

/// One resize. Cheap to clone into listeners; it does not keep the surface
/// alive.
#[derive(Clone)]
pub struct Resizer {
    surface: WeakSurface,
    measurer: HeightMeasurer,
    normalized: Rc<Cell<bool>>,
}

impl Resizer {
    /// Measure the content and apply the height, returning it. None if the
    /// surface is gone, busy or not loaded; the next trigger tries again.
    pub fn resize(&self) -> Option<u32> {
        let Some(handle) = self.surface.upgrade() else {
            log::debug!("Skipping resize: the surface is gone");
            return None;
        };
        let Some(mut surface) = handle.try_borrow_mut() else {
            log::debug!("Skipping resize: the surface is busy");
            return None;
        };
        if !surface.is_loaded() {
            log::debug!("Skipping resize: the surface is not loaded");
            return None;
        }
        if !self.normalized.get() {
            normalize_styles(&mut surface);
            self.normalized.set(true);
        }
        let height = surface.measure_content(&self.measurer)?;
        surface.iframe_style.set("height", &format!("{height}px"));
        log::trace!("Resized the composer to {height}px");
        Some(height)
    }
}

/// Let the document fill the iframe without scrolling, and keep the
/// wrapper from limiting the iframe's height.
fn normalize_styles(surface: &mut Surface) {
    surface.html_style.set("height", "100%");
    surface.html_style.set("width", "100%");
    surface.html_style.set("overflow", "hidden");
    surface.body_style.set("height", "auto");
    surface.body_style.set("line-height", "20px");
    surface.body_style.set("width", "100%");
    surface.iframe_style.set("height", "100%");
    surface.wrapper_style.set("height", "100%");
}

pub struct AutoResizeController {
    resizer: Resizer,
    listener_ids: Vec<ListenerId>,
    raw_listener_ids: Vec<RawListenerId>,
    set_up: bool,
}

impl AutoResizeController {
    pub fn new(surface: &SurfaceHandle, measurer: HeightMeasurer) -> Self {
        Self {
            resizer: Resizer {
                surface: surface.downgrade(),
                measurer,
                normalized: Rc::new(Cell::new(false)),
            },
            listener_ids: Vec::new(),
            raw_listener_ids: Vec::new(),
            set_up: false,
        }
    }

    /// Give `editor` a controller for `surface`, set up after
    /// [SETUP_DELAY].
    pub fn install(editor: &mut Editor, surface: &SurfaceHandle) {
        editor.auto_resize =
            Some(Self::new(surface, HeightMeasurer::default()));
        editor.schedule(SETUP_DELAY, "auto-resize setup", Self::setup);
    }

    /// Subscribe to the resize triggers and resize once.
    pub fn setup(editor: &mut Editor) {
        let resizer = match editor.auto_resize.as_ref() {
            Some(controller) if !controller.set_up => controller.resizer.clone(),
            _ => return,
        };

        let listener_ids: Vec<ListenerId> = RESIZE_EVENTS
            .into_iter()
            .map(|name| {
                let resizer = resizer.clone();
                editor.on(name, move |_, _| {
                    resizer.resize();
                })
            })
            .collect();

        let mut raw_listener_ids = Vec::new();
        if let Some(handle) = resizer.surface.upgrade() {
            let mut surface = handle.borrow_mut();
            for kind in RESIZE_DOM_EVENTS {
                let resizer = resizer.clone();
                raw_listener_ids.push(surface.add_listener(kind, move |_| {
                    resizer.resize();
                }));
            }
        }

        if let Some(controller) = editor.auto_resize.as_mut() {
            controller.listener_ids = listener_ids;
            controller.raw_listener_ids = raw_listener_ids;
            controller.set_up = true;
        }
        log::debug!("Auto-resize set up");
        resizer.resize();
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    pub fn listener_ids(&self) -> &[ListenerId] {
        &self.listener_ids
    }

    pub fn resize(&self) -> Option<u32> {
        self.resizer.resize()
    }

    /// Remove every subscription the controller made.
    pub fn detach(self, editor: &mut Editor) {
        for id in self.listener_ids {
            editor.off(id);
        }
        if let Some(handle) = self.resizer.surface.upgrade() {
            let mut surface = handle.borrow_mut();
            for id in self.raw_listener_ids {
                surface.remove_listener(id);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use speculoos::prelude::*;

    use super::*;
    use crate::layout::BlockLayout;
    use crate::measure::BASE_OFFSET;
    use crate::surface::{DomEvent, Key};
    use crate::tests::testutils::{iframe_height, loaded_editor, ready_editor};
    use crate::views::{Command, ViewKind};
    use crate::ConfigOverrides;

    fn surface_with(html: Option<&str>) -> SurfaceHandle {
        let handle =
            SurfaceHandle::new(Surface::new(Vec::new(), BlockLayout::default()));
        if let Some(html) = html {
            handle.borrow_mut().attach(html);
        }
        handle
    }

    #[test]
    fn resize_writes_the_measured_height_to_the_iframe() {
        let handle = surface_with(Some("a<br>b"));
        let controller =
            AutoResizeController::new(&handle, HeightMeasurer::default());

        assert_eq!(controller.resize(), Some(BASE_OFFSET + 40));

        let surface = handle.borrow();
        assert_eq!(surface.iframe_style.get("height"), Some("60px"));
        assert_eq!(surface.wrapper_style.get("height"), Some("100%"));
        assert_eq!(surface.html_style.get("overflow"), Some("hidden"));
        assert_eq!(surface.body_style.get("line-height"), Some("20px"));
    }

    #[test]
    fn unreachable_surfaces_are_skipped() {
        let handle = surface_with(None);
        let controller =
            AutoResizeController::new(&handle, HeightMeasurer::default());
        assert_eq!(controller.resize(), None);
        assert!(handle.borrow().iframe_style.is_empty());

        handle.borrow_mut().attach("x");
        {
            let _busy = handle.borrow_mut();
            assert_eq!(controller.resize(), None);
        }
        assert!(controller.resize().is_some());

        drop(handle);
        assert_eq!(controller.resize(), None);
    }

    #[test]
    fn normalization_waits_for_a_loaded_surface() {
        let handle = surface_with(None);
        let controller =
            AutoResizeController::new(&handle, HeightMeasurer::default());
        controller.resize();
        assert!(handle.borrow().html_style.is_empty());

        handle.borrow_mut().attach("");
        controller.resize();
        assert_eq!(handle.borrow().html_style.get("height"), Some("100%"));
    }

    #[test]
    fn setup_happens_after_the_delay() {
        let (_page, mut editor) = loaded_editor("x", ConfigOverrides::default());
        assert!(!editor.auto_resize().unwrap().is_set_up());
        assert_eq!(iframe_height(&editor), None);

        editor.advance(SETUP_DELAY - Duration::from_millis(1));
        assert!(!editor.auto_resize().unwrap().is_set_up());

        editor.advance(Duration::from_millis(1));
        let controller = editor.auto_resize().unwrap();
        assert!(controller.is_set_up());
        assert_eq!(controller.listener_ids().len(), RESIZE_EVENTS.len());
        assert_eq!(iframe_height(&editor), Some(BASE_OFFSET + 20));
        let surface = editor.surface().unwrap();
        assert_eq!(surface.borrow().listener_count(DomEventKind::KeyUp), 1);
    }

    #[test]
    fn raw_key_events_resize() {
        let (_page, editor) = ready_editor("", ConfigOverrides::default());
        let surface = editor.surface().unwrap();
        {
            let mut surface = surface.borrow_mut();
            let dom = surface.document_mut().unwrap();
            let root = dom.root();
            dom.set_inner_html(root, "a<br>b<br>c");
        }
        assert_eq!(iframe_height(&editor), Some(BASE_OFFSET));

        surface.dispatch_event(&DomEvent::KeyDown(Key::Char('c')));

        assert_eq!(iframe_height(&editor), Some(BASE_OFFSET + 60));
    }

    #[test]
    fn editor_events_resize() {
        let (_page, mut editor) = ready_editor("", ConfigOverrides::default());
        editor.exec_command(Command::InsertHtml(String::from("<p>a</p>")));
        assert_eq!(iframe_height(&editor), Some(BASE_OFFSET + 20));

        editor.undo();
        assert_eq!(iframe_height(&editor), Some(BASE_OFFSET));

        editor.dispatch_dom_event(
            ViewKind::Composer,
            DomEvent::Paste(String::from("<div>x</div><div>y</div>")),
        );
        assert_that!(iframe_height(&editor)).is_equal_to(Some(BASE_OFFSET + 40));
    }

    #[test]
    fn no_controller_when_auto_resize_is_off() {
        let overrides = ConfigOverrides {
            auto_resize: Some(false),
            ..Default::default()
        };
        let (_page, editor) = ready_editor("x", overrides);
        assert!(editor.auto_resize().is_none());
        assert_eq!(iframe_height(&editor), None);
    }

    #[test]
    fn detaching_removes_every_subscription() {
        let (_page, mut editor) = ready_editor("", ConfigOverrides::default());
        let before = editor.listener_count(EventName::Load);
        editor.destroy();
        assert_eq!(editor.listener_count(EventName::Load), before - 1);
        let surface = editor.surface().unwrap();
        for kind in RESIZE_DOM_EVENTS {
            assert_eq!(surface.borrow().listener_count(kind), 0);
        }
    }
}
