// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The composer's sandbox: an iframe inside a wrapper, holding its own
//! document whose `body` is the content root being edited.
//!
//! The sandbox is shared between the composer view, the auto-resize
//! controller and listener closures, so it lives behind a [SurfaceHandle].
//! Closures that outlive the editor hold a [WeakSurface] instead.

mod selection;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use strum_macros::{AsRefStr, Display, EnumString};

use crate::dom::{Dom, NodeHandle};
use crate::layout::BlockLayout;
use crate::measure::HeightMeasurer;

pub use selection::{Caret, Selection};

const REDRAW_CLASS: &str = "wysihtml5-quirks-redraw";

/// Inline style declarations, in the order they were first set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    properties: Vec<(String, String)>,
}

impl Style {
    pub fn set(&mut self, property: &str, value: &str) {
        match self.properties.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = value.to_owned(),
            None => self
                .properties
                .push((property.to_owned(), value.to_owned())),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, property: &str) {
        self.properties.retain(|(p, _)| p != property);
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declarations: Vec<String> = self
            .properties
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect();
        write!(f, "{}", declarations.join("; "))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    Tab,
    Backspace,
    Delete,
    Other(String),
}

impl Key {
    /// Keys that finish a word.
    pub fn is_word_separator(&self) -> bool {
        matches!(self, Self::Space | Self::Enter | Self::Tab)
    }
}

/// A raw DOM event as the host saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomEvent {
    KeyDown(Key),
    KeyUp(Key),
    KeyPress(Key),
    Focus,
    Blur,
    /// Pasted HTML.
    Paste(String),
    /// Dropped HTML.
    Drop(String),
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum DomEventKind {
    KeyDown,
    KeyUp,
    KeyPress,
    Focus,
    Blur,
    Paste,
    Drop,
}

impl DomEvent {
    pub fn kind(&self) -> DomEventKind {
        match self {
            Self::KeyDown(_) => DomEventKind::KeyDown,
            Self::KeyUp(_) => DomEventKind::KeyUp,
            Self::KeyPress(_) => DomEventKind::KeyPress,
            Self::Focus => DomEventKind::Focus,
            Self::Blur => DomEventKind::Blur,
            Self::Paste(_) => DomEventKind::Paste,
            Self::Drop(_) => DomEventKind::Drop,
        }
    }
}

pub type RawListener = Rc<dyn Fn(&DomEvent)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawListenerId(u64);

struct RawRegistration {
    id: RawListenerId,
    kind: DomEventKind,
    listener: RawListener,
}

pub struct Surface {
    document: Option<Dom>,
    /// Style of the sandbox document's `html` element.
    pub html_style: Style,
    /// Style of the content root.
    pub body_style: Style,
    /// Style of the iframe, i.e. the visible editing surface.
    pub iframe_style: Style,
    /// Style of the element wrapping the iframe.
    pub wrapper_style: Style,
    pub layout: BlockLayout,
    pub stylesheets: Vec<String>,
    class_names: Vec<String>,
    editable: bool,
    focused: bool,
    hidden: bool,
    pub(crate) selection: Selection,
    redraws: u32,
    next_listener: u64,
    raw_listeners: Vec<RawRegistration>,
}

impl Surface {
    /// An unloaded sandbox whose content root will carry `class_names`.
    pub fn new(class_names: Vec<String>, layout: BlockLayout) -> Self {
        Self {
            document: None,
            html_style: Style::default(),
            body_style: Style::default(),
            iframe_style: Style::default(),
            wrapper_style: Style::default(),
            layout,
            stylesheets: Vec::new(),
            class_names,
            editable: false,
            focused: false,
            hidden: false,
            selection: Selection::default(),
            redraws: 0,
            next_listener: 0,
            raw_listeners: Vec::new(),
        }
    }

    /// Load the sandbox document with `html` as its content. The content
    /// becomes editable and the caret is placed at its end.
    pub fn attach(&mut self, html: &str) {
        let mut dom = Dom::new();
        let root = dom.root();
        if let Some(body) = dom.element_mut(root) {
            for class in &self.class_names {
                body.add_class(class);
            }
        }
        dom.set_inner_html(root, html);
        self.selection.collapse_to_end(&dom, root);
        self.document = Some(dom);
        self.editable = true;
    }

    /// Unload the sandbox document.
    pub fn detach(&mut self) {
        self.document = None;
        self.editable = false;
        self.focused = false;
        self.selection = Selection::default();
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Dom> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut Dom> {
        self.document.as_mut()
    }

    pub fn content_root(&self) -> Option<NodeHandle> {
        self.document.as_ref().map(Dom::root)
    }

    /// Inner HTML of the content root, None while unloaded.
    pub fn content_html(&self) -> Option<String> {
        let dom = self.document.as_ref()?;
        Some(dom.inner_html(dom.root()))
    }

    /// Height of the content root as measured by `measurer`.
    pub fn measure_content(&mut self, measurer: &HeightMeasurer) -> Option<u32> {
        let dom = self.document.as_mut()?;
        let root = dom.root();
        Some(measurer.measure(dom, root, &self.layout))
    }

    /// Force the content to be re-laid out, for engines that do not notice
    /// content changes made while the sandbox is hidden.
    pub fn request_redraw(&mut self) {
        if let Some(dom) = self.document.as_mut() {
            let root = dom.root();
            if let Some(body) = dom.element_mut(root) {
                body.add_class(REDRAW_CLASS);
                body.remove_class(REDRAW_CLASS);
            }
        }
        self.redraws += 1;
    }

    pub fn redraw_count(&self) -> u32 {
        self.redraws
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable && self.is_loaded();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn add_listener(
        &mut self,
        kind: DomEventKind,
        listener: impl Fn(&DomEvent) + 'static,
    ) -> RawListenerId {
        let id = RawListenerId(self.next_listener);
        self.next_listener += 1;
        self.raw_listeners.push(RawRegistration {
            id,
            kind,
            listener: Rc::new(listener),
        });
        id
    }

    pub fn remove_listener(&mut self, id: RawListenerId) -> bool {
        let before = self.raw_listeners.len();
        self.raw_listeners.retain(|r| r.id != id);
        self.raw_listeners.len() != before
    }

    pub fn listener_count(&self, kind: DomEventKind) -> usize {
        self.raw_listeners.iter().filter(|r| r.kind == kind).count()
    }

    fn listeners_for(&self, kind: DomEventKind) -> Vec<RawListener> {
        self.raw_listeners
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.listener.clone())
            .collect()
    }
}

/// Shared ownership of a [Surface].
#[derive(Clone)]
pub struct SurfaceHandle(Rc<RefCell<Surface>>);

impl SurfaceHandle {
    pub fn new(surface: Surface) -> Self {
        Self(Rc::new(RefCell::new(surface)))
    }

    pub fn borrow(&self) -> Ref<'_, Surface> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Surface> {
        self.0.borrow_mut()
    }

    /// None if the surface is already borrowed, i.e. when called from
    /// inside an operation on it.
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, Surface>> {
        self.0.try_borrow_mut().ok()
    }

    pub fn downgrade(&self) -> WeakSurface {
        WeakSurface(Rc::downgrade(&self.0))
    }

    /// Deliver `event` to the surface's raw listeners. The surface is not
    /// borrowed while they run, so they may use it.
    pub fn dispatch_event(&self, event: &DomEvent) {
        let listeners = self.0.borrow().listeners_for(event.kind());
        for listener in listeners {
            listener(event);
        }
    }
}

#[derive(Clone, Default)]
pub struct WeakSurface(Weak<RefCell<Surface>>);

impl WeakSurface {
    pub fn upgrade(&self) -> Option<SurfaceHandle> {
        self.0.upgrade().map(SurfaceHandle)
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::str::FromStr;

    use super::*;

    fn surface() -> Surface {
        Surface::new(
            vec![String::from("wysihtml5-editor")],
            BlockLayout::default(),
        )
    }

    #[test]
    fn styles_keep_their_order_and_overwrite_in_place() {
        let mut style = Style::default();
        style.set("height", "100%");
        style.set("overflow", "hidden");
        style.set("height", "40px");
        assert_eq!(style.to_string(), "height: 40px; overflow: hidden");
        style.remove("height");
        assert_eq!(style.get("height"), None);
        assert_eq!(style.get("overflow"), Some("hidden"));
    }

    #[test]
    fn attaching_loads_an_editable_classed_document() {
        let mut surface = surface();
        assert!(!surface.is_loaded());
        assert_eq!(surface.content_html(), None);

        surface.attach("a<br>b");

        assert!(surface.is_loaded());
        assert!(surface.is_editable());
        assert_eq!(surface.content_html().as_deref(), Some("a<br>b"));
        let dom = surface.document().unwrap();
        assert!(dom.element(dom.root()).unwrap().has_class("wysihtml5-editor"));
    }

    #[test]
    fn detaching_unloads() {
        let mut surface = surface();
        surface.attach("x");
        surface.detach();
        assert!(!surface.is_loaded());
        assert!(!surface.is_editable());
        surface.set_editable(true);
        assert!(!surface.is_editable());
        assert_eq!(surface.measure_content(&HeightMeasurer::default()), None);
    }

    #[test]
    fn redraw_leaves_no_class_behind() {
        let mut surface = surface();
        surface.attach("x");
        surface.request_redraw();
        assert_eq!(surface.redraw_count(), 1);
        let dom = surface.document().unwrap();
        assert!(!dom.element(dom.root()).unwrap().has_class(REDRAW_CLASS));
    }

    #[test]
    fn raw_listeners_get_matching_events_and_may_borrow_the_surface() {
        let handle = SurfaceHandle::new(surface());
        handle.borrow_mut().attach("");
        let weak = handle.downgrade();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let id = handle.borrow_mut().add_listener(DomEventKind::KeyUp, move |_| {
            if let Some(surface) = weak.upgrade() {
                surface.borrow_mut().set_focused(true);
            }
            counter.set(counter.get() + 1);
        });

        handle.dispatch_event(&DomEvent::KeyUp(Key::Char('a')));
        handle.dispatch_event(&DomEvent::KeyDown(Key::Char('a')));
        assert_eq!(calls.get(), 1);
        assert!(handle.borrow().is_focused());

        assert!(handle.borrow_mut().remove_listener(id));
        handle.dispatch_event(&DomEvent::KeyUp(Key::Char('a')));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn weak_handles_do_not_keep_the_surface_alive() {
        let handle = SurfaceHandle::new(surface());
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some());
        drop(handle);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn event_kinds_use_dom_names() {
        assert_eq!(DomEventKind::KeyUp.to_string(), "keyup");
        assert_eq!(DomEventKind::from_str("keypress"), Ok(DomEventKind::KeyPress));
        assert_eq!(DomEvent::Paste(String::new()).kind(), DomEventKind::Paste);
        assert!(Key::Space.is_word_separator());
        assert!(!Key::Char('a').is_word_separator());
    }
}
