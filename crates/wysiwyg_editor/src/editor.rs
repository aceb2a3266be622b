// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The editor: one per textarea.
//!
//! On construction it decides, once, whether the rich composer can be used.
//! If not, the textarea stays the only view and `beforeload`/`load` are
//! fired on the first advance of the scheduler. Otherwise the composer is
//! created and made current, and its sandbox loads on the first advance.
//! Either way callers see the same events and the same content API.

use std::time::Duration;

use strum_macros::Display;

use crate::auto_resize::AutoResizeController;
use crate::dom::Dom;
use crate::events::{
    self, Dispatch, Dispatcher, Event, EventName, EventPayload, ListenerId,
};
use crate::layout::BlockLayout;
use crate::platform::{Page, TextareaSource};
use crate::sanitize::{clean_pasted_html, ParseContext};
use crate::scheduler::{run_due, Scheduler};
use crate::surface::{DomEvent, Surface, SurfaceHandle};
use crate::toolbar::Toolbar;
use crate::views::{
    Command, ComposerOptions, ComposerView, Synchronizer, TextareaView, View,
    ViewKind,
};
use crate::{Config, ConfigOverrides, EditorError, ParseError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum LifecyclePhase {
    Start,
    /// The textarea is the only view.
    Fallback,
    /// The composer exists but its sandbox has not loaded yet.
    Initializing,
    /// `load` has fired.
    Ready,
}

/// What [Editor::parse] should sanitize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseTarget<'a> {
    Html(&'a str),
    /// The composer's live content, sanitized in place.
    ContentRoot,
}

pub struct Editor {
    config: Config,
    compatible: bool,
    phase: LifecyclePhase,
    destroyed: bool,
    current_view: ViewKind,
    textarea: TextareaView,
    composer: Option<ComposerView>,
    synchronizer: Option<Synchronizer>,
    toolbar: Option<Toolbar>,
    pub(crate) auto_resize: Option<AutoResizeController>,
    parse_context: ParseContext,
    dispatcher: Dispatcher<Editor>,
    scheduler: Scheduler<Editor>,
    value_on_focus: Option<String>,
}

impl Dispatch for Editor {
    fn dispatcher(&mut self) -> &mut Dispatcher<Self> {
        &mut self.dispatcher
    }
}

impl Editor {
    pub fn new(
        page: &Page,
        textarea: impl Into<TextareaSource>,
        overrides: ConfigOverrides,
    ) -> Result<Self, EditorError> {
        let element = match textarea.into() {
            TextareaSource::Id(id) => page
                .element_by_id(&id)
                .ok_or(EditorError::ElementNotFound(id))?,
            TextareaSource::Element(element) => element,
        };
        let placeholder = element.borrow().placeholder.clone();
        let config = Config::merged(overrides, placeholder.as_deref());
        let parse_context = ParseContext::from_config(&config);
        let browser = page.browser();
        let compatible = browser.supported();

        let mut editor = Self {
            textarea: TextareaView::new(element, parse_context.clone()),
            config,
            compatible,
            phase: LifecyclePhase::Start,
            destroyed: false,
            current_view: ViewKind::Textarea,
            composer: None,
            synchronizer: None,
            toolbar: None,
            auto_resize: None,
            parse_context,
            dispatcher: Dispatcher::new(),
            scheduler: Scheduler::new(),
            value_on_focus: None,
        };

        let touch_disallowed = browser.is_touch_device()
            && !editor.config.support_touch_devices;
        if !compatible || touch_disallowed {
            editor.start_fallback();
        } else {
            editor.start_composer(page);
        }
        Ok(editor)
    }

    fn start_fallback(&mut self) {
        log::debug!("Rich composer unavailable, keeping the textarea");
        self.phase = LifecyclePhase::Fallback;
        self.schedule(Duration::ZERO, "fire load", |editor| {
            editor.fire(EventName::BeforeLoad);
            editor.phase = LifecyclePhase::Ready;
            editor.fire(EventName::Load);
        });
    }

    fn start_composer(&mut self, page: &Page) {
        log::debug!("Creating the rich composer");
        self.phase = LifecyclePhase::Initializing;
        page.add_body_class(&self.config.body_class_name);

        let mut class_names = vec![self.config.composer_class_name.clone()];
        class_names.extend(self.config.name.clone());
        let mut surface = Surface::new(class_names, BlockLayout::default());
        surface.stylesheets = self.config.stylesheets.clone();
        let surface = SurfaceHandle::new(surface);

        self.composer = Some(ComposerView::new(
            surface.clone(),
            self.parse_context.clone(),
            ComposerOptions::from_config(&self.config),
        ));
        self.current_view = ViewKind::Composer;
        self.textarea.set_hidden(true);

        self.on(EventName::UnsetPlaceholder, |editor, _| {
            if let Some(composer) = editor.composer.as_mut() {
                composer.hide_placeholder();
            }
        });
        if self.parse_context.has_parser() {
            self.on(EventName::PasteComposer, |editor, _| {
                editor.sanitize_pasted();
            });
        }
        if self.config.auto_resize {
            AutoResizeController::install(self, &surface);
        }
        self.once(EventName::BeforeLoad, |editor, _| {
            editor.synchronizer = Some(Synchronizer::install(editor));
            if let Some(id) = editor.config.toolbar.as_deref() {
                editor.toolbar = Some(Toolbar::new(id));
            }
        });
        self.schedule(Duration::ZERO, "load composer", Self::load_composer);
    }

    fn load_composer(&mut self) {
        let value = self.textarea.get_value(false).unwrap_or_default();
        if let Some(composer) = self.composer.as_mut() {
            composer.attach(&value);
        }
        log::debug!("Composer sandbox loaded");
        self.fire(EventName::BeforeLoad);
        self.phase = LifecyclePhase::Ready;
        self.fire(EventName::Load);
    }

    /// Run `task` once `delay` has passed on the editor's clock, unless the
    /// editor has been destroyed by then.
    pub(crate) fn schedule(
        &mut self,
        delay: Duration,
        label: &'static str,
        task: impl FnOnce(&mut Editor) + 'static,
    ) {
        self.scheduler.schedule(delay, label, move |editor| {
            if editor.destroyed {
                log::debug!("Skipping `{label}` on a destroyed editor");
            } else {
                task(editor);
            }
        });
    }

    /// Move the editor's clock forward, running whatever became due.
    pub fn advance(&mut self, duration: Duration) -> &mut Self {
        run_due(self, duration, |editor| &mut editor.scheduler);
        self
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the platform supports the composer, as decided at
    /// construction.
    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn current_view(&self) -> ViewKind {
        self.current_view
    }

    pub(crate) fn set_current_view(&mut self, view: ViewKind) {
        self.current_view = view;
    }

    pub fn textarea(&self) -> &TextareaView {
        &self.textarea
    }

    pub fn composer(&self) -> Option<&ComposerView> {
        self.composer.as_ref()
    }

    pub(crate) fn views_mut(
        &mut self,
    ) -> (&mut TextareaView, Option<&mut ComposerView>) {
        (&mut self.textarea, self.composer.as_mut())
    }

    pub fn synchronizer(&self) -> Option<&Synchronizer> {
        self.synchronizer.as_ref()
    }

    pub fn toolbar(&self) -> Option<&Toolbar> {
        self.toolbar.as_ref()
    }

    pub fn auto_resize(&self) -> Option<&AutoResizeController> {
        self.auto_resize.as_ref()
    }

    /// The composer's sandbox, if there is a composer.
    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.composer.as_ref().map(|c| c.surface().clone())
    }

    fn view(&self) -> &dyn View {
        match (self.current_view, &self.composer) {
            (ViewKind::Composer, Some(composer)) => composer,
            _ => &self.textarea,
        }
    }

    fn view_mut(&mut self) -> &mut dyn View {
        match (self.current_view, self.composer.as_mut()) {
            (ViewKind::Composer, Some(composer)) => composer,
            _ => &mut self.textarea,
        }
    }

    fn view_of_mut(&mut self, kind: ViewKind) -> Option<&mut dyn View> {
        match kind {
            ViewKind::Textarea => Some(&mut self.textarea),
            ViewKind::Composer => {
                self.composer.as_mut().map(|c| c as &mut dyn View)
            }
        }
    }

    pub fn clear(&mut self) -> &mut Self {
        self.view_mut().clear();
        self
    }

    pub fn get_value(&self, parse: bool) -> Result<String, ParseError> {
        self.view().get_value(parse)
    }

    /// Replace the content of the current view. No content (None or "")
    /// clears it instead.
    pub fn set_value(
        &mut self,
        html: Option<&str>,
        parse: bool,
    ) -> Result<&mut Self, ParseError> {
        self.fire(EventName::UnsetPlaceholder);
        match html {
            None | Some("") => self.view_mut().clear(),
            Some(html) => self.view_mut().set_value(html, parse)?,
        }
        Ok(self)
    }

    pub fn focus(&mut self, to_end: bool) -> &mut Self {
        self.view_mut().focus(to_end);
        self
    }

    pub fn enable(&mut self) -> &mut Self {
        self.view_mut().enable();
        if self.current_view == ViewKind::Composer {
            self.fire(EventName::EnableComposer);
        }
        self
    }

    pub fn disable(&mut self) -> &mut Self {
        self.view_mut().disable();
        if self.current_view == ViewKind::Composer {
            self.fire(EventName::DisableComposer);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    pub fn has_placeholder_set(&self) -> bool {
        self.view().has_placeholder_set()
    }

    /// Sanitize with the configured parser and rules, in the context of the
    /// composer's document. Without a parser the input comes back as is.
    pub fn parse(&self, target: ParseTarget<'_>) -> Result<String, ParseError> {
        let surface = self.surface();
        match target {
            ParseTarget::Html(html) => {
                let guard = surface.as_ref().map(|s| s.borrow());
                let detached = Dom::new();
                let context = guard
                    .as_ref()
                    .and_then(|s| s.document())
                    .unwrap_or(&detached);
                self.parse_context.parse_html(html, context)
            }
            ParseTarget::ContentRoot => {
                let handle = surface.ok_or(ParseError::NoContentRoot)?;
                let mut surface = handle.borrow_mut();
                let dom =
                    surface.document_mut().ok_or(ParseError::NoContentRoot)?;
                let root = dom.root();
                let html = self.parse_context.parse_element(dom, root)?;
                surface.request_redraw();
                Ok(html)
            }
        }
    }

    /// Run a command in the composer, announcing it with
    /// `beforecommand:composer` and `aftercommand:composer`.
    pub fn exec_command(&mut self, command: Command) -> &mut Self {
        if self.current_view != ViewKind::Composer || self.composer.is_none() {
            log::debug!("Ignoring {command:?}: the composer is not current");
            return self;
        }
        self.fire(Event::with_payload(
            EventName::BeforeCommandComposer,
            EventPayload::Command(command.clone()),
        ));
        let outcome = match self.composer.as_mut() {
            Some(composer) => composer.exec(&command),
            None => return self,
        };
        if outcome.executed {
            self.fire(Event::with_payload(
                EventName::AfterCommandComposer,
                EventPayload::Command(command),
            ));
            if outcome.new_word {
                self.fire(EventName::NewWordComposer);
            }
        }
        self
    }

    pub fn undo(&mut self) -> &mut Self {
        if self.composer.as_mut().is_some_and(ComposerView::undo) {
            self.fire(EventName::UndoComposer);
        }
        self
    }

    pub fn redo(&mut self) -> &mut Self {
        if self.composer.as_mut().is_some_and(ComposerView::redo) {
            self.fire(EventName::RedoComposer);
        }
        self
    }

    /// Ask for `view` (or the other view, if None) to become current.
    pub fn change_view(&mut self, view: Option<ViewKind>) -> &mut Self {
        let target = view.unwrap_or_else(|| self.current_view.other());
        self.fire(Event::with_payload(
            EventName::ChangeView,
            EventPayload::View(target),
        ))
    }

    /// Feed a DOM event that happened on one of the views.
    pub fn dispatch_dom_event(
        &mut self,
        view: ViewKind,
        event: DomEvent,
    ) -> &mut Self {
        if view == ViewKind::Composer {
            match self.surface() {
                Some(surface) => surface.dispatch_event(&event),
                None => return self,
            }
        }
        let payload = EventPayload::View(view);

        match event {
            DomEvent::Focus => {
                let Some(target) = self.view_of_mut(view) else {
                    return self;
                };
                target.set_focused(true);
                let value = target.get_value(false).ok();
                self.value_on_focus = value;
                self.fire(Event::with_payload(EventName::Focus, payload.clone()));
                self.fire(Event::with_payload(EventName::focus(view), payload));
            }
            DomEvent::Blur => {
                let Some(target) = self.view_of_mut(view) else {
                    return self;
                };
                target.set_focused(false);
                let value = target.get_value(false).ok();
                self.fire(Event::with_payload(EventName::Blur, payload.clone()));
                self.fire(Event::with_payload(
                    EventName::blur(view),
                    payload.clone(),
                ));
                if let Some(before) = self.value_on_focus.take() {
                    if value.as_ref() != Some(&before) {
                        self.fire(Event::with_payload(
                            EventName::Change,
                            payload.clone(),
                        ));
                        self.fire(Event::with_payload(
                            EventName::change(view),
                            payload,
                        ));
                    }
                }
            }
            DomEvent::Paste(html) | DomEvent::Drop(html) => {
                let Some(target) = self.view_of_mut(view) else {
                    return self;
                };
                target.insert_pasted(&html);
                self.fire(Event::with_payload(EventName::Paste, payload.clone()));
                self.fire(Event::with_payload(EventName::paste(view), payload));
            }
            DomEvent::KeyUp(key)
                if view == ViewKind::Composer && key.is_word_separator() =>
            {
                if let Some(composer) = self.composer.as_mut() {
                    composer.auto_link_content();
                }
                self.fire(EventName::NewWordComposer);
            }
            DomEvent::KeyUp(_)
            | DomEvent::KeyDown(_)
            | DomEvent::KeyPress(_) => {}
        }
        self
    }

    /// Strip pasted styles and sanitize the whole content, keeping the
    /// caret and scroll position.
    fn sanitize_pasted(&mut self) {
        let Some(surface) = self.surface() else {
            return;
        };
        let context = self.parse_context.clone();
        let result = surface.borrow_mut().execute_and_restore(true, |dom, root| {
            clean_pasted_html(dom, root);
            context.parse_element(dom, root)
        });
        match result {
            Some(Ok(_)) => log::trace!("Sanitized pasted content"),
            Some(Err(e)) => log::warn!("Could not sanitize pasted content: {e}"),
            None => log::debug!("Paste before the composer loaded"),
        }
    }

    /// Tear the composer down. Its content is copied back to the textarea,
    /// which becomes the current view; tasks still scheduled will not run.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if self.composer.is_some() {
            self.fire(EventName::DestroyComposer);
        }
        if let Some(controller) = self.auto_resize.take() {
            controller.detach(self);
        }
        if let Some(synchronizer) = self.synchronizer.take() {
            synchronizer.detach(self);
        }
        if self.composer.is_some() {
            Synchronizer::from_composer_to_textarea(self, true);
        }
        if let Some(composer) = self.composer.as_mut() {
            composer.detach();
        }
        self.textarea.set_hidden(false);
        self.current_view = ViewKind::Textarea;
        self.destroyed = true;
    }

    pub fn on(
        &mut self,
        name: EventName,
        listener: impl Fn(&mut Editor, &Event) + 'static,
    ) -> ListenerId {
        self.dispatcher.on(name, listener)
    }

    pub fn once(
        &mut self,
        name: EventName,
        listener: impl Fn(&mut Editor, &Event) + 'static,
    ) -> ListenerId {
        self.dispatcher.once(name, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.dispatcher.off(id)
    }

    pub fn listener_count(&self, name: EventName) -> usize {
        self.dispatcher.listener_count(name)
    }

    pub fn fire(&mut self, event: impl Into<Event>) -> &mut Self {
        events::fire(self, &event.into());
        self
    }
}
