// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Events fired by an [crate::Editor].
//!
//! [EventName] displays and parses as the exact names page code subscribes
//! to, e.g. `"focus:composer"`.

mod dispatcher;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::views::{Command, ViewKind};

pub use dispatcher::{fire, Dispatch, Dispatcher, Listener, ListenerId};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
pub enum EventName {
    #[strum(serialize = "load")]
    Load,
    #[strum(serialize = "beforeload")]
    BeforeLoad,
    #[strum(serialize = "focus")]
    Focus,
    #[strum(serialize = "focus:composer")]
    FocusComposer,
    #[strum(serialize = "focus:textarea")]
    FocusTextarea,
    #[strum(serialize = "blur")]
    Blur,
    #[strum(serialize = "blur:composer")]
    BlurComposer,
    #[strum(serialize = "blur:textarea")]
    BlurTextarea,
    #[strum(serialize = "change")]
    Change,
    #[strum(serialize = "change:composer")]
    ChangeComposer,
    #[strum(serialize = "change:textarea")]
    ChangeTextarea,
    #[strum(serialize = "paste")]
    Paste,
    #[strum(serialize = "paste:composer")]
    PasteComposer,
    #[strum(serialize = "paste:textarea")]
    PasteTextarea,
    #[strum(serialize = "newword:composer")]
    NewWordComposer,
    #[strum(serialize = "destroy:composer")]
    DestroyComposer,
    #[strum(serialize = "undo:composer")]
    UndoComposer,
    #[strum(serialize = "redo:composer")]
    RedoComposer,
    #[strum(serialize = "beforecommand:composer")]
    BeforeCommandComposer,
    #[strum(serialize = "aftercommand:composer")]
    AfterCommandComposer,
    #[strum(serialize = "enable:composer")]
    EnableComposer,
    #[strum(serialize = "disable:composer")]
    DisableComposer,
    #[strum(serialize = "change_view")]
    ChangeView,
    /// Asks the composer to drop its placeholder before content is set.
    #[strum(serialize = "unset_placeholder")]
    UnsetPlaceholder,
}

impl EventName {
    pub fn focus(view: ViewKind) -> Self {
        match view {
            ViewKind::Composer => Self::FocusComposer,
            ViewKind::Textarea => Self::FocusTextarea,
        }
    }

    pub fn blur(view: ViewKind) -> Self {
        match view {
            ViewKind::Composer => Self::BlurComposer,
            ViewKind::Textarea => Self::BlurTextarea,
        }
    }

    pub fn change(view: ViewKind) -> Self {
        match view {
            ViewKind::Composer => Self::ChangeComposer,
            ViewKind::Textarea => Self::ChangeTextarea,
        }
    }

    pub fn paste(view: ViewKind) -> Self {
        match view {
            ViewKind::Composer => Self::PasteComposer,
            ViewKind::Textarea => Self::PasteTextarea,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EventPayload {
    #[default]
    None,
    /// The view an event came from, or the view `change_view` asks for.
    View(ViewKind),
    Command(Command),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: EventName,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(name: EventName) -> Self {
        Self {
            name,
            payload: EventPayload::None,
        }
    }

    pub fn with_payload(name: EventName, payload: EventPayload) -> Self {
        Self { name, payload }
    }

    /// The view carried by the payload, if any.
    pub fn view(&self) -> Option<ViewKind> {
        match self.payload {
            EventPayload::View(view) => Some(view),
            _ => None,
        }
    }
}

impl From<EventName> for Event {
    fn from(name: EventName) -> Self {
        Self::new(name)
    }
}
