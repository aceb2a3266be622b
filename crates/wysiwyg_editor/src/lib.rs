// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The core of a textarea-backed rich text editor.
//!
//! An [Editor] wraps one textarea. On platforms that can host it, a rich
//! composer sandbox ([Surface]) is shown in its place and kept in sync with
//! it; elsewhere the textarea stays the only view. Both views answer the
//! same [View] contract, so callers do not need to know which is current.
//! [AutoResizeController] grows the composer with its content, using a
//! [HeightMeasurer] over the sandbox's [LayoutMetrics].

mod auto_resize;
mod config;
mod dom;
mod editor;
mod error;
mod events;
mod layout;
mod measure;
mod platform;
mod sanitize;
mod scheduler;
mod surface;
mod toolbar;
mod views;

#[cfg(test)]
mod tests;

pub use crate::auto_resize::{
    AutoResizeController, Resizer, RESIZE_DOM_EVENTS, RESIZE_EVENTS,
    SETUP_DELAY,
};
pub use crate::config::{Config, ConfigOverrides, Stylesheets};
pub use crate::dom::{Dom, ElementData, NodeData, NodeHandle};
pub use crate::editor::{Editor, LifecyclePhase, ParseTarget};
pub use crate::error::{EditorError, ParseError};
pub use crate::events::{Event, EventName, EventPayload, ListenerId};
pub use crate::layout::{BlockLayout, BoxMetrics, LayoutMetrics};
pub use crate::measure::{HeightMeasurer, MeasureStrategy, BASE_OFFSET};
pub use crate::platform::{
    Browser, Page, SimulatedBrowser, TextareaElement, TextareaHandle,
    TextareaSource,
};
pub use crate::sanitize::{
    auto_link, clean_pasted_html, ParseContext, ParseSource, Parser,
    ParserRules, RuleParser, TagRule,
};
pub use crate::scheduler::Scheduler;
pub use crate::surface::{
    Caret, DomEvent, DomEventKind, Key, RawListenerId, Selection, Style,
    Surface, SurfaceHandle, WeakSurface,
};
pub use crate::toolbar::Toolbar;
pub use crate::views::{
    Command, CommandOutcome, ComposerOptions, ComposerView, Synchronizer,
    TextareaView, View, ViewKind, MAX_HISTORY_ENTRIES,
};
