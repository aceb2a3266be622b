// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The two ways of showing an editor's content.
//!
//! The plain [TextareaView] always exists; the rich [ComposerView] only on
//! platforms that support it. Both implement [View], and the editor sends
//! every content operation to whichever one is current.

mod composer;
mod synchronizer;
mod textarea;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::ParseError;

pub use composer::{
    Command, CommandOutcome, ComposerOptions, ComposerView, MAX_HISTORY_ENTRIES,
};
pub use synchronizer::Synchronizer;
pub use textarea::TextareaView;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum ViewKind {
    Textarea,
    Composer,
}

impl ViewKind {
    pub fn other(self) -> Self {
        match self {
            Self::Textarea => Self::Composer,
            Self::Composer => Self::Textarea,
        }
    }
}

pub trait View {
    fn kind(&self) -> ViewKind;

    fn clear(&mut self);

    /// The current content as HTML, sanitized when `parse` is set.
    fn get_value(&self, parse: bool) -> Result<String, ParseError>;

    /// Replace the content, sanitizing `html` first when `parse` is set.
    fn set_value(&mut self, html: &str, parse: bool) -> Result<(), ParseError>;

    /// Give the view the focus, with the caret at the end if `to_end`.
    fn focus(&mut self, to_end: bool);

    fn enable(&mut self);

    fn disable(&mut self);

    /// True if there is no content, or only the placeholder is shown.
    fn is_empty(&self) -> bool;

    fn has_placeholder_set(&self) -> bool;

    /// Record that the view gained or lost the focus.
    fn set_focused(&mut self, focused: bool);

    /// Insert content pasted or dropped by the user.
    fn insert_pasted(&mut self, html: &str);

    fn set_hidden(&mut self, hidden: bool);
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::ViewKind;

    #[test]
    fn view_kinds_toggle_and_display_lowercase() {
        assert_eq!(ViewKind::Composer.other(), ViewKind::Textarea);
        assert_eq!(ViewKind::Textarea.other().other(), ViewKind::Textarea);
        assert_eq!(ViewKind::Composer.to_string(), "composer");
        assert_eq!(ViewKind::from_str("textarea"), Ok(ViewKind::Textarea));
    }
}
