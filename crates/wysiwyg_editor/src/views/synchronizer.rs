// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::events::{EventName, ListenerId};
use crate::views::{View, ViewKind};
use crate::Editor;

/// Keeps the textarea and the composer holding the same content, and
/// switches between them on `change_view`.
#[derive(Debug)]
pub struct Synchronizer {
    listener_ids: Vec<ListenerId>,
}

impl Synchronizer {
    pub fn install(editor: &mut Editor) -> Self {
        let change_view = editor.on(EventName::ChangeView, |editor, event| {
            let target =
                event.view().unwrap_or_else(|| editor.current_view().other());
            Self::switch_to(editor, target);
        });
        let blur = editor.on(EventName::BlurComposer, |editor, _| {
            Self::from_composer_to_textarea(editor, true);
        });
        Self {
            listener_ids: vec![change_view, blur],
        }
    }

    pub fn listener_ids(&self) -> &[ListenerId] {
        &self.listener_ids
    }

    pub fn detach(self, editor: &mut Editor) {
        for id in self.listener_ids {
            editor.off(id);
        }
    }

    /// Copy the composer's content into the textarea.
    pub fn from_composer_to_textarea(editor: &mut Editor, parse: bool) {
        let (textarea, Some(composer)) = editor.views_mut() else {
            return;
        };
        if !composer.is_loaded() {
            return;
        }
        let value = match composer.get_value(false) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Could not read the composer: {e}");
                return;
            }
        };
        if let Err(e) = textarea.set_value(value.trim(), parse) {
            log::warn!("Could not copy the composer into the textarea: {e}");
        }
    }

    /// Copy the textarea's content into the composer. An empty textarea
    /// leaves the composer cleared, showing its placeholder.
    pub fn from_textarea_to_composer(editor: &mut Editor, parse: bool) {
        let (textarea, Some(composer)) = editor.views_mut() else {
            return;
        };
        let value = textarea.get_value(false).unwrap_or_default();
        if value.is_empty() {
            composer.clear();
            composer.show_placeholder();
        } else if let Err(e) = composer.set_value(&value, parse) {
            log::warn!("Could not copy the textarea into the composer: {e}");
        }
    }

    fn switch_to(editor: &mut Editor, target: ViewKind) {
        if target == editor.current_view() || editor.composer().is_none() {
            return;
        }
        match target {
            ViewKind::Textarea => {
                Self::from_composer_to_textarea(editor, true)
            }
            ViewKind::Composer => {
                Self::from_textarea_to_composer(editor, true)
            }
        }
        let (textarea, composer) = editor.views_mut();
        textarea.set_hidden(target != ViewKind::Textarea);
        if let Some(composer) = composer {
            composer.set_hidden(target != ViewKind::Composer);
        }
        editor.set_current_view(target);
        log::debug!("Switched to the {target} view");
    }
}

#[cfg(test)]
mod test {
    use crate::tests::testutils::ready_editor;
    use crate::views::{Command, View, ViewKind};
    use crate::ConfigOverrides;

    #[test]
    fn switching_to_the_textarea_copies_sanitized_content() {
        let (_page, mut editor) =
            ready_editor("<p>a<b>b</b></p>", ConfigOverrides::default());

        editor.change_view(Some(ViewKind::Textarea));

        assert_eq!(editor.current_view(), ViewKind::Textarea);
        let textarea = editor.textarea().element().borrow().clone();
        assert_eq!(textarea.value, "<p>ab</p>");
        assert!(!textarea.hidden);
        assert!(editor.surface().unwrap().borrow().is_hidden());
    }

    #[test]
    fn switching_back_copies_edits_into_the_composer() {
        let (_page, mut editor) = ready_editor("", ConfigOverrides::default());
        editor.change_view(None);
        editor.set_value(Some("<p>typed</p><script>x</script>"), false).unwrap();

        editor.change_view(None);

        assert_eq!(editor.current_view(), ViewKind::Composer);
        assert_eq!(editor.get_value(false).unwrap(), "<p>typed</p>");
        assert!(editor.textarea().element().borrow().hidden);
        assert!(!editor.surface().unwrap().borrow().is_hidden());
    }

    #[test]
    fn an_empty_textarea_clears_the_composer() {
        let overrides = ConfigOverrides {
            placeholder_text: Some(String::from("Type")),
            ..Default::default()
        };
        let (_page, mut editor) = ready_editor("x", overrides);
        editor.change_view(Some(ViewKind::Textarea));
        editor.clear();

        editor.change_view(Some(ViewKind::Composer));

        assert!(editor.is_empty());
        assert!(editor.composer().unwrap().has_placeholder_set());
    }

    #[test]
    fn asking_for_the_current_view_changes_nothing() {
        let (_page, mut editor) = ready_editor("a", ConfigOverrides::default());
        editor.exec_command(Command::InsertText(String::from("b")));

        editor.change_view(Some(ViewKind::Composer));

        assert_eq!(editor.current_view(), ViewKind::Composer);
        assert_eq!(editor.textarea().element().borrow().value, "a");
    }
}
