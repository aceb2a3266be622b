// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::views::Command;
use crate::Editor;

/// The editor's side of a toolbar: its buttons end up here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolbar {
    id: String,
}

impl Toolbar {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_owned() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exec(&self, editor: &mut Editor, command: Command) {
        log::trace!("Toolbar `{}` runs {command:?}", self.id);
        editor.exec_command(command);
    }

    pub fn toggle_view(&self, editor: &mut Editor) {
        editor.change_view(None);
    }
}
