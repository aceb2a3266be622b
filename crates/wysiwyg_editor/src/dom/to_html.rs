// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::dom::{Dom, NodeData, NodeHandle};

impl Dom {
    /// Serialized HTML of the children of `handle`.
    pub fn inner_html(&self, handle: NodeHandle) -> String {
        let mut html = String::new();
        for child in self.children(handle) {
            self.write_html(*child, &mut html);
        }
        html
    }

    /// Serialized HTML of `handle` itself, including its own tag.
    pub fn outer_html(&self, handle: NodeHandle) -> String {
        let mut html = String::new();
        self.write_html(handle, &mut html);
        html
    }

    fn write_html(&self, handle: NodeHandle, html: &mut String) {
        match self.get(handle) {
            Some(NodeData::Text(text)) => {
                html.push_str(&html_escape::encode_text(text));
            }
            Some(NodeData::Element(element)) => {
                html.push('<');
                html.push_str(&element.name);
                for (name, value) in &element.attrs {
                    html.push(' ');
                    html.push_str(name);
                    html.push_str("=\"");
                    html.push_str(
                        &html_escape::encode_double_quoted_attribute(value),
                    );
                    html.push('"');
                }
                html.push('>');
                if element.is_void() {
                    return;
                }
                for child in self.children(handle) {
                    self.write_html(*child, html);
                }
                html.push_str("</");
                html.push_str(&element.name);
                html.push('>');
            }
            None => {}
        }
    }
}
