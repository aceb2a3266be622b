// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::dom::{Dom, NodeHandle};
use crate::surface::Surface;

/// A collapsed selection. In a text node `offset` counts characters, in an
/// element it is a child index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeHandle,
    pub offset: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub caret: Option<Caret>,
    pub scroll_top: u32,
}

impl Selection {
    pub fn collapse_to_end(&mut self, dom: &Dom, root: NodeHandle) {
        self.caret = Some(Caret {
            node: root,
            offset: dom.children(root).len(),
        });
    }

    /// Whether the caret still points somewhere inside `root`.
    pub fn is_within(&self, dom: &Dom, root: NodeHandle) -> bool {
        let Some(caret) = self.caret else {
            return false;
        };
        if !dom.contains(caret.node) || !dom.is_inside(caret.node, root) {
            return false;
        }
        let limit = match dom.text(caret.node) {
            Some(text) => text.chars().count(),
            None => dom.children(caret.node).len(),
        };
        caret.offset <= limit
    }
}

impl Surface {
    /// Run `f` on the content, then put the caret back where it was. If its
    /// node went away the caret goes to the end, scrolling there unless
    /// `keep_scroll` is set. None while the sandbox is unloaded.
    pub fn execute_and_restore<T>(
        &mut self,
        keep_scroll: bool,
        f: impl FnOnce(&mut Dom, NodeHandle) -> T,
    ) -> Option<T> {
        let saved = self.selection.clone();
        let dom = self.document.as_mut()?;
        let root = dom.root();

        let ret = f(dom, root);

        self.selection = saved;
        if !self.selection.is_within(dom, root) {
            self.selection.collapse_to_end(dom, root);
            if !keep_scroll {
                // Moving the caret scrolls it into view.
                self.selection.scroll_top = self.layout.content_height(dom, root);
            }
        }
        Some(ret)
    }
}

#[cfg(test)]
mod test {
    use crate::layout::BlockLayout;
    use crate::surface::{Caret, Surface};

    fn loaded(html: &str) -> Surface {
        let mut surface = Surface::new(Vec::new(), BlockLayout::default());
        surface.attach(html);
        surface
    }

    #[test]
    fn caret_survives_when_its_node_does() {
        let mut surface = loaded("<p>abc</p>");
        let text = {
            let dom = surface.document().unwrap();
            dom.children(dom.children(dom.root())[0])[0]
        };
        surface.selection.caret = Some(Caret {
            node: text,
            offset: 2,
        });

        surface.execute_and_restore(false, |dom, root| {
            let extra = dom.create_text("!");
            dom.append_child(root, extra);
        });

        assert_eq!(
            surface.selection().caret,
            Some(Caret {
                node: text,
                offset: 2
            })
        );
    }

    #[test]
    fn caret_moves_to_the_end_when_its_node_is_gone() {
        let mut surface = loaded("<b>x</b>y");
        let b = {
            let dom = surface.document().unwrap();
            dom.children(dom.root())[0]
        };
        surface.selection.caret = Some(Caret { node: b, offset: 1 });

        surface.execute_and_restore(true, |dom, _| dom.replace_with_children(b));

        let dom = surface.document().unwrap();
        assert_eq!(
            surface.selection().caret,
            Some(Caret {
                node: dom.root(),
                offset: 2
            })
        );
    }

    #[test]
    fn scroll_position_is_kept_only_when_asked() {
        let mut surface = loaded("<b>x</b><br>y");
        let b = {
            let dom = surface.document().unwrap();
            dom.children(dom.root())[0]
        };
        surface.selection.caret = Some(Caret { node: b, offset: 0 });
        surface.selection.scroll_top = 10;

        let ret = surface.execute_and_restore(true, |dom, _| {
            dom.replace_with_children(b);
            7
        });
        assert_eq!(ret, Some(7));
        assert_eq!(surface.selection().scroll_top, 10);

        let x = {
            let dom = surface.document().unwrap();
            dom.children(dom.root())[0]
        };
        surface.selection.caret = Some(Caret { node: x, offset: 0 });
        surface.execute_and_restore(false, |dom, _| dom.remove(x));
        assert_eq!(surface.selection().scroll_top, 40);
    }

    #[test]
    fn nothing_runs_while_unloaded() {
        let mut surface = Surface::new(Vec::new(), BlockLayout::default());
        assert_eq!(surface.execute_and_restore(true, |_, _| 1), None);
    }
}
