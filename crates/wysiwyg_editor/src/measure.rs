// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Estimating the rendered height of a composer's content root.
//!
//! Two definitions of this calculation exist and they disagree:
//!
//! * [MeasureStrategy::PerNode] walks the root's children, measuring text
//!   and repeated line breaks through a temporary wrapper and everything
//!   else in place. This is the later definition and the default.
//! * [MeasureStrategy::WholeContent] wraps the whole content in one
//!   temporary wrapper and reads its height. This is the earlier definition,
//!   kept so the two can be compared; the two results are not expected to
//!   match.
//!
//! Both leave the root exactly as they found it: the temporary wrapper is
//! removed on every exit path.

use crate::dom::{Dom, NodeHandle};
use crate::layout::{BoxMetrics, LayoutMetrics};

/// Height added to every measurement for the root's own padding.
pub const BASE_OFFSET: u32 = 20;

/// Appended to temporary wrappers so that they always have some renderable
/// width, even around whitespace-only text.
const RENDER_MARKER: &str = " \u{a0}";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeasureStrategy {
    #[default]
    PerNode,
    WholeContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeightMeasurer {
    pub base_offset: u32,
    pub strategy: MeasureStrategy,
}

impl Default for HeightMeasurer {
    fn default() -> Self {
        Self {
            base_offset: BASE_OFFSET,
            strategy: MeasureStrategy::default(),
        }
    }
}

impl HeightMeasurer {
    pub fn with_strategy(strategy: MeasureStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Pixel height of the content below `root`.
    pub fn measure(
        &self,
        dom: &mut Dom,
        root: NodeHandle,
        layout: &dyn LayoutMetrics,
    ) -> u32 {
        match self.strategy {
            MeasureStrategy::PerNode => self.measure_per_node(dom, root, layout),
            MeasureStrategy::WholeContent => {
                self.measure_whole_content(dom, root, layout)
            }
        }
    }

    pub fn measure_per_node(
        &self,
        dom: &mut Dom,
        root: NodeHandle,
        layout: &dyn LayoutMetrics,
    ) -> u32 {
        let children = dom.children(root).to_vec();
        let mut total = self.base_offset;
        let mut previous_was_break = false;

        for child in children {
            let is_break = dom.is_element_named(child, "br");
            // A bare <br> measured in place reports no height, so a second
            // one in a row has to be measured through a wrapper to count.
            let height = if dom.is_text(child) || (is_break && previous_was_break)
            {
                scoped_height(dom, root, &[child], layout)
            } else {
                node_height(layout.metrics(dom, child))
            };
            total += height;
            previous_was_break = is_break;
        }

        total
    }

    pub fn measure_whole_content(
        &self,
        dom: &mut Dom,
        root: NodeHandle,
        layout: &dyn LayoutMetrics,
    ) -> u32 {
        let children = dom.children(root).to_vec();
        let metrics = with_wrapper(dom, root, &children, |dom, wrapper| {
            layout.metrics(dom, wrapper)
        });
        let height = metrics
            .map(|m| m.offset_height.max(m.client_height))
            .unwrap_or(0);
        self.base_offset + height
    }
}

fn node_height(metrics: Option<BoxMetrics>) -> u32 {
    metrics
        .map(|m| {
            m.scroll_height.max(m.offset_height).max(m.client_height)
                + m.offset_top
        })
        .unwrap_or(0)
}

fn scoped_height(
    dom: &mut Dom,
    root: NodeHandle,
    sources: &[NodeHandle],
    layout: &dyn LayoutMetrics,
) -> u32 {
    node_height(with_wrapper(dom, root, sources, |dom, wrapper| {
        layout.metrics(dom, wrapper)
    }))
}

/// Run `read` against a temporary `div` holding copies of `sources` plus
/// the render marker, inserted as the first child of `root`.
fn with_wrapper<T>(
    dom: &mut Dom,
    root: NodeHandle,
    sources: &[NodeHandle],
    read: impl FnOnce(&Dom, NodeHandle) -> T,
) -> T {
    let wrapper = dom.create_element("div");
    for source in sources {
        if let Some(copy) = dom.deep_clone(*source) {
            dom.append_child(wrapper, copy);
        }
    }
    let marker = dom.create_text(RENDER_MARKER);
    dom.append_child(wrapper, marker);

    let insertion = ScopedInsertion::new(dom, root, wrapper);
    read(&*insertion.dom, wrapper)
}

/// A node inserted into a document for as long as this guard lives.
struct ScopedInsertion<'a> {
    dom: &'a mut Dom,
    node: NodeHandle,
}

impl<'a> ScopedInsertion<'a> {
    fn new(dom: &'a mut Dom, parent: NodeHandle, node: NodeHandle) -> Self {
        dom.insert_child(parent, 0, node);
        Self { dom, node }
    }
}

impl Drop for ScopedInsertion<'_> {
    fn drop(&mut self) {
        self.dom.remove(self.node);
    }
}

#[cfg(test)]
mod test {
    use speculoos::prelude::*;

    use super::*;
    use crate::layout::BlockLayout;

    fn measure(html: &str) -> u32 {
        let mut dom = Dom::from_html(html);
        let root = dom.root();
        HeightMeasurer::default().measure(
            &mut dom,
            root,
            &BlockLayout::default(),
        )
    }

    #[test]
    fn empty_root_measures_the_base_offset() {
        assert_eq!(measure(""), BASE_OFFSET);
    }

    #[test]
    fn text_is_measured_through_a_wrapper() {
        assert_eq!(measure("hello"), BASE_OFFSET + 20);
    }

    #[test]
    fn whitespace_only_text_is_not_zero() {
        assert_that!(measure("   ")).is_greater_than(BASE_OFFSET);
    }

    #[test]
    fn single_line_break_measures_nothing_in_place() {
        assert_eq!(measure("<br>"), BASE_OFFSET);
    }

    #[test]
    fn consecutive_line_breaks_each_count() {
        let one = measure("<br>");
        let two = measure("<br><br>");
        let three = measure("<br><br><br>");
        assert_that!(two).is_greater_than_or_equal_to(one);
        assert_that!(three).is_greater_than(two);
    }

    #[test]
    fn blocks_are_measured_in_place_with_their_offset() {
        assert_eq!(
            measure("<p style=\"margin-top: 4px\">a</p><div>b</div>"),
            BASE_OFFSET + 24 + 20
        );
    }

    #[test]
    fn overflowing_blocks_use_their_scroll_height() {
        assert_eq!(
            measure("<div style=\"height: 5px\">a<br>b</div>"),
            BASE_OFFSET + 40
        );
    }

    #[test]
    fn measuring_leaves_the_root_untouched() {
        let mut dom = Dom::from_html("a<br><br><b>c</b>   <p>d</p>");
        let root = dom.root();
        let children_before = dom.children(root).to_vec();
        let html_before = dom.inner_html(root);
        let len_before = dom.len();

        for strategy in [MeasureStrategy::PerNode, MeasureStrategy::WholeContent]
        {
            HeightMeasurer::with_strategy(strategy).measure(
                &mut dom,
                root,
                &BlockLayout::default(),
            );
            assert_eq!(dom.children(root), children_before.as_slice());
            assert_eq!(dom.inner_html(root), html_before);
            assert_eq!(dom.len(), len_before);
        }
    }

    #[test]
    fn appending_text_never_decreases_the_height() {
        let mut dom = Dom::new();
        let root = dom.root();
        let text = dom.create_text("");
        dom.append_child(root, text);
        let layout = BlockLayout::new(20, 8);
        let measurer = HeightMeasurer::default();

        let mut previous = measurer.measure(&mut dom, root, &layout);
        for word in ["lorem ", "ipsum ", "dolor ", "sit ", "amet, ", "x"] {
            if let Some(content) = dom.text_mut(text) {
                content.push_str(word);
            }
            let height = measurer.measure(&mut dom, root, &layout);
            assert_that!(height).is_greater_than_or_equal_to(previous);
            previous = height;
        }
        assert_that!(previous).is_greater_than(BASE_OFFSET + 20);
    }

    #[test]
    fn whole_content_strategy_wraps_everything_once() {
        let mut dom = Dom::from_html("a<br><br>b");
        let root = dom.root();
        let height = HeightMeasurer::with_strategy(MeasureStrategy::WholeContent)
            .measure(&mut dom, root, &BlockLayout::default());
        // a / (empty) / b + marker on the last line
        assert_eq!(height, BASE_OFFSET + 60);
    }
}
