// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Box metrics for nodes of a [Dom].
//!
//! [LayoutMetrics] is the read-only question "how big did this node
//! render?". [BlockLayout] answers it with a small line-box model: inline
//! content flows into lines of a fixed number of columns, `br` ends a line,
//! block elements stack on top of each other.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::dom::{Dom, ElementData, NodeData, NodeHandle};

const BLOCK_ELEMENTS: [&str; 14] = [
    "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol",
    "p", "pre", "table", "ul",
];

/// Rendered size of one node, in pixels.
/// A `property: Npx` declaration in an inline style.
static PX_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*([a-z-]+)\s*:\s*(\d+)px")
        .expect("valid declaration pattern")
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoxMetrics {
    /// Height of the node's content, including any part overflowing its
    /// box.
    pub scroll_height: u32,
    /// Height of the node's box including borders.
    pub offset_height: u32,
    /// Height of the node's box excluding borders.
    pub client_height: u32,
    /// Distance between the top of the node's box and the end of whatever
    /// precedes it.
    pub offset_top: u32,
}

pub trait LayoutMetrics {
    /// Metrics of `node`, or None if it renders no box of its own (a bare
    /// `br`, or a handle that is not in `dom`).
    fn metrics(&self, dom: &Dom, node: NodeHandle) -> Option<BoxMetrics>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    pub line_height: u32,
    /// Characters (grapheme clusters) per line before text wraps.
    pub columns: usize,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            line_height: 20,
            columns: 80,
        }
    }
}

impl BlockLayout {
    pub fn new(line_height: u32, columns: usize) -> Self {
        Self {
            line_height,
            columns: columns.max(1),
        }
    }

    /// Height of the content of `node` when laid out as a block.
    pub fn content_height(&self, dom: &Dom, node: NodeHandle) -> u32 {
        let mut flow = LineFlow::new(self.columns);
        let mut height = 0;
        match dom.get(node) {
            Some(NodeData::Text(text)) => flow.push_text(text),
            Some(NodeData::Element(_)) => {
                for child in dom.children(node) {
                    self.lay_out(dom, *child, &mut flow, &mut height);
                }
            }
            None => {}
        }
        height + flow.finish() * self.line_height
    }

    fn lay_out(
        &self,
        dom: &Dom,
        node: NodeHandle,
        flow: &mut LineFlow,
        height: &mut u32,
    ) {
        match dom.get(node) {
            Some(NodeData::Text(text)) => flow.push_text(text),
            Some(NodeData::Element(element)) if element.name == "br" => {
                flow.line_break();
            }
            Some(NodeData::Element(element)) if is_block(element) => {
                *height += flow.finish() * self.line_height;
                if let Some(metrics) = self.metrics(dom, node) {
                    *height += metrics.offset_height + metrics.offset_top;
                }
            }
            Some(NodeData::Element(_)) => {
                for child in dom.children(node) {
                    self.lay_out(dom, *child, flow, height);
                }
            }
            None => {}
        }
    }
}

impl LayoutMetrics for BlockLayout {
    fn metrics(&self, dom: &Dom, node: NodeHandle) -> Option<BoxMetrics> {
        match dom.get(node)? {
            NodeData::Text(_) => {
                let height = self.content_height(dom, node);
                Some(BoxMetrics {
                    scroll_height: height,
                    offset_height: height,
                    client_height: height,
                    offset_top: 0,
                })
            }
            NodeData::Element(element) if element.name == "br" => None,
            NodeData::Element(element) => {
                let content = self.content_height(dom, node);
                let fixed = style_px(element, "height");
                let client_height = fixed.unwrap_or(content);
                Some(BoxMetrics {
                    scroll_height: content.max(client_height),
                    offset_height: client_height,
                    client_height,
                    offset_top: style_px(element, "margin-top").unwrap_or(0),
                })
            }
        }
    }
}

fn is_block(element: &ElementData) -> bool {
    BLOCK_ELEMENTS.contains(&element.name.as_str())
}

/// A pixel value declared for `property` in the element's inline style.
pub(crate) fn style_px(element: &ElementData, property: &str) -> Option<u32> {
    let style = element.get_attr("style")?;
    PX_DECLARATION
        .captures_iter(style)
        .find(|c| c[1].eq_ignore_ascii_case(property))?
        .get(2)?
        .as_str()
        .parse()
        .ok()
}

/// Line breaking state for one block's inline content.
struct LineFlow {
    columns: usize,
    lines: u32,
    width: usize,
    has_content: bool,
    pending_space: bool,
}

impl LineFlow {
    fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
            lines: 0,
            width: 0,
            has_content: false,
            pending_space: false,
        }
    }

    fn push_text(&mut self, text: &str) {
        for grapheme in text.graphemes(true) {
            self.push_grapheme(grapheme);
        }
    }

    fn push_grapheme(&mut self, grapheme: &str) {
        if is_collapsible_whitespace(grapheme) {
            // Collapses into one space, and disappears at the start of a
            // line.
            if self.width > 0 {
                self.pending_space = true;
            }
            return;
        }
        if self.pending_space {
            self.width += 1;
            self.pending_space = false;
        }
        if self.width >= self.columns {
            self.lines += 1;
            self.width = 0;
        }
        self.width += 1;
        self.has_content = true;
    }

    fn line_break(&mut self) {
        self.lines += 1;
        self.width = 0;
        self.has_content = false;
        self.pending_space = false;
    }

    /// Number of lines used, resetting the flow for the next run of inline
    /// content.
    fn finish(&mut self) -> u32 {
        let lines = self.lines + u32::from(self.has_content);
        self.lines = 0;
        self.width = 0;
        self.has_content = false;
        self.pending_space = false;
        lines
    }
}

fn is_collapsible_whitespace(grapheme: &str) -> bool {
    grapheme
        .chars()
        .all(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}'))
}

#[cfg(test)]
mod test {
    use super::*;

    fn root_metrics(html: &str, layout: &BlockLayout) -> BoxMetrics {
        let dom = Dom::from_html(html);
        let child = dom.children(dom.root())[0];
        layout.metrics(&dom, child).unwrap()
    }

    #[test]
    fn bare_line_break_has_no_box() {
        let dom = Dom::from_html("<br>");
        let br = dom.children(dom.root())[0];
        assert_eq!(BlockLayout::default().metrics(&dom, br), None);
    }

    #[test]
    fn short_text_takes_one_line() {
        let metrics = root_metrics("<div>hello</div>", &BlockLayout::default());
        assert_eq!(metrics.offset_height, 20);
        assert_eq!(metrics.scroll_height, 20);
        assert_eq!(metrics.offset_top, 0);
    }

    #[test]
    fn long_text_wraps_at_the_column_limit() {
        let layout = BlockLayout::new(20, 10);
        let metrics =
            root_metrics(&format!("<div>{}</div>", "x".repeat(25)), &layout);
        assert_eq!(metrics.offset_height, 60);
    }

    #[test]
    fn whitespace_only_text_has_no_lines_but_nbsp_does() {
        let layout = BlockLayout::default();
        assert_eq!(root_metrics("<div>   </div>", &layout).offset_height, 0);
        assert_eq!(
            root_metrics("<div>  \u{a0}</div>", &layout).offset_height,
            20
        );
    }

    #[test]
    fn line_breaks_end_lines_even_when_empty() {
        let layout = BlockLayout::default();
        assert_eq!(root_metrics("<div><br></div>", &layout).offset_height, 20);
        assert_eq!(
            root_metrics("<div>a<br>b</div>", &layout).offset_height,
            40
        );
        assert_eq!(
            root_metrics("<div><br><br>\u{a0}</div>", &layout).offset_height,
            60
        );
    }

    #[test]
    fn nested_blocks_stack() {
        let metrics = root_metrics(
            "<div>a<p>b</p><p style=\"margin-top: 5px\">c</p>d</div>",
            &BlockLayout::default(),
        );
        assert_eq!(metrics.offset_height, 20 + 20 + 5 + 20 + 20);
    }

    #[test]
    fn inline_elements_flow_with_their_text() {
        let layout = BlockLayout::new(20, 4);
        let metrics = root_metrics("<div>ab<b>cd</b>ef</div>", &layout);
        assert_eq!(metrics.offset_height, 40);
    }

    #[test]
    fn fixed_height_overflows_into_scroll_height() {
        let metrics = root_metrics(
            "<div style=\"height: 10px\">a<br>b<br>c</div>",
            &BlockLayout::default(),
        );
        assert_eq!(metrics.offset_height, 10);
        assert_eq!(metrics.client_height, 10);
        assert_eq!(metrics.scroll_height, 60);
    }

    #[test]
    fn line_height_style_is_not_read_as_height() {
        let element = {
            let mut element = ElementData::new("div");
            element.set_attr("style", "line-height: 30px; height: 7px");
            element
        };
        assert_eq!(style_px(&element, "height"), Some(7));
        assert_eq!(style_px(&element, "line-height"), Some(30));
        assert_eq!(style_px(&element, "margin-top"), None);
    }

    #[test]
    fn pixel_values_are_found_among_other_declarations() {
        let mut element = ElementData::new("p");
        element.set_attr(
            "style",
            "color: red; MARGIN-TOP: 4px;height:12px; width: 50%",
        );
        assert_eq!(style_px(&element, "margin-top"), Some(4));
        assert_eq!(style_px(&element, "height"), Some(12));
        assert_eq!(style_px(&element, "width"), None);
        assert_eq!(style_px(&element, "color"), None);
    }
}
