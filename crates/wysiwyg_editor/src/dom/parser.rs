// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Reading HTML into a [Dom].
//!
//! html5ever does the tokenizing and tree building into a throwaway tree
//! (see `tree_sink`), which is then copied into a [Dom] rooted at a `body`
//! element. Malformed markup is repaired exactly as a browser would repair
//! it, so parsing never fails; the repairs html5ever reports are logged.

mod parsed_node;
mod tree_sink;

use crate::dom::Dom;
use tree_sink::{DomBuilder, ParsedFragment};

/// Parse an HTML fragment into a new [Dom] whose `body` root holds the
/// fragment's top-level nodes.
pub fn parse_fragment(html: &str) -> Dom {
    let ParsedFragment { dom, parse_errors } = DomBuilder::parse(html);
    if !parse_errors.is_empty() {
        log::trace!(
            "Repaired {} problem(s) while parsing HTML: {}",
            parse_errors.len(),
            parse_errors.join("; ")
        );
    }
    dom
}
