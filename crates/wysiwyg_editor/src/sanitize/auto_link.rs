// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::dom::{Dom, NodeHandle};

static URL_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|ftp://|www\.)[^\s<>"]+"#)
        .expect("valid url pattern")
});

/// Turn urls found in text below `root` into `a` elements. Text that is
/// already inside a link is left alone. Returns how many links were made.
pub fn auto_link(dom: &mut Dom, root: NodeHandle) -> usize {
    let texts: Vec<NodeHandle> = dom
        .descendants(root)
        .into_iter()
        .filter(|node| dom.is_text(*node))
        .filter(|node| dom.ancestor_named(*node, "a").is_none())
        .collect();

    texts.into_iter().map(|text| link_text(dom, text)).sum()
}

fn link_text(dom: &mut Dom, text: NodeHandle) -> usize {
    let Some(content) = dom.text(text).map(str::to_owned) else {
        return 0;
    };
    let (Some(parent), Some(mut index)) =
        (dom.parent(text), dom.index_in_parent(text))
    else {
        return 0;
    };

    let links: Vec<(usize, usize, String)> = URL_CANDIDATE
        .find_iter(&content)
        .filter_map(|m| {
            let candidate = trim_trailing_punctuation(m.as_str());
            href_for(candidate)
                .map(|href| (m.start(), m.start() + candidate.len(), href))
        })
        .collect();
    if links.is_empty() {
        return 0;
    }

    dom.remove(text);
    let mut consumed = 0;
    for (start, end, href) in &links {
        if *start > consumed {
            let before = dom.create_text(&content[consumed..*start]);
            dom.insert_child(parent, index, before);
            index += 1;
        }
        let link = dom.create_element_with_attrs(
            "a",
            vec![(String::from("href"), href.clone())],
        );
        let label = dom.create_text(&content[*start..*end]);
        dom.append_child(link, label);
        dom.insert_child(parent, index, link);
        index += 1;
        consumed = *end;
    }
    if consumed < content.len() {
        let after = dom.create_text(&content[consumed..]);
        dom.insert_child(parent, index, after);
    }
    links.len()
}

fn trim_trailing_punctuation(candidate: &str) -> &str {
    candidate.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\''])
}

fn href_for(candidate: &str) -> Option<String> {
    let absolute = if candidate.to_ascii_lowercase().starts_with("www.") {
        format!("http://{candidate}")
    } else {
        candidate.to_owned()
    };
    let url = Url::parse(&absolute).ok()?;
    url.host_str()?;
    Some(absolute)
}
