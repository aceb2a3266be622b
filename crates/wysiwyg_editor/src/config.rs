// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Editor options.
//!
//! [Config] is built once per editor from the defaults below plus the
//! caller's [ConfigOverrides]; anything the caller leaves unset keeps its
//! default. Overrides can be deserialized (camelCase keys) so a page can
//! ship them as JSON; the parser itself can only be set from code.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::sanitize::{ParserRules, RuleParser};
use crate::Parser;

#[derive(Clone)]
pub struct Config {
    /// Set as a class name on the composer's surface and content root.
    pub name: Option<String>,
    /// Whether the composer should adopt the textarea's styles.
    pub style: bool,
    /// Identifier of the toolbar element, None for no toolbar.
    pub toolbar: Option<String>,
    /// Whether typed urls turn into links.
    pub auto_link: bool,
    /// Whether the composer grows and shrinks with its content.
    pub auto_resize: bool,
    pub parser_rules: ParserRules,
    /// Sanitizer run on pasted content and on `get_value(true)`. None
    /// disables sanitizing.
    pub parser: Option<Rc<dyn Parser>>,
    pub composer_class_name: String,
    /// Added to the page body when the composer is supported.
    pub body_class_name: String,
    /// Insert `<br>` for line breaks; false uses `<p>` blocks instead.
    pub use_line_breaks: bool,
    pub stylesheets: Vec<String>,
    /// Defaults to the textarea's own placeholder.
    pub placeholder_text: Option<String>,
    pub support_touch_devices: bool,
    /// Whether senseless `<span>`s are unwrapped while parsing.
    pub clean_up: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            style: true,
            toolbar: None,
            auto_link: true,
            auto_resize: true,
            parser_rules: ParserRules::default(),
            parser: Some(Rc::new(RuleParser)),
            composer_class_name: String::from("wysihtml5-editor"),
            body_class_name: String::from("wysihtml5-supported"),
            use_line_breaks: true,
            stylesheets: Vec::new(),
            placeholder_text: None,
            support_touch_devices: true,
            clean_up: true,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("name", &self.name)
            .field("style", &self.style)
            .field("toolbar", &self.toolbar)
            .field("auto_link", &self.auto_link)
            .field("auto_resize", &self.auto_resize)
            .field("parser_rules", &self.parser_rules)
            .field("parser", &self.parser.as_ref().map(|_| "<parser>"))
            .field("composer_class_name", &self.composer_class_name)
            .field("body_class_name", &self.body_class_name)
            .field("use_line_breaks", &self.use_line_breaks)
            .field("stylesheets", &self.stylesheets)
            .field("placeholder_text", &self.placeholder_text)
            .field("support_touch_devices", &self.support_touch_devices)
            .field("clean_up", &self.clean_up)
            .finish()
    }
}

impl Config {
    /// Defaults merged with `overrides`. `element_placeholder` is used when
    /// no placeholder text is given.
    pub fn merged(
        overrides: ConfigOverrides,
        element_placeholder: Option<&str>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            name: overrides.name.or(defaults.name),
            style: overrides.style.unwrap_or(defaults.style),
            toolbar: overrides.toolbar.or(defaults.toolbar),
            auto_link: overrides.auto_link.unwrap_or(defaults.auto_link),
            auto_resize: overrides.auto_resize.unwrap_or(defaults.auto_resize),
            parser_rules: overrides
                .parser_rules
                .unwrap_or(defaults.parser_rules),
            parser: overrides.parser.unwrap_or(defaults.parser),
            composer_class_name: overrides
                .composer_class_name
                .unwrap_or(defaults.composer_class_name),
            body_class_name: overrides
                .body_class_name
                .unwrap_or(defaults.body_class_name),
            use_line_breaks: overrides
                .use_line_breaks
                .unwrap_or(defaults.use_line_breaks),
            stylesheets: overrides
                .stylesheets
                .map(Vec::from)
                .unwrap_or(defaults.stylesheets),
            placeholder_text: overrides
                .placeholder_text
                .or_else(|| element_placeholder.map(str::to_owned)),
            support_touch_devices: overrides
                .support_touch_devices
                .unwrap_or(defaults.support_touch_devices),
            clean_up: overrides.clean_up.unwrap_or(defaults.clean_up),
        }
    }
}

/// Caller-supplied options. Every field left as None keeps its default.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverrides {
    pub name: Option<String>,
    pub style: Option<bool>,
    pub toolbar: Option<String>,
    pub auto_link: Option<bool>,
    pub auto_resize: Option<bool>,
    pub parser_rules: Option<ParserRules>,
    /// `Some(None)` switches sanitizing off.
    #[serde(skip)]
    pub parser: Option<Option<Rc<dyn Parser>>>,
    pub composer_class_name: Option<String>,
    pub body_class_name: Option<String>,
    pub use_line_breaks: Option<bool>,
    pub stylesheets: Option<Stylesheets>,
    pub placeholder_text: Option<String>,
    pub support_touch_devices: Option<bool>,
    pub clean_up: Option<bool>,
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("name", &self.name)
            .field("toolbar", &self.toolbar)
            .field("auto_resize", &self.auto_resize)
            .field(
                "parser",
                &self.parser.as_ref().map(|p| p.as_ref().map(|_| "<parser>")),
            )
            .finish_non_exhaustive()
    }
}

/// One stylesheet url or a list of them.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Stylesheets {
    One(String),
    Many(Vec<String>),
}

impl From<Stylesheets> for Vec<String> {
    fn from(stylesheets: Stylesheets) -> Self {
        match stylesheets {
            Stylesheets::One(url) => vec![url],
            Stylesheets::Many(urls) => urls,
        }
    }
}
