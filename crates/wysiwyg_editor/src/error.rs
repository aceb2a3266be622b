// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

/// Failures while constructing an [crate::Editor].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("No textarea with id `{0}` exists on the page")]
    ElementNotFound(String),
}

/// Failures reported by a [crate::Parser]. The editor hands these back to
/// its caller untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("The parser rejected the content: {0}")]
    Rejected(String),
    #[error("There is no loaded content root to parse")]
    NoContentRoot,
}
