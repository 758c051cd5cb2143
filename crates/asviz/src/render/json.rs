// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON renderer.
//!
//! Used for `--format json` on the CLI and for the payloads embedded in the
//! web page.

use serde::Serialize;

/// Render any payload as pretty-printed JSON.
pub fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

/// Render a payload as compact JSON.
pub fn render_compact<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

/// Compact JSON that is safe to drop inside a `<script>` element.
pub fn render_script(value: &impl Serialize) -> String {
    render_compact(value).replace("</", "<\\/")
}
