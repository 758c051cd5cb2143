// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Nested `<ul class='tree'>` renderer for the web page.
//!
//! Top-level blocks carrying a [`BlockTag`](crate::outline::BlockTag) get
//! `seg-type`/`seg-num` attributes so the page script can highlight the
//! matching links in the graph.

use crate::outline::OutlineNode;

/// Render outline blocks as one nested list.
pub fn render(blocks: &[OutlineNode]) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<ul class='tree'>");
    for block in blocks {
        write_item(&mut out, block);
    }
    out.push_str("</ul>");
    out
}

fn write_item(out: &mut String, node: &OutlineNode) {
    match &node.tag {
        Some(tag) => {
            out.push_str(&format!(
                "<li seg-type='{}' seg-num={}><a href='#' style='color:{}; font-weight:bold;'>{}</a>",
                tag.kind,
                tag.index,
                tag.color,
                escape(&node.label)
            ));
        }
        None => {
            out.push_str("<li><a href='#'>");
            out.push_str(&escape(&node.label));
            out.push_str("</a>");
        }
    }
    if !node.children.is_empty() {
        out.push_str("<ul>");
        for child in &node.children {
            write_item(out, child);
        }
        out.push_str("</ul>");
    }
    out.push_str("</li>");
}

/// Minimal HTML text escaping.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
