// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plain text renderer for terminal output.

use crate::outline::OutlineNode;

const INDENT: &str = "  ";

/// Render outline blocks as an indented tree, one label per line.
pub fn render(blocks: &[OutlineNode]) -> String {
    let mut out = String::with_capacity(1024);
    for block in blocks {
        write_node(&mut out, block, 0);
    }
    out
}

/// Section header followed by a rule, e.g. for `Segments`.
pub fn header(title: &str) -> String {
    format!("{}\n{}\n", title, "=".repeat(title.len().max(10)))
}

fn write_node(out: &mut String, node: &OutlineNode, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(&node.label);
    out.push('\n');
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_indentation() {
        let tree = OutlineNode::branch(
            "UP SEGMENT 1",
            vec![OutlineNode::branch(
                "Interfaces Len: 2",
                vec![OutlineNode::leaf("1-18 (5)"), OutlineNode::leaf("1-19 (6)")],
            )],
        );
        assert_eq!(
            render(&[tree]),
            "UP SEGMENT 1\n  Interfaces Len: 2\n    1-18 (5)\n    1-19 (6)\n"
        );
    }

    #[test]
    fn header_has_rule() {
        assert_eq!(header("Paths"), "Paths\n==========\n");
    }
}
