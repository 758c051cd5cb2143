// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

mod common;

use asviz::graph::{self, LinkKind};
use asviz::outline::{self, OutlineNode};
use asviz::render;
use asviz::{
    IsdAs, LinkType, PagePayload, PathSource, Report, ReportRequest, SegmentKind, ViewerConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn hop_lines(block: &OutlineNode) -> Vec<String> {
    block
        .find("Interfaces Len")
        .map(|n| n.children.iter().map(|c| c.label.clone()).collect())
        .unwrap_or_default()
}

fn scenario_report() -> (tempfile::TempDir, Report) {
    let dir = tempfile::tempdir().unwrap();
    common::spawn_daemon(&dir.path().join("sd1-18.sock"), common::scenario_handler());

    let config = ViewerConfig {
        socket_dir: dir.path().to_path_buf(),
        query_timeout_ms: 2000,
        ..Default::default()
    };
    let pool = config.build_pool();
    let src: IsdAs = "1-18".parse().unwrap();
    let dst: IsdAs = "2-26".parse().unwrap();

    let client = pool.client(src, None).unwrap();
    let report = Report::collect(client.as_ref(), &ReportRequest::full(src, Some(dst), 5));
    (dir, report)
}

#[test]
fn test_segments_render_per_kind_order() {
    let (_dir, report) = scenario_report();
    assert!(report.errors().is_empty(), "{:?}", report.errors());

    let segments = report.segments();
    let blocks = outline::segments_outline(&segments);
    let labels: Vec<&str> = blocks.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["CORE SEGMENT 1", "UP SEGMENT 1"]);

    assert_eq!(hop_lines(&blocks[0]), vec!["2-26 (9)", "1-19 (6)"]);
    // Up segments are stored egress-first like core segments.
    assert_eq!(hop_lines(&blocks[1]), vec!["1-19 (6)", "1-18 (5)"]);

    let text = render::text::render(&blocks);
    assert!(text.contains("CORE SEGMENT 1\n"));
    assert!(text.contains("    2-26 (9)\n    1-19 (6)\n"));
    assert!(text.contains("AS Marking Block 1"));
}

#[test]
fn test_path_hops_resolve_routers() {
    let (_dir, report) = scenario_report();
    let blocks = outline::paths_outline(report.paths(), report.topology());
    assert_eq!(blocks.len(), 1);
    assert_eq!(
        hop_lines(&blocks[0]),
        vec!["1-18 (5) 127.1.18.2", "1-19 (6)", "1-19 (7)", "2-26 (9)"]
    );
    assert!(blocks[0].child_labels().contains(&"Hops: 2"));
    assert!(blocks[0].child_labels().contains(&"First Hop: 127.1.18.2:30041"));
}

#[test]
fn test_graphs_follow_node_and_link_rules() {
    let (_dir, report) = scenario_report();

    let topo = report.topology().unwrap();
    let topo_graph = graph::topology_graph(topo);
    // Root + four elements + one router interface.
    assert_eq!(topo_graph.nodes.len(), 6);
    assert_eq!(topo_graph.links_of(LinkKind::Internal).count(), 4);
    assert_eq!(
        topo_graph
            .links_of(LinkKind::External(LinkType::Parent))
            .count(),
        1
    );

    let path_graph = graph::path_graph(&report.segments(), report.paths());
    assert_eq!(path_graph.links_of(LinkKind::Segment(LinkType::Parent)).count(), 1);
    assert_eq!(path_graph.links_of(LinkKind::Segment(LinkType::Core)).count(), 1);
    // The announced path adds its own link type for both AS pairs.
    assert_eq!(path_graph.links_of(LinkKind::Segment(LinkType::Child)).count(), 2);
    assert_eq!(path_graph.nodes.len(), 3);
}

#[test]
fn test_page_payload_embeds_everything() {
    let (_dir, report) = scenario_report();
    let page = PagePayload::from_report(&report);
    assert_eq!(page.error, None);
    assert_eq!(page.topology["nodes"][0]["name"], "1-18");
    assert_eq!(
        page.segments["core_segments"]["if_lists"][0][0]["IFID"],
        serde_json::json!(9)
    );
    assert!(page.outline_html.contains("seg-type='UP'"));
    assert!(page.outline_html.contains("AS TOPOLOGY: 1-18"));
}

#[test]
fn test_select_nth_segment() {
    let (_dir, report) = scenario_report();
    let segments = report.segments();
    let core = outline::select_segment(&segments, SegmentKind::Core, 1).unwrap();
    assert_eq!(core.interfaces.len(), 2);
    assert!(outline::select_segment(&segments, SegmentKind::Down, 1).is_none());
    assert!(outline::select_segment(&segments, SegmentKind::Up, 2).is_none());
}

#[test]
fn test_rejected_paths_query_keeps_other_sections() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = common::scenario_handler();
    common::spawn_daemon(
        &dir.path().join("sd1-18.sock"),
        Arc::new(move |cmd: u8, payload: &serde_json::Value| match cmd {
            0x02 => (2, serde_json::json!({"error": "no path to 2-26"})),
            _ => scenario(cmd, payload),
        }),
    );

    let pool = ViewerConfig {
        socket_dir: dir.path().to_path_buf(),
        auto_launch: false,
        ..Default::default()
    }
    .build_pool();
    let src = IsdAs::new(1, 18);
    let client = pool.client(src, None).unwrap();
    let report = Report::collect(
        client.as_ref(),
        &ReportRequest::full(src, Some(IsdAs::new(2, 26)), 5),
    );

    let errors = report.errors();
    assert_eq!(errors.len(), 1, "{:?}", errors);
    assert!(errors[0].starts_with("paths:"));
    assert!(errors[0].contains("no path to 2-26"));

    assert_eq!(report.topology().map(|t| t.nodes.len()), Some(4));
    assert!(report.paths().is_empty());
    let segments = report.segments();
    assert_eq!(segments.len(), 2);
    assert!(segments.iter().any(|s| s.kind == SegmentKind::Up));
    assert!(segments.iter().any(|s| s.kind == SegmentKind::Core));

    assert!(!client.is_failed());
    assert_eq!(pool.state(src), asviz::ConnState::Connected);
}

#[test]
fn test_dropped_connection_is_resolved_again() {
    let dir = tempfile::tempdir().unwrap();
    let hung_up = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&hung_up);
    let accepted = common::spawn_daemon(
        &dir.path().join("sd1-18.sock"),
        Arc::new(move |cmd: u8, _payload: &serde_json::Value| match cmd {
            0x01 if !flag.swap(true, Ordering::SeqCst) => (common::HANG_UP, serde_json::Value::Null),
            _ => (0, common::topology_1_18()),
        }),
    );

    let pool = ViewerConfig {
        socket_dir: dir.path().to_path_buf(),
        auto_launch: false,
        ..Default::default()
    }
    .build_pool();
    let src = IsdAs::new(1, 18);
    let client = pool.client(src, None).unwrap();

    let err = client.topology().unwrap_err();
    assert!(err.invalidates_connection());
    assert!(client.is_failed());
    assert!(pool.contains(src));
    assert_eq!(pool.state(src), asviz::ConnState::Failed);

    let again = pool.client(src, None).unwrap();
    assert!(!Arc::ptr_eq(&client, &again));
    assert_eq!(again.topology().unwrap().value.nodes.len(), 4);
    assert_eq!(pool.state(src), asviz::ConnState::Connected);
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}
