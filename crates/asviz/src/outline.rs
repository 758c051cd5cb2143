// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Segment, path and topology formatter.
//!
//! Builds the nested outline shown by the CLI and the web page. Renderers in
//! [`crate::render`] turn it into indented text or a nested HTML list.

use crate::model::{
    AnnouncedPath, AsMarking, AsTopology, InterfaceDescriptor, LinkType, PathSegment,
    SegmentKind, ServerKind, TopologyNode,
};
use chrono::DateTime;
use serde::Serialize;

/// Marks a top-level outline block as a selectable segment or path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockTag {
    /// `CORE`, `DOWN`, `UP` or `PATH`.
    pub kind: &'static str,
    /// 0-based position within its kind.
    pub index: usize,
    pub color: &'static str,
}

/// One line of the outline and everything nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<BlockTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tag: None,
            children: Vec::new(),
        }
    }

    pub fn branch(label: impl Into<String>, children: Vec<OutlineNode>) -> Self {
        Self {
            label: label.into(),
            tag: None,
            children,
        }
    }

    fn tagged(mut self, tag: BlockTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Labels of the direct children.
    pub fn child_labels(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.label.as_str()).collect()
    }

    /// First direct child whose label starts with `prefix`.
    pub fn find(&self, prefix: &str) -> Option<&OutlineNode> {
        self.children.iter().find(|c| c.label.starts_with(prefix))
    }
}

fn segment_color(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Core => "purple",
        SegmentKind::Down => "red",
        SegmentKind::Up => "green",
    }
}

fn timestamp(secs: u64) -> String {
    match i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
    {
        Some(t) => format!("{} ({})", t.format("%Y-%m-%d %H:%M:%S UTC"), secs),
        None => secs.to_string(),
    }
}

// ============================================================================
// Segments
// ============================================================================

/// Hop lines of a segment, `"<isd-as> (<ifid>)"`, in display order.
pub fn segment_hop_lines(seg: &PathSegment) -> Vec<String> {
    seg.display_interfaces()
        .iter()
        .map(|i| i.to_string())
        .collect()
}

/// Block for the `index`-th (0-based) segment of its kind.
pub fn segment_outline(index: usize, seg: &PathSegment) -> OutlineNode {
    let hops = segment_hop_lines(seg)
        .into_iter()
        .map(OutlineNode::leaf)
        .collect();

    let mut children = vec![
        OutlineNode::leaf(format!("Creation Time: {}", timestamp(seg.created))),
        OutlineNode::leaf(format!("Expiration Time: {}", timestamp(seg.expires))),
        OutlineNode::leaf(format!("Hops: {}", seg.hop_count())),
        OutlineNode::branch(format!("Interfaces Len: {}", seg.interfaces.len()), hops),
    ];
    children.extend(
        seg.markings
            .iter()
            .enumerate()
            .map(|(i, m)| marking_outline(i, m)),
    );

    OutlineNode::branch(format!("{} SEGMENT {}", seg.kind, index + 1), children).tagged(BlockTag {
        kind: seg.kind.as_str(),
        index,
        color: segment_color(seg.kind),
    })
}

fn marking_outline(index: usize, m: &AsMarking) -> OutlineNode {
    let mut children = vec![
        OutlineNode::leaf(format!("AS: {}", m.isd_as)),
        OutlineNode::leaf(format!("TRC: v{}", m.trc_version)),
        OutlineNode::leaf(format!("Cert: v{}", m.cert_version)),
        OutlineNode::leaf(format!("AS MTU: {}", m.mtu)),
    ];
    children.extend(m.pcb_markings.iter().enumerate().map(|(j, p)| {
        OutlineNode::branch(
            format!("PCB Marking Block {}", j + 1),
            vec![
                OutlineNode::leaf(format!("In: {} ({})", p.in_ia, p.in_if)),
                OutlineNode::leaf(format!("Out: {} ({})", p.out_ia, p.out_if)),
            ],
        )
    }));
    OutlineNode::branch(format!("AS Marking Block {}", index + 1), children)
}

/// Blocks for every segment, kinds in CORE, DOWN, UP order whatever the input
/// order, each kind numbered from 1.
pub fn segments_outline(segments: &[PathSegment]) -> Vec<OutlineNode> {
    SegmentKind::DISPLAY_ORDER
        .iter()
        .flat_map(|kind| {
            segments
                .iter()
                .filter(move |s| s.kind == *kind)
                .enumerate()
                .map(|(i, s)| segment_outline(i, s))
        })
        .collect()
}

/// The `n`-th (1-based) segment of `kind`.
pub fn select_segment(segments: &[PathSegment], kind: SegmentKind, n: usize) -> Option<&PathSegment> {
    n.checked_sub(1)
        .and_then(|idx| segments.iter().filter(|s| s.kind == kind).nth(idx))
}

// ============================================================================
// Paths
// ============================================================================

/// Hop lines of a path. Each line names the router address serving the
/// interface when `topo` knows it, and nothing otherwise.
pub fn path_hop_lines(path: &AnnouncedPath, topo: Option<&AsTopology>) -> Vec<String> {
    path.interfaces
        .iter()
        .map(|i| {
            let addr = topo
                .and_then(|t| t.router_for_interface(i.ifid))
                .map(|e| e.addr.to_string())
                .unwrap_or_default();
            if addr.is_empty() {
                i.to_string()
            } else {
                format!("{} {}", i, addr)
            }
        })
        .collect()
}

pub fn path_outline(index: usize, path: &AnnouncedPath, topo: Option<&AsTopology>) -> OutlineNode {
    let hops = path_hop_lines(path, topo)
        .into_iter()
        .map(OutlineNode::leaf)
        .collect();

    let mut children = vec![
        OutlineNode::leaf(format!("MTU: {}", path.mtu)),
        OutlineNode::leaf(format!("Hops: {}", path.hop_count())),
    ];
    if let Some(hop) = path.first_hop {
        children.push(OutlineNode::leaf(format!("First Hop: {}", hop)));
    }
    children.push(OutlineNode::branch(
        format!("Interfaces Len: {}", path.interfaces.len()),
        hops,
    ));

    OutlineNode::branch(format!("PATH {}", index + 1), children).tagged(BlockTag {
        kind: "PATH",
        index,
        color: "black",
    })
}

pub fn paths_outline(paths: &[AnnouncedPath], topo: Option<&AsTopology>) -> Vec<OutlineNode> {
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| path_outline(i, p, topo))
        .collect()
}

// ============================================================================
// Topology
// ============================================================================

pub fn topology_outline(topo: &AsTopology) -> OutlineNode {
    let mut children = vec![
        OutlineNode::leaf(format!("is_core_as: {}", topo.is_core)),
        OutlineNode::leaf(format!("mtu: {}", topo.mtu)),
    ];

    for kind in ServerKind::ALL {
        children.extend(topo.servers(kind).map(element_outline));
    }
    for class in [LinkType::Core, LinkType::Parent, LinkType::Child, LinkType::Peer] {
        children.extend(topo.routers(class).map(element_outline));
    }
    children.extend(topo.zookeepers().map(element_outline));

    OutlineNode::branch(format!("AS TOPOLOGY: {}", topo.isd_as), children)
}

fn element_outline(node: &TopologyNode) -> OutlineNode {
    let endpoint = node.endpoint();
    match node {
        TopologyNode::Server { kind, name, .. } => OutlineNode::branch(
            name.clone(),
            vec![
                OutlineNode::leaf(format!("{} SERVER", kind)),
                OutlineNode::leaf(format!("Address: {}", endpoint.addr)),
                OutlineNode::leaf(format!("Name: {}", name)),
                OutlineNode::leaf(format!("Port: {}", endpoint.port)),
            ],
        ),
        TopologyNode::Router {
            class,
            name,
            interfaces,
            ..
        } => {
            let mut children = vec![
                OutlineNode::leaf(format!("{} BORDER ROUTER", class)),
                OutlineNode::leaf(format!("Address: {}", endpoint.addr)),
                OutlineNode::leaf(format!("Name: {}", name)),
                OutlineNode::leaf(format!("Port: {}", endpoint.port)),
            ];
            children.extend(interfaces.iter().map(interface_outline));
            OutlineNode::branch(name.clone(), children)
        }
        TopologyNode::Zookeeper { name, .. } => {
            OutlineNode::branch(name.clone(), vec![OutlineNode::leaf(endpoint.to_string())])
        }
    }
}

fn interface_outline(i: &InterfaceDescriptor) -> OutlineNode {
    let mut children = Vec::with_capacity(10);
    if let Some(local) = i.local {
        children.push(OutlineNode::leaf(format!("Address: {}", local.addr)));
        children.push(OutlineNode::leaf(format!("Port: {}", local.port)));
    }
    children.extend([
        OutlineNode::leaf(format!("Bandwidth: {}", i.bandwidth)),
        OutlineNode::leaf(format!("Interface ID: {}", i.if_id)),
        OutlineNode::leaf(format!("ISD AS: {}", i.remote_ia)),
        OutlineNode::leaf(format!("Link Type: {}", i.link_type)),
        OutlineNode::leaf(format!("MTU: {}", i.mtu)),
        OutlineNode::leaf(format!("To Address: {}", i.remote.addr)),
        OutlineNode::leaf(format!("To Port: {}", i.remote.port)),
    ]);
    if let Some(remote_if) = i.remote_if_id {
        children.push(OutlineNode::leaf(format!("To Interface ID: {}", remote_if)));
    }
    OutlineNode::branch("INTERFACE", children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ia::IsdAs;
    use crate::model::{HostEndpoint, PathInterface, PcbMarking};
    use std::net::Ipv4Addr;

    fn pi(ia: &str, ifid: u64) -> PathInterface {
        PathInterface::new(ia.parse().unwrap(), ifid)
    }

    fn seg(kind: SegmentKind, interfaces: Vec<PathInterface>) -> PathSegment {
        PathSegment {
            kind,
            created: 1_500_000_000,
            expires: 1_500_021_600,
            interfaces,
            markings: Vec::new(),
        }
    }

    fn hops_of(block: &OutlineNode) -> Vec<&str> {
        block
            .find("Interfaces Len")
            .map(|n| n.child_labels())
            .unwrap_or_default()
    }

    #[test]
    fn core_is_reversed_down_is_not() {
        let xyz = vec![pi("1-11", 1), pi("1-12", 2), pi("1-13", 3)];
        let core = segment_outline(0, &seg(SegmentKind::Core, xyz.clone()));
        assert_eq!(hops_of(&core), vec!["1-13 (3)", "1-12 (2)", "1-11 (1)"]);

        let down = segment_outline(0, &seg(SegmentKind::Down, xyz.clone()));
        assert_eq!(hops_of(&down), vec!["1-11 (1)", "1-12 (2)", "1-13 (3)"]);

        let up = segment_outline(0, &seg(SegmentKind::Up, xyz));
        assert_eq!(hops_of(&up), vec!["1-13 (3)", "1-12 (2)", "1-11 (1)"]);
    }

    #[test]
    fn kinds_follow_fixed_order() {
        let segments = vec![
            seg(SegmentKind::Up, vec![pi("1-18", 5)]),
            seg(SegmentKind::Down, vec![pi("2-26", 1)]),
            seg(SegmentKind::Core, vec![pi("1-19", 6)]),
            seg(SegmentKind::Up, vec![pi("1-18", 7)]),
        ];
        let labels: Vec<String> = segments_outline(&segments)
            .into_iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(
            labels,
            vec!["CORE SEGMENT 1", "DOWN SEGMENT 1", "UP SEGMENT 1", "UP SEGMENT 2"]
        );
    }

    #[test]
    fn hop_count_line_floors() {
        let block = segment_outline(
            0,
            &seg(
                SegmentKind::Down,
                vec![pi("1-1", 1), pi("1-2", 2), pi("1-2", 3), pi("1-3", 4), pi("1-3", 5)],
            ),
        );
        assert!(block.child_labels().contains(&"Hops: 2"));
        assert!(block.child_labels().contains(&"Interfaces Len: 5"));
    }

    #[test]
    fn segment_block_is_tagged_and_dated() {
        let block = segment_outline(2, &seg(SegmentKind::Up, vec![]));
        assert_eq!(block.label, "UP SEGMENT 3");
        let tag = block.tag.unwrap();
        assert_eq!((tag.kind, tag.index, tag.color), ("UP", 2, "green"));
        assert_eq!(
            block.children[1].label,
            "Expiration Time: 2017-07-14 08:40:00 UTC (1500021600)"
        );
    }

    #[test]
    fn markings_are_listed() {
        let mut s = seg(SegmentKind::Core, vec![pi("1-19", 6)]);
        s.markings.push(AsMarking {
            isd_as: IsdAs::new(1, 19),
            trc_version: 3,
            cert_version: 4,
            mtu: 1472,
            pcb_markings: vec![PcbMarking {
                in_ia: IsdAs::new(0, 0),
                in_if: 0,
                out_ia: IsdAs::new(2, 26),
                out_if: 6,
            }],
        });
        let block = segment_outline(0, &s);
        let marking = block.find("AS Marking Block 1").unwrap();
        assert_eq!(
            marking.child_labels()[..4],
            ["AS: 1-19", "TRC: v3", "Cert: v4", "AS MTU: 1472"]
        );
        let pcb = marking.find("PCB Marking Block 1").unwrap();
        assert_eq!(pcb.child_labels(), vec!["In: 0-0 (0)", "Out: 2-26 (6)"]);
    }

    #[test]
    fn path_hops_show_router_or_nothing() {
        let topo = AsTopology {
            isd_as: IsdAs::new(1, 18),
            is_core: false,
            mtu: 1472,
            nodes: vec![TopologyNode::Router {
                class: LinkType::Parent,
                name: "br1-18-1".into(),
                endpoint: HostEndpoint::new(Ipv4Addr::new(127, 1, 18, 2), 30041),
                interfaces: vec![InterfaceDescriptor {
                    if_id: 5,
                    bandwidth: 1000,
                    mtu: 1472,
                    link_type: LinkType::Parent,
                    remote_ia: IsdAs::new(1, 19),
                    remote_if_id: Some(6),
                    local: None,
                    remote: HostEndpoint::new(Ipv4Addr::new(127, 1, 19, 2), 50000),
                }],
            }],
        };
        let path = AnnouncedPath {
            mtu: 1472,
            interfaces: vec![pi("1-18", 5), pi("1-19", 6)],
            first_hop: None,
        };

        assert_eq!(
            path_hop_lines(&path, Some(&topo)),
            vec!["1-18 (5) 127.1.18.2", "1-19 (6)"]
        );
        assert_eq!(path_hop_lines(&path, None), vec!["1-18 (5)", "1-19 (6)"]);

        let block = path_outline(0, &path, Some(&topo));
        assert_eq!(block.label, "PATH 1");
        assert_eq!(block.child_labels()[..2], ["MTU: 1472", "Hops: 1"]);

        let outline = topology_outline(&topo);
        assert_eq!(outline.label, "AS TOPOLOGY: 1-18");
        let router = outline.find("br1-18-1").unwrap();
        assert_eq!(router.children[0].label, "PARENT BORDER ROUTER");
        assert!(router.find("INTERFACE").is_some());
    }

    #[test]
    fn select_is_one_based() {
        let segments = vec![
            seg(SegmentKind::Up, vec![pi("1-18", 5)]),
            seg(SegmentKind::Core, vec![pi("1-19", 6)]),
            seg(SegmentKind::Up, vec![pi("1-18", 7)]),
        ];
        let second_up = select_segment(&segments, SegmentKind::Up, 2).unwrap();
        assert_eq!(second_up.interfaces[0].ifid, 7);
        assert!(select_segment(&segments, SegmentKind::Up, 0).is_none());
        assert!(select_segment(&segments, SegmentKind::Down, 1).is_none());
    }
}
