// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Display graph construction.
//!
//! Topology elements become nodes hanging off a root AS node; path segments and
//! announced paths become AS-to-AS links. Output order follows input order.

use crate::ia::IsdAs;
use crate::model::{
    AnnouncedPath, AsTopology, InterfaceDescriptor, LinkType, PathInterface, PathSegment,
    SegmentKind, TopologyNode,
};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Link type used for announced paths whose segments are unknown.
pub const PATH_LINK_TYPE: LinkType = LinkType::Child;

// ============================================================================
// Graph Types
// ============================================================================

/// Graph handed to the browser-side renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl DisplayGraph {
    /// Empty placeholder payload, `{"nodes": [], "links": []}`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &GraphLink> {
        self.links.iter().filter(move |l| l.kind == kind)
    }
}

/// Role of a node in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// The AS whose topology is shown.
    Root,
    Server,
    Router,
    /// Far end of a border-router interface.
    Interface,
    /// AS seen on a path or segment.
    As,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub name: String,
    #[serde(rename = "type")]
    pub role: NodeRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceDescriptor>,
}

impl GraphNode {
    fn bare(name: String, role: NodeRole) -> Self {
        Self {
            name,
            role,
            class: None,
            addr: None,
            port: None,
            interfaces: Vec::new(),
        }
    }
}

/// Kind of a graph link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Root AS to one of its own elements (`as-in`).
    Internal,
    /// Border router to a neighbour AS (`as-core`, `as-parent`, ...).
    External(LinkType),
    /// Consecutive ASes on a segment or path (`CORE`, `PARENT`, ...).
    Segment(LinkType),
}

impl LinkKind {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Internal => "as-in",
            Self::External(t) => t.as_token(),
            Self::Segment(t) => t.as_str(),
        }
    }
}

impl Serialize for LinkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

// ============================================================================
// Graph Construction
// ============================================================================

/// Incrementally folds topologies, segments and paths into one graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DisplayGraph,
    as_nodes: HashSet<String>,
    seen_links: HashSet<(LinkType, IsdAs, IsdAs)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One node plus one `as-in` link per element; routers additionally get one
    /// interface node and one external link per interface.
    pub fn add_topology(&mut self, topo: &AsTopology) -> &mut Self {
        let root = topo.isd_as.to_string();
        self.as_nodes.insert(root.clone());
        self.graph
            .nodes
            .push(GraphNode::bare(root.clone(), NodeRole::Root));

        for element in &topo.nodes {
            self.graph.nodes.push(element_node(element));
            self.graph.links.push(GraphLink {
                source: root.clone(),
                target: element.name().to_string(),
                kind: LinkKind::Internal,
            });

            for iface in element.interfaces() {
                self.graph.nodes.push(GraphNode {
                    class: Some("ISD-AS".into()),
                    addr: Some(iface.remote.addr.to_string()),
                    port: Some(iface.remote.port),
                    ..GraphNode::bare(iface.remote_ia.to_string(), NodeRole::Interface)
                });
                self.graph.links.push(GraphLink {
                    source: element.name().to_string(),
                    target: iface.remote_ia.to_string(),
                    kind: LinkKind::External(iface.link_type),
                });
            }
        }
        self
    }

    /// Links between consecutive ASes of each segment, typed by segment kind.
    pub fn add_segments(&mut self, segments: &[PathSegment]) -> &mut Self {
        for seg in segments {
            self.add_chain(&seg.interfaces, seg.kind.link_type());
        }
        self
    }

    /// Links between consecutive ASes of each announced path.
    pub fn add_paths(&mut self, paths: &[AnnouncedPath]) -> &mut Self {
        for path in paths {
            self.add_chain(&path.interfaces, PATH_LINK_TYPE);
        }
        self
    }

    pub fn build(self) -> DisplayGraph {
        self.graph
    }

    fn add_chain(&mut self, interfaces: &[PathInterface], link_type: LinkType) {
        for pair in interfaces.windows(2) {
            let (a, b) = (pair[0].isd_as, pair[1].isd_as);
            // Ingress and egress of the same AS.
            if a == b {
                continue;
            }
            self.ensure_as_node(a);
            self.ensure_as_node(b);

            let key = if a <= b {
                (link_type, a, b)
            } else {
                (link_type, b, a)
            };
            if self.seen_links.insert(key) {
                self.graph.links.push(GraphLink {
                    source: a.to_string(),
                    target: b.to_string(),
                    kind: LinkKind::Segment(link_type),
                });
            }
        }
    }

    fn ensure_as_node(&mut self, ia: IsdAs) {
        let name = ia.to_string();
        if self.as_nodes.insert(name.clone()) {
            self.graph.nodes.push(GraphNode::bare(name, NodeRole::As));
        }
    }
}

fn element_node(element: &TopologyNode) -> GraphNode {
    let endpoint = element.endpoint();
    let (role, class, interfaces) = match element {
        TopologyNode::Server { kind, .. } => (NodeRole::Server, kind.as_str().to_string(), Vec::new()),
        TopologyNode::Router {
            class, interfaces, ..
        } => (
            NodeRole::Router,
            format!("{} BORDER", class),
            interfaces.clone(),
        ),
        TopologyNode::Zookeeper { .. } => (NodeRole::Server, "ZOOKEEPER".to_string(), Vec::new()),
    };

    GraphNode {
        name: element.name().to_string(),
        role,
        class: Some(class),
        addr: Some(endpoint.addr.to_string()),
        port: Some(endpoint.port),
        interfaces,
    }
}

/// Graph of one AS topology.
pub fn topology_graph(topo: &AsTopology) -> DisplayGraph {
    let mut builder = GraphBuilder::new();
    builder.add_topology(topo);
    builder.build()
}

/// AS-level graph of segments and announced paths.
pub fn path_graph(segments: &[PathSegment], paths: &[AnnouncedPath]) -> DisplayGraph {
    let mut builder = GraphBuilder::new();
    builder.add_segments(segments).add_paths(paths);
    builder.build()
}

// ============================================================================
// Listings
// ============================================================================

/// Per-kind interface lists: `{"core_segments": {"if_lists": [[{ISD, AS, IFID}]]}, ...}`.
pub fn segment_listing(segments: &[PathSegment]) -> Value {
    let mut out = Map::new();
    for kind in [SegmentKind::Core, SegmentKind::Up, SegmentKind::Down] {
        let lists: Vec<Value> = segments
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| {
                Value::Array(
                    s.display_interfaces()
                        .iter()
                        .map(|i| json!({"ISD": i.isd_as.isd, "AS": i.isd_as.asn, "IFID": i.ifid}))
                        .collect(),
                )
            })
            .collect();
        out.insert(
            format!("{}_segments", kind.wire_name()),
            json!({ "if_lists": lists }),
        );
    }
    Value::Object(out)
}

/// Consecutive AS pair on an announced path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathLink {
    pub a: String,
    pub b: String,
    pub al: u64,
    pub bl: u64,
    pub ltype: LinkType,
}

/// Flat AS pair list for every announced path, same-AS pairs omitted.
pub fn path_links(paths: &[AnnouncedPath]) -> Vec<PathLink> {
    paths
        .iter()
        .flat_map(|p| p.interfaces.windows(2))
        .filter(|pair| pair[0].isd_as != pair[1].isd_as)
        .map(|pair| PathLink {
            a: pair[0].isd_as.to_string(),
            b: pair[1].isd_as.to_string(),
            al: pair[0].ifid,
            bl: pair[1].ifid,
            ltype: PATH_LINK_TYPE,
        })
        .collect()
}
