// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-only views over daemon responses.
//!
//! Everything here is built fresh per request by the decoder and dropped once
//! the response has been rendered.

use crate::ia::IsdAs;
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// IPv4 address + port of a server, router or interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct HostEndpoint {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl HostEndpoint {
    pub const fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl fmt::Display for HostEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

/// Relationship of an inter-AS link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    Core,
    Parent,
    Child,
    Peer,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Parent => "PARENT",
            Self::Child => "CHILD",
            Self::Peer => "PEER",
        }
    }

    /// Lower-case graph token, e.g. `as-parent`.
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Core => "as-core",
            Self::Parent => "as-parent",
            Self::Child => "as-child",
            Self::Peer => "as-peer",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CORE" => Ok(Self::Core),
            "PARENT" => Ok(Self::Parent),
            "CHILD" => Ok(Self::Child),
            "PEER" => Ok(Self::Peer),
            _ => Err(format!("unknown link type '{}'", s)),
        }
    }
}

/// Infrastructure service flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerKind {
    Beacon,
    Certificate,
    Path,
    Sibra,
}

impl ServerKind {
    pub const ALL: [ServerKind; 4] = [Self::Beacon, Self::Certificate, Self::Path, Self::Sibra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beacon => "BEACON",
            Self::Certificate => "CERTIFICATE",
            Self::Path => "PATH",
            Self::Sibra => "SIBRA",
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external interface of a border router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceDescriptor {
    pub if_id: u64,
    pub bandwidth: u64,
    pub mtu: u32,
    pub link_type: LinkType,
    pub remote_ia: IsdAs,
    /// Not every topology layout records the far-end interface id.
    pub remote_if_id: Option<u64>,
    pub local: Option<HostEndpoint>,
    pub remote: HostEndpoint,
}

/// Element of an AS topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum TopologyNode {
    Server {
        kind: ServerKind,
        name: String,
        endpoint: HostEndpoint,
    },
    Router {
        /// Border-router group the router is listed under.
        class: LinkType,
        name: String,
        endpoint: HostEndpoint,
        interfaces: Vec<InterfaceDescriptor>,
    },
    Zookeeper {
        name: String,
        endpoint: HostEndpoint,
    },
}

impl TopologyNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Server { name, .. } | Self::Router { name, .. } | Self::Zookeeper { name, .. } => {
                name
            }
        }
    }

    pub fn endpoint(&self) -> &HostEndpoint {
        match self {
            Self::Server { endpoint, .. }
            | Self::Router { endpoint, .. }
            | Self::Zookeeper { endpoint, .. } => endpoint,
        }
    }

    pub fn interfaces(&self) -> &[InterfaceDescriptor] {
        match self {
            Self::Router { interfaces, .. } => interfaces,
            _ => &[],
        }
    }
}

/// Decoded topology of a single AS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsTopology {
    pub isd_as: IsdAs,
    pub is_core: bool,
    pub mtu: u32,
    pub nodes: Vec<TopologyNode>,
}

impl AsTopology {
    /// Endpoint of the router owning interface `if_id`, if any.
    pub fn router_for_interface(&self, if_id: u64) -> Option<&HostEndpoint> {
        self.nodes.iter().find_map(|node| match node {
            TopologyNode::Router {
                endpoint,
                interfaces,
                ..
            } if interfaces.iter().any(|i| i.if_id == if_id) => Some(endpoint),
            _ => None,
        })
    }

    pub fn servers(&self, kind: ServerKind) -> impl Iterator<Item = &TopologyNode> {
        self.nodes
            .iter()
            .filter(move |n| matches!(n, TopologyNode::Server { kind: k, .. } if *k == kind))
    }

    pub fn routers(&self, class: LinkType) -> impl Iterator<Item = &TopologyNode> {
        self.nodes
            .iter()
            .filter(move |n| matches!(n, TopologyNode::Router { class: c, .. } if *c == class))
    }

    pub fn zookeepers(&self) -> impl Iterator<Item = &TopologyNode> {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TopologyNode::Zookeeper { .. }))
    }
}

/// Segment direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentKind {
    Core,
    Up,
    Down,
}

impl SegmentKind {
    /// Display order used by every renderer.
    pub const DISPLAY_ORDER: [SegmentKind; 3] = [Self::Core, Self::Down, Self::Up];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }

    /// Wire token used in daemon requests.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Core and up segments are stored egress-first and shown reversed.
    pub fn displays_reversed(&self) -> bool {
        matches!(self, Self::Core | Self::Up)
    }

    /// Link type drawn between consecutive ASes of this segment.
    pub fn link_type(&self) -> LinkType {
        match self {
            Self::Core => LinkType::Core,
            Self::Up | Self::Down => LinkType::Parent,
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "core" => Ok(Self::Core),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(format!("unknown segment kind '{}'", s)),
        }
    }
}

/// An (AS, interface) entry of a segment or path interface list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PathInterface {
    pub isd_as: IsdAs,
    pub ifid: u64,
}

impl PathInterface {
    pub const fn new(isd_as: IsdAs, ifid: u64) -> Self {
        Self { isd_as, ifid }
    }
}

impl fmt::Display for PathInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.isd_as, self.ifid)
    }
}

/// Hop entry signed into a beacon by one AS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PcbMarking {
    pub in_ia: IsdAs,
    pub in_if: u64,
    pub out_ia: IsdAs,
    pub out_if: u64,
}

/// Per-AS block of a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsMarking {
    pub isd_as: IsdAs,
    pub trc_version: u64,
    pub cert_version: u64,
    pub mtu: u32,
    pub pcb_markings: Vec<PcbMarking>,
}

/// AS-level hop: (AS, ingress interface, egress interface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hop {
    pub isd_as: IsdAs,
    pub ingress: u64,
    pub egress: u64,
}

/// A core, up or down segment as registered with the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub kind: SegmentKind,
    /// Creation time, seconds since the Unix epoch.
    pub created: u64,
    /// Expiration time, seconds since the Unix epoch. Always after `created`.
    pub expires: u64,
    pub interfaces: Vec<PathInterface>,
    pub markings: Vec<AsMarking>,
}

impl PathSegment {
    /// Ingress+egress pairs, rounded down.
    pub fn hop_count(&self) -> usize {
        hop_count(&self.interfaces)
    }

    /// Interfaces in the order they are shown to users.
    pub fn display_interfaces(&self) -> Vec<PathInterface> {
        let mut out = self.interfaces.clone();
        if self.kind.displays_reversed() {
            out.reverse();
        }
        out
    }

    /// One hop per AS marking, taken from its first PCB marking.
    pub fn hops(&self) -> Vec<Hop> {
        self.markings
            .iter()
            .map(|m| {
                let (ingress, egress) = m
                    .pcb_markings
                    .first()
                    .map(|p| (p.in_if, p.out_if))
                    .unwrap_or((0, 0));
                Hop {
                    isd_as: m.isd_as,
                    ingress,
                    egress,
                }
            })
            .collect()
    }
}

/// End-to-end path announced by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncedPath {
    pub mtu: u32,
    pub interfaces: Vec<PathInterface>,
    pub first_hop: Option<HostEndpoint>,
}

impl AnnouncedPath {
    pub fn hop_count(&self) -> usize {
        hop_count(&self.interfaces)
    }
}

fn hop_count(interfaces: &[PathInterface]) -> usize {
    interfaces.len() / 2
}
