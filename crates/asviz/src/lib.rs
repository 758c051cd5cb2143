// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SCION AS Topology and Path Viewer
//!
//! Queries the local path-lookup daemon of an AS and renders what it knows:
//! the AS topology, announced end-to-end paths, and the core/up/down path
//! segments they are assembled from.
//!
//! # Features
//!
//! - **Response Decoding**: Typed views over legacy and current daemon record layouts
//! - **Display Graphs**: Node/link graphs with per-link-type deduplication
//! - **Outlines**: Nested per-hop listings rendered as text, HTML or JSON
//! - **Daemon Management**: Socket resolution, bounded auto-launch, LRU connection cache
//! - **File Mode**: Reads generated `topology.json` and trust files instead of a daemon
//!
//! # Example
//!
//! ```rust,ignore
//! use asviz::{Report, ReportRequest, ViewerConfig};
//!
//! let config = ViewerConfig::from_file("asviz.toml")?;
//! let pool = config.build_pool();
//! let src = "1-18".parse()?;
//!
//! let client = pool.client(src, None)?;
//! let request = ReportRequest::full(src, Some("2-26".parse()?), config.max_paths);
//! let report = Report::collect(client.as_ref(), &request);
//! print!("{}", asviz::render::text::render(&report.outline()));
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! socket_dir = "/run/shm/sciond"
//! gen_dir = "gen"
//! connect_retries = 5
//! retry_interval_ms = 1000
//!
//! [launch]
//! program = "bin/sciond"
//! args = ["--api-addr", "{socket}", "--addr", "{addr}", "{conf_dir}"]
//! ```

pub mod config;
pub mod daemon;
pub mod decode;
pub mod error;
pub mod graph;
pub mod ia;
pub mod model;
pub mod outline;
pub mod render;
pub mod report;
pub mod source;

pub use config::{ConfigError, LaunchConfig, ViewerConfig};
pub use daemon::{ConnState, DaemonClient, DaemonPool};
pub use decode::Decoded;
pub use error::{DaemonError, DecodeError, SourceError};
pub use graph::{DisplayGraph, GraphBuilder, LinkKind, NodeRole};
pub use ia::{IsdAs, ParseIaError};
pub use model::{
    AnnouncedPath, AsMarking, AsTopology, HostEndpoint, InterfaceDescriptor, LinkType,
    PathInterface, PathSegment, PcbMarking, SegmentKind, ServerKind, TopologyNode,
};
pub use outline::OutlineNode;
pub use report::{DataMode, PagePayload, Report, ReportRequest};
pub use source::{FileSource, PathSource, TrustKind};
