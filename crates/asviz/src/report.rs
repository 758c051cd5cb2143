// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Report assembly.
//!
//! A [`Report`] runs the requested queries against one [`PathSource`] and keeps
//! each section's outcome separately, so a failed query only blanks its own
//! section. [`PagePayload`] turns a report into the data embedded in the web
//! page, with empty placeholders for anything that could not be fetched.

use crate::daemon::DaemonPool;
use crate::decode::Decoded;
use crate::error::SourceError;
use crate::graph::{self, DisplayGraph};
use crate::ia::IsdAs;
use crate::model::{AnnouncedPath, AsTopology, PathSegment, SegmentKind};
use crate::outline::{self, OutlineNode};
use crate::render;
use crate::source::{FileSource, PathSource};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::warn;

/// Backend selected by the web `data` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// Live path daemon (`sdapi`).
    #[default]
    #[serde(rename = "sdapi")]
    Daemon,
    /// Generated topology files (`file`).
    File,
}

impl FromStr for DataMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sdapi" => Ok(Self::Daemon),
            "file" => Ok(Self::File),
            _ => Err(format!("unknown data source '{}' (expected sdapi or file)", s)),
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daemon => "sdapi",
            Self::File => "file",
        })
    }
}

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub src: IsdAs,
    pub dst: Option<IsdAs>,
    pub topology: bool,
    pub paths: bool,
    pub segments: bool,
    pub max_paths: usize,
}

impl ReportRequest {
    /// Every section the source and destination allow.
    pub fn full(src: IsdAs, dst: Option<IsdAs>, max_paths: usize) -> Self {
        Self {
            src,
            dst,
            topology: true,
            paths: true,
            segments: true,
            max_paths,
        }
    }
}

pub type Section<T> = Result<Decoded<T>, SourceError>;

/// Outcome of one report run.
#[derive(Debug)]
pub struct Report {
    pub src: IsdAs,
    pub dst: Option<IsdAs>,
    pub topology: Option<Section<AsTopology>>,
    pub paths: Option<Section<Vec<AnnouncedPath>>>,
    /// One entry per kind, in CORE, DOWN, UP order.
    pub segments: Vec<(SegmentKind, Section<Vec<PathSegment>>)>,
}

impl Report {
    /// Run every requested query in order. Paths and segments need a
    /// destination and are skipped without one.
    pub fn collect(source: &dyn PathSource, request: &ReportRequest) -> Self {
        let topology = request.topology.then(|| logged("topology", source.topology()));

        let paths = match request.dst {
            Some(dst) if request.paths => {
                Some(logged("paths", source.paths(dst, request.max_paths)))
            }
            _ => None,
        };

        let segments = if request.segments && request.dst.is_some() {
            SegmentKind::DISPLAY_ORDER
                .iter()
                .map(|kind| (*kind, logged("segments", source.segments(*kind))))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            src: request.src,
            dst: request.dst,
            topology,
            paths,
            segments,
        }
    }

    /// Report whose every requested section failed before any query ran,
    /// e.g. because the daemon could not be reached.
    pub fn unreachable(request: &ReportRequest, err: impl Fn() -> SourceError) -> Self {
        let has_dst = request.dst.is_some();
        Self {
            src: request.src,
            dst: request.dst,
            topology: request.topology.then(|| Err(err())),
            paths: (request.paths && has_dst).then(|| Err(err())),
            segments: if request.segments && has_dst {
                SegmentKind::DISPLAY_ORDER
                    .iter()
                    .map(|kind| (*kind, Err(err())))
                    .collect()
            } else {
                Vec::new()
            },
        }
    }

    /// Fetch a report from the daemon of `request.src` or, in file mode,
    /// from its generated configuration directory. A daemon that cannot be
    /// reached fails every requested section with the same error.
    pub fn fetch(
        pool: &DaemonPool,
        mode: DataMode,
        request: &ReportRequest,
        addr: Option<Ipv4Addr>,
    ) -> Self {
        match mode {
            DataMode::File => {
                let source = FileSource::for_ia(&pool.settings().gen_dir, request.src);
                Self::collect(&source, request)
            }
            DataMode::Daemon => match pool.client(request.src, addr) {
                Ok(client) => Self::collect(client.as_ref(), request),
                Err(e) => {
                    warn!("{}", e);
                    Self::unreachable(request, || SourceError::from(e.clone()))
                }
            },
        }
    }

    pub fn topology(&self) -> Option<&AsTopology> {
        match &self.topology {
            Some(Ok(t)) => Some(&t.value),
            _ => None,
        }
    }

    pub fn paths(&self) -> &[AnnouncedPath] {
        match &self.paths {
            Some(Ok(p)) => &p.value,
            _ => &[],
        }
    }

    /// Segments of every kind that was fetched successfully.
    pub fn segments(&self) -> Vec<PathSegment> {
        self.segments
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .flat_map(|d| d.value.iter().cloned())
            .collect()
    }

    fn segments_fetched(&self) -> bool {
        self.segments.iter().any(|(_, r)| r.is_ok())
    }

    /// Messages of every failed section, in section order.
    pub fn errors(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(Err(e)) = &self.topology {
            out.push(format!("topology: {}", e));
        }
        if let Some(Err(e)) = &self.paths {
            out.push(format!("paths: {}", e));
        }
        for (kind, result) in &self.segments {
            if let Err(e) = result {
                out.push(format!("{} segments: {}", kind.wire_name(), e));
            }
        }
        out
    }

    /// Elements dropped while decoding, across all sections.
    pub fn skipped(&self) -> usize {
        let topo = match &self.topology {
            Some(Ok(t)) => t.skipped.len(),
            _ => 0,
        };
        let paths = match &self.paths {
            Some(Ok(p)) => p.skipped.len(),
            _ => 0,
        };
        let segs: usize = self
            .segments
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|d| d.skipped.len())
            .sum();
        topo + paths + segs
    }

    /// Outline blocks for the topology, paths and segments that were fetched.
    pub fn outline(&self) -> Vec<OutlineNode> {
        let mut blocks = Vec::new();
        if let Some(topo) = self.topology() {
            blocks.push(outline::topology_outline(topo));
        }
        blocks.extend(outline::paths_outline(self.paths(), self.topology()));
        blocks.extend(outline::segments_outline(&self.segments()));
        blocks
    }

    /// Machine-readable form used by `--format json` and the JSON API.
    pub fn to_json(&self) -> Value {
        let mut segments = serde_json::Map::new();
        for (kind, result) in &self.segments {
            segments.insert(kind.wire_name().to_string(), section_json(Some(result)));
        }

        json!({
            "src": self.src,
            "dst": self.dst,
            "topology": section_json(self.topology.as_ref()),
            "paths": section_json(self.paths.as_ref()),
            "segments": segments,
        })
    }
}

fn section_json<T: Serialize>(section: Option<&Section<T>>) -> Value {
    match section {
        None => Value::Null,
        Some(Ok(d)) => json!({
            "value": d.value,
            "skipped": d.skipped.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        }),
        Some(Err(e)) => json!({ "error": e.to_string() }),
    }
}

fn logged<T>(query: &str, result: Section<T>) -> Section<T> {
    if let Err(e) = &result {
        warn!("{} query failed: {}", query, e);
    }
    result
}

// ============================================================================
// Web page payload
// ============================================================================

/// Data embedded in the web page.
///
/// Every field is always valid JSON: sections that failed or were not
/// requested carry an empty placeholder and `error` says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePayload {
    /// Topology graph, `{"nodes": [], "links": []}` when unavailable.
    pub topology: Value,
    /// Segment and path link graph, `{}` when unavailable.
    pub paths: Value,
    /// Raw per-kind segment listing, `{}` when unavailable.
    pub segments: Value,
    /// Pre-rendered nested list.
    pub outline_html: String,
    pub error: Option<String>,
}

impl PagePayload {
    pub fn from_report(report: &Report) -> Self {
        let topology = report
            .topology()
            .map(|t| graph_value(&graph::topology_graph(t)))
            .unwrap_or_else(empty_graph);

        let segments = report.segments();
        let paths_fetched = matches!(report.paths, Some(Ok(_)));
        let paths = if paths_fetched || report.segments_fetched() {
            graph_value(&graph::path_graph(&segments, report.paths()))
        } else {
            json!({})
        };
        let listing = if report.segments_fetched() {
            graph::segment_listing(&segments)
        } else {
            json!({})
        };

        let errors = report.errors();
        Self {
            topology,
            paths,
            segments: listing,
            outline_html: render::html::render(&report.outline()),
            error: (!errors.is_empty()).then(|| errors.join("; ")),
        }
    }

    /// Page shape for a request that never reached a data source.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            topology: empty_graph(),
            paths: json!({}),
            segments: json!({}),
            outline_html: String::new(),
            error: Some(message.into()),
        }
    }

    /// Nothing requested yet.
    pub fn blank() -> Self {
        Self {
            error: None,
            ..Self::failed("")
        }
    }
}

fn empty_graph() -> Value {
    json!({"links": [], "nodes": []})
}

fn graph_value(graph: &DisplayGraph) -> Value {
    serde_json::to_value(graph).unwrap_or_else(|e| {
        warn!("Failed to serialize graph: {}", e);
        empty_graph()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DaemonError;
    use crate::model::PathInterface;

    struct Canned {
        topology_ok: bool,
    }

    impl PathSource for Canned {
        fn topology(&self) -> Section<AsTopology> {
            if self.topology_ok {
                Ok(Decoded::complete(AsTopology {
                    isd_as: IsdAs::new(1, 18),
                    is_core: false,
                    mtu: 1472,
                    nodes: Vec::new(),
                }))
            } else {
                Err(SourceError::from(DaemonError::Response {
                    query: "topology",
                    status: 1,
                    message: "unknown AS".into(),
                }))
            }
        }

        fn paths(&self, _dst: IsdAs, max_paths: usize) -> Section<Vec<AnnouncedPath>> {
            assert_eq!(max_paths, 3);
            Err(SourceError::Unsupported("Paths"))
        }

        fn segments(&self, kind: SegmentKind) -> Section<Vec<PathSegment>> {
            Ok(Decoded::complete(vec![PathSegment {
                kind,
                created: 1,
                expires: 2,
                interfaces: vec![
                    PathInterface::new(IsdAs::new(1, 18), 1),
                    PathInterface::new(IsdAs::new(1, 19), 2),
                ],
                markings: Vec::new(),
            }]))
        }
    }

    fn request() -> ReportRequest {
        ReportRequest::full(IsdAs::new(1, 18), Some(IsdAs::new(2, 26)), 3)
    }

    #[test]
    fn failed_section_does_not_hide_siblings() {
        let report = Report::collect(&Canned { topology_ok: false }, &request());
        assert!(report.topology().is_none());
        assert!(report.paths().is_empty());
        assert_eq!(report.segments().len(), 3);
        assert_eq!(report.errors().len(), 2);
        assert!(report.errors()[0].contains("unknown AS"));

        let page = PagePayload::from_report(&report);
        assert_eq!(page.topology, json!({"links": [], "nodes": []}));
        assert!(page.segments.get("core_segments").is_some());
        assert_eq!(page.paths["links"].as_array().map(Vec::len), Some(2));
        assert!(page.outline_html.contains("CORE SEGMENT 1"));
        assert!(page.error.is_some());
    }

    #[test]
    fn no_destination_means_topology_only() {
        let mut req = request();
        req.dst = None;
        let report = Report::collect(&Canned { topology_ok: true }, &req);
        assert!(report.topology().is_some());
        assert!(report.paths.is_none());
        assert!(report.segments.is_empty());
        assert!(report.errors().is_empty());

        let page = PagePayload::from_report(&report);
        assert_eq!(page.paths, json!({}));
        assert_eq!(page.segments, json!({}));
        assert_eq!(page.error, None);
        assert_eq!(page.topology["nodes"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn unreachable_daemon_blanks_everything() {
        let report = Report::unreachable(&request(), || {
            SourceError::from(DaemonError::Timeout {
                query: "topology",
                timeout_ms: 10,
            })
        });
        assert_eq!(report.errors().len(), 5);
        let json = report.to_json();
        assert!(json["topology"]["error"].is_string());
        assert!(json["segments"]["down"]["error"].is_string());

        let page = PagePayload::from_report(&report);
        assert_eq!(page.paths, json!({}));
        assert_eq!(page.segments, json!({}));
    }

    #[test]
    fn fetch_without_daemon_reports_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::config::ViewerConfig {
            socket_dir: dir.path().to_path_buf(),
            auto_launch: false,
            ..Default::default()
        }
        .build_pool();

        let report = Report::fetch(&pool, DataMode::Daemon, &request(), None);
        let errors = report.errors();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().all(|e| e.contains("Cannot reach path daemon for 1-18")));
    }

    #[test]
    fn data_mode_tokens() {
        assert_eq!("sdapi".parse::<DataMode>(), Ok(DataMode::Daemon));
        assert_eq!("file".parse::<DataMode>(), Ok(DataMode::File));
        assert!("grpc".parse::<DataMode>().is_err());
        assert_eq!(DataMode::default().to_string(), "sdapi");
    }
}
