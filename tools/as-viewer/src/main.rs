// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! as-viewer - Print what the path daemon of an AS knows
//!
//! Shows the AS topology, announced paths towards a destination and the
//! core/up/down segments they are built from.
//!
//! Trust material is dumped with `--trc` / `--crt`; clap has no single-dash
//! multi-letter flags, so the historical `-trc` / `-crt` spellings are not
//! accepted.

use asviz::outline;
use asviz::render::{json, text};
use asviz::source::{read_trust_files, TrustFile, TrustKind};
use asviz::{
    DataMode, FileSource, IsdAs, Report, ReportRequest, SegmentKind, ViewerConfig,
};
use clap::Parser;
use colored::*;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Print SCION AS topology, paths and segments
#[derive(Parser, Debug)]
#[command(name = "as-viewer")]
#[command(version)]
#[command(about = "Print SCION AS topology, announced paths and path segments")]
struct Args {
    /// Source ISD-AS (the AS whose daemon is queried)
    src: IsdAs,

    /// Destination ISD-AS; without it only the topology is available
    dst: Option<IsdAs>,

    /// Display the AS topology
    #[arg(short = 't')]
    topology: bool,

    /// Display announced paths
    #[arg(short = 'p')]
    paths: bool,

    /// Display all segments
    #[arg(short = 's')]
    segments: bool,

    /// Display core segment N in detail (1-based)
    #[arg(short = 'c', value_name = "N")]
    core: Option<usize>,

    /// Display down segment N in detail (1-based)
    #[arg(short = 'd', value_name = "N")]
    down: Option<usize>,

    /// Display up segment N in detail (1-based)
    #[arg(short = 'u', value_name = "N")]
    up: Option<usize>,

    /// Dump TRC files verbatim
    #[arg(long)]
    trc: bool,

    /// Dump certificate chain files verbatim
    #[arg(long)]
    crt: bool,

    /// Daemon bind address (default 127.<isd>.<as>.254)
    #[arg(long)]
    addr: Option<Ipv4Addr>,

    /// Read generated topology files instead of querying the daemon
    #[arg(long)]
    file: bool,

    /// Never start a missing path daemon
    #[arg(long)]
    no_launch: bool,

    /// Directory holding the path daemon sockets
    #[arg(long)]
    socket_dir: Option<PathBuf>,

    /// Root of the generated per-AS configuration tree
    #[arg(long)]
    gen_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Paths to request
    #[arg(long)]
    max_paths: Option<usize>,

    /// Output format: text, json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "t" => Ok(OutputFormat::Text),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl Args {
    fn selections(&self) -> [(SegmentKind, Option<usize>); 3] {
        [
            (SegmentKind::Core, self.core),
            (SegmentKind::Down, self.down),
            (SegmentKind::Up, self.up),
        ]
    }

    /// Nothing asked for explicitly: show topology, paths and segments.
    fn show_all(&self) -> bool {
        !(self.topology
            || self.paths
            || self.segments
            || self.trc
            || self.crt
            || self.selections().iter().any(|(_, n)| n.is_some()))
    }

    fn request(&self, max_paths: usize) -> ReportRequest {
        let all = self.show_all();
        let selected = self.selections().iter().any(|(_, n)| n.is_some());
        ReportRequest {
            src: self.src,
            dst: self.dst,
            topology: all || self.topology || self.paths,
            paths: all || self.paths,
            segments: all || self.segments || selected,
            max_paths,
        }
    }
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<ViewerConfig, asviz::ConfigError> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::from_file(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(dir) = &args.socket_dir {
        config.socket_dir = dir.clone();
    }
    if let Some(dir) = &args.gen_dir {
        config.gen_dir = dir.clone();
    }
    if let Some(n) = args.max_paths {
        config.max_paths = n;
    }
    if args.addr.is_some() {
        config.addr = args.addr;
    }
    if args.no_launch {
        config.auto_launch = false;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let request = args.request(config.max_paths);
    debug!("Request: {:?}", request);
    let mode = if args.file {
        DataMode::File
    } else {
        DataMode::Daemon
    };

    let report = if request.topology || request.paths || request.segments {
        Some(match mode {
            DataMode::File => {
                Report::collect(&FileSource::for_ia(&config.gen_dir, args.src), &request)
            }
            // Unreachable daemon is fatal for the whole invocation.
            DataMode::Daemon => {
                let pool = config.build_pool();
                let client = pool.client(args.src, args.addr)?;
                Report::collect(client.as_ref(), &request)
            }
        })
    } else {
        None
    };

    let conf_dir = args.src.conf_dir(&config.gen_dir);
    let mut trust = Vec::new();
    for (wanted, kind) in [(args.trc, TrustKind::Trc), (args.crt, TrustKind::Certificate)] {
        if wanted {
            trust.push((kind, read_trust_files(&conf_dir, kind).map_err(|e| e.to_string())));
        }
    }

    match args.format {
        OutputFormat::Text => print_text(args, report.as_ref(), &trust),
        OutputFormat::Json => print_json(args, report.as_ref(), &trust),
    }
    Ok(())
}

type TrustDump = (TrustKind, Result<Vec<TrustFile>, String>);

fn section(title: &str) {
    println!();
    println!("{}", text::header(title).cyan().bold());
}

fn print_text(args: &Args, report: Option<&Report>, trust: &[TrustDump]) {
    println!();
    println!("{}", "SCION AS Viewer for path...".bold());
    match args.dst {
        Some(dst) => println!("(src) {} =======================> {} (dst)", args.src, dst),
        None => println!("(src) {}", args.src),
    }

    if let Some(report) = report {
        let all = args.show_all();
        for err in report.errors() {
            eprintln!("{}: {}", "Warning".yellow().bold(), err);
        }
        if report.skipped() > 0 {
            eprintln!(
                "{}: {} malformed element(s) skipped",
                "Warning".yellow().bold(),
                report.skipped()
            );
        }

        if all || args.topology {
            if let Some(topo) = report.topology() {
                section("Topology");
                print!("{}", text::render(&[outline::topology_outline(topo)]));
            }
        }

        let routed = args.dst.is_some();
        if routed && (all || args.paths) {
            section("Paths");
            let blocks = outline::paths_outline(report.paths(), report.topology());
            if blocks.is_empty() {
                println!("{}", "No paths.".dimmed());
            }
            print!("{}", text::render(&blocks));
        }

        let segments = report.segments();
        if routed && (all || args.segments) {
            section("Segments");
            let blocks = outline::segments_outline(&segments);
            if blocks.is_empty() {
                println!("{}", "No segments.".dimmed());
            }
            print!("{}", text::render(&blocks));
        }

        for (kind, n) in args.selections() {
            let Some(n) = n else { continue };
            section(&format!("{} Segment {}", kind, n));
            match outline::select_segment(&segments, kind, n) {
                Some(seg) => print!("{}", text::render(&[outline::segment_outline(n - 1, seg)])),
                None => {
                    let have = segments.iter().filter(|s| s.kind == kind).count();
                    println!(
                        "{}",
                        format!("No {} segment #{} ({} available)", kind, n, have).yellow()
                    );
                }
            }
        }
    }

    for (kind, files) in trust {
        let title = match kind {
            TrustKind::Trc => "TRC",
            TrustKind::Certificate => "Certificate Chain",
        };
        section(title);
        match files {
            Ok(files) if files.is_empty() => println!("{}", "None found.".dimmed()),
            Ok(files) => {
                for f in files {
                    println!("{}", f.name.green());
                    println!("{}", f.contents);
                }
            }
            Err(e) => eprintln!("{}: {}", "Warning".yellow().bold(), e),
        }
    }
}

fn print_json(args: &Args, report: Option<&Report>, trust: &[TrustDump]) {
    let mut out = report
        .map(Report::to_json)
        .unwrap_or_else(|| serde_json::json!({"src": args.src, "dst": args.dst}));

    if let Some(obj) = out.as_object_mut() {
        if let Some(report) = report {
            let segments = report.segments();
            for (kind, n) in args.selections() {
                let Some(n) = n else { continue };
                let selected = outline::select_segment(&segments, kind, n);
                obj.insert(
                    format!("selected_{}", kind.wire_name()),
                    serde_json::to_value(selected).unwrap_or_default(),
                );
            }
        }
        for (kind, files) in trust {
            let value = match files {
                Ok(files) => serde_json::to_value(files).unwrap_or_default(),
                Err(e) => serde_json::json!({ "error": e }),
            };
            obj.insert(kind.extension().to_string(), value);
        }
    }

    println!("{}", json::render(&out));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("as-viewer").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_shows_everything() {
        let args = parse(&["1-18", "2-26"]);
        assert!(args.show_all());
        let req = args.request(5);
        assert!(req.topology && req.paths && req.segments);
    }

    #[test]
    fn test_segment_selection_fetches_segments_only() {
        let args = parse(&["1-18", "2-26", "-c", "2"]);
        assert!(!args.show_all());
        assert_eq!(args.core, Some(2));
        let req = args.request(5);
        assert!(!req.topology);
        assert!(!req.paths);
        assert!(req.segments);
    }

    #[test]
    fn test_paths_pull_topology_for_router_lookup() {
        let req = parse(&["1-18", "2-26", "-p", "--max-paths", "3"]).request(3);
        assert!(req.topology);
        assert!(req.paths);
        assert_eq!(req.max_paths, 3);
    }

    #[test]
    fn test_trust_only() {
        let args = parse(&["1-18", "--trc", "--crt", "--format", "json"]);
        assert!(!args.show_all());
        let req = args.request(5);
        assert!(!req.topology && !req.paths && !req.segments);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_flags_override_config() {
        let config = load_config(&parse(&["1-18", "--no-launch", "--max-paths", "2"])).unwrap();
        assert!(!config.auto_launch);
        assert!(config.launcher().is_none());
        assert_eq!(config.max_paths, 2);
        assert!(load_config(&parse(&["1-18"])).unwrap().auto_launch);
    }

    #[test]
    fn test_rejects_bad_ia() {
        assert!(Args::try_parse_from(["as-viewer", "1:18"]).is_err());
    }
}
