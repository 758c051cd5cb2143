// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process stand-in for the path daemon.

#![allow(dead_code)]

use asviz::daemon::client::read_frame;
use serde_json::{json, Value};
use std::io::Write;
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// Answers one request: `(command, payload) -> (status, body)`.
///
/// Status [`HANG_UP`] closes the connection without replying.
pub type Handler = dyn Fn(u8, &Value) -> (u8, Value) + Send + Sync;

pub const HANG_UP: u8 = 0xff;

/// Serve `handler` on a Unix socket at `path` until the process exits.
///
/// Returns a counter of accepted connections.
pub fn spawn_daemon(path: &Path, handler: Arc<Handler>) -> Arc<AtomicUsize> {
    let listener = UnixListener::bind(path).expect("bind fake daemon socket");
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);

    thread::spawn(move || {
        for conn in listener.incoming() {
            let Ok(mut conn) = conn else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                while let Ok((cmd, body)) = read_frame(&mut conn) {
                    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    let (status, reply) = handler(cmd, &payload);
                    if status == HANG_UP {
                        break;
                    }
                    let bytes = serde_json::to_vec(&reply).unwrap();
                    let mut frame = vec![status];
                    frame.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                    frame.extend_from_slice(&bytes);
                    if conn.write_all(&frame).is_err() {
                        break;
                    }
                }
            });
        }
    });

    accepted
}

pub fn topology_1_18() -> Value {
    json!({
        "isd_as": "1-18",
        "is_core_as": false,
        "mtu": 1472,
        "elements": [
            {"role": "beacon", "name": "bs1-18-1", "addr": "127.1.18.3", "port": 31041},
            {"role": "path", "name": "ps1-18-1", "addr": "127.1.18.4", "port": 30055},
            {
                "role": "router",
                "name": "br1-18-1",
                "addr": "127.1.18.2",
                "port": 30041,
                "interfaces": [{
                    "if_id": 5,
                    "bandwidth": 1000,
                    "mtu": 1472,
                    "link_type": "PARENT",
                    "isd_as": "1-19",
                    "to_if_id": 6,
                    "to_addr": "127.1.19.2",
                    "to_udp_port": 50000
                }]
            },
            {"role": "zookeeper", "addr": "127.0.0.1", "port": 2181}
        ]
    })
}

pub fn up_segment() -> Value {
    json!({
        "timestamp": 1_500_000_000u64,
        "expiration": 1_500_021_600u64,
        "interfaces": [
            {"isd_as": "1-18", "ifid": 5},
            {"isd_as": "1-19", "ifid": 6}
        ]
    })
}

pub fn core_segment() -> Value {
    json!({
        "timestamp": 1_500_000_000u64,
        "expiration": 1_500_021_600u64,
        "interfaces": [
            {"isd_as": "1-19", "ifid": 6},
            {"isd_as": "2-26", "ifid": 9}
        ],
        "markings": [{
            "isd_as": "1-19", "trc_version": 1, "cert_version": 0, "mtu": 1472,
            "pcb_markings": [{"in_ia": "0-0", "in_if": 0, "out_ia": "2-26", "out_if": 6}]
        }]
    })
}

/// Daemon for AS 1-18 answering the canonical 1-18 -> 2-26 scenario.
pub fn scenario_handler() -> Arc<Handler> {
    Arc::new(|cmd: u8, payload: &Value| match cmd {
        0x01 => (0, topology_1_18()),
        0x02 => {
            assert_eq!(payload["dst"], "2-26");
            (
                0,
                json!({"paths": [{
                    "mtu": 1472,
                    "interfaces": [
                        {"isd_as": "1-18", "ifid": 5},
                        {"isd_as": "1-19", "ifid": 6},
                        {"isd_as": "1-19", "ifid": 7},
                        {"isd_as": "2-26", "ifid": 9}
                    ],
                    "first_hop": {"addr": "127.1.18.2", "port": 30041}
                }]}),
            )
        }
        0x03 => match payload["kind"].as_str() {
            Some("up") => (0, json!({"segments": [up_segment()]})),
            Some("core") => (0, json!({"segments": [core_segment()]})),
            _ => (0, json!({"segments": []})),
        },
        _ => (1, json!({"error": "unknown command"})),
    })
}
