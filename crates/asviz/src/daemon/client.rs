// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Path daemon client (Unix-socket binary protocol).
//!
//! Request frame: `[cmd: u8][len: u32 LE][JSON]`.
//! Response frame: `[status: u8][len: u32 LE][JSON]`, status `0x00` on success.

use crate::decode::{self, Decoded};
use crate::error::{DaemonError, SourceError};
use crate::ia::IsdAs;
use crate::model::{AnnouncedPath, AsTopology, PathSegment, SegmentKind};
use crate::source::PathSource;
use serde_json::{json, Value};
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest response body accepted from the daemon.
pub const MAX_RESPONSE_LEN: u32 = 16 * 1024 * 1024;

/// Daemon query commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Topology = 0x01,
    Paths = 0x02,
    Segments = 0x03,
}

impl Command {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Self::Topology),
            0x02 => Some(Self::Paths),
            0x03 => Some(Self::Segments),
            _ => None,
        }
    }

    pub fn query_name(&self) -> &'static str {
        match self {
            Self::Topology => "topology",
            Self::Paths => "paths",
            Self::Segments => "segments",
        }
    }
}

/// Write one request frame.
pub fn write_request(w: &mut impl Write, cmd: Command, payload: &Value) -> io::Result<()> {
    let body = serde_json::to_vec(payload)?;
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "request too large"))?;

    let mut frame = Vec::with_capacity(5 + body.len());
    frame.push(cmd as u8);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    w.write_all(&frame)?;
    w.flush()
}

/// Read one `[tag][len][body]` frame, returning the tag and body.
pub fn read_frame(r: &mut impl Read) -> io::Result<(u8, Vec<u8>)> {
    let mut header = [0u8; 5];
    r.read_exact(&mut header)?;

    let tag = header[0];
    let len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
    if len > MAX_RESPONSE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit", len),
        ));
    }

    let mut body = vec![0u8; len as usize];
    r.read_exact(&mut body)?;
    Ok((tag, body))
}

/// Connection to the path daemon serving one AS.
#[derive(Debug)]
pub struct DaemonClient {
    ia: IsdAs,
    socket: PathBuf,
    stream: Mutex<UnixStream>,
    timeout: Duration,
    failed: AtomicBool,
}

impl DaemonClient {
    /// Connect to the daemon socket of `ia`.
    pub fn connect(ia: IsdAs, socket: &Path, timeout: Duration) -> io::Result<Self> {
        let stream = UnixStream::connect(socket)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;

        Ok(Self {
            ia,
            socket: socket.to_path_buf(),
            stream: Mutex::new(stream),
            timeout,
            failed: AtomicBool::new(false),
        })
    }

    pub fn ia(&self) -> IsdAs {
        self.ia
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Whether a previous query left this connection unusable.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Send a command and return the decoded JSON body.
    ///
    /// Transport failures mark the connection failed; it is never retried here.
    /// A well-framed rejection only fails this query.
    pub fn request(&self, cmd: Command, payload: &Value) -> Result<Value, DaemonError> {
        if self.is_failed() {
            return Err(DaemonError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection previously failed",
            )));
        }

        let result = self.exchange(cmd, payload);
        if let Err(e) = &result {
            warn!("{} query to {} failed: {}", cmd.query_name(), self.ia, e);
            if e.invalidates_connection() {
                self.mark_failed();
            }
        }
        result
    }

    fn exchange(&self, cmd: Command, payload: &Value) -> Result<Value, DaemonError> {
        let query = cmd.query_name();
        let mut stream = self
            .stream
            .lock()
            .map_err(|_| DaemonError::Io(io::Error::other("Lock poisoned")))?;

        debug!("Sending {} query to {}", query, self.ia);
        write_request(&mut *stream, cmd, payload).map_err(|e| self.io_error(query, e))?;
        let (status, body) = read_frame(&mut *stream).map_err(|e| self.io_error(query, e))?;

        if status != 0x00 {
            return Err(DaemonError::Response {
                query,
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let value: Value = serde_json::from_slice(&body).map_err(|e| DaemonError::Response {
            query,
            status,
            message: format!("malformed JSON body: {}", e),
        })?;

        if let Some(err) = value.get("error") {
            let message = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(DaemonError::Response {
                query,
                status,
                message,
            });
        }

        Ok(value)
    }

    fn io_error(&self, query: &'static str, e: io::Error) -> DaemonError {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => DaemonError::Timeout {
                query,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            },
            _ => DaemonError::Io(e),
        }
    }
}

impl PathSource for DaemonClient {
    fn topology(&self) -> Result<Decoded<AsTopology>, SourceError> {
        let response = self.request(Command::Topology, &json!({}))?;
        Ok(decode::decode_topology(&response)?)
    }

    fn paths(&self, dst: IsdAs, max_paths: usize) -> Result<Decoded<Vec<AnnouncedPath>>, SourceError> {
        let payload = json!({"dst": dst.to_string(), "max_paths": max_paths});
        let response = self.request(Command::Paths, &payload)?;
        Ok(decode::decode_paths(&response)?)
    }

    fn segments(&self, kind: SegmentKind) -> Result<Decoded<Vec<PathSegment>>, SourceError> {
        let response = self.request(Command::Segments, &json!({"kind": kind.wire_name()}))?;
        Ok(decode::decode_segments(kind, &response)?)
    }
}
