// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Starting a path daemon that is not running yet.

use crate::ia::IsdAs;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::info;

/// Everything a launcher needs to know about the daemon it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub ia: IsdAs,
    /// Endhost configuration directory of the AS.
    pub conf_dir: PathBuf,
    /// Address the daemon should bind to.
    pub addr: Option<Ipv4Addr>,
    /// Socket the daemon is expected to create.
    pub socket: PathBuf,
}

/// Starts a daemon process. Fire-and-forget: the caller only waits for the
/// socket to appear.
pub trait Launcher: Send + Sync {
    fn launch(&self, request: &LaunchRequest) -> io::Result<()>;
}

/// Spawns a configured program, substituting `{conf_dir}`, `{addr}` and
/// `{socket}` in its arguments.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn expand_args(&self, request: &LaunchRequest) -> Vec<String> {
        let addr = request.addr.map(|a| a.to_string()).unwrap_or_default();
        let conf_dir = request.conf_dir.display().to_string();
        let socket = request.socket.display().to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{conf_dir}", &conf_dir)
                    .replace("{addr}", &addr)
                    .replace("{socket}", &socket)
                    .replace("{ia}", &request.ia.to_string())
            })
            .collect()
    }
}

impl Launcher for CommandLauncher {
    fn launch(&self, request: &LaunchRequest) -> io::Result<()> {
        let args = self.expand_args(request);
        info!("Launching path daemon for {}: {} {}", request.ia, self.program, args.join(" "));

        // The child is neither supervised nor reaped.
        Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}
