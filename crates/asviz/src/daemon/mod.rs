// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary adapter for the external path-lookup daemon.

pub mod client;
pub mod launcher;
pub mod pool;

pub use client::{Command, DaemonClient};
pub use launcher::{CommandLauncher, LaunchRequest, Launcher};
pub use pool::{ConnState, DaemonPool, PoolSettings};
