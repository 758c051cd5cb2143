// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded cache of daemon connections, one per AS.
//!
//! Resolving an AS walks a small state machine:
//!
//! ```text
//! Unresolved --connect ok--> Connected
//! Unresolved --socket missing--> Launching --socket appears--> Connected
//!                                Launching --retries exhausted--> Failed
//! Connected  --transport error--> Failed
//! ```
//!
//! A Failed entry is resolved again from scratch on the next request. The map
//! lock is only held to find or create a per-AS slot; connecting and launching
//! happen under the slot's own mutex, so one AS launches at most once at a time
//! and different ASes never wait on each other.

use super::client::DaemonClient;
use super::launcher::{LaunchRequest, Launcher};
use crate::error::DaemonError;
use crate::ia::IsdAs;
use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection state of one AS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Unresolved,
    Launching,
    Connected,
    Failed,
}

/// Pool tuning, usually derived from [`ViewerConfig`](crate::config::ViewerConfig).
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub socket_dir: PathBuf,
    pub gen_dir: PathBuf,
    /// Daemon bind address used when launching; per-AS default otherwise.
    pub addr: Option<Ipv4Addr>,
    pub connect_retries: u32,
    pub retry_interval: Duration,
    pub query_timeout: Duration,
    pub capacity: usize,
}

impl PoolSettings {
    pub fn socket_path(&self, ia: IsdAs) -> PathBuf {
        self.socket_dir.join(ia.socket_name())
    }
}

#[derive(Debug)]
struct SlotState {
    state: ConnState,
    client: Option<Arc<DaemonClient>>,
}

type Slot = Arc<Mutex<SlotState>>;

#[derive(Debug, Default)]
struct Slots {
    map: HashMap<IsdAs, (Slot, u64)>,
    tick: u64,
}

/// Process-wide daemon connection cache.
pub struct DaemonPool {
    settings: PoolSettings,
    launcher: Option<Arc<dyn Launcher>>,
    slots: Mutex<Slots>,
}

impl DaemonPool {
    pub fn new(settings: PoolSettings, launcher: Option<Arc<dyn Launcher>>) -> Self {
        Self {
            settings,
            launcher,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        // Slot bookkeeping stays consistent even if a holder panicked.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Find or create the slot for `ia`, evicting the least recently used
    /// idle entry when the pool is full. Slots held by an in-flight
    /// resolution are never evicted; the pool overshoots instead.
    fn slot(&self, ia: IsdAs) -> Slot {
        let mut slots = self.lock_slots();
        slots.tick += 1;
        let tick = slots.tick;

        if let Some((slot, used)) = slots.map.get_mut(&ia) {
            *used = tick;
            return Arc::clone(slot);
        }

        if slots.map.len() >= self.settings.capacity.max(1) {
            // Every clone of a slot is taken under the map lock, so a count
            // of one means no caller is resolving or querying through it.
            let oldest = slots
                .map
                .iter()
                .filter(|(_, (slot, _))| Arc::strong_count(slot) == 1)
                .min_by_key(|(_, (_, used))| *used)
                .map(|(k, _)| *k);
            match oldest {
                Some(oldest) => {
                    debug!("Evicting daemon connection for {}", oldest);
                    slots.map.remove(&oldest);
                }
                None => debug!("Daemon pool over capacity: every slot is busy"),
            }
        }

        let slot = Arc::new(Mutex::new(SlotState {
            state: ConnState::Unresolved,
            client: None,
        }));
        slots.map.insert(ia, (Arc::clone(&slot), tick));
        slot
    }

    /// Live connection to the daemon of `ia`, connecting or launching it first
    /// if needed. `addr` overrides the bind address for this launch.
    pub fn client(&self, ia: IsdAs, addr: Option<Ipv4Addr>) -> Result<Arc<DaemonClient>, DaemonError> {
        let slot = self.slot(ia);
        let mut entry = slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(client) = &entry.client {
            if !client.is_failed() {
                return Ok(Arc::clone(client));
            }
            debug!("Dropping failed daemon connection for {}", ia);
            entry.client = None;
            entry.state = ConnState::Failed;
        }

        match self.resolve(ia, addr, &mut entry.state) {
            Ok(client) => {
                let client = Arc::new(client);
                entry.client = Some(Arc::clone(&client));
                Ok(client)
            }
            Err(e) => {
                entry.state = ConnState::Failed;
                Err(e)
            }
        }
    }

    /// Current state of `ia` without resolving it.
    pub fn state(&self, ia: IsdAs) -> ConnState {
        let slot = match self.lock_slots().map.get(&ia) {
            Some((slot, _)) => Arc::clone(slot),
            None => return ConnState::Unresolved,
        };
        let result = match slot.try_lock() {
            Ok(entry) => connection_state(&entry),
            Err(TryLockError::WouldBlock) => ConnState::Launching,
            Err(TryLockError::Poisoned(e)) => connection_state(&e.into_inner()),
        };
        result
    }

    /// Drop the cached connection of `ia`.
    pub fn remove(&self, ia: IsdAs) -> bool {
        self.lock_slots().map.remove(&ia).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_slots().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, ia: IsdAs) -> bool {
        self.lock_slots().map.contains_key(&ia)
    }

    fn resolve(
        &self,
        ia: IsdAs,
        addr: Option<Ipv4Addr>,
        state: &mut ConnState,
    ) -> Result<DaemonClient, DaemonError> {
        let socket = self.settings.socket_path(ia);
        let timeout = self.settings.query_timeout;
        *state = ConnState::Unresolved;

        let first = DaemonClient::connect(ia, &socket, timeout);
        let err = match first {
            Ok(client) => {
                debug!("Connected to path daemon for {} at {:?}", ia, socket);
                *state = ConnState::Connected;
                return Ok(client);
            }
            Err(e) => e,
        };

        let connection_error = |attempts: u32, reason: String| DaemonError::Connection {
            ia,
            socket: socket.clone(),
            attempts,
            reason,
        };

        if !is_absent(&err) {
            return Err(connection_error(1, err.to_string()));
        }
        let Some(launcher) = &self.launcher else {
            return Err(connection_error(1, err.to_string()));
        };

        *state = ConnState::Launching;
        let request = LaunchRequest {
            ia,
            conf_dir: ia.conf_dir(&self.settings.gen_dir),
            addr: addr.or(self.settings.addr).or_else(|| ia.default_daemon_addr()),
            socket: socket.clone(),
        };
        if let Err(e) = launcher.launch(&request) {
            warn!("Failed to launch path daemon for {}: {}", ia, e);
            return Err(connection_error(1, format!("launch failed: {}", e)));
        }

        match wait_for_socket(
            self.settings.connect_retries,
            self.settings.retry_interval,
            || DaemonClient::connect(ia, &socket, timeout),
        ) {
            Ok(client) => {
                info!("Path daemon for {} is up at {:?}", ia, socket);
                *state = ConnState::Connected;
                Ok(client)
            }
            Err((retries, e)) => Err(connection_error(1 + retries, e.to_string())),
        }
    }
}

fn connection_state(entry: &SlotState) -> ConnState {
    match &entry.client {
        Some(client) if client.is_failed() => ConnState::Failed,
        _ => entry.state,
    }
}

/// The daemon is not listening: its socket is absent or stale.
fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
    )
}

/// Poll `connect` up to `retries` times, sleeping `interval` before each try.
///
/// On failure returns the number of tries made and the last error.
pub fn wait_for_socket<T>(
    retries: u32,
    interval: Duration,
    mut connect: impl FnMut() -> io::Result<T>,
) -> Result<T, (u32, io::Error)> {
    let mut last = io::Error::new(io::ErrorKind::NotFound, "no connection attempt made");
    for attempt in 1..=retries {
        thread::sleep(interval);
        match connect() {
            Ok(v) => return Ok(v),
            Err(e) => {
                debug!("Daemon socket not ready (attempt {}/{}): {}", attempt, retries, e);
                last = e;
            }
        }
    }
    Err((retries, last))
}
