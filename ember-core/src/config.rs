//! The server's closed configuration surface.
//!
//! Every option the engine recognizes is a field on [`ServerConfig`]; there
//! is no open-ended key/value escape hatch here (that's what
//! `ember-config`'s `ConfigManager` is for, at the application layer).
//! Deserializing with `#[serde(deny_unknown_fields)]` means a typo or a
//! stale option in a config file fails to load instead of being silently
//! ignored.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recognized server options, with the defaults the engine falls back to
/// when a field is omitted from a loaded config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Number of event-loop (reactor) threads.
    pub workers: usize,
    /// Number of threads in the synchronous-handler worker pool.
    pub worker_pool_size: usize,
    /// Cap on combined request header size, in bytes. Exceeding it produces
    /// a 431 response.
    pub max_header_bytes: usize,
    /// Cap on request body size, in bytes. Exceeding it produces a 413
    /// response.
    pub max_body_bytes: usize,
    /// Max duration to read request headers/body before the connection is
    /// closed with a 408.
    pub read_timeout_ms: u64,
    /// Keep-alive idle timeout, in milliseconds.
    pub idle_timeout_ms: u64,
    /// Total handler deadline, in milliseconds. Exceeding it produces a 504
    /// for the in-flight request.
    pub handler_timeout_ms: u64,
    /// TCP listen backlog, and (doubling as) the bound on in-flight
    /// accepted-but-not-yet-dispatched connections per event loop before new
    /// connections are refused with a 503.
    pub accept_queue: usize,
    /// Toggle for arena allocation accounting (`ArenaStats`). Disabling this
    /// skips the atomic bookkeeping on the allocation hot path.
    pub memory_profiling: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus_or_one(),
            worker_pool_size: num_cpus_or_one() * 2,
            max_header_bytes: 16 * 1024,
            max_body_bytes: 2 * 1024 * 1024,
            read_timeout_ms: 30_000,
            idle_timeout_ms: 60_000,
            handler_timeout_ms: 30_000,
            accept_queue: 1024,
            memory_profiling: true,
        }
    }
}

fn num_cpus_or_one() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn worker_pool_size(mut self, n: usize) -> Self {
        self.worker_pool_size = n;
        self
    }

    pub fn max_header_bytes(mut self, n: usize) -> Self {
        self.max_header_bytes = n;
        self
    }

    pub fn max_body_bytes(mut self, n: usize) -> Self {
        self.max_body_bytes = n;
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    pub fn handler_timeout_ms(mut self, ms: u64) -> Self {
        self.handler_timeout_ms = ms;
        self
    }

    pub fn accept_queue(mut self, n: usize) -> Self {
        self.accept_queue = n;
        self
    }

    pub fn memory_profiling(mut self, on: bool) -> Self {
        self.memory_profiling = on;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }
}
