//! Named arena allocators for batch allocation and deallocation of
//! short-lived data.
//!
//! The engine keeps five separate bump arenas, each with a distinct
//! lifetime policy:
//!
//! - `Request` / `Response` — reset together at the end of each request.
//! - `Cache` — reset only by an explicit administrative operation, never
//!   implicitly.
//! - `Static` — populated once at server startup and never reset.
//! - `Task` — scoped to a single piece of offloaded background work.
//!
//! Each arena is identified by a stable [`ArenaId`] that does not change
//! across init/shutdown cycles, and exposes allocation statistics through
//! [`arena_stats`]. The arenas themselves are thread-local (bumpalo's `Bump`
//! is `!Sync`); the registry aggregates approximate cross-thread statistics
//! through atomics rather than sharing a single allocator across threads.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ember_core::arena::{with_arena, ArenaId, ArenaStr};
//!
//! with_arena(ArenaId::Request, |arena| {
//!     let method = ArenaStr::from_str(arena, "GET");
//!     assert_eq!(method.as_str(), "GET");
//! });
//! ```

use bumpalo::Bump;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Process-wide toggle for arena accounting, driven by
/// `ServerConfig::memory_profiling`. When disabled, `acquire`/`reset` skip
/// the atomic bookkeeping in [`ArenaSlot::record`]; `stats()` then reports
/// whatever was last recorded before profiling was turned off.
static PROFILING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Enable or disable arena allocation accounting for the process.
pub fn set_memory_profiling(enabled: bool) {
    PROFILING_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Whether arena allocation accounting is currently enabled.
pub fn memory_profiling_enabled() -> bool {
    PROFILING_ENABLED.load(Ordering::Relaxed)
}

const DEFAULT_ARENA_SIZE: usize = 64 * 1024;
const MAX_ARENA_SIZE: usize = 1024 * 1024;

/// Stable identifier for one of the engine's five named arenas.
///
/// The discriminant values are part of the registry's stability guarantee:
/// they must not change between process start and shutdown, and the set of
/// variants is closed (no arena is added or removed at runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArenaId {
    Request = 0,
    Response = 1,
    Cache = 2,
    Static = 3,
    Task = 4,
}

impl ArenaId {
    pub const COUNT: usize = 5;
    pub const ALL: [ArenaId; Self::COUNT] = [
        ArenaId::Request,
        ArenaId::Response,
        ArenaId::Cache,
        ArenaId::Static,
        ArenaId::Task,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as u8 as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ArenaId::Request => "request",
            ArenaId::Response => "response",
            ArenaId::Cache => "cache",
            ArenaId::Static => "static",
            ArenaId::Task => "task",
        }
    }
}

/// Per-arena allocation statistics, aggregated across every thread that has
/// touched the arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArenaStats {
    pub allocated_bytes: usize,
    pub peak_bytes: usize,
    pub reset_count: usize,
    /// Fraction of the high-water-mark capacity not reclaimed by the most
    /// recent reset, in `[0.0, 1.0]`. Zero means the arena returned to its
    /// default size; non-zero means it is still holding onto chunks grown
    /// during a previous burst.
    pub fragmentation_ratio: f64,
}

struct ArenaSlot {
    allocated_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
    reset_count: AtomicUsize,
}

impl ArenaSlot {
    fn new() -> Self {
        Self {
            allocated_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
            reset_count: AtomicUsize::new(0),
        }
    }

    fn record(&self, current_bytes: usize) {
        self.allocated_bytes.store(current_bytes, Ordering::Relaxed);
        self.peak_bytes.fetch_max(current_bytes, Ordering::Relaxed);
    }

    fn record_reset(&self) {
        self.reset_count.fetch_add(1, Ordering::Relaxed);
    }

    fn stats(&self) -> ArenaStats {
        let allocated = self.allocated_bytes.load(Ordering::Relaxed);
        let peak = self.peak_bytes.load(Ordering::Relaxed);
        let fragmentation_ratio = if peak == 0 {
            0.0
        } else {
            1.0 - (allocated as f64 / peak as f64)
        };
        ArenaStats {
            allocated_bytes: allocated,
            peak_bytes: peak,
            reset_count: self.reset_count.load(Ordering::Relaxed),
            fragmentation_ratio,
        }
    }
}

/// The process-wide table of arena statistics. Constructed exactly once;
/// the array is indexed by [`ArenaId::index`] and never resized.
struct ArenaRegistry {
    slots: [ArenaSlot; ArenaId::COUNT],
}

impl ArenaRegistry {
    fn new() -> Self {
        Self {
            slots: [
                ArenaSlot::new(),
                ArenaSlot::new(),
                ArenaSlot::new(),
                ArenaSlot::new(),
                ArenaSlot::new(),
            ],
        }
    }

    fn slot(&self, id: ArenaId) -> &ArenaSlot {
        &self.slots[id.index()]
    }
}

static REGISTRY: OnceLock<ArenaRegistry> = OnceLock::new();

fn registry() -> &'static ArenaRegistry {
    REGISTRY.get_or_init(ArenaRegistry::new)
}

struct ArenaTable {
    bumps: [Bump; ArenaId::COUNT],
}

impl ArenaTable {
    fn new() -> Self {
        Self {
            bumps: [
                Bump::with_capacity(DEFAULT_ARENA_SIZE),
                Bump::with_capacity(DEFAULT_ARENA_SIZE),
                Bump::with_capacity(DEFAULT_ARENA_SIZE),
                Bump::with_capacity(DEFAULT_ARENA_SIZE),
                Bump::with_capacity(DEFAULT_ARENA_SIZE),
            ],
        }
    }
}

thread_local! {
    static ARENAS: RefCell<ArenaTable> = RefCell::new(ArenaTable::new());
}

/// Execute a function with access to one of the five named thread-local
/// arenas. The arena is not reset here; call [`reset_arena`] explicitly
/// once the scope using it (a request, a cache population pass, a task)
/// has finished with it.
#[inline]
pub fn with_arena<F, R>(id: ArenaId, f: F) -> R
where
    F: FnOnce(&Bump) -> R,
{
    ARENAS.with(|table| {
        let table = table.borrow();
        let bump = &table.bumps[id.index()];
        let result = f(bump);
        if memory_profiling_enabled() {
            registry().slot(id).record(bump.allocated_bytes());
        }
        result
    })
}

/// Identical to [`with_arena`]; kept as a distinct name for call sites that
/// want to signal they intend to mutate through the arena reference even
/// though `Bump`'s allocation methods only need `&Bump`.
#[inline]
pub fn with_arena_mut<F, R>(id: ArenaId, f: F) -> R
where
    F: FnOnce(&Bump) -> R,
{
    with_arena(id, f)
}

/// Reset the named arena on the current thread, freeing all allocations
/// made through it. If the arena grew past [`MAX_ARENA_SIZE`] it is
/// recreated at the default size instead of shrunk in place.
#[inline]
pub fn reset_arena(id: ArenaId) {
    ARENAS.with(|table| {
        let mut table = table.borrow_mut();
        let bump = &mut table.bumps[id.index()];
        if bump.allocated_bytes() > MAX_ARENA_SIZE {
            *bump = Bump::with_capacity(DEFAULT_ARENA_SIZE);
        } else {
            bump.reset();
        }
        if memory_profiling_enabled() {
            registry().slot(id).record(bump.allocated_bytes());
            registry().slot(id).record_reset();
        }
    });
}

/// Current allocation size of the named arena on this thread, for
/// diagnostics.
#[inline]
pub fn arena_allocated_bytes(id: ArenaId) -> usize {
    ARENAS.with(|table| table.borrow().bumps[id.index()].allocated_bytes())
}

/// Snapshot of a named arena's aggregated statistics. This is a
/// diagnostics-only operation: handlers never see arena stats, only
/// operators inspecting the server's stats surface do.
#[inline]
pub fn arena_stats(id: ArenaId) -> ArenaStats {
    registry().slot(id).stats()
}

// ============================================================================
// Arena-Backed String
// ============================================================================

/// An arena-allocated string slice. Borrows from the arena rather than
/// owning a heap allocation.
#[derive(Clone, Copy)]
pub struct ArenaStr<'a> {
    inner: &'a str,
}

impl<'a> ArenaStr<'a> {
    #[inline]
    pub fn from_str(arena: &'a Bump, s: &str) -> Self {
        Self {
            inner: arena.alloc_str(s),
        }
    }

    #[inline]
    pub const fn empty() -> Self {
        Self { inner: "" }
    }

    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.inner
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> String {
        self.inner.to_string()
    }
}

impl<'a> Deref for ArenaStr<'a> {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.inner
    }
}

impl<'a> AsRef<str> for ArenaStr<'a> {
    #[inline]
    fn as_ref(&self) -> &str {
        self.inner
    }
}

impl<'a> fmt::Debug for ArenaStr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl<'a> fmt::Display for ArenaStr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl<'a> PartialEq for ArenaStr<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<'a> Eq for ArenaStr<'a> {}

impl<'a> PartialEq<str> for ArenaStr<'a> {
    fn eq(&self, other: &str) -> bool {
        self.inner == other
    }
}

impl<'a> PartialEq<&str> for ArenaStr<'a> {
    fn eq(&self, other: &&str) -> bool {
        self.inner == *other
    }
}

impl<'a> PartialEq<String> for ArenaStr<'a> {
    fn eq(&self, other: &String) -> bool {
        self.inner == other.as_str()
    }
}

impl<'a> Hash for ArenaStr<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

// ============================================================================
// Arena-Backed Vector
// ============================================================================

/// An arena-allocated vector, backed by bumpalo's `Vec`.
pub type ArenaVec<'a, T> = bumpalo::collections::Vec<'a, T>;

// ============================================================================
// Arena-Backed HashMap
// ============================================================================

/// A small, arena-backed map for headers and parameters: a linear-scan
/// vector of key-value pairs, which beats a real hash map for the small
/// entry counts typical of headers and path/query parameters.
pub struct ArenaMap<'a, K, V> {
    entries: ArenaVec<'a, (K, V)>,
}

impl<'a, K: PartialEq, V> ArenaMap<'a, K, V> {
    #[inline]
    pub fn new_in(arena: &'a Bump) -> Self {
        Self {
            entries: ArenaVec::new_in(arena),
        }
    }

    #[inline]
    pub fn with_capacity_in(arena: &'a Bump, capacity: usize) -> Self {
        Self {
            entries: ArenaVec::with_capacity_in(capacity, arena),
        }
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        for entry in self.entries.iter_mut() {
            if entry.0 == key {
                let old = std::mem::replace(&mut entry.1, value);
                return Some(old);
            }
        }
        self.entries.push((key, value));
        None
    }

    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.entries.iter()
    }

    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<'a, K: PartialEq + fmt::Debug, V: fmt::Debug> fmt::Debug for ArenaMap<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

// ============================================================================
// Arena-Backed HTTP Request
// ============================================================================

/// An arena-allocated HTTP request: method, path, headers and parameters
/// all borrow from the `ArenaId::Request` arena so the whole request can be
/// freed in one call when the connection moves past `Dispatching`.
pub struct ArenaRequest<'a> {
    pub method: ArenaStr<'a>,
    pub path: ArenaStr<'a>,
    pub headers: ArenaMap<'a, ArenaStr<'a>, ArenaStr<'a>>,
    pub path_params: ArenaMap<'a, ArenaStr<'a>, ArenaStr<'a>>,
    pub query_params: ArenaMap<'a, ArenaStr<'a>, ArenaStr<'a>>,
    pub body: &'a [u8],
}

impl<'a> ArenaRequest<'a> {
    #[inline]
    pub fn new(arena: &'a Bump, method: &str, path: &str) -> Self {
        Self {
            method: ArenaStr::from_str(arena, method),
            path: ArenaStr::from_str(arena, path),
            headers: ArenaMap::with_capacity_in(arena, 16),
            path_params: ArenaMap::with_capacity_in(arena, 4),
            query_params: ArenaMap::with_capacity_in(arena, 8),
            body: &[],
        }
    }

    #[inline]
    pub fn with_body(arena: &'a Bump, method: &str, path: &str, body: &'a [u8]) -> Self {
        Self {
            method: ArenaStr::from_str(arena, method),
            path: ArenaStr::from_str(arena, path),
            headers: ArenaMap::with_capacity_in(arena, 16),
            path_params: ArenaMap::with_capacity_in(arena, 4),
            query_params: ArenaMap::with_capacity_in(arena, 8),
            body,
        }
    }

    #[inline]
    pub fn add_header(&mut self, arena: &'a Bump, name: &str, value: &str) {
        let name = ArenaStr::from_str(arena, name);
        let value = ArenaStr::from_str(arena, value);
        self.headers.insert(name, value);
    }

    #[inline]
    pub fn add_path_param(&mut self, arena: &'a Bump, name: &str, value: &str) {
        let name = ArenaStr::from_str(arena, name);
        let value = ArenaStr::from_str(arena, value);
        self.path_params.insert(name, value);
    }

    #[inline]
    pub fn add_query_param(&mut self, arena: &'a Bump, name: &str, value: &str) {
        let name = ArenaStr::from_str(arena, name);
        let value = ArenaStr::from_str(arena, value);
        self.query_params.insert(name, value);
    }

    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, crate::Error> {
        crate::json::from_slice(self.body).map_err(|e| crate::Error::Deserialization(e.to_string()))
    }

    /// Convert to a heap-allocated `HttpRequest`, for code that outlives the
    /// arena scope.
    pub fn to_http_request(&self) -> crate::HttpRequest {
        let mut req = crate::HttpRequest::new(self.method.to_string(), self.path.to_string());

        for (k, v) in self.headers.iter() {
            req.headers.insert(k.to_string(), v.to_string());
        }
        for (k, v) in self.path_params.iter() {
            req.path_params.insert(k.to_string(), v.to_string());
        }
        for (k, v) in self.query_params.iter() {
            req.query_params.insert(k.to_string(), v.to_string());
        }
        req.body = self.body.to_vec();
        req
    }
}

impl<'a> fmt::Debug for ArenaRequest<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_params)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Build an [`ArenaRequest`] from raw parts taken off the wire, using the
/// `ArenaId::Request` arena.
#[inline]
pub fn arena_request_from_hyper<'a>(
    arena: &'a Bump,
    method: &str,
    path: &str,
    headers: impl Iterator<Item = (&'a str, &'a str)>,
    body: &'a [u8],
) -> ArenaRequest<'a> {
    let mut request = ArenaRequest::with_body(arena, method, path, body);
    for (name, value) in headers {
        request.add_header(arena, name, value);
    }
    request
}

// ============================================================================
// Request Scope Guard
// ============================================================================

/// A scope guard that resets a named arena when dropped, even on panic.
pub struct RequestScope {
    id: ArenaId,
}

impl RequestScope {
    /// Start a scope over the given arena. The request/response arenas are
    /// reset together at the end of a request, so callers typically open
    /// one `RequestScope` per arena they used.
    #[inline]
    pub fn new(id: ArenaId) -> Self {
        Self { id }
    }
}

impl Drop for RequestScope {
    #[inline]
    fn drop(&mut self) {
        reset_arena(self.id);
    }
}
