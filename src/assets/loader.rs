use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use crate::assets::decode::load_tile_file;
use crate::foundation::clock::SharedClock;
use crate::foundation::config::ViewerContext;
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::tiles::tile::{TileImage, TileKey};

/// One tile fetch, tagged with the drawer generation that issued it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileRequest {
    /// Tile identity.
    pub key: TileKey,
    /// Opaque fetch address.
    pub url: String,
    /// Drawer reset generation at issue time.
    pub generation: u64,
}

/// Outcome of a [`TileRequest`], delivered exactly once.
#[derive(Debug)]
pub struct TileResponse {
    /// Tile identity.
    pub key: TileKey,
    /// Generation copied from the request.
    pub generation: u64,
    /// Decoded pixels, or why there are none.
    pub result: ViewerResult<TileImage>,
}

/// Bounded-concurrency tile loading.
///
/// Contract: `try_load` never blocks and never fails synchronously; a request is either accepted
/// (and later yields exactly one response from `poll_completed`) or handed back when the loader is
/// at capacity.
pub trait TileLoader: Send {
    /// Start fetching, or return the request unchanged when busy.
    fn try_load(&mut self, request: TileRequest) -> Result<(), TileRequest>;

    /// Responses that completed (or timed out) since the last poll.
    fn poll_completed(&mut self) -> Vec<TileResponse>;

    /// Accepted requests without a response yet.
    fn in_flight(&self) -> usize;
}

/// Blocking fetch-and-decode of one tile address. Runs on loader worker threads.
pub trait TileFetcher: Send + Sync + std::fmt::Debug {
    /// Fetch and decode `url`.
    fn fetch(&self, url: &str) -> ViewerResult<TileImage>;
}

/// Resolves tile addresses as filesystem paths under `root` (absolute addresses are used as is).
#[derive(Clone, Debug)]
pub struct FsTileFetcher {
    root: PathBuf,
}

impl FsTileFetcher {
    /// Fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TileFetcher for FsTileFetcher {
    fn fetch(&self, url: &str) -> ViewerResult<TileImage> {
        let p = Path::new(url);
        if p.is_absolute() {
            load_tile_file(p)
        } else {
            load_tile_file(&self.root.join(p))
        }
    }
}

#[derive(Debug)]
struct Pending {
    key: TileKey,
    generation: u64,
    deadline_ms: f64,
}

/// [`TileLoader`] running fetches on a fixed-size `rayon` pool, one worker per concurrency slot.
///
/// Results travel back over an `mpsc` channel and are only surfaced by `poll_completed`, so all
/// state mutation stays on the caller's thread. A fetch still running past its deadline is
/// reported as [`ViewerError::Timeout`] and its late result is dropped; until that late result
/// arrives the fetch keeps occupying its slot.
pub struct ThreadedLoader {
    fetcher: Arc<dyn TileFetcher>,
    pool: rayon::ThreadPool,
    limit: usize,
    timeout_ms: f64,
    clock: SharedClock,
    tx: mpsc::Sender<(u64, ViewerResult<TileImage>)>,
    rx: mpsc::Receiver<(u64, ViewerResult<TileImage>)>,
    pending: HashMap<u64, Pending>,
    overdue: HashSet<u64>,
    next_ticket: u64,
}

impl std::fmt::Debug for ThreadedLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedLoader")
            .field("fetcher", &self.fetcher)
            .field("limit", &self.limit)
            .field("timeout_ms", &self.timeout_ms)
            .field("in_flight", &self.pending.len())
            .field("overdue", &self.overdue.len())
            .finish()
    }
}

fn build_thread_pool(threads: usize) -> ViewerResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("deepzoom-tile-{i}"))
        .build()
        .map_err(|e| ViewerError::load(format!("failed to build tile loader thread pool: {e}")))
}

impl ThreadedLoader {
    /// Loader with the context's concurrency limit and timeout.
    pub fn new(fetcher: Arc<dyn TileFetcher>, ctx: &ViewerContext) -> ViewerResult<Self> {
        let limit = ctx.config.loader_concurrency_limit.max(1);
        let pool = build_thread_pool(limit)?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            fetcher,
            pool,
            limit,
            timeout_ms: ctx.config.loader_timeout as f64,
            clock: ctx.clock.clone(),
            tx,
            rx,
            pending: HashMap::new(),
            overdue: HashSet::new(),
            next_ticket: 0,
        })
    }

    /// Filesystem-backed loader rooted at `root`.
    pub fn filesystem(root: impl Into<PathBuf>, ctx: &ViewerContext) -> ViewerResult<Self> {
        Self::new(Arc::new(FsTileFetcher::new(root)), ctx)
    }

    /// Fetches that timed out but are still running on the pool.
    pub fn overdue(&self) -> usize {
        self.overdue.len()
    }
}

impl TileLoader for ThreadedLoader {
    fn try_load(&mut self, request: TileRequest) -> Result<(), TileRequest> {
        if self.pending.len() + self.overdue.len() >= self.limit {
            return Err(request);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(
            ticket,
            Pending {
                key: request.key,
                generation: request.generation,
                deadline_ms: self.clock.now_ms() + self.timeout_ms,
            },
        );

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let url = request.url;
        self.pool.spawn(move || {
            let res = fetcher.fetch(&url);
            // Receiver gone means the loader was dropped; nobody wants the tile.
            let _ = tx.send((ticket, res));
        });
        Ok(())
    }

    fn poll_completed(&mut self) -> Vec<TileResponse> {
        let mut out = Vec::new();

        while let Ok((ticket, result)) = self.rx.try_recv() {
            match self.pending.remove(&ticket) {
                Some(p) => out.push(TileResponse {
                    key: p.key,
                    generation: p.generation,
                    result,
                }),
                None => {
                    self.overdue.remove(&ticket);
                    tracing::trace!(ticket, "late tile result dropped");
                }
            }
        }

        let now = self.clock.now_ms();
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, p)| now >= p.deadline_ms)
            .map(|(t, _)| *t)
            .collect();
        for ticket in expired {
            if let Some(p) = self.pending.remove(&ticket) {
                self.overdue.insert(ticket);
                tracing::debug!(key = ?p.key, timeout_ms = self.timeout_ms, "tile fetch timed out");
                out.push(TileResponse {
                    key: p.key,
                    generation: p.generation,
                    result: Err(ViewerError::timeout(format!(
                        "tile {:?} exceeded {} ms",
                        p.key, self.timeout_ms
                    ))),
                });
            }
        }

        out
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
