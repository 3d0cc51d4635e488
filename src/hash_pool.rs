//! Pool of reusable xxHash64 accumulators.
//!
//! Every `write_str`/`write_bytes` call needs a 64-bit hasher for the
//! duration of a single digest. [`HashPool`] keeps a set of idle hashers
//! around so that those calls borrow one instead of building a new one.
//!
//! # Design
//!
//! - Idle hashers live in a lock-free [`ArrayQueue`], so acquire and release
//!   never block and never contend on a lock.
//! - The pool is pre-warmed with [`HASH_POOL_WARMUP`] hashers at
//!   construction.
//! - An empty pool is not an error: [`HashPool::acquire`] builds a new hasher.
//! - A full pool is not an error either: a returned hasher that does not fit
//!   is dropped. The pool therefore grows under load and shrinks back to its
//!   idle capacity afterwards.
//!
//! ```text
//!   acquire() ──pop──►  ┌──────────────────────────┐  ◄──push── drop(PooledHasher)
//!                       │ [h] [h] [h] ... (idle)   │
//!   (empty: new hasher) └──────────────────────────┘  (full: hasher dropped)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use cardinalita::hash_pool::HashPool;
//!
//! let pool = HashPool::new();
//! let digest = {
//!     let mut hasher = pool.acquire();
//!     hasher.update(b"hello");
//!     hasher.digest()
//! }; // hasher goes back to the pool here
//!
//! assert_eq!(digest, xxhash_rust::xxh64::xxh64(b"hello", 0));
//! ```

use std::fmt::{self, Debug};
use std::hash::Hasher;
use std::mem;

use crossbeam_queue::ArrayQueue;
use xxhash_rust::xxh64::Xxh64;

/// Number of hashers a pool holds right after construction.
pub const HASH_POOL_WARMUP: usize = 128;

/// Minimum number of idle hashers a pool keeps before dropping returns.
pub const HASH_POOL_MAX_IDLE: usize = 512;

/// Seed every pooled hasher is reset to before it is handed out.
pub const HASH_SEED: u64 = 0;

/// A concurrent pool of reusable 64-bit hashers.
///
/// A pool is usually owned by one
/// [`CardinalityMetric`](crate::metric::CardinalityMetric), but it can be
/// wrapped in an `Arc` and shared between metrics through
/// [`CardinalityOpts::hash_pool`](crate::opts::CardinalityOpts::hash_pool).
pub struct HashPool {
    idle: ArrayQueue<Xxh64>,
}

impl HashPool {
    /// Creates a pool pre-warmed with [`HASH_POOL_WARMUP`] hashers.
    pub fn new() -> Self {
        Self::with_warmup(HASH_POOL_WARMUP)
    }

    /// Creates a pool pre-warmed with `warmup` hashers.
    ///
    /// The idle capacity is `max(warmup, HASH_POOL_MAX_IDLE)`.
    pub fn with_warmup(warmup: usize) -> Self {
        let idle = ArrayQueue::new(warmup.max(HASH_POOL_MAX_IDLE));
        for _ in 0..warmup {
            if idle.push(Xxh64::new(HASH_SEED)).is_err() {
                break;
            }
        }
        Self { idle }
    }

    /// Borrows a hasher in its freshly-initialized state.
    ///
    /// Never blocks. When no idle hasher is available a new one is created.
    /// The hasher returns to the pool when the [`PooledHasher`] is dropped.
    #[inline]
    pub fn acquire(&self) -> PooledHasher<'_> {
        let hasher = match self.idle.pop() {
            Some(mut hasher) => {
                hasher.reset(HASH_SEED);
                hasher
            }
            None => {
                tracing::trace!(target: "cardinalita::hash_pool", "hash_pool_miss");
                Xxh64::new(HASH_SEED)
            }
        };
        PooledHasher {
            pool: self,
            hasher,
        }
    }

    /// Hashes `bytes` with a pooled hasher.
    #[inline]
    pub fn digest(&self, bytes: &[u8]) -> u64 {
        let mut hasher = self.acquire();
        hasher.update(bytes);
        hasher.digest()
    }

    /// Returns the number of idle hashers currently parked in the pool.
    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    /// Returns the maximum number of idle hashers the pool keeps.
    pub fn capacity(&self) -> usize {
        self.idle.capacity()
    }

    fn release(&self, hasher: Xxh64) {
        if self.idle.push(hasher).is_err() {
            tracing::trace!(target: "cardinalita::hash_pool", "hash_pool_full");
        }
    }
}

impl Default for HashPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for HashPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashPool")
            .field("idle", &self.idle.len())
            .field("capacity", &self.idle.capacity())
            .finish()
    }
}

/// A hasher borrowed from a [`HashPool`].
///
/// Never shared between threads: each borrower owns its hasher until the
/// guard is dropped.
pub struct PooledHasher<'a> {
    pool: &'a HashPool,
    hasher: Xxh64,
}

impl PooledHasher<'_> {
    /// Feeds `bytes` into the hasher.
    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Returns the 64-bit digest of everything fed so far.
    #[inline]
    pub fn digest(&self) -> u64 {
        self.hasher.digest()
    }
}

impl Hasher for PooledHasher<'_> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.hasher.digest()
    }
}

impl Drop for PooledHasher<'_> {
    fn drop(&mut self) {
        let hasher = mem::replace(&mut self.hasher, Xxh64::new(HASH_SEED));
        self.pool.release(hasher);
    }
}

impl Debug for PooledHasher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledHasher")
            .field("digest", &self.hasher.digest())
            .finish()
    }
}
