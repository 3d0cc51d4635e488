//! ## HyperLogLog sketch
//!
//! A fixed-memory estimator of the number of distinct 64-bit digests.
//! The sketch holds `m = 2^p` one-byte registers, where `p` is the precision
//! in `4..=18`.
//!
//! [Original HyperLogLog++ paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)
//!
//! ## Register update
//!
//! For a digest `x`:
//! - the low `p` bits select the register,
//! - the rank is the position of the leading set bit among the remaining
//!   `64 - p` high bits (`65 - p` if they are all zero),
//! - the register keeps the maximum rank it has seen.
//!
//! ## Estimation
//!
//! The number of zero registers and the harmonic sum `Σ 2^-M[j]` are
//! updated on every register change, so [`HyperLogLog::count`] is O(1).
//!
//! - Small range: when the raw estimate is at most `2.5 · m` and some
//!   register is still zero, linear counting `m · ln(m / V)` is used.
//! - Otherwise the raw harmonic mean is corrected with the LogLog-Beta
//!   polynomial, which removes the HyperLogLog++ mid-range bias.
//!   This is not the HyperLogLog++ empirical bias-table (k-nearest-neighbor)
//!   interpolation; one fitted polynomial per precision replaces the tables
//!   and their per-precision thresholds.
//! - Large range: estimates above `2^64 / 30` are corrected for digest
//!   collisions in the 64-bit space.
//!
//! Expected relative standard error is `1.04 / sqrt(m)`:
//!
//! ```text
//!   p = 10:  3.25%
//!   p = 12:  1.62%
//!   p = 14:  0.81%
//!   p = 16:  0.41%
//!   p = 18:  0.20%
//! ```

mod beta;

use std::fmt::{self, Debug};

use crate::error::{CardinalityError, Result};
use beta::beta_horner;

/// Smallest supported precision.
pub const MIN_PRECISION: u8 = 4;

/// Largest supported precision.
pub const MAX_PRECISION: u8 = 18;

/// Precision used when none is configured.
pub const DEFAULT_PRECISION: u8 = 14;

/// `2^64` as a float, the size of the digest space.
const DIGEST_SPACE: f64 = 18_446_744_073_709_551_616.0;

/// Estimates above this limit get the large-range correction.
const LARGE_RANGE_LIMIT: f64 = DIGEST_SPACE / 30.0;

/// A HyperLogLog++-style cardinality sketch over 64-bit digests.
///
/// The register array is allocated once at construction and never resized.
///
/// # Examples
///
/// ```rust
/// use cardinalita::sketch::HyperLogLog;
///
/// let mut hll = HyperLogLog::new(12)?;
/// for i in 0..1000u64 {
///     hll.add(xxhash_rust::xxh64::xxh64(&i.to_le_bytes(), 0));
/// }
///
/// let estimate = hll.count() as f64;
/// assert!((estimate - 1000.0).abs() / 1000.0 < 0.05);
///
/// assert_eq!(hll.clear(), estimate as u64);
/// assert_eq!(hll.count(), 0);
/// # Ok::<(), cardinalita::error::CardinalityError>(())
/// ```
#[derive(Clone, PartialEq)]
pub struct HyperLogLog {
    precision: u8,
    registers: Box<[u8]>,
    /// Number of registers still at zero.
    zeros: u32,
    /// Harmonic sum `Σ 2^-M[j]` over all registers.
    sum: f64,
}

impl HyperLogLog {
    /// Creates an empty sketch with `2^precision` registers.
    ///
    /// # Errors
    ///
    /// Returns [`CardinalityError::InvalidPrecision`] if `precision` is not
    /// in `4..=18`.
    pub fn new(precision: u8) -> Result<Self> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(CardinalityError::InvalidPrecision { precision });
        }
        let m = 1usize << precision;
        Ok(Self {
            precision,
            registers: vec![0u8; m].into_boxed_slice(),
            zeros: m as u32,
            sum: m as f64,
        })
    }

    /// Returns the precision `p`.
    #[inline]
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the number of registers `m = 2^p`.
    #[inline]
    pub fn registers(&self) -> usize {
        self.registers.len()
    }

    /// Returns the expected relative standard error `1.04 / sqrt(m)`.
    #[inline]
    pub fn relative_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    /// Returns `true` if no digest has been added since creation or the
    /// last [`clear`](Self::clear).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zeros as usize == self.registers.len()
    }

    /// Adds a digest to the sketch.
    ///
    /// Updates exactly one register. Adding the same digest again never
    /// changes the sketch.
    #[inline]
    pub fn add(&mut self, digest: u64) {
        let p = self.precision as u32;
        let idx = (digest & ((1u64 << p) - 1)) as usize;
        let rank = ((digest >> p).leading_zeros() - p + 1) as u8;

        let old = self.registers[idx];
        if rank > old {
            self.registers[idx] = rank;
            self.zeros -= (old == 0) as u32;
            self.sum -= harmonic_term(old);
            self.sum += harmonic_term(rank);
        }
    }

    /// Returns the current cardinality estimate.
    pub fn count(&self) -> u64 {
        let m = self.registers.len() as f64;
        let zeros = self.zeros as f64;
        let alpha = alpha(self.registers.len());

        let raw = alpha * m * m / self.sum;
        let estimate = if self.zeros > 0 && raw <= 2.5 * m {
            m * (m / zeros).ln()
        } else {
            alpha * m * (m - zeros) / (self.sum + beta_horner(zeros, self.precision))
        };

        let estimate = if estimate <= LARGE_RANGE_LIMIT {
            estimate
        } else if estimate < DIGEST_SPACE {
            -DIGEST_SPACE * (1.0 - estimate / DIGEST_SPACE).ln()
        } else {
            return u64::MAX;
        };

        estimate.round() as u64
    }

    /// Resets every register and returns the estimate as it was just
    /// before the reset.
    pub fn clear(&mut self) -> u64 {
        let previous = self.count();
        self.registers.fill(0);
        self.zeros = self.registers.len() as u32;
        self.sum = self.registers.len() as f64;
        previous
    }
}

impl Debug for HyperLogLog {
    /// Output format: `HyperLogLog{ p:<precision> zeros:<n> estimate:<n> }`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HyperLogLog{{ p:{} zeros:{} estimate:{} }}",
            self.precision,
            self.zeros,
            self.count()
        )
    }
}

/// `2^-rank`, the contribution of one register to the harmonic sum.
#[inline]
fn harmonic_term(rank: u8) -> f64 {
    1.0 / (1u64 << rank) as f64
}

/// Parameter for bias correction
#[inline]
fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
