//! Discrete-log recovery for the final aggregation step: the protocol only
//! ever needs `g^x mod p -> x` for small `x` drawn from a bounded signed
//! range known in advance (the inner product can be negative), so a
//! precomputed lookup table covering `[-B, B]` handles the common case and
//! baby-step giant-step is the fallback for anything the table misses.

use std::collections::HashMap;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

use crate::arithmetic::{inv, pow_mod};
use crate::error::{DmcfeError, Result};

/// A precomputed `g^i mod p -> i` table, covering `i in [-func_bound,
/// func_bound]`, plus the bound it was built for. Loaded once per
/// `PublicParameters` and reused across every aggregation.
#[derive(Debug, Clone)]
pub struct DlogTable {
    table: HashMap<String, i64>,
    /// The base the table was computed against; `solve_bsgs` falls back to
    /// this `g` directly, so a table built against the wrong base silently
    /// produces a wrong BSGS answer — callers must load a table whose `g`
    /// matches the `PublicParameters` in use.
    g: BigInt,
    /// Inclusive bound: the table (and the BSGS fallback) covers
    /// `g^{-func_bound} .. g^{func_bound}`.
    func_bound: i64,
}

impl DlogTable {
    /// Build the table by brute force over `[-func_bound, func_bound]`.
    /// Only sensible for small bounds; large bounds should load a
    /// precomputed record via `from_entries` instead.
    pub fn build(g: &BigInt, p: &BigInt, func_bound: i64) -> Result<Self> {
        assert!(func_bound >= 0, "func_bound must be non-negative");
        let mut table = HashMap::with_capacity((2 * func_bound + 1) as usize);

        let mut acc = BigInt::one();
        for i in 0..=func_bound {
            table.insert(acc.to_str_radix(10), i);
            acc = (&acc * g).mod_floor(p);
        }

        let g_inv = inv(g, p)?;
        let mut acc = BigInt::one();
        for i in 1..=func_bound {
            acc = (&acc * &g_inv).mod_floor(p);
            table.insert(acc.to_str_radix(10), -i);
        }

        Ok(DlogTable {
            table,
            g: g.clone(),
            func_bound,
        })
    }

    /// Load a table from an externally produced set of `(value, exponent)`
    /// pairs (e.g. decoded from a discrete-log table record), keyed by the
    /// decimal representation of the group element. `exponent` may be
    /// negative.
    pub fn from_entries(g: BigInt, func_bound: i64, entries: impl IntoIterator<Item = (BigInt, i64)>) -> Self {
        let table = entries
            .into_iter()
            .map(|(v, i)| (v.to_str_radix(10), i))
            .collect();
        DlogTable { table, g, func_bound }
    }

    fn lookup(&self, alpha: &BigInt) -> Option<i64> {
        self.table.get(&alpha.to_str_radix(10)).copied()
    }

    /// Solve `g^x = alpha (mod p)` for `x`, preferring the table and
    /// falling back to baby-step giant-step within `[-func_bound,
    /// func_bound]`. Returns `NotFound` if neither the table nor BSGS can
    /// locate a match within the bound.
    pub fn solve(&self, alpha: &BigInt, p: &BigInt) -> Result<i64> {
        if let Some(x) = self.lookup(alpha) {
            return Ok(x);
        }
        log::debug!("dlog table miss for signed bound {}, falling back to baby-step giant-step", self.func_bound);
        self.solve_bsgs(alpha, p)
    }

    /// Baby-step giant-step search over `[0, func_bound]`, then retried
    /// against `alpha^{-1}` to cover `[-func_bound, -1]` (`g^x = alpha^{-1}`
    /// iff `g^{-x} = alpha`).
    fn solve_bsgs(&self, alpha: &BigInt, p: &BigInt) -> Result<i64> {
        if self.func_bound < 0 {
            return Err(DmcfeError::BoundExceeded);
        }
        let bound = self.func_bound;
        let m = isqrt_ceil(bound as u64 + 1) as i64;

        let mut baby = HashMap::with_capacity(m as usize);
        let mut acc = BigInt::one();
        for j in 0..m {
            baby.entry(acc.to_str_radix(10)).or_insert(j);
            acc = (&acc * &self.g).mod_floor(p);
        }

        let g_m = pow_mod(&self.g, &BigInt::from(m), p);
        let g_m_inv = inv(&g_m, p)?;

        let search = |start: &BigInt| -> Option<i64> {
            let mut gamma = start.mod_floor(p);
            for i in 0..=(bound / m.max(1) + 1) {
                if let Some(j) = baby.get(&gamma.to_str_radix(10)) {
                    let x = i * m + j;
                    if x <= bound {
                        return Some(x);
                    }
                }
                gamma = (&gamma * &g_m_inv).mod_floor(p);
            }
            None
        };

        if let Some(x) = search(alpha) {
            return Ok(x);
        }
        let alpha_inv = inv(alpha, p)?;
        if let Some(y) = search(&alpha_inv) {
            return Ok(-y);
        }
        Err(DmcfeError::NotFound)
    }
}

fn isqrt_ceil(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as u64;
    while x * x < n {
        x += 1;
    }
    while x > 0 && (x - 1) * (x - 1) >= n {
        x -= 1;
    }
    x
}
