//! Public parameters (MPK): the immutable tuple every client and the
//! aggregator share. Mirrors how the rest of this codebase keeps its
//! cryptographic constants in a small, `Clone`-cheap struct alongside a
//! `::init`/loader constructor.

use std::fmt;

use num_bigint::BigInt;
use num_traits::One;

use crate::error::{DmcfeError, Result};

/// Opaque parameter record as produced by offline parameter generation
/// (choosing a safe prime `p = 2q + 1` and generators `g`, `h` of the
/// order-`q` subgroup). This crate does not parse JSON/TOML itself — the
/// caller decodes whatever config format it uses into this plain struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityParamRecord {
    pub p: String,
    pub q: String,
    pub g: String,
    pub h: String,
    pub sec_param: u32,
}

/// Public parameters (MPK), immutable after setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicParameters {
    /// Prime modulus.
    pub p: BigInt,
    /// Subgroup order, with `p = 2q + 1`.
    pub q: BigInt,
    /// Generator of the order-`q` subgroup of `Z*_p`.
    pub g: BigInt,
    /// Second, independent generator of the same subgroup.
    pub h: BigInt,
    /// Number of clients.
    pub n: usize,
    /// Per-client vector length.
    pub ell: usize,
    /// Security parameter bit length, carried through for bookkeeping only.
    pub sec_param: u32,
}

impl PublicParameters {
    /// Build and validate MPK from a parameter record plus the caller-chosen
    /// party count and per-client vector length.
    ///
    /// Checks the algebraic invariants this crate can cheaply verify:
    /// `p = 2q + 1`, `g^q == h^q == 1 (mod p)`, `g != 1`, `h != 1`. Primality
    /// of `p`/`q` is the parameter generator's responsibility, not this
    /// loader's (factoring a cryptographic-size modulus here would defeat
    /// the point of trusting the offline generator).
    pub fn from_record(record: &SecurityParamRecord, n: usize, ell: usize) -> Result<Self> {
        if n < 2 {
            return Err(DmcfeError::ProtocolError(format!(
                "party count must be >= 2, got {n}"
            )));
        }
        if ell < 1 {
            return Err(DmcfeError::ProtocolError(format!(
                "vector length must be >= 1, got {ell}"
            )));
        }

        let parse = |field: &str, value: &str| -> Result<BigInt> {
            value.parse::<BigInt>().map_err(|e| {
                DmcfeError::ProtocolError(format!("cannot parse {field} = {value:?}: {e}"))
            })
        };

        let p = parse("p", &record.p)?;
        let q = parse("q", &record.q)?;
        let g = parse("g", &record.g)?;
        let h = parse("h", &record.h)?;

        Self::new(p, q, g, h, n, ell, record.sec_param)
    }

    /// Build and validate MPK directly from its algebraic components.
    pub fn new(
        p: BigInt,
        q: BigInt,
        g: BigInt,
        h: BigInt,
        n: usize,
        ell: usize,
        sec_param: u32,
    ) -> Result<Self> {
        if n < 2 {
            return Err(DmcfeError::ProtocolError(format!(
                "party count must be >= 2, got {n}"
            )));
        }
        if ell < 1 {
            return Err(DmcfeError::ProtocolError(format!(
                "vector length must be >= 1, got {ell}"
            )));
        }

        if &(BigInt::from(2) * &q + BigInt::one()) != &p {
            return Err(DmcfeError::ProtocolError(format!(
                "invariant p = 2q + 1 does not hold for p={p}, q={q}"
            )));
        }

        let one = BigInt::one();
        if g == one {
            return Err(DmcfeError::ProtocolError("g must not be 1".into()));
        }
        if h == one {
            return Err(DmcfeError::ProtocolError("h must not be 1".into()));
        }
        if !crate::arithmetic::is_in_order_q_subgroup(&g, &q, &p) {
            return Err(DmcfeError::ProtocolError(
                "g does not generate the order-q subgroup (g^q != 1 mod p)".into(),
            ));
        }
        if !crate::arithmetic::is_in_order_q_subgroup(&h, &q, &p) {
            return Err(DmcfeError::ProtocolError(
                "h is not in the order-q subgroup (h^q != 1 mod p)".into(),
            ));
        }

        Ok(PublicParameters {
            p,
            q,
            g,
            h,
            n,
            ell,
            sec_param,
        })
    }
}

impl fmt::Display for PublicParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicParameters {{ n: {}, ell: {}, p: {}, q: {}, g: {}, h: {}, sec_param: {} }}",
            self.n, self.ell, self.p, self.q, self.g, self.h, self.sec_param
        )
    }
}
