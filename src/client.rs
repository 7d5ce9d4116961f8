//! Per-client state: the secret scalar used for pairwise Diffie-Hellman
//! share exchange, the zero-sum share matrix it produces, the Damgard
//! commitment keypair, and the one-time pad used to mask encrypted
//! coordinates. Mirrors the teacher's party-as-a-struct-of-`Option`s shape,
//! but every accessor on missing state returns `DmcfeError::StateMissing`
//! instead of panicking.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::arithmetic::{pow_mod, rand_nonzero_below, rand_seeded, rand_with_rng};
use crate::ciphertext::Ciphertext;
use crate::error::{DmcfeError, Result};
use crate::keyshare::FunctionalKeyShare;
use crate::params::PublicParameters;

/// One client in the DMCFE scheme. Index is fixed at construction and
/// identifies this client's row in every `n`-by-`ell` matrix the protocol
/// passes around (the share matrix, the function vector `y`, ciphertexts).
#[derive(Debug, Clone)]
pub struct Client {
    pub index: usize,
    pub params: PublicParameters,

    /// `sigma_i`: this client's Diffie-Hellman exponent.
    sigma: Option<BigInt>,
    /// `pi_i = g^sigma_i mod p`, published to every other client.
    pi: Option<BigInt>,

    /// `T_i`: the zero-sum share matrix, `n` rows by `ell` columns.
    share: Option<DMatrix<BigInt>>,

    /// Damgard commitment secret exponents, length `ell` each.
    dam_s: Option<DVector<BigInt>>,
    dam_t: Option<DVector<BigInt>>,
    /// `d_i[k] = g^s[k] h^t[k] mod p`, published as part of this client's key.
    dam_pub_key: Option<DVector<BigInt>>,
    /// One-time pad, length `ell`.
    otp_key: Option<DVector<BigInt>>,
}

impl Client {
    pub fn new(index: usize, params: &PublicParameters) -> Self {
        Client {
            index,
            params: params.clone(),
            sigma: None,
            pi: None,
            share: None,
            dam_s: None,
            dam_t: None,
            dam_pub_key: None,
            otp_key: None,
        }
    }

    /// Draw `sigma_i` and publish `pi_i = g^sigma_i mod p`. Must run before
    /// `set_share`.
    pub fn announce(&mut self) -> BigInt {
        let sigma = rand_nonzero_below(&self.params.q);
        let pi = pow_mod(&self.params.g, &sigma, &self.params.p);
        self.pi = Some(pi.clone());
        self.sigma = Some(sigma);
        pi
    }

    pub fn public_key(&self) -> Result<&BigInt> {
        self.pi.as_ref().ok_or(DmcfeError::StateMissing("pi (call announce first)"))
    }

    fn sigma(&self) -> Result<&BigInt> {
        self.sigma.as_ref().ok_or(DmcfeError::StateMissing("sigma (call announce first)"))
    }

    /// Build this client's row of the zero-sum share matrix from every
    /// other client's published `pi_k`. `other_keys[k]` must be `pi_k` for
    /// every `k != self.index`; the entry at `self.index` is ignored.
    ///
    /// `T_i = sum_{k < i} A(i,k) - sum_{k > i} A(i,k)`, where `A(i,k)` is a
    /// deterministic draw seeded by the shared Diffie-Hellman element
    /// `g^(sigma_i * sigma_k)`. Both clients that contribute to a pair
    /// compute the identical element, so they draw the identical `A(i,k)`
    /// without talking to each other again, and by construction
    /// `sum_i T_i = 0 (mod q)`.
    pub fn set_share(&mut self, other_keys: &[BigInt]) -> Result<()> {
        let n = self.params.n;
        let ell = self.params.ell;
        if other_keys.len() != n {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{n} public keys"),
                actual: format!("{}", other_keys.len()),
            });
        }
        let sigma = self.sigma()?.clone();

        let mut flat = vec![BigInt::zero(); n * ell];
        for (k, pi_k) in other_keys.iter().enumerate() {
            if k == self.index {
                continue;
            }
            let shared = pow_mod(pi_k, &sigma, &self.params.p);
            let draw = rand_seeded(&BigInt::zero(), &self.params.q, n * ell, &shared);
            if k < self.index {
                for (slot, v) in flat.iter_mut().zip(draw.iter()) {
                    *slot = (&*slot + v).mod_floor(&self.params.q);
                }
            } else {
                for (slot, v) in flat.iter_mut().zip(draw.iter()) {
                    *slot = (&*slot - v).mod_floor(&self.params.q);
                }
            }
        }

        self.share = Some(DMatrix::from_row_slice(n, ell, &flat));
        Ok(())
    }

    fn share(&self) -> Result<&DMatrix<BigInt>> {
        self.share.as_ref().ok_or(DmcfeError::StateMissing("share (call set_share first)"))
    }

    /// Draw the Damgard commitment keypair and one-time pad. Independent of
    /// `set_share`; can run before or after it.
    pub fn generate_damgard_key(&mut self) {
        let ell = self.params.ell;
        let mut rng = rand::thread_rng();
        let two = BigInt::from(2);
        let s = DVector::from_fn(ell, |_, _| rand_with_rng(&two, &self.params.q, &mut rng));
        let t = DVector::from_fn(ell, |_, _| rand_with_rng(&two, &self.params.q, &mut rng));
        let otp = DVector::from_fn(ell, |_, _| rand_with_rng(&BigInt::zero(), &self.params.q, &mut rng));

        let pub_key = DVector::from_fn(ell, |k, _| {
            let y1 = pow_mod(&self.params.g, &s[k], &self.params.p);
            let y2 = pow_mod(&self.params.h, &t[k], &self.params.p);
            (&y1 * &y2).mod_floor(&self.params.p)
        });

        self.dam_s = Some(s);
        self.dam_t = Some(t);
        self.dam_pub_key = Some(pub_key);
        self.otp_key = Some(otp);
    }

    pub fn damgard_public_key(&self) -> Result<&DVector<BigInt>> {
        self.dam_pub_key
            .as_ref()
            .ok_or(DmcfeError::StateMissing("dam_pub_key (call generate_damgard_key first)"))
    }

    /// Encrypt this client's coordinate vector `x` (length `ell`).
    pub fn encrypt(&self, x: &[BigInt]) -> Result<Ciphertext> {
        let ell = self.params.ell;
        if x.len() != ell {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("vector of length {ell}"),
                actual: format!("{}", x.len()),
            });
        }
        let otp = self.otp_key.as_ref().ok_or(DmcfeError::StateMissing(
            "otp_key (call generate_damgard_key first)",
        ))?;
        let dam_pub_key = self.damgard_public_key()?;

        let r = rand_nonzero_below(&self.params.q);
        let c0 = pow_mod(&self.params.g, &r, &self.params.p);
        let c1 = pow_mod(&self.params.h, &r, &self.params.p);

        let c: Vec<BigInt> = (0..ell)
            .map(|i| {
                let masked = (&otp[i] + &x[i]).mod_floor(&self.params.q);
                let t1 = pow_mod(&dam_pub_key[i], &r, &self.params.p);
                let t2 = pow_mod(&self.params.g, &masked, &self.params.p);
                (&t1 * &t2).mod_floor(&self.params.p)
            })
            .collect();

        Ok(Ciphertext { c0, c1, c })
    }

    /// Derive this client's functional key share for function vector `y`,
    /// given as the full `n`-by-`ell` matrix (every client's row; only row
    /// `self.index` is this client's own contribution, but every client
    /// needs the full matrix to fold in its share of every other row).
    pub fn derive_key_share(&self, y: &DMatrix<BigInt>) -> Result<FunctionalKeyShare> {
        let n = self.params.n;
        let ell = self.params.ell;
        if y.nrows() != n || y.ncols() != ell {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{n}x{ell} matrix"),
                actual: format!("{}x{}", y.nrows(), y.ncols()),
            });
        }
        let otp = self.otp_key.as_ref().ok_or(DmcfeError::StateMissing(
            "otp_key (call generate_damgard_key first)",
        ))?;
        let s = self.dam_s.as_ref().ok_or(DmcfeError::StateMissing(
            "dam_s (call generate_damgard_key first)",
        ))?;
        let t = self.dam_t.as_ref().ok_or(DmcfeError::StateMissing(
            "dam_t (call generate_damgard_key first)",
        ))?;
        let share = self.share()?;

        let y_row = y.row(self.index);
        let mut z1 = BigInt::zero();
        let mut k1 = BigInt::zero();
        let mut k2 = BigInt::zero();
        for i in 0..ell {
            z1 += &otp[i] * y_row[i].clone();
            k1 += &s[i] * y_row[i].clone();
            k2 += &t[i] * y_row[i].clone();
        }

        let mut z2 = BigInt::zero();
        for i in 0..n {
            for j in 0..ell {
                z2 += &share[(i, j)] * y[(i, j)].clone();
            }
        }

        let mu = (z1 + z2).mod_floor(&self.params.q);
        let k1 = k1.mod_floor(&self.params.q);
        let k2 = k2.mod_floor(&self.params.q);

        Ok(FunctionalKeyShare { mu, k1, k2 })
    }
}

impl Drop for Client {
    /// Best-effort scrub of the secret scalars on drop. `num-bigint` keeps
    /// its digits behind a private `Vec<u32>` with no exposed mutable
    /// access, so this cannot overwrite the actual heap bytes the way
    /// `zeroize` does for fixed-size buffers; it only drops the `Option`s
    /// promptly and replaces them with a zero value first so a reused
    /// allocation is less likely to carry a stale secret forward.
    fn drop(&mut self) {
        if let Some(v) = self.sigma.as_mut() {
            v.zeroize();
        }
        if let Some(v) = self.dam_s.as_mut() {
            for x in v.iter_mut() {
                x.zeroize();
            }
        }
        if let Some(v) = self.dam_t.as_mut() {
            for x in v.iter_mut() {
                x.zeroize();
            }
        }
        if let Some(v) = self.otp_key.as_mut() {
            for x in v.iter_mut() {
                x.zeroize();
            }
        }
        if let Some(m) = self.share.as_mut() {
            for x in m.iter_mut() {
                x.zeroize();
            }
        }
    }
}

/// Minimal best-effort zeroing for `BigInt`: replaces the value with zero.
/// Does not scrub the old heap allocation (`num-bigint` exposes no mutable
/// byte access for that); see the `Drop` impl above for the caveat.
trait BestEffortZeroize {
    fn zeroize(&mut self);
}

impl BestEffortZeroize for BigInt {
    fn zeroize(&mut self) {
        *self = BigInt::zero();
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Client {}: pi={:?} share_set={} dam_key_set={}",
            self.index,
            self.pi,
            self.share.is_some(),
            self.dam_pub_key.is_some()
        )
    }
}
