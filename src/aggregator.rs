//! Public aggregation: combine every client's ciphertext and functional
//! key share for a fixed `y` into `g^<x,y> mod p`, then hand that value to
//! the discrete-log table to recover `<x, y>` itself. Holds no secret
//! state — anyone holding the ciphertexts, the key shares, and the
//! discrete-log table can run it.

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use rayon::prelude::*;

use crate::arithmetic::{inv, pow_mod};
use crate::ciphertext::Ciphertext;
use crate::dlog::DlogTable;
use crate::error::{DmcfeError, Result};
use crate::keyshare::FunctionalKeyShare;
use crate::params::PublicParameters;

pub struct Aggregator;

impl Aggregator {
    /// Combine `ciphertexts[i]`/`key_shares[i]` (one pair per client, in
    /// client-index order) against function vector `y` (`n`-by-`ell`) and
    /// recover `<x, y>` via `dlog`.
    pub fn decrypt(
        params: &PublicParameters,
        ciphertexts: &[Ciphertext],
        key_shares: &[FunctionalKeyShare],
        y: &DMatrix<BigInt>,
        dlog: &DlogTable,
    ) -> Result<i64> {
        log::debug!("aggregator: decrypting {} ciphertexts", ciphertexts.len());
        let alpha = Self::combine(params, ciphertexts, key_shares, y)?;
        dlog.solve(&alpha, &params.p)
    }

    /// As `decrypt`, but first rejects any ciphertext element outside the
    /// order-`q` subgroup.
    pub fn decrypt_checked(
        params: &PublicParameters,
        ciphertexts: &[Ciphertext],
        key_shares: &[FunctionalKeyShare],
        y: &DMatrix<BigInt>,
        dlog: &DlogTable,
    ) -> Result<i64> {
        for (i, ct) in ciphertexts.iter().enumerate() {
            if !ct.in_subgroup(params) {
                return Err(DmcfeError::ProtocolError(format!(
                    "ciphertext {i} has an element outside the order-q subgroup"
                )));
            }
        }
        Self::decrypt(params, ciphertexts, key_shares, y, dlog)
    }

    fn combine(
        params: &PublicParameters,
        ciphertexts: &[Ciphertext],
        key_shares: &[FunctionalKeyShare],
        y: &DMatrix<BigInt>,
    ) -> Result<BigInt> {
        log::debug!("aggregator: combining {} per-client terms", params.n);
        let n = params.n;
        let ell = params.ell;
        if ciphertexts.len() != n {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{n} ciphertexts"),
                actual: format!("{}", ciphertexts.len()),
            });
        }
        if key_shares.len() != n {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{n} key shares"),
                actual: format!("{}", key_shares.len()),
            });
        }
        if y.nrows() != n || y.ncols() != ell {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{n}x{ell} matrix"),
                actual: format!("{}x{}", y.nrows(), y.ncols()),
            });
        }
        for ct in ciphertexts {
            ct.require_len(ell)?;
        }

        let mut z = BigInt::zero();
        for ks in key_shares {
            z += &ks.mu;
        }
        let z = z.mod_floor(&params.q);

        let per_client: Vec<BigInt> = (0..n)
            .into_par_iter()
            .map(|i| -> Result<BigInt> {
                let ct = &ciphertexts[i];
                let ks = &key_shares[i];

                let mut num = BigInt::one();
                for j in 0..ell {
                    let cy = pow_mod(&ct.c[j], &y[(i, j)], &params.p);
                    num = (&num * &cy).mod_floor(&params.p);
                }
                let t1 = pow_mod(&ct.c0, &ks.k1, &params.p);
                let t2 = pow_mod(&ct.c1, &ks.k2, &params.p);
                let denom = (&t1 * &t2).mod_floor(&params.p);
                let denom_inv = inv(&denom, &params.p)?;
                Ok((&num * &denom_inv).mod_floor(&params.p))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut alpha = BigInt::one();
        for term in per_client {
            alpha = (&alpha * &term).mod_floor(&params.p);
        }

        let z_exp = pow_mod(&params.g, &z, &params.p);
        let z_exp_inv = inv(&z_exp, &params.p)?;
        alpha = (&alpha * &z_exp_inv).mod_floor(&params.p);

        Ok(alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;

    fn toy_params(n: usize, ell: usize) -> PublicParameters {
        PublicParameters::new(
            BigInt::from(23),
            BigInt::from(11),
            BigInt::from(2),
            BigInt::from(4),
            n,
            ell,
            8,
        )
        .unwrap()
    }

    fn run_protocol(
        params: &PublicParameters,
        xs: &[Vec<BigInt>],
        y: &DMatrix<BigInt>,
    ) -> (Vec<Ciphertext>, Vec<FunctionalKeyShare>) {
        let mut clients: Vec<Client> = (0..params.n).map(|i| Client::new(i, params)).collect();
        let pubkeys: Vec<BigInt> = clients.iter_mut().map(|c| c.announce()).collect();
        for c in clients.iter_mut() {
            c.set_share(&pubkeys).unwrap();
            c.generate_damgard_key();
        }

        let ciphertexts: Vec<Ciphertext> = clients
            .iter()
            .zip(xs.iter())
            .map(|(c, x)| c.encrypt(x).unwrap())
            .collect();
        let key_shares: Vec<FunctionalKeyShare> =
            clients.iter().map(|c| c.derive_key_share(y).unwrap()).collect();

        (ciphertexts, key_shares)
    }

    #[test]
    fn recovers_small_inner_product() {
        let params = toy_params(2, 2);
        let xs = vec![vec![BigInt::from(1), BigInt::from(2)], vec![BigInt::from(3), BigInt::from(0)]];
        let y = DMatrix::from_row_slice(
            2,
            2,
            &[
                BigInt::from(1),
                BigInt::from(1),
                BigInt::from(1),
                BigInt::from(1),
            ],
        );
        let (ciphertexts, key_shares) = run_protocol(&params, &xs, &y);

        let expected: i64 = 1 + 2 + 3 + 0;
        let g = params.g.clone();
        let p = params.p.clone();
        let dlog = DlogTable::build(&g, &p, 20).unwrap();

        let recovered = Aggregator::decrypt(&params, &ciphertexts, &key_shares, &y, &dlog).unwrap();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn decrypt_checked_rejects_bad_ciphertext() {
        let params = toy_params(2, 2);
        let xs = vec![vec![BigInt::from(1), BigInt::from(2)], vec![BigInt::from(3), BigInt::from(0)]];
        let y = DMatrix::from_row_slice(
            2,
            2,
            &[
                BigInt::from(1),
                BigInt::from(1),
                BigInt::from(1),
                BigInt::from(1),
            ],
        );
        let (mut ciphertexts, key_shares) = run_protocol(&params, &xs, &y);
        ciphertexts[0].c0 = BigInt::from(3); // outside the order-11 subgroup

        let dlog = DlogTable::build(&params.g, &params.p, 20).unwrap();
        let err = Aggregator::decrypt_checked(&params, &ciphertexts, &key_shares, &y, &dlog).unwrap_err();
        assert!(matches!(err, DmcfeError::ProtocolError(_)));
    }

    #[test]
    fn rejects_wrong_ciphertext_count() {
        let params = toy_params(2, 2);
        let y = DMatrix::from_element(2, 2, BigInt::one());
        let dlog = DlogTable::build(&params.g, &params.p, 20).unwrap();
        let err = Aggregator::decrypt(&params, &[], &[], &y, &dlog).unwrap_err();
        assert!(matches!(err, DmcfeError::ShapeMismatch { .. }));
    }
}
