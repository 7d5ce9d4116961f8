//! Thin in-process orchestrator that drives the full protocol across `n`
//! clients for integration testing and local simulation. Grounded on the
//! teacher's numbered `execute_step_*` driver, but expressed as named
//! phases rather than a generic `step_number` dispatch: this protocol's
//! phases are not interchangeable opaque rounds, so the plain method names
//! read better than a single `execute_step` switch would.

use nalgebra::DMatrix;
use num_bigint::BigInt;

use crate::ciphertext::Ciphertext;
use crate::client::Client;
use crate::dlog::DlogTable;
use crate::error::{DmcfeError, Result};
use crate::keyshare::FunctionalKeyShare;
use crate::params::PublicParameters;

/// Drives `n` in-process `Client`s through announce -> share exchange ->
/// key generation -> encryption -> key derivation -> aggregation.
pub struct Protocol {
    pub params: PublicParameters,
    clients: Vec<Client>,
}

impl Protocol {
    pub fn new(params: PublicParameters) -> Self {
        let clients = (0..params.n).map(|i| Client::new(i, &params)).collect();
        Protocol { params, clients }
    }

    /// Phase 1: every client draws its DH scalar and publishes `pi_i`.
    pub fn announce(&mut self) -> Vec<BigInt> {
        log::debug!("protocol: announcing public keys for {} clients", self.clients.len());
        self.clients.iter_mut().map(|c| c.announce()).collect()
    }

    /// Phase 2: every client derives its row of the zero-sum share matrix
    /// from the published keys gathered in `announce`.
    pub fn exchange_shares(&mut self, public_keys: &[BigInt]) -> Result<()> {
        log::debug!("protocol: exchanging shares");
        for c in self.clients.iter_mut() {
            c.set_share(public_keys)?;
        }
        log::debug!("protocol: share exchange complete for {} clients", self.clients.len());
        Ok(())
    }

    /// Phase 3: every client draws its Damgard commitment keypair and
    /// one-time pad.
    pub fn keygen(&mut self) {
        log::debug!("protocol: generating Damgard keypairs");
        for c in self.clients.iter_mut() {
            c.generate_damgard_key();
        }
    }

    /// Phase 4: encrypt `xs[i]` under client `i`'s key. `xs` must have one
    /// row per client, each of length `ell`.
    pub fn encrypt_all(&self, xs: &[Vec<BigInt>]) -> Result<Vec<Ciphertext>> {
        log::debug!("protocol: encrypting {} input vectors", xs.len());
        if xs.len() != self.params.n {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{} input vectors", self.params.n),
                actual: format!("{}", xs.len()),
            });
        }
        self.clients
            .iter()
            .zip(xs.iter())
            .map(|(c, x)| c.encrypt(x))
            .collect()
    }

    /// Phase 5: derive every client's functional key share for `y`.
    pub fn derive_key_shares(&self, y: &DMatrix<BigInt>) -> Result<Vec<FunctionalKeyShare>> {
        log::debug!("protocol: deriving key shares for {} clients", self.clients.len());
        self.clients.iter().map(|c| c.derive_key_share(y)).collect()
    }

    /// Phase 6: combine ciphertexts and key shares and recover `<x, y>`.
    pub fn aggregate_and_solve(
        &self,
        ciphertexts: &[Ciphertext],
        key_shares: &[FunctionalKeyShare],
        y: &DMatrix<BigInt>,
        dlog: &DlogTable,
    ) -> Result<i64> {
        crate::aggregator::Aggregator::decrypt(&self.params, ciphertexts, key_shares, y, dlog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

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

    #[test]
    fn full_protocol_recovers_inner_product() {
        let params = toy_params(2, 2);
        let mut protocol = Protocol::new(params.clone());

        let public_keys = protocol.announce();
        protocol.exchange_shares(&public_keys).unwrap();
        protocol.keygen();

        let xs = vec![vec![BigInt::from(2), BigInt::from(1)], vec![BigInt::from(1), BigInt::from(4)]];
        let ciphertexts = protocol.encrypt_all(&xs).unwrap();

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
        let key_shares = protocol.derive_key_shares(&y).unwrap();

        let dlog = DlogTable::build(&params.g, &params.p, 20).unwrap();
        let recovered = protocol
            .aggregate_and_solve(&ciphertexts, &key_shares, &y, &dlog)
            .unwrap();
        assert_eq!(recovered, 2 + 1 + 1 + 4);
    }

    #[test]
    fn encrypt_all_rejects_wrong_party_count() {
        let params = toy_params(2, 2);
        let mut protocol = Protocol::new(params);
        let public_keys = protocol.announce();
        protocol.exchange_shares(&public_keys).unwrap();
        protocol.keygen();

        let xs = vec![vec![BigInt::from(1), BigInt::from(1)]];
        let err = protocol.encrypt_all(&xs).unwrap_err();
        assert!(matches!(err, DmcfeError::ShapeMismatch { .. }));
    }
}
