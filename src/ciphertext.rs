//! The wire-visible ciphertext a single client emits for one encryption
//! round: a Damgard-ElGamal pair `(c0, c1)` plus one masked coordinate per
//! vector entry.

use nalgebra::DVector;
use num_bigint::BigInt;

use crate::arithmetic::pow_mod;
use crate::error::{DmcfeError, Result};
use crate::params::PublicParameters;

/// One client's ciphertext for its length-`ell` input vector.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ciphertext {
    pub c0: BigInt,
    pub c1: BigInt,
    pub c: Vec<BigInt>,
}

impl Ciphertext {
    /// `true` if every element lies in the order-`q` subgroup of `Z*_p`.
    /// Optional defense against a malformed or adversarial ciphertext;
    /// `Aggregator::decrypt_checked` calls this before combining.
    pub fn in_subgroup(&self, params: &PublicParameters) -> bool {
        let check = |v: &BigInt| pow_mod(v, &params.q, &params.p) == num_traits::One::one();
        check(&self.c0) && check(&self.c1) && self.c.iter().all(check)
    }

    pub fn require_len(&self, ell: usize) -> Result<()> {
        if self.c.len() != ell {
            return Err(DmcfeError::ShapeMismatch {
                expected: format!("{ell} masked coordinates"),
                actual: format!("{}", self.c.len()),
            });
        }
        Ok(())
    }

    pub fn masked_coords(&self) -> DVector<BigInt> {
        DVector::from_vec(self.c.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_element_outside_subgroup() {
        let params = PublicParameters::new(
            BigInt::from(23),
            BigInt::from(11),
            BigInt::from(2),
            BigInt::from(4),
            2,
            2,
            8,
        )
        .unwrap();
        let good = Ciphertext {
            c0: BigInt::from(2),
            c1: BigInt::from(4),
            c: vec![BigInt::from(2), BigInt::from(4)],
        };
        assert!(good.in_subgroup(&params));

        let bad = Ciphertext {
            c0: BigInt::from(3), // generator of the full group, not the order-11 subgroup
            c1: BigInt::from(4),
            c: vec![BigInt::from(2), BigInt::from(4)],
        };
        assert!(!bad.in_subgroup(&params));
    }

    #[test]
    fn require_len_checks_vector_shape() {
        let ct = Ciphertext {
            c0: BigInt::from(2),
            c1: BigInt::from(4),
            c: vec![BigInt::from(2)],
        };
        assert!(ct.require_len(1).is_ok());
        assert!(ct.require_len(2).is_err());
    }
}
