//! The per-client contribution to a functional decryption key for a fixed
//! function vector `y`. The aggregator needs one of these from every
//! client before it can recover `<x, y>`.

use num_bigint::BigInt;

/// One client's share of the functional key for some `y`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FunctionalKeyShare {
    /// One-time-pad and share-matrix contribution, folded together.
    pub mu: BigInt,
    /// `<s_i, y_i>` mod q, the first Damgard-exponent contribution.
    pub k1: BigInt,
    /// `<t_i, y_i>` mod q, the second Damgard-exponent contribution.
    pub k2: BigInt,
}
