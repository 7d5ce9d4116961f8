//! Decentralized multi-client functional encryption (DMCFE) for inner
//! products, after Chotard, Dufour Sans, Gay, Phan and Pointcheval. Each
//! client independently encrypts one coordinate of a vector `x`; given
//! functional key shares for a weight vector `y` from every client, a
//! public aggregator recovers `<x, y>` without ever learning `x` itself.
//!
//! No central key authority: clients run a one-round Diffie-Hellman share
//! exchange (`Client::announce` / `Client::set_share`) to build a
//! zero-sum correlation that blinds their individual contributions, and
//! every other key a client holds is its own.

pub mod aggregator;
pub mod arithmetic;
pub mod ciphertext;
pub mod client;
pub mod dlog;
pub mod error;
pub mod keyshare;
pub mod params;
pub mod protocol;

pub use aggregator::Aggregator;
pub use ciphertext::Ciphertext;
pub use client::Client;
pub use dlog::DlogTable;
pub use error::{DmcfeError, Result};
pub use keyshare::FunctionalKeyShare;
pub use params::{PublicParameters, SecurityParamRecord};
pub use protocol::Protocol;
