//! Business logic of the savings backend: balance mutations, the ledger
//! writer, notification dispatch, credentials and reporting queries.

pub mod account_stats;
pub mod balance;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod notifications;
pub mod transaction_stats;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ComputeError, ErrorKind, Result};
