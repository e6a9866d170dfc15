//! Data models for ceprace.

mod postal;

pub use postal::PostalRecord;

use crate::error::QueryError;

/// Result of one service query: the normalized record or why it failed.
pub type QueryOutcome = Result<PostalRecord, QueryError>;
