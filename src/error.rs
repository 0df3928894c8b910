//! Store error taxonomy.

use thiserror::Error;

/// Failures surfaced by a [`Store`](crate::store::Store).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not open a connection to the database.
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// A statement failed to execute.
    #[error("{statement} failed: {source}")]
    Query {
        statement: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A row could not be decoded into its Rust type.
    #[error("failed to decode {table} row: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    pub fn query(statement: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StoreError::Query { statement, source }
    }

    pub fn decode(table: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StoreError::Decode { table, source }
    }
}
