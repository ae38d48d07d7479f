use thiserror::Error;

use crate::{db::traits::OrderManagementError, db_types::OrderId};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Could not decode stored order: {0}")]
    DecodeError(String),
}

impl From<SqliteDatabaseError> for OrderManagementError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::OrderNotFound(id) => OrderManagementError::OrderNotFound(id),
            SqliteDatabaseError::DecodeError(s) => OrderManagementError::InvalidData(s),
            e => OrderManagementError::DatabaseError(e.to_string()),
        }
    }
}
