use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Account {0} not found")]
    AccountNotFound(String),

    #[error("Transaction {0} not found")]
    TransactionNotFound(i32),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("Notification {0} not found")]
    NotificationNotFound(i32),

    /// Amount missing, not positive, or finer than a cent
    #[error("Amount must be greater than zero with at most two decimal places")]
    InvalidAmount,

    /// The balance would no longer fit the stored `decimal(15,2)` column
    #[error("Resulting balance exceeds the maximum of {limit}")]
    BalanceLimitExceeded { limit: Decimal },

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("Account {0} is inactive")]
    AccountInactive(String),

    #[error("Account number {0} already exists")]
    DuplicateAccountNumber(String),

    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Catch-all for rejected input that has no dedicated variant
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing failed
    #[error("Credential error: {0}")]
    Credential(String),
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Internal,
}

impl ComputeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ComputeError::AccountNotFound(_)
            | ComputeError::TransactionNotFound(_)
            | ComputeError::UserNotFound(_)
            | ComputeError::NotificationNotFound(_) => ErrorKind::NotFound,
            ComputeError::InvalidAmount
            | ComputeError::InsufficientFunds { .. }
            | ComputeError::BalanceLimitExceeded { .. }
            | ComputeError::InvalidCredentials
            | ComputeError::InvalidInput(_) => ErrorKind::InvalidInput,
            ComputeError::AccountInactive(_)
            | ComputeError::DuplicateAccountNumber(_)
            | ComputeError::DuplicateEmail(_) => ErrorKind::Conflict,
            ComputeError::Database(_) | ComputeError::Credential(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for the error response body.
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::Database(_) => "DATABASE_ERROR",
            ComputeError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            ComputeError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            ComputeError::UserNotFound(_) => "USER_NOT_FOUND",
            ComputeError::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            ComputeError::InvalidAmount => "INVALID_AMOUNT",
            ComputeError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            ComputeError::BalanceLimitExceeded { .. } => "BALANCE_LIMIT_EXCEEDED",
            ComputeError::AccountInactive(_) => "ACCOUNT_INACTIVE",
            ComputeError::DuplicateAccountNumber(_) => "DUPLICATE_ACCOUNT_NUMBER",
            ComputeError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            ComputeError::InvalidCredentials => "INVALID_CREDENTIALS",
            ComputeError::InvalidInput(_) => "INVALID_INPUT",
            ComputeError::Credential(_) => "CREDENTIAL_ERROR",
        }
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
