use common::{
    AccountKindTotal, AccountStatistics, AccountTransactionStatistics,
    GlobalTransactionStatistics, UnreadCount,
};
use compute::notifications::NotificationDispatcher;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::config::Settings;
use crate::handlers::{accounts, notifications, transactions, users};

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Memoised statistics, cleared on every write
    pub cache: StatisticsCache,
    /// Post-commit notification hook for deposits and withdrawals
    pub notifications: NotificationDispatcher,
    pub settings: Settings,
}

/// Statistics memo guarded by a write generation.
///
/// Writers bump the generation after committing, then clear the cache. A
/// reader that computed its value under an older generation drops its own
/// entry again, so a stale value never outlives the write that made it stale.
#[derive(Clone, Debug)]
pub struct StatisticsCache {
    entries: Cache<String, CachedData>,
    generation: Arc<AtomicU64>,
}

impl StatisticsCache {
    pub fn new(entries: Cache<String, CachedData>) -> Self {
        Self {
            entries,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CachedData> {
        self.entries.get(key).await
    }

    /// Read before computing a value that will be passed to [`Self::insert_if_current`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn insert_if_current(&self, key: &str, value: CachedData, generation: u64) {
        if self.generation() != generation {
            return;
        }
        self.entries.insert(key.to_string(), value).await;
        if self.generation() != generation {
            self.entries.invalidate(key).await;
        }
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate_all();
    }
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    AccountStatistics(AccountStatistics),
    GlobalStatistics(GlobalTransactionStatistics),
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_accounts,
        crate::handlers::accounts::get_account,
        crate::handlers::accounts::get_account_by_number,
        crate::handlers::accounts::search_accounts,
        crate::handlers::accounts::get_active_accounts,
        crate::handlers::accounts::update_account,
        crate::handlers::accounts::delete_account,
        crate::handlers::accounts::get_account_statistics,
        crate::handlers::accounts::get_accounts_by_balance,
        crate::handlers::accounts::get_accounts_above_average,
        crate::handlers::transactions::deposit,
        crate::handlers::transactions::withdraw,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::get_account_transactions,
        crate::handlers::transactions::get_transactions_by_kind,
        crate::handlers::transactions::get_account_transactions_by_kind,
        crate::handlers::transactions::get_account_transaction_statistics,
        crate::handlers::transactions::get_account_deposit_total,
        crate::handlers::transactions::get_account_withdrawal_total,
        crate::handlers::transactions::get_recent_transactions,
        crate::handlers::transactions::get_global_statistics,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::register_user,
        crate::handlers::users::login,
        crate::handlers::users::update_user,
        crate::handlers::users::change_password,
        crate::handlers::users::deactivate_user,
        crate::handlers::users::activate_user,
        crate::handlers::notifications::get_user_notifications,
        crate::handlers::notifications::get_unread_notifications,
        crate::handlers::notifications::count_unread_notifications,
        crate::handlers::notifications::get_notification,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::mark_as_read,
        crate::handlers::notifications::mark_all_as_read,
        crate::handlers::notifications::delete_notification,
        crate::handlers::notifications::notify_transaction,
        crate::handlers::notifications::notify_low_balance,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            AccountStatistics,
            AccountTransactionStatistics,
            AccountKindTotal,
            GlobalTransactionStatistics,
            UnreadCount,
            accounts::CreateAccountRequest,
            accounts::UpdateAccountRequest,
            accounts::AccountResponse,
            transactions::MutationBody,
            transactions::TransactionResponse,
            users::RegisterRequest,
            users::LoginRequest,
            users::UpdateUserRequest,
            users::ChangePasswordRequest,
            users::UserResponse,
            notifications::CreateNotificationRequest,
            notifications::TransactionNotificationRequest,
            notifications::LowBalanceNotificationRequest,
            notifications::NotificationResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Savings accounts"),
        (name = "transactions", description = "Deposits, withdrawals and the ledger"),
        (name = "users", description = "User registration and management"),
        (name = "notifications", description = "User notifications"),
    ),
    info(
        title = "Ahorros API",
        description = "Savings account backend: accounts, deposits and withdrawals, users and notifications",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
